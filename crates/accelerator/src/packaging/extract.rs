//! Unpacking generated project archives.

use std::fs::{self, OpenOptions};
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CommandError, Result};

const DEFAULT_DIR_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;

/// What to do when the target directory already holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Delete the target first.
    Clean,
    /// Refuse to touch a non-empty target.
    Preserve,
}

impl OverwritePolicy {
    #[must_use]
    pub fn from_force(force: bool) -> Self {
        if force {
            Self::Clean
        } else {
            Self::Preserve
        }
    }
}

/// Apply `policy` to `target` so extraction can start.
///
/// # Errors
/// Returns [`CommandError::Validation`] for an empty path,
/// [`CommandError::Conflict`] when `target` is non-empty under
/// [`OverwritePolicy::Preserve`], and [`CommandError::Io`] when cleaning fails.
pub fn prepare_target(target: &Path, policy: OverwritePolicy) -> Result<()> {
    if target.as_os_str().is_empty() {
        return Err(CommandError::Validation(
            "no target directory for the generated project".to_string(),
        ));
    }
    match policy {
        OverwritePolicy::Clean => {
            let removed = if target.is_dir() {
                fs::remove_dir_all(target)
            } else if target.exists() {
                fs::remove_file(target)
            } else {
                Ok(())
            };
            removed.map_err(CommandError::io(format!("could not remove {}", target.display())))?;
            info!(target = %target.display(), "cleaned target directory");
        }
        OverwritePolicy::Preserve => {
            if target.exists() && !is_empty_dir(target) {
                return Err(CommandError::Conflict(format!(
                    "path {} is not empty, use --force to overwrite",
                    target.display()
                )));
            }
        }
    }
    Ok(())
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Strip the wrapping directory from an archive entry path.
///
/// Returns `None` for the wrapping directory itself and for entries that would
/// escape the target.
fn strip_wrapper(name: &Path) -> Option<PathBuf> {
    let stripped: PathBuf = name
        .components()
        .skip(1)
        .map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect::<Option<_>>()?;
    (!stripped.as_os_str().is_empty()).then_some(stripped)
}

fn invalid_entry(name: &str, reason: &'static str) -> CommandError {
    CommandError::Io {
        message: format!("invalid entry {name} in generated archive"),
        source: io::Error::new(io::ErrorKind::InvalidData, reason),
    }
}

#[cfg(unix)]
fn set_dir_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_dir_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_file(path: &Path, mode: u32) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: u32) -> io::Result<fs::File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Extract every entry of the zip in `bytes` below `target`.
///
/// The first path segment of each entry is dropped. Extraction stops at the first
/// failing entry; files already written stay on disk.
///
/// # Errors
/// Returns [`CommandError::Io`] for unreadable archives or filesystem failures.
pub fn extract_zip(bytes: &[u8], target: &Path) -> Result<usize> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    fs::create_dir_all(target).map_err(CommandError::io(format!(
        "could not create directory {}",
        target.display()
    )))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(name) = entry.enclosed_name() else {
            return Err(invalid_entry(entry.name(), "path escapes target"));
        };
        let Some(relative) = strip_wrapper(&name) else {
            if entry.is_dir() && name.components().count() == 1 {
                continue;
            }
            return Err(invalid_entry(entry.name(), "entry outside the wrapping directory"));
        };
        let path = target.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&path).map_err(CommandError::io(format!(
                "could not create directory {}",
                path.display()
            )))?;
            set_dir_mode(&path, entry.unix_mode().unwrap_or(DEFAULT_DIR_MODE) & 0o7777)
                .map_err(CommandError::io(format!(
                    "could not create directory {}",
                    path.display()
                )))?;
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(CommandError::io(
                "error creating subdirectories in generated project",
            ))?;
        }
        let mode = entry.unix_mode().unwrap_or(DEFAULT_FILE_MODE) & 0o7777;
        let mut file = create_file(&path, mode).map_err(CommandError::io(format!(
            "could not open file {}",
            relative.display()
        )))?;
        io::copy(&mut entry, &mut file).map_err(CommandError::io(format!(
            "could not write file {}",
            relative.display()
        )))?;
        written += 1;
    }

    debug!(target = %target.display(), files = written, "extracted archive");
    Ok(written)
}

/// Prepare `target` according to `policy`, then extract `bytes` into it.
///
/// # Errors
/// See [`prepare_target`] and [`extract_zip`].
pub fn extract_project(bytes: &[u8], target: &Path, policy: OverwritePolicy) -> Result<usize> {
    prepare_target(target, policy)?;
    extract_zip(bytes, target)
}
