//! Directory to tar / tar.gz serialization.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;
use walkdir::WalkDir;

use super::ignore::{IgnoreFile, IgnoreStack, IGNORE_FILE_NAME};
use crate::error::{CommandError, Result};

/// Directory name that is always pruned.
const GIT_DIR: &str = ".git";

/// A regular file selected for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute or caller-relative location on disk.
    pub path: PathBuf,
    /// Slash-separated path relative to the bundle root.
    pub relative: String,
}

/// List the regular files under `root` that survive `.git` pruning and ignore rules.
///
/// Entries are visited in file-name order so archives are reproducible.
///
/// # Errors
/// Returns [`CommandError::NotFound`] when `root` is not a directory and
/// [`CommandError::Io`] for any failure during the walk.
pub fn collect_files(root: &Path) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(CommandError::NotFound(format!(
            "cannot find directory {}",
            root.display()
        )));
    }

    let mut ignores = IgnoreStack::new();
    ignores.push(0, "", read_ignore_file(root)?);

    let mut files = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        let depth = entry.depth();
        ignores.enter(depth);

        let relative = relative_path(root, entry.path());
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if entry.file_name() == GIT_DIR || ignores.is_ignored(&relative, true) {
                debug!(path = %relative, "pruning directory");
                walker.skip_current_dir();
                continue;
            }
            ignores.push(depth, relative, read_ignore_file(entry.path())?);
            continue;
        }

        if !file_type.is_file() {
            debug!(path = %relative, "skipping non-regular file");
            continue;
        }

        if ignores.is_ignored(&relative, false) {
            debug!(path = %relative, "ignored");
            continue;
        }

        files.push(SourceFile {
            path: entry.into_path(),
            relative,
        });
    }

    Ok(files)
}

fn read_ignore_file(dir: &Path) -> Result<IgnoreFile> {
    let path = dir.join(IGNORE_FILE_NAME);
    if !path.is_file() {
        return Ok(IgnoreFile::default());
    }
    let content = fs::read_to_string(&path).map_err(CommandError::io(format!(
        "could not read {}",
        path.display()
    )))?;
    Ok(IgnoreFile::parse(&content))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Write the packaged files of `root` as an uncompressed tar stream into `sink`.
///
/// Each file is opened, copied and closed before the next one is touched.
///
/// # Errors
/// See [`collect_files`]; write failures on `sink` surface as [`CommandError::Io`].
pub fn write_tar<W: Write>(root: &Path, sink: W) -> Result<W> {
    let files = collect_files(root)?;
    let mut builder = tar::Builder::new(sink);

    for file in &files {
        let source = File::open(&file.path).map_err(CommandError::io(format!(
            "could not open file {}",
            file.path.display()
        )))?;
        let metadata = source.metadata().map_err(CommandError::io(format!(
            "could not stat file {}",
            file.path.display()
        )))?;

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(metadata.len());
        header.set_mode(file_mode(&metadata));
        if let Ok(modified) = metadata.modified() {
            if let Ok(since_epoch) = modified.duration_since(std::time::UNIX_EPOCH) {
                header.set_mtime(since_epoch.as_secs());
            }
        }

        builder
            .append_data(&mut header, &file.relative, source)
            .map_err(CommandError::io(format!(
                "could not add {} to archive",
                file.relative
            )))?;
    }

    debug!(root = %root.display(), files = files.len(), "archived directory");
    builder
        .into_inner()
        .map_err(CommandError::io("could not finish archive"))
}

/// Write the packaged files of `root` as a gzip-compressed tar stream into `sink`.
///
/// # Errors
/// See [`write_tar`].
pub fn write_tar_gz<W: Write>(root: &Path, sink: W) -> Result<W> {
    let encoder = write_tar(root, GzEncoder::new(sink, Compression::default()))?;
    encoder
        .finish()
        .map_err(CommandError::io("could not finish compressed archive"))
}

/// Gzip-compress an already built tar stream.
///
/// # Errors
/// Returns [`CommandError::Io`] if compression fails.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(CommandError::io("could not compress archive"))?;
    encoder
        .finish()
        .map_err(CommandError::io("could not compress archive"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use flate2::read::GzDecoder;
    use std::collections::BTreeMap;
    use std::io::Read;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn unpack(bytes: &[u8]) -> BTreeMap<String, String> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                (path, content)
            })
            .collect()
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = write_tar_gz(Path::new("invalid"), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "cannot find directory invalid");
    }

    #[test]
    fn test_round_trip_preserves_paths_and_contents() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "accelerator.yaml", "accelerator: {}\n");
        write(dir.path(), "inner/foo.txt", "foo");
        write(dir.path(), "inner/deeper/bar.txt", "bar");

        let bytes = write_tar_gz(dir.path(), Vec::new()).unwrap();
        let entries = unpack(&bytes);

        let expected: BTreeMap<String, String> = [
            ("accelerator.yaml", "accelerator: {}\n"),
            ("inner/deeper/bar.txt", "bar"),
            ("inner/foo.txt", "foo"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(entries, expected);
    }

    #[test]
    fn test_git_directory_is_pruned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "readme");
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main");
        write(dir.path(), ".git/objects/ab/cdef", "blob");
        write(dir.path(), "nested/.git/config", "[core]");

        let files = collect_files(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(paths, vec!["README.md"]);
    }

    #[test]
    fn test_nested_ignore_file_and_negation() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "*.log\n");
        write(dir.path(), "app.log", "root log");
        write(dir.path(), "keep.tmp", "kept at root");
        write(dir.path(), "inner/.gitignore", "*.tmp\n!important.tmp\n");
        write(dir.path(), "inner/scratch.tmp", "scratch");
        write(dir.path(), "inner/important.tmp", "important");
        write(dir.path(), "inner/trace.log", "trace");

        let files = collect_files(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(
            paths,
            vec![".gitignore", "inner/.gitignore", "inner/important.tmp", "keep.tmp"]
        );
    }

    #[test]
    fn test_ignored_directory_is_pruned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "build/\n");
        write(dir.path(), "build/out.bin", "bin");
        write(dir.path(), "src/main.rs", "fn main() {}");

        let files = collect_files(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(paths, vec![".gitignore", "src/main.rs"]);
    }

    #[test]
    fn test_root_directory_is_never_ignored() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("skipme");
        write(&root, ".gitignore", "skipme\n");
        write(&root, "accelerator.yaml", "accelerator: {}\n");
        write(&root, "src/lib.rs", "");

        let files = collect_files(&root).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(paths, vec![".gitignore", "accelerator.yaml", "src/lib.rs"]);

        let entries = unpack(&write_tar_gz(&root, Vec::new()).unwrap());
        assert_eq!(entries.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped_and_modes_kept() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "run.sh", "#!/bin/sh\n");
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink(dir.path().join("run.sh"), dir.path().join("link.sh")).unwrap();

        let bytes = write_tar(dir.path(), Vec::new()).unwrap();
        let mut archive = tar::Archive::new(bytes.as_slice());
        let entries: Vec<(String, u32)> = archive
            .entries()
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (
                    entry.path().unwrap().to_string_lossy().into_owned(),
                    entry.header().mode().unwrap(),
                )
            })
            .collect();
        assert_eq!(entries, vec![("run.sh".to_string(), 0o755)]);
    }
}
