//! Configuration resolution: server URL, namespaces and the options map.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CommandError, Result};

/// Environment variable holding the default accelerator server URL.
pub const SERVER_URL_ENV: &str = "ACC_SERVER_URL";

/// Server used by the listing commands when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8877";

/// Namespace used when `--namespace` is not given.
pub const DEFAULT_NAMESPACE: &str = "accelerator-system";

/// Options key naming the generated project.
pub const PROJECT_NAME_KEY: &str = "projectName";

/// A validated accelerator server base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl(String);

impl ServerUrl {
    /// Validate that `url` carries an HTTP scheme.
    ///
    /// # Errors
    /// Returns [`CommandError::Validation`] when the scheme is missing.
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(Self(url.trim_end_matches('/').to_string()))
        } else {
            Err(CommandError::Validation(format!(
                "error creating request for {url}, the URL needs to include the protocol (\"http://\" or \"https://\")"
            )))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join `path` onto the base URL.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl std::fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Resolve the server URL for the generation commands.
///
/// The flag wins over `ACC_SERVER_URL`; with neither set the command cannot run.
///
/// # Errors
/// Returns [`CommandError::Configuration`] when no URL is configured and
/// [`CommandError::Validation`] when the URL has no scheme.
pub fn resolve_server_url(flag: Option<&str>) -> Result<ServerUrl> {
    let env = non_empty(std::env::var(SERVER_URL_ENV).ok());
    let url = non_empty(flag.map(str::to_string)).or(env).ok_or_else(|| {
        CommandError::Configuration(
            "no server URL provided, you must provide --server-url option or set ACC_SERVER_URL environment variable"
                .to_string(),
        )
    })?;
    debug!(url = %url, "resolved server URL");
    ServerUrl::parse(&url)
}

/// Resolve the server URL for listing commands, falling back to the local default.
///
/// # Errors
/// Returns [`CommandError::Validation`] when the URL has no scheme.
pub fn resolve_listing_server_url(flag: Option<&str>) -> Result<ServerUrl> {
    let url = non_empty(flag.map(str::to_string))
        .or_else(|| non_empty(std::env::var(SERVER_URL_ENV).ok()))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    ServerUrl::parse(&url)
}

/// Load the generation options from `--options` or `--options-file`.
///
/// # Errors
/// Returns [`CommandError::Validation`] when the content is not a JSON object and
/// [`CommandError::Io`] when the file cannot be read.
pub fn load_options(inline: Option<&str>, file: Option<&Path>) -> Result<Map<String, Value>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path).map_err(CommandError::io(format!(
            "could not read options file {}",
            path.display()
        )))?,
        None => inline.unwrap_or("{}").to_string(),
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(CommandError::Validation(
            "invalid options provided, must be valid JSON".to_string(),
        )),
    }
}

/// Ensure `projectName` is present, defaulting it to `default_name`, and return it.
///
/// # Errors
/// Returns [`CommandError::Validation`] when `projectName` is not a string or
/// resolves to an empty name.
pub fn resolve_project_name(options: &mut Map<String, Value>, default_name: &str) -> Result<String> {
    match options.get(PROJECT_NAME_KEY) {
        Some(Value::String(name)) if name.is_empty() => Err(empty_project_name()),
        Some(Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(CommandError::Validation(
            "invalid options provided, projectName must be a string".to_string(),
        )),
        None if default_name.is_empty() => Err(empty_project_name()),
        None => {
            options.insert(
                PROJECT_NAME_KEY.to_string(),
                Value::String(default_name.to_string()),
            );
            Ok(default_name.to_string())
        }
    }
}

fn empty_project_name() -> CommandError {
    CommandError::Validation("invalid options provided, projectName must not be empty".to_string())
}
