//! Accelerator server API models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accelerator as reported by the server catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerAccelerator {
    pub name: String,
    pub icon_url: Option<String>,
    pub source_url: Option<String>,
    pub spec_git_repository_url: Option<String>,
    pub spec_git_secret_ref_name: Option<String>,
    pub source_branch: Option<String>,
    pub source_tag: Option<String>,
    pub spec_image_repository: Option<String>,
    pub spec_image_pull_secrets: Vec<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub ready: bool,
    pub ready_message: Option<String>,
    pub archive_url: Option<String>,
    pub archive_ready: bool,
    pub archive_message: Option<String>,
}

impl ServerAccelerator {
    /// Repository shown in listings: `specGitRepositoryUrl`, else `sourceUrl`.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.spec_git_repository_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or(self.source_url.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcceleratorList {
    #[serde(rename = "_embedded")]
    pub embedded: Embedded,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Embedded {
    #[serde(default)]
    pub accelerators: Vec<ServerAccelerator>,
}

/// A selectable value for an option.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Choice {
    pub text: String,
    pub value: String,
}

/// An input the accelerator accepts when generating a project.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorOption {
    pub name: String,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub data_type: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionsResponse {
    #[serde(default)]
    pub options: Vec<AcceleratorOption>,
}

/// Problem document returned with error statuses.
///
/// Only `detail` is surfaced; `title` and `status` repeat the HTTP status line.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    pub detail: Option<String>,
}

/// Body of the single-accelerator generate call.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    pub accelerator: &'a str,
    pub options: &'a serde_json::Map<String, Value>,
}
