//! Multipart generation request assembly.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use tracing::debug;

use super::archive::write_tar_gz;
use crate::config::resolve_project_name;
use crate::error::{CommandError, Result};

/// A named local directory sent to the server as a tar.gz file field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBundle {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for SourceBundle {
    type Err = String;

    /// Parse `name=path`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('=') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok(Self {
                name: name.to_string(),
                path: PathBuf::from(path),
            }),
            _ => Err(format!("\"{value}\" must be formatted as key=value")),
        }
    }
}

impl SourceBundle {
    fn archive(&self) -> Result<Vec<u8>> {
        write_tar_gz(&self.path, Vec::new())
    }

    fn file_name(&self) -> String {
        format!("{}.tar.gz", self.name)
    }
}

/// The accelerator a request is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceleratorSource {
    /// A local directory uploaded with the request.
    Local(SourceBundle),
    /// An accelerator already registered with the server.
    Registered(String),
}

impl AcceleratorSource {
    /// Pick the accelerator source from the two mutually exclusive flags.
    ///
    /// # Errors
    /// Returns [`CommandError::Validation`] when both or neither are given. An
    /// empty name counts as absent.
    pub fn from_flags(name: Option<String>, path: Option<SourceBundle>) -> Result<Self> {
        match (name.filter(|name| !name.is_empty()), path) {
            (Some(name), None) => Ok(Self::Registered(name)),
            (None, Some(bundle)) => Ok(Self::Local(bundle)),
            (Some(_), Some(_)) => Err(CommandError::Validation(
                "you may only provide one of --accelerator-name or --accelerator-path".to_string(),
            )),
            (None, None) => Err(CommandError::Validation(
                "no accelerator, you must provide --accelerator-name or --accelerator-path"
                    .to_string(),
            )),
        }
    }

    /// Name used as the default `projectName`.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Local(bundle) => &bundle.name,
            Self::Registered(name) => name,
        }
    }
}

/// One field of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

impl FormPart {
    fn text(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            file_name: None,
            content: value.into().into_bytes(),
        }
    }

    fn file(name: String, file_name: String, content: Vec<u8>) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content,
        }
    }
}

/// A finished generation request, ready to send.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    project_name: String,
    parts: Vec<FormPart>,
}

impl GenerationRequest {
    #[must_use]
    pub fn builder(accelerator: AcceleratorSource) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            accelerator,
            fragment_names: Vec::new(),
            fragment_bundles: Vec::new(),
            options: Map::new(),
        }
    }

    /// Resolved `projectName` carried in the options field.
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Fields in the order they are written to the body.
    #[must_use]
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Convert into a `reqwest` multipart form.
    #[must_use]
    pub fn into_form(self) -> Form {
        self.parts.into_iter().fold(Form::new(), |form, part| {
            let body = Part::bytes(part.content);
            let body = match part.file_name {
                Some(file_name) => body.file_name(file_name),
                None => body,
            };
            form.part(part.name, body)
        })
    }
}

/// Collects the pieces of a [`GenerationRequest`].
///
/// [`GenerationRequestBuilder::build`] consumes the builder, so nothing can be added
/// once the body is finalized.
#[derive(Debug)]
pub struct GenerationRequestBuilder {
    accelerator: AcceleratorSource,
    fragment_names: Vec<String>,
    fragment_bundles: Vec<SourceBundle>,
    options: Map<String, Value>,
}

impl GenerationRequestBuilder {
    /// Reference a fragment registered with the server.
    #[must_use]
    pub fn fragment_name(mut self, name: impl Into<String>) -> Self {
        self.fragment_names.push(name.into());
        self
    }

    /// Upload a local fragment directory.
    #[must_use]
    pub fn fragment_bundle(mut self, bundle: SourceBundle) -> Self {
        self.fragment_bundles.push(bundle);
        self
    }

    /// Set the generation options.
    #[must_use]
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Archive the local sources and lay out the multipart fields.
    ///
    /// # Errors
    /// Returns [`CommandError::Validation`] for duplicate local fragment names or a
    /// non-string `projectName`, and archive errors for unreadable directories.
    pub fn build(self) -> Result<GenerationRequest> {
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = self
            .fragment_bundles
            .iter()
            .find(|bundle| !seen.insert(bundle.name.as_str()))
        {
            return Err(CommandError::Validation(format!(
                "fragment {} was provided more than once in --fragment-paths",
                duplicate.name
            )));
        }

        let mut options = self.options;
        let project_name = resolve_project_name(&mut options, self.accelerator.name())?;

        let mut parts = Vec::new();
        match &self.accelerator {
            AcceleratorSource::Local(bundle) => {
                debug!(name = %bundle.name, path = %bundle.path.display(), "archiving accelerator");
                parts.push(FormPart::file(
                    "accelerator".to_string(),
                    bundle.file_name(),
                    bundle.archive()?,
                ));
            }
            AcceleratorSource::Registered(name) => {
                parts.push(FormPart::text("accelerator_name", name.clone()));
            }
        }

        for name in &self.fragment_names {
            parts.push(FormPart::text("fragment_names", name.clone()));
        }

        for bundle in &self.fragment_bundles {
            debug!(name = %bundle.name, path = %bundle.path.display(), "archiving fragment");
            parts.push(FormPart::file(
                format!("fragment_{}", bundle.name),
                bundle.file_name(),
                bundle.archive()?,
            ));
        }

        let options = serde_json::to_string(&Value::Object(options)).map_err(|e| {
            CommandError::Validation(format!("invalid options provided, must be valid JSON: {e}"))
        })?;
        parts.push(FormPart::text("options", options));

        Ok(GenerationRequest {
            project_name,
            parts,
        })
    }
}
