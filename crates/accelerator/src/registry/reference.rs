//! Image reference parsing.

use crate::error::{CommandError, Result};

const DOCKER_HUB: &str = "registry-1.docker.io";
const DEFAULT_TAG: &str = "latest";

/// A parsed `[registry/]repository[:tag]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, with port when given.
    pub registry: String,
    pub repository: String,
    pub tag: String,
    /// The reference as given, without tag or digest.
    pub name: String,
}

impl ImageReference {
    /// Parse `image`, dropping any `@sha256:...` digest suffix.
    ///
    /// # Errors
    /// Returns [`CommandError::Validation`] for empty or malformed references.
    pub fn parse(image: &str) -> Result<Self> {
        let invalid = || CommandError::Validation(format!("invalid image reference \"{image}\""));

        let tagged = image.split("@sha").next().unwrap_or_default().trim();
        if tagged.is_empty() || tagged.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let last_slash = tagged.rfind('/');
        let (name, tag) = match tagged.rfind(':') {
            Some(colon) if last_slash.map_or(true, |slash| colon > slash) => {
                (&tagged[..colon], &tagged[colon + 1..])
            }
            _ => (tagged, DEFAULT_TAG),
        };
        if name.is_empty() || tag.is_empty() {
            return Err(invalid());
        }

        let (registry, repository) = match name.split_once('/') {
            Some((host, rest))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (host.to_string(), rest.to_string())
            }
            Some(_) => (DOCKER_HUB.to_string(), name.to_string()),
            None => (DOCKER_HUB.to_string(), format!("library/{name}")),
        };
        if repository.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            registry,
            repository,
            tag: tag.to_string(),
            name: name.to_string(),
        })
    }

    /// Whether the registry is reached over plain HTTP.
    #[must_use]
    pub fn is_local(&self) -> bool {
        let host = self
            .registry
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .map_or_else(
                || self.registry.split(':').next().unwrap_or_default(),
                |(host, _)| host,
            );
        matches!(host, "localhost" | "127.0.0.1" | "::1")
    }

    /// Base URL of the registry API.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.is_local() { "http" } else { "https" };
        format!("{scheme}://{}/v2/{}", self.registry, self.repository)
    }

    /// Reference pinned to `digest`.
    #[must_use]
    pub fn with_digest(&self, digest: &str) -> String {
        format!("{}@{digest}", self.name)
    }
}
