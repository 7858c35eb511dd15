//! Error types shared by every command.
//!
//! Each variant carries the exact text shown to the user, so the message a command
//! returns and the line printed on failure are always the same string.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = CommandError> = std::result::Result<T, E>;

/// Coarse classification of a [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    NotFound,
    Remote,
    Conflict,
    Io,
    Cluster,
    Transport,
}

/// Errors produced while running a command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Bad or conflicting flags, malformed options, missing required source.
    #[error("{0}")]
    Validation(String),

    /// Missing configuration such as the server URL.
    #[error("{0}")]
    Configuration(String),

    /// A 404 from the accelerator server, the registry or the cluster.
    #[error("{0}")]
    NotFound(String),

    /// Non-success response from a remote service.
    #[error("{0}")]
    Remote(String),

    /// Target already holds data and overwriting was not requested.
    #[error("{0}")]
    Conflict(String),

    /// Filesystem or archive failure.
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Kubernetes API failure other than not-found.
    #[error("{context}: {source}")]
    Cluster {
        context: String,
        #[source]
        source: kube::Error,
    },

    /// Connection-level HTTP failure.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },
}

impl CommandError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Remote(_) => ErrorKind::Remote,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cluster { .. } => ErrorKind::Cluster,
            Self::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Build a `map_err` adapter that attaches `message` to an I/O error.
    pub fn io(message: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let message = message.into();
        move |source| Self::Io { message, source }
    }

    /// Build a `map_err` adapter for HTTP transport failures.
    pub fn transport(context: impl Into<String>) -> impl FnOnce(reqwest::Error) -> Self {
        let context = context.into();
        move |source| Self::Transport { context, source }
    }

    /// Build a `map_err` adapter for Kubernetes API failures.
    ///
    /// A 404 from the API server becomes [`CommandError::NotFound`] with `not_found`
    /// as its message; everything else is wrapped with `context`.
    pub fn cluster(
        context: impl Into<String>,
        not_found: impl Into<String>,
    ) -> impl FnOnce(kube::Error) -> Self {
        let context = context.into();
        let not_found = not_found.into();
        move |source| match source {
            kube::Error::Api(ref response) if response.code == 404 => Self::NotFound(not_found),
            source => Self::Cluster { context, source },
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: "I/O error".to_string(),
            source,
        }
    }
}

impl From<walkdir::Error> for CommandError {
    fn from(err: walkdir::Error) -> Self {
        let message = match err.path() {
            Some(path) => format!("could not read {}", path.display()),
            None => "could not walk directory".to_string(),
        };
        Self::Io {
            message,
            source: err.into(),
        }
    }
}

impl From<zip::result::ZipError> for CommandError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(source) => Self::Io {
                message: "could not read generated archive".to_string(),
                source,
            },
            other => Self::Io {
                message: "invalid generated archive".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
            },
        }
    }
}
