//! Application Accelerator command-line library.
//!
//! Manages `Accelerator` and `Fragment` custom resources in a Kubernetes cluster,
//! talks to the accelerator server to browse and generate projects, and packages
//! local accelerator and fragment sources for generation or OCI publishing.
//!
//! # Example
//!
//! ```ignore
//! use accelerator::commands::{Command, Context};
//! use accelerator::resources::KubeConnector;
//! use accelerator::ui::Streams;
//!
//! let connector = KubeConnector::default();
//! let (mut out, mut err) = (std::io::stdout(), std::io::stderr());
//! let mut ctx = Context::new(Streams::new(&mut out, &mut err), &connector);
//! command.execute(&mut ctx).await?;
//! ```

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

pub mod commands;
pub mod config;
pub mod crds;
pub mod error;
pub mod format;
pub mod merge;
pub mod packaging;
pub mod registry;
pub mod resources;
pub mod server;
pub mod ui;
pub mod validation;

pub use error::{CommandError, ErrorKind, Result};
