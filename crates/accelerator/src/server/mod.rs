//! Accelerator server (catalog and generation) API.

pub mod client;
pub mod models;

pub use client::{AcceleratorServer, Tracking};
pub use models::{AcceleratorOption, Choice, ServerAccelerator};
