//! Publishing local source trees as OCI images.

pub mod client;
pub mod reference;

pub use client::RegistryClient;
pub use reference::ImageReference;
