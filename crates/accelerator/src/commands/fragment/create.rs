//! `fragment create`: register a new fragment resource.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use super::{fragment_overrides, FragmentMetadataArgs, MISSING_NAME};
use crate::commands::{publish_source, validate_new_source, Context, NamespaceArgs, SourceArgs};
use crate::crds::{Fragment, FragmentSpec};
use crate::error::{CommandError, Result};
use crate::merge::overlay_fragment_spec;

/// Create a new accelerator fragment resource.
///
/// A Git repository or source image is required.
#[derive(Args, Debug)]
#[command(
    after_help = "Example:\n  accelerator fragment create <fragment-name> --git-repository <URL> --git-branch <branch> --git-sub-path <sub-path>"
)]
pub struct FragmentCreateCommand {
    /// Name of the accelerator fragment.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,

    #[command(flatten)]
    pub metadata: FragmentMetadataArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Path to the directory containing the source for the accelerator fragment.
    #[arg(long)]
    pub local_path: Option<PathBuf>,
}

impl FragmentCreateCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns validation failures, push failures and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| CommandError::Validation(MISSING_NAME.to_string()))?;
        validate_new_source(&self.source, self.local_path.as_ref())?;

        let mut source = self.source.clone();
        if let (Some(path), Some(image)) = (&self.local_path, &self.source.source_image) {
            source.source_image =
                Some(publish_source(ctx, path, image, "accelerator fragment").await?);
        }

        let namespace = &self.namespace.namespace;
        let mut fragment = Fragment::new(name, FragmentSpec::default());
        fragment.metadata.namespace = Some(namespace.clone());
        overlay_fragment_spec(&mut fragment.spec, &fragment_overrides(&self.metadata, &source))?;

        let clients = ctx.cluster.connect().await?;
        clients.fragments.create(namespace, &fragment).await?;
        info!(name, namespace = %namespace, "created fragment");

        ctx.streams.success(&format!(
            "created accelerator fragment {name} in namespace {namespace}"
        ))
    }
}
