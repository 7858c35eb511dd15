//! `fragment update`: change an existing fragment resource.

use chrono::Utc;
use clap::Args;
use tracing::info;

use super::{fragment_overrides, FragmentMetadataArgs, MISSING_NAME};
use crate::commands::{Context, NamespaceArgs, SourceArgs};
use crate::error::{CommandError, Result};
use crate::merge::{overlay_fragment_spec, request_reconcile};

/// Update an accelerator fragment resource.
#[derive(Args, Debug)]
#[command(
    after_help = "Example:\n  accelerator fragment update <fragment-name> --display-name \"Java version\""
)]
pub struct FragmentUpdateCommand {
    /// Name of the accelerator fragment.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,

    #[command(flatten)]
    pub metadata: FragmentMetadataArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Trigger a reconciliation including the associated source resource.
    #[arg(long)]
    pub reconcile: bool,
}

impl FragmentUpdateCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] for an unknown fragment, overlay
    /// validation failures and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| CommandError::Validation(MISSING_NAME.to_string()))?;
        let namespace = &self.namespace.namespace;

        let clients = ctx.cluster.connect().await?;
        let mut fragment = clients.fragments.get(namespace, name).await?;
        overlay_fragment_spec(
            &mut fragment.spec,
            &fragment_overrides(&self.metadata, &self.source),
        )?;
        if self.reconcile {
            request_reconcile(&mut fragment.metadata, Utc::now());
        }

        clients.fragments.replace(namespace, &fragment).await?;
        info!(name, namespace = %namespace, reconcile = self.reconcile, "updated fragment");
        ctx.streams
            .success(&format!("accelerator fragment {name} updated successfully"))
    }
}
