//! `update`: change an existing accelerator resource.

use chrono::Utc;
use clap::Args;
use tracing::info;

use super::{spec_overrides, Context, MetadataArgs, NamespaceArgs, SourceArgs};
use crate::error::{CommandError, Result};
use crate::merge::{overlay_accelerator_spec, request_reconcile};

/// Update an accelerator resource.
///
/// Only the given flags change; every other field keeps its stored value.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator update <accelerator-name> --description \"Lorem Ipsum\"")]
pub struct UpdateCommand {
    /// Name of the accelerator.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,

    #[command(flatten)]
    pub metadata: MetadataArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Trigger a reconciliation including the associated source resource.
    #[arg(long)]
    pub reconcile: bool,
}

impl UpdateCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] for an unknown accelerator, validation
    /// failures from the overlay and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self.name.as_deref().ok_or_else(|| {
            CommandError::Validation("you must specify the name of the accelerator".to_string())
        })?;
        let namespace = &self.namespace.namespace;

        let clients = ctx.cluster.connect().await?;
        let mut accelerator = clients.accelerators.get(namespace, name).await?;
        overlay_accelerator_spec(
            &mut accelerator.spec,
            &spec_overrides(&self.metadata, &self.source),
        )?;
        if self.reconcile {
            request_reconcile(&mut accelerator.metadata, Utc::now());
        }

        clients.accelerators.replace(namespace, &accelerator).await?;
        info!(name, namespace = %namespace, reconcile = self.reconcile, "updated accelerator");
        ctx.streams
            .success(&format!("accelerator {name} updated successfully"))
    }
}
