//! `fragment delete`: remove a fragment resource.

use clap::Args;
use tracing::info;

use super::MISSING_NAME;
use crate::commands::{Context, NamespaceArgs};
use crate::error::{CommandError, Result};

/// Delete an accelerator fragment resource.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator fragment delete <fragment-name>")]
pub struct FragmentDeleteCommand {
    /// Name of the accelerator fragment.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,
}

impl FragmentDeleteCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] for an unknown fragment and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| CommandError::Validation(MISSING_NAME.to_string()))?;
        let namespace = &self.namespace.namespace;

        let clients = ctx.cluster.connect().await?;
        clients.fragments.get(namespace, name).await?;
        clients.fragments.delete(namespace, name).await?;
        info!(name, namespace = %namespace, "deleted fragment");

        ctx.streams.success(&format!(
            "deleted accelerator fragment {name} in namespace {namespace}"
        ))
    }
}
