//! `delete`: remove an accelerator resource.

use clap::Args;
use tracing::info;

use super::{Context, NamespaceArgs};
use crate::error::{CommandError, Result};

/// Delete an accelerator resource.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator delete <accelerator-name>")]
pub struct DeleteCommand {
    /// Name of the accelerator.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,
}

impl DeleteCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] for an unknown accelerator and cluster
    /// errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self.name.as_deref().ok_or_else(|| {
            CommandError::Validation("you must specify the name of the accelerator".to_string())
        })?;
        let namespace = &self.namespace.namespace;

        let clients = ctx.cluster.connect().await?;
        clients.accelerators.get(namespace, name).await?;
        clients.accelerators.delete(namespace, name).await?;
        info!(name, namespace = %namespace, "deleted accelerator");

        ctx.streams
            .success(&format!("deleted accelerator {name} in namespace {namespace}"))
    }
}
