//! `fragment list`: show fragments in a namespace.

use clap::Args;

use crate::commands::{Context, NamespaceArgs};
use crate::error::Result;
use crate::format::table;

/// List all accelerator fragments.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator fragment list --namespace <namespace>")]
pub struct FragmentListCommand {
    #[command(flatten)]
    pub namespace: NamespaceArgs,
}

impl FragmentListCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let clients = ctx.cluster.connect().await?;
        let fragments = clients
            .fragments
            .list(&self.namespace.namespace, None)
            .await?;
        if fragments.is_empty() {
            return ctx.streams.info("No accelerator fragments found.");
        }
        ctx.streams.print(&table::fragments(&fragments))
    }
}
