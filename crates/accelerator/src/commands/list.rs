//! `list`: show accelerators from the server or the cluster.

use clap::Args;
use tracing::debug;

use super::{Context, NamespaceArgs, ServerArgs};
use crate::config::resolve_listing_server_url;
use crate::error::{CommandError, Result};
use crate::format::table;
use crate::server::AcceleratorServer;

/// List all accelerators.
///
/// Accelerators come from the Application Accelerator server by default
/// (`--server-url` or `ACC_SERVER_URL`), or from the current Kubernetes context
/// with `--from-context`.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator list")]
pub struct ListCommand {
    #[command(flatten)]
    pub namespace: NamespaceArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Retrieve resources from the current context defined in kubeconfig.
    #[arg(long)]
    pub from_context: bool,
}

impl ListCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns server or cluster failures, and [`CommandError::NotFound`] when the
    /// cluster holds no accelerators.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        if self.from_context || ctx.cluster_selected {
            return self.list_from_cluster(ctx).await;
        }

        let url = resolve_listing_server_url(self.server.server_url.as_deref())?;
        let accelerators = AcceleratorServer::connect(url)
            .await?
            .list_accelerators()
            .await?;
        debug!(count = accelerators.len(), "listed server accelerators");
        ctx.streams.print(&table::server_accelerators(&accelerators))
    }

    async fn list_from_cluster(&self, ctx: &mut Context<'_>) -> Result<()> {
        let clients = ctx.cluster.connect().await?;
        let accelerators = clients
            .accelerators
            .list(&self.namespace.namespace, None)
            .await?;
        if accelerators.is_empty() {
            return Err(CommandError::NotFound("no accelerators found".to_string()));
        }
        ctx.streams.print(&table::cluster_accelerators(&accelerators))
    }
}
