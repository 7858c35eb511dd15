//! `generate`: download a project zip for a registered accelerator.

use std::path::PathBuf;

use clap::Args;
use tracing::{info, warn};

use super::{Context, OptionsArgs, ServerArgs};
use crate::config::{resolve_project_name, resolve_server_url};
use crate::error::{CommandError, Result};
use crate::server::{AcceleratorServer, Tracking};

/// Generate a project from an accelerator and download it as a ZIP file.
///
/// Options are a JSON object matching the options the accelerator declares; see
/// `accelerator get <name>`. A `projectName` option defaults to the accelerator
/// name and names the ZIP file.
#[derive(Args, Debug, Default)]
#[command(
    after_help = "Example:\n  accelerator generate <accelerator-name> --options '{\"projectName\":\"test\"}'"
)]
pub struct GenerateCommand {
    /// Name of the accelerator.
    pub name: Option<String>,

    #[command(flatten)]
    pub options: OptionsArgs,

    /// Directory that the zip file will be written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub server: ServerArgs,
}

impl GenerateCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns validation, transport, remote and file write failures. Tracking
    /// failures are reported as warnings only.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self.name.as_deref().ok_or_else(|| {
            CommandError::Validation("you must specify the name of the accelerator".to_string())
        })?;
        let mut options = self.options.load()?;
        let project_name = resolve_project_name(&mut options, name)?;

        let url = resolve_server_url(self.server.server_url.as_deref())?;
        let server = AcceleratorServer::connect(url).await?;
        let tracking = Tracking::current();
        let archive = server.generate(name, &options, &tracking).await?;

        let file_name = format!("{project_name}.zip");
        let zip_file = match &self.output_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        };
        std::fs::write(&zip_file, &archive).map_err(CommandError::io(format!(
            "could not write {}",
            zip_file.display()
        )))?;
        info!(accelerator = name, file = %zip_file.display(), bytes = archive.len(), "wrote project zip");
        ctx.streams
            .success(&format!("zip file {} created", zip_file.display()))?;

        if let Err(err) = server.register_download(name, &tracking).await {
            warn!(accelerator = name, error = %err, "could not register download");
            ctx.streams.warning(&err.to_string())?;
        }
        Ok(())
    }
}
