//! `push`: publish a local source tree as an OCI image.

use std::path::PathBuf;

use clap::Args;

use super::{publish_source, Context};
use crate::error::Result;

/// Push source code from a local path to the source image used by an accelerator.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator push --local-path <local path> --source-image <image>")]
pub struct PushCommand {
    /// Path to the directory containing the source for the accelerator.
    #[arg(long, required = true)]
    pub local_path: PathBuf,

    /// Name of the source image for the accelerator.
    #[arg(long, required = true)]
    pub source_image: String,
}

impl PushCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns reference, archive and registry failures.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let digested = publish_source(ctx, &self.local_path, &self.source_image, "accelerator").await?;
        ctx.streams.info(&digested)
    }
}
