//! `fragment` subcommands.

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use clap::{Args, Subcommand};

use super::{Context, SourceArgs};
use crate::error::Result;
use crate::merge::SpecOverrides;

const MISSING_NAME: &str = "you must specify the name of the accelerator fragment";

/// Commands to manage accelerator fragments.
#[derive(Subcommand, Debug)]
pub enum FragmentCommand {
    /// Create a new accelerator fragment.
    Create(create::FragmentCreateCommand),

    /// Update an accelerator fragment.
    Update(update::FragmentUpdateCommand),

    /// Delete an accelerator fragment.
    Delete(delete::FragmentDeleteCommand),

    /// List accelerator fragments.
    List(list::FragmentListCommand),

    /// Get accelerator fragment info.
    Get(get::FragmentGetCommand),
}

impl FragmentCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns the command's failure.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        match self {
            Self::Create(cmd) => cmd.run(ctx).await,
            Self::Update(cmd) => cmd.run(ctx).await,
            Self::Delete(cmd) => cmd.run(ctx).await,
            Self::List(cmd) => cmd.run(ctx).await,
            Self::Get(cmd) => cmd.run(ctx).await,
        }
    }
}

/// Display name flag; fragments carry no other metadata.
#[derive(Args, Debug, Clone, Default)]
pub struct FragmentMetadataArgs {
    /// Display name for the accelerator fragment.
    #[arg(long)]
    pub display_name: Option<String>,
}

fn fragment_overrides(metadata: &FragmentMetadataArgs, source: &SourceArgs) -> SpecOverrides {
    SpecOverrides {
        display_name: metadata.display_name.clone(),
        source: source.overrides(),
        ..SpecOverrides::default()
    }
}
