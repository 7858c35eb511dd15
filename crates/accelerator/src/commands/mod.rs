//! Command handlers.
//!
//! Every subcommand is a clap [`Args`] struct with an async `run` taking a
//! [`Context`]. Handlers write through [`Streams`] and reach the cluster only
//! through [`ClusterConnector`].

pub mod apply;
pub mod create;
pub mod delete;
pub mod fragment;
pub mod generate;
pub mod generate_local;
pub mod get;
pub mod list;
pub mod push;
pub mod update;

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::{load_options, DEFAULT_NAMESPACE};
use crate::error::{CommandError, Result};
use crate::merge::{SourceOverrides, SpecOverrides};
use crate::registry::{ImageReference, RegistryClient};
use crate::resources::ClusterConnector;
use crate::ui::Streams;
use crate::validation::{validate, Constraint, FlagSet};

/// Everything a command needs from its environment.
pub struct Context<'a> {
    pub streams: Streams<'a>,
    pub cluster: &'a dyn ClusterConnector,
    /// `--context` or `--kubeconfig` was given.
    pub cluster_selected: bool,
}

impl<'a> Context<'a> {
    pub fn new(streams: Streams<'a>, cluster: &'a dyn ClusterConnector) -> Self {
        Self {
            streams,
            cluster,
            cluster_selected: false,
        }
    }

    #[must_use]
    pub fn with_cluster_selected(mut self, selected: bool) -> Self {
        self.cluster_selected = selected;
        self
    }
}

/// Accelerator subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new accelerator.
    Create(create::CreateCommand),

    /// Update an accelerator.
    Update(update::UpdateCommand),

    /// Delete an accelerator.
    Delete(delete::DeleteCommand),

    /// List accelerators.
    List(list::ListCommand),

    /// Get accelerator info.
    Get(get::GetCommand),

    /// Apply accelerator or fragment configuration from a file.
    Apply(apply::ApplyCommand),

    /// Push local path to source image.
    Push(push::PushCommand),

    /// Generate project from accelerator.
    Generate(generate::GenerateCommand),

    /// Generate project from a combination of registered and local artifacts.
    GenerateFromLocal(generate_local::GenerateFromLocalCommand),

    /// Manage accelerator fragments.
    #[command(subcommand, visible_alias = "frag")]
    Fragment(fragment::FragmentCommand),
}

impl Command {
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
            Self::Apply(cmd) => cmd.run(ctx).await,
            Self::Push(cmd) => cmd.run(ctx).await,
            Self::Generate(cmd) => cmd.run(ctx).await,
            Self::GenerateFromLocal(cmd) => cmd.run(ctx).await,
            Self::Fragment(cmd) => cmd.run(ctx).await,
        }
    }

    /// Run the command and report a failure on the error stream.
    ///
    /// # Errors
    /// Returns the command's failure after printing it.
    pub async fn execute(&self, ctx: &mut Context<'_>) -> Result<()> {
        let result = self.run(ctx).await;
        if let Err(err) = &result {
            if let Err(write_err) = ctx.streams.error(err) {
                warn!(error = %write_err, "could not report command failure");
            }
        }
        result
    }
}

/// Namespace flag shared by cluster commands.
#[derive(Args, Debug, Clone)]
pub struct NamespaceArgs {
    /// Namespace for accelerators.
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

/// Descriptive fields of an accelerator.
#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    /// Display name for the accelerator.
    #[arg(long)]
    pub display_name: Option<String>,

    /// Description of this accelerator.
    #[arg(long)]
    pub description: Option<String>,

    /// URL for icon to use with the accelerator.
    #[arg(long)]
    pub icon_url: Option<String>,

    /// Tags that can be used to search for accelerators.
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
}

/// Where the controller pulls source from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Git repository URL.
    #[arg(long, visible_alias = "git-repo")]
    pub git_repository: Option<String>,

    /// Git repository branch to be used.
    #[arg(long)]
    pub git_branch: Option<String>,

    /// Git repository tag to be used.
    #[arg(long)]
    pub git_tag: Option<String>,

    /// Directory within the Git repository to use as the root.
    #[arg(long)]
    pub git_sub_path: Option<String>,

    /// Interval for checking for updates to the Git or image repository.
    #[arg(long)]
    pub interval: Option<String>,

    /// Name of the source image.
    #[arg(long)]
    pub source_image: Option<String>,

    /// Name of secret containing credentials for a private Git or image repository.
    #[arg(long)]
    pub secret_ref: Option<String>,
}

impl SourceArgs {
    #[must_use]
    pub fn overrides(&self) -> SourceOverrides {
        SourceOverrides {
            git_repository: self.git_repository.clone(),
            git_branch: self.git_branch.clone(),
            git_tag: self.git_tag.clone(),
            git_sub_path: self.git_sub_path.clone(),
            interval: self.interval.clone(),
            source_image: self.source_image.clone(),
            secret_ref: self.secret_ref.clone(),
        }
    }
}

fn is_set(value: Option<&String>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

/// Source selection rules for `create` commands.
///
/// # Errors
/// Returns [`CommandError::Validation`] for a missing or ambiguous source.
pub fn validate_new_source(source: &SourceArgs, local_path: Option<&PathBuf>) -> Result<()> {
    let flags = FlagSet::new()
        .with("git-repository", is_set(source.git_repository.as_ref()))
        .with("source-image", is_set(source.source_image.as_ref()))
        .with("local-path", local_path.is_some());
    validate(
        &flags,
        &[
            Constraint::at_least_one_of(&["git-repository", "source-image", "local-path"])
                .missing_message("you must provide --git-repository or --source-image"),
            Constraint::at_most_one_of(&["git-repository", "source-image"]),
            Constraint::requires("local-path", "source-image"),
        ],
    )
}

/// Flags merged into an accelerator spec.
#[must_use]
pub fn spec_overrides(metadata: &MetadataArgs, source: &SourceArgs) -> SpecOverrides {
    SpecOverrides {
        display_name: metadata.display_name.clone(),
        description: metadata.description.clone(),
        icon_url: metadata.icon_url.clone(),
        tags: metadata.tags.clone(),
        source: source.overrides(),
    }
}

/// Server URL flag.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// The URL for the Application Accelerator server.
    #[arg(long)]
    pub server_url: Option<String>,
}

/// Generation options given inline or as a file.
#[derive(Args, Debug, Clone, Default)]
pub struct OptionsArgs {
    /// Options JSON string.
    #[arg(long)]
    pub options: Option<String>,

    /// Path to file containing options JSON.
    #[arg(long)]
    pub options_file: Option<PathBuf>,
}

impl OptionsArgs {
    /// Parse whichever of the two flags was given.
    ///
    /// # Errors
    /// Returns [`CommandError::Validation`] when both are given or the JSON
    /// is malformed.
    pub fn load(&self) -> Result<Map<String, Value>> {
        validate(
            &FlagSet::new()
                .with("options", self.options.is_some())
                .with("options-file", self.options_file.is_some()),
            &[Constraint::at_most_one_of(&["options", "options-file"])],
        )?;
        load_options(self.options.as_deref(), self.options_file.as_deref())
    }
}

/// Push `path` to `image`, returning the digested reference.
///
/// # Errors
/// Returns reference parse, archive and registry errors.
pub async fn publish_source(
    ctx: &mut Context<'_>,
    path: &Path,
    image: &str,
    noun: &str,
) -> Result<String> {
    let reference = ImageReference::parse(image)?;
    if !path.is_dir() {
        return Err(CommandError::NotFound(format!(
            "cannot find directory {}",
            path.display()
        )));
    }
    ctx.streams.info(&format!(
        "publishing accelerator source in \"{}\" to \"{image}\"...",
        path.display()
    ))?;
    let digested = RegistryClient::from_env()?
        .push_directory(&reference, path)
        .await?;
    ctx.streams.success(&format!("published {noun}"))?;
    Ok(digested)
}
