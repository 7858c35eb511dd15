//! `generate-from-local`: compose registered and local sources into a project.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use super::{Context, OptionsArgs, ServerArgs};
use crate::config::resolve_server_url;
use crate::error::{CommandError, Result};
use crate::packaging::{
    extract_project, AcceleratorSource, GenerationRequest, OverwritePolicy, SourceBundle,
};
use crate::server::AcceleratorServer;
use crate::validation::{validate, Constraint, FlagSet};

const ACCELERATOR_SOURCE: Constraint =
    Constraint::exactly_one_of(&["accelerator-name", "accelerator-path"])
        .missing_message("no accelerator, you must provide --accelerator-name or --accelerator-path");

/// Generate a project from a combination of local files and registered
/// accelerators and fragments.
///
/// Options are a JSON object matching the options the accelerator declares. A
/// `projectName` option defaults to the accelerator name and names the output
/// directory.
#[derive(Args, Debug, Default)]
#[command(
    after_help = "Example:\n  accelerator generate-from-local --accelerator-path java-rest=workspace/java-rest \\\n    --fragment-paths java-version=workspace/version --fragment-names tap-workload \\\n    --options '{\"projectName\":\"test\"}'"
)]
pub struct GenerateFromLocalCommand {
    /// Name of the registered accelerator to use.
    #[arg(long)]
    pub accelerator_name: Option<String>,

    /// Name and path of the directory containing the accelerator, as name=path.
    #[arg(long)]
    pub accelerator_path: Option<String>,

    /// Names of the registered fragments to use.
    #[arg(long, value_delimiter = ',')]
    pub fragment_names: Vec<String>,

    /// Name and path of a directory containing a fragment, as name=path.
    #[arg(long, value_delimiter = ',')]
    pub fragment_paths: Vec<String>,

    #[command(flatten)]
    pub options: OptionsArgs,

    /// The directory that the project will be created in (defaults to the project name).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Force clean and rewrite of the output directory.
    #[arg(short, long)]
    pub force: bool,
}

fn parse_bundle(value: &str) -> Result<SourceBundle> {
    value.parse().map_err(CommandError::Validation)
}

impl GenerateFromLocalCommand {
    /// Assemble the multipart request from the flags.
    ///
    /// # Errors
    /// Returns validation errors for the flags and archive errors for the local
    /// directories.
    pub fn request(&self) -> Result<GenerationRequest> {
        let name = self.accelerator_name.clone().filter(|name| !name.is_empty());
        let path = self.accelerator_path.as_deref().filter(|path| !path.is_empty());
        validate(
            &FlagSet::new()
                .with("accelerator-name", name.is_some())
                .with("accelerator-path", path.is_some()),
            &[ACCELERATOR_SOURCE],
        )?;

        let path = path.map(parse_bundle).transpose()?;
        let source = AcceleratorSource::from_flags(name, path)?;
        let options = self.options.load()?;

        let mut builder = GenerationRequest::builder(source).options(options);
        for name in &self.fragment_names {
            builder = builder.fragment_name(name.clone());
        }
        for value in &self.fragment_paths {
            builder = builder.fragment_bundle(parse_bundle(value)?);
        }
        builder.build()
    }

    /// Run the command.
    ///
    /// # Errors
    /// Returns any validation, transport, remote or extraction failure.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let request = self.request()?;
        let project_name = request.project_name().to_string();

        let url = resolve_server_url(self.server.server_url.as_deref())?;
        let server = AcceleratorServer::connect(url).await?;
        let archive = server.generate_from_local(request).await?;

        let target = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&project_name));
        let written = extract_project(&archive, &target, OverwritePolicy::from_force(self.force))?;
        info!(project = %project_name, target = %target.display(), files = written, "generated project");

        ctx.streams.success(&format!("generated project {project_name}"))
    }
}
