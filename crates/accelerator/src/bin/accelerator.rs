//! `accelerator` binary.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use accelerator::commands::{Command, Context};
use accelerator::resources::KubeConnector;
use accelerator::ui::Streams;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Manage accelerators and generate projects from them.
#[derive(Parser)]
#[command(
    name = "accelerator",
    version,
    about = "Manage accelerators in a Kubernetes cluster",
    long_about = "Manage Application Accelerator resources in a Kubernetes cluster,\n\
                  browse the accelerator server and generate projects from\n\
                  registered or local accelerators and fragments."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the kubeconfig file to use for CLI requests.
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Name of the kubeconfig context to use.
    #[arg(long, global = true)]
    context: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Deactivate color, bold, animations and emoji output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info,accelerator=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let connector = KubeConnector {
        kubeconfig: cli.kubeconfig.clone(),
        context: cli.context.clone(),
    };
    let color = !cli.no_color && std::io::stdout().is_terminal();
    let cluster_selected = cli.kubeconfig.is_some() || cli.context.is_some();

    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    let mut ctx = Context::new(Streams::new(&mut out, &mut err).with_color(color), &connector)
        .with_cluster_selected(cluster_selected);

    match cli.command.execute(&mut ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
