//! `create`: register a new accelerator resource.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use super::{
    publish_source, spec_overrides, validate_new_source, Context, MetadataArgs, NamespaceArgs,
    SourceArgs,
};
use crate::crds::{Accelerator, AcceleratorSpec};
use crate::error::{CommandError, Result};
use crate::merge::overlay_accelerator_spec;

/// Create a new accelerator resource.
///
/// A Git repository or source image is required. Metadata flags override the
/// values found in the accelerator metadata in the repository.
#[derive(Args, Debug)]
#[command(
    after_help = "Example:\n  accelerator create <accelerator-name> --git-repository <URL> --git-branch <branch>"
)]
pub struct CreateCommand {
    /// Name of the accelerator.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,

    #[command(flatten)]
    pub metadata: MetadataArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Path to the directory containing the source for the accelerator.
    #[arg(long)]
    pub local_path: Option<PathBuf>,
}

impl CreateCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns validation failures, push failures and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self.name.as_deref().ok_or_else(|| {
            CommandError::Validation("you must specify the name of the accelerator".to_string())
        })?;
        validate_new_source(&self.source, self.local_path.as_ref())?;

        let mut source = self.source.clone();
        if let (Some(path), Some(image)) = (&self.local_path, &self.source.source_image) {
            source.source_image = Some(publish_source(ctx, path, image, "accelerator").await?);
        }

        let mut accelerator = Accelerator::new(name, AcceleratorSpec::default());
        accelerator.metadata.namespace = Some(self.namespace.namespace.clone());
        overlay_accelerator_spec(&mut accelerator.spec, &spec_overrides(&self.metadata, &source))?;

        let clients = ctx.cluster.connect().await?;
        clients
            .accelerators
            .create(&self.namespace.namespace, &accelerator)
            .await?;
        info!(name, namespace = %self.namespace.namespace, "created accelerator");

        ctx.streams.success(&format!(
            "created accelerator {name} in namespace {}",
            self.namespace.namespace
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{registry, run, MANIFEST_DIGEST};
    use crate::commands::Command;
    use crate::config::DEFAULT_NAMESPACE;
    use crate::error::ErrorKind;
    use crate::resources::memory::MemoryCluster;
    use std::fs;
    use tempfile::TempDir;

    fn command(name: &str) -> CreateCommand {
        CreateCommand {
            name: Some(name.to_string()),
            namespace: NamespaceArgs {
                namespace: DEFAULT_NAMESPACE.to_string(),
            },
            metadata: MetadataArgs::default(),
            source: SourceArgs::default(),
            local_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_from_git() {
        let cluster = MemoryCluster::new();
        let mut create = command("spring");
        create.metadata.description = Some("Spring Boot app".into());
        create.metadata.tags = vec!["java".into(), "spring".into()];
        create.source.git_repository = Some("https://github.com/acme/spring".into());
        create.source.git_branch = Some("main".into());
        create.source.interval = Some("5m".into());
        create.source.secret_ref = Some("git-creds".into());

        let (result, output) = run(Command::Create(create), &cluster.clients(), false).await;
        result.unwrap();
        assert_eq!(
            output.out,
            "created accelerator spring in namespace accelerator-system\n"
        );

        let stored = cluster.accelerators.stored(DEFAULT_NAMESPACE, "spring").unwrap();
        assert_eq!(stored.spec.description.as_deref(), Some("Spring Boot app"));
        assert_eq!(stored.spec.tags, Some(vec!["java".into(), "spring".into()]));
        let git = stored.spec.git.unwrap();
        assert_eq!(git.url, "https://github.com/acme/spring");
        assert_eq!(git.reference.unwrap().branch.as_deref(), Some("main"));
        assert_eq!(git.interval.as_deref(), Some("5m"));
        assert_eq!(git.secret_ref.unwrap().name, "git-creds");
        assert!(stored.spec.source.is_none());
    }

    #[tokio::test]
    async fn test_create_from_image_with_pull_secret() {
        let cluster = MemoryCluster::new();
        let mut create = command("tools");
        create.source.source_image = Some("registry.example.com/tools:1.0".into());
        create.source.secret_ref = Some("pull".into());

        let (result, _) = run(Command::Create(create), &cluster.clients(), false).await;
        result.unwrap();
        let source = cluster
            .accelerators
            .stored(DEFAULT_NAMESPACE, "tools")
            .unwrap()
            .spec
            .source
            .unwrap();
        assert_eq!(source.image, "registry.example.com/tools:1.0");
        assert_eq!(source.image_pull_secrets.unwrap()[0].name, "pull");
    }

    #[tokio::test]
    async fn test_create_pushes_local_path() {
        let cluster = MemoryCluster::new();
        let source_dir = TempDir::new().unwrap();
        fs::write(source_dir.path().join("accelerator.yaml"), "accelerator: {}\n").unwrap();
        let mock = registry("local-acc").await;

        let mut create = command("local-acc");
        create.local_path = Some(source_dir.path().to_path_buf());
        create.source.source_image = Some(format!("{}/local-acc:dev", mock.address()));

        let (result, output) = run(Command::Create(create), &cluster.clients(), false).await;
        result.unwrap();
        assert!(output.out.contains("published accelerator\n"));
        assert!(output
            .out
            .ends_with("created accelerator local-acc in namespace accelerator-system\n"));

        let stored = cluster.accelerators.stored(DEFAULT_NAMESPACE, "local-acc").unwrap();
        assert_eq!(
            stored.spec.source.unwrap().image,
            format!("{}/local-acc@{MANIFEST_DIGEST}", mock.address())
        );
    }

    #[tokio::test]
    async fn test_create_validation() {
        let cluster = MemoryCluster::new();
        let (result, output) = run(Command::Create(command("spring")), &cluster.clients(), false).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            output.err,
            "Error: you must provide --git-repository or --source-image\n"
        );

        let mut create = command("spring");
        create.name = None;
        let (result, _) = run(Command::Create(create), &cluster.clients(), false).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "you must specify the name of the accelerator"
        );

        let mut create = command("spring");
        create.source.source_image = Some("registry.example.com/acc".into());
        create.source.git_branch = Some("main".into());
        let (result, _) = run(Command::Create(create), &cluster.clients(), false).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .starts_with("--git-branch can only be used with a git source"));
    }
}
