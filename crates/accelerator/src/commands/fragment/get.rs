//! `fragment get`: describe one fragment and the objects importing it.

use clap::Args;
use kube::ResourceExt;
use tracing::warn;

use super::MISSING_NAME;
use crate::commands::{Context, NamespaceArgs};
use crate::crds::imports_label;
use crate::error::{CommandError, Result};
use crate::format::describe::{self, Importers};
use crate::resources::{NamespacedResource, ResourceClient};

/// Get accelerator fragment info.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator fragment get <fragment-name>")]
pub struct FragmentGetCommand {
    /// Name of the accelerator fragment.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,
}

/// Names of the objects labelled as importing `fragment`, or `None` when the
/// listing failed.
async fn importing<K: NamespacedResource>(
    client: &dyn ResourceClient<K>,
    namespace: &str,
    fragment: &str,
) -> Option<Vec<String>> {
    match client.list(namespace, Some(&imports_label(fragment))).await {
        Ok(objects) => Some(objects.iter().map(ResourceExt::name_any).collect()),
        Err(err) => {
            warn!(error = %err, kind = K::NOUN, "could not list importing objects");
            None
        }
    }
}

impl FragmentGetCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] for an unknown fragment and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| CommandError::Validation(MISSING_NAME.to_string()))?;
        let namespace = &self.namespace.namespace;

        let clients = ctx.cluster.connect().await?;
        let fragment = clients.fragments.get(namespace, name).await?;
        let importers = Importers {
            accelerators: importing(&*clients.accelerators, namespace, name).await,
            fragments: importing(&*clients.fragments, namespace, name).await,
        };
        ctx.streams.print(&describe::fragment(&fragment, &importers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fragment::FragmentCommand;
    use crate::commands::testing::run;
    use crate::commands::Command;
    use crate::config::DEFAULT_NAMESPACE;
    use crate::crds::{Accelerator, AcceleratorSpec, Fragment, FragmentSpec, GitSource};
    use crate::error::ErrorKind;
    use crate::resources::memory::MemoryCluster;

    fn command(name: &str) -> Command {
        Command::Fragment(FragmentCommand::Get(FragmentGetCommand {
            name: Some(name.to_string()),
            namespace: NamespaceArgs {
                namespace: DEFAULT_NAMESPACE.to_string(),
            },
        }))
    }

    fn fragment(name: &str) -> Fragment {
        Fragment::new(
            name,
            FragmentSpec {
                git: Some(GitSource {
                    url: "https://github.com/acme/fragments".into(),
                    ..GitSource::default()
                }),
                ..FragmentSpec::default()
            },
        )
    }

    #[tokio::test]
    async fn test_get_lists_importers() {
        let cluster = MemoryCluster::new();
        cluster.fragments.insert(fragment("java-version"), DEFAULT_NAMESPACE);

        let mut importer = Accelerator::new("spring", AcceleratorSpec::default());
        importer
            .labels_mut()
            .insert(imports_label("java-version"), String::new());
        cluster.accelerators.insert(importer, DEFAULT_NAMESPACE);
        cluster
            .accelerators
            .insert(Accelerator::new("web", AcceleratorSpec::default()), DEFAULT_NAMESPACE);

        let mut composite = fragment("build-tools");
        composite
            .labels_mut()
            .insert(imports_label("java-version"), String::new());
        cluster.fragments.insert(composite, DEFAULT_NAMESPACE);

        let (result, output) = run(command("java-version"), &cluster.clients(), false).await;
        result.unwrap();
        assert!(output
            .out
            .starts_with("name: java-version\nnamespace: accelerator-system\n"));
        assert!(output
            .out
            .ends_with("importedBy:\n  accelerator/spring\n  fragment/build-tools\n"));
    }

    #[tokio::test]
    async fn test_get_without_importers() {
        let cluster = MemoryCluster::new();
        cluster.fragments.insert(fragment("java-version"), DEFAULT_NAMESPACE);

        let (result, output) = run(command("java-version"), &cluster.clients(), false).await;
        result.unwrap();
        assert!(output.out.ends_with("importedBy:\n  None\n"));
    }

    #[tokio::test]
    async fn test_get_missing_fragment() {
        let cluster = MemoryCluster::new();
        let (result, output) = run(command("java-version"), &cluster.clients(), false).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            output.err,
            "Error: accelerator fragment java-version not found\n"
        );
    }
}
