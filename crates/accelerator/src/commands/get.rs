//! `get`: describe one accelerator.

use clap::Args;

use super::{Context, NamespaceArgs, ServerArgs};
use crate::config::resolve_listing_server_url;
use crate::error::{CommandError, Result};
use crate::format::describe;
use crate::server::AcceleratorServer;

/// Get accelerator info.
///
/// The accelerator comes from the Application Accelerator server by default, or
/// from the current Kubernetes context with `--from-context`.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator get <accelerator-name> --from-context")]
pub struct GetCommand {
    /// Name of the accelerator.
    pub name: Option<String>,

    #[command(flatten)]
    pub namespace: NamespaceArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Retrieve resources from the current context defined in kubeconfig.
    #[arg(long)]
    pub from_context: bool,
}

impl GetCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns [`CommandError::NotFound`] for an unknown accelerator, and server or
    /// cluster failures.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let name = self.name.as_deref().ok_or_else(|| {
            CommandError::Validation("you must specify the name of the accelerator".to_string())
        })?;

        if self.from_context || ctx.cluster_selected {
            let clients = ctx.cluster.connect().await?;
            let accelerator = clients
                .accelerators
                .get(&self.namespace.namespace, name)
                .await?;
            return ctx.streams.print(&describe::cluster_accelerator(&accelerator));
        }

        let url = resolve_listing_server_url(self.server.server_url.as_deref())?;
        let server = AcceleratorServer::connect(url).await?;
        let accelerator = server
            .list_accelerators()
            .await?
            .into_iter()
            .find(|accelerator| accelerator.name == name)
            .ok_or_else(|| CommandError::NotFound(format!("accelerator {name} not found")))?;
        let options = server.accelerator_options(name).await?;
        ctx.streams
            .print(&describe::server_accelerator(&accelerator, &options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;
    use crate::commands::Command;
    use crate::config::DEFAULT_NAMESPACE;
    use crate::crds::{Accelerator, AcceleratorSpec, AcceleratorStatus, ArtifactInfo, GitSource};
    use crate::error::ErrorKind;
    use crate::resources::memory::MemoryCluster;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn command(name: &str, server_url: Option<String>, from_context: bool) -> Command {
        Command::Get(GetCommand {
            name: Some(name.to_string()),
            namespace: NamespaceArgs {
                namespace: DEFAULT_NAMESPACE.to_string(),
            },
            server: ServerArgs { server_url },
            from_context,
        })
    }

    async fn catalog() -> MockServer {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/proxy/accelerators"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_embedded": {"accelerators": [{
                    "name": "spring",
                    "description": "Spring Boot",
                    "displayName": "Spring",
                    "specGitRepositoryUrl": "https://github.com/acme/spring",
                    "sourceBranch": "main",
                    "tags": ["java"],
                    "ready": true,
                    "archiveReady": true,
                    "archiveUrl": "http://source/spring.tar.gz"
                }]}
            })))
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/proxy/accelerators/options"))
            .and(query_param("name", "spring"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "options": [{"name": "javaVersion", "defaultValue": "17", "dataType": "string"}]
            })))
            .mount(&mock)
            .await;
        mock
    }

    #[tokio::test]
    async fn test_get_from_server() {
        let mock = catalog().await;
        let cluster = MemoryCluster::new();
        let (result, output) =
            run(command("spring", Some(mock.uri()), false), &cluster.clients(), false).await;
        result.unwrap();
        assert!(output.out.starts_with("name: spring\ndescription: Spring Boot\n"));
        assert!(output.out.contains("javaVersion"));
        assert!(output.out.contains("  url: http://source/spring.tar.gz\n"));
    }

    #[tokio::test]
    async fn test_get_unknown_from_server() {
        let mock = catalog().await;
        let cluster = MemoryCluster::new();
        let (result, _) = run(command("web", Some(mock.uri()), false), &cluster.clients(), false).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "accelerator web not found");
    }

    #[tokio::test]
    async fn test_get_from_context() {
        let cluster = MemoryCluster::new();
        let mut accelerator = Accelerator::new(
            "spring",
            AcceleratorSpec {
                git: Some(GitSource {
                    url: "https://github.com/acme/spring".into(),
                    ..GitSource::default()
                }),
                ..AcceleratorSpec::default()
            },
        );
        accelerator.status = Some(AcceleratorStatus {
            description: Some("Spring Boot".into()),
            artifact_info: Some(ArtifactInfo {
                ready: true,
                url: "http://source/spring.tar.gz".into(),
                ..ArtifactInfo::default()
            }),
            ..AcceleratorStatus::default()
        });
        cluster.accelerators.insert(accelerator, DEFAULT_NAMESPACE);

        let (result, output) = run(command("spring", None, true), &cluster.clients(), false).await;
        result.unwrap();
        assert!(output
            .out
            .starts_with("name: spring\nnamespace: accelerator-system\ndescription: Spring Boot\n"));
        assert!(output.out.contains("  url: https://github.com/acme/spring\n"));
        assert!(output.out.contains("ready: true\n"));
    }
}
