//! `kube::Api` backed resource client.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use tracing::debug;

use super::{Clients, ClusterConnector, NamespacedResource, ResourceClient};
use crate::crds::{Accelerator, Fragment};
use crate::error::{CommandError, Result};

/// Resource client talking to a live API server.
pub struct KubeResourceClient<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K: NamespacedResource> KubeResourceClient<K> {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl<K: NamespacedResource> ResourceClient<K> for KubeResourceClient<K> {
    async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        debug!(namespace, name, kind = K::NOUN, "get");
        self.api(namespace).get(name).await.map_err(CommandError::cluster(
            format!("Error getting {} {name}", K::NOUN),
            format!("{} {name} not found", K::NOUN),
        ))
    }

    async fn list(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<K>> {
        debug!(namespace, ?label_selector, kind = K::NOUN, "list");
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        let list = self.api(namespace).list(&params).await.map_err(CommandError::cluster(
            format!("There was an error listing {}s", K::NOUN),
            format!("namespace {namespace} not found"),
        ))?;
        Ok(list.items)
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.name_any();
        debug!(namespace, name = %name, kind = K::NOUN, "create");
        self.api(namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(CommandError::cluster(
                format!("Error creating {} {name}", K::NOUN),
                format!("namespace {namespace} not found"),
            ))
    }

    async fn replace(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.name_any();
        debug!(namespace, name = %name, kind = K::NOUN, "replace");
        self.api(namespace)
            .replace(&name, &PostParams::default(), object)
            .await
            .map_err(CommandError::cluster(
                format!("there was an error updating {} {name}", K::NOUN),
                format!("{} {name} not found", K::NOUN),
            ))
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        debug!(namespace, name, kind = K::NOUN, "delete");
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(CommandError::cluster(
                format!("Error deleting {} {name}", K::NOUN),
                format!("{} {name} not found", K::NOUN),
            ))?;
        Ok(())
    }
}

/// Builds cluster clients from `--kubeconfig` / `--context`, or the inferred config.
#[derive(Debug, Clone, Default)]
pub struct KubeConnector {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl KubeConnector {
    async fn load_config(&self) -> anyhow::Result<Config> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..KubeConfigOptions::default()
        };

        match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig from {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("Failed to create Kubernetes config from kubeconfig")
            }
            (None, Some(context)) => Config::from_kubeconfig(&options)
                .await
                .with_context(|| format!("Failed to load kubeconfig context {context}")),
            (None, None) => Config::infer()
                .await
                .context("Failed to infer Kubernetes configuration"),
        }
    }
}

#[async_trait]
impl ClusterConnector for KubeConnector {
    async fn connect(&self) -> Result<Clients> {
        let config = self
            .load_config()
            .await
            .map_err(|e| CommandError::Configuration(format!("{e:#}")))?;
        let client = Client::try_from(config)
            .context("Failed to create Kubernetes client")
            .map_err(|e| CommandError::Configuration(format!("{e:#}")))?;

        Ok(Clients {
            accelerators: Arc::new(KubeResourceClient::<Accelerator>::new(client.clone())),
            fragments: Arc::new(KubeResourceClient::<Fragment>::new(client)),
        })
    }
}
