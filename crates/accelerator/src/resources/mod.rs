//! Typed access to namespaced accelerator resources.
//!
//! Commands talk to a [`ResourceClient`] rather than to `kube::Api` directly so the
//! same handlers run against a live cluster or an in-memory store in tests.

mod kube_client;

#[cfg(test)]
pub(crate) mod memory;

pub use kube_client::{KubeConnector, KubeResourceClient};

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crds::{Accelerator, Fragment};
use crate::error::Result;

/// Bounds every resource handled by a [`ResourceClient`] satisfies.
pub trait NamespacedResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// Human-readable noun used in messages, e.g. `accelerator fragment`.
    const NOUN: &'static str;
}

impl NamespacedResource for Accelerator {
    const NOUN: &'static str = "accelerator";
}

impl NamespacedResource for Fragment {
    const NOUN: &'static str = "accelerator fragment";
}

/// CRUD operations on one resource type, keyed by `(namespace, name)`.
///
/// A missing object is reported as [`crate::error::CommandError::NotFound`].
#[async_trait]
pub trait ResourceClient<K: NamespacedResource>: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<K>;

    async fn list(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<K>>;

    async fn create(&self, namespace: &str, object: &K) -> Result<K>;

    async fn replace(&self, namespace: &str, object: &K) -> Result<K>;

    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Resource clients for both kinds.
#[derive(Clone)]
pub struct Clients {
    pub accelerators: Arc<dyn ResourceClient<Accelerator>>,
    pub fragments: Arc<dyn ResourceClient<Fragment>>,
}

/// Lazily produces [`Clients`] so commands that never touch the cluster never load
/// a kubeconfig.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self) -> Result<Clients>;
}

#[async_trait]
impl ClusterConnector for Clients {
    async fn connect(&self) -> Result<Clients> {
        Ok(self.clone())
    }
}
