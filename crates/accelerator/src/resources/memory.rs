//! In-memory resource store used by command tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kube::ResourceExt;

use super::{Clients, NamespacedResource, ResourceClient};
use crate::crds::{Accelerator, Fragment};
use crate::error::{CommandError, Result};

pub struct MemoryClient<K> {
    objects: Mutex<BTreeMap<(String, String), K>>,
}

impl<K: NamespacedResource> MemoryClient<K> {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn insert(&self, mut object: K, namespace: &str) {
        object.meta_mut().namespace = Some(namespace.to_string());
        let key = (namespace.to_string(), object.name_any());
        self.objects.lock().unwrap().insert(key, object);
    }

    pub fn stored(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

fn matches_selector<K: NamespacedResource>(object: &K, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    selector.split(',').all(|term| match term.split_once('=') {
        Some((key, value)) => object.labels().get(key).is_some_and(|v| v == value),
        None => object.labels().contains_key(term),
    })
}

#[async_trait]
impl<K: NamespacedResource> ResourceClient<K> for MemoryClient<K> {
    async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        self.stored(namespace, name)
            .ok_or_else(|| CommandError::NotFound(format!("{} {name} not found", K::NOUN)))
    }

    async fn list(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<K>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), object)| ns == namespace && matches_selector(*object, label_selector))
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.name_any();
        if self.stored(namespace, &name).is_some() {
            return Err(CommandError::Remote(format!(
                "{} {name} already exists",
                K::NOUN
            )));
        }
        self.insert(object.clone(), namespace);
        self.get(namespace, &name).await
    }

    async fn replace(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.name_any();
        self.get(namespace, &name).await?;
        self.insert(object.clone(), namespace);
        self.get(namespace, &name).await
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| CommandError::NotFound(format!("{} {name} not found", K::NOUN)))
    }
}

/// Stores for both kinds plus the [`Clients`] view handed to commands.
pub struct MemoryCluster {
    pub accelerators: Arc<MemoryClient<Accelerator>>,
    pub fragments: Arc<MemoryClient<Fragment>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self {
            accelerators: Arc::new(MemoryClient::new()),
            fragments: Arc::new(MemoryClient::new()),
        }
    }

    pub fn clients(&self) -> Clients {
        Clients {
            accelerators: self.accelerators.clone(),
            fragments: self.fragments.clone(),
        }
    }
}
