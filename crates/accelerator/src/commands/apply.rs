//! `apply`: create or update a resource from a manifest file.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Context, NamespaceArgs};
use crate::crds::{Accelerator, Fragment};
use crate::error::{CommandError, Result};
use crate::merge::{overlay_accelerator, overlay_fragment};
use crate::resources::{NamespacedResource, ResourceClient};

/// Create or update an accelerator or fragment using a manifest file.
#[derive(Args, Debug)]
#[command(after_help = "Example:\n  accelerator apply --filename <path-to-resource-manifest>")]
pub struct ApplyCommand {
    #[command(flatten)]
    pub namespace: NamespaceArgs,

    /// Path of manifest file for the resource.
    #[arg(short, long, required = true)]
    pub filename: PathBuf,
}

/// Read the single YAML or JSON document in `path`.
fn load_document(path: &Path) -> Result<serde_yaml::Value> {
    let content = std::fs::read_to_string(path).map_err(CommandError::io(format!(
        "Error loading file {}",
        path.display()
    )))?;

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| {
            CommandError::Validation(format!("Error decoding file {}: {e}", path.display()))
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }

    if documents.len() > 1 {
        return Err(CommandError::Validation(
            "files containing multiple resources are not supported".to_string(),
        ));
    }
    Ok(documents.pop().unwrap_or(serde_yaml::Value::Null))
}

/// Create `provided` when missing, otherwise overlay it onto the stored object.
async fn save<K: NamespacedResource>(
    ctx: &mut Context<'_>,
    client: &dyn ResourceClient<K>,
    namespace: &str,
    mut provided: K,
    overlay: fn(K, K) -> K,
) -> Result<()> {
    let name = provided.meta().name.clone().unwrap_or_default();
    if let Some(file_namespace) = provided
        .meta()
        .namespace
        .as_deref()
        .filter(|file_namespace| !file_namespace.is_empty() && *file_namespace != namespace)
    {
        return Err(CommandError::Validation(format!(
            "the namespace specified in the provided file \"{file_namespace}\" does not match the namespace \"{namespace}\". You must pass '--namespace={file_namespace}' to perform this operation."
        )));
    }
    provided.meta_mut().namespace = Some(namespace.to_string());

    match client.get(namespace, &name).await {
        Ok(current) => {
            client.replace(namespace, &overlay(current, provided)).await?;
            info!(name = %name, namespace, kind = K::NOUN, "applied update");
            ctx.streams.success(&format!(
                "updated {} {name} in namespace {namespace}",
                K::NOUN
            ))
        }
        Err(CommandError::NotFound(_)) => {
            client.create(namespace, &provided).await?;
            info!(name = %name, namespace, kind = K::NOUN, "applied create");
            ctx.streams.success(&format!(
                "created {} {name} in namespace {namespace}",
                K::NOUN
            ))
        }
        Err(err) => Err(err),
    }
}

fn decode<K: NamespacedResource>(document: serde_yaml::Value, path: &Path) -> Result<K> {
    serde_yaml::from_value(document).map_err(|e| {
        CommandError::Validation(format!(
            "Error decoding {} resource from file {}: {e}",
            K::NOUN,
            path.display()
        ))
    })
}

impl ApplyCommand {
    /// Run the command.
    ///
    /// # Errors
    /// Returns file, decoding and namespace validation failures and cluster errors.
    pub async fn run(&self, ctx: &mut Context<'_>) -> Result<()> {
        let document = load_document(&self.filename)?;
        let kind = document
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!(kind = %kind, file = %self.filename.display(), "loaded manifest");

        let namespace = &self.namespace.namespace;
        match kind.as_str() {
            "Accelerator" => {
                let provided: Accelerator = decode(document, &self.filename)?;
                let clients = ctx.cluster.connect().await?;
                save(ctx, &*clients.accelerators, namespace, provided, overlay_accelerator).await
            }
            "Fragment" => {
                let provided: Fragment = decode(document, &self.filename)?;
                let clients = ctx.cluster.connect().await?;
                save(ctx, &*clients.fragments, namespace, provided, overlay_fragment).await
            }
            other => Err(CommandError::Validation(format!(
                "the resource kind \"{other}\" in the provided file \"{}\" does not match \"Accelerator\" or \"Fragment\"",
                self.filename.display()
            ))),
        }
    }
}
