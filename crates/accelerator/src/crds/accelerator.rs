//! `Accelerator` custom resource.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ArtifactInfo, Condition, GitSource, ImageSource, SourceSpec};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "accelerator.apps.tanzu.vmware.com",
    version = "v1alpha1",
    kind = "Accelerator"
)]
#[kube(namespaced)]
#[kube(status = "AcceleratorStatus")]
#[kube(shortname = "acc")]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ImageSource>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Accelerator options as a YAML document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_info: Option<ArtifactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

impl SourceSpec for AcceleratorSpec {
    fn git(&self) -> Option<&GitSource> {
        self.git.as_ref()
    }

    fn image(&self) -> Option<&ImageSource> {
        self.source.as_ref()
    }

    fn git_slot(&mut self) -> &mut Option<GitSource> {
        &mut self.git
    }

    fn image_slot(&mut self) -> &mut Option<ImageSource> {
        &mut self.source
    }
}
