//! Custom resource definitions for accelerators and fragments.

pub mod accelerator;
pub mod fragment;

pub use accelerator::{Accelerator, AcceleratorSpec, AcceleratorStatus};
pub use fragment::{Fragment, FragmentSpec, FragmentStatus};

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group shared by both resources.
pub const GROUP: &str = "accelerator.apps.tanzu.vmware.com";

/// Annotation that asks the controller to reconcile immediately.
pub const RECONCILE_ANNOTATION: &str = "reconcile.accelerator.apps.tanzu.vmware.com/requestedAt";

/// Label prefix marking an object that imports a fragment.
pub const IMPORTS_LABEL_PREFIX: &str = "imports.accelerator.apps.tanzu.vmware.com/";

/// Label selector matching every object that imports `fragment`.
#[must_use]
pub fn imports_label(fragment: &str) -> String {
    format!("{IMPORTS_LABEL_PREFIX}{fragment}")
}

/// Access to the git/image source pair both resource specs carry.
///
/// At most one of the two is expected to be set at a time.
pub trait SourceSpec {
    fn git(&self) -> Option<&GitSource>;
    fn image(&self) -> Option<&ImageSource>;
    fn git_slot(&mut self) -> &mut Option<GitSource>;
    fn image_slot(&mut self) -> &mut Option<ImageSource>;
}

/// Git repository the controller pulls source from.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitSource {
    pub url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<GitReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<String>,
}

/// Branch or tag to check out.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct GitReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// OCI image holding the source tree.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<SecretReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
}

/// Reference to a secret in the same namespace.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecretReference {
    pub name: String,
}

/// Status condition reported by the controller.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Where the controller published the packaged artifact.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ArtifactInfo {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<BTreeMap<String, serde_json::Value>>,
}

/// Readiness derived from the `Ready` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady {
        reason: Option<String>,
        message: Option<String>,
    },
    Unknown,
}

impl Readiness {
    /// Read the `Ready` condition out of `conditions`.
    #[must_use]
    pub fn from_conditions(conditions: Option<&[Condition]>) -> Self {
        let Some(ready) = conditions
            .unwrap_or_default()
            .iter()
            .find(|condition| condition.condition_type == "Ready")
        else {
            return Self::Unknown;
        };

        match ready.status.as_str() {
            "True" => Self::Ready,
            "False" => Self::NotReady {
                reason: ready.reason.clone(),
                message: ready.message.clone(),
            },
            _ => Self::Unknown,
        }
    }

    /// Column value used by listings.
    #[must_use]
    pub fn as_column(&self) -> &'static str {
        match self {
            Self::Ready => "true",
            Self::NotReady { .. } => "false",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(status: &str) -> Condition {
        Condition {
            condition_type: "Ready".to_string(),
            status: status.to_string(),
            last_transition_time: None,
            reason: Some("GitError".to_string()),
            message: Some("clone failed".to_string()),
        }
    }

    #[test]
    fn test_readiness_from_conditions() {
        assert_eq!(Readiness::from_conditions(None), Readiness::Unknown);
        assert_eq!(
            Readiness::from_conditions(Some(&[condition("True")])),
            Readiness::Ready
        );
        let not_ready = Readiness::from_conditions(Some(&[condition("False")]));
        assert_eq!(not_ready.as_column(), "false");
        assert!(matches!(not_ready, Readiness::NotReady { reason: Some(r), .. } if r == "GitError"));
    }

    #[test]
    fn test_git_source_wire_names() {
        let git = GitSource {
            url: "https://github.com/acme/acc".to_string(),
            reference: Some(GitReference {
                branch: Some("main".to_string()),
                tag: None,
            }),
            secret_ref: Some(SecretReference {
                name: "git-creds".to_string(),
            }),
            sub_path: Some("java".to_string()),
            ..GitSource::default()
        };
        let json = serde_json::to_value(&git).unwrap();
        assert_eq!(json["ref"]["branch"], "main");
        assert_eq!(json["secretRef"]["name"], "git-creds");
        assert_eq!(json["subPath"], "java");
        assert!(json.get("interval").is_none());
    }
}
