//! YAML-style detail views for `get` commands.

use std::fmt::Display;

use kube::ResourceExt;
use serde::Serialize;

use crate::crds::{Accelerator, ArtifactInfo, Fragment, Readiness};
use crate::server::{AcceleratorOption, ServerAccelerator};

/// Line-oriented document builder.
#[derive(Default)]
struct Doc(String);

impl Doc {
    fn field(&mut self, indent: usize, key: &str, value: impl Display) -> &mut Self {
        let value = value.to_string();
        self.0.push_str(&" ".repeat(indent));
        self.0.push_str(key);
        self.0.push(':');
        if !value.is_empty() {
            self.0.push(' ');
            self.0.push_str(&value);
        }
        self.0.push('\n');
        self
    }

    fn section(&mut self, indent: usize, key: &str) -> &mut Self {
        self.field(indent, key, "")
    }

    /// Render `value` as a YAML block under `key`, or inline when it is empty.
    fn yaml<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, is_empty: bool) -> &mut Self {
        if is_empty {
            return self.field(0, key, "[]");
        }
        match serde_yaml::to_string(value) {
            Ok(rendered) => {
                self.section(0, key);
                self.0.push_str(&rendered);
                if !rendered.ends_with('\n') {
                    self.0.push('\n');
                }
                self
            }
            Err(_) => self.field(0, key, "[]"),
        }
    }

    fn artifact(&mut self, artifact: Option<&ArtifactInfo>) -> &mut Self {
        let default = ArtifactInfo::default();
        let artifact = artifact.unwrap_or(&default);
        self.section(0, "artifact")
            .field(2, "message", &artifact.message)
            .field(2, "ready", artifact.ready)
            .field(2, "url", &artifact.url)
    }

    fn finish(&mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

/// Parse the options YAML stored in a resource status.
fn status_options(options: Option<&str>) -> Vec<serde_yaml::Value> {
    options
        .and_then(|raw| serde_yaml::from_str::<Vec<serde_yaml::Value>>(raw).ok())
        .unwrap_or_default()
}

fn text(value: Option<&String>) -> &str {
    value.map_or("", String::as_str)
}

/// Detail view of an accelerator from the server catalog.
#[must_use]
pub fn server_accelerator(accelerator: &ServerAccelerator, options: &[AcceleratorOption]) -> String {
    let mut doc = Doc::default();
    doc.field(0, "name", &accelerator.name)
        .field(0, "description", text(accelerator.description.as_ref()))
        .field(0, "displayName", text(accelerator.display_name.as_ref()))
        .field(0, "iconUrl", text(accelerator.icon_url.as_ref()));

    match accelerator
        .spec_image_repository
        .as_deref()
        .filter(|image| !image.is_empty())
    {
        Some(image) => {
            doc.section(0, "source").field(2, "image", image);
        }
        None => match accelerator
            .spec_git_repository_url
            .as_deref()
            .filter(|url| !url.is_empty())
        {
            Some(url) => {
                doc.section(0, "git")
                    .field(2, "url", url)
                    .section(2, "ref")
                    .field(4, "branch", text(accelerator.source_branch.as_ref()))
                    .field(4, "tag", text(accelerator.source_tag.as_ref()));
            }
            None => {
                doc.field(0, "sourceUrl", text(accelerator.source_url.as_ref()));
            }
        },
    }

    doc.yaml("tags", &accelerator.tags, accelerator.tags.is_empty())
        .field(0, "ready", accelerator.ready)
        .yaml("options", options, options.is_empty())
        .artifact(Some(&ArtifactInfo {
            ready: accelerator.archive_ready,
            message: text(accelerator.archive_message.as_ref()).to_string(),
            url: text(accelerator.archive_url.as_ref()).to_string(),
            imports: None,
        }))
        .finish()
}

/// Detail view of an accelerator resource.
#[must_use]
pub fn cluster_accelerator(accelerator: &Accelerator) -> String {
    let status = accelerator.status.clone().unwrap_or_default();
    let mut doc = Doc::default();
    doc.field(0, "name", accelerator.name_any())
        .field(0, "namespace", accelerator.namespace().unwrap_or_default())
        .field(0, "description", text(status.description.as_ref()))
        .field(0, "displayName", text(status.display_name.as_ref()))
        .field(0, "iconUrl", text(status.icon_url.as_ref()));

    if let Some(git) = &accelerator.spec.git {
        let reference = git.reference.clone().unwrap_or_default();
        doc.section(0, "git")
            .field(2, "interval", text(git.interval.as_ref()))
            .field(2, "ignore", text(git.ignore.as_ref()))
            .section(2, "ref")
            .field(4, "branch", text(reference.branch.as_ref()))
            .field(4, "tag", text(reference.tag.as_ref()))
            .field(2, "url", &git.url);
        if let Some(sub_path) = &git.sub_path {
            doc.field(2, "subPath", sub_path);
        }
    }
    if let Some(source) = &accelerator.spec.source {
        doc.section(0, "source").field(2, "image", &source.image);
    }

    let tags = status.tags.unwrap_or_default();
    let options = status_options(status.options.as_deref());
    let artifact = status.artifact_info.unwrap_or_default();
    doc.yaml("tags", &tags, tags.is_empty())
        .field(0, "ready", artifact.ready)
        .yaml("options", &options, options.is_empty())
        .artifact(Some(&artifact))
        .finish()
}

/// Objects importing a fragment, or `None` when they could not be listed.
#[derive(Debug, Default)]
pub struct Importers {
    pub accelerators: Option<Vec<String>>,
    pub fragments: Option<Vec<String>>,
}

/// Detail view of a fragment resource.
#[must_use]
pub fn fragment(fragment: &Fragment, importers: &Importers) -> String {
    let status = fragment.status.clone().unwrap_or_default();
    let mut doc = Doc::default();
    doc.field(0, "name", fragment.name_any())
        .field(0, "namespace", fragment.namespace().unwrap_or_default())
        .field(0, "displayName", text(fragment.spec.display_name.as_ref()));

    if let Some(source) = &fragment.spec.source {
        doc.section(0, "source").field(2, "image", &source.image);
        if let Some(secrets) = source.image_pull_secrets.as_deref().filter(|s| !s.is_empty()) {
            let names: Vec<&str> = secrets.iter().map(|s| s.name.as_str()).collect();
            doc.field(2, "secret-ref", names.join(", "));
        }
    } else if let Some(git) = &fragment.spec.git {
        doc.section(0, "git");
        if let Some(interval) = &git.interval {
            doc.field(2, "interval", interval);
        }
        if let Some(ignore) = &git.ignore {
            doc.field(2, "ignore", ignore);
        }
        let reference = git.reference.clone().unwrap_or_default();
        doc.field(2, "url", &git.url)
            .section(2, "ref")
            .field(4, "branch", text(reference.branch.as_ref()));
        if let Some(tag) = reference.tag.as_deref().filter(|tag| !tag.is_empty()) {
            doc.field(4, "tag", tag);
        }
        if let Some(sub_path) = &git.sub_path {
            doc.field(2, "subPath", sub_path);
        }
        if let Some(secret) = &git.secret_ref {
            doc.field(2, "secret-ref", &secret.name);
        }
    }

    match status.conditions.as_ref() {
        Some(conditions) if !conditions.is_empty() => {
            match Readiness::from_conditions(Some(conditions.as_slice())) {
                Readiness::Ready => {
                    doc.field(0, "ready", true);
                }
                Readiness::NotReady { reason, message } => {
                    doc.field(0, "ready", false)
                        .field(0, "reason", text(reason.as_ref()))
                        .field(0, "message", text(message.as_ref()));
                }
                Readiness::Unknown => {
                    doc.field(0, "ready", false)
                        .field(0, "reason", "")
                        .field(0, "message", "");
                }
            }
        }
        _ => {
            doc.field(0, "ready", true);
        }
    }

    let options = status_options(status.options.as_deref());
    let artifact = status.artifact_info.unwrap_or_default();
    doc.yaml("options", &options, options.is_empty())
        .artifact(Some(&artifact));

    doc.section(0, "imports");
    match artifact.imports.as_ref().filter(|imports| !imports.is_empty()) {
        Some(imports) => {
            for key in imports.keys() {
                doc.0.push_str(&format!("  {key}\n"));
            }
        }
        None => doc.0.push_str("  None\n"),
    }

    doc.section(0, "importedBy");
    let mut any = false;
    match &importers.accelerators {
        Some(names) => {
            for name in names {
                any = true;
                doc.0.push_str(&format!("  accelerator/{name}\n"));
            }
        }
        None => doc.0.push_str("  Unable to find any importing accelerators\n"),
    }
    match &importers.fragments {
        Some(names) => {
            for name in names {
                any = true;
                doc.0.push_str(&format!("  fragment/{name}\n"));
            }
        }
        None => doc.0.push_str("  Unable to find any importing fragments\n"),
    }
    if !any {
        doc.0.push_str("  None\n");
    }

    doc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::{
        AcceleratorSpec, AcceleratorStatus, FragmentSpec, FragmentStatus, GitReference, GitSource,
    };
    use crate::server::Choice;
    use std::collections::BTreeMap;

    #[test]
    fn test_server_accelerator_view() {
        let accelerator = ServerAccelerator {
            name: "spring".into(),
            description: Some("Spring Boot app".into()),
            display_name: Some("Spring".into()),
            spec_git_repository_url: Some("https://github.com/acme/spring".into()),
            source_branch: Some("main".into()),
            tags: vec!["java".into(), "spring".into()],
            ready: true,
            archive_ready: true,
            archive_url: Some("http://artifacts/spring.tar.gz".into()),
            ..ServerAccelerator::default()
        };
        let options = vec![AcceleratorOption {
            name: "javaVersion".into(),
            default_value: serde_json::json!("17"),
            display: true,
            data_type: serde_json::json!("string"),
            choices: vec![Choice {
                text: "Java 17".into(),
                value: "17".into(),
            }],
        }];

        let view = server_accelerator(&accelerator, &options);
        assert!(view.starts_with("name: spring\ndescription: Spring Boot app\ndisplayName: Spring\niconUrl:\n"));
        assert!(view.contains("git:\n  url: https://github.com/acme/spring\n  ref:\n    branch: main\n    tag:\n"));
        assert!(view.contains("tags:\n- java\n- spring\n"));
        assert!(view.contains("ready: true\noptions:\n- name: javaVersion\n"));
        assert!(view.contains("defaultValue: '17'") || view.contains("defaultValue: \"17\""));
        assert!(view.ends_with("artifact:\n  message:\n  ready: true\n  url: http://artifacts/spring.tar.gz\n"));
    }

    #[test]
    fn test_server_accelerator_without_tags_or_options() {
        let accelerator = ServerAccelerator {
            name: "bare".into(),
            source_url: Some("https://example.com/bare.zip".into()),
            ..ServerAccelerator::default()
        };
        let view = server_accelerator(&accelerator, &[]);
        assert!(view.contains("sourceUrl: https://example.com/bare.zip\n"));
        assert!(view.contains("tags: []\nready: false\noptions: []\n"));
    }

    #[test]
    fn test_cluster_accelerator_view() {
        let mut accelerator = Accelerator::new(
            "spring",
            AcceleratorSpec {
                git: Some(GitSource {
                    url: "https://github.com/acme/spring".into(),
                    interval: Some("5m".into()),
                    reference: Some(GitReference {
                        branch: Some("main".into()),
                        tag: None,
                    }),
                    ..GitSource::default()
                }),
                ..AcceleratorSpec::default()
            },
        );
        accelerator.metadata.namespace = Some("accelerator-system".into());
        accelerator.status = Some(AcceleratorStatus {
            description: Some("Spring Boot app".into()),
            tags: Some(vec!["java".into()]),
            options: Some("- name: javaVersion\n  defaultValue: '17'\n".into()),
            artifact_info: Some(ArtifactInfo {
                ready: true,
                message: "ok".into(),
                url: "http://artifacts/spring".into(),
                imports: None,
            }),
            ..AcceleratorStatus::default()
        });

        let view = cluster_accelerator(&accelerator);
        assert!(view.starts_with("name: spring\nnamespace: accelerator-system\ndescription: Spring Boot app\n"));
        assert!(view.contains("git:\n  interval: 5m\n  ignore:\n  ref:\n    branch: main\n    tag:\n  url: https://github.com/acme/spring\n"));
        assert!(view.contains("tags:\n- java\nready: true\noptions:\n- name: javaVersion\n"));
        assert!(view.contains("artifact:\n  message: ok\n  ready: true\n"));
    }

    #[test]
    fn test_fragment_view_with_imports_and_importers() {
        let mut fragment = Fragment::new(
            "java-version",
            FragmentSpec {
                display_name: Some("Java version".into()),
                git: Some(GitSource {
                    url: "https://github.com/acme/fragments".into(),
                    sub_path: Some("java".into()),
                    ..GitSource::default()
                }),
                ..FragmentSpec::default()
            },
        );
        fragment.metadata.namespace = Some("ns".into());
        let mut imports = BTreeMap::new();
        imports.insert("build-tools".to_string(), serde_json::json!({}));
        fragment.status = Some(FragmentStatus {
            artifact_info: Some(ArtifactInfo {
                imports: Some(imports),
                ..ArtifactInfo::default()
            }),
            ..FragmentStatus::default()
        });

        let view = fragment_view(&fragment, &Importers {
            accelerators: Some(vec!["spring".into()]),
            fragments: Some(vec![]),
        });
        assert!(view.contains("displayName: Java version\ngit:\n  url: https://github.com/acme/fragments\n  ref:\n    branch:\n  subPath: java\n"));
        assert!(view.contains("ready: true\noptions: []\n"));
        assert!(view.contains("imports:\n  build-tools\n"));
        assert!(view.ends_with("importedBy:\n  accelerator/spring\n"));

        let view = fragment_view(&fragment, &Importers {
            accelerators: Some(vec![]),
            fragments: Some(vec![]),
        });
        assert!(view.ends_with("importedBy:\n  None\n"));
    }

    fn fragment_view(fragment: &Fragment, importers: &Importers) -> String {
        super::fragment(fragment, importers)
    }
}
