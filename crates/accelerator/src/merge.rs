//! Field-by-field reconciliation of desired state onto stored resources.
//!
//! Precedence is explicit for every field: a provided non-empty value wins,
//! anything unset keeps the stored value. Selecting a git repository removes an
//! image source and the other way round.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;

use crate::crds::{
    Accelerator, AcceleratorSpec, Fragment, FragmentSpec, GitReference, GitSource, ImageSource,
    SecretReference, SourceSpec, RECONCILE_ANNOTATION,
};
use crate::error::{CommandError, Result};

const INTERVAL_PATTERN: &str = r"^([0-9]+(\.[0-9]+)?(ns|us|µs|ms|s|m|h))+$";

/// Source flags shared by the create and update commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOverrides {
    pub git_repository: Option<String>,
    pub git_branch: Option<String>,
    pub git_tag: Option<String>,
    pub git_sub_path: Option<String>,
    pub interval: Option<String>,
    pub source_image: Option<String>,
    pub secret_ref: Option<String>,
}

/// Spec flags shared by the create and update commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecOverrides {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub tags: Vec<String>,
    pub source: SourceOverrides,
}

fn provided(value: Option<&String>) -> Option<&String> {
    value.filter(|value| !value.is_empty())
}

fn overlay_text(current: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = provided(value) {
        *current = Some(value.clone());
    }
}

/// Check that `interval` is a duration such as `10m` or `1h30m`.
///
/// # Errors
/// Returns [`CommandError::Validation`] for anything else.
pub fn validate_interval(interval: &str) -> Result<()> {
    let pattern = Regex::new(INTERVAL_PATTERN)
        .map_err(|e| CommandError::Validation(format!("invalid interval pattern: {e}")))?;
    if pattern.is_match(interval) {
        Ok(())
    } else {
        Err(CommandError::Validation(format!(
            "invalid interval \"{interval}\", use a duration such as 10m or 1h30m"
        )))
    }
}

/// Apply source flags to `spec`.
///
/// # Errors
/// Returns [`CommandError::Validation`] when git-only flags are given without a git
/// source, or when the interval is malformed.
pub fn overlay_source<S: SourceSpec>(spec: &mut S, flags: &SourceOverrides) -> Result<()> {
    if let Some(url) = provided(flags.git_repository.as_ref()) {
        let git = spec.git_slot().get_or_insert_with(GitSource::default);
        git.url = url.clone();
        *spec.image_slot() = None;
    } else if let Some(image) = provided(flags.source_image.as_ref()) {
        let source = spec.image_slot().get_or_insert_with(ImageSource::default);
        source.image = image.clone();
        *spec.git_slot() = None;
    }

    let git_flags = [
        ("git-branch", provided(flags.git_branch.as_ref())),
        ("git-tag", provided(flags.git_tag.as_ref())),
        ("git-sub-path", provided(flags.git_sub_path.as_ref())),
    ];
    if spec.git().is_none() {
        if let Some((flag, _)) = git_flags.iter().find(|(_, value)| value.is_some()) {
            return Err(CommandError::Validation(format!(
                "--{flag} can only be used with a git source, provide --git-repository"
            )));
        }
    }

    if let Some(git) = spec.git_slot().as_mut() {
        if flags.git_branch.is_some() || flags.git_tag.is_some() {
            let reference = git.reference.get_or_insert_with(GitReference::default);
            overlay_text(&mut reference.branch, flags.git_branch.as_ref());
            overlay_text(&mut reference.tag, flags.git_tag.as_ref());
        }
        overlay_text(&mut git.sub_path, flags.git_sub_path.as_ref());
    }

    if let Some(interval) = provided(flags.interval.as_ref()) {
        validate_interval(interval)?;
        if let Some(git) = spec.git_slot().as_mut() {
            git.interval = Some(interval.clone());
        } else if let Some(source) = spec.image_slot().as_mut() {
            source.interval = Some(interval.clone());
        } else {
            return Err(CommandError::Validation(
                "--interval requires --git-repository or --source-image".to_string(),
            ));
        }
    }

    if let Some(secret) = provided(flags.secret_ref.as_ref()) {
        let reference = SecretReference {
            name: secret.clone(),
        };
        if let Some(git) = spec.git_slot().as_mut() {
            git.secret_ref = Some(reference);
        } else if let Some(source) = spec.image_slot().as_mut() {
            source.image_pull_secrets = Some(vec![reference]);
        } else {
            return Err(CommandError::Validation(
                "--secret-ref requires --git-repository or --source-image".to_string(),
            ));
        }
    }

    Ok(())
}

/// Apply accelerator flags to `spec`.
///
/// # Errors
/// See [`overlay_source`].
pub fn overlay_accelerator_spec(spec: &mut AcceleratorSpec, flags: &SpecOverrides) -> Result<()> {
    overlay_text(&mut spec.display_name, flags.display_name.as_ref());
    overlay_text(&mut spec.description, flags.description.as_ref());
    overlay_text(&mut spec.icon_url, flags.icon_url.as_ref());
    if !flags.tags.is_empty() {
        spec.tags = Some(flags.tags.clone());
    }
    overlay_source(spec, &flags.source)
}

/// Apply fragment flags to `spec`.
///
/// # Errors
/// See [`overlay_source`].
pub fn overlay_fragment_spec(spec: &mut FragmentSpec, flags: &SpecOverrides) -> Result<()> {
    overlay_text(&mut spec.display_name, flags.display_name.as_ref());
    overlay_source(spec, &flags.source)
}

/// Ask the controller to reconcile by stamping the request time.
pub fn request_reconcile(meta: &mut ObjectMeta, now: DateTime<Utc>) {
    meta.annotations.get_or_insert_with(BTreeMap::new).insert(
        RECONCILE_ANNOTATION.to_string(),
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
}

fn merge_maps(
    current: Option<BTreeMap<String, String>>,
    provided: Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    match (current, provided) {
        (Some(mut current), Some(provided)) => {
            current.extend(provided);
            Some(current)
        }
        (current, provided) => provided.or(current),
    }
}

fn merge_text(current: Option<String>, provided: Option<String>) -> Option<String> {
    provided.filter(|value| !value.is_empty()).or(current)
}

fn merge_git(current: Option<GitSource>, provided: GitSource) -> GitSource {
    let current = current.unwrap_or_default();
    let reference = match (current.reference, provided.reference) {
        (Some(current), Some(provided)) => Some(GitReference {
            branch: merge_text(current.branch, provided.branch),
            tag: merge_text(current.tag, provided.tag),
        }),
        (current, provided) => provided.or(current),
    };
    GitSource {
        url: if provided.url.is_empty() {
            current.url
        } else {
            provided.url
        },
        reference,
        interval: merge_text(current.interval, provided.interval),
        secret_ref: provided.secret_ref.or(current.secret_ref),
        sub_path: merge_text(current.sub_path, provided.sub_path),
        ignore: merge_text(current.ignore, provided.ignore),
    }
}

fn merge_image(current: Option<ImageSource>, provided: ImageSource) -> ImageSource {
    let current = current.unwrap_or_default();
    ImageSource {
        image: if provided.image.is_empty() {
            current.image
        } else {
            provided.image
        },
        interval: merge_text(current.interval, provided.interval),
        image_pull_secrets: provided
            .image_pull_secrets
            .filter(|secrets| !secrets.is_empty())
            .or(current.image_pull_secrets),
        sub_path: merge_text(current.sub_path, provided.sub_path),
    }
}

fn merge_sources<S: SourceSpec>(target: &mut S, current: &S, provided: &S) {
    let (git, image) = match (provided.git(), provided.image()) {
        (Some(git), None) => (Some(merge_git(current.git().cloned(), git.clone())), None),
        (None, Some(image)) => (None, Some(merge_image(current.image().cloned(), image.clone()))),
        (Some(git), Some(image)) => (
            Some(merge_git(current.git().cloned(), git.clone())),
            Some(merge_image(current.image().cloned(), image.clone())),
        ),
        (None, None) => (current.git().cloned(), current.image().cloned()),
    };
    *target.git_slot() = git;
    *target.image_slot() = image;
}

fn merge_meta(current: &mut ObjectMeta, provided: ObjectMeta) {
    current.labels = merge_maps(current.labels.take(), provided.labels);
    current.annotations = merge_maps(current.annotations.take(), provided.annotations);
}

/// Overlay an accelerator read from a file onto the stored one.
///
/// Identity, status and server-managed metadata come from `current`.
#[must_use]
pub fn overlay_accelerator(current: Accelerator, provided: Accelerator) -> Accelerator {
    let mut merged = current.clone();
    merge_meta(&mut merged.metadata, provided.metadata);

    let spec = &mut merged.spec;
    spec.display_name = merge_text(current.spec.display_name.clone(), provided.spec.display_name.clone());
    spec.description = merge_text(current.spec.description.clone(), provided.spec.description.clone());
    spec.icon_url = merge_text(current.spec.icon_url.clone(), provided.spec.icon_url.clone());
    spec.tags = provided
        .spec
        .tags
        .clone()
        .filter(|tags| !tags.is_empty())
        .or(current.spec.tags.clone());
    merge_sources(spec, &current.spec, &provided.spec);
    merged
}

/// Overlay a fragment read from a file onto the stored one.
#[must_use]
pub fn overlay_fragment(current: Fragment, provided: Fragment) -> Fragment {
    let mut merged = current.clone();
    merge_meta(&mut merged.metadata, provided.metadata);

    let spec = &mut merged.spec;
    spec.display_name = merge_text(current.spec.display_name.clone(), provided.spec.display_name.clone());
    merge_sources(spec, &current.spec, &provided.spec);
    merged
}
