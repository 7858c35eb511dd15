//! Borderless column listings.

use comfy_table::{presets, Cell, ContentArrangement, Table};
use kube::ResourceExt;

use crate::crds::{Accelerator, Fragment, Readiness};
use crate::server::ServerAccelerator;

/// Spaces between columns.
const COLUMN_GAP: u16 = 3;

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header.iter().map(Cell::new).collect::<Vec<_>>());
    for column in table.column_iter_mut() {
        column.set_padding((0, COLUMN_GAP));
    }
    table
}

fn render(table: &Table) -> String {
    let mut out = String::new();
    for line in table.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Accelerators from the server catalog, sorted by name.
#[must_use]
pub fn server_accelerators(accelerators: &[ServerAccelerator]) -> String {
    let mut sorted: Vec<&ServerAccelerator> = accelerators.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = table(&["NAME", "GIT REPOSITORY", "BRANCH", "TAG"]);
    for accelerator in sorted {
        table.add_row(vec![
            accelerator.name.as_str(),
            accelerator.repository(),
            accelerator.source_branch.as_deref().unwrap_or_default(),
            accelerator.source_tag.as_deref().unwrap_or_default(),
        ]);
    }
    render(&table)
}

/// Accelerator resources from the cluster.
#[must_use]
pub fn cluster_accelerators(accelerators: &[Accelerator]) -> String {
    let mut table = table(&["NAME", "GIT REPOSITORY", "BRANCH", "TAG", "IMAGE"]);
    for accelerator in accelerators {
        let git = accelerator.spec.git.as_ref();
        let reference = git.and_then(|git| git.reference.as_ref());
        table.add_row(vec![
            accelerator.name_any(),
            git.map(|git| git.url.clone()).unwrap_or_default(),
            reference
                .and_then(|r| r.branch.clone())
                .unwrap_or_default(),
            reference.and_then(|r| r.tag.clone()).unwrap_or_default(),
            accelerator
                .spec
                .source
                .as_ref()
                .map(|source| source.image.clone())
                .unwrap_or_default(),
        ]);
    }
    render(&table)
}

/// Repository column for a fragment: `url:ref:/subPath` or `source-image: <image>`.
fn fragment_repository(fragment: &Fragment) -> String {
    if let Some(git) = &fragment.spec.git {
        let reference = git.reference.as_ref().and_then(|r| {
            r.tag
                .as_deref()
                .filter(|tag| !tag.is_empty())
                .or(r.branch.as_deref())
        });
        let sub_path = git.sub_path.as_deref().unwrap_or_default();
        return format!(
            "{}:{}:/{}",
            git.url,
            reference.unwrap_or_default(),
            sub_path.trim_start_matches('/')
        );
    }
    fragment
        .spec
        .source
        .as_ref()
        .map(|source| format!("source-image: {}", source.image))
        .unwrap_or_default()
}

/// Fragment resources from the cluster.
#[must_use]
pub fn fragments(fragments: &[Fragment]) -> String {
    let mut table = table(&["NAME", "READY", "REPOSITORY"]);
    for fragment in fragments {
        let readiness = Readiness::from_conditions(
            fragment
                .status
                .as_ref()
                .and_then(|status| status.conditions.as_deref()),
        );
        table.add_row(vec![
            fragment.name_any(),
            readiness.as_column().to_string(),
            fragment_repository(fragment),
        ]);
    }
    render(&table)
}
