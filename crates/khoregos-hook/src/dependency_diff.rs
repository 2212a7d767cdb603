//! Dependency-change detection (`spec.md` §4.7, Scenario G): diff a
//! `package.json`'s `dependencies`/`devDependencies` against the
//! version last committed to the project's VCS.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use khoregos_store::model::EventType;

const DEPENDENCY_BLOCKS: &[&str] = &["dependencies", "devDependencies"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyChangeKind {
    Added,
    Removed,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChange {
    pub kind: DependencyChangeKind,
    pub name: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DependencyChange {
    pub fn event_type(&self) -> EventType {
        match self.kind {
            DependencyChangeKind::Added => EventType::DependencyAdded,
            DependencyChangeKind::Removed => EventType::DependencyRemoved,
            DependencyChangeKind::Updated => EventType::DependencyUpdated,
        }
    }

    pub fn describe(&self) -> String {
        match self.kind {
            DependencyChangeKind::Added => {
                format!("{} {}", self.name, self.to.as_deref().unwrap_or(""))
            }
            DependencyChangeKind::Removed => {
                format!("{} {}", self.name, self.from.as_deref().unwrap_or(""))
            }
            DependencyChangeKind::Updated => format!(
                "{} {} -> {}",
                self.name,
                self.from.as_deref().unwrap_or(""),
                self.to.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Diff a `package.json` against the copy at `HEAD`. No VCS means no
/// events; no prior committed version means every current dependency is
/// an addition; malformed JSON on either side means no events.
pub fn diff_package_json(project_root: &Path, absolute_path: &Path) -> Vec<DependencyChange> {
    let Ok(current_raw) = std::fs::read_to_string(absolute_path) else {
        return Vec::new();
    };
    let Ok(current_json) = serde_json::from_str::<serde_json::Value>(&current_raw) else {
        return Vec::new();
    };
    if !has_vcs(project_root) {
        return Vec::new();
    }
    let Ok(relative) = absolute_path.strip_prefix(project_root) else {
        return Vec::new();
    };
    let relative = relative.to_string_lossy().replace('\\', "/");

    let previous_json = match git_show_head(project_root, &relative) {
        Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(json) => Some(json),
            Err(_) => return Vec::new(),
        },
        None => None,
    };

    let mut changes = Vec::new();
    for block in DEPENDENCY_BLOCKS {
        let current = flatten(&current_json, block);
        let previous = previous_json.as_ref().map(|j| flatten(j, block)).unwrap_or_default();
        changes.extend(diff_block(&previous, &current));
    }
    changes
}

fn flatten(json: &serde_json::Value, block: &str) -> BTreeMap<String, String> {
    json.get(block)
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn diff_block(
    previous: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> Vec<DependencyChange> {
    let mut changes = Vec::new();
    for (name, version) in current {
        match previous.get(name) {
            Some(prev) if prev != version => changes.push(DependencyChange {
                kind: DependencyChangeKind::Updated,
                name: name.clone(),
                from: Some(prev.clone()),
                to: Some(version.clone()),
            }),
            Some(_) => {}
            None => changes.push(DependencyChange {
                kind: DependencyChangeKind::Added,
                name: name.clone(),
                from: None,
                to: Some(version.clone()),
            }),
        }
    }
    for (name, version) in previous {
        if !current.contains_key(name) {
            changes.push(DependencyChange {
                kind: DependencyChangeKind::Removed,
                name: name.clone(),
                from: Some(version.clone()),
                to: None,
            });
        }
    }
    changes
}

fn has_vcs(work_dir: &Path) -> bool {
    git_cmd(work_dir, &["rev-parse", "--is-inside-work-tree"]).is_some()
}

fn git_show_head(work_dir: &Path, relative: &str) -> Option<String> {
    git_cmd(work_dir, &["show", &format!("HEAD:{relative}")])
}

fn git_cmd(work_dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).current_dir(work_dir).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).to_string())
}
