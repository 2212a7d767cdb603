//! `BoundaryEnforcer` — the default-deny path gate agents are checked
//! against on every write-like tool call (`spec.md` §4.5), adapted from
//! the ordered evaluation-step design of a capability-manifest policy
//! engine to glob-based per-agent path rules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use khoregos_store::model::{BoundaryViolation, EnforcementAction, ViolationType};
use khoregos_store::Store;

use crate::config::{Boundary, Enforcement};
use crate::matching;
use crate::resolve::{relative_path, resolve};
use crate::Result;

/// Summary returned by [`BoundaryEnforcer::get_agent_boundaries_summary`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct BoundarySummary {
    pub agent: String,
    pub has_boundary: bool,
    pub allowed_paths: Vec<String>,
    pub forbidden_paths: Vec<String>,
    pub enforcement: String,
}

pub struct BoundaryEnforcer {
    store: Arc<Store>,
    session_id: String,
    project_root: PathBuf,
    boundaries: Vec<Boundary>,
}

impl BoundaryEnforcer {
    pub fn new(
        store: Arc<Store>,
        session_id: impl Into<String>,
        project_root: impl Into<PathBuf>,
        boundaries: Vec<Boundary>,
    ) -> Self {
        Self {
            store,
            session_id: session_id.into(),
            project_root: project_root.into(),
            boundaries,
        }
    }

    /// The boundary that applies to `name`: the first configured pattern
    /// that matches it, falling back to the wildcard (`"*"`) boundary if
    /// one is configured and nothing more specific matched.
    pub fn get_boundary_for_agent(&self, name: &str) -> Option<&Boundary> {
        self.boundaries
            .iter()
            .find(|b| b.pattern != "*" && matching::matches(&b.pattern, name))
            .or_else(|| self.boundaries.iter().find(|b| b.pattern == "*"))
    }

    /// Evaluate whether `agent_name` may touch `path` (`spec.md` §4.5).
    pub fn check_path_allowed(&self, path: &Path, agent_name: &str) -> (bool, Option<String>) {
        let resolved_root = resolve(&self.project_root);
        let resolved_path = if path.is_absolute() {
            resolve(path)
        } else {
            resolve(&resolved_root.join(path))
        };

        let relative = relative_path(&resolved_path, &resolved_root);
        if relative.starts_with("..") || Path::new(&relative).is_absolute() {
            return (false, Some("outside project root".to_string()));
        }

        let Some(boundary) = self.get_boundary_for_agent(agent_name) else {
            return (false, Some("no boundary configured".to_string()));
        };

        if let Some(pattern) = matching::first_match(&boundary.forbidden_paths, &relative) {
            return (
                false,
                Some(format!("Path matches forbidden pattern: {pattern}")),
            );
        }

        if !boundary.allowed_paths.is_empty()
            && matching::first_match(&boundary.allowed_paths, &relative).is_none()
        {
            return (
                false,
                Some("does not match any allowed patterns".to_string()),
            );
        }

        (true, None)
    }

    pub fn get_agent_boundaries_summary(&self, name: &str) -> BoundarySummary {
        match self.get_boundary_for_agent(name) {
            Some(boundary) => BoundarySummary {
                agent: name.to_string(),
                has_boundary: true,
                allowed_paths: boundary.allowed_paths.clone(),
                forbidden_paths: boundary.forbidden_paths.clone(),
                enforcement: boundary.enforcement.as_str().to_string(),
            },
            None => BoundarySummary {
                agent: name.to_string(),
                has_boundary: false,
                allowed_paths: Vec::new(),
                forbidden_paths: Vec::new(),
                enforcement: "deny".to_string(),
            },
        }
    }

    pub fn is_strict_for(&self, agent_name: &str) -> bool {
        matches!(
            self.get_boundary_for_agent(agent_name).map(|b| b.enforcement),
            Some(Enforcement::Strict)
        )
    }

    /// Insert a `boundary_violations` row and return the stored record.
    pub fn record_violation(
        &self,
        file_path: &str,
        agent_id: Option<&str>,
        violation_type: ViolationType,
        enforcement_action: EnforcementAction,
        details: Option<serde_json::Value>,
    ) -> Result<BoundaryViolation> {
        let mut violation =
            BoundaryViolation::new(self.session_id.clone(), file_path, violation_type, enforcement_action);
        if let Some(agent_id) = agent_id {
            violation = violation.with_agent(agent_id);
        }
        if let Some(details) = details {
            violation = violation.with_details(details);
        }

        let columns = violation.to_columns();
        let col_refs: Vec<(&str, &dyn rusqlite::ToSql)> =
            columns.iter().map(|(c, v)| (*c, v.as_ref())).collect();
        self.store.insert("boundary_violations", &col_refs)?;
        Ok(violation)
    }

    /// Violations for this session, optionally narrowed to one agent,
    /// most recent first.
    pub fn get_violations(
        &self,
        agent_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BoundaryViolation>> {
        let violations = match agent_id {
            Some(agent_id) => self.store.fetch_all(
                "SELECT * FROM boundary_violations WHERE session_id = ?1 AND agent_id = ?2 \
                 ORDER BY timestamp DESC LIMIT ?3",
                &[&self.session_id, &agent_id, &limit],
                BoundaryViolation::from_row,
            )?,
            None => self.store.fetch_all(
                "SELECT * FROM boundary_violations WHERE session_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
                &[&self.session_id, &limit],
                BoundaryViolation::from_row,
            )?,
        };
        Ok(violations)
    }
}
