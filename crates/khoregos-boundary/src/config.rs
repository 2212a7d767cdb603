//! The boundary configuration shape handed to [`crate::BoundaryEnforcer`]
//! at construction (`spec.md` §4.5). Boundaries are not persisted rows —
//! they arrive as part of a project's governance configuration and are
//! matched against agent names each time a path is checked.

use serde::{Deserialize, Serialize};

/// How a boundary's deny decisions are acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// Violations are logged but the tool call is not undone.
    Advisory,
    /// Violations trigger a post-hoc revert of the offending file.
    Strict,
}

impl Enforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Enforcement::Advisory => "advisory",
            Enforcement::Strict => "strict",
        }
    }
}

/// One configured boundary: a glob over agent names, plus the path rules
/// and enforcement mode that apply to agents matching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary {
    /// Glob matched against an agent's name. `"*"` is the catch-all.
    pub pattern: String,
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    #[serde(default)]
    pub forbidden_paths: Vec<String>,
    pub enforcement: Enforcement,
    #[serde(default)]
    pub max_tool_calls_per_session: Option<u32>,
}
