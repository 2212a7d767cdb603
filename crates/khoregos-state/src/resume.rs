//! `generate_resume_context` — a markdown briefing handed to a freshly
//! spawned agent so it can pick up a session's prior state without
//! replaying the whole audit log (`spec.md` §4.4).

use khoregos_store::model::{Agent, AgentState, ContextEntry};

use crate::manager::StateManager;
use crate::Result;

const MAX_CONTEXT_ENTRIES: usize = 10;
const MAX_VALUE_CHARS: usize = 100;

impl StateManager {
    /// Compose a markdown block with the session's objective, its
    /// currently active agents, and its first ten saved context entries
    /// (each value truncated to 100 characters). Returns an empty string
    /// if the session is unknown.
    pub fn generate_resume_context(&self, session_id: &str) -> Result<String> {
        let Some(session) = self.get_session(session_id)? else {
            return Ok(String::new());
        };

        let active_agents: Vec<Agent> = self.store.fetch_all(
            "SELECT * FROM agents WHERE session_id = ?1 AND state = ?2 ORDER BY spawned_at ASC",
            &[&session_id, &AgentState::Active.as_str()],
            Agent::from_row,
        )?;

        let entries: Vec<ContextEntry> = self.store.fetch_all(
            "SELECT * FROM context_store WHERE session_id = ?1 ORDER BY updated_at ASC LIMIT ?2",
            &[&session_id, &(MAX_CONTEXT_ENTRIES as i64)],
            ContextEntry::from_row,
        )?;

        let mut out = String::new();
        out.push_str("## Resumed session context\n\n");
        out.push_str(&format!(
            "**Objective:** {}\n\n",
            session.objective.as_deref().unwrap_or("(none recorded)")
        ));

        out.push_str("**Active agents:**\n");
        if active_agents.is_empty() {
            out.push_str("- (none)\n");
        } else {
            for agent in &active_agents {
                match &agent.role {
                    Some(role) => out.push_str(&format!("- {} ({})\n", agent.name, role.as_str())),
                    None => out.push_str(&format!("- {}\n", agent.name)),
                }
            }
        }
        out.push('\n');

        out.push_str("**Prior context:**\n");
        if entries.is_empty() {
            out.push_str("- (none)\n");
        } else {
            for entry in &entries {
                let value = entry.value.as_deref().unwrap_or("");
                let truncated = truncate(value, MAX_VALUE_CHARS);
                out.push_str(&format!("- {}: {}\n", entry.key, truncated));
            }
        }

        Ok(out)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(max_chars).collect();
        truncated.push('…');
        truncated
    }
}
