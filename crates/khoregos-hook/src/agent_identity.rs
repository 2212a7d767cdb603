//! Agent identification (`spec.md` §4.7): correlate the host runtime's
//! external session id to an agent record, falling back to an implicit
//! `"primary"` agent that is created on first use.

use khoregos_state::StateManager;
use khoregos_store::model::Agent;

use crate::error::Result;

pub const PRIMARY_AGENT_NAME: &str = "primary";

pub fn resolve_agent(
    state: &StateManager,
    session_id: &str,
    external_session_id: Option<&str>,
) -> Result<Agent> {
    if let Some(external_session_id) = external_session_id {
        if let Some(agent) = state.get_agent_by_external_session_id(external_session_id)? {
            return Ok(agent);
        }
        if let Some(agent) =
            state.assign_external_session_to_newest_unassigned(session_id, external_session_id)?
        {
            return Ok(agent);
        }
        // Nothing unassigned to claim yet — fall through to the
        // implicit-primary agent below. A subsequent hook call with the
        // same external id will pick it up once it exists.
    }

    if let Some(agent) = state.get_agent_by_name(session_id, PRIMARY_AGENT_NAME)? {
        return Ok(agent);
    }
    Ok(state.register_agent(session_id, PRIMARY_AGENT_NAME, None, None, None)?)
}
