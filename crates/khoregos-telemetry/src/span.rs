//! Tracing spans for the two long-running activities the core cares
//! about: one hook invocation, one session lifecycle transition
//! (`spec.md` §4.7, §5).

use tracing::Span;

/// Open a span covering one post-tool-use hook invocation.
pub fn hook_span(tool_name: &str, session_id: &str) -> Span {
    tracing::info_span!("hook_invocation", tool_name, session_id)
}

/// Open a span covering one session lifecycle transition.
pub fn lifecycle_span(transition: &str, session_id: &str) -> Span {
    tracing::info_span!("session_lifecycle", transition, session_id)
}
