//! The optional out-of-tree extension surface (`spec.md` §4.9). A
//! `PluginHook` implementation may override any subset of the six hook
//! points; the default implementations are no-ops so a plugin interested
//! in only one event type does not need to stub out the rest.
//!
//! Modeled on the teacher's `Send + Sync` trait-object template for
//! pluggable out-of-process collaborators
//! (`ta_changeset::review_channel::ReviewChannel`) — the teacher's own
//! designated plugin crate, `ta-extension`, ships only a `Cargo.toml`
//! with no retrievable source to ground this on more directly.

use khoregos_store::model::{AuditEvent, BoundaryViolation, Session};

use crate::error::Result;

pub trait PluginHook: Send + Sync {
    /// A stable name used only for log attribution when a hook fails.
    fn name(&self) -> &str;

    fn on_session_start(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn on_session_stop(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn on_audit_event(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }

    fn on_tool_use(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }

    fn on_gate_trigger(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }

    fn on_boundary_violation(&self, _violation: &BoundaryViolation) -> Result<()> {
        Ok(())
    }
}

/// Holds every registered plugin and fans out one hook point to all of
/// them, catching and logging any failure — no plugin error ever
/// propagates to the caller (`spec.md` §4.9, §7).
///
/// Not invoked from hook subprocesses, only from long-lived lifecycle
/// processes (`spec.md` §4.9) — enforced by the caller, not this type.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn PluginHook>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self { plugins: Vec::new() }
    }

    pub fn register(&mut self, plugin: Box<dyn PluginHook>) {
        self.plugins.push(plugin);
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn invoke_all(&self, hook_name: &'static str, mut call: impl FnMut(&dyn PluginHook) -> Result<()>) {
        for plugin in &self.plugins {
            if let Err(err) = call(plugin.as_ref()) {
                tracing::error!(plugin = plugin.name(), hook = hook_name, %err, "plugin hook failed");
            }
        }
    }

    pub fn on_session_start(&self, session: &Session) {
        self.invoke_all("on_session_start", |p| p.on_session_start(session));
    }

    pub fn on_session_stop(&self, session: &Session) {
        self.invoke_all("on_session_stop", |p| p.on_session_stop(session));
    }

    pub fn on_audit_event(&self, event: &AuditEvent) {
        self.invoke_all("on_audit_event", |p| p.on_audit_event(event));
    }

    pub fn on_tool_use(&self, event: &AuditEvent) {
        self.invoke_all("on_tool_use", |p| p.on_tool_use(event));
    }

    pub fn on_gate_trigger(&self, event: &AuditEvent) {
        self.invoke_all("on_gate_trigger", |p| p.on_gate_trigger(event));
    }

    pub fn on_boundary_violation(&self, violation: &BoundaryViolation) {
        self.invoke_all("on_boundary_violation", |p| {
            p.on_boundary_violation(violation)
        });
    }
}
