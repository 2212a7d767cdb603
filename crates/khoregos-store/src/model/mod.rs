pub mod agent;
pub mod audit_event;
pub mod boundary_violation;
pub mod context_entry;
pub mod event_type;
pub mod file_lock;
pub mod session;

pub use agent::{Agent, AgentRole, AgentState};
pub use audit_event::AuditEvent;
pub use boundary_violation::{BoundaryViolation, EnforcementAction, ViolationType};
pub use context_entry::ContextEntry;
pub use event_type::{EventType, Severity};
pub use file_lock::FileLock;
pub use session::{Session, SessionState};
