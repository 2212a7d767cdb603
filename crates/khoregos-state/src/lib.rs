//! Session, agent, and per-session context lifecycle on top of
//! `khoregos-store` (`spec.md` §4.4). Each concern — sessions, agents,
//! context, resume-context generation — lives in its own module, each
//! contributing `impl` blocks for the one [`StateManager`] type defined
//! in `manager`.

pub mod agents;
pub mod context;
pub mod error;
pub mod manager;
pub mod resume;
pub mod sessions;

pub use error::{Result, StateError};
pub use manager::StateManager;
pub use sessions::SessionQuery;
