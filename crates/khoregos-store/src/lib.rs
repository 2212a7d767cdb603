//! The project-local single-writer database: connection lifecycle,
//! migrations, identifier allow-list, and the typed models that sit on
//! top of it. Every other `khoregos-*` crate depends on this one and
//! holds no independent persistent state (`spec.md` §3 "Ownership").

pub mod error;
pub mod identifiers;
pub mod layout;
pub mod migrations;
pub mod model;
pub mod store;

pub use error::{Result, StoreError};
pub use store::Store;
