//! Exclusive, TTL-bounded per-path file locks layered on the same
//! single-writer store every other `khoregos-*` crate shares
//! (`spec.md` §4.6).

pub mod error;
pub mod manager;

pub use error::{LockError, Result};
pub use manager::{FileLockManager, LockOutcome, DEFAULT_DURATION_SECONDS};
