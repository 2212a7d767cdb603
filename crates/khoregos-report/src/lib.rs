//! Report generator and chain verifier (`spec.md` §1): a read-only
//! consumer of `khoregos-store` + `khoregos-signing`, run from lifecycle
//! processes rather than hook subprocesses.

pub mod error;
pub mod export;
pub mod verify;

pub use error::{ReportError, Result};
pub use export::{export_session, ChainSummary, ExportedEvent, SessionExport};
pub use verify::{verify_session, VerifyReport};
