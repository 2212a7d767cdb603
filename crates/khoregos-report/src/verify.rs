//! Chain verification over a persisted session (`spec.md` §1, §4.2): a
//! read-only consumer of `khoregos-store` + `khoregos-signing`, used by
//! lifecycle processes rather than hook subprocesses.

use std::path::Path;
use std::sync::Arc;

use khoregos_store::model::AuditEvent;
use khoregos_store::Store;

use crate::error::Result;

/// Outcome of verifying one session's audit chain. `None` when the
/// project has never generated a signing key — an unsigned session has
/// nothing to verify, which is a valid state, not a failure.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub session_id: String,
    pub events_checked: usize,
    pub chain: Option<khoregos_signing::ChainVerification>,
}

impl VerifyReport {
    /// False only when the chain was actually checked and found broken.
    /// An unsigned session reports `true` — it is not in violation of
    /// anything, it simply opted out of signing.
    pub fn valid(&self) -> bool {
        self.chain.as_ref().is_none_or(|c| c.valid)
    }
}

fn events_ascending(store: &Store, session_id: &str) -> Result<Vec<AuditEvent>> {
    Ok(store.fetch_all(
        "SELECT * FROM audit_events WHERE session_id = ?1 ORDER BY sequence ASC",
        &[&session_id],
        AuditEvent::from_row,
    )?)
}

/// Verify the HMAC chain of `session_id` under `project_root`'s signing
/// key, if one has ever been generated.
pub fn verify_session(store: &Arc<Store>, project_root: &Path, session_id: &str) -> Result<VerifyReport> {
    store.connect()?;
    let events = events_ascending(store, session_id)?;

    let chain = match khoregos_signing::load_key(project_root)? {
        Some(key) => Some(khoregos_signing::verify_chain(&key, session_id, &events)?),
        None => None,
    };

    Ok(VerifyReport { session_id: session_id.to_string(), events_checked: events.len(), chain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use khoregos_audit::{AuditLogger, LogRequest};
    use khoregos_store::model::EventType;
    use tempfile::tempdir;

    #[test]
    fn unsigned_session_is_reported_as_valid_with_no_chain() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        let logger = AuditLogger::start(store.clone(), "sess-1", None, None).unwrap();
        logger.log(LogRequest::new(EventType::SessionStart, "start")).unwrap();

        let report = verify_session(&store, dir.path(), "sess-1").unwrap();
        assert!(report.valid());
        assert!(report.chain.is_none());
        assert_eq!(report.events_checked, 1);
    }

    #[test]
    fn signed_session_with_tampered_event_is_reported_invalid() {
        let dir = tempdir().unwrap();
        khoregos_signing::generate_key(dir.path()).unwrap();
        let key = khoregos_signing::load_key(dir.path()).unwrap().unwrap();

        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        let logger = AuditLogger::start(store.clone(), "sess-2", None, Some(key)).unwrap();
        logger.log(LogRequest::new(EventType::SessionStart, "start")).unwrap();
        logger.log(LogRequest::new(EventType::ToolUse, "Write")).unwrap();

        store
            .update(
                "audit_events",
                &[("action", &"tampered")],
                "session_id = ?1 AND sequence = 1",
                &[&"sess-2"],
            )
            .unwrap();

        let report = verify_session(&store, dir.path(), "sess-2").unwrap();
        assert!(!report.valid());
        let chain = report.chain.unwrap();
        assert_eq!(chain.errors.len(), 1);
        assert_eq!(chain.errors[0].sequence, 1);
    }

    #[test]
    fn signed_untampered_chain_is_valid() {
        let dir = tempdir().unwrap();
        khoregos_signing::generate_key(dir.path()).unwrap();
        let key = khoregos_signing::load_key(dir.path()).unwrap().unwrap();

        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        let logger = AuditLogger::start(store.clone(), "sess-3", None, Some(key)).unwrap();
        logger.log(LogRequest::new(EventType::SessionStart, "start")).unwrap();
        logger.log(LogRequest::new(EventType::ToolUse, "Read")).unwrap();
        logger.log(LogRequest::new(EventType::SessionComplete, "complete")).unwrap();

        let report = verify_session(&store, dir.path(), "sess-3").unwrap();
        assert!(report.valid());
        let chain = report.chain.unwrap();
        assert!(chain.errors.is_empty());
        assert_eq!(chain.events_checked, 3);
    }

    #[test]
    fn unknown_session_reports_zero_events() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        let report = verify_session(&store, dir.path(), "nonexistent").unwrap();
        assert!(report.valid());
        assert_eq!(report.events_checked, 0);
    }
}
