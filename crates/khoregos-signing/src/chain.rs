//! HMAC chain primitives: the genesis value, per-event hmac computation,
//! and best-effort chain verification (`spec.md` §4.2, §8 invariant 2).

use hmac::{Hmac, Mac};
use khoregos_store::model::AuditEvent;
use sha2::Sha256;

use crate::canonical::canonical;
use crate::error::{Result, SigningError};

type HmacSha256 = Hmac<Sha256>;

/// The synthetic previous-link value used for the first event of a
/// session's chain.
pub fn genesis(session_id: &str) -> String {
    format!("k6s:genesis:{session_id}")
}

/// `HMAC-SHA256(key, previous_hmac || canonical(event))`, lowercase hex.
pub fn compute_hmac(key: &[u8], previous_hmac: &str, event: &AuditEvent) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKeyLength)?;
    mac.update(previous_hmac.as_bytes());
    mac.update(canonical(event)?.as_bytes());
    let bytes = mac.finalize().into_bytes();
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// One broken link surfaced by [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssueKind {
    /// A sequence number was skipped.
    Gap,
    /// An event should be signed (a prior or later event in the session
    /// carries an hmac) but this one has none.
    Missing,
    /// The stored hmac does not match the recomputed value.
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainIssue {
    pub sequence: i64,
    pub kind: ChainIssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    pub valid: bool,
    pub events_checked: usize,
    pub errors: Vec<ChainIssue>,
}

/// Verify the HMAC chain of `events` (already ordered by ascending
/// sequence) for `session_id` under `key`.
///
/// Verification is best-effort: a gap, a missing hmac, or a mismatch
/// does not halt the scan. Each subsequent link is checked against the
/// *actual* stored hmac of the previous event (not the expected one), so
/// a single broken link does not cascade into spurious mismatches for
/// every event after it — `spec.md` §4.2.
pub fn verify_chain(key: &[u8], session_id: &str, events: &[AuditEvent]) -> Result<ChainVerification> {
    let mut errors = Vec::new();
    let mut previous_hmac = genesis(session_id);
    let mut previous_sequence: Option<i64> = None;

    for event in events {
        if let Some(prev_seq) = previous_sequence {
            if event.sequence != prev_seq + 1 {
                errors.push(ChainIssue {
                    sequence: event.sequence,
                    kind: ChainIssueKind::Gap,
                });
            }
        }
        previous_sequence = Some(event.sequence);

        match &event.hmac {
            None => {
                errors.push(ChainIssue {
                    sequence: event.sequence,
                    kind: ChainIssueKind::Missing,
                });
                // An unsigned event breaks the chain for everything after
                // it; fall back to genesis so later mismatches are still
                // reported relative to *something* rather than cascading
                // silently.
                previous_hmac = genesis(session_id);
            }
            Some(stored) => {
                let expected = compute_hmac(key, &previous_hmac, event)?;
                if &expected != stored {
                    errors.push(ChainIssue {
                        sequence: event.sequence,
                        kind: ChainIssueKind::Mismatch,
                    });
                }
                previous_hmac = stored.clone();
            }
        }
    }

    Ok(ChainVerification {
        valid: errors.is_empty(),
        events_checked: events.len(),
        errors,
    })
}
