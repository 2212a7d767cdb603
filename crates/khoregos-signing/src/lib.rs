//! Per-project signing key lifecycle and the HMAC audit chain
//! (`spec.md` §4.2): canonicalization, `compute_hmac`, `genesis`, and
//! best-effort `verify_chain`.

pub mod canonical;
pub mod chain;
pub mod error;
pub mod key;

pub use canonical::canonical;
pub use chain::{genesis, verify_chain, ChainIssue, ChainIssueKind, ChainVerification, compute_hmac};
pub use error::{Result, SigningError};
pub use key::{generate_key, load_key, KEY_LEN};
