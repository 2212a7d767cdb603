// error.rs — Error types for the signing subsystem.
//
// Uses `thiserror` to derive the standard Rust `Error` trait. Chain-level
// integrity problems (gaps, missing hmacs, mismatches) are not modeled
// here: `spec.md` §4.2 treats them as *results* of `verify_chain`, not
// failures, so they live in `chain::ChainIssue` instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("failed to read signing key at {path}: {source}")]
    KeyReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write signing key at {path}: {source}")]
    KeyWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("signing key at {path} is not valid 32-byte hex: {reason}")]
    KeyMalformed { path: PathBuf, reason: String },

    #[error("hmac key of invalid length")]
    InvalidKeyLength,

    #[error("failed to generate random key material: {reason}")]
    RandomGenerationFailed { reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SigningError>;
