//! Per-project 32-byte secret key lifecycle (`spec.md` §4.2). Stored
//! hex-encoded at `.khoregos/signing.key`, mode 0600. `generate_key`
//! never overwrites an existing key; `load_key` returns `None` rather
//! than an error when the file is simply absent — the absence of a key
//! means the project runs unsigned, not that something has gone wrong.

use std::path::Path;

use khoregos_store::layout;

use crate::error::{Result, SigningError};

pub const KEY_LEN: usize = 32;

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> std::result::Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd-length hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| format!("invalid hex digit at {i}"))
        })
        .collect()
}

/// Generate and persist a new random 32-byte key under `project_root`'s
/// `.khoregos/` directory. Returns `false` without writing anything if a
/// key already exists — keys are never overwritten.
pub fn generate_key(project_root: impl AsRef<Path>) -> Result<bool> {
    let path = layout::signing_key_path(&project_root);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SigningError::KeyWriteFailed {
            path: path.clone(),
            source,
        })?;
    }

    let mut bytes = [0u8; KEY_LEN];
    fill_random(&mut bytes)?;
    let hex = encode_hex(&bytes);
    std::fs::write(&path, &hex).map_err(|source| SigningError::KeyWriteFailed {
        path: path.clone(),
        source,
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(true)
}

/// Load the project's signing key, if one has been generated. `None`
/// means "run unsigned", not an error.
pub fn load_key(project_root: impl AsRef<Path>) -> Result<Option<[u8; KEY_LEN]>> {
    let path = layout::signing_key_path(&project_root);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| SigningError::KeyReadFailed {
        path: path.clone(),
        source,
    })?;
    let bytes = decode_hex(raw.trim()).map_err(|reason| SigningError::KeyMalformed {
        path: path.clone(),
        reason,
    })?;
    if bytes.len() != KEY_LEN {
        return Err(SigningError::KeyMalformed {
            path,
            reason: format!("expected {KEY_LEN} bytes, got {}", bytes.len()),
        });
    }
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(&bytes);
    Ok(Some(out))
}

/// Fill `buf` with bytes drawn from the OS CSPRNG.
fn fill_random(buf: &mut [u8]) -> Result<()> {
    use rand::RngCore;
    rand::rngs::OsRng
        .try_fill_bytes(buf)
        .map_err(|source| SigningError::RandomGenerationFailed {
            reason: source.to_string(),
        })
}
