// ABOUTME: SSH public key fingerprint computation.
// ABOUTME: Produces the SHA256:<base64> form that `ssh-keygen -l` prints.

use crate::error::{Result, SshError};
use base64::Engine;
use sha2::{Digest, Sha256};
use ssh_key::PublicKey;
use std::path::Path;

/// Read and parse an OpenSSH public key file (`<type> <base64> [comment]`).
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_public_key(path: &Path) -> Result<PublicKey> {
    let data = std::fs::read_to_string(path).map_err(|e| SshError::ReadKey {
        path: path.to_path_buf(),
        source: e,
    })?;

    PublicKey::from_openssh(data.trim()).map_err(|e| SshError::ParseKey {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Compute the SHA256 fingerprint of a public key.
///
/// Hashes the key blob in SSH wire format (algorithm name followed by the
/// algorithm-specific fields, each length-prefixed) and encodes the digest as
/// unpadded base64, prefixed with `SHA256:`. Works for every key type
/// ssh-keygen can produce.
pub fn compute_fingerprint(public_key: &PublicKey) -> Result<String> {
    let wire_data = public_key.to_bytes().map_err(SshError::SerializeKey)?;

    let mut hasher = Sha256::new();
    hasher.update(&wire_data);
    let hash = hasher.finalize();

    Ok(format!(
        "SHA256:{}",
        base64::engine::general_purpose::STANDARD_NO_PAD.encode(hash)
    ))
}
