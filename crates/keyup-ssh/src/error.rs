// ABOUTME: Error types for local SSH key operations using thiserror.
// ABOUTME: Provides typed errors for key generation, backup, permissions and tool invocation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during SSH key operations.
#[derive(Error, Debug)]
pub enum SshError {
    /// Failed to read a key file from disk.
    #[error("failed to read SSH key from {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse an SSH key.
    #[error("failed to parse SSH key from {path}: {source}")]
    ParseKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// ssh-keygen did not produce a usable key pair.
    #[error("failed to generate SSH key at {path}: {reason}")]
    GenerateKey { path: PathBuf, reason: String },

    /// Failed to encode a key.
    #[error("failed to serialize key: {0}")]
    SerializeKey(#[source] ssh_key::Error),

    /// Failed to copy a key file to its backup.
    #[error("failed to back up {path}: {source}")]
    BackupKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove a leftover staging file.
    #[error("failed to remove {path}: {source}")]
    RemoveKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a freshly generated key file into place.
    #[error("failed to install new key at {path}: {source}")]
    InstallKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set file permissions.
    #[error("failed to set permissions on {path}: {source}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to start an external program.
    #[error("failed to run {program}: {source}")]
    SpawnCommand {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Key type outside the supported set.
    #[error("unsupported key type: {0} (expected ed25519, rsa or ecdsa)")]
    UnsupportedKeyType(String),
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
