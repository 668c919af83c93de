// ABOUTME: Error types for the keyup run.
// ABOUTME: Validation, prompt, precondition and deployment failures, all fatal for a run.

use std::path::PathBuf;
use thiserror::Error;

/// A user answer that failed validation. Aborts the run without retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("invalid hostname '{0}': expected a DNS name (web.example.com) or IPv4 address (192.168.1.10)")]
    Hostname(String),

    #[error("invalid username '{0}': must start with a lowercase letter or underscore, followed by lowercase letters, digits, '_' or '-'")]
    Username(String),

    #[error("invalid port '{0}': must be a number between 1 and 65535")]
    Port(String),

    #[error("invalid key type '{0}': choose ed25519, rsa or ecdsa")]
    KeyType(String),

    #[error("invalid alias '{0}': must not contain whitespace, '#', '*', '?' or '/'")]
    Alias(String),
}

/// Failure while reading an answer from the user.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("input closed while waiting for: {0}")]
    InputClosed(String),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A required external program is missing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("required program '{program}' not found on PATH (install the OpenSSH client tools)")]
pub struct PreconditionError {
    pub program: String,
}

/// Installing the public key on the remote host failed.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("failed to read public key {path}: {source}")]
    ReadPublicKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{strategy} reported failure ({status}); the key was not installed")]
    Failed { strategy: String, status: String },
}

/// Reading or appending to the SSH client config failed.
#[derive(Error, Debug)]
#[error("failed to update SSH client config {path}: {source}")]
pub struct ClientConfigError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
