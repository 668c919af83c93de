// ABOUTME: SSH key pair paths, backups and generation through ssh-keygen.
// ABOUTME: Handles the id_<type>_<alias> layout and owner-only permissions on the private key.

use crate::command::{CommandRunner, Invocation};
use crate::error::{Result, SshError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Program used to create key pairs.
pub const KEYGEN_PROGRAM: &str = "ssh-keygen";

/// Key algorithms keyup can ask ssh-keygen for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Ed25519,
    Rsa,
    Ecdsa,
}

impl KeyType {
    pub const ALL: [KeyType; 3] = [KeyType::Ed25519, KeyType::Rsa, KeyType::Ecdsa];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Rsa => "rsa",
            KeyType::Ecdsa => "ecdsa",
        }
    }

    /// Value passed to `ssh-keygen -b`. Ed25519 has a fixed size.
    pub fn keygen_bits(&self) -> Option<u32> {
        match self {
            KeyType::Ed25519 => None,
            KeyType::Rsa => Some(4096),
            KeyType::Ecdsa => Some(521),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = SshError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        KeyType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| SshError::UnsupportedKeyType(s.trim().to_string()))
    }
}

/// Everything ssh-keygen needs to create one key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub path: PathBuf,
    pub key_type: KeyType,
    pub comment: String,
}

/// A private key file and its `.pub` sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private: PathBuf,
    pub public: PathBuf,
}

impl KeyPair {
    pub fn at(private: &Path) -> Self {
        Self {
            private: private.to_path_buf(),
            public: public_key_path(private),
        }
    }

    pub fn exists(&self) -> bool {
        self.private.exists()
    }
}

/// Key path for a type and alias: `<ssh_dir>/id_<type>_<alias>`.
pub fn key_path(ssh_dir: &Path, key_type: KeyType, alias: &str) -> PathBuf {
    ssh_dir.join(format!("id_{}_{}", key_type, alias))
}

/// Append `suffix` to the file name. Unlike `with_extension`, this keeps
/// aliases such as `web.example.com` intact.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Public key path for a private key: `<path>.pub`.
pub fn public_key_path(private: &Path) -> PathBuf {
    with_suffix(private, ".pub")
}

/// Backup path for a key file: `<path>.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

/// Comment embedded in the key: `<user>@<local_host>-<alias>-<YYYYMMDD>`.
pub fn key_comment(user: &str, local_host: &str, alias: &str, date: NaiveDate) -> String {
    format!("{}@{}-{}-{}", user, local_host, alias, date.format("%Y%m%d"))
}

/// Create the SSH directory with 0700 permissions if it does not exist yet.
///
/// An existing directory is left untouched.
pub fn ensure_ssh_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    std::fs::create_dir_all(dir).map_err(|e| SshError::CreateDirectory {
        path: dir.to_path_buf(),
        source: e,
    })?;

    set_mode(dir, 0o700)
}

/// Copy the private and public key files to `.bak` siblings.
///
/// Files that do not exist are skipped; an older backup is overwritten.
/// Returns the backup paths written.
pub fn backup_key_pair(private: &Path) -> Result<Vec<PathBuf>> {
    let pair = KeyPair::at(private);
    let mut written = Vec::new();

    for path in [&pair.private, &pair.public] {
        if !path.exists() {
            continue;
        }
        let backup = backup_path(path);
        std::fs::copy(path, &backup).map_err(|e| SshError::BackupKey {
            path: path.clone(),
            source: e,
        })?;
        written.push(backup);
    }

    Ok(written)
}

/// Build the ssh-keygen command line for `spec`.
pub fn keygen_invocation(spec: &KeySpec) -> Invocation {
    let mut invocation = Invocation::new(KEYGEN_PROGRAM).args(["-t", spec.key_type.as_str()]);

    if let Some(bits) = spec.key_type.keygen_bits() {
        invocation = invocation.args(["-b".to_string(), bits.to_string()]);
    }

    invocation
        .arg("-f")
        .arg(spec.path.to_string_lossy())
        .arg("-C")
        .arg(spec.comment.as_str())
}

/// Where ssh-keygen writes before the new pair replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    with_suffix(path, ".keyup-new")
}

/// Generate a new key pair with ssh-keygen and apply file permissions.
///
/// ssh-keygen writes to a staging path next to `spec.path`; the files at
/// `spec.path` are only replaced once it has succeeded, so a failed or
/// interrupted run leaves any existing pair in place. ssh-keygen runs
/// attached to the terminal so the user can choose a passphrase. The private
/// key ends up 0600 and the public key 0644.
///
/// # Errors
/// Returns `SshError::GenerateKey` if ssh-keygen fails or leaves either file
/// missing.
pub fn generate_key_pair(runner: &dyn CommandRunner, spec: &KeySpec) -> Result<KeyPair> {
    let target = KeyPair::at(&spec.path);
    let staged = KeyPair::at(&staging_path(&spec.path));

    if let Some(parent) = spec.path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SshError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    remove_pair(&staged)?;

    let invocation = keygen_invocation(&KeySpec {
        path: staged.private.clone(),
        ..spec.clone()
    });
    let status = runner.run(&invocation).map_err(|e| SshError::SpawnCommand {
        program: invocation.program.clone(),
        source: e,
    });

    let status = match status {
        Ok(status) => status,
        Err(e) => {
            let _ = remove_pair(&staged);
            return Err(e);
        }
    };

    if !status.success() {
        let _ = remove_pair(&staged);
        return Err(SshError::GenerateKey {
            path: spec.path.clone(),
            reason: format!("{} failed with {}", KEYGEN_PROGRAM, status),
        });
    }

    for path in [&staged.private, &staged.public] {
        if !path.exists() {
            let _ = remove_pair(&staged);
            return Err(SshError::GenerateKey {
                path: spec.path.clone(),
                reason: format!("{} did not create {}", KEYGEN_PROGRAM, path.display()),
            });
        }
    }

    set_mode(&staged.private, 0o600)?;
    set_mode(&staged.public, 0o644)?;

    for (from, to) in [(&staged.private, &target.private), (&staged.public, &target.public)] {
        std::fs::rename(from, to).map_err(|e| SshError::InstallKey {
            path: to.clone(),
            source: e,
        })?;
    }

    Ok(target)
}

fn remove_pair(pair: &KeyPair) -> Result<()> {
    for path in [&pair.private, &pair.public] {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| SshError::RemoveKey {
                path: path.clone(),
                source: e,
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        SshError::SetPermissions {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
