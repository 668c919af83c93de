// ABOUTME: Local SSH key handling for keyup.
// ABOUTME: Key pair paths, generation through ssh-keygen, backups, fingerprints and command running.

pub mod command;
pub mod error;
pub mod fingerprint;
pub mod key;

pub use command::{find_in_path, CommandRunner, Invocation, RunStatus, SystemRunner};
pub use error::{Result, SshError};
pub use fingerprint::{compute_fingerprint, read_public_key};
pub use key::{
    backup_key_pair, backup_path, ensure_ssh_dir, generate_key_pair, key_comment, key_path,
    keygen_invocation, public_key_path, KeyPair, KeySpec, KeyType,
};
