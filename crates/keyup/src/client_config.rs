// ABOUTME: Registers a Host alias block in the local SSH client config.
// ABOUTME: Append-only and idempotent: an alias already declared is never duplicated or changed.

use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ClientConfigError;
use crate::session::SessionParams;
use crate::settings::HostKeyPolicy;

/// One `Host` block as keyup writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBlock {
    pub alias: String,
    pub hostname: String,
    pub user: String,
    pub port: u16,
    pub identity_file: PathBuf,
    pub host_key_policy: HostKeyPolicy,
}

impl HostBlock {
    pub fn new(session: &SessionParams, identity_file: &Path, host_key_policy: HostKeyPolicy) -> Self {
        Self {
            alias: session.alias.clone(),
            hostname: session.hostname.clone(),
            user: session.username.clone(),
            port: session.port,
            identity_file: identity_file.to_path_buf(),
            host_key_policy,
        }
    }

    /// Render the block, preceded by a generation comment.
    pub fn render(&self, stamp: DateTime<Local>) -> String {
        let mut block = format!(
            "# Added by keyup on {}\n",
            stamp.format("%Y-%m-%d %H:%M:%S")
        );
        block.push_str(&format!("Host {}\n", self.alias));
        block.push_str(&format!("    HostName {}\n", self.hostname));
        block.push_str(&format!("    User {}\n", self.user));
        block.push_str(&format!("    Port {}\n", self.port));
        block.push_str(&format!("    IdentityFile {}\n", self.identity_file.display()));
        block.push_str("    IdentitiesOnly yes\n");

        match self.host_key_policy {
            HostKeyPolicy::Disabled => {
                block.push_str("    StrictHostKeyChecking no\n");
                block.push_str("    UserKnownHostsFile /dev/null\n");
            }
            HostKeyPolicy::AcceptNew => {
                block.push_str("    StrictHostKeyChecking accept-new\n");
            }
            HostKeyPolicy::Strict => {}
        }

        block
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyPresent,
}

/// Whether any `Host` line in `contents` lists `alias` as one of its patterns.
///
/// Accepts `Host a b`, `host a` and `Host=a`; comments are ignored.
pub fn has_host_alias(contents: &str, alias: &str) -> bool {
    contents.lines().any(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return false;
        }
        let Some((keyword, rest)) = split_keyword(line) else {
            return false;
        };
        keyword.eq_ignore_ascii_case("host") && rest.split_whitespace().any(|p| p == alias)
    })
}

fn split_keyword(line: &str) -> Option<(&str, &str)> {
    let end = line.find(|c: char| c.is_whitespace() || c == '=')?;
    let (keyword, rest) = line.split_at(end);
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('=').unwrap_or(rest);
    Some((keyword, rest))
}

/// Append `block` to the client config unless its alias is already declared.
///
/// Creates the file if needed and restricts it to 0600 in either case.
pub fn register_alias(
    config_path: &Path,
    block: &HostBlock,
    stamp: DateTime<Local>,
) -> Result<Registration, ClientConfigError> {
    let wrap = |source: std::io::Error| ClientConfigError {
        path: config_path.to_path_buf(),
        source,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_path)
        .map_err(wrap)?;
    restrict_permissions(config_path).map_err(wrap)?;

    let existing = std::fs::read_to_string(config_path).map_err(wrap)?;
    if has_host_alias(&existing, &block.alias) {
        return Ok(Registration::AlreadyPresent);
    }

    let mut text = String::new();
    if !existing.is_empty() {
        if !existing.ends_with('\n') {
            text.push('\n');
        }
        text.push('\n');
    }
    text.push_str(&block.render(stamp));

    file.write_all(text.as_bytes()).map_err(wrap)?;
    Ok(Registration::Added)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
