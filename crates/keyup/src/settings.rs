// ABOUTME: Run configuration for keyup.
// ABOUTME: Merges CLI flags, the optional TOML settings file and built-in defaults into one immutable value.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use keyup_ssh::KeyType;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::validate::DEFAULT_PORT;

/// Seconds the connection probe may take before giving up.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// What the generated client-config block says about host-key checking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// `StrictHostKeyChecking no` with known hosts sent to /dev/null.
    #[default]
    Disabled,
    /// `StrictHostKeyChecking accept-new`: trust on first use, then verify.
    AcceptNew,
    /// Leave host-key checking at the client defaults.
    Strict,
}

/// Contents of `~/.config/keyup/config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// SSH directory holding keys and the client config (default ~/.ssh)
    #[serde(default)]
    pub ssh_dir: Option<String>,

    #[serde(default)]
    pub host_key_policy: Option<HostKeyPolicy>,

    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub default_port: Option<u16>,

    #[serde(default)]
    pub default_key_type: Option<KeyType>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        Ok(settings)
    }

    /// Load settings if the file exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the default settings path (~/.config/keyup/config.toml)
    pub fn default_path() -> PathBuf {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyup")
            .join("config.toml")
    }
}

/// Values given on the command line (or via their environment variables).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ssh_dir: Option<PathBuf>,
    pub host_key_policy: Option<HostKeyPolicy>,
}

/// Everything a run needs to know up front. Built once, then only borrowed.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub ssh_dir: PathBuf,
    pub client_config_path: PathBuf,
    pub host_key_policy: HostKeyPolicy,
    pub connect_timeout: Duration,
    pub default_port: u16,
    pub default_key_type: KeyType,
    /// Local machine name, embedded in key comments
    pub local_hostname: String,
    pub started: DateTime<Local>,
}

impl RunConfig {
    /// Merge overrides over settings over defaults.
    pub fn resolve(overrides: Overrides, settings: Settings, started: DateTime<Local>) -> Result<Self> {
        let ssh_dir = match (overrides.ssh_dir, settings.ssh_dir) {
            (Some(dir), _) => expand_tilde(&dir.to_string_lossy()),
            (None, Some(dir)) => expand_tilde(&dir),
            (None, None) => default_ssh_dir()?,
        };

        let local_hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());

        Ok(Self {
            client_config_path: ssh_dir.join("config"),
            ssh_dir,
            host_key_policy: overrides
                .host_key_policy
                .or(settings.host_key_policy)
                .unwrap_or_default(),
            connect_timeout: Duration::from_secs(
                settings
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            default_port: settings.default_port.unwrap_or(DEFAULT_PORT),
            default_key_type: settings.default_key_type.unwrap_or_default(),
            local_hostname,
            started,
        })
    }
}

/// ~/.ssh
pub fn default_ssh_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".ssh"))
}

fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
