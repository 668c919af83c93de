// ABOUTME: Session parameters for one run and the prompts that collect them.
// ABOUTME: Host, user, port, key type and alias are validated as soon as they are entered.

use anyhow::Result;
use keyup_ssh::KeyType;
use std::io::{BufRead, Write};

use crate::prompt::Prompter;
use crate::settings::RunConfig;
use crate::validate;

/// Connection details accepted for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub hostname: String,
    pub username: String,
    pub port: u16,
    pub key_type: KeyType,
    pub alias: String,
}

impl SessionParams {
    /// `user@host` destination for ssh and ssh-copy-id.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }
}

/// Ask for every session parameter in order. The first invalid answer
/// returns a `ValidationError`; there is no re-prompt.
pub fn collect_session<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    config: &RunConfig,
) -> Result<SessionParams> {
    let hostname = validate::validate_hostname(&prompter.ask("Remote host (hostname or IP)", None)?)?;
    let username = validate::validate_username(&prompter.ask("Remote username", None)?)?;

    let default_port = config.default_port.to_string();
    let port = validate::validate_port(
        &prompter.ask("SSH port", Some(&default_port))?,
        config.default_port,
    )?;

    let key_type_label = format!(
        "Key type ({})",
        KeyType::ALL.map(|t| t.as_str()).join("/")
    );
    let key_type = validate::parse_key_type(
        &prompter.ask(&key_type_label, Some(config.default_key_type.as_str()))?,
        config.default_key_type,
    )?;

    let alias = validate::resolve_alias(&prompter.ask("Host alias", Some(&hostname))?, &hostname)?;

    Ok(SessionParams {
        hostname,
        username,
        port,
        key_type,
        alias,
    })
}
