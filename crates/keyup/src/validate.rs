// ABOUTME: Validation of the interactive answers (host, user, port, key type, alias).
// ABOUTME: Each check is single-shot; the first invalid value aborts the run.

use crate::error::ValidationError;
use keyup_ssh::KeyType;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_PORT: u16 = 22;

static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid DNS name pattern")
});

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}(\.[0-9]{1,3}){3}$").expect("valid IPv4 pattern")
});

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]*$").expect("valid username pattern"));

static ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s#*?/]+$").expect("valid alias pattern"));

/// Accepts a DNS name or a dotted-quad address.
pub fn validate_hostname(input: &str) -> Result<String, ValidationError> {
    let host = input.trim();
    if host.is_empty() {
        return Err(ValidationError::Empty { field: "hostname" });
    }
    if DNS_NAME.is_match(host) || DOTTED_QUAD.is_match(host) {
        Ok(host.to_string())
    } else {
        Err(ValidationError::Hostname(host.to_string()))
    }
}

pub fn validate_username(input: &str) -> Result<String, ValidationError> {
    let user = input.trim();
    if user.is_empty() {
        return Err(ValidationError::Empty { field: "username" });
    }
    if USERNAME.is_match(user) {
        Ok(user.to_string())
    } else {
        Err(ValidationError::Username(user.to_string()))
    }
}

/// Blank input selects `default`. Only plain decimal numbers are accepted:
/// no sign and no leading zeros.
pub fn validate_port(input: &str, default: u16) -> Result<u16, ValidationError> {
    let port = input.trim();
    if port.is_empty() {
        return Ok(default);
    }
    if !port.bytes().all(|b| b.is_ascii_digit()) || port.starts_with('0') {
        return Err(ValidationError::Port(port.to_string()));
    }
    match port.parse::<u16>() {
        Ok(p) if p >= 1 => Ok(p),
        _ => Err(ValidationError::Port(port.to_string())),
    }
}

/// Blank input selects `default`.
pub fn parse_key_type(input: &str, default: KeyType) -> Result<KeyType, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|_| ValidationError::KeyType(value.to_string()))
}

/// Blank input falls back to the hostname. The alias ends up in a file name
/// and a `Host` pattern, so wildcard and path characters are refused.
pub fn resolve_alias(input: &str, hostname: &str) -> Result<String, ValidationError> {
    let alias = input.trim();
    if alias.is_empty() {
        return Ok(hostname.to_string());
    }
    if ALIAS.is_match(alias) {
        Ok(alias.to_string())
    } else {
        Err(ValidationError::Alias(alias.to_string()))
    }
}
