// ABOUTME: Connection self-test after deployment.
// ABOUTME: Runs a non-interactive ssh probe with only the new key; failures are warnings.

use keyup_ssh::{CommandRunner, Invocation, KeyPair};

use crate::deploy::SSH_PROGRAM;
use crate::session::SessionParams;
use crate::settings::RunConfig;

/// Common reasons key-based login fails right after installing the key.
pub const TROUBLESHOOTING: &[&str] = &[
    "The remote sshd may have PubkeyAuthentication disabled (check /etc/ssh/sshd_config)",
    "Remote ~/.ssh must be 700 and ~/.ssh/authorized_keys 600, owned by the login user",
    "The remote home directory must not be group- or world-writable",
    "The local private key must be readable only by you (chmod 600)",
    "SELinux or AppArmor may block sshd from reading authorized_keys (try restorecon -R ~/.ssh)",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Succeeded,
    Failed { reason: String },
}

impl Verification {
    pub fn succeeded(&self) -> bool {
        matches!(self, Verification::Succeeded)
    }
}

/// ssh probe that fails instead of prompting: no host-key question, no
/// password fallback, bounded connect time, and only the new identity.
pub fn probe_invocation(config: &RunConfig, session: &SessionParams, key: &KeyPair) -> Invocation {
    Invocation::new(SSH_PROGRAM)
        .arg("-n")
        .args(["-o", "StrictHostKeyChecking=no"])
        .args(["-o", "UserKnownHostsFile=/dev/null"])
        .args(["-o", "BatchMode=yes"])
        .args(["-o", "PasswordAuthentication=no"])
        .arg("-o")
        .arg(format!("ConnectTimeout={}", config.connect_timeout.as_secs()))
        .args(["-o", "IdentitiesOnly=yes"])
        .arg("-i")
        .arg(key.private.to_string_lossy())
        .arg("-p")
        .arg(session.port.to_string())
        .arg(session.destination())
        .arg("exit")
}

/// Try a passwordless login. Never fails the run.
pub fn verify_connection(
    runner: &dyn CommandRunner,
    config: &RunConfig,
    session: &SessionParams,
    key: &KeyPair,
) -> Verification {
    let invocation = probe_invocation(config, session, key);
    tracing::info!("running: {}", invocation);

    match runner.run(&invocation) {
        Ok(status) if status.success() => Verification::Succeeded,
        Ok(status) => Verification::Failed {
            reason: format!("ssh {}", status),
        },
        Err(e) => Verification::Failed {
            reason: format!("failed to run ssh: {}", e),
        },
    }
}

/// Multi-line warning text for a failed probe.
pub fn failure_report(session: &SessionParams, reason: &str) -> String {
    let mut report = format!(
        "Passwordless login to {} (port {}) did not work: {}\nCommon causes:",
        session.destination(),
        session.port,
        reason
    );
    for cause in TROUBLESHOOTING {
        report.push_str("\n  - ");
        report.push_str(cause);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Overrides, Settings};
    use chrono::Local;
    use keyup_ssh::{KeyType, RunStatus};

    struct FixedRunner(std::io::Result<RunStatus>);

    impl CommandRunner for FixedRunner {
        fn run(&self, _invocation: &Invocation) -> std::io::Result<RunStatus> {
            match &self.0 {
                Ok(status) => Ok(*status),
                Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
            }
        }

        fn is_available(&self, _program: &str) -> bool {
            true
        }
    }

    fn config() -> RunConfig {
        RunConfig::resolve(
            Overrides {
                ssh_dir: Some("/home/admin/.ssh".into()),
                host_key_policy: None,
            },
            Settings::default(),
            Local::now(),
        )
        .unwrap()
    }

    fn session() -> SessionParams {
        SessionParams {
            hostname: "web.example.com".into(),
            username: "deploy".into(),
            port: 22,
            key_type: KeyType::Ed25519,
            alias: "web".into(),
        }
    }

    fn key() -> KeyPair {
        KeyPair::at(std::path::Path::new("/home/admin/.ssh/id_ed25519_web"))
    }

    #[test]
    fn test_probe_is_non_interactive() {
        let inv = probe_invocation(&config(), &session(), &key());
        let options: Vec<&str> = inv
            .args
            .windows(2)
            .filter(|w| w[0] == "-o")
            .map(|w| w[1].as_str())
            .collect();

        assert_eq!(inv.program, "ssh");
        assert!(options.contains(&"StrictHostKeyChecking=no"));
        assert!(options.contains(&"BatchMode=yes"));
        assert!(options.contains(&"PasswordAuthentication=no"));
        assert!(options.contains(&"ConnectTimeout=10"));
        assert!(options.contains(&"IdentitiesOnly=yes"));
        assert_eq!(inv.flag_value("-i"), Some("/home/admin/.ssh/id_ed25519_web"));
        assert_eq!(inv.flag_value("-p"), Some("22"));
        assert_eq!(inv.args[inv.args.len() - 2], "deploy@web.example.com");
        assert_eq!(inv.args.last().map(String::as_str), Some("exit"));
    }

    #[test]
    fn test_verify_success() {
        let result = verify_connection(&FixedRunner(Ok(RunStatus::SUCCESS)), &config(), &session(), &key());
        assert!(result.succeeded());
    }

    #[test]
    fn test_verify_failure_is_a_value() {
        let result = verify_connection(&FixedRunner(Ok(RunStatus::failed(255))), &config(), &session(), &key());
        assert_eq!(
            result,
            Verification::Failed {
                reason: "ssh exit status 255".into()
            }
        );
    }

    #[test]
    fn test_verify_spawn_error_is_a_value() {
        let runner = FixedRunner(Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no ssh")));
        let result = verify_connection(&runner, &config(), &session(), &key());
        assert!(!result.succeeded());
    }

    #[test]
    fn test_failure_report_lists_causes() {
        let report = failure_report(&session(), "ssh exit status 255");
        assert!(report.starts_with("Passwordless login to deploy@web.example.com (port 22)"));
        assert!(report.contains("PubkeyAuthentication"));
        assert!(report.contains("SELinux"));
        assert_eq!(report.lines().count(), 2 + TROUBLESHOOTING.len());
    }
}
