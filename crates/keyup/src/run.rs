// ABOUTME: The keyup run: preconditions, input, key, deployment, verification, alias.
// ABOUTME: Steps execute strictly in order; fatal errors propagate, verification only warns.

use anyhow::{Context, Result};
use colored::Colorize;
use keyup_ssh::CommandRunner;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::client_config::{self, HostBlock, Registration};
use crate::deploy::{self, DeployStrategy, COPY_ID_PROGRAM, SSH_PROGRAM};
use crate::error::PreconditionError;
use crate::prompt::Prompter;
use crate::provision;
use crate::session::{self, SessionParams};
use crate::settings::RunConfig;
use crate::verify::{self, Verification};

const TOTAL_STEPS: usize = 5;

/// How a run ended without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user declined at the summary prompt.
    Cancelled,
    Completed {
        verified: bool,
        /// `None` when the user skipped alias registration.
        registration: Option<Registration>,
    },
}

/// Check the required tools and pick the deployment strategy.
///
/// ssh-keygen and ssh are required; a missing ssh-copy-id only selects the
/// manual strategy.
pub fn check_preconditions(runner: &dyn CommandRunner) -> Result<DeployStrategy, PreconditionError> {
    for program in [keyup_ssh::key::KEYGEN_PROGRAM, SSH_PROGRAM] {
        if !runner.is_available(program) {
            return Err(PreconditionError {
                program: program.to_string(),
            });
        }
    }
    Ok(DeployStrategy::detect(runner))
}

/// Execute one interactive run.
pub fn run<R: BufRead, W: Write>(
    config: &RunConfig,
    prompter: &mut Prompter<R, W>,
    runner: &dyn CommandRunner,
) -> Result<Outcome> {
    prompter.heading("SSH Key Setup")?;

    let strategy = check_preconditions(runner)?;
    if strategy == DeployStrategy::Manual {
        prompter.warn(format!(
            "{} not found; the key will be copied with a manual ssh command",
            COPY_ID_PROGRAM
        ))?;
    }

    prompter.step(1, TOTAL_STEPS, "Connection details")?;
    let session = session::collect_session(prompter, config)?;
    print_summary(prompter, config, &session)?;

    if !prompter.confirm("Continue with these settings?", true)? {
        prompter.info("Cancelled by user; nothing was changed")?;
        return Ok(Outcome::Cancelled);
    }

    prompter.step(2, TOTAL_STEPS, "Key pair")?;
    keyup_ssh::ensure_ssh_dir(&config.ssh_dir).context("Failed to prepare SSH directory")?;
    let key = provision::provision_key(prompter, runner, config, &session)?;

    prompter.step(3, TOTAL_STEPS, "Install key on remote host")?;
    prompter.info(format!(
        "Copying public key to {} with {}; enter the remote password when asked",
        session.destination(),
        strategy
    ))?;
    deploy::deploy_key(runner, strategy, &session, &key).context("Key deployment failed")?;
    prompter.success(format!("Public key installed on {}", session.hostname))?;

    prompter.step(4, TOTAL_STEPS, "Test passwordless login")?;
    let verification = verify::verify_connection(runner, config, &session, &key);
    match &verification {
        Verification::Succeeded => prompter.success("Passwordless login works")?,
        Verification::Failed { reason } => {
            prompter.warn(verify::failure_report(&session, reason))?
        }
    }

    prompter.step(5, TOTAL_STEPS, "SSH client alias")?;
    let question = format!(
        "Add '{}' to {}?",
        session.alias,
        config.client_config_path.display()
    );
    let registration = if prompter.confirm(&question, true)? {
        let block = HostBlock::new(&session, &key.private, config.host_key_policy);
        let result = client_config::register_alias(&config.client_config_path, &block, config.started)?;
        match result {
            Registration::Added => prompter.success(format!(
                "Added Host {} to {}",
                session.alias,
                config.client_config_path.display()
            ))?,
            Registration::AlreadyPresent => prompter.warn(format!(
                "Host {} already exists in {}; left unchanged",
                session.alias,
                config.client_config_path.display()
            ))?,
        }
        Some(result)
    } else {
        prompter.info("Skipped client config registration")?;
        None
    };

    print_next_steps(prompter, &session, &key.private, registration.is_some())?;

    Ok(Outcome::Completed {
        verified: verification.succeeded(),
        registration,
    })
}

fn print_summary<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    config: &RunConfig,
    session: &SessionParams,
) -> Result<()> {
    let key_path = keyup_ssh::key_path(&config.ssh_dir, session.key_type, &session.alias);
    prompter.line("")?;
    prompter.info(format!(
        "Target:   {} (port {})\nKey type: {}\nKey file: {}\nAlias:    {}",
        session.destination(),
        session.port,
        session.key_type,
        key_path.display(),
        session.alias
    ))?;
    Ok(())
}

fn print_next_steps<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    session: &SessionParams,
    private_key: &Path,
    alias_registered: bool,
) -> Result<()> {
    prompter.line("")?;
    prompter.success("Setup complete")?;
    prompter.line("You can now connect with:")?;
    if alias_registered {
        prompter.command(&format!("ssh {}", session.alias))?;
    }
    prompter.command(&format!(
        "ssh -i {} -p {} {}",
        private_key.display(),
        session.port,
        session.destination()
    ))?;
    Ok(())
}

/// Reminds the user where the run log is whenever the run ends non-zero.
///
/// Drop runs on every exit path of `main`, including early returns.
pub struct ExitReminder {
    log_path: Option<PathBuf>,
    code: u8,
}

impl ExitReminder {
    pub fn new(log_path: Option<PathBuf>) -> Self {
        Self { log_path, code: 0 }
    }

    pub fn set_code(&mut self, code: u8) {
        self.code = code;
    }

    pub fn message(&self) -> Option<String> {
        if self.code == 0 {
            return None;
        }
        Some(match &self.log_path {
            Some(path) => format!("Run failed (exit {}). Details in {}", self.code, path.display()),
            None => format!("Run failed (exit {}). No run log was written", self.code),
        })
    }
}

impl Drop for ExitReminder {
    fn drop(&mut self) {
        if let Some(message) = self.message() {
            eprintln!("{}", message.yellow());
        }
    }
}
