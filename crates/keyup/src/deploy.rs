// ABOUTME: Installs the public key into the remote authorized_keys list.
// ABOUTME: Uses ssh-copy-id when present, otherwise pipes the key through a manual ssh command.

use keyup_ssh::{CommandRunner, Invocation, KeyPair};
use std::fmt;

use crate::error::DeployError;
use crate::session::SessionParams;

pub const COPY_ID_PROGRAM: &str = "ssh-copy-id";
pub const SSH_PROGRAM: &str = "ssh";

/// Remote shell command for the manual path. The key arrives on stdin.
pub const REMOTE_INSTALL_SCRIPT: &str = "umask 077; mkdir -p ~/.ssh && chmod 700 ~/.ssh && cat >> ~/.ssh/authorized_keys && chmod 600 ~/.ssh/authorized_keys";

/// How the key gets to the remote host. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStrategy {
    /// ssh-copy-id is installed and does the work.
    CopyId,
    /// Append the key over a plain ssh session.
    Manual,
}

impl DeployStrategy {
    pub fn detect(runner: &dyn CommandRunner) -> Self {
        if runner.is_available(COPY_ID_PROGRAM) {
            DeployStrategy::CopyId
        } else {
            DeployStrategy::Manual
        }
    }
}

impl fmt::Display for DeployStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployStrategy::CopyId => f.write_str(COPY_ID_PROGRAM),
            DeployStrategy::Manual => f.write_str("manual ssh copy"),
        }
    }
}

/// Command line for `strategy`. `public_key` is the key text piped to the
/// manual install; ssh-copy-id reads the file itself.
pub fn deploy_invocation(
    strategy: DeployStrategy,
    session: &SessionParams,
    key: &KeyPair,
    public_key: &str,
) -> Invocation {
    let port = session.port.to_string();
    match strategy {
        DeployStrategy::CopyId => Invocation::new(COPY_ID_PROGRAM)
            .arg("-i")
            .arg(key.public.to_string_lossy())
            .args(["-p", port.as_str()])
            .arg(session.destination()),
        DeployStrategy::Manual => {
            let mut line = public_key.trim_end().to_string();
            line.push('\n');
            Invocation::new(SSH_PROGRAM)
                .args(["-p", port.as_str()])
                .arg(session.destination())
                .arg(REMOTE_INSTALL_SCRIPT)
                .stdin(line)
        }
    }
}

/// Push the public key with the chosen strategy. Blocks while the user
/// authenticates. There is no retry and no switch to the other strategy.
pub fn deploy_key(
    runner: &dyn CommandRunner,
    strategy: DeployStrategy,
    session: &SessionParams,
    key: &KeyPair,
) -> Result<(), DeployError> {
    let public_key = std::fs::read_to_string(&key.public).map_err(|e| DeployError::ReadPublicKey {
        path: key.public.clone(),
        source: e,
    })?;

    let invocation = deploy_invocation(strategy, session, key, &public_key);
    tracing::info!("running: {}", invocation);

    let status = runner.run(&invocation).map_err(|e| DeployError::Spawn {
        program: invocation.program.clone(),
        source: e,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(DeployError::Failed {
            strategy: strategy.to_string(),
            status: status.to_string(),
        })
    }
}
