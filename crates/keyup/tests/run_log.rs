// ABOUTME: Checks that what a run prints to the console also lands in the run log file.
// ABOUTME: Single test per binary because the log subscriber is installed process-wide.

use chrono::Local;
use keyup::prompt::Prompter;
use keyup::status::{self, Level};
use keyup::{run, Overrides, RunConfig, Settings};
use keyup_ssh::{CommandRunner, Invocation, RunStatus};
use ssh_key::{Algorithm, LineEnding, PrivateKey};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// ssh-keygen writes real keys; ssh-copy-id is absent; deployment exits with
/// `deploy_code`.
struct Toolchain {
    deploy_code: i32,
}

impl CommandRunner for Toolchain {
    fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus> {
        if invocation.program == "ssh-keygen" {
            let path = PathBuf::from(invocation.flag_value("-f").expect("-f is set"));
            let key = PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519).unwrap();
            std::fs::write(&path, key.to_openssh(LineEnding::LF).unwrap().as_bytes())?;
            std::fs::write(
                keyup_ssh::public_key_path(&path),
                key.public_key().to_openssh().unwrap(),
            )?;
            return Ok(RunStatus::SUCCESS);
        }
        if invocation.args.iter().any(|a| a == "BatchMode=yes") {
            return Ok(RunStatus::SUCCESS);
        }
        Ok(RunStatus::failed(self.deploy_code))
    }

    fn is_available(&self, program: &str) -> bool {
        program != "ssh-copy-id"
    }
}

fn config(ssh_dir: &Path) -> RunConfig {
    RunConfig::resolve(
        Overrides {
            ssh_dir: Some(ssh_dir.to_path_buf()),
            host_key_policy: None,
        },
        Settings::default(),
        Local::now(),
    )
    .unwrap()
}

fn line_with<'a>(log: &'a str, needle: &str) -> &'a str {
    log.lines()
        .find(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("run log has no line containing {needle:?}:\n{log}"))
}

#[test]
fn test_console_lines_are_mirrored_to_run_log() {
    colored::control::set_override(false);
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs").join("keyup_run.log");

    let installed = keyup_log::init_run_log(Some(&log_path), Local::now());
    assert_eq!(installed.as_deref(), Some(log_path.as_path()));

    let cfg = config(&dir.path().join(".ssh"));

    // Completed run: reaches the next-step hints.
    let mut prompter = Prompter::new(
        Cursor::new(b"10.0.0.5\nadmin\n22\ned25519\nmyhost\ny\ny\n".to_vec()),
        Vec::new(),
    );
    run(&cfg, &mut prompter, &Toolchain { deploy_code: 0 }).unwrap();

    // Failed run: deployment error reported the way main reports it.
    let mut prompter = Prompter::new(
        Cursor::new(b"10.0.0.6\nadmin\n22\ned25519\nother\ny\n".to_vec()),
        Vec::new(),
    );
    let err = run(&cfg, &mut prompter, &Toolchain { deploy_code: 1 }).unwrap_err();
    let mut stderr = Vec::new();
    status::write_status(&mut stderr, Level::Error, &format!("{err:#}")).unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();

    line_with(&log, "SSH Key Setup");
    line_with(&log, "step 1/5: Connection details");
    line_with(&log, "Remote host (hostname or IP): 10.0.0.5");
    line_with(&log, "Continue with these settings? -> yes");
    assert!(line_with(&log, "Public key installed on 10.0.0.5").contains("INFO"));
    assert!(line_with(&log, "ssh-copy-id not found").contains("WARN"));
    line_with(&log, "You can now connect with:");
    line_with(&log, "ssh myhost");
    line_with(&log, "ssh -i ");
    assert!(line_with(&log, "Key deployment failed").contains("ERROR"));
}
