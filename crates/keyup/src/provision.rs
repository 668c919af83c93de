// ABOUTME: Key provisioning step: reuse, or back up and regenerate, the key pair for an alias.
// ABOUTME: Wraps keyup-ssh key generation with the overwrite prompt and fingerprint report.

use anyhow::{bail, Context, Result};
use keyup_ssh::{CommandRunner, KeyPair, KeySpec};
use std::io::{BufRead, Write};

use crate::prompt::Prompter;
use crate::session::SessionParams;
use crate::settings::RunConfig;

/// Make sure a key pair exists at `<ssh-dir>/id_<type>_<alias>`.
///
/// An existing pair is only replaced if the user agrees; the old files are
/// copied to `.bak` first. Declining keeps both files untouched.
pub fn provision_key<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    runner: &dyn CommandRunner,
    config: &RunConfig,
    session: &SessionParams,
) -> Result<KeyPair> {
    let path = keyup_ssh::key_path(&config.ssh_dir, session.key_type, &session.alias);
    let existing = KeyPair::at(&path);

    if existing.exists() {
        prompter.warn(format!("Key already exists: {}", path.display()))?;
        let overwrite = prompter.confirm("Overwrite it? (the current pair is saved as .bak)", false)?;

        if !overwrite {
            if !existing.public.exists() {
                bail!(
                    "Public key {} is missing; rerun and choose to overwrite the key",
                    existing.public.display()
                );
            }
            prompter.info(format!("Reusing existing key {}", path.display()))?;
            report_fingerprint(prompter, &existing)?;
            return Ok(existing);
        }

        let backups = keyup_ssh::backup_key_pair(&path).context("Failed to back up existing key")?;
        for backup in backups {
            prompter.info(format!("Backed up to {}", backup.display()))?;
        }
    }

    let spec = KeySpec {
        comment: keyup_ssh::key_comment(
            &session.username,
            &config.local_hostname,
            &session.alias,
            config.started.date_naive(),
        ),
        path,
        key_type: session.key_type,
    };

    prompter.info(format!(
        "Generating {} key {} (press Enter twice for no passphrase)",
        spec.key_type,
        spec.path.display()
    ))?;

    let pair = keyup_ssh::generate_key_pair(runner, &spec).context("Key generation failed")?;

    prompter.success(format!("Private key: {} (0600)", pair.private.display()))?;
    prompter.success(format!("Public key:  {} (0644)", pair.public.display()))?;
    report_fingerprint(prompter, &pair)?;

    Ok(pair)
}

/// Print the fingerprint of the public key. Parse failures only warn.
fn report_fingerprint<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    pair: &KeyPair,
) -> Result<()> {
    let fingerprint = keyup_ssh::read_public_key(&pair.public)
        .and_then(|key| keyup_ssh::compute_fingerprint(&key));

    match fingerprint {
        Ok(fp) => prompter.info(format!("Fingerprint: {}", fp))?,
        Err(e) => prompter.warn(format!("Could not compute fingerprint: {}", e))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Overrides, Settings};
    use chrono::Local;
    use keyup_ssh::{Invocation, KeyType, RunStatus, SshError};
    use ssh_key::{Algorithm, LineEnding, PrivateKey};
    use std::cell::Cell;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct FakeKeygen {
        succeed: bool,
        calls: Cell<usize>,
    }

    impl FakeKeygen {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                calls: Cell::new(0),
            }
        }
    }

    impl CommandRunner for FakeKeygen {
        fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus> {
            self.calls.set(self.calls.get() + 1);
            if !self.succeed {
                return Ok(RunStatus::failed(1));
            }
            let path = PathBuf::from(invocation.flag_value("-f").unwrap());
            let key = PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519).unwrap();
            std::fs::write(&path, key.to_openssh(LineEnding::LF).unwrap().as_bytes())?;
            std::fs::write(
                keyup_ssh::public_key_path(&path),
                key.public_key().to_openssh().unwrap(),
            )?;
            Ok(RunStatus::SUCCESS)
        }

        fn is_available(&self, _program: &str) -> bool {
            true
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

    fn session() -> SessionParams {
        SessionParams {
            hostname: "10.0.0.5".into(),
            username: "admin".into(),
            port: 22,
            key_type: KeyType::Ed25519,
            alias: "myhost".into(),
        }
    }

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn seed_existing(dir: &Path) -> PathBuf {
        let path = keyup_ssh::key_path(dir, KeyType::Ed25519, "myhost");
        let key = PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519).unwrap();
        std::fs::write(&path, key.to_openssh(LineEnding::LF).unwrap().as_bytes()).unwrap();
        std::fs::write(
            keyup_ssh::public_key_path(&path),
            key.public_key().to_openssh().unwrap(),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_generates_when_missing() {
        let dir = TempDir::new().unwrap();
        let runner = FakeKeygen::new(true);

        let pair = provision_key(&mut prompter(""), &runner, &config(dir.path()), &session()).unwrap();

        assert_eq!(pair.private, dir.path().join("id_ed25519_myhost"));
        assert!(pair.public.exists());
        assert_eq!(runner.calls.get(), 1);
    }

    #[test]
    fn test_declining_overwrite_keeps_original() {
        let dir = TempDir::new().unwrap();
        let path = seed_existing(dir.path());
        let original = std::fs::read(&path).unwrap();
        let runner = FakeKeygen::new(true);

        let pair = provision_key(&mut prompter("n\n"), &runner, &config(dir.path()), &session()).unwrap();

        assert_eq!(pair.private, path);
        assert_eq!(std::fs::read(&path).unwrap(), original);
        assert!(!keyup_ssh::backup_path(&path).exists());
        assert_eq!(runner.calls.get(), 0, "ssh-keygen must not run");
    }

    #[test]
    fn test_accepting_overwrite_backs_up_and_regenerates() {
        let dir = TempDir::new().unwrap();
        let path = seed_existing(dir.path());
        let original_private = std::fs::read(&path).unwrap();
        let original_public = std::fs::read(keyup_ssh::public_key_path(&path)).unwrap();

        provision_key(&mut prompter("y\n"), &FakeKeygen::new(true), &config(dir.path()), &session()).unwrap();

        assert_eq!(std::fs::read(keyup_ssh::backup_path(&path)).unwrap(), original_private);
        assert_eq!(
            std::fs::read(keyup_ssh::backup_path(&keyup_ssh::public_key_path(&path))).unwrap(),
            original_public
        );
        assert_ne!(std::fs::read(&path).unwrap(), original_private);
    }

    #[test]
    fn test_generation_failure_is_fatal() {
        let dir = TempDir::new().unwrap();

        let err = provision_key(&mut prompter(""), &FakeKeygen::new(false), &config(dir.path()), &session())
            .unwrap_err();

        assert!(format!("{err:#}").contains("Key generation failed"));
        assert!(matches!(
            err.downcast_ref::<SshError>(),
            Some(SshError::GenerateKey { .. })
        ));
    }

    #[test]
    fn test_reuse_without_public_key_fails() {
        let dir = TempDir::new().unwrap();
        let path = keyup_ssh::key_path(dir.path(), KeyType::Ed25519, "myhost");
        std::fs::write(&path, "private only").unwrap();

        let err = provision_key(&mut prompter("n\n"), &FakeKeygen::new(true), &config(dir.path()), &session())
            .unwrap_err();
        assert!(err.to_string().contains("is missing"));
    }
}
