// ABOUTME: Entry point for keyup.
// ABOUTME: Parses flags, opens the run log, runs the interactive setup and maps the result to an exit code.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use keyup::status::{self, Level};
use keyup::{ExitReminder, HostKeyPolicy, Outcome, Overrides, RunConfig, Settings};
use keyup_ssh::SystemRunner;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "keyup",
    about = "Create an SSH key, install it on a remote host and register a client alias",
    long_about = None,
    disable_version_flag = true
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long)]
    version: bool,

    /// Write the run log here (defaults to keyup_<timestamp>.log next to the executable)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// SSH directory for keys and client config (defaults to ~/.ssh)
    #[arg(long, value_name = "DIR", env = "KEYUP_SSH_DIR")]
    ssh_dir: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/keyup/config.toml)
    #[arg(long, value_name = "FILE", env = "KEYUP_CONFIG")]
    config: Option<PathBuf>,

    /// Host-key checking written into the client config block
    #[arg(long, value_enum, env = "KEYUP_HOST_KEY_POLICY")]
    host_key_policy: Option<HostKeyPolicy>,
}

fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help goes to stdout with exit 0; anything else is a usage error.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if cli.version {
        println!("keyup {}", keyup::VERSION);
        return ExitCode::SUCCESS;
    }

    let started = Local::now();
    let log_path = keyup_log::init_run_log(cli.log_file.as_deref(), started);
    let mut reminder = ExitReminder::new(log_path.clone());
    tracing::info!("keyup {} started", keyup::VERSION);

    match execute(cli, started) {
        Ok(Outcome::Cancelled) => {
            tracing::info!("run cancelled by user");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Completed { verified, .. }) => {
            tracing::info!(verified, "run completed");
            if let Some(path) = &log_path {
                let _ = status::write_status(
                    &mut io::stdout(),
                    Level::Info,
                    &format!("Log saved to {}", path.display()),
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = status::write_status(&mut io::stderr(), Level::Error, &format!("{e:#}"));
            reminder.set_code(1);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli, started: chrono::DateTime<Local>) -> Result<Outcome> {
    let settings_path = cli.config.unwrap_or_else(Settings::default_path);
    let settings = Settings::load_or_default(&settings_path)?;
    let config = RunConfig::resolve(
        Overrides {
            ssh_dir: cli.ssh_dir,
            host_key_policy: cli.host_key_policy,
        },
        settings,
        started,
    )?;
    tracing::info!(ssh_dir = %config.ssh_dir.display(), policy = ?config.host_key_policy, "configuration resolved");

    let mut prompter = keyup::prompt::Prompter::stdio();
    keyup::run(&config, &mut prompter, &SystemRunner)
}
