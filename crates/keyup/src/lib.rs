// ABOUTME: Library half of keyup: every step of the interactive key setup.
// ABOUTME: main.rs only parses flags, sets up the run log and calls run::run.

//! # keyup
//!
//! Sets up passwordless SSH to one host in a single interactive run:
//!
//! ```text
//! keyup
//! ├── 1 connection details   host, user, port, key type, alias (validated)
//! ├── 2 key pair             ~/.ssh/id_<type>_<alias> via ssh-keygen (.bak on overwrite)
//! ├── 3 install key          ssh-copy-id, or ssh + authorized_keys append
//! ├── 4 test login           ssh -o BatchMode=yes ... exit (warning only)
//! └── 5 client alias         Host <alias> block in ~/.ssh/config (idempotent)
//! ```

pub mod client_config;
pub mod deploy;
pub mod error;
pub mod prompt;
pub mod provision;
pub mod run;
pub mod session;
pub mod settings;
pub mod status;
pub mod validate;
pub mod verify;

pub use run::{run, ExitReminder, Outcome};
pub use settings::{HostKeyPolicy, Overrides, RunConfig, Settings};

/// Version of the keyup CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
