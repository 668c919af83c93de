// ABOUTME: Seam between keyup and the external SSH toolchain.
// ABOUTME: Invocation describes one blocking program run; CommandRunner executes it.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// One external program run: program name, arguments, optional stdin payload.
///
/// Without a stdin payload the child inherits the terminal, so tools such as
/// `ssh-copy-id` can prompt for a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Pipe `data` to the child's stdin instead of inheriting the terminal.
    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit information of a finished program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: Option<i32>,
}

impl RunStatus {
    pub const SUCCESS: RunStatus = RunStatus { code: Some(0) };

    pub fn failed(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Run the invocation and block until it exits.
    fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus>;

    /// Whether `program` can be found on this machine.
    fn is_available(&self, program: &str) -> bool;
}

/// Runs programs with `std::process::Command`, inheriting stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if invocation.stdin.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::inherit());
        }

        let mut child = command.spawn()?;

        if let Some(data) = &invocation.stdin {
            // Dropping the handle closes the pipe so the remote `cat` sees EOF.
            if let Some(mut stdin) = child.stdin.take() {
                match stdin.write_all(data.as_bytes()) {
                    Ok(()) => {}
                    // The child exited early; its status tells the story.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(e),
                }
            }
        }

        let status = child.wait()?;
        Ok(RunStatus {
            code: status.code(),
        })
    }

    fn is_available(&self, program: &str) -> bool {
        find_in_path(program).is_some()
    }
}

/// Find an executable named `program` on PATH.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;

    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let candidate_exe = dir.join(format!("{}.exe", program));
            if candidate_exe.is_file() {
                return Some(candidate_exe);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("ssh")
            .arg("-p")
            .arg("2222")
            .args(["admin@host", "exit"])
            .stdin("key");

        assert_eq!(inv.program, "ssh");
        assert_eq!(inv.args, vec!["-p", "2222", "admin@host", "exit"]);
        assert_eq!(inv.stdin.as_deref(), Some("key"));
        assert_eq!(inv.flag_value("-p"), Some("2222"));
        assert_eq!(inv.flag_value("-i"), None);
    }

    #[test]
    fn test_invocation_display_quotes_spaces() {
        let inv = Invocation::new("ssh-keygen").args(["-C", "a b", "-N", ""]);
        assert_eq!(inv.to_string(), "ssh-keygen -C 'a b' -N ''");
    }

    #[test]
    fn test_run_status() {
        assert!(RunStatus::SUCCESS.success());
        assert!(!RunStatus::failed(255).success());
        assert!(!RunStatus { code: None }.success());
        assert_eq!(RunStatus::failed(1).to_string(), "exit status 1");
    }

    #[test]
    fn test_find_in_path_missing_program() {
        assert!(find_in_path("keyup-definitely-not-a-real-program").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_codes() {
        let runner = SystemRunner;
        let ok = runner.run(&Invocation::new("sh").args(["-c", "exit 0"])).unwrap();
        assert!(ok.success());

        let failed = runner.run(&Invocation::new("sh").args(["-c", "exit 3"])).unwrap();
        assert_eq!(failed.code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_pipes_stdin() {
        let runner = SystemRunner;
        let inv = Invocation::new("sh")
            .args(["-c", "read line && test \"$line\" = hello"])
            .stdin("hello\n");
        assert!(runner.run(&inv).unwrap().success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_finds_sh() {
        assert!(SystemRunner.is_available("sh"));
    }
}
