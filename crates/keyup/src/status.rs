// ABOUTME: User-facing status lines, mirrored into the run log.
// ABOUTME: Colored tag on the console, matching tracing event for the log file.

use colored::Colorize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    fn tag(&self) -> colored::ColoredString {
        match self {
            Level::Info => "[INFO]".blue().bold(),
            Level::Success => "[OK]".green().bold(),
            Level::Warn => "[WARN]".yellow().bold(),
            Level::Error => "[ERROR]".red().bold(),
        }
    }
}

/// Write one status message to `out` and record it in the run log.
///
/// Multi-line messages are written line by line, each with the tag.
pub fn write_status<W: Write>(out: &mut W, level: Level, message: &str) -> io::Result<()> {
    match level {
        Level::Info | Level::Success => tracing::info!("{message}"),
        Level::Warn => tracing::warn!("{message}"),
        Level::Error => tracing::error!("{message}"),
    }

    for line in message.lines() {
        writeln!(out, "{} {}", level.tag(), line)?;
    }
    out.flush()
}

/// Step header such as `[2/5] Provisioning key`.
pub fn write_step<W: Write>(out: &mut W, step: usize, total: usize, title: &str) -> io::Result<()> {
    tracing::info!("step {step}/{total}: {title}");
    writeln!(out)?;
    writeln!(out, "{} {}", format!("[{}/{}]", step, total).dimmed(), title.bold())?;
    out.flush()
}

/// Untagged line. Blank lines only reach the console.
pub fn write_line<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    if !text.trim().is_empty() {
        tracing::info!("{text}");
    }
    writeln!(out, "{}", text)?;
    out.flush()
}

/// Bold title line.
pub fn write_heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    tracing::info!("{title}");
    writeln!(out, "{}", title.bold())?;
    out.flush()
}

/// Indented shell command the user can copy.
pub fn write_command<W: Write>(out: &mut W, command: &str) -> io::Result<()> {
    tracing::info!("  {command}");
    writeln!(out, "  {}", command.cyan())?;
    out.flush()
}
