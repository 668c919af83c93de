// ABOUTME: Line-based prompting over any reader/writer pair.
// ABOUTME: Asks for answers, yes/no confirmations, and writes status lines to the same output.

use crate::error::PromptError;
use crate::status::{self, Level};
use std::io::{self, BufRead, Write};

/// Interactive console: answers come from `input`, prompts and status go to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn read_answer(&mut self, label: &str) -> Result<String, PromptError> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Err(PromptError::InputClosed(label.to_string()));
        }
        Ok(line.trim().to_string())
    }

    /// Ask for a value. The default, if any, is shown in brackets; a blank
    /// answer is returned as-is so the caller applies its own default.
    pub fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String, PromptError> {
        match default {
            Some(d) => write!(self.output, "{} [{}]: ", label, d)?,
            None => write!(self.output, "{}: ", label)?,
        }
        self.output.flush()?;

        let answer = self.read_answer(label)?;
        tracing::info!("{label}: {answer}");
        Ok(answer)
    }

    /// Ask a yes/no question. Blank picks `default`; anything other than
    /// y/yes counts as no.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "Y/n" } else { "y/N" };
        write!(self.output, "{} [{}]: ", question, hint)?;
        self.output.flush()?;

        let answer = self.read_answer(question)?.to_ascii_lowercase();
        let confirmed = match answer.as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        };
        tracing::info!("{question} -> {}", if confirmed { "yes" } else { "no" });
        Ok(confirmed)
    }

    pub fn info(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        status::write_status(&mut self.output, Level::Info, message.as_ref())
    }

    pub fn success(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        status::write_status(&mut self.output, Level::Success, message.as_ref())
    }

    pub fn warn(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        status::write_status(&mut self.output, Level::Warn, message.as_ref())
    }

    pub fn step(&mut self, step: usize, total: usize, title: &str) -> io::Result<()> {
        status::write_step(&mut self.output, step, total, title)
    }

    /// Plain line without a status tag.
    pub fn line(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        status::write_line(&mut self.output, text.as_ref())
    }

    pub fn heading(&mut self, title: &str) -> io::Result<()> {
        status::write_heading(&mut self.output, title)
    }

    pub fn command(&mut self, command: &str) -> io::Result<()> {
        status::write_command(&mut self.output, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        colored::control::set_override(false);
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(p: &Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.output().clone()).unwrap()
    }

    #[test]
    fn test_ask_trims_and_shows_default() {
        let mut p = prompter("  web01  \n");
        let answer = p.ask("SSH port", Some("22")).unwrap();
        assert_eq!(answer, "web01");
        assert_eq!(output(&p), "SSH port [22]: ");
    }

    #[test]
    fn test_ask_blank_returns_empty() {
        let mut p = prompter("\n");
        assert_eq!(p.ask("Alias", Some("host")).unwrap(), "");
    }

    #[test]
    fn test_ask_eof_is_error() {
        let mut p = prompter("");
        let err = p.ask("Remote host", None).unwrap_err();
        assert!(matches!(err, PromptError::InputClosed(label) if label == "Remote host"));
    }

    #[test]
    fn test_confirm_answers() {
        let mut p = prompter("y\nYES\nn\nwhatever\n\n\n");
        assert!(p.confirm("q1", false).unwrap());
        assert!(p.confirm("q2", false).unwrap());
        assert!(!p.confirm("q3", true).unwrap());
        assert!(!p.confirm("q4", true).unwrap());
        assert!(p.confirm("q5", true).unwrap());
        assert!(!p.confirm("q6", false).unwrap());
    }

    #[test]
    fn test_confirm_hint_reflects_default() {
        let mut p = prompter("\n\n");
        p.confirm("Overwrite?", false).unwrap();
        p.confirm("Continue?", true).unwrap();
        assert_eq!(output(&p), "Overwrite? [y/N]: Continue? [Y/n]: ");
    }

    #[test]
    fn test_status_lines_share_output() {
        let mut p = prompter("");
        p.info("one").unwrap();
        p.warn("two").unwrap();
        assert_eq!(output(&p), "[INFO] one\n[WARN] two\n");
    }
}
