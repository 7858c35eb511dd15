//! Console output for commands.
//!
//! Commands never print directly; they write through [`Streams`] so tests can
//! capture both streams.

use std::io::Write;

use colored::Colorize;

use crate::error::{CommandError, Result};

/// Output and error streams handed to every command.
pub struct Streams<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
    color: bool,
}

impl<'a> Streams<'a> {
    /// Uncolored streams.
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self {
            out,
            err,
            color: false,
        }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write `text` to the output stream unchanged.
    ///
    /// # Errors
    /// Returns an I/O error if the stream is closed.
    pub fn print(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(CommandError::io("could not write output"))
    }

    /// Print a success message line.
    ///
    /// # Errors
    /// Returns an I/O error if the stream is closed.
    pub fn success(&mut self, message: &str) -> Result<()> {
        let line = if self.color {
            message.green().to_string()
        } else {
            message.to_string()
        };
        writeln!(self.out, "{line}").map_err(CommandError::io("could not write output"))
    }

    /// Print an informational message line.
    ///
    /// # Errors
    /// Returns an I/O error if the stream is closed.
    pub fn info(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}").map_err(CommandError::io("could not write output"))
    }

    /// Print a warning to the error stream.
    ///
    /// # Errors
    /// Returns an I/O error if the stream is closed.
    pub fn warning(&mut self, message: &str) -> Result<()> {
        let line = if self.color {
            format!("{} {}", "⚠".yellow().bold(), message.yellow())
        } else {
            format!("⚠ {message}")
        };
        writeln!(self.err, "{line}").map_err(CommandError::io("could not write output"))
    }

    /// Print a failed command's error to the error stream.
    ///
    /// # Errors
    /// Returns an I/O error if the stream is closed.
    pub fn error(&mut self, error: &CommandError) -> Result<()> {
        let label = if self.color {
            "Error:".red().bold().to_string()
        } else {
            "Error:".to_string()
        };
        writeln!(self.err, "{label} {error}").map_err(CommandError::io("could not write output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_streams() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut streams = Streams::new(&mut out, &mut err);
        streams.success("generated project acc").unwrap();
        streams.print("raw").unwrap();
        streams.warning("could not record download").unwrap();
        streams
            .error(&CommandError::NotFound("accelerator web not found".into()))
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "generated project acc\nraw");
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "⚠ could not record download\nError: accelerator web not found\n"
        );
    }
}
