// Prompter backed by a reader/writer pair (stdin/stdout in the shell)

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use crate::models::Prompter;

pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line; `None` at end of input
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).context("Failed to write output")?;
        self.output.flush().context("Failed to flush output")?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, label: &str) -> Result<String> {
        self.write(label)?;
        self.read_line()?
            .ok_or_else(|| anyhow::anyhow!("Input ended while asking for '{}'", label.trim()))
    }

    fn say(&mut self, line: &str) -> Result<()> {
        self.write(line)?;
        self.write("\n")
    }
}

/// Prompter on the process's stdin and stdout
pub fn stdin_prompter() -> LinePrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    LinePrompter::new(std::io::stdin().lock(), std::io::stdout())
}
