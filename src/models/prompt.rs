// Line-oriented user interaction used by interactive add/edit

use anyhow::Result;
use std::collections::VecDeque;

/// Source of answers for field-by-field prompts
pub trait Prompter {
    /// Show `label` and return one line of input, without the trailing newline
    fn ask(&mut self, label: &str) -> Result<String>;

    /// Show a line of feedback (e.g. the list of valid recurrence tokens)
    fn say(&mut self, line: &str) -> Result<()>;
}

/// Prompter fed from a fixed list of answers
///
/// Runs out with an error instead of blocking, and records everything it
/// was asked and told.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
    pub said: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
            said: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, label: &str) -> Result<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No more scripted answers (asked: {})", label.trim()))
    }

    fn say(&mut self, line: &str) -> Result<()> {
        self.said.push(line.to_string());
        Ok(())
    }
}
