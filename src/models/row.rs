// Display rows handed to the renderer

use chrono::NaiveDate;
use crate::recur::RecurrenceTokens;
use crate::strings::Strings;

/// One table row: the five semantic columns as plain text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub description: String,
    pub do_date: String,
    pub due_date: String,
    pub recurrence: String,
}

impl Row {
    pub fn cells(&self) -> [&str; 5] {
        [
            self.id.as_str(),
            self.description.as_str(),
            self.do_date.as_str(),
            self.due_date.as_str(),
            self.recurrence.as_str(),
        ]
    }
}

/// How close a date has to be before a hidden item is shown again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityWindows {
    pub do_days: i64,
    pub due_days: i64,
}

impl Default for VisibilityWindows {
    fn default() -> Self {
        Self { do_days: 2, due_days: 3 }
    }
}

/// Everything rendering and interactive editing need besides the tree
///
/// Built once per command from the session's settings and passed down.
#[derive(Debug, Clone, Copy)]
pub struct DisplayContext<'a> {
    pub today: NaiveDate,
    pub strings: &'a Strings,
    pub tokens: &'a RecurrenceTokens,
    pub windows: VisibilityWindows,
}
