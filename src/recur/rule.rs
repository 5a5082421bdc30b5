// Recurrence rules and their user-facing tokens

use chrono::{Duration, NaiveDate};
use crate::models::TaskError;
use crate::utils::days_in_month;

/// Recurrence of a task
///
/// Variants are declared in precedence order, so the derived `Ord` gives
/// Monthly < Weekly < Daily. When a parent aggregates its children the
/// greater rule wins; `Option<Recurrence>` puts "no recurrence" below all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Recurrence {
    Monthly,
    Weekly,
    Daily,
}

impl Recurrence {
    pub const ALL: [Recurrence; 3] = [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly];

    /// Canonical identifier used in the state file
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            "monthly" => Some(Recurrence::Monthly),
            _ => None,
        }
    }

    /// Precedence rank: Monthly = 1, Weekly = 2, Daily = 3
    pub fn precedence(&self) -> u8 {
        match self {
            Recurrence::Monthly => 1,
            Recurrence::Weekly => 2,
            Recurrence::Daily => 3,
        }
    }

    /// Interval to advance or roll back by, evaluated on `today`
    /// Monthly uses the length of today's calendar month.
    pub fn interval(&self, today: NaiveDate) -> Duration {
        match self {
            Recurrence::Daily => Duration::days(1),
            Recurrence::Weekly => Duration::weeks(1),
            Recurrence::Monthly => Duration::days(days_in_month(today)),
        }
    }
}

/// Serialise an optional recurrence for the state file
pub fn recurrence_to_save(recurrence: Option<Recurrence>) -> &'static str {
    recurrence.map(|r| r.as_str()).unwrap_or("none")
}

/// Parse a recurrence written by `recurrence_to_save`
/// Unknown identifiers are returned as the error value.
pub fn recurrence_from_save(text: &str) -> Result<Option<Recurrence>, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Recurrence::from_str(&text.to_lowercase())
        .map(Some)
        .ok_or_else(|| text.to_string())
}

/// User-facing recurrence tokens, injected from settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceTokens {
    pub daily: String,
    pub weekly: String,
    pub monthly: String,
    pub none: String,
}

impl Default for RecurrenceTokens {
    fn default() -> Self {
        Self {
            daily: "daily".to_string(),
            weekly: "weekly".to_string(),
            monthly: "monthly".to_string(),
            none: "none".to_string(),
        }
    }
}

impl RecurrenceTokens {
    pub fn token(&self, recurrence: Recurrence) -> &str {
        match recurrence {
            Recurrence::Daily => &self.daily,
            Recurrence::Weekly => &self.weekly,
            Recurrence::Monthly => &self.monthly,
        }
    }

    /// Display text for an optional recurrence (empty when unset)
    pub fn display(&self, recurrence: Option<Recurrence>) -> &str {
        recurrence.map(|r| self.token(r)).unwrap_or("")
    }

    /// Parse a user token
    ///
    /// Empty input and the "none" token mean no recurrence. Anything else
    /// that is not one of the three rule tokens is rejected.
    pub fn parse(&self, text: &str) -> Result<Option<Recurrence>, TaskError> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(&self.none) {
            return Ok(None);
        }
        Recurrence::ALL
            .iter()
            .copied()
            .find(|r| self.token(*r).eq_ignore_ascii_case(text))
            .map(Some)
            .ok_or_else(|| TaskError::InvalidRecurrence {
                token: text.to_string(),
                valid: self.valid_tokens(),
            })
    }

    /// Accepted tokens, for prompts and error messages
    pub fn valid_tokens(&self) -> Vec<String> {
        vec![
            self.daily.clone(),
            self.weekly.clone(),
            self.monthly.clone(),
            self.none.clone(),
        ]
    }
}
