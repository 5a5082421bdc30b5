// Settings loaded from ~/.tasktree/rc
//
// The rc file is a list of `key=value` lines; `#` starts a comment.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use crate::models::VisibilityWindows;
use crate::recur::RecurrenceTokens;
use crate::strings::{Message, Strings};

/// Default column widths: id, description, do date, due date, recurrence
pub const DEFAULT_COLUMN_WIDTHS: [usize; 5] = [3, 49, 25, 25, 12];
pub const DEFAULT_PADDING: usize = 3;
pub const DEFAULT_BACKUP_KEEP: usize = 10;

/// Runtime configuration, built once at startup and passed down
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_location: PathBuf,
    pub backup_location: PathBuf,
    pub backup_keep: usize,
    pub column_widths: [usize; 5],
    pub padding: usize,
    pub windows: VisibilityWindows,
    pub tokens: RecurrenceTokens,
    pub strings: Strings,
}

impl Settings {
    /// Directory holding the rc file and, by default, the data
    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tasktree")
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::base_dir().join("rc")
    }

    /// Defaults with data files placed in `dir`
    pub fn defaults_in(dir: &Path) -> Self {
        Self {
            data_location: dir.join("items.json"),
            backup_location: dir.join("backups.db"),
            backup_keep: DEFAULT_BACKUP_KEEP,
            column_widths: DEFAULT_COLUMN_WIDTHS,
            padding: DEFAULT_PADDING,
            windows: VisibilityWindows::default(),
            tokens: RecurrenceTokens::default(),
            strings: Strings::new(),
        }
    }

    /// Load settings from the rc file, or defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        let base_dir = Self::base_dir();

        if !config_path.exists() {
            log::debug!("No rc file at {}, using defaults", config_path.display());
            return Ok(Self::defaults_in(&base_dir));
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let rc_dir = config_path.parent().unwrap_or(base_dir.as_path());
        Self::from_rc(&contents, rc_dir)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse rc contents; relative paths resolve against `rc_dir`
    pub fn from_rc(contents: &str, rc_dir: &Path) -> Result<Self> {
        let mut settings = Self::defaults_in(rc_dir);

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("rc line {}: expected key=value, ignoring '{}'", line_no + 1, line);
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            settings
                .apply(key, value, rc_dir)
                .with_context(|| format!("rc line {}: {}", line_no + 1, key))?;
        }

        Ok(settings)
    }

    fn resolve_path(value: &str, rc_dir: &Path) -> PathBuf {
        let path = PathBuf::from(value);
        if path.is_relative() {
            rc_dir.join(path)
        } else {
            path
        }
    }

    fn apply(&mut self, key: &str, value: &str, rc_dir: &Path) -> Result<()> {
        match key {
            "data.location" => self.data_location = Self::resolve_path(value, rc_dir),
            "backup.location" => self.backup_location = Self::resolve_path(value, rc_dir),
            "backup.keep" => self.backup_keep = parse_number(value)?,
            "display.columns" => self.column_widths = parse_widths(value)?,
            "display.padding" => self.padding = parse_number(value)?,
            "display.do_window" => self.windows.do_days = parse_window(value)?,
            "display.due_window" => self.windows.due_days = parse_window(value)?,
            "recur.daily" => self.tokens.daily = parse_token(value)?,
            "recur.weekly" => self.tokens.weekly = parse_token(value)?,
            "recur.monthly" => self.tokens.monthly = parse_token(value)?,
            "recur.none" => self.tokens.none = parse_token(value)?,
            _ => {
                if let Some(message_key) = key.strip_prefix("text.") {
                    match Message::from_key(message_key) {
                        Some(message) => self.strings.set(message, unescape(value)),
                        None => log::warn!("Unknown text key '{}', ignoring", message_key),
                    }
                } else {
                    log::warn!("Unknown setting '{}', ignoring", key);
                }
            }
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .with_context(|| format!("'{}' is not a non-negative number", value))
}

/// A visibility window in days, bounded by what chrono can represent
fn parse_window(value: &str) -> Result<i64> {
    let days = value
        .parse::<i64>()
        .with_context(|| format!("'{}' is not a number of days", value))?;
    if days < 0 || chrono::Duration::try_days(days).is_none() {
        anyhow::bail!("window of {} days is out of range", days);
    }
    Ok(days)
}

fn parse_widths(value: &str) -> Result<[usize; 5]> {
    let widths = value
        .split(',')
        .map(|part| parse_number(part.trim()))
        .collect::<Result<Vec<_>>>()?;
    let widths: [usize; 5] = widths
        .try_into()
        .map_err(|w: Vec<usize>| anyhow::anyhow!("expected 5 column widths, got {}", w.len()))?;
    if widths.iter().any(|w| *w == 0) {
        anyhow::bail!("column widths must be positive");
    }
    Ok(widths)
}

fn parse_token(value: &str) -> Result<String> {
    if value.is_empty() || value.contains(char::is_whitespace) {
        anyhow::bail!("recurrence tokens must be a single word, got '{}'", value);
    }
    Ok(value.to_string())
}

/// Allow `\n` in text overrides (for the help text)
fn unescape(value: &str) -> String {
    value.replace("\\n", "\n")
}
