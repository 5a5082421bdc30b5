// Parsing of shell command lines

use thiserror::Error;
use crate::cli::abbrev::{expand_verb, VERBS};
use crate::utils::fuzzy::closest_match;

/// Field tokens and description collected from `add`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddArgs {
    pub description: Option<String>,
    pub id: Option<String>,
    pub do_date: Option<String>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
    pub hide: Option<bool>,
}

impl AddArgs {
    /// Any field token besides `id=` means the item is added without prompting
    pub fn has_field_tokens(&self) -> bool {
        self.do_date.is_some()
            || self.due_date.is_some()
            || self.recurrence.is_some()
            || self.hide.is_some()
    }
}

/// How long `delay` hides an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelayArg {
    Days(i64),
    Date(String),
}

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line: just redraw
    Empty,
    Add(AddArgs),
    Done(String),
    Undo,
    Remove(String),
    Edit(String),
    Finish(String),
    Revert(String),
    ShowAll,
    Hide(String),
    Unhide(String),
    Delay { target: String, until: DelayArg },
    Undelay(String),
    Open(String),
    Back,
    Home,
    DeleteAll,
    Backup(Option<String>),
    Backups,
    Restore(i64),
    Help,
    Quit,
}

/// Command line could not be turned into a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{verb}'")]
    UnknownCommand { verb: String, suggestion: Option<String> },

    #[error("ambiguous command '{verb}' (could be: {})", matches.join(", "))]
    AmbiguousCommand { verb: String, matches: Vec<String> },

    #[error("'{verb}' needs {what}")]
    MissingArgument { verb: String, what: &'static str },

    #[error("not a valid number: '{value}'")]
    InvalidNumber { value: String },

    #[error("not a valid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

/// Largest edit distance for a "did you mean" suggestion
const SUGGESTION_DISTANCE: usize = 2;

/// Parse one line typed at the prompt (or given on the command line)
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((first, args)) = words.split_first() else {
        return Ok(Command::Empty);
    };

    let verb = match expand_verb(first) {
        Ok(verb) => verb,
        Err(matches) if matches.is_empty() => {
            let suggestion = closest_match(&first.to_lowercase(), VERBS, SUGGESTION_DISTANCE)
                .map(|s| s.to_string());
            return Err(CommandError::UnknownCommand {
                verb: first.to_string(),
                suggestion,
            });
        }
        Err(matches) => {
            return Err(CommandError::AmbiguousCommand {
                verb: first.to_string(),
                matches: matches.into_iter().map(|m| m.to_string()).collect(),
            });
        }
    };

    let rest = args.join(" ");
    let target = |what: &'static str| -> Result<String, CommandError> {
        if rest.is_empty() {
            Err(CommandError::MissingArgument { verb: verb.to_string(), what })
        } else {
            Ok(rest.clone())
        }
    };

    let command = match verb {
        "add" => Command::Add(parse_add_args(args)?),
        "done" => Command::Done(target("an item")?),
        "undo" => Command::Undo,
        "remove" => Command::Remove(target("an item")?),
        "edit" => Command::Edit(target("an item")?),
        "finish" => Command::Finish(target("an item")?),
        "revert" => Command::Revert(target("an item")?),
        "show" => Command::ShowAll,
        "hide" => Command::Hide(target("an item")?),
        "unhide" => Command::Unhide(target("an item")?),
        "delay" => parse_delay(args)?,
        "undelay" => Command::Undelay(target("an item")?),
        "open" => Command::Open(target("an item")?),
        "back" => Command::Back,
        "home" => Command::Home,
        "delall" => Command::DeleteAll,
        "backup" => Command::Backup(if rest.is_empty() { None } else { Some(rest.clone()) }),
        "backups" => Command::Backups,
        "restore" => {
            let value = target("a backup number")?;
            let id = value
                .parse::<i64>()
                .map_err(|_| CommandError::InvalidNumber { value })?;
            Command::Restore(id)
        }
        "help" => Command::Help,
        "quit" => Command::Quit,
        other => {
            return Err(CommandError::UnknownCommand {
                verb: other.to_string(),
                suggestion: None,
            })
        }
    };

    Ok(command)
}

/// Split `add` arguments into field tokens and description words
///
/// Words of the form `key=value` with an unknown key stay in the description.
fn parse_add_args(args: &[&str]) -> Result<AddArgs, CommandError> {
    let mut parsed = AddArgs::default();
    let mut description_parts = Vec::new();

    for arg in args {
        let Some((field, value)) = arg.split_once('=') else {
            description_parts.push(*arg);
            continue;
        };
        let value = value.to_string();
        match field {
            "id" => {
                if value.is_empty() {
                    return Err(CommandError::InvalidValue { field: "id", value });
                }
                parsed.id = Some(value);
            }
            // Underscores stand in for spaces, as in do=next_week
            "do" => parsed.do_date = Some(value.replace('_', " ")),
            "due" => parsed.due_date = Some(value.replace('_', " ")),
            "recur" => parsed.recurrence = Some(value),
            "hide" => parsed.hide = Some(parse_flag(&value)?),
            _ => description_parts.push(*arg),
        }
    }

    if !description_parts.is_empty() {
        parsed.description = Some(description_parts.join(" "));
    }
    Ok(parsed)
}

fn parse_flag(value: &str) -> Result<bool, CommandError> {
    match value.to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "on" => Ok(true),
        "no" | "n" | "false" | "0" | "off" => Ok(false),
        _ => Err(CommandError::InvalidValue {
            field: "hide",
            value: value.to_string(),
        }),
    }
}

/// `delay <item> <days|date>`; a trailing `next week` counts as the date
fn parse_delay(args: &[&str]) -> Result<Command, CommandError> {
    let missing = |what| CommandError::MissingArgument { verb: "delay".to_string(), what };

    let (target_words, until) = if args.len() >= 3 && args[args.len() - 2..].join(" ").eq_ignore_ascii_case("next week") {
        (&args[..args.len() - 2], DelayArg::Date("next week".to_string()))
    } else {
        let (last, head) = args.split_last().ok_or_else(|| missing("an item"))?;
        let until = match last.parse::<i64>() {
            Ok(days) if days >= 0 => DelayArg::Days(days),
            Ok(_) => return Err(CommandError::InvalidNumber { value: last.to_string() }),
            Err(_) => DelayArg::Date(last.to_string()),
        };
        (head, until)
    };

    if target_words.is_empty() {
        return Err(missing("an item and a number of days or a date"));
    }

    Ok(Command::Delay {
        target: target_words.join(" "),
        until,
    })
}
