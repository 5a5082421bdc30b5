//! User-facing text
//!
//! Every string the program shows is looked up through a [`Message`] key.
//! English defaults live here; the settings file can override any of them
//! with `text.<key>=<value>`.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    // Field prompts
    PromptDescription,
    PromptDoDate,
    PromptDueDate,
    PromptRecurrence,
    // Table header
    HeaderId,
    HeaderDescription,
    HeaderDoDate,
    HeaderDueDate,
    HeaderRecurrence,
    // Date annotations
    Today,
    HasPassed,
    Overdue,
    // Inheritance annotations
    SubitemShort,
    Subitem,
    SubitemCount,
    // Log line
    ItemDoesNotExist,
    DuplicateId,
    InvalidRecurrenceValid,
    NothingToUndo,
    Restored,
    UnknownCommand,
    AmbiguousCommand,
    DidYouMean,
    MissingArgument,
    InvalidNumber,
    InvalidValue,
    DateOutOfRange,
    AtTopLevel,
    BackupCreated,
    BackupRestored,
    NoBackups,
    // Interaction
    ConfirmDeleteAll,
    PressEnter,
    CommandPrompt,
    Help,
}

impl Message {
    pub const ALL: [Message; 35] = [
        Message::PromptDescription,
        Message::PromptDoDate,
        Message::PromptDueDate,
        Message::PromptRecurrence,
        Message::HeaderId,
        Message::HeaderDescription,
        Message::HeaderDoDate,
        Message::HeaderDueDate,
        Message::HeaderRecurrence,
        Message::Today,
        Message::HasPassed,
        Message::Overdue,
        Message::SubitemShort,
        Message::Subitem,
        Message::SubitemCount,
        Message::ItemDoesNotExist,
        Message::DuplicateId,
        Message::InvalidRecurrenceValid,
        Message::NothingToUndo,
        Message::Restored,
        Message::UnknownCommand,
        Message::AmbiguousCommand,
        Message::DidYouMean,
        Message::MissingArgument,
        Message::InvalidNumber,
        Message::InvalidValue,
        Message::DateOutOfRange,
        Message::AtTopLevel,
        Message::BackupCreated,
        Message::BackupRestored,
        Message::NoBackups,
        Message::ConfirmDeleteAll,
        Message::PressEnter,
        Message::CommandPrompt,
        Message::Help,
    ];

    /// Key used for `text.<key>` overrides
    pub fn key(&self) -> &'static str {
        match self {
            Message::PromptDescription => "prompt_description",
            Message::PromptDoDate => "prompt_do_date",
            Message::PromptDueDate => "prompt_due_date",
            Message::PromptRecurrence => "prompt_recurrence",
            Message::HeaderId => "header_id",
            Message::HeaderDescription => "header_description",
            Message::HeaderDoDate => "header_do_date",
            Message::HeaderDueDate => "header_due_date",
            Message::HeaderRecurrence => "header_recurrence",
            Message::Today => "today",
            Message::HasPassed => "has_passed",
            Message::Overdue => "overdue",
            Message::SubitemShort => "subitem_short",
            Message::Subitem => "subitem",
            Message::SubitemCount => "subitem_count",
            Message::ItemDoesNotExist => "item_does_not_exist",
            Message::DuplicateId => "duplicate_id",
            Message::InvalidRecurrenceValid => "invalid_recurrence_valid",
            Message::NothingToUndo => "nothing_to_undo",
            Message::Restored => "restored",
            Message::UnknownCommand => "unknown_command",
            Message::AmbiguousCommand => "ambiguous_command",
            Message::DidYouMean => "did_you_mean",
            Message::MissingArgument => "missing_argument",
            Message::InvalidNumber => "invalid_number",
            Message::InvalidValue => "invalid_value",
            Message::DateOutOfRange => "date_out_of_range",
            Message::AtTopLevel => "at_top_level",
            Message::BackupCreated => "backup_created",
            Message::BackupRestored => "backup_restored",
            Message::NoBackups => "no_backups",
            Message::ConfirmDeleteAll => "confirm_delete_all",
            Message::PressEnter => "press_enter",
            Message::CommandPrompt => "command_prompt",
            Message::Help => "help",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.key() == key)
    }

    /// English default text
    pub fn default_text(&self) -> &'static str {
        match self {
            Message::PromptDescription => "Description: ",
            Message::PromptDoDate => "Do date:     ",
            Message::PromptDueDate => "Due date:    ",
            Message::PromptRecurrence => "Recurrence:  ",
            Message::HeaderId => "ID",
            Message::HeaderDescription => "Description",
            Message::HeaderDoDate => "Do date",
            Message::HeaderDueDate => "Due date",
            Message::HeaderRecurrence => "Recurrence",
            Message::Today => "Today!",
            Message::HasPassed => "Has passed!",
            Message::Overdue => "OVERDUE!",
            Message::SubitemShort => "(sub)",
            Message::Subitem => "(subitem)",
            Message::SubitemCount => "subitems:",
            Message::ItemDoesNotExist => "Item does not exist.",
            Message::DuplicateId => "An item with that ID already exists.",
            Message::InvalidRecurrenceValid => "Invalid recurrence. Valid:",
            Message::NothingToUndo => "Nothing to undo.",
            Message::Restored => "Restored item",
            Message::UnknownCommand => "Unknown command:",
            Message::AmbiguousCommand => "Ambiguous command:",
            Message::DidYouMean => "Did you mean",
            Message::MissingArgument => "Missing argument:",
            Message::InvalidNumber => "Not a valid number:",
            Message::InvalidValue => "Not a valid value:",
            Message::DateOutOfRange => "Date out of range.",
            Message::AtTopLevel => "Already at the top level.",
            Message::BackupCreated => "Backup created:",
            Message::BackupRestored => "Restored backup",
            Message::NoBackups => "No backups yet.",
            Message::ConfirmDeleteAll => "Are you sure? Only the last removed item can be recovered with 'undo'. [y/N]",
            Message::PressEnter => "Hit ENTER to continue",
            Message::CommandPrompt => "> ",
            Message::Help => HELP_TEXT,
        }
    }
}

const HELP_TEXT: &str = "Commands:
    > 'add' or '+'        Add an item (add <description> [id=] [do=] [due=] [recur=] [hide=])
    > 'done [ID]'         Mark an item as done (ID is in the leftmost column)
    > 'rm [ID]'           Remove an item
      'remove [ID]'
      'del [ID]'
    > 'undo'              Undo the last remove or done
    > 'edit [ID]'         Edit an item (press enter to leave a field as is)
    > 'finish [ID]'       Mark a recurring item as finished, removing it
    > 'revert [ID]'       Roll a recurring item back to its previous dates
    > 'show'              Show hidden and delayed items once
    > 'hide [ID]'         Only show an item when it is close to its dates
    > 'unhide [ID]'       Always show an item
    > 'delay [ID] [N]'    Hide an item for N days (or until a date)
    > 'undelay [ID]'      Show a delayed item again
    > 'open [ID]'         Open an item's sublist
    > 'back'              Go up one level
    > 'home'              Go back to the top level
    > 'delall'            Remove every item in the current list
    > 'backup [label]'    Snapshot the list
    > 'backups'           List snapshots
    > 'restore [N]'       Restore snapshot N
    > 'help'              Seems like you've found this already :-)
    > 'q'                 Quit
      'quit'
      'exit'

For dates you can use:
 - Day of the week          'saturday'  'sat'
 - Today                    'today'     'tod'
 - Tomorrow                 'tomorrow'  'tom'
 - One week from today      'next week'
 - Day/month                '12/10'
 - Day/month/year           '12/10/2030'
Anything else leaves the date unset, so beware. You can always fix it with 'edit'.
";

/// Message table with optional per-key overrides
#[derive(Debug, Clone, Default)]
pub struct Strings {
    overrides: HashMap<Message, String>,
}

impl Strings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, message: Message, text: impl Into<String>) {
        self.overrides.insert(message, text.into());
    }

    pub fn get(&self, message: Message) -> &str {
        self.overrides
            .get(&message)
            .map(|s| s.as_str())
            .unwrap_or_else(|| message.default_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let strings = Strings::new();
        assert_eq!(strings.get(Message::ItemDoesNotExist), "Item does not exist.");
        assert_eq!(strings.get(Message::Overdue), "OVERDUE!");
    }

    #[test]
    fn test_overrides() {
        let mut strings = Strings::new();
        strings.set(Message::Today, "Heute!");
        assert_eq!(strings.get(Message::Today), "Heute!");
        assert_eq!(strings.get(Message::Overdue), "OVERDUE!");
    }

    #[test]
    fn test_keys_round_trip() {
        for message in Message::ALL {
            assert_eq!(Message::from_key(message.key()), Some(message));
        }
        assert_eq!(Message::from_key("nope"), None);
    }
}
