// One run of the program: the tree, where we are in it, and where it lives on disk

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, TimeZone};
use crate::cli::output::{fit_widths, render_table};
use crate::cli::parser::{parse_command, AddArgs, Command, CommandError, DelayArg};
use crate::config::Settings;
use crate::db::DbConnection;
use crate::models::{DisplayContext, ItemFields, ListNavigator, Prompter, TaskError};
use crate::repo::BackupRepo;
use crate::store::{from_json, to_json, StateFile};
use crate::strings::Message;
use crate::utils::resolve_date;

/// Whether the shell should keep reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Label stored with the snapshot taken before `delall`
const DELETE_ALL_BACKUP_LABEL: &str = "before delall";

pub struct Session {
    navigator: ListNavigator,
    settings: Settings,
    state: StateFile,
    /// Fixed date for tests; the local date otherwise
    today: Option<NaiveDate>,
    /// One-line feedback shown under the table
    log_line: Option<String>,
    /// Extra text shown under the table once (help, backup list)
    notice: Option<String>,
}

fn display_context(settings: &Settings, today: NaiveDate) -> DisplayContext<'_> {
    DisplayContext {
        today,
        strings: &settings.strings,
        tokens: &settings.tokens,
        windows: settings.windows,
    }
}

impl Session {
    /// Load the tree from the configured state file
    pub fn open(settings: Settings) -> Result<Self> {
        let state = StateFile::new(settings.data_location.clone());
        let root = state.load()?;
        Ok(Self {
            navigator: ListNavigator::new(root),
            settings,
            state,
            today: None,
            log_line: None,
            notice: None,
        })
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn navigator(&self) -> &ListNavigator {
        &self.navigator
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn log_line(&self) -> Option<&str> {
        self.log_line.as_deref()
    }

    pub fn set_log_line(&mut self, line: impl Into<String>) {
        self.log_line = Some(line.into());
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Open nested sublists by id, e.g. `2/1`
    pub fn open_path(&mut self, path: &str) -> Result<()> {
        for id in path.split('/').filter(|part| !part.is_empty()) {
            self.navigator.push_sublist(id)?;
        }
        Ok(())
    }

    /// Re-read the state file, keeping the open path where it still exists
    pub fn reload(&mut self) -> Result<()> {
        let root = self.state.load()?;
        self.navigator.replace_root(root);
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.state.save(self.navigator.root())
    }

    /// Parse and run one shell line
    ///
    /// Failures the user can fix (unknown verb, missing item, duplicate id,
    /// bad recurrence) end up on the log line; anything else is returned.
    pub fn handle_line(&mut self, line: &str, prompter: &mut dyn Prompter) -> Result<Outcome> {
        let result = parse_command(line)
            .map_err(anyhow::Error::from)
            .and_then(|command| self.execute(command, prompter));

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => match self.describe_user_error(&err) {
                Some(message) => {
                    log::warn!("{}", err);
                    self.log_line = Some(message);
                    Ok(Outcome::Continue)
                }
                None => Err(err),
            },
        }
    }

    /// Run a command against the current list, saving afterwards if it
    /// changed anything
    pub fn execute(&mut self, command: Command, prompter: &mut dyn Prompter) -> Result<Outcome> {
        let today = self.today();
        let changes_tree = !matches!(
            command,
            Command::Empty
                | Command::ShowAll
                | Command::Open(_)
                | Command::Back
                | Command::Home
                | Command::Backup(_)
                | Command::Backups
                | Command::Restore(_)
                | Command::Help
                | Command::Quit
        );

        match command {
            Command::Empty => {}
            Command::Add(args) => self.add(args, prompter, today)?,
            Command::Done(target) => {
                self.navigator.current_list_mut().done_item(&target, today)?;
            }
            Command::Undo => {
                let restored = self.navigator.current_list_mut().undo_remove();
                let message = match restored {
                    Some(id) => format!("{} {}", self.text(Message::Restored), id),
                    None => self.text(Message::NothingToUndo).to_string(),
                };
                self.log_line = Some(message);
            }
            Command::Remove(target) => {
                self.navigator.current_list_mut().remove_item(&target)?;
            }
            Command::Edit(target) => {
                let ctx = display_context(&self.settings, today);
                self.navigator.current_list_mut().edit_item(&target, prompter, &ctx)?;
            }
            Command::Finish(target) => {
                self.navigator.current_list_mut().finish_recurring_item(&target, today)?;
            }
            Command::Revert(target) => {
                if !self.navigator.current_list_mut().revert_recurring_item(&target, today)? {
                    log::debug!("'{}' does not recur, nothing to revert", target);
                }
            }
            Command::ShowAll => self.navigator.show_all_once(),
            Command::Hide(target) => self.navigator.current_list_mut().hide(&target)?,
            Command::Unhide(target) => self.navigator.current_list_mut().unhide(&target)?,
            Command::Delay { target, until } => {
                let until = match until {
                    DelayArg::Days(days) => Duration::try_days(days)
                        .and_then(|span| today.checked_add_signed(span))
                        .ok_or(CommandError::InvalidValue {
                            field: "delay",
                            value: days.to_string(),
                        })?,
                    DelayArg::Date(text) => resolve_date(&text, today).ok_or(CommandError::InvalidValue {
                        field: "delay",
                        value: text,
                    })?,
                };
                self.navigator.current_list_mut().delay(&target, until)?;
            }
            Command::Undelay(target) => self.navigator.current_list_mut().undelay(&target)?,
            Command::Open(target) => self.navigator.push_sublist(&target)?,
            Command::Back => {
                if !self.navigator.pop_sublist() {
                    self.log_line = Some(self.text(Message::AtTopLevel).to_string());
                }
            }
            Command::Home => self.navigator.go_home(),
            Command::DeleteAll => self.delete_all(prompter)?,
            Command::Backup(label) => {
                let id = self.backup(label.as_deref())?;
                self.log_line = Some(format!("{} {}", self.text(Message::BackupCreated), id));
            }
            Command::Backups => self.notice = Some(self.list_backups()?),
            Command::Restore(id) => {
                self.restore(id)?;
                self.log_line = Some(format!("{} {}", self.text(Message::BackupRestored), id));
            }
            Command::Help => self.notice = Some(self.text(Message::Help).to_string()),
            Command::Quit => return Ok(Outcome::Quit),
        }

        if changes_tree {
            self.persist()?;
        }
        Ok(Outcome::Continue)
    }

    fn add(&mut self, args: AddArgs, prompter: &mut dyn Prompter, today: NaiveDate) -> Result<()> {
        let ctx = display_context(&self.settings, today);

        if !args.has_field_tokens() {
            self.navigator.current_list_mut().add_item_interactive(
                args.description.as_deref(),
                args.id.as_deref(),
                prompter,
                &ctx,
            )?;
            return Ok(());
        }

        let recurrence = match args.recurrence.as_deref() {
            Some(token) => ctx.tokens.parse(token)?,
            None => None,
        };
        let fields = ItemFields {
            description: args.description.unwrap_or_default(),
            do_date: args.do_date.as_deref().and_then(|text| resolve_date(text, today)),
            due_date: args.due_date.as_deref().and_then(|text| resolve_date(text, today)),
            recurrence,
            hide_before_relevant: args.hide.unwrap_or(false),
        };
        self.navigator.current_list_mut().add_item(args.id.as_deref(), fields)?;
        Ok(())
    }

    fn delete_all(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
        let answer = prompter.ask(self.text(Message::ConfirmDeleteAll))?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            log::debug!("delall declined");
            return Ok(());
        }
        self.backup(Some(DELETE_ALL_BACKUP_LABEL))?;
        let removed = self.navigator.current_list_mut().remove_all();
        log::info!("Removed all {} items of the current list", removed);
        Ok(())
    }

    /// Snapshot the state file into the backup ledger
    /// Returns the new backup's id.
    pub fn backup(&mut self, label: Option<&str>) -> Result<i64> {
        self.persist()?;
        let state_json = self.state.read_raw()?;
        let conn = DbConnection::connect(&self.settings.backup_location)?;
        let backup = BackupRepo::create(&conn, &state_json, label)?;
        BackupRepo::prune(&conn, self.settings.backup_keep)?;
        let id = backup.id.context("Backup was stored without an id")?;
        log::info!("Backed up {} to backup {}", self.state.path().display(), id);
        Ok(id)
    }

    fn list_backups(&self) -> Result<String> {
        let conn = DbConnection::connect(&self.settings.backup_location)?;
        let backups = BackupRepo::list(&conn)?;
        if backups.is_empty() {
            return Ok(self.text(Message::NoBackups).to_string());
        }
        let lines: Vec<String> = backups
            .iter()
            .map(|backup| {
                let when = Local
                    .timestamp_opt(backup.created_ts, 0)
                    .single()
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| backup.created_ts.to_string());
                format!(
                    "{:>4}  {}  {}",
                    backup.id.unwrap_or_default(),
                    when,
                    backup.label.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// Put a snapshot back in place of the state file
    pub fn restore(&mut self, backup_id: i64) -> Result<()> {
        let conn = DbConnection::connect(&self.settings.backup_location)?;
        let backup = BackupRepo::get_by_id(&conn, backup_id)?.ok_or(CommandError::InvalidValue {
            field: "backup",
            value: backup_id.to_string(),
        })?;
        from_json(&backup.state_json)
            .with_context(|| format!("Backup {} does not hold a valid task list", backup_id))?;
        self.state.write_raw(&backup.state_json)?;
        log::info!("Restored backup {} to {}", backup_id, self.state.path().display());
        self.reload()
    }

    /// The screen for the current list, followed by any notice and the log line
    ///
    /// Notice and log line are shown once.
    pub fn render(&mut self, terminal_width: usize, is_tty: bool) -> String {
        let today = self.today();
        let ctx = display_context(&self.settings, today);
        let view = self.navigator.display(&ctx);
        let widths = fit_widths(self.settings.column_widths, self.settings.padding, terminal_width);
        let mut out = render_table(&view, &self.settings.strings, widths, self.settings.padding, is_tty);

        if let Some(notice) = self.notice.take() {
            out.push('\n');
            out.push_str(&notice);
            out.push('\n');
        }
        if let Some(line) = self.log_line.take() {
            out.push('\n');
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Tree as it would be saved, for inspection
    pub fn snapshot_json(&self) -> Result<String> {
        to_json(self.navigator.root())
    }

    fn text(&self, message: Message) -> &str {
        self.settings.strings.get(message)
    }

    /// Localized log line for errors the user caused, `None` for the rest
    pub fn describe_user_error(&self, err: &anyhow::Error) -> Option<String> {
        if let Some(task_err) = err.downcast_ref::<TaskError>() {
            return Some(match task_err {
                TaskError::NotFound { .. } => self.text(Message::ItemDoesNotExist).to_string(),
                TaskError::DuplicateId { .. } => self.text(Message::DuplicateId).to_string(),
                TaskError::InvalidRecurrence { valid, .. } => format!(
                    "{} {}",
                    self.text(Message::InvalidRecurrenceValid),
                    valid.join(" ")
                ),
                TaskError::DateOutOfRange { .. } => self.text(Message::DateOutOfRange).to_string(),
            });
        }

        let cmd_err = err.downcast_ref::<CommandError>()?;
        Some(match cmd_err {
            CommandError::UnknownCommand { verb, suggestion } => {
                let mut message = format!("{} {}", self.text(Message::UnknownCommand), verb);
                if let Some(suggestion) = suggestion {
                    message.push_str(&format!(" {} '{}'?", self.text(Message::DidYouMean), suggestion));
                }
                message
            }
            CommandError::AmbiguousCommand { verb, matches } => format!(
                "{} {} ({})",
                self.text(Message::AmbiguousCommand),
                verb,
                matches.join(", ")
            ),
            CommandError::MissingArgument { verb, what } => {
                format!("{} {} {}", self.text(Message::MissingArgument), verb, what)
            }
            CommandError::InvalidNumber { value } => {
                format!("{} {}", self.text(Message::InvalidNumber), value)
            }
            CommandError::InvalidValue { value, .. } => {
                format!("{} {}", self.text(Message::InvalidValue), value)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScriptedPrompter;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Wednesday
    fn today() -> NaiveDate {
        date(2024, 1, 10)
    }

    fn session(dir: &TempDir) -> Session {
        Session::open(Settings::defaults_in(dir.path())).unwrap().with_today(today())
    }

    fn run(session: &mut Session, line: &str) -> Outcome {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        session.handle_line(line, &mut prompter).unwrap()
    }

    #[test]
    fn test_add_with_fields_saves() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add pay rent do=tomorrow recur=monthly");

        let item = s.navigator().root().get_item("1").unwrap();
        assert_eq!(item.description, "pay rent");
        assert_eq!(item.do_date, Some(date(2024, 1, 11)));

        let reloaded = StateFile::new(dir.path().join("items.json")).load().unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_add_interactive_prompts() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let mut prompter = ScriptedPrompter::new(["sat", "", ""]);
        s.handle_line("add walk the dog id=w", &mut prompter).unwrap();

        let item = s.navigator().root().get_item("w").unwrap();
        assert_eq!(item.description, "walk the dog");
        assert_eq!(item.do_date, Some(date(2024, 1, 13)));
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_user_errors_go_to_log_line() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        assert_eq!(run(&mut s, "done 9"), Outcome::Continue);
        assert_eq!(s.log_line(), Some("Item does not exist."));

        run(&mut s, "add a id=1 do=today");
        run(&mut s, "add b id=1 do=today");
        assert_eq!(s.log_line(), Some("An item with that ID already exists."));

        run(&mut s, "add c recur=yearly");
        assert_eq!(
            s.log_line(),
            Some("Invalid recurrence. Valid: daily weekly monthly none")
        );

        run(&mut s, "dnoe 1");
        assert_eq!(s.log_line(), Some("Unknown command: dnoe Did you mean 'done'?"));
        assert_eq!(s.navigator().root().len(), 1);
    }

    #[test]
    fn test_remove_and_undo() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add milk do=today");
        run(&mut s, "rm 1");
        assert!(s.navigator().root().is_empty());

        run(&mut s, "undo");
        assert_eq!(s.log_line(), Some("Restored item 1"));
        assert_eq!(s.navigator().root().len(), 1);

        run(&mut s, "undo");
        assert_eq!(s.log_line(), Some("Nothing to undo."));
    }

    #[test]
    fn test_delay_beyond_calendar_goes_to_log_line() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add milk do=tomorrow");

        assert_eq!(run(&mut s, "delay 1 99999999999999"), Outcome::Continue);
        assert_eq!(s.log_line(), Some("Not a valid value: 99999999999999"));
        assert_eq!(s.navigator().root().get_item("1").unwrap().delay_until, None);
    }

    #[test]
    fn test_done_past_calendar_end_goes_to_log_line() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add far off do=31/12/262142 recur=daily");

        assert_eq!(run(&mut s, "done 1"), Outcome::Continue);
        assert_eq!(s.log_line(), Some("Date out of range."));
        assert_eq!(
            s.navigator().root().get_item("1").unwrap().do_date,
            NaiveDate::from_ymd_opt(262142, 12, 31)
        );
    }

    #[test]
    fn test_open_and_back() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add groceries do=today");
        run(&mut s, "open 1");
        run(&mut s, "add milk do=tomorrow");
        assert_eq!(s.navigator().depth(), 1);
        assert_eq!(s.navigator().current_list().len(), 1);

        run(&mut s, "back");
        assert_eq!(s.navigator().depth(), 0);
        run(&mut s, "back");
        assert_eq!(s.log_line(), Some("Already at the top level."));

        let reloaded = StateFile::new(dir.path().join("items.json")).load().unwrap();
        assert_eq!(reloaded.get_item("1").unwrap().children.len(), 1);
    }

    #[test]
    fn test_delay_hides_until_date() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add plants do=today");
        run(&mut s, "delay 1 3");
        assert_eq!(
            s.navigator().root().get_item("1").unwrap().delay_until,
            Some(date(2024, 1, 13))
        );

        let screen = s.render(200, false);
        assert!(!screen.contains("plants"));

        run(&mut s, "delay 1 someday");
        assert_eq!(s.log_line(), Some("Not a valid value: someday"));
    }

    #[test]
    fn test_delall_needs_confirmation_and_backs_up() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add a do=today");
        run(&mut s, "add b do=today");

        let mut no = ScriptedPrompter::new(["n"]);
        s.handle_line("delall", &mut no).unwrap();
        assert_eq!(s.navigator().root().len(), 2);

        let mut yes = ScriptedPrompter::new(["y"]);
        s.handle_line("delall", &mut yes).unwrap();
        assert!(s.navigator().root().is_empty());

        let conn = DbConnection::connect(&dir.path().join("backups.db")).unwrap();
        let backups = BackupRepo::list(&conn).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].label.as_deref(), Some(DELETE_ALL_BACKUP_LABEL));
    }

    #[test]
    fn test_backup_and_restore() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add keep me do=today");
        run(&mut s, "backup first");
        assert_eq!(s.log_line(), Some("Backup created: 1"));

        run(&mut s, "rm 1");
        assert!(s.navigator().root().is_empty());

        run(&mut s, "restore 1");
        assert_eq!(s.log_line(), Some("Restored backup 1"));
        assert_eq!(s.navigator().root().get_item("1").unwrap().description, "keep me");

        run(&mut s, "restore 42");
        assert_eq!(s.log_line(), Some("Not a valid value: 42"));
    }

    #[test]
    fn test_backups_listing() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "backups");
        assert_eq!(s.notice(), Some("No backups yet."));

        run(&mut s, "backup nightly");
        run(&mut s, "backups");
        assert!(s.notice().unwrap().contains("nightly"));
    }

    #[test]
    fn test_render_shows_log_line_once() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add milk do=today");
        run(&mut s, "done 5");

        let screen = s.render(200, false);
        assert!(screen.contains("milk"));
        assert!(screen.contains("Today!"));
        assert!(screen.trim_end().ends_with("Item does not exist."));

        let screen = s.render(200, false);
        assert!(!screen.contains("Item does not exist."));
    }

    #[test]
    fn test_open_path() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "add outer do=today");
        run(&mut s, "open 1");
        run(&mut s, "add inner do=today");
        run(&mut s, "home");

        s.open_path("1/1").unwrap();
        assert_eq!(s.navigator().depth(), 2);
        let err = s.open_path("9").unwrap_err();
        assert!(err.downcast_ref::<TaskError>().is_some());
    }

    #[test]
    fn test_quit() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        assert_eq!(run(&mut s, "q"), Outcome::Quit);
    }
}
