use anyhow::Result;
use chrono::{Duration, NaiveDate};
use crate::models::error::TaskError;
use crate::models::list::TaskList;
use crate::models::prompt::Prompter;
use crate::models::row::{DisplayContext, Row, VisibilityWindows};
use crate::recur::Recurrence;
use crate::strings::Message;
use crate::utils::{format_display_date, resolve_date};

/// Own fields supplied when creating or populating an item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub description: String,
    pub do_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<Recurrence>,
    pub hide_before_relevant: bool,
}

/// A single task with an owned sublist
///
/// Own fields are what the user set and what gets persisted. The effective
/// fields fold in the earliest dates and the highest-precedence recurrence
/// of the direct children; they are recomputed by [`TaskItem::refresh_inherited`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem {
    pub id: String,
    pub description: String,
    pub do_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<Recurrence>,
    pub hide_before_relevant: bool,
    pub delay_until: Option<NaiveDate>,
    pub children: TaskList,
    effective_do: Option<NaiveDate>,
    effective_due: Option<NaiveDate>,
    effective_recurrence: Option<Recurrence>,
}

/// Earlier of two optional dates, where unset is later than any date
pub fn earliest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Move an optional date by `step`; `None` when the result leaves chrono's range
fn shift_date(date: Option<NaiveDate>, step: Duration) -> Option<Option<NaiveDate>> {
    match date {
        Some(d) => d.checked_add_signed(step).map(Some),
        None => Some(None),
    }
}

/// Whether `today` is at most `days` before `date`
///
/// A window reaching back past the start of the calendar is always open.
fn window_opened(date: NaiveDate, days: i64, today: NaiveDate) -> bool {
    Duration::try_days(days)
        .and_then(|window| date.checked_sub_signed(window))
        .map_or(true, |opens| opens <= today)
}

impl TaskItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            do_date: None,
            due_date: None,
            recurrence: None,
            hide_before_relevant: false,
            delay_until: None,
            children: TaskList::new(),
            effective_do: None,
            effective_due: None,
            effective_recurrence: None,
        }
    }

    /// Build an item from fields, with no children
    pub fn with_fields(id: impl Into<String>, fields: ItemFields) -> Self {
        let mut item = Self::new(id);
        item.populate(fields, None, TaskList::new());
        item
    }

    /// Initialise own fields and sublist, then recompute effective values
    pub fn populate(&mut self, fields: ItemFields, delay_until: Option<NaiveDate>, children: TaskList) {
        self.description = fields.description;
        self.do_date = fields.do_date;
        self.due_date = fields.due_date;
        self.recurrence = fields.recurrence;
        self.hide_before_relevant = fields.hide_before_relevant;
        self.delay_until = delay_until;
        self.children = children;
        self.refresh_inherited();
    }

    /// Own fields as a value, e.g. for comparisons and copies
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            description: self.description.clone(),
            do_date: self.do_date,
            due_date: self.due_date,
            recurrence: self.recurrence,
            hide_before_relevant: self.hide_before_relevant,
        }
    }

    pub fn effective_do(&self) -> Option<NaiveDate> {
        self.effective_do
    }

    pub fn effective_due(&self) -> Option<NaiveDate> {
        self.effective_due
    }

    pub fn effective_recurrence(&self) -> Option<Recurrence> {
        self.effective_recurrence
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Recompute effective values from own values and direct children
    ///
    /// Only looks one level down; children are expected to be refreshed
    /// already (see [`TaskItem::refresh_tree`]).
    pub fn refresh_inherited(&mut self) {
        let mut effective_do = self.do_date;
        let mut effective_due = self.due_date;
        let mut effective_recurrence = self.recurrence;

        for child in self.children.items() {
            effective_do = earliest(effective_do, child.effective_do);
            effective_due = earliest(effective_due, child.effective_due);
            effective_recurrence = effective_recurrence.max(child.effective_recurrence);
        }

        self.effective_do = effective_do;
        self.effective_due = effective_due;
        self.effective_recurrence = effective_recurrence;
    }

    /// Refresh the whole subtree, deepest items first
    pub fn refresh_tree(&mut self) {
        self.children.refresh_all();
        self.refresh_inherited();
    }

    pub fn delay_to(&mut self, until: NaiveDate) {
        self.delay_until = Some(until);
    }

    pub fn undelay(&mut self) {
        self.delay_until = None;
    }

    pub fn is_delayed(&self, today: NaiveDate) -> bool {
        self.delay_until.map_or(false, |until| until > today)
    }

    /// Whether the item waits for its dates to come close before showing
    pub fn is_pending_relevance(&self) -> bool {
        self.hide_before_relevant
            || (self.effective_recurrence.is_some() && self.delay_until.is_none())
    }

    /// Whether either effective date has entered its visibility window
    pub fn is_within_window(&self, today: NaiveDate, windows: VisibilityWindows) -> bool {
        let do_close = self.effective_do.map_or(false, |d| window_opened(d, windows.do_days, today));
        let due_close = self.effective_due.map_or(false, |d| window_opened(d, windows.due_days, today));
        do_close || due_close
    }

    /// Visibility in a normal display pass
    pub fn is_visible(&self, today: NaiveDate, windows: VisibilityWindows) -> bool {
        if self.is_delayed(today) {
            return false;
        }
        !self.is_pending_relevance() || self.is_within_window(today, windows)
    }

    /// Move own dates forward by one recurrence interval
    /// Returns false (and changes nothing) for a non-recurring item.
    pub fn advance(&mut self, today: NaiveDate) -> Result<bool, TaskError> {
        self.shift(today, 1)
    }

    /// Move own dates back by one recurrence interval
    pub fn roll_back(&mut self, today: NaiveDate) -> Result<bool, TaskError> {
        self.shift(today, -1)
    }

    /// Both dates move or neither does
    fn shift(&mut self, today: NaiveDate, direction: i32) -> Result<bool, TaskError> {
        let Some(recurrence) = self.recurrence else {
            return Ok(false);
        };
        let step = recurrence.interval(today) * direction;
        let out_of_range = || TaskError::DateOutOfRange { id: self.id.clone() };
        let do_date = shift_date(self.do_date, step).ok_or_else(out_of_range)?;
        let due_date = shift_date(self.due_date, step).ok_or_else(out_of_range)?;
        self.do_date = do_date;
        self.due_date = due_date;
        self.refresh_inherited();
        Ok(true)
    }

    fn format_date(date: Option<NaiveDate>, past: Message, ctx: &DisplayContext) -> String {
        let Some(date) = date else {
            return String::new();
        };
        let mut text = format_display_date(date);
        if date == ctx.today {
            text.push_str(" -- ");
            text.push_str(ctx.strings.get(Message::Today));
        } else if date < ctx.today {
            text.push_str(" -- ");
            text.push_str(ctx.strings.get(past));
        }
        text
    }

    fn annotate(mut text: String, inherited: bool, marker: Message, ctx: &DisplayContext) -> String {
        if inherited {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(ctx.strings.get(marker));
        }
        text
    }

    /// Display rows for this item
    ///
    /// An ancestor header (breadcrumb of the open path) shows own values and
    /// no id. A normal row shows effective values, marks the ones changed by
    /// children, and is followed by a child-count row when there are children.
    pub fn render(&self, depth: usize, is_ancestor_header: bool, ctx: &DisplayContext) -> Vec<Row> {
        let indent = "  ".repeat(depth);

        if is_ancestor_header {
            return vec![Row {
                id: String::new(),
                description: format!("{}{}", indent, self.description),
                do_date: Self::format_date(self.do_date, Message::HasPassed, ctx),
                due_date: Self::format_date(self.due_date, Message::Overdue, ctx),
                recurrence: ctx.tokens.display(self.recurrence).to_string(),
            }];
        }

        let do_date = Self::annotate(
            Self::format_date(self.effective_do, Message::HasPassed, ctx),
            self.effective_do != self.do_date,
            Message::SubitemShort,
            ctx,
        );
        let due_date = Self::annotate(
            Self::format_date(self.effective_due, Message::Overdue, ctx),
            self.effective_due != self.due_date,
            Message::SubitemShort,
            ctx,
        );
        let recurrence = Self::annotate(
            ctx.tokens.display(self.effective_recurrence).to_string(),
            self.effective_recurrence != self.recurrence,
            Message::Subitem,
            ctx,
        );

        let mut rows = vec![Row {
            id: self.id.clone(),
            description: format!("{}{}", indent, self.description),
            do_date,
            due_date,
            recurrence,
        }];

        if self.has_children() {
            rows.push(Row {
                description: format!(
                    "{}  {} {}",
                    indent,
                    ctx.strings.get(Message::SubitemCount),
                    self.children.len()
                ),
                ..Row::default()
            });
        }

        rows
    }

    /// Field-by-field interactive update
    ///
    /// When `creating`, every field is asked for (a description that is
    /// already set is kept) and empty answers leave dates and recurrence
    /// unset. Otherwise an empty answer keeps the current value. Invalid
    /// recurrence tokens are reported and asked again.
    pub fn edit(&mut self, prompter: &mut dyn Prompter, ctx: &DisplayContext, creating: bool) -> Result<()> {
        let strings = ctx.strings;

        if !creating || self.description.is_empty() {
            let answer = prompter.ask(strings.get(Message::PromptDescription))?;
            if creating || !answer.is_empty() {
                self.description = answer;
            }
        }

        let answer = prompter.ask(strings.get(Message::PromptDoDate))?;
        if creating || !answer.is_empty() {
            self.do_date = resolve_date(&answer, ctx.today);
        }

        let answer = prompter.ask(strings.get(Message::PromptDueDate))?;
        if creating || !answer.is_empty() {
            self.due_date = resolve_date(&answer, ctx.today);
        }

        loop {
            let answer = prompter.ask(strings.get(Message::PromptRecurrence))?;
            if answer.trim().is_empty() {
                if creating {
                    self.recurrence = None;
                }
                break;
            }
            match ctx.tokens.parse(&answer) {
                Ok(recurrence) => {
                    self.recurrence = recurrence;
                    break;
                }
                Err(_) => {
                    log::debug!("Rejected recurrence token '{}'", answer);
                    prompter.say(&format!(
                        "{} {}",
                        strings.get(Message::InvalidRecurrenceValid),
                        ctx.tokens.valid_tokens().join(" ")
                    ))?;
                }
            }
        }

        self.refresh_inherited();
        Ok(())
    }
}
