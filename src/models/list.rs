use anyhow::Result;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use crate::models::error::TaskError;
use crate::models::item::{ItemFields, TaskItem};
use crate::models::prompt::Prompter;
use crate::models::row::DisplayContext;
use crate::utils::natural_cmp;

/// What `done` did to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneOutcome {
    /// Recurring item: own dates moved forward by one interval
    Advanced,
    /// One-off item: removed into the undo slot
    Removed,
}

/// Ordered collection of items with unique ids and one-level undo
///
/// The order of `items` is the display order and is maintained by
/// [`TaskList::sort`] after every mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    items: Vec<TaskItem>,
    ids_in_use: BTreeSet<String>,
    last_removed: Option<Box<TaskItem>>,
}

/// Sort key for an unset date: after every real date
fn date_key(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or(NaiveDate::MAX)
}

fn compare_items(a: &TaskItem, b: &TaskItem) -> Ordering {
    let a_do = date_key(a.effective_do());
    let a_due = date_key(a.effective_due());
    let b_do = date_key(b.effective_do());
    let b_due = date_key(b.effective_due());

    a_do.min(a_due)
        .cmp(&b_do.min(b_due))
        .then_with(|| a_do.cmp(&b_do))
        .then_with(|| a_due.cmp(&b_due))
        .then_with(|| natural_cmp(&a.id, &b.id))
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from loaded items
    ///
    /// A repeated id gets a fresh one so the uniqueness invariant holds even
    /// for a hand-edited state file.
    pub fn from_items(items: Vec<TaskItem>) -> Self {
        let mut list = Self::new();
        let mut repeated = Vec::new();
        for item in items {
            if list.ids_in_use.insert(item.id.clone()) {
                list.items.push(item);
            } else {
                repeated.push(item);
            }
        }
        // Fresh ids are picked only once every loaded id is known
        for mut item in repeated {
            let fresh = list.next_id();
            log::warn!("Duplicate id '{}' in loaded list, renumbered to '{}'", item.id, fresh);
            item.id = fresh;
            list.ids_in_use.insert(item.id.clone());
            list.items.push(item);
        }
        list.refresh_all();
        list.sort();
        list
    }

    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids_in_use.contains(id)
    }

    pub fn ids_in_use(&self) -> impl Iterator<Item = &str> {
        self.ids_in_use.iter().map(|s| s.as_str())
    }

    /// The item held for `undo`, if any
    pub fn last_removed(&self) -> Option<&TaskItem> {
        self.last_removed.as_deref()
    }

    /// Smallest positive integer id not in use
    pub fn next_id(&self) -> String {
        let mut n: u64 = 1;
        loop {
            let candidate = n.to_string();
            if !self.ids_in_use.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Index of the item whose id is `target`, else the first whose
    /// description is exactly `target`
    fn position(&self, target: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.id == target)
            .or_else(|| self.items.iter().position(|item| item.description == target))
    }

    fn position_or_err(&self, target: &str) -> Result<usize, TaskError> {
        self.position(target).ok_or_else(|| {
            log::debug!("No item matches '{}'", target);
            TaskError::not_found(target)
        })
    }

    pub fn get_item(&self, target: &str) -> Result<&TaskItem, TaskError> {
        let pos = self.position_or_err(target)?;
        Ok(&self.items[pos])
    }

    pub fn get_item_mut(&mut self, target: &str) -> Result<&mut TaskItem, TaskError> {
        let pos = self.position_or_err(target)?;
        Ok(&mut self.items[pos])
    }

    /// Index of an exact id match only (no description fallback)
    pub(crate) fn position_of_id(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub(crate) fn item_at_mut(&mut self, index: usize) -> &mut TaskItem {
        &mut self.items[index]
    }

    fn reserve_id(&self, id: Option<&str>) -> Result<String, TaskError> {
        match id {
            Some(id) if self.ids_in_use.contains(id) => {
                log::warn!("Refusing to create item with duplicate id '{}'", id);
                Err(TaskError::DuplicateId { id: id.to_string() })
            }
            Some(id) => Ok(id.to_string()),
            None => {
                let id = self.next_id();
                log::debug!("Allocated id '{}'", id);
                Ok(id)
            }
        }
    }

    fn insert(&mut self, mut item: TaskItem) -> String {
        item.refresh_tree();
        let id = item.id.clone();
        self.ids_in_use.insert(id.clone());
        self.items.push(item);
        self.sort();
        id
    }

    /// Add an item with the given fields
    /// Returns the id it was stored under.
    pub fn add_item(&mut self, id: Option<&str>, fields: ItemFields) -> Result<String, TaskError> {
        let id = self.reserve_id(id)?;
        Ok(self.insert(TaskItem::with_fields(id, fields)))
    }

    /// Add an item, asking for its fields
    ///
    /// A duplicate explicit id fails with [`TaskError::DuplicateId`] before
    /// anything is asked.
    pub fn add_item_interactive(
        &mut self,
        description: Option<&str>,
        id: Option<&str>,
        prompter: &mut dyn Prompter,
        ctx: &DisplayContext,
    ) -> Result<String> {
        let id = self.reserve_id(id)?;
        let mut item = TaskItem::new(id);
        if let Some(description) = description {
            item.description = description.to_string();
        }
        item.edit(prompter, ctx, true)?;
        Ok(self.insert(item))
    }

    /// Detach an item into the undo slot
    /// Returns the removed item's id.
    pub fn remove_item(&mut self, target: &str) -> Result<String, TaskError> {
        let pos = self.position_or_err(target)?;
        let item = self.items.remove(pos);
        let id = item.id.clone();
        self.ids_in_use.remove(&id);
        log::debug!("Removed item '{}'", id);
        self.last_removed = Some(Box::new(item));
        Ok(id)
    }

    /// Put the last removed item back
    /// Returns its id, or `None` when there was nothing to restore.
    pub fn undo_remove(&mut self) -> Option<String> {
        let mut item = *self.last_removed.take()?;
        if self.ids_in_use.contains(&item.id) {
            // The id was reused while the item sat in the undo slot
            let fresh = self.next_id();
            log::warn!("Id '{}' taken since removal, restoring as '{}'", item.id, fresh);
            item.id = fresh;
        }
        Some(self.insert(item))
    }

    /// Complete an item
    ///
    /// Recurring items move on by one interval; one-off items are removed
    /// (and can be brought back with `undo`).
    pub fn done_item(&mut self, target: &str, today: NaiveDate) -> Result<DoneOutcome, TaskError> {
        let pos = self.position_or_err(target)?;
        if self.items[pos].advance(today)? {
            self.sort();
            Ok(DoneOutcome::Advanced)
        } else {
            let id = self.items[pos].id.clone();
            self.remove_item(&id)?;
            Ok(DoneOutcome::Removed)
        }
    }

    /// Finish a recurring item for good, or complete a one-off item
    pub fn finish_recurring_item(&mut self, target: &str, today: NaiveDate) -> Result<DoneOutcome, TaskError> {
        let pos = self.position_or_err(target)?;
        if self.items[pos].recurrence.is_some() {
            let id = self.items[pos].id.clone();
            self.remove_item(&id)?;
            Ok(DoneOutcome::Removed)
        } else {
            self.done_item(target, today)
        }
    }

    /// Roll a recurring item back by one interval
    /// Returns false for non-recurring items, which are left alone.
    pub fn revert_recurring_item(&mut self, target: &str, today: NaiveDate) -> Result<bool, TaskError> {
        let pos = self.position_or_err(target)?;
        let reverted = self.items[pos].roll_back(today)?;
        if reverted {
            self.sort();
        }
        Ok(reverted)
    }

    /// Interactively edit an item, then re-sort
    pub fn edit_item(&mut self, target: &str, prompter: &mut dyn Prompter, ctx: &DisplayContext) -> Result<()> {
        let pos = self.position_or_err(target)?;
        self.items[pos].edit(prompter, ctx, false)?;
        self.sort();
        Ok(())
    }

    pub fn hide(&mut self, target: &str) -> Result<(), TaskError> {
        self.get_item_mut(target)?.hide_before_relevant = true;
        Ok(())
    }

    pub fn unhide(&mut self, target: &str) -> Result<(), TaskError> {
        self.get_item_mut(target)?.hide_before_relevant = false;
        Ok(())
    }

    pub fn delay(&mut self, target: &str, until: NaiveDate) -> Result<(), TaskError> {
        self.get_item_mut(target)?.delay_to(until);
        Ok(())
    }

    pub fn undelay(&mut self, target: &str) -> Result<(), TaskError> {
        self.get_item_mut(target)?.undelay();
        Ok(())
    }

    /// Remove every item, last to first
    ///
    /// Each removal overwrites the undo slot, so afterwards only the item
    /// that was first in display order can be restored.
    pub fn remove_all(&mut self) -> usize {
        let ids: Vec<String> = self.items.iter().rev().map(|item| item.id.clone()).collect();
        let count = ids.len();
        for id in ids {
            if let Err(e) = self.remove_item(&id) {
                log::warn!("remove_all: {}", e);
            }
        }
        count
    }

    /// Stable sort by (earliest effective date, effective do, effective due, id)
    pub fn sort(&mut self) {
        self.items.sort_by(compare_items);
        log::debug!("Sorted {} items", self.items.len());
    }

    /// Refresh effective values of every item, deepest levels first
    pub fn refresh_all(&mut self) {
        for item in &mut self.items {
            item.refresh_tree();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prompt::ScriptedPrompter;
    use crate::models::row::VisibilityWindows;
    use crate::recur::{Recurrence, RecurrenceTokens};
    use crate::strings::Strings;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fields(description: &str, do_date: Option<NaiveDate>, recurrence: Option<Recurrence>) -> ItemFields {
        ItemFields {
            description: description.to_string(),
            do_date,
            recurrence,
            ..ItemFields::default()
        }
    }

    fn ids(list: &TaskList) -> Vec<&str> {
        list.items().iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_next_id_fills_gaps() {
        let mut list = TaskList::new();
        assert_eq!(list.next_id(), "1");
        list.add_item(None, fields("a", None, None)).unwrap();
        list.add_item(Some("3"), fields("c", None, None)).unwrap();
        assert_eq!(list.next_id(), "2");
        list.add_item(None, fields("b", None, None)).unwrap();
        assert_eq!(list.next_id(), "4");
    }

    #[test]
    fn test_add_duplicate_id_fails() {
        let mut list = TaskList::new();
        list.add_item(Some("milk"), fields("Buy milk", None, None)).unwrap();
        let err = list.add_item(Some("milk"), fields("Other", None, None)).unwrap_err();
        assert_eq!(err, TaskError::DuplicateId { id: "milk".to_string() });
        assert_eq!(list.len(), 1);
        assert_eq!(list.get_item("milk").unwrap().description, "Buy milk");
    }

    #[test]
    fn test_lookup_by_id_then_description() {
        let mut list = TaskList::new();
        list.add_item(Some("1"), fields("2", None, None)).unwrap();
        list.add_item(Some("2"), fields("Shopping", None, None)).unwrap();

        // Id match wins over a description that happens to equal the target
        assert_eq!(list.get_item("2").unwrap().description, "Shopping");
        assert_eq!(list.get_item("Shopping").unwrap().id, "2");
        assert_eq!(list.get_item("nope"), Err(TaskError::not_found("nope")));
    }

    #[test]
    fn test_from_items_renumbers_without_touching_later_ids() {
        let loaded = |id: &str, description: &str| {
            TaskItem::with_fields(id, ItemFields { description: description.to_string(), ..ItemFields::default() })
        };
        let list = TaskList::from_items(vec![loaded("1", "first"), loaded("1", "repeat"), loaded("2", "second")]);

        assert_eq!(list.len(), 3);
        assert_eq!(list.get_item("1").unwrap().description, "first");
        assert_eq!(list.get_item("2").unwrap().description, "second");
        assert_eq!(list.get_item("3").unwrap().description, "repeat");
    }

    #[test]
    fn test_sort_scenario() {
        let mut list = TaskList::new();
        list.add_item(Some("B"), fields("B", Some(date(2024, 1, 3)), Some(Recurrence::Weekly))).unwrap();
        list.add_item(Some("A"), fields("A", Some(date(2024, 1, 1)), None)).unwrap();
        list.add_item(Some("C"), fields("C", Some(date(2024, 1, 5)), None)).unwrap();
        assert_eq!(ids(&list), vec!["A", "B", "C"]);

        let outcome = list.done_item("B", date(2024, 1, 3)).unwrap();
        assert_eq!(outcome, DoneOutcome::Advanced);
        assert_eq!(list.get_item("B").unwrap().do_date, Some(date(2024, 1, 10)));
        assert_eq!(ids(&list), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_sort_keys() {
        let mut list = TaskList::new();
        // Earliest of do/due is the primary key
        list.add_item(Some("1"), ItemFields {
            description: "late do, early due".to_string(),
            do_date: Some(date(2024, 3, 1)),
            due_date: Some(date(2024, 1, 2)),
            ..ItemFields::default()
        }).unwrap();
        list.add_item(Some("2"), fields("early do", Some(date(2024, 1, 5)), None)).unwrap();
        list.add_item(Some("3"), fields("undated", None, None)).unwrap();
        // Same primary key and do date as 2, broken by the earlier due date
        list.add_item(Some("4"), ItemFields {
            description: "same do, with due".to_string(),
            do_date: Some(date(2024, 1, 5)),
            due_date: Some(date(2024, 1, 9)),
            ..ItemFields::default()
        }).unwrap();
        list.add_item(Some("10"), fields("undated too", None, None)).unwrap();

        assert_eq!(ids(&list), vec!["1", "4", "2", "3", "10"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut list = TaskList::new();
        for (i, day) in [5u32, 1, 5, 3, 1].iter().enumerate() {
            list.add_item(Some(&format!("x{}", i)), fields("t", Some(date(2024, 1, *day)), None)).unwrap();
        }
        list.sort();
        let once = ids(&list).into_iter().map(String::from).collect::<Vec<_>>();
        list.sort();
        let twice = ids(&list).into_iter().map(String::from).collect::<Vec<_>>();
        assert_eq!(once, twice);
        assert_eq!(once, vec!["x1", "x4", "x3", "x0", "x2"]);
    }

    #[test]
    fn test_sort_uses_inherited_dates() {
        let mut list = TaskList::new();
        list.add_item(Some("1"), fields("soon", Some(date(2024, 1, 5)), None)).unwrap();
        list.add_item(Some("2"), fields("parent", Some(date(2024, 2, 1)), None)).unwrap();
        assert_eq!(ids(&list), vec!["1", "2"]);

        let parent = list.get_item_mut("2").unwrap();
        parent.children.add_item(None, fields("urgent child", Some(date(2024, 1, 2)), None)).unwrap();
        list.refresh_all();
        list.sort();
        assert_eq!(ids(&list), vec!["2", "1"]);
    }

    #[test]
    fn test_remove_and_undo() {
        let mut list = TaskList::new();
        list.add_item(None, fields("one", None, None)).unwrap();
        list.add_item(None, fields("two", None, None)).unwrap();

        assert_eq!(list.remove_item("one").unwrap(), "1");
        assert!(!list.contains_id("1"));
        assert_eq!(list.last_removed().unwrap().description, "one");

        assert_eq!(list.undo_remove(), Some("1".to_string()));
        assert!(list.contains_id("1"));
        assert!(list.last_removed().is_none());
        assert_eq!(list.undo_remove(), None);
    }

    #[test]
    fn test_second_removal_overwrites_undo_slot() {
        let mut list = TaskList::new();
        list.add_item(None, fields("one", None, None)).unwrap();
        list.add_item(None, fields("two", None, None)).unwrap();
        list.remove_item("1").unwrap();
        list.remove_item("2").unwrap();
        assert_eq!(list.undo_remove(), Some("2".to_string()));
        assert_eq!(list.undo_remove(), None);
        assert_eq!(ids(&list), vec!["2"]);
    }

    #[test]
    fn test_remove_missing_leaves_state_unchanged() {
        let mut list = TaskList::new();
        list.add_item(None, fields("one", None, None)).unwrap();
        list.remove_item("1").unwrap();
        list.undo_remove();
        list.add_item(None, fields("two", None, None)).unwrap();
        list.remove_item("2").unwrap();

        let before = list.clone();
        assert_eq!(list.remove_item("7"), Err(TaskError::not_found("7")));
        assert_eq!(list, before);

        let mut empty = TaskList::new();
        assert!(empty.remove_item("7").is_err());
        assert!(empty.last_removed().is_none());
    }

    #[test]
    fn test_done_one_off_then_undo_restores() {
        let mut list = TaskList::new();
        list.add_item(Some("5"), ItemFields {
            description: "Call bank".to_string(),
            do_date: Some(date(2024, 1, 2)),
            due_date: Some(date(2024, 1, 4)),
            recurrence: None,
            hide_before_relevant: true,
        }).unwrap();
        let original = list.get_item("5").unwrap().clone();

        assert_eq!(list.done_item("5", date(2024, 1, 2)).unwrap(), DoneOutcome::Removed);
        assert!(list.is_empty());
        assert_eq!(list.last_removed(), Some(&original));

        list.undo_remove();
        assert_eq!(list.get_item("5").unwrap(), &original);
        assert!(list.last_removed().is_none());
    }

    #[test]
    fn test_done_then_revert_restores_dates() {
        let today = date(2024, 5, 10);
        let mut list = TaskList::new();
        list.add_item(Some("r"), ItemFields {
            description: "Rent".to_string(),
            do_date: Some(date(2024, 5, 28)),
            due_date: Some(date(2024, 5, 31)),
            recurrence: Some(Recurrence::Monthly),
            hide_before_relevant: false,
        }).unwrap();

        list.done_item("r", today).unwrap();
        assert_eq!(list.get_item("r").unwrap().do_date, Some(date(2024, 6, 28)));
        assert!(list.revert_recurring_item("r", today).unwrap());
        let item = list.get_item("r").unwrap();
        assert_eq!(item.do_date, Some(date(2024, 5, 28)));
        assert_eq!(item.due_date, Some(date(2024, 5, 31)));
    }

    #[test]
    fn test_revert_non_recurring_is_noop() {
        let mut list = TaskList::new();
        list.add_item(None, fields("one", Some(date(2024, 1, 1)), None)).unwrap();
        assert!(!list.revert_recurring_item("1", date(2024, 1, 1)).unwrap());
        assert_eq!(list.get_item("1").unwrap().do_date, Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_finish_recurring_removes() {
        let today = date(2024, 1, 1);
        let mut list = TaskList::new();
        list.add_item(None, fields("gym", Some(today), Some(Recurrence::Daily))).unwrap();
        list.add_item(None, fields("once", Some(today), None)).unwrap();

        assert_eq!(list.finish_recurring_item("1", today).unwrap(), DoneOutcome::Removed);
        assert_eq!(list.last_removed().unwrap().description, "gym");
        assert_eq!(list.finish_recurring_item("2", today).unwrap(), DoneOutcome::Removed);
        assert!(list.is_empty());
    }

    #[test]
    fn test_hide_and_delay() {
        let mut list = TaskList::new();
        list.add_item(None, fields("one", None, None)).unwrap();
        list.hide("1").unwrap();
        assert!(list.get_item("1").unwrap().hide_before_relevant);
        list.unhide("1").unwrap();
        assert!(!list.get_item("1").unwrap().hide_before_relevant);

        list.delay("1", date(2024, 1, 9)).unwrap();
        assert_eq!(list.get_item("1").unwrap().delay_until, Some(date(2024, 1, 9)));
        list.undelay("1").unwrap();
        assert_eq!(list.get_item("1").unwrap().delay_until, None);

        assert!(list.hide("9").is_err());
        assert!(list.delay("9", date(2024, 1, 9)).is_err());
    }

    #[test]
    fn test_remove_all_keeps_first_item_for_undo() {
        let mut list = TaskList::new();
        list.add_item(None, fields("a", Some(date(2024, 1, 1)), None)).unwrap();
        list.add_item(None, fields("b", Some(date(2024, 1, 2)), None)).unwrap();
        list.add_item(None, fields("c", Some(date(2024, 1, 3)), None)).unwrap();

        assert_eq!(list.remove_all(), 3);
        assert!(list.is_empty());
        assert_eq!(list.ids_in_use().count(), 0);
        assert_eq!(list.last_removed().unwrap().description, "a");
    }

    #[test]
    fn test_undo_after_id_reuse_renumbers() {
        let mut list = TaskList::new();
        list.add_item(None, fields("a", None, None)).unwrap();
        list.remove_item("1").unwrap();
        list.add_item(None, fields("b", None, None)).unwrap();
        assert_eq!(list.undo_remove(), Some("2".to_string()));
        assert_eq!(list.get_item("2").unwrap().description, "a");
    }

    #[test]
    fn test_from_items_renumbers_duplicates() {
        let items = vec![
            TaskItem::with_fields("1", fields("a", None, None)),
            TaskItem::with_fields("1", fields("b", None, None)),
        ];
        let list = TaskList::from_items(items);
        assert_eq!(list.len(), 2);
        assert!(list.contains_id("1"));
        assert!(list.contains_id("2"));
    }

    #[test]
    fn test_add_interactive() {
        let strings = Strings::new();
        let tokens = RecurrenceTokens::default();
        let ctx = DisplayContext {
            today: date(2024, 1, 10),
            strings: &strings,
            tokens: &tokens,
            windows: VisibilityWindows::default(),
        };
        let mut list = TaskList::new();

        let mut prompter = ScriptedPrompter::new(["", "12/1", "daily"]);
        let id = list.add_item_interactive(Some("Stretch"), None, &mut prompter, &ctx).unwrap();
        assert_eq!(id, "1");
        let item = list.get_item("1").unwrap();
        assert_eq!(item.description, "Stretch");
        assert_eq!(item.do_date, None);
        assert_eq!(item.due_date, Some(date(2024, 1, 12)));
        assert_eq!(item.recurrence, Some(Recurrence::Daily));

        // Duplicate id fails before any prompt
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = list.add_item_interactive(None, Some("1"), &mut prompter, &ctx).unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::DuplicateId { id: "1".to_string() }));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_edit_item_resorts() {
        let strings = Strings::new();
        let tokens = RecurrenceTokens::default();
        let ctx = DisplayContext {
            today: date(2024, 1, 10),
            strings: &strings,
            tokens: &tokens,
            windows: VisibilityWindows::default(),
        };
        let mut list = TaskList::new();
        list.add_item(None, fields("a", Some(date(2024, 1, 11)), None)).unwrap();
        list.add_item(None, fields("b", Some(date(2024, 1, 12)), None)).unwrap();

        let mut prompter = ScriptedPrompter::new(["", "20/1", "", ""]);
        list.edit_item("1", &mut prompter, &ctx).unwrap();
        assert_eq!(ids(&list), vec!["2", "1"]);

        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = list.edit_item("9", &mut prompter, &ctx).unwrap_err();
        assert!(err.downcast_ref::<TaskError>().is_some());
    }
}
