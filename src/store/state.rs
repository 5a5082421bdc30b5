use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::models::{ItemFields, TaskItem, TaskList};
use crate::recur::{recurrence_from_save, recurrence_to_save};
use crate::utils::{format_save_date, parse_save_date, UNSET_MARKER};

fn unset() -> String {
    UNSET_MARKER.to_string()
}

/// Persisted form of one item: own fields only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub description: String,
    #[serde(default = "unset")]
    pub do_date: String,
    #[serde(default = "unset")]
    pub due_date: String,
    #[serde(default = "unset")]
    pub recurrence: String,
    #[serde(default = "unset")]
    pub delay_until: String,
    #[serde(default)]
    pub hide: bool,
    #[serde(default, skip_serializing_if = "ListRecord::is_empty")]
    pub children: ListRecord,
}

/// Persisted form of a list: a JSON object keyed by id, in list order
///
/// A key repeated in a hand-edited file keeps its first position and its
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListRecord(pub IndexMap<String, ItemRecord>);

impl ListRecord {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_list(list: &TaskList) -> Self {
        ListRecord(
            list.items()
                .iter()
                .map(|item| (item.id.clone(), ItemRecord::from_item(item)))
                .collect(),
        )
    }

    pub fn into_list(self) -> Result<TaskList> {
        let mut items = Vec::with_capacity(self.0.len());
        for (id, record) in self.0 {
            let item = record
                .into_item(&id)
                .with_context(|| format!("Invalid item '{}'", id))?;
            items.push(item);
        }
        Ok(TaskList::from_items(items))
    }
}

impl ItemRecord {
    pub fn from_item(item: &TaskItem) -> Self {
        ItemRecord {
            description: item.description.clone(),
            do_date: format_save_date(item.do_date),
            due_date: format_save_date(item.due_date),
            recurrence: recurrence_to_save(item.recurrence).to_string(),
            delay_until: format_save_date(item.delay_until),
            hide: item.hide_before_relevant,
            children: ListRecord::from_list(&item.children),
        }
    }

    fn load_date(text: &str, field: &str, id: &str) -> Option<chrono::NaiveDate> {
        let date = parse_save_date(text);
        if date.is_none() && !text.trim().eq_ignore_ascii_case(UNSET_MARKER) && !text.trim().is_empty() {
            log::warn!("Item '{}': unreadable {} '{}', treating as unset", id, field, text);
        }
        date
    }

    pub fn into_item(self, id: &str) -> Result<TaskItem> {
        let recurrence = recurrence_from_save(&self.recurrence)
            .map_err(|token| anyhow::anyhow!("Unknown recurrence '{}'", token))?;
        let fields = ItemFields {
            do_date: Self::load_date(&self.do_date, "do date", id),
            due_date: Self::load_date(&self.due_date, "due date", id),
            recurrence,
            hide_before_relevant: self.hide,
            description: self.description,
        };
        let delay_until = Self::load_date(&self.delay_until, "delay", id);
        let children = self.children.into_list()?;

        let mut item = TaskItem::new(id);
        item.populate(fields, delay_until, children);
        Ok(item)
    }
}

/// Serialise a tree to the state-file JSON
pub fn to_json(list: &TaskList) -> Result<String> {
    serde_json::to_string_pretty(&ListRecord::from_list(list)).context("Failed to serialize task list")
}

/// Parse state-file JSON into a tree
pub fn from_json(json: &str) -> Result<TaskList> {
    let record: ListRecord = serde_json::from_str(json).context("Failed to parse task list")?;
    record.into_list()
}

/// The JSON file holding the task tree
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, or an empty tree's JSON if the file does not exist
    pub fn read_raw(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok("{}".to_string());
        }
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))
    }

    /// Replace the file contents atomically
    pub fn write_raw(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;
        Ok(())
    }

    pub fn load(&self) -> Result<TaskList> {
        let raw = self.read_raw()?;
        let list = from_json(&raw).with_context(|| format!("Corrupt state file: {}", self.path.display()))?;
        log::info!("Loaded {} top-level items from {}", list.len(), self.path.display());
        Ok(list)
    }

    pub fn save(&self, list: &TaskList) -> Result<()> {
        let json = to_json(list)?;
        self.write_raw(&json)?;
        log::debug!("Saved {} top-level items to {}", list.len(), self.path.display());
        Ok(())
    }
}
