use crate::models::error::TaskError;
use crate::models::item::TaskItem;
use crate::models::list::TaskList;
use crate::models::row::{DisplayContext, Row};

/// Rows for one screen: the open path followed by the visible items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    pub breadcrumbs: Vec<Row>,
    pub rows: Vec<Row>,
}

/// Owns the task tree and tracks which sublist is open
///
/// The open path is a stack of item ids from the root. Ids stay valid
/// across re-sorts, and the tree keeps sole ownership of every item.
#[derive(Debug, Clone, Default)]
pub struct ListNavigator {
    root: TaskList,
    path: Vec<String>,
    show_all: bool,
}

/// Follow `path` down from `list` for as long as the ids resolve
fn descend<'a>(mut list: &'a TaskList, path: &[String]) -> (&'a TaskList, usize) {
    let mut depth = 0;
    for id in path {
        match list.position_of_id(id) {
            Some(pos) => list = &list.items()[pos].children,
            None => break,
        }
        depth += 1;
    }
    (list, depth)
}

fn descend_mut<'a>(mut list: &'a mut TaskList, path: &[String]) -> &'a mut TaskList {
    for id in path {
        match list.position_of_id(id) {
            Some(pos) => list = &mut list.item_at_mut(pos).children,
            None => break,
        }
    }
    list
}

impl ListNavigator {
    pub fn new(root: TaskList) -> Self {
        Self {
            root,
            path: Vec::new(),
            show_all: false,
        }
    }

    pub fn root(&self) -> &TaskList {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TaskList {
        &mut self.root
    }

    /// Swap in a freshly loaded tree, keeping as much of the open path as
    /// still exists
    pub fn replace_root(&mut self, root: TaskList) {
        self.root = root;
        self.prune_path();
        log::debug!("Tree replaced, open path depth {}", self.path.len());
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn prune_path(&mut self) {
        let (_, valid) = descend(&self.root, &self.path);
        if valid < self.path.len() {
            log::warn!("Open path no longer resolves past depth {}, truncating", valid);
            self.path.truncate(valid);
        }
    }

    /// The list commands act on
    pub fn current_list(&self) -> &TaskList {
        descend(&self.root, &self.path).0
    }

    pub fn current_list_mut(&mut self) -> &mut TaskList {
        self.prune_path();
        descend_mut(&mut self.root, &self.path)
    }

    /// Items on the open path, outermost first
    pub fn breadcrumbs(&self) -> Vec<&TaskItem> {
        let mut items = Vec::with_capacity(self.path.len());
        let mut list = &self.root;
        for id in &self.path {
            let Some(pos) = list.position_of_id(id) else {
                break;
            };
            let item = &list.items()[pos];
            items.push(item);
            list = &item.children;
        }
        items
    }

    /// Open the sublist of an item in the current list
    pub fn push_sublist(&mut self, target: &str) -> Result<(), TaskError> {
        let id = self.current_list().get_item(target)?.id.clone();
        log::debug!("Opening sublist of '{}'", id);
        self.path.push(id);
        Ok(())
    }

    /// Go up one level
    ///
    /// The list returned to is refreshed and re-sorted, since edits below may
    /// have moved its items' inherited dates. Returns false at the top level.
    pub fn pop_sublist(&mut self) -> bool {
        if self.path.pop().is_none() {
            return false;
        }
        let list = self.current_list_mut();
        list.refresh_all();
        list.sort();
        true
    }

    /// Close every open sublist
    pub fn go_home(&mut self) {
        self.path.clear();
        self.root.refresh_all();
        self.root.sort();
    }

    /// Skip visibility filtering for the next display pass only
    pub fn show_all_once(&mut self) {
        self.show_all = true;
    }

    pub fn is_showing_all(&self) -> bool {
        self.show_all
    }

    /// Produce the rows for one screen
    ///
    /// Refreshes the whole tree so the breadcrumbs carry current inherited
    /// values, sorts the current list, then drops delayed items and items
    /// waiting for their dates unless a show-all was requested. The show-all
    /// request is consumed.
    pub fn display(&mut self, ctx: &DisplayContext) -> ListView {
        let show_all = std::mem::take(&mut self.show_all);
        let depth = self.depth();

        self.root.refresh_all();
        let list = self.current_list_mut();
        list.sort();

        let rows = list
            .items()
            .iter()
            .filter(|item| show_all || item.is_visible(ctx.today, ctx.windows))
            .flat_map(|item| item.render(depth, false, ctx))
            .collect();

        let breadcrumbs = self
            .breadcrumbs()
            .into_iter()
            .enumerate()
            .flat_map(|(level, item)| item.render(level, true, ctx))
            .collect();

        ListView { breadcrumbs, rows }
    }
}
