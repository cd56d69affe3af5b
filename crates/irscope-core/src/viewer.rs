//! Drill-down table viewers over arbitrary inspected values.
//!
//! Each viewer renders one value's properties as rows; selecting a row opens
//! a new viewer for that row's value one level deeper. The chain behaves
//! like panes in a column browser: interacting with a level closes every
//! pane to its right.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::trace;

use crate::reflect::{traverse, TypeRegistry};
use crate::value::{Recompute, Value};

/// Placeholder row name for an object that failed validity checking.
pub const STALE_ROW: &str = "<no longer valid>";

/// Placeholder row name when row construction failed outright.
pub const ERROR_ROW: &str = "<error>";

/// One row of a drill-down table.
pub struct PropertyRow {
    name: String,
    type_label: Option<String>,
    value: Option<Value>,
    recompute: Option<Recompute>,
}

impl PropertyRow {
    fn new(name: String, value: Option<Value>, recompute: Option<Recompute>) -> Self {
        let type_label = value.as_ref().map(|v| v.type_and_id());
        Self {
            name,
            type_label,
            value,
            recompute,
        }
    }

    fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_label: None,
            value: None,
            recompute: None,
        }
    }

    /// Display name (first column).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type label of the current value (second column).
    pub fn type_label(&self) -> Option<&str> {
        self.type_label.as_deref()
    }

    /// Current value (third column).
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether the row carries an explicit re-computation trigger.
    pub fn has_recompute(&self) -> bool {
        self.recompute.is_some()
    }
}

/// First-column header of a viewer's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    /// Sequence elements
    Index,
    /// Map entries
    Key,
    /// Object properties
    Property,
}

impl KeyColumn {
    /// Header text.
    pub fn header(&self) -> &'static str {
        match self {
            KeyColumn::Index => "index",
            KeyColumn::Key => "key",
            KeyColumn::Property => "property",
        }
    }
}

/// A single drill-down table over one inspected value.
pub struct TableViewer {
    value: Value,
    key_column: KeyColumn,
    rows: RefCell<Vec<PropertyRow>>,
    selected: RefCell<Option<usize>>,
}

impl TableViewer {
    /// Build the row list for `value` with the per-kind policies: sequences
    /// keep positional order, everything else sorts rows by display name;
    /// rows whose value is absent or an empty container are omitted; a stale
    /// object yields a single inert placeholder row.
    pub fn new(registry: &TypeRegistry, value: Value) -> Self {
        let (rows, key_column) = build_rows(registry, &value);
        Self {
            value,
            key_column,
            rows: RefCell::new(rows),
            selected: RefCell::new(None),
        }
    }

    /// The inspected value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// First-column header for this value's kind.
    pub fn key_column(&self) -> KeyColumn {
        self.key_column
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    /// Run `f` over the row list, e.g. to render it.
    pub fn with_rows<R>(&self, f: impl FnOnce(&[PropertyRow]) -> R) -> R {
        f(&self.rows.borrow())
    }

    /// Index of the currently selected row.
    pub fn selected_row(&self) -> Option<usize> {
        *self.selected.borrow()
    }

    /// Re-invoke the named row's recompute closure, replacing its cached
    /// value and type label. Returns false when the row is absent or carries
    /// no closure; values never change without this being called.
    pub fn recompute_row(&self, name: &str) -> bool {
        let mut rows = self.rows.borrow_mut();
        let Some(row) = rows.iter_mut().find(|r| r.name == name) else {
            return false;
        };
        let Some(recompute) = row.recompute.clone() else {
            return false;
        };
        let value = recompute();
        row.type_label = value.as_ref().map(|v| v.type_and_id());
        row.value = value;
        true
    }

    /// Mark the named row selected and hand back its value.
    fn select_and_get(&self, name: &str) -> Option<Value> {
        let rows = self.rows.borrow();
        let index = rows.iter().position(|r| r.name == name)?;
        *self.selected.borrow_mut() = Some(index);
        rows[index].value.clone()
    }
}

fn build_rows(registry: &TypeRegistry, value: &Value) -> (Vec<PropertyRow>, KeyColumn) {
    match value {
        Value::Seq(items) => {
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, item)| PropertyRow::new(i.to_string(), Some(item.clone()), None))
                .collect();
            (rows, KeyColumn::Index)
        }
        Value::Map(_) => (sorted_rows(registry, value), KeyColumn::Key),
        Value::Object(obj) if !obj.is_valid() => {
            trace!("inspected object is no longer valid");
            (vec![PropertyRow::placeholder(STALE_ROW)], KeyColumn::Property)
        }
        _ => (sorted_rows(registry, value), KeyColumn::Property),
    }
}

/// Property rows sorted by display name. Construction is guarded as a whole:
/// if anything escapes the traversal guards, the viewer degrades to a single
/// error row instead of poisoning the chain.
fn sorted_rows(registry: &TypeRegistry, value: &Value) -> Vec<PropertyRow> {
    let built = catch_unwind(AssertUnwindSafe(|| {
        let mut rows: Vec<PropertyRow> = traverse(registry, value)
            .filter_map(|entry| {
                let value = entry.value?;
                if is_empty_container(&value) {
                    return None;
                }
                Some(PropertyRow::new(entry.name, Some(value), entry.recompute))
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }));
    match built {
        Ok(rows) => rows,
        Err(_) => {
            trace!("row construction panicked; showing error placeholder");
            vec![PropertyRow::placeholder(ERROR_ROW)]
        }
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Seq(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    }
}

/// The stack of viewers for successive navigation into nested properties.
pub struct ViewerChain {
    registry: Rc<TypeRegistry>,
    viewers: Vec<TableViewer>,
    selected_path: Vec<String>,
    on_select: Option<Box<dyn Fn(&Value)>>,
}

impl ViewerChain {
    /// Empty chain.
    pub fn new(registry: Rc<TypeRegistry>) -> Self {
        Self {
            registry,
            viewers: Vec::new(),
            selected_path: Vec::new(),
            on_select: None,
        }
    }

    /// Observer invoked with each newly selected row value (the editor
    /// highlight hook).
    pub fn set_selection_observer(&mut self, observer: impl Fn(&Value) + 'static) {
        self.on_select = Some(Box::new(observer));
    }

    /// Reset the chain to a single level-0 viewer over `value`. The
    /// remembered selection path is cleared; callers replaying state must
    /// copy it out first.
    pub fn open_root(&mut self, value: Value) {
        self.viewers.clear();
        self.selected_path.clear();
        self.viewers.push(TableViewer::new(&self.registry, value));
    }

    /// Number of stacked viewers.
    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    /// Whether no viewer is open.
    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    /// Viewer at a level.
    pub fn viewer(&self, level: usize) -> Option<&TableViewer> {
        self.viewers.get(level)
    }

    /// Names selected at each level so far.
    pub fn selected_path(&self) -> &[String] {
        &self.selected_path
    }

    /// Select the named row in the viewer at `level`.
    ///
    /// On success every viewer deeper than `level` is discarded, a new
    /// viewer for the row's value is appended, and the selection path is
    /// extended. An absent name fails with no mutation at all.
    pub fn select(&mut self, level: usize, name: &str) -> bool {
        let Some(viewer) = self.viewers.get(level) else {
            return false;
        };
        let Some(next_value) = viewer.select_and_get(name) else {
            return false;
        };
        self.viewers.truncate(level + 1);
        self.selected_path.truncate(level);
        if let Some(observer) = &self.on_select {
            observer(&next_value);
        }
        self.viewers
            .push(TableViewer::new(&self.registry, next_value));
        self.selected_path.push(name.to_string());
        true
    }

    /// Replay a remembered selection path from the deepest open viewer,
    /// stopping at the first name that no longer resolves.
    pub fn replay(&mut self, path: &[String]) {
        for name in path {
            if self.viewers.is_empty() {
                break;
            }
            let level = self.viewers.len() - 1;
            if !self.select(level, name) {
                break;
            }
        }
    }

    /// Re-trigger the recompute closure of a row. See
    /// [`TableViewer::recompute_row`].
    pub fn recompute_row(&self, level: usize, name: &str) -> bool {
        self.viewers
            .get(level)
            .map_or(false, |viewer| viewer.recompute_row(name))
    }
}
