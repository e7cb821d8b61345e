//! Layouts edited in the UI and not yet saved.

use parking_lot::Mutex;
use std::collections::BTreeMap;

/// A table whose schema carries an edited layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
  pub database: String,
  pub table: String,
}

impl TableRef {
  pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
    Self {
      database: database.into(),
      table: table.into(),
    }
  }

  /// Dirty-set key: `database/table`.
  pub fn key(&self) -> String {
    format!("{}/{}", self.database, self.table)
  }
}

/// The three dirty partitions, keyed by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyLayouts {
  pub page: BTreeMap<String, String>,
  pub widget: BTreeMap<String, String>,
  pub schema: BTreeMap<String, TableRef>,
}

impl DirtyLayouts {
  pub fn is_empty(&self) -> bool {
    self.page.is_empty() && self.widget.is_empty() && self.schema.is_empty()
  }
}

/// Records which layouts need saving.
#[derive(Debug, Default)]
pub struct DirtyTracker {
  layouts: Mutex<DirtyLayouts>,
}

impl DirtyTracker {
  pub fn mark_page(&self, page: &str) {
    self
      .layouts
      .lock()
      .page
      .insert(page.to_string(), page.to_string());
  }

  pub fn mark_widget(&self, widget: &str) {
    self
      .layouts
      .lock()
      .widget
      .insert(widget.to_string(), widget.to_string());
  }

  pub fn mark_schema(&self, table: TableRef) {
    self.layouts.lock().schema.insert(table.key(), table);
  }

  pub fn snapshot(&self) -> DirtyLayouts {
    self.layouts.lock().clone()
  }

  /// Take every dirty entry, leaving the tracker empty.
  pub fn drain(&self) -> DirtyLayouts {
    std::mem::take(&mut *self.layouts.lock())
  }

  pub fn is_empty(&self) -> bool {
    self.layouts.lock().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partitions_are_independent() {
    let tracker = DirtyTracker::default();
    tracker.mark_page("Info");
    tracker.mark_schema(TableRef::new("sales", "Orders"));

    let dirty = tracker.snapshot();
    assert_eq!(dirty.page.get("Info").map(String::as_str), Some("Info"));
    assert!(dirty.widget.is_empty());
    assert_eq!(
      dirty.schema.get("sales/Orders"),
      Some(&TableRef::new("sales", "Orders"))
    );
  }

  #[test]
  fn test_marking_twice_keeps_one_entry() {
    let tracker = DirtyTracker::default();
    tracker.mark_widget("nav");
    tracker.mark_widget("nav");

    assert_eq!(tracker.snapshot().widget.len(), 1);
  }

  #[test]
  fn test_drain_empties_tracker() {
    let tracker = DirtyTracker::default();
    tracker.mark_page("default");

    let drained = tracker.drain();
    assert_eq!(drained.page.len(), 1);
    assert!(tracker.is_empty());
  }
}
