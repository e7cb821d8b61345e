//! Where a layout lives, by layout mode.
//!
//! Layouts are stored in three places: widgets, dashboard pages and table
//! schemas. A layout mode picks the cached resource and the field inside it.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::dirty::TableRef;
use super::ConfigStore;
use crate::cache::{document, Document, Pending};
use crate::crud::TableId;
use crate::error::{Error, Result};

/// Name of the page holding the default layout.
const DEFAULT_PAGE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutMode {
  /// A dashboard page, by name
  Page,
  /// A reusable widget, by name
  Widget,
  /// The instance layout of the current table
  Instance,
  /// The `default` page
  Default,
  /// The table layout of the table named by a table id
  Table,
  /// The instance layout shared by all table metadata pages
  DefaultTable,
}

impl LayoutMode {
  pub const ALL: [LayoutMode; 6] = [
    LayoutMode::Page,
    LayoutMode::Widget,
    LayoutMode::Instance,
    LayoutMode::Default,
    LayoutMode::Table,
    LayoutMode::DefaultTable,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      LayoutMode::Page => "page",
      LayoutMode::Widget => "widget",
      LayoutMode::Instance => "instance",
      LayoutMode::Default => "default",
      LayoutMode::Table => "table",
      LayoutMode::DefaultTable => "defaulttable",
    }
  }

  /// Field of the resolved resource holding the layout.
  pub fn path(self) -> &'static str {
    match self {
      LayoutMode::Page | LayoutMode::Widget | LayoutMode::Default => "layout",
      LayoutMode::Instance | LayoutMode::DefaultTable => "instanceLayout",
      LayoutMode::Table => "tableLayout",
    }
  }

  /// The resource this mode addresses for `target`.
  fn locate(self, target: &LayoutTarget) -> Result<Location> {
    match self {
      LayoutMode::Page => Ok(Location::Page(self.require_name(target)?)),
      LayoutMode::Widget => Ok(Location::Widget(self.require_name(target)?)),
      LayoutMode::Default => Ok(Location::Page(DEFAULT_PAGE.to_string())),
      LayoutMode::Instance => match (&target.database, &target.table) {
        (_, None) => Ok(Location::NoTable),
        (Some(database), Some(table)) => Ok(Location::Schema(TableRef::new(database, table))),
        (None, Some(_)) => Err(self.missing("database")),
      },
      LayoutMode::Table => {
        let pk = target.pk.as_deref().ok_or_else(|| self.missing("pk"))?;
        let id = TableId::parse(pk)?;
        Ok(Location::Schema(TableRef::new(id.database, id.table)))
      }
      LayoutMode::DefaultTable => Ok(Location::Schema(TableRef::new("config", "Table"))),
    }
  }

  fn require_name(self, target: &LayoutTarget) -> Result<String> {
    target.name.clone().ok_or_else(|| self.missing("name"))
  }

  fn missing(self, field: &'static str) -> Error {
    Error::MissingTarget {
      mode: self.as_str(),
      field,
    }
  }
}

impl FromStr for LayoutMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    LayoutMode::ALL
      .into_iter()
      .find(|mode| mode.as_str() == s)
      .ok_or_else(|| Error::IllegalLayoutMode(s.to_string()))
  }
}

impl fmt::Display for LayoutMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Parameters of a layout lookup. Which fields matter depends on the mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutTarget {
  /// Page or widget name
  pub name: Option<String>,
  /// Current database
  pub database: Option<String>,
  /// Current table
  pub table: Option<String>,
  /// Table id of the current object (`dj/<database>/<table>`)
  pub pk: Option<String>,
}

impl LayoutTarget {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      ..Self::default()
    }
  }

  pub fn table(database: impl Into<String>, table: impl Into<String>) -> Self {
    Self {
      database: Some(database.into()),
      table: Some(table.into()),
      ..Self::default()
    }
  }

  pub fn pk(pk: impl Into<String>) -> Self {
    Self {
      pk: Some(pk.into()),
      ..Self::default()
    }
  }
}

enum Location {
  Page(String),
  Widget(String),
  Schema(TableRef),
  /// Instance mode without a table
  NoTable,
}

/// A resolved layout: the cached resource and the field holding the layout.
#[derive(Debug, Clone)]
pub struct LayoutSource {
  pub resource: Pending<Document>,
  pub path: &'static str,
}

impl LayoutSource {
  /// Current layout value, if the resource has one.
  pub async fn layout(&self) -> Result<Option<Value>> {
    let doc = self.resource.clone().await?;
    let layout = doc.read().get(self.path).cloned();
    Ok(layout)
  }

  /// Replace the layout in the cached resource.
  ///
  /// A resource that is not an object (e.g. `null`) becomes one.
  pub async fn replace_layout(&self, layout: Value) -> Result<()> {
    let doc = self.resource.clone().await?;
    let mut value = doc.write();
    if !value.is_object() {
      *value = Value::Object(Map::new());
    }
    value[self.path] = layout;
    Ok(())
  }
}

impl ConfigStore {
  /// Resolve the cached resource and path holding the layout for `mode`.
  pub fn layout(&self, mode: LayoutMode, target: &LayoutTarget) -> Result<LayoutSource> {
    let resource = match mode.locate(target)? {
      Location::Page(page) => self.get_page(&page),
      Location::Widget(widget) => self.get_widget(&widget),
      Location::Schema(t) => self.get_schema(&t.database, Some(&t.table)),
      Location::NoTable => Pending::ready(document(Value::Null)),
    };

    Ok(LayoutSource {
      resource,
      path: mode.path(),
    })
  }

  /// Mark the layout addressed by `mode` as edited and in need of saving.
  pub fn mark_dirty(&self, mode: LayoutMode, target: &LayoutTarget) -> Result<()> {
    match mode.locate(target)? {
      Location::Page(page) => self.dirty.mark_page(&page),
      Location::Widget(widget) => self.dirty.mark_widget(&widget),
      Location::Schema(table) => self.dirty.mark_schema(table),
      Location::NoTable => return Err(mode.missing("table")),
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::crud::ResourceFamily;
  use crate::store::testing::{store, MockTransport};
  use serde_json::json;

  #[test]
  fn test_mode_round_trips_through_names() {
    for mode in LayoutMode::ALL {
      assert_eq!(mode.as_str().parse::<LayoutMode>(), Ok(mode));
    }
  }

  #[test]
  fn test_unknown_mode_is_illegal() {
    let err = "bogus".parse::<LayoutMode>().unwrap_err();
    assert_eq!(err, Error::IllegalLayoutMode("bogus".into()));
    assert!(err.is_contract_violation());
  }

  #[test]
  fn test_paths() {
    let paths: Vec<_> = LayoutMode::ALL.iter().map(|m| m.path()).collect();
    assert_eq!(
      paths,
      vec![
        "layout",
        "layout",
        "instanceLayout",
        "layout",
        "tableLayout",
        "instanceLayout"
      ]
    );
  }

  #[tokio::test]
  async fn test_resolve_dispatches_to_the_right_resource() {
    let mock = MockTransport::with(&[
      ("config/page/Info", json!({"layout": "info"})),
      ("config/page/default", json!({"layout": "default"})),
      ("config/widget/nav", json!({"layout": "nav"})),
      ("config/Table/dj%2Fsales%2FOrders", json!({"instanceLayout": "orders", "tableLayout": "orders-table"})),
      ("config/Table/dj%2Fconfig%2FTable", json!({"instanceLayout": "meta"})),
    ]);
    let store = store(&mock, "/");

    let cases = [
      (LayoutMode::Page, LayoutTarget::named("Info"), "info"),
      (LayoutMode::Widget, LayoutTarget::named("nav"), "nav"),
      (LayoutMode::Instance, LayoutTarget::table("sales", "Orders"), "orders"),
      (LayoutMode::Default, LayoutTarget::default(), "default"),
      (LayoutMode::Table, LayoutTarget::pk("dj/sales/Orders"), "orders-table"),
      (LayoutMode::DefaultTable, LayoutTarget::default(), "meta"),
    ];

    for (mode, target, expected) in cases {
      let source = store.layout(mode, &target).unwrap();
      assert_eq!(source.path, mode.path());
      assert_eq!(source.layout().await.unwrap(), Some(json!(expected)), "{mode}");
    }
  }

  #[tokio::test]
  async fn test_instance_without_table_is_null() {
    let mock = MockTransport::with(&[]);
    let store = store(&mock, "/");

    let source = store
      .layout(LayoutMode::Instance, &LayoutTarget::default())
      .unwrap();

    assert_eq!(source.path, "instanceLayout");
    assert_eq!(source.layout().await.unwrap(), None);
    assert!(mock.requests.lock().is_empty());
  }

  #[test]
  fn test_missing_parameters() {
    let mock = MockTransport::with(&[]);
    let store = store(&mock, "/");

    let err = store
      .layout(LayoutMode::Page, &LayoutTarget::default())
      .unwrap_err();
    assert_eq!(
      err,
      Error::MissingTarget {
        mode: "page",
        field: "name"
      }
    );
    assert!(store
      .layout(LayoutMode::Table, &LayoutTarget::pk("not-a-table-id"))
      .is_err());
  }

  #[tokio::test]
  async fn test_replace_layout_edits_cached_resource() {
    let mock = MockTransport::with(&[("config/widget/nav", json!({"ID": "nav"}))]);
    let store = store(&mock, "/");

    let source = store
      .layout(LayoutMode::Widget, &LayoutTarget::named("nav"))
      .unwrap();
    source.replace_layout(json!({"widget": "page"})).await.unwrap();

    let cached = store.get_widget("nav").value().await.unwrap();
    assert_eq!(cached, json!({"ID": "nav", "layout": {"widget": "page"}}));
    assert_eq!(mock.count("GET config/widget/nav"), 1);
  }

  #[test]
  fn test_mark_dirty_table_mode_uses_parsed_pk() {
    let mock = MockTransport::with(&[]);
    let store = store(&mock, "/");

    store
      .mark_dirty(LayoutMode::Table, &LayoutTarget::pk("dj/sales/Orders"))
      .unwrap();

    let dirty = store.dirty().snapshot();
    assert_eq!(
      dirty.schema.get("sales/Orders"),
      Some(&TableRef::new("sales", "Orders"))
    );
    assert!(dirty.page.is_empty());
    assert!(dirty.widget.is_empty());
    assert!(mock.requests.lock().is_empty());
  }

  #[test]
  fn test_mark_dirty_partitions() {
    let mock = MockTransport::with(&[]);
    let store = store(&mock, "/");

    store
      .mark_dirty(LayoutMode::Page, &LayoutTarget::named("Info"))
      .unwrap();
    store
      .mark_dirty(LayoutMode::Default, &LayoutTarget::default())
      .unwrap();
    store
      .mark_dirty(LayoutMode::Widget, &LayoutTarget::named("nav"))
      .unwrap();
    store
      .mark_dirty(LayoutMode::Instance, &LayoutTarget::table("hr", "EMP"))
      .unwrap();
    store
      .mark_dirty(LayoutMode::DefaultTable, &LayoutTarget::default())
      .unwrap();

    let dirty = store.dirty().snapshot();
    assert_eq!(dirty.page.keys().collect::<Vec<_>>(), vec!["Info", "default"]);
    assert_eq!(dirty.widget.keys().collect::<Vec<_>>(), vec!["nav"]);
    assert_eq!(
      dirty.schema.keys().collect::<Vec<_>>(),
      vec!["config/Table", "hr/EMP"]
    );
    assert!(store.cached(ResourceFamily::Page).is_empty());
  }

  #[test]
  fn test_mark_dirty_instance_without_table_fails() {
    let mock = MockTransport::with(&[]);
    let store = store(&mock, "/");

    let err = store
      .mark_dirty(LayoutMode::Instance, &LayoutTarget::default())
      .unwrap_err();
    assert!(err.is_contract_violation());
    assert!(store.dirty().is_empty());
  }
}
