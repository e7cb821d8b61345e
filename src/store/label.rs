//! Human-readable labels for records.

use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

use super::ConfigStore;
use crate::cache::Pending;
use crate::crud::schema_identity;
use crate::template::{default_label, render};

/// Schema field holding the label template.
const LABEL_TEMPLATE_FIELD: &str = "dj-label";

/// Route segment of table metadata links.
const TABLE_ROUTE: &str = "/table";

/// Label cache key: percent-encoded `database/table/id1/id2/...`.
pub fn label_key<S: AsRef<str>>(database: &str, table: &str, ids: &[S]) -> String {
  let ids: Vec<_> = ids
    .iter()
    .map(|id| urlencoding::encode(id.as_ref()))
    .collect();
  format!(
    "{}/{}/{}",
    urlencoding::encode(database),
    urlencoding::encode(table),
    ids.join("/")
  )
}

impl ConfigStore {
  /// Label for a record of `database`/`table`.
  ///
  /// Without an object (a bare route such as a dashboard page), or with a
  /// `null` one, the label is the last segment of the current URL. Otherwise the schema's `dj-label`
  /// template is rendered against the object, falling back to the default
  /// label of `ids`. The result is cached per record.
  pub fn object_label<S: AsRef<str>>(
    &self,
    database: &str,
    table: &str,
    ids: &[S],
    object: Option<&Value>,
  ) -> Pending<String> {
    let Some(object) = object.filter(|object| !object.is_null()) else {
      let url = self.navigation.current_url();
      let last = url.rsplit('/').next().unwrap_or_default().to_string();
      return Pending::ready(last);
    };

    let key = label_key(database, table, ids);
    self.labels.get_or_fetch(key, || {
      let schema = self.get_schema(database, Some(table));
      let object = object.clone();
      let ids: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();

      async move {
        let schema = schema.value().await?;
        let label = match schema.get(LABEL_TEMPLATE_FIELD).and_then(Value::as_str) {
          Some(template) if !template.is_empty() => render(template, &object),
          _ => default_label(ids.as_slice()),
        };
        Ok(label)
      }
    })
  }

  /// Label for a record link when the record itself is not loaded.
  ///
  /// `link` is a split route such as `["/resource", db, table, id...]` or
  /// `["/table", db, table]`. Returns the cached label if an earlier
  /// [`object_label`](Self::object_label) computed one; otherwise the
  /// default label. Never fetches.
  pub fn id_label<S: AsRef<str>>(&self, link: &[S]) -> Pending<String> {
    let mut link: VecDeque<String> = link.iter().map(|s| s.as_ref().to_string()).collect();

    // a leading '/' splits into ["", "resource", ...]
    if link.front().is_some_and(String::is_empty) {
      link.pop_front();
      if let Some(first) = link.front_mut() {
        first.insert(0, '/');
      }
    }

    let route = link.pop_front();
    let mut next = || link.pop_front().unwrap_or_default();

    let (database, table, ids) = if route.as_deref() == Some(TABLE_ROUTE) {
      let database = next();
      let table = next();
      (
        "config".to_string(),
        "Table".to_string(),
        vec![schema_identity(&database, &table)],
      )
    } else {
      let database = next();
      let table = next();
      (database, table, link.into_iter().collect::<Vec<_>>())
    };

    let key = label_key(&database, &table, ids.as_slice());
    match self.labels.get(&key) {
      Some(label) => label,
      None => {
        debug!(key = %key, "no cached label, using default");
        Pending::ready(default_label(ids.as_slice()))
      }
    }
  }
}
