//! The config store: cached access to schemas, widgets and pages.
//!
//! One `ConfigStore` lives for the whole application session and is shared
//! by every component that renders or edits layouts. All reads and writes of
//! the three resource families go through it.

mod dirty;
mod label;
mod layout;

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::cache::{document, Document, Pending, SingleFlight};
use crate::crud::{schema_identity, ResourceFamily, Transport};
use crate::error::{Error, Result};
use crate::session::Navigation;

pub use dirty::{DirtyLayouts, DirtyTracker, TableRef};
pub use label::label_key;
pub use layout::{LayoutMode, LayoutSource, LayoutTarget};

/// Schema field holding the transient display order, never persisted.
const TRANSIENT_ORDER_FIELD: &str = "order";

/// Outcome of [`ConfigStore::save_dirty`].
#[derive(Debug, Default)]
pub struct SaveReport {
  /// `family/identity` of every saved resource
  pub saved: Vec<String>,
  /// `family/identity` and error of every failed save
  pub failed: Vec<(String, Error)>,
}

impl SaveReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

/// Caching service in front of the CRUD backend.
pub struct ConfigStore {
  transport: Arc<dyn Transport>,
  navigation: Arc<dyn Navigation>,
  schemas: SingleFlight<String, Document>,
  widgets: SingleFlight<String, Document>,
  pages: SingleFlight<String, Document>,
  labels: SingleFlight<String, String>,
  /// Number of preloaded widgets, set once the bulk load succeeds
  preload: OnceCell<usize>,
  dirty: DirtyTracker,
}

impl ConfigStore {
  pub fn new(transport: Arc<dyn Transport>, navigation: Arc<dyn Navigation>) -> Self {
    Self {
      transport,
      navigation,
      schemas: SingleFlight::new("schema"),
      widgets: SingleFlight::new("widget"),
      pages: SingleFlight::new("page"),
      labels: SingleFlight::new("label"),
      preload: OnceCell::new(),
      dirty: DirtyTracker::default(),
    }
  }

  fn partition(&self, family: ResourceFamily) -> &SingleFlight<String, Document> {
    match family {
      ResourceFamily::Schema => &self.schemas,
      ResourceFamily::Widget => &self.widgets,
      ResourceFamily::Page => &self.pages,
    }
  }

  /// Cached resource of `family` with the given identity.
  ///
  /// The first call for an identity creates the entry; the GET runs once,
  /// when the handle is first awaited.
  pub fn get(&self, family: ResourceFamily, identity: &str) -> Pending<Document> {
    let transport = Arc::clone(&self.transport);
    let path = family.resource_path(identity);

    self
      .partition(family)
      .get_or_fetch(identity.to_string(), move || async move {
        let value = transport.get(&path).await?;
        Ok(document(value))
      })
  }

  /// Schema of `database`/`table`. A missing table resolves to `null`
  /// without touching the cache or the network.
  pub fn get_schema(&self, database: &str, table: Option<&str>) -> Pending<Document> {
    match table {
      Some(table) => self.get(ResourceFamily::Schema, &schema_identity(database, table)),
      None => Pending::ready(document(Value::Null)),
    }
  }

  pub fn get_widget(&self, widget: &str) -> Pending<Document> {
    self.get(ResourceFamily::Widget, widget)
  }

  pub fn get_page(&self, page: &str) -> Pending<Document> {
    self.get(ResourceFamily::Page, page)
  }

  /// Persist the cached schema of `database`/`table`.
  ///
  /// The transient `order` field is stripped from the cached object before
  /// it is posted back.
  pub async fn set_schema(&self, database: &str, table: &str) -> Result<Value> {
    let identity = schema_identity(database, table);
    let doc = self.get(ResourceFamily::Schema, &identity).await?;

    let body = {
      let mut value = doc.write();
      if let Some(object) = value.as_object_mut() {
        object.remove(TRANSIENT_ORDER_FIELD);
      }
      value.clone()
    };

    info!(identity = %identity, "saving schema");
    self
      .transport
      .post(&ResourceFamily::Schema.resource_path(&identity), &body)
      .await
  }

  /// Persist the cached widget layout.
  pub async fn set_widget(&self, widget: &str) -> Result<Value> {
    let doc = self.get_widget(widget).await?;
    let body = doc.read().clone();

    info!(widget, "saving widget");
    self
      .transport
      .post(&ResourceFamily::Widget.resource_path(widget), &body)
      .await
  }

  /// Persist the cached page.
  ///
  /// A page whose layout is empty or absent is deleted on the backend and
  /// evicted, so the next read fetches again.
  pub async fn set_page(&self, page: &str) -> Result<Value> {
    let doc = self.get_page(page).await?;
    let body = doc.read().clone();
    let path = ResourceFamily::Page.resource_path(page);

    if has_layout(&body) {
      info!(page, "saving page");
      return self.transport.post(&path, &body).await;
    }

    info!(page, "page has no layout, deleting");
    self.pages.evict(&page.to_string());
    self.transport.delete(&path).await?;
    Ok(Value::Null)
  }

  /// Bulk-load every widget into the cache, once per store.
  ///
  /// Overlapping calls share one bulk load. A failure is logged and leaves
  /// the store able to retry; per-widget lookups keep working through
  /// individual fetches.
  pub async fn init_widgets(&self) {
    if let Err(e) = self.preload.get_or_try_init(|| self.load_widgets()).await {
      error!(error = %e, "failed to preload widgets");
    }
  }

  async fn load_widgets(&self) -> Result<usize> {
    let listing = self
      .transport
      .get(&ResourceFamily::Widget.collection_path())
      .await?;

    let Value::Array(items) = listing else {
      return Err(Error::MalformedListing(listing.to_string()));
    };

    let mut count = 0;
    for item in items {
      let id = item.get("ID").and_then(Value::as_str).map(String::from);
      match id {
        Some(id) => {
          self.widgets.insert_ready(id, document(item));
          count += 1;
        }
        None => warn!(widget = %item, "skipping widget without string ID"),
      }
    }
    info!(count, "widgets preloaded");
    Ok(count)
  }

  pub fn widgets_loaded(&self) -> bool {
    self.preload.initialized()
  }

  /// Identities currently cached for `family`.
  pub fn cached(&self, family: ResourceFamily) -> Vec<String> {
    let mut keys = self.partition(family).keys();
    keys.sort();
    keys
  }

  /// Drop a cached resource so the next read fetches it again.
  pub fn invalidate(&self, family: ResourceFamily, identity: &str) -> bool {
    self.partition(family).evict(&identity.to_string())
  }

  pub fn dirty(&self) -> &DirtyTracker {
    &self.dirty
  }

  /// Save every resource marked dirty.
  ///
  /// Entries whose save fails are marked dirty again.
  pub async fn save_dirty(&self) -> SaveReport {
    let pending = self.dirty.drain();
    let mut report = SaveReport::default();
    debug!(
      pages = pending.page.len(),
      widgets = pending.widget.len(),
      schemas = pending.schema.len(),
      "saving dirty layouts"
    );

    for page in pending.page.into_values() {
      let label = format!("{}/{}", ResourceFamily::Page, page);
      match self.set_page(&page).await {
        Ok(_) => report.saved.push(label),
        Err(e) => {
          self.dirty.mark_page(&page);
          report.failed.push((label, e));
        }
      }
    }

    for widget in pending.widget.into_values() {
      let label = format!("{}/{}", ResourceFamily::Widget, widget);
      match self.set_widget(&widget).await {
        Ok(_) => report.saved.push(label),
        Err(e) => {
          self.dirty.mark_widget(&widget);
          report.failed.push((label, e));
        }
      }
    }

    for table in pending.schema.into_values() {
      let label = format!("{}/{}", ResourceFamily::Schema, table.key());
      match self.set_schema(&table.database, &table.table).await {
        Ok(_) => report.saved.push(label),
        Err(e) => {
          self.dirty.mark_schema(table);
          report.failed.push((label, e));
        }
      }
    }

    report
  }
}

/// Whether a page value carries a `layout` worth saving.
///
/// Absent, `null`, `false`, zero and `""` count as no layout. Any object or
/// array counts, even an empty one.
fn has_layout(page: &Value) -> bool {
  match page.get("layout") {
    None | Some(Value::Null) | Some(Value::Bool(false)) => false,
    Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
    Some(Value::String(s)) => !s.is_empty(),
    Some(Value::Bool(true)) | Some(Value::Object(_)) | Some(Value::Array(_)) => true,
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use async_trait::async_trait;
  use parking_lot::Mutex;
  use serde_json::Value;
  use std::collections::HashMap;
  use std::sync::Arc;
  use std::time::Duration;

  use super::ConfigStore;
  use crate::crud::Transport;
  use crate::error::{Error, Result};
  use crate::session::MemorySession;

  /// In-memory backend recording every request.
  #[derive(Default)]
  pub struct MockTransport {
    pub resources: Mutex<HashMap<String, Value>>,
    pub requests: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<(String, Value)>>,
  }

  impl MockTransport {
    pub fn with(resources: &[(&str, Value)]) -> Arc<Self> {
      let mock = Self::default();
      for (path, value) in resources {
        mock
          .resources
          .lock()
          .insert(path.to_string(), value.clone());
      }
      Arc::new(mock)
    }

    pub fn count(&self, request: &str) -> usize {
      self
        .requests
        .lock()
        .iter()
        .filter(|r| r.as_str() == request)
        .count()
    }
  }

  #[async_trait]
  impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Value> {
      self.requests.lock().push(format!("GET {}", path));
      tokio::time::sleep(Duration::from_millis(5)).await;
      self
        .resources
        .lock()
        .get(path)
        .cloned()
        .ok_or_else(|| Error::Status {
          url: path.to_string(),
          status: 404,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
      self.requests.lock().push(format!("POST {}", path));
      self.posted.lock().push((path.to_string(), body.clone()));
      self
        .resources
        .lock()
        .insert(path.to_string(), body.clone());
      Ok(Value::Null)
    }

    async fn delete(&self, path: &str) -> Result<()> {
      self.requests.lock().push(format!("DELETE {}", path));
      self.resources.lock().remove(path);
      Ok(())
    }
  }

  pub fn store(mock: &Arc<MockTransport>, current_url: &str) -> ConfigStore {
    let session = Arc::new(MemorySession::new(None, current_url));
    ConfigStore::new(mock.clone(), session)
  }
}
