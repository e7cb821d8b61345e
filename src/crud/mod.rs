//! Client side of the backend CRUD API.

pub mod client;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use client::CrudClient;
pub use types::{schema_identity, ResourceFamily, TableId};

/// HTTP surface the config store talks to.
///
/// Paths are relative to the configured base URL (e.g. `config/page/Info`).
#[async_trait]
pub trait Transport: Send + Sync {
  /// `GET` a JSON resource.
  async fn get(&self, path: &str) -> Result<Value>;

  /// `POST` a JSON body. The response body is informational only.
  async fn post(&self, path: &str, body: &Value) -> Result<Value>;

  /// `DELETE` a resource.
  async fn delete(&self, path: &str) -> Result<()>;
}
