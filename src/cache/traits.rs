//! Core types for the caching system.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::future::IntoFuture;
use std::sync::Arc;

use crate::error::Result;

/// A cached JSON resource.
///
/// The lock lets UI code edit the cached object in place; saving persists
/// whatever the document holds at that moment.
pub type Document = Arc<RwLock<Value>>;

pub(crate) type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Wrap a JSON value as a fresh document.
pub fn document(value: Value) -> Document {
  Arc::new(RwLock::new(value))
}

/// A shared, replayable asynchronous value.
///
/// Every clone observes the same underlying computation: it runs once, the
/// first time any clone is awaited, and its result is replayed to all
/// present and future awaiters.
pub struct Pending<T: Clone> {
  inner: SharedFetch<T>,
}

impl<T: Clone> Clone for Pending<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T> Pending<T>
where
  T: Clone + Send + Sync + 'static,
{
  pub(crate) fn from_shared(inner: SharedFetch<T>) -> Self {
    Self { inner }
  }

  /// An already-resolved value.
  pub fn ready(value: T) -> Self {
    Self {
      inner: futures::future::ready(Ok(value)).boxed().shared(),
    }
  }
}

impl Pending<Document> {
  /// Await the document and return a snapshot of its current JSON value.
  pub async fn value(&self) -> Result<Value> {
    let doc = self.clone().await?;
    let snapshot = doc.read().clone();
    Ok(snapshot)
  }
}

impl<T: Clone> IntoFuture for Pending<T> {
  type Output = Result<T>;
  type IntoFuture = SharedFetch<T>;

  fn into_future(self) -> Self::IntoFuture {
    self.inner
  }
}

impl<T: Clone> std::fmt::Debug for Pending<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pending")
      .field("resolved", &self.inner.peek().is_some())
      .finish()
  }
}
