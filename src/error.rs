//! Error types for the dashboard data-access layer.

use thiserror::Error;

/// Errors produced by the cache, the layout resolver and the backend client.
///
/// The type is `Clone` because a failed fetch is replayed to every caller
/// waiting on the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A layout mode string outside the six known modes.
  #[error("illegal layout option: {0}")]
  IllegalLayoutMode(String),

  /// A layout mode was used without the parameter it needs.
  #[error("layout mode '{mode}' requires a {field}")]
  MissingTarget {
    mode: &'static str,
    field: &'static str,
  },

  /// A composite table id that does not have the form `prefix/database/table`.
  #[error("invalid table id: {0}")]
  InvalidTableId(String),

  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },

  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("failed to decode response from {url}: {message}")]
  Decode { url: String, message: String },

  /// The bulk widget listing was not a JSON array.
  #[error("widget listing is not an array: {0}")]
  MalformedListing(String),
}

impl Error {
  /// Programming errors that must never be retried.
  pub fn is_contract_violation(&self) -> bool {
    matches!(
      self,
      Error::IllegalLayoutMode(_) | Error::MissingTarget { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
