//! Caching data-access layer for a schema-driven dashboard.
//!
//! [`ConfigStore`] mediates every read and write of table schemas, widget
//! layouts and dashboard pages between the UI and the backend CRUD API.
//! Each resource is fetched at most once and shared by every caller; labels
//! are derived from the schemas' `dj-label` templates.

pub mod cache;
pub mod config;
pub mod crud;
pub mod error;
pub mod guard;
pub mod logging;
pub mod session;
pub mod store;
pub mod template;

pub use cache::{Document, Pending};
pub use crud::{CrudClient, ResourceFamily, TableId, Transport};
pub use error::{Error, Result};
pub use guard::RouteGuard;
pub use session::{MemorySession, Navigation, SessionStore};
pub use store::{ConfigStore, LayoutMode, LayoutSource, LayoutTarget, SaveReport};
