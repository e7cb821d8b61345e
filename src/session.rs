//! Ambient session and navigation state.
//!
//! The config store only reads from these; token issuance and routing are
//! owned by the embedding application.

use parking_lot::Mutex;

/// Session storage: the auth token and the last attempted URL.
pub trait SessionStore: Send + Sync {
  fn token(&self) -> Option<String>;

  /// Remember the URL a navigation was attempted to (for post-login redirect).
  fn set_last_url(&self, url: &str);

  fn last_url(&self) -> Option<String>;
}

/// The router, as far as the config store needs it.
pub trait Navigation: Send + Sync {
  /// The URL currently displayed.
  fn current_url(&self) -> String;

  /// Navigate to `route`.
  fn navigate(&self, route: &str);
}

#[derive(Debug, Default)]
struct SessionState {
  token: Option<String>,
  last_url: Option<String>,
  current_url: String,
}

/// In-memory session and router.
#[derive(Debug, Default)]
pub struct MemorySession {
  state: Mutex<SessionState>,
}

impl MemorySession {
  pub fn new(token: Option<String>, current_url: impl Into<String>) -> Self {
    Self {
      state: Mutex::new(SessionState {
        token,
        last_url: None,
        current_url: current_url.into(),
      }),
    }
  }

  pub fn set_token(&self, token: Option<String>) {
    self.state.lock().token = token;
  }
}

impl SessionStore for MemorySession {
  fn token(&self) -> Option<String> {
    self.state.lock().token.clone()
  }

  fn set_last_url(&self, url: &str) {
    self.state.lock().last_url = Some(url.to_string());
  }

  fn last_url(&self) -> Option<String> {
    self.state.lock().last_url.clone()
  }
}

impl Navigation for MemorySession {
  fn current_url(&self) -> String {
    self.state.lock().current_url.clone()
  }

  fn navigate(&self, route: &str) {
    self.state.lock().current_url = route.to_string();
  }
}
