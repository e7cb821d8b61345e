//! Navigation guard for every route except login and logout.

use std::sync::Arc;
use tracing::debug;

use crate::session::{Navigation, SessionStore};

/// Allows navigation only while the session holds a token.
#[derive(Clone)]
pub struct RouteGuard {
  session: Arc<dyn SessionStore>,
  navigation: Arc<dyn Navigation>,
  login_route: String,
}

impl RouteGuard {
  pub fn new(
    session: Arc<dyn SessionStore>,
    navigation: Arc<dyn Navigation>,
    login_route: impl Into<String>,
  ) -> Self {
    Self {
      session,
      navigation,
      login_route: login_route.into(),
    }
  }

  /// Decide whether navigation to `url` may proceed.
  ///
  /// The URL is always recorded as the last URL so login can redirect back
  /// to it. Without a token the router is sent to the login route.
  pub fn can_activate(&self, url: &str) -> bool {
    self.session.set_last_url(url);

    if self.session.token().is_some() {
      return true;
    }

    debug!(url, login = %self.login_route, "no session token, redirecting");
    self.navigation.navigate(&self.login_route);
    false
  }
}
