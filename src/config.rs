use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub backend: BackendConfig,
  /// Route unauthenticated navigation is redirected to
  #[serde(default = "default_login_route")]
  pub login_route: String,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
  /// Base URL of the CRUD API, e.g. "http://localhost:8080/rest/database/crud"
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
  /// Default tracing filter; RUST_LOG takes precedence
  #[serde(default = "default_log_filter")]
  pub filter: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      filter: default_log_filter(),
    }
  }
}

fn default_login_route() -> String {
  "/login".to_string()
}

fn default_log_filter() -> String {
  "info".to_string()
}

impl BackendConfig {
  /// Parsed base URL.
  pub fn base_url(&self) -> Result<Url> {
    Url::parse(&self.url).map_err(|e| eyre!("Invalid backend url '{}': {}", self.url, e))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./dashcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/dashcache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/dashcache/config.yaml \
         or pass --url."
      )),
    }
  }

  /// Configuration for a backend URL given on the command line.
  pub fn for_url(url: &str) -> Self {
    Self {
      backend: BackendConfig {
        url: url.to_string(),
      },
      login_route: default_login_route(),
      log: LogConfig::default(),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("dashcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("dashcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.backend.base_url()?;
    Ok(config)
  }

  /// Get the session token from environment variables.
  ///
  /// Checks DASHCACHE_TOKEN first, then DJ_TOKEN as fallback. No token means
  /// the session is unauthenticated.
  pub fn session_token() -> Option<String> {
    std::env::var("DASHCACHE_TOKEN")
      .or_else(|_| std::env::var("DJ_TOKEN"))
      .ok()
      .filter(|token| !token.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal() {
    let config = Config::parse("backend:\n  url: http://localhost:8080/rest/database/crud\n").unwrap();

    assert_eq!(config.login_route, "/login");
    assert_eq!(config.log.filter, "info");
    assert!(config.log.file.is_none());
    assert_eq!(
      config.backend.base_url().unwrap().path(),
      "/rest/database/crud"
    );
  }

  #[test]
  fn test_parse_full() {
    let yaml = r#"
backend:
  url: https://dash.example.com/rest/database/crud
login_route: /signin
log:
  file: /tmp/dashcache.log
  filter: dashcache=debug
"#;
    let config = Config::parse(yaml).unwrap();

    assert_eq!(config.login_route, "/signin");
    assert_eq!(config.log.filter, "dashcache=debug");
    assert_eq!(config.log.file, Some(PathBuf::from("/tmp/dashcache.log")));
  }

  #[test]
  fn test_parse_rejects_bad_url() {
    assert!(Config::parse("backend:\n  url: not a url\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/dashcache.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
