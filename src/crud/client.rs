use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::Transport;
use crate::error::{Error, Result};

/// reqwest-backed client for the CRUD API
#[derive(Clone)]
pub struct CrudClient {
  client: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl CrudClient {
  /// Create a client rooted at `base` (e.g. `http://localhost:8080/rest/database/crud`).
  pub fn new(base: &Url, token: Option<String>) -> Self {
    // Url::join replaces the last segment unless the base ends with '/'
    let mut base = base.clone();
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    Self {
      client: reqwest::Client::new(),
      base,
      token,
    }
  }

  /// Absolute URL for a backend path
  pub fn url(&self, path: &str) -> Result<Url> {
    self.base.join(path).map_err(|e| Error::Request {
      url: format!("{}{}", self.base, path),
      message: e.to_string(),
    })
  }

  fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  /// Check the status and decode the body. Empty bodies decode to `null`.
  async fn read_json(url: &Url, response: Response) -> Result<Value> {
    let response = check_status(url, response)?;
    let bytes = response.bytes().await.map_err(|e| Error::Request {
      url: url.to_string(),
      message: e.to_string(),
    })?;

    if bytes.is_empty() {
      return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
      url: url.to_string(),
      message: e.to_string(),
    })
  }
}

fn check_status(url: &Url, response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() || status == StatusCode::NOT_MODIFIED {
    Ok(response)
  } else {
    Err(Error::Status {
      url: url.to_string(),
      status: status.as_u16(),
    })
  }
}

fn request_error(url: &Url, e: reqwest::Error) -> Error {
  Error::Request {
    url: url.to_string(),
    message: e.to_string(),
  }
}

#[async_trait]
impl Transport for CrudClient {
  async fn get(&self, path: &str) -> Result<Value> {
    let url = self.url(path)?;
    debug!(%url, "GET");

    let response = self
      .authorize(self.client.get(url.clone()))
      .send()
      .await
      .map_err(|e| request_error(&url, e))?;

    Self::read_json(&url, response).await
  }

  async fn post(&self, path: &str, body: &Value) -> Result<Value> {
    let url = self.url(path)?;
    debug!(%url, "POST");

    // .json() sets Content-Type: application/json
    let response = self
      .authorize(self.client.post(url.clone()).json(body))
      .send()
      .await
      .map_err(|e| request_error(&url, e))?;

    Self::read_json(&url, response).await
  }

  async fn delete(&self, path: &str) -> Result<()> {
    let url = self.url(path)?;
    debug!(%url, "DELETE");

    let response = self
      .authorize(self.client.delete(url.clone()))
      .send()
      .await
      .map_err(|e| request_error(&url, e))?;

    check_status(&url, response)?;
    Ok(())
  }
}
