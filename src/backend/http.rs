use super::api_types::{ApiError, ApiToken};
use super::{AuthProvider, ObjectStore, RecordStore, Row};
use crate::config::{BackendConfig, Config};
use crate::error::{AuthError, RepositoryError, StoreError};
use crate::session::{Session, SessionState};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

/// HTTP client for the hosted backend.
///
/// Records live behind a PostgREST-style `/rest/v1` API, attachments in a
/// storage bucket under `/storage/v1`, and sign-in goes through `/auth/v1`.
/// Requests carry the signed-in user's token when there is one, otherwise
/// the project's public API key.
#[derive(Clone)]
pub struct HttpBackend {
  http: reqwest::Client,
  base: Url,
  api_key: String,
  bucket: String,
  session: SessionState,
}

impl HttpBackend {
  pub fn new(config: &BackendConfig, session: SessionState) -> Result<Self> {
    let api_key = Config::get_api_key()?;

    // A trailing slash keeps Url::join from dropping the last path segment
    let mut raw = config.url.clone();
    if !raw.ends_with('/') {
      raw.push('/');
    }
    let base = Url::parse(&raw).map_err(|e| eyre!("Invalid backend url {}: {}", config.url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("siteadmin/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      api_key,
      bucket: config.bucket.clone(),
      session,
    })
  }

  fn endpoint(&self, path: &str) -> Url {
    // Paths are built from constants and generated keys, joining cannot fail
    // for them; fall back to the base so a bad path surfaces as a 404.
    self.base.join(path).unwrap_or_else(|_| self.base.clone())
  }

  fn table_url(&self, table: &str) -> Url {
    self.endpoint(&format!("rest/v1/{}", table))
  }

  fn row_url(&self, table: &str, id: &str) -> Url {
    let mut url = self.table_url(table);
    url
      .query_pairs_mut()
      .append_pair("id", &format!("eq.{}", id));
    url
  }

  fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
    let token = self
      .session
      .access_token()
      .unwrap_or_else(|| self.api_key.clone());
    req.header("apikey", &self.api_key).bearer_auth(token)
  }

  /// Turn a non-success response into the service's own message.
  async fn failure_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ApiError>(&body)
      .ok()
      .and_then(ApiError::into_message)
      .unwrap_or_else(|| format!("{} {}", status.as_u16(), body.trim()))
  }

  async fn send_record(&self, req: RequestBuilder) -> Result<Response, RepositoryError> {
    let resp = self
      .authorized(req)
      .send()
      .await
      .map_err(|e| RepositoryError::remote(e.to_string()))?;

    if resp.status().is_success() {
      Ok(resp)
    } else {
      let message = Self::failure_message(resp).await;
      error!(%message, "record store call failed");
      Err(RepositoryError::remote(message))
    }
  }
}

#[async_trait]
impl RecordStore for HttpBackend {
  async fn select(&self, table: &str) -> Result<Vec<Value>, RepositoryError> {
    let mut url = self.table_url(table);
    url
      .query_pairs_mut()
      .append_pair("select", "*")
      .append_pair("order", "created_at.desc");
    debug!(%table, "select");

    let resp = self.send_record(self.http.get(url)).await?;
    resp
      .json::<Vec<Value>>()
      .await
      .map_err(|e| RepositoryError::Decode(e.to_string()))
  }

  async fn insert(&self, table: &str, row: Row) -> Result<(), RepositoryError> {
    debug!(%table, columns = ?row.keys().collect::<Vec<_>>(), "insert");
    let req = self
      .http
      .post(self.table_url(table))
      .header("Prefer", "return=minimal")
      .json(&[Value::Object(row)]);
    self.send_record(req).await.map(|_| ())
  }

  async fn update(&self, table: &str, id: &str, row: Row) -> Result<(), RepositoryError> {
    debug!(%table, %id, columns = ?row.keys().collect::<Vec<_>>(), "update");
    let req = self
      .http
      .patch(self.row_url(table, id))
      .header("Prefer", "return=minimal")
      .json(&Value::Object(row));
    self.send_record(req).await.map(|_| ())
  }

  async fn delete(&self, table: &str, id: &str) -> Result<(), RepositoryError> {
    debug!(%table, %id, "delete");
    let req = self.http.delete(self.row_url(table, id));
    self.send_record(req).await.map(|_| ())
  }
}

#[async_trait]
impl ObjectStore for HttpBackend {
  async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
    let url = self.endpoint(&format!("storage/v1/object/{}/{}", self.bucket, key));
    debug!(%key, size = bytes.len(), %content_type, "put object");

    let req = self
      .http
      .post(url)
      .header("Content-Type", content_type)
      .header("x-upsert", "false")
      .body(bytes);

    let fail = |message: String| StoreError::Upload {
      key: key.to_string(),
      message,
    };
    let resp = self
      .authorized(req)
      .send()
      .await
      .map_err(|e| fail(e.to_string()))?;

    if resp.status().is_success() {
      Ok(())
    } else {
      Err(fail(Self::failure_message(resp).await))
    }
  }

  fn public_url(&self, key: &str) -> String {
    self
      .endpoint(&format!("storage/v1/object/public/{}/{}", self.bucket, key))
      .to_string()
  }

  async fn delete(&self, keys: &[String]) -> Result<(), StoreError> {
    let url = self.endpoint(&format!("storage/v1/object/{}", self.bucket));
    debug!(?keys, "delete objects");

    let req = self
      .http
      .delete(url)
      .json(&serde_json::json!({ "prefixes": keys }));

    let fail = |message: String| StoreError::Delete {
      keys: keys.to_vec(),
      message,
    };
    let resp = self
      .authorized(req)
      .send()
      .await
      .map_err(|e| fail(e.to_string()))?;

    if resp.status().is_success() {
      Ok(())
    } else {
      Err(fail(Self::failure_message(resp).await))
    }
  }
}

#[async_trait]
impl AuthProvider for HttpBackend {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    let mut url = self.endpoint("auth/v1/token");
    url.query_pairs_mut().append_pair("grant_type", "password");

    let resp = self
      .http
      .post(url)
      .header("apikey", &self.api_key)
      .json(&serde_json::json!({ "email": email, "password": password }))
      .send()
      .await
      .map_err(|e| AuthError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(AuthError::Rejected(Self::failure_message(resp).await));
    }

    let token: ApiToken = resp
      .json()
      .await
      .map_err(|e| AuthError::Transport(e.to_string()))?;

    Ok(Session {
      access_token: token.access_token,
      email: token
        .user
        .and_then(|u| u.email)
        .unwrap_or_else(|| email.to_string()),
      expires_at: token
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
  }

  async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
    let resp = self
      .http
      .post(self.endpoint("auth/v1/logout"))
      .header("apikey", &self.api_key)
      .bearer_auth(&session.access_token)
      .send()
      .await
      .map_err(|e| AuthError::Transport(e.to_string()))?;

    if resp.status().is_success() {
      Ok(())
    } else {
      Err(AuthError::Rejected(Self::failure_message(resp).await))
    }
  }
}
