//! Serde types matching the hosted services' JSON bodies.
//!
//! Kept apart from domain types so the wire shapes can drift without
//! touching the rest of the crate.

use serde::Deserialize;

/// Error body. The record store, object store and auth service each use a
/// different key for the human-readable part.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
  pub message: Option<String>,
  pub error_description: Option<String>,
  pub msg: Option<String>,
  pub error: Option<String>,
}

impl ApiError {
  /// Most specific message available
  pub fn into_message(self) -> Option<String> {
    self
      .message
      .or(self.error_description)
      .or(self.msg)
      .or(self.error)
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(default)]
  pub email: Option<String>,
}

/// Password-grant token response
#[derive(Debug, Deserialize)]
pub struct ApiToken {
  pub access_token: String,
  #[serde(default)]
  pub expires_in: Option<i64>,
  pub user: Option<ApiUser>,
}
