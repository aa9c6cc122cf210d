//! Remote collaborators: record store, object store and auth provider.
//!
//! These traits are the only seams to the hosted services. [`HttpBackend`]
//! speaks their HTTP APIs; tests swap in the in-memory fake.

mod api_types;
mod http;
#[cfg(test)]
pub mod memory;

pub use http::HttpBackend;

use crate::error::{AuthError, RepositoryError, StoreError};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A record as sent to the store, keyed by column name
pub type Row = Map<String, Value>;

/// Table-like structured store.
///
/// Reads after the caller's own writes are assumed strongly consistent.
#[async_trait]
pub trait RecordStore: Send + Sync {
  /// Every row of `table`, newest `created_at` first
  async fn select(&self, table: &str) -> Result<Vec<Value>, RepositoryError>;

  async fn insert(&self, table: &str, row: Row) -> Result<(), RepositoryError>;

  /// Writes only the columns present in `row`
  async fn update(&self, table: &str, id: &str, row: Row) -> Result<(), RepositoryError>;

  async fn delete(&self, table: &str, id: &str) -> Result<(), RepositoryError>;
}

/// Bucket-style binary store with public URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
  /// Fails rather than overwrite an existing object
  async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

  /// Publicly resolvable URL; its final path segment is `key`
  fn public_url(&self, key: &str) -> String;

  async fn delete(&self, keys: &[String]) -> Result<(), StoreError>;
}

/// Email/password authentication.
#[async_trait]
pub trait AuthProvider: Send + Sync {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

  async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;
}
