//! Error taxonomy shared by the library seams.
//!
//! Nothing here is fatal: every variant ends up as a notification plus a
//! previously-valid UI state. `color_eyre` is only used at the process edge.

use std::collections::BTreeMap;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Local, never reaches a remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("please correct the errors in the form ({} field(s))", .0.len())]
  Fields(FieldErrors),

  #[error("{name} is {size} bytes, over the {limit} byte limit")]
  FileTooLarge { name: String, size: u64, limit: u64 },

  #[error("{name} is not an image ({content_type})")]
  NotAnImage { name: String, content_type: String },

  #[error("maximum {max} images allowed ({remaining} more allowed)")]
  TooManyFiles { max: usize, remaining: usize },

  /// The URL has no final path segment to use as a storage key.
  #[error("cannot derive a storage key from {0:?}")]
  UnresolvableUrl(String),
}

/// Remote record-store call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
  #[error("{message}")]
  Remote { message: String },

  #[error("unexpected record shape: {0}")]
  Decode(String),
}

impl RepositoryError {
  pub fn remote(message: impl Into<String>) -> Self {
    RepositoryError::Remote {
      message: message.into(),
    }
  }
}

/// Object-store call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
  #[error("upload of {key} failed: {message}")]
  Upload { key: String, message: String },

  #[error("delete of {keys:?} failed: {message}")]
  Delete { keys: Vec<String>, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
  #[error("{0}")]
  Rejected(String),

  #[error("auth service unreachable: {0}")]
  Transport(String),
}

/// Anything an attachment upload can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
  #[error(transparent)]
  Invalid(#[from] ValidationError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("could not read {name}: {message}")]
  Read { name: String, message: String },
}
