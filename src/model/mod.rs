//! Entity descriptors.
//!
//! Each managed entity (employee, project, testimonial) is described once:
//! its persisted shape, the editable draft behind its form, the field list
//! with the remote column each field is stored in, and its validation rules.
//! The repository, cache and form controller are generic over [`Entity`].

mod employee;
mod project;
mod testimonial;

pub use employee::Employee;
pub use project::{Project, MAX_PROJECT_IMAGES};
pub use testimonial::Testimonial;

// Drafts are reached through `Entity::Draft` outside of tests
#[cfg(test)]
pub use employee::EmployeeDraft;
#[cfg(test)]
pub use project::ProjectDraft;
#[cfg(test)]
pub use testimonial::TestimonialDraft;

use crate::error::FieldErrors;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// How a field is edited and how its value is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  /// Single-line text
  Text,
  /// Multi-line text
  LongText,
  /// One attachment URL
  Image,
  /// Ordered attachment URLs, first one is the cover
  Gallery { max: usize },
  /// Optional external video link, stored as null when empty
  VideoUrl,
}

/// One editable field of a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
  /// In-memory field name (also the key of validation messages)
  pub name: &'static str,
  /// Persisted column name in the record store
  pub column: &'static str,
  pub label: &'static str,
  pub kind: FieldKind,
}

impl FieldSpec {
  pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
    Self {
      name,
      column: name,
      label,
      kind,
    }
  }

  /// Persist under a different column name
  pub const fn stored_as(mut self, column: &'static str) -> Self {
    self.column = column;
    self
  }

  /// Encode a value for the record store.
  pub fn column_value(&self, value: &FieldValue) -> Value {
    match (self.kind, value) {
      (FieldKind::VideoUrl, FieldValue::Text(s)) if s.trim().is_empty() => Value::Null,
      (_, FieldValue::Text(s)) => Value::String(s.clone()),
      (_, FieldValue::Image(url)) => Value::String(url.clone().unwrap_or_default()),
      (_, FieldValue::Gallery(urls)) => {
        Value::Array(urls.iter().cloned().map(Value::String).collect())
      }
    }
  }
}

/// A field's value as seen by forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
  Text(String),
  Image(Option<String>),
  Gallery(Vec<String>),
}

impl FieldValue {
  pub fn as_text(&self) -> &str {
    match self {
      FieldValue::Text(s) => s,
      FieldValue::Image(Some(url)) => url,
      _ => "",
    }
  }

  /// Attachment URLs held by this value
  pub fn urls(&self) -> Vec<String> {
    match self {
      FieldValue::Text(_) => Vec::new(),
      FieldValue::Image(url) => url.iter().cloned().collect(),
      FieldValue::Gallery(urls) => urls.clone(),
    }
  }
}

/// Editable, not-yet-persisted field state behind a form.
pub trait Draft: Clone + Default + Debug + Send + Sync + 'static {
  /// Fields in display order
  const FIELDS: &'static [FieldSpec];

  fn value(&self, field: &str) -> FieldValue;

  /// Unknown field names and mismatched value kinds are ignored.
  fn set_value(&mut self, field: &str, value: FieldValue);

  /// Check every field; never stops at the first failure.
  fn validate(&self) -> FieldErrors;

  /// Name shown in notifications
  fn display_name(&self) -> &str;

  fn spec(field: &str) -> Option<&'static FieldSpec> {
    Self::FIELDS.iter().find(|f| f.name == field)
  }

  /// Full insert row, keyed by column names.
  fn to_row(&self) -> Map<String, Value> {
    Self::FIELDS
      .iter()
      .map(|f| (f.column.to_string(), f.column_value(&self.value(f.name))))
      .collect()
  }
}

/// A persisted record type managed by the admin console.
pub trait Entity: Clone + Debug + Send + Sync + DeserializeOwned + 'static {
  type Draft: Draft;

  /// Remote table name
  const TABLE: &'static str;
  /// Lower-case singular, e.g. "employee"
  const SINGULAR: &'static str;
  /// Lower-case plural, e.g. "employees"
  const PLURAL: &'static str;

  fn id(&self) -> &str;

  fn display_name(&self) -> &str;

  /// Attachment URLs this record references
  fn attachments(&self) -> Vec<String>;

  /// Editable copy of this record's fields
  fn to_draft(&self) -> Self::Draft;
}

/// Subset of fields to write in an update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
  fields: BTreeMap<&'static str, FieldValue>,
}

impl Patch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Only the fields whose value differs between `before` and `after`
  pub fn diff<D: Draft>(before: &D, after: &D) -> Self {
    let mut patch = Self::new();
    for f in D::FIELDS {
      let new = after.value(f.name);
      if before.value(f.name) != new {
        patch.set(f.name, new);
      }
    }
    patch
  }

  pub fn set(&mut self, field: &'static str, value: FieldValue) {
    self.fields.insert(field, value);
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  /// Update row keyed by column names; unknown fields are dropped.
  pub fn to_row<D: Draft>(&self) -> Map<String, Value> {
    self
      .fields
      .iter()
      .filter_map(|(name, value)| {
        D::spec(name).map(|spec| (spec.column.to_string(), spec.column_value(value)))
      })
      .collect()
  }
}

/// Message for a required text field, if it is blank
pub(crate) fn require_text(errors: &mut FieldErrors, field: &'static str, value: &str, msg: &str) {
  if value.trim().is_empty() {
    errors.insert(field, msg.to_string());
  }
}

/// Treat a JSON null as the type's default (e.g. a null `images` column)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_video_column_mapping() {
    let draft = ProjectDraft {
      name: "Tower".into(),
      video: "https://vimeo.com/1".into(),
      ..Default::default()
    };
    let row = draft.to_row();
    assert_eq!(row["video_url"], Value::String("https://vimeo.com/1".into()));
    assert!(!row.contains_key("video"));
  }

  #[test]
  fn test_empty_video_is_null() {
    let row = ProjectDraft::default().to_row();
    assert_eq!(row["video_url"], Value::Null);
  }

  #[test]
  fn test_diff_only_changed_fields() {
    let before = EmployeeDraft {
      name: "A. Rao".into(),
      designation: "Site Engineer".into(),
      description: "10 years experience".into(),
      image: "https://cdn/x.jpg".into(),
    };
    let mut after = before.clone();
    after.designation = "Project Manager".into();

    let patch = Patch::diff(&before, &after);
    assert_eq!(patch.len(), 1);

    let row = patch.to_row::<EmployeeDraft>();
    assert_eq!(row.len(), 1);
    assert_eq!(row["designation"], Value::String("Project Manager".into()));
  }

  #[test]
  fn test_patch_with_unknown_field_is_dropped() {
    let mut patch = Patch::new();
    patch.set("nonexistent", FieldValue::Text("x".into()));
    assert!(patch.to_row::<TestimonialDraft>().is_empty());
  }

  #[test]
  fn test_gallery_encodes_as_array() {
    let draft = ProjectDraft {
      images: vec!["a".into(), "b".into()],
      ..Default::default()
    };
    assert_eq!(draft.to_row()["images"], serde_json::json!(["a", "b"]));
  }
}
