use super::{null_as_default, require_text, Draft, Entity, FieldKind, FieldSpec, FieldValue};
use crate::error::FieldErrors;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Team member shown on the public site
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Employee {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub designation: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub image: String,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeDraft {
  pub name: String,
  pub designation: String,
  pub description: String,
  pub image: String,
}

impl Draft for EmployeeDraft {
  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::new("name", "Full Name", FieldKind::Text),
    FieldSpec::new("designation", "Designation", FieldKind::Text),
    FieldSpec::new("description", "Description", FieldKind::LongText),
    FieldSpec::new("image", "Profile Image", FieldKind::Image),
  ];

  fn value(&self, field: &str) -> FieldValue {
    match field {
      "name" => FieldValue::Text(self.name.clone()),
      "designation" => FieldValue::Text(self.designation.clone()),
      "description" => FieldValue::Text(self.description.clone()),
      "image" => FieldValue::Image(Some(self.image.clone()).filter(|s| !s.is_empty())),
      _ => FieldValue::Text(String::new()),
    }
  }

  fn set_value(&mut self, field: &str, value: FieldValue) {
    match (field, value) {
      ("name", FieldValue::Text(s)) => self.name = s,
      ("designation", FieldValue::Text(s)) => self.designation = s,
      ("description", FieldValue::Text(s)) => self.description = s,
      ("image", FieldValue::Image(url)) => self.image = url.unwrap_or_default(),
      _ => {}
    }
  }

  fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "name", &self.name, "Name is required");
    require_text(
      &mut errors,
      "description",
      &self.description,
      "Description is required",
    );
    if self.image.is_empty() {
      errors.insert("image", "Image is required".to_string());
    }
    errors
  }

  fn display_name(&self) -> &str {
    &self.name
  }
}

impl Entity for Employee {
  type Draft = EmployeeDraft;

  const TABLE: &'static str = "employees";
  const SINGULAR: &'static str = "employee";
  const PLURAL: &'static str = "employees";

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> &str {
    &self.name
  }

  fn attachments(&self) -> Vec<String> {
    if self.image.is_empty() {
      Vec::new()
    } else {
      vec![self.image.clone()]
    }
  }

  fn to_draft(&self) -> EmployeeDraft {
    EmployeeDraft {
      name: self.name.clone(),
      designation: self.designation.clone(),
      description: self.description.clone(),
      image: self.image.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn filled() -> EmployeeDraft {
    EmployeeDraft {
      name: "A. Rao".into(),
      designation: "Site Engineer".into(),
      description: "10 years experience".into(),
      image: "https://cdn.example/storage/v1/object/public/images/a.jpg".into(),
    }
  }

  #[test]
  fn test_filled_draft_is_valid() {
    assert!(filled().validate().is_empty());
  }

  #[test]
  fn test_every_empty_required_field_reported() {
    // Check every subset of the three required fields
    for mask in 0u8..8 {
      let mut draft = filled();
      if mask & 1 != 0 {
        draft.name = "   ".into();
      }
      if mask & 2 != 0 {
        draft.description.clear();
      }
      if mask & 4 != 0 {
        draft.image.clear();
      }

      let errors = draft.validate();
      assert_eq!(errors.contains_key("name"), mask & 1 != 0, "mask {mask}");
      assert_eq!(errors.contains_key("description"), mask & 2 != 0, "mask {mask}");
      assert_eq!(errors.contains_key("image"), mask & 4 != 0, "mask {mask}");
      assert_eq!(errors.len(), mask.count_ones() as usize);
    }
  }

  #[test]
  fn test_designation_is_optional() {
    let draft = EmployeeDraft {
      designation: String::new(),
      ..filled()
    };
    assert!(draft.validate().is_empty());
  }

  #[test]
  fn test_decode_row_with_nulls() {
    let row = serde_json::json!({
      "id": "e1",
      "name": "A. Rao",
      "designation": null,
      "description": "d",
      "image": "https://cdn/x.jpg",
      "created_at": "2024-03-01T10:00:00+00:00"
    });
    let employee: Employee = serde_json::from_value(row).unwrap();
    assert_eq!(employee.designation, "");
    assert!(employee.created_at.is_some());
  }

  #[test]
  fn test_set_value_ignores_kind_mismatch() {
    let mut draft = filled();
    draft.set_value("image", FieldValue::Text("nope".into()));
    assert_eq!(draft, filled());
  }
}
