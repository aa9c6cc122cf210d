use super::{null_as_default, require_text, Draft, Entity, FieldKind, FieldSpec, FieldValue};
use crate::error::FieldErrors;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Client review
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Testimonial {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub image: String,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestimonialDraft {
  pub name: String,
  pub description: String,
  pub image: String,
}

impl Draft for TestimonialDraft {
  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::new("name", "Client Name", FieldKind::Text),
    FieldSpec::new("description", "Testimonial", FieldKind::LongText),
    FieldSpec::new("image", "Client Image", FieldKind::Image),
  ];

  fn value(&self, field: &str) -> FieldValue {
    match field {
      "name" => FieldValue::Text(self.name.clone()),
      "description" => FieldValue::Text(self.description.clone()),
      "image" => FieldValue::Image(Some(self.image.clone()).filter(|s| !s.is_empty())),
      _ => FieldValue::Text(String::new()),
    }
  }

  fn set_value(&mut self, field: &str, value: FieldValue) {
    match (field, value) {
      ("name", FieldValue::Text(s)) => self.name = s,
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
      "Testimonial text is required",
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

impl Entity for Testimonial {
  type Draft = TestimonialDraft;

  const TABLE: &'static str = "testimonials";
  const SINGULAR: &'static str = "testimonial";
  const PLURAL: &'static str = "testimonials";

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

  fn to_draft(&self) -> TestimonialDraft {
    TestimonialDraft {
      name: self.name.clone(),
      description: self.description.clone(),
      image: self.image.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_draft_reports_all_fields() {
    let errors = TestimonialDraft::default().validate();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors["description"], "Testimonial text is required");
  }

  #[test]
  fn test_only_missing_image_reported() {
    let draft = TestimonialDraft {
      name: "R. Iyer".into(),
      description: "Delivered on time.".into(),
      image: String::new(),
    };
    let errors = draft.validate();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["image"], "Image is required");
  }
}
