use super::{null_as_default, require_text, Draft, Entity, FieldKind, FieldSpec, FieldValue};
use crate::error::FieldErrors;
use crate::video;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Upper bound on gallery size
pub const MAX_PROJECT_IMAGES: usize = 10;

/// Portfolio item
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub details: String,
  /// First image is the cover thumbnail
  #[serde(default, deserialize_with = "null_as_default")]
  pub images: Vec<String>,
  #[serde(rename = "video_url", default)]
  pub video: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl Project {
  pub fn cover(&self) -> Option<&str> {
    self.images.first().map(String::as_str)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
  pub name: String,
  pub description: String,
  pub details: String,
  pub images: Vec<String>,
  /// Empty means no video
  pub video: String,
}

impl Draft for ProjectDraft {
  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::new("name", "Project Name", FieldKind::Text),
    FieldSpec::new("description", "Short Description", FieldKind::LongText),
    FieldSpec::new("details", "Project Details", FieldKind::LongText),
    FieldSpec::new("video", "Video URL (YouTube or Vimeo)", FieldKind::VideoUrl)
      .stored_as("video_url"),
    FieldSpec::new(
      "images",
      "Project Images",
      FieldKind::Gallery {
        max: MAX_PROJECT_IMAGES,
      },
    ),
  ];

  fn value(&self, field: &str) -> FieldValue {
    match field {
      "name" => FieldValue::Text(self.name.clone()),
      "description" => FieldValue::Text(self.description.clone()),
      "details" => FieldValue::Text(self.details.clone()),
      "video" => FieldValue::Text(self.video.clone()),
      "images" => FieldValue::Gallery(self.images.clone()),
      _ => FieldValue::Text(String::new()),
    }
  }

  fn set_value(&mut self, field: &str, value: FieldValue) {
    match (field, value) {
      ("name", FieldValue::Text(s)) => self.name = s,
      ("description", FieldValue::Text(s)) => self.description = s,
      ("details", FieldValue::Text(s)) => self.details = s,
      ("video", FieldValue::Text(s)) => self.video = s,
      ("images", FieldValue::Gallery(urls)) => self.images = urls,
      _ => {}
    }
  }

  fn validate(&self) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "name", &self.name, "Project name is required");
    require_text(
      &mut errors,
      "description",
      &self.description,
      "Description is required",
    );
    require_text(&mut errors, "details", &self.details, "Details are required");

    if self.images.is_empty() {
      errors.insert("images", "At least one image is required".to_string());
    } else if self.images.len() > MAX_PROJECT_IMAGES {
      errors.insert(
        "images",
        format!("Maximum {} images allowed", MAX_PROJECT_IMAGES),
      );
    }

    // Optional; only its shape is checked
    if !self.video.is_empty() && !video::is_recognized(&self.video) {
      errors.insert(
        "video",
        "Please enter a valid YouTube or Vimeo URL".to_string(),
      );
    }
    errors
  }

  fn display_name(&self) -> &str {
    &self.name
  }
}

impl Entity for Project {
  type Draft = ProjectDraft;

  const TABLE: &'static str = "projects";
  const SINGULAR: &'static str = "project";
  const PLURAL: &'static str = "projects";

  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> &str {
    &self.name
  }

  fn attachments(&self) -> Vec<String> {
    self.images.clone()
  }

  fn to_draft(&self) -> ProjectDraft {
    ProjectDraft {
      name: self.name.clone(),
      description: self.description.clone(),
      details: self.details.clone(),
      images: self.images.clone(),
      video: self.video.clone().unwrap_or_default(),
    }
  }
}
