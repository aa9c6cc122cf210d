//! Create/edit form state machine, generic over the entity.
//!
//! ```text
//! Loading ──(entity found in cache)──> Editing ──> Validating ──> Submitting
//!    │                                   ^            │              │
//!    └──(cache loaded, no such id)──> Missing         └─(errors)─────┤
//!                                                      (failure) ────┘
//!                                                      (success) ──> Succeeded
//! ```
//!
//! The remote half of a submission is split out as [`Submission`] so the UI
//! can run it in the background while the controller stays in `Submitting`.

use crate::cache::{Cached, EntityCache};
use crate::error::{FieldErrors, RepositoryError, ValidationError};
use crate::lifecycle::capitalize;
use crate::model::{Draft, Entity, FieldValue, Patch};
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Create,
  Edit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Edit target not in the cache yet
  Loading,
  Editing,
  Validating,
  Submitting,
  Succeeded,
  /// Cache finished loading without the edit target
  Missing,
}

/// Remote work for one validated submit
#[derive(Debug, Clone)]
pub enum Submission<D> {
  Create(D),
  Update { id: String, patch: Patch },
}

impl<D: Draft> Submission<D> {
  /// Run against the cache. An update with nothing changed skips the call.
  pub async fn execute<E>(self, cache: Arc<EntityCache>) -> Result<(), RepositoryError>
  where
    E: Cached<Draft = D>,
  {
    match self {
      Submission::Create(draft) => cache.add::<E>(&draft).await,
      Submission::Update { patch, .. } if patch.is_empty() => {
        debug!(table = E::TABLE, "nothing changed, skipping update");
        Ok(())
      }
      Submission::Update { id, patch } => cache.update::<E>(&id, &patch).await,
    }
  }
}

pub struct FormController<E: Entity> {
  mode: Mode,
  phase: Phase,
  draft: E::Draft,
  /// Values as loaded, for computing the update diff
  original: Option<E::Draft>,
  errors: FieldErrors,
  notifier: Notifier,
}

impl<E: Cached> FormController<E> {
  pub fn create(notifier: Notifier) -> Self {
    Self {
      mode: Mode::Create,
      phase: Phase::Editing,
      draft: E::Draft::default(),
      original: None,
      errors: FieldErrors::new(),
      notifier,
    }
  }

  pub fn edit(id: impl Into<String>, notifier: Notifier) -> Self {
    Self {
      mode: Mode::Edit(id.into()),
      phase: Phase::Loading,
      draft: E::Draft::default(),
      original: None,
      errors: FieldErrors::new(),
      notifier,
    }
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn draft(&self) -> &E::Draft {
    &self.draft
  }

  #[cfg(test)]
  pub fn errors(&self) -> &FieldErrors {
    &self.errors
  }

  pub fn error(&self, field: &str) -> Option<&str> {
    self.errors.get(field).map(String::as_str)
  }

  pub fn value(&self, field: &str) -> FieldValue {
    self.draft.value(field)
  }

  pub fn is_submitting(&self) -> bool {
    self.phase == Phase::Submitting
  }

  /// Whether fields accept input
  pub fn is_editable(&self) -> bool {
    self.phase == Phase::Editing
  }

  /// Populate from the cache once the edit target shows up.
  ///
  /// Only acts while `Loading`; later refreshes never overwrite the draft.
  pub fn sync(&mut self, cache: &EntityCache) {
    let Mode::Edit(id) = &self.mode else {
      return;
    };
    if self.phase != Phase::Loading {
      return;
    }

    if let Some(entity) = cache.find::<E>(id) {
      debug!(table = E::TABLE, %id, "form populated");
      self.draft = entity.to_draft();
      self.original = Some(self.draft.clone());
      self.phase = Phase::Editing;
    } else if !cache.is_loading::<E>() {
      self.phase = Phase::Missing;
    }
  }

  /// Set a field and clear its message. Ignored unless editing.
  pub fn set_value(&mut self, field: &str, value: FieldValue) {
    if !self.is_editable() {
      return;
    }
    self.draft.set_value(field, value);
    self.errors.remove(field);
  }

  /// Validate and move to `Submitting`.
  ///
  /// Returns `None` while a submission is already in flight, when the form
  /// is not editable, or when validation fails.
  pub fn begin_submit(&mut self) -> Option<Submission<E::Draft>> {
    if self.phase != Phase::Editing {
      return None;
    }

    self.phase = Phase::Validating;
    if let Err(e) = self.validate() {
      debug!(table = E::TABLE, error = %e, errors = ?self.errors, "validation failed");
      self
        .notifier
        .error("Validation Error", "Please correct the errors in the form");
      self.phase = Phase::Editing;
      return None;
    }

    self.phase = Phase::Submitting;
    Some(match &self.mode {
      Mode::Create => Submission::Create(self.draft.clone()),
      Mode::Edit(id) => {
        let before = self.original.clone().unwrap_or_default();
        Submission::Update {
          id: id.clone(),
          patch: Patch::diff(&before, &self.draft),
        }
      }
    })
  }

  /// Check every field; the messages stay on the form for display.
  fn validate(&mut self) -> Result<(), ValidationError> {
    self.errors = self.draft.validate();
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(ValidationError::Fields(self.errors.clone()))
    }
  }

  /// Apply the outcome of a submission.
  pub fn finish(&mut self, result: Result<(), RepositoryError>) {
    let name = self.draft.display_name().to_string();
    let (done, verb) = match self.mode {
      Mode::Create => ("Added", "add"),
      Mode::Edit(_) => ("Updated", "update"),
    };

    match result {
      Ok(()) => {
        info!(table = E::TABLE, %name, "form submitted");
        self.phase = Phase::Succeeded;
        self.notifier.success(
          format!("{} {}", capitalize(E::SINGULAR), done),
          format!("{} has been {} successfully.", name, done.to_lowercase()),
        );
      }
      Err(_) => {
        self.phase = Phase::Editing;
        self.notifier.error(
          "Error",
          format!("Failed to {} {}. Please try again.", verb, E::SINGULAR),
        );
      }
    }
  }

  /// Validate, submit and apply the outcome in one go.
  #[cfg(test)]
  pub async fn submit(&mut self, cache: Arc<EntityCache>) -> Phase {
    if let Some(submission) = self.begin_submit() {
      let result = submission.execute::<E>(cache).await;
      self.finish(result);
    }
    self.phase
  }
}
