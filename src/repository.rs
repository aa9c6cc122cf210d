//! Generic CRUD over one entity's remote table.

use crate::backend::RecordStore;
use crate::error::RepositoryError;
use crate::model::{Draft, Entity, Patch};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Create/read/update/delete for entity `E`.
///
/// Field names are translated to column names through `E::Draft::FIELDS`.
/// No operation retries, and `delete` never touches attachments.
pub struct Repository<E: Entity> {
  store: Arc<dyn RecordStore>,
  _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      _entity: PhantomData,
    }
  }
}

impl<E: Entity> Repository<E> {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self {
      store,
      _entity: PhantomData,
    }
  }

  /// All records, newest first
  pub async fn list(&self) -> Result<Vec<E>, RepositoryError> {
    let rows = self.store.select(E::TABLE).await?;
    debug!(table = E::TABLE, count = rows.len(), "listed");

    rows
      .into_iter()
      .map(|row| {
        serde_json::from_value::<E>(row)
          .map_err(|e| RepositoryError::Decode(format!("{}: {}", E::SINGULAR, e)))
      })
      .collect()
  }

  pub async fn create(&self, draft: &E::Draft) -> Result<(), RepositoryError> {
    self.store.insert(E::TABLE, draft.to_row()).await?;
    info!(table = E::TABLE, name = draft.display_name(), "created");
    Ok(())
  }

  /// Writes only the fields present in `patch`.
  pub async fn update(&self, id: &str, patch: &Patch) -> Result<(), RepositoryError> {
    let row = patch.to_row::<E::Draft>();
    self.store.update(E::TABLE, id, row).await?;
    info!(table = E::TABLE, %id, fields = patch.len(), "updated");
    Ok(())
  }

  pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
    self.store.delete(E::TABLE, id).await?;
    info!(table = E::TABLE, %id, "deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::{Call, MemoryBackend};
  use crate::model::{Employee, FieldValue, Project, ProjectDraft};
  use serde_json::{json, Value};

  fn repo<E: Entity>(backend: &Arc<MemoryBackend>) -> Repository<E> {
    Repository::new(backend.clone())
  }

  fn project_draft() -> ProjectDraft {
    ProjectDraft {
      name: "Lakeview Towers".into(),
      description: "Twin towers".into(),
      details: "18 floors".into(),
      images: vec!["https://cdn/a.jpg".into(), "https://cdn/b.jpg".into()],
      video: "https://vimeo.com/12345".into(),
    }
  }

  #[tokio::test]
  async fn test_create_then_list_round_trips_columns() {
    let backend = Arc::new(MemoryBackend::new());
    let projects = repo::<Project>(&backend);

    projects.create(&project_draft()).await.unwrap();

    let listed = projects.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].video.as_deref(), Some("https://vimeo.com/12345"));
    assert_eq!(listed[0].cover(), Some("https://cdn/a.jpg"));

    let Call::Insert(table, row) = &backend.calls()[0] else {
      panic!("expected insert");
    };
    assert_eq!(table, "projects");
    assert!(row.contains_key("video_url"));
  }

  #[tokio::test]
  async fn test_list_is_newest_first() {
    let backend = Arc::new(MemoryBackend::new());
    let employees = repo::<Employee>(&backend);
    for name in ["first", "second", "third"] {
      backend.seed("employees", json!({ "name": name }).as_object().unwrap().clone());
    }

    let names: Vec<_> = employees
      .list()
      .await
      .unwrap()
      .into_iter()
      .map(|e| e.name)
      .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
  }

  #[tokio::test]
  async fn test_update_sends_only_provided_fields() {
    let backend = Arc::new(MemoryBackend::new());
    let projects = repo::<Project>(&backend);
    projects.create(&project_draft()).await.unwrap();
    let id = projects.list().await.unwrap()[0].id.clone();

    let mut patch = Patch::new();
    patch.set("video", FieldValue::Text(String::new()));
    projects.update(&id, &patch).await.unwrap();

    let Some(Call::Update(_, _, row)) = backend.calls().into_iter().last() else {
      panic!("expected update");
    };
    assert_eq!(row.len(), 1);
    assert_eq!(row["video_url"], Value::Null);

    // Untouched fields survive
    let listed = projects.list().await.unwrap();
    assert_eq!(listed[0].images.len(), 2);
    assert_eq!(listed[0].video, None);
  }

  #[tokio::test]
  async fn test_remote_failure_carries_message() {
    let backend = Arc::new(MemoryBackend::new());
    backend.fail("insert", "permission denied for table projects");

    let err = repo::<Project>(&backend)
      .create(&project_draft())
      .await
      .unwrap_err();
    assert_eq!(
      err,
      RepositoryError::remote("permission denied for table projects")
    );
    // No retry
    assert_eq!(backend.calls().len(), 1);
  }

  #[tokio::test]
  async fn test_undecodable_row_is_decode_error() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed("employees", json!({ "name": 42 }).as_object().unwrap().clone());

    let err = repo::<Employee>(&backend).list().await.unwrap_err();
    assert!(matches!(err, RepositoryError::Decode(_)));
  }

  #[tokio::test]
  async fn test_delete_leaves_attachments_alone() {
    let backend = Arc::new(MemoryBackend::new());
    let url = backend.seed_object("a.jpg");
    let id = backend.seed(
      "employees",
      json!({ "name": "A", "image": url }).as_object().unwrap().clone(),
    );

    repo::<Employee>(&backend).delete(&id).await.unwrap();

    assert!(backend.rows("employees").is_empty());
    assert_eq!(backend.object_keys(), vec!["a.jpg".to_string()]);
  }
}
