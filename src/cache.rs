//! In-memory entity cache with refetch-on-write.
//!
//! The cache is the single source of truth the views render from. It never
//! patches cached records locally: every successful mutation is followed by
//! a full `list()` of that collection, and the result replaces the cached
//! collection wholesale.
//!
//! Mutations are not serialized. Two overlapping mutations on the same
//! collection each trigger a refetch, and whichever refetch resolves last
//! wins, even if it was issued first.

use crate::backend::RecordStore;
use crate::error::RepositoryError;
use crate::model::{Employee, Entity, Patch, Project, Testimonial};
use crate::notify::Notifier;
use crate::repository::Repository;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

/// One cached collection and whether a fetch for it is in flight
#[derive(Debug, Clone)]
pub struct Collection<E> {
  pub items: Vec<E>,
  pub loading: bool,
}

impl<E> Default for Collection<E> {
  /// Empty and loading: nothing has been fetched yet
  fn default() -> Self {
    Self {
      items: Vec::new(),
      loading: true,
    }
  }
}

#[derive(Default)]
pub struct Collections {
  employees: RwLock<Collection<Employee>>,
  projects: RwLock<Collection<Project>>,
  testimonials: RwLock<Collection<Testimonial>>,
}

/// Entities that have a slot in the cache
pub trait Cached: Entity {
  fn slot(collections: &Collections) -> &RwLock<Collection<Self>>;
}

impl Cached for Employee {
  fn slot(collections: &Collections) -> &RwLock<Collection<Self>> {
    &collections.employees
  }
}

impl Cached for Project {
  fn slot(collections: &Collections) -> &RwLock<Collection<Self>> {
    &collections.projects
  }
}

impl Cached for Testimonial {
  fn slot(collections: &Collections) -> &RwLock<Collection<Self>> {
    &collections.testimonials
  }
}

/// Verb used in failure notifications
#[derive(Debug, Clone, Copy)]
enum Mutation {
  Add,
  Update,
  Delete,
}

impl Mutation {
  fn verb(self) -> &'static str {
    match self {
      Mutation::Add => "adding",
      Mutation::Update => "updating",
      Mutation::Delete => "deleting",
    }
  }
}

/// Shared cache of every entity collection.
///
/// Built once at startup and handed to the views that need it.
pub struct EntityCache {
  store: Arc<dyn RecordStore>,
  collections: Collections,
  notifier: Notifier,
}

impl EntityCache {
  pub fn new(store: Arc<dyn RecordStore>, notifier: Notifier) -> Self {
    Self {
      store,
      collections: Collections::default(),
      notifier,
    }
  }

  fn repo<E: Cached>(&self) -> Repository<E> {
    Repository::new(Arc::clone(&self.store))
  }

  fn read<E: Cached>(&self) -> RwLockReadGuard<'_, Collection<E>> {
    E::slot(&self.collections)
      .read()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn write<E: Cached>(&self) -> RwLockWriteGuard<'_, Collection<E>> {
    E::slot(&self.collections)
      .write()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Fetch every collection concurrently.
  pub async fn load_all(&self) {
    let _ = tokio::join!(
      self.refresh::<Employee>(),
      self.refresh::<Project>(),
      self.refresh::<Testimonial>(),
    );
  }

  /// Copy of a collection for rendering
  pub fn snapshot<E: Cached>(&self) -> Collection<E> {
    self.read::<E>().clone()
  }

  pub fn items<E: Cached>(&self) -> Vec<E> {
    self.read::<E>().items.clone()
  }

  pub fn is_loading<E: Cached>(&self) -> bool {
    self.read::<E>().loading
  }

  pub fn len<E: Cached>(&self) -> usize {
    self.read::<E>().items.len()
  }

  pub fn find<E: Cached>(&self, id: &str) -> Option<E> {
    self.read::<E>().items.iter().find(|e| e.id() == id).cloned()
  }

  /// Re-run `list()` and replace the collection.
  ///
  /// On failure the previous items stay, the loading flag clears, and the
  /// user is notified.
  pub async fn refresh<E: Cached>(&self) -> Result<(), RepositoryError> {
    self.write::<E>().loading = true;
    let result = self.repo::<E>().list().await;

    let mut slot = self.write::<E>();
    slot.loading = false;
    match result {
      Ok(items) => {
        debug!(table = E::TABLE, count = items.len(), "collection replaced");
        slot.items = items;
        Ok(())
      }
      Err(e) => {
        drop(slot);
        error!(table = E::TABLE, error = %e, "fetch failed");
        self
          .notifier
          .error(format!("Error fetching {}", E::PLURAL), "Please try again later");
        Err(e)
      }
    }
  }

  pub async fn add<E: Cached>(&self, draft: &E::Draft) -> Result<(), RepositoryError> {
    let result = self.repo::<E>().create(draft).await;
    self.after_mutation::<E>(Mutation::Add, result).await
  }

  pub async fn update<E: Cached>(&self, id: &str, patch: &Patch) -> Result<(), RepositoryError> {
    let result = self.repo::<E>().update(id, patch).await;
    self.after_mutation::<E>(Mutation::Update, result).await
  }

  pub async fn delete<E: Cached>(&self, id: &str) -> Result<(), RepositoryError> {
    let result = self.repo::<E>().delete(id).await;
    self.after_mutation::<E>(Mutation::Delete, result).await
  }

  /// Refetch after a successful write; report a failed one and leave the
  /// collection as it was.
  async fn after_mutation<E: Cached>(
    &self,
    mutation: Mutation,
    result: Result<(), RepositoryError>,
  ) -> Result<(), RepositoryError> {
    match result {
      Ok(()) => {
        // The write landed; a failed refetch is reported by refresh itself
        let _ = self.refresh::<E>().await;
        Ok(())
      }
      Err(e) => {
        error!(table = E::TABLE, ?mutation, error = %e, "mutation failed");
        self.notifier.error(
          format!("Error {} {}", mutation.verb(), E::SINGULAR),
          e.to_string(),
        );
        Err(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::{Call, MemoryBackend};
  use crate::model::{EmployeeDraft, FieldValue};
  use crate::notify::{drain, Level, Notification};
  use serde_json::json;
  use std::time::Duration;
  use tokio::sync::mpsc::UnboundedReceiver;

  fn cache() -> (
    Arc<EntityCache>,
    Arc<MemoryBackend>,
    UnboundedReceiver<Notification>,
  ) {
    let backend = Arc::new(MemoryBackend::new());
    let (notifier, rx) = Notifier::channel();
    let cache = Arc::new(EntityCache::new(backend.clone(), notifier));
    (cache, backend, rx)
  }

  fn draft(name: &str) -> EmployeeDraft {
    EmployeeDraft {
      name: name.into(),
      designation: "Site Engineer".into(),
      description: "10 years experience".into(),
      image: format!("{}{}.jpg", MemoryBackend::URL_PREFIX, name),
    }
  }

  async fn fresh_list(backend: &Arc<MemoryBackend>) -> Vec<Employee> {
    Repository::<Employee>::new(backend.clone())
      .list()
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn test_collections_start_loading() {
    let (cache, _, _) = cache();
    assert!(cache.is_loading::<Employee>());
    assert!(cache.is_loading::<Project>());
    assert!(cache.is_loading::<Testimonial>());
  }

  #[tokio::test]
  async fn test_load_all_fetches_every_collection() {
    let (cache, backend, _) = cache();
    backend.seed("projects", json!({ "name": "Tower" }).as_object().unwrap().clone());

    cache.load_all().await;

    assert!(!cache.is_loading::<Employee>());
    assert!(!cache.is_loading::<Project>());
    assert!(!cache.is_loading::<Testimonial>());
    assert_eq!(cache.len::<Project>(), 1);

    let mut tables: Vec<_> = backend
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::Select(t) => Some(t),
        _ => None,
      })
      .collect();
    tables.sort();
    assert_eq!(tables, vec!["employees", "projects", "testimonials"]);
  }

  #[tokio::test]
  async fn test_failed_initial_fetch_clears_flag_and_notifies() {
    let (cache, backend, mut rx) = cache();
    backend.fail("select", "connection refused");

    cache.load_all().await;

    assert!(!cache.is_loading::<Employee>());
    assert!(cache.items::<Employee>().is_empty());
    let titles: Vec<_> = drain(&mut rx).into_iter().map(|n| n.title).collect();
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"Error fetching employees".to_string()));
  }

  #[tokio::test]
  async fn test_loading_flag_set_while_fetch_in_flight() {
    let (cache, backend, _) = cache();
    cache.load_all().await;
    backend.delay_selects([Duration::from_millis(100)]);

    let task = tokio::spawn({
      let cache = cache.clone();
      async move { cache.refresh::<Employee>().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cache.is_loading::<Employee>());

    task.await.unwrap().unwrap();
    assert!(!cache.is_loading::<Employee>());
  }

  #[tokio::test]
  async fn test_mutations_refetch_and_replace() {
    let (cache, backend, _) = cache();
    cache.load_all().await;

    cache.add::<Employee>(&draft("first")).await.unwrap();
    cache.add::<Employee>(&draft("second")).await.unwrap();
    assert_eq!(cache.items::<Employee>(), fresh_list(&backend).await);
    assert_eq!(cache.items::<Employee>()[0].name, "second");

    let id = cache.items::<Employee>()[1].id.clone();
    let mut patch = Patch::new();
    patch.set("designation", FieldValue::Text("Foreman".into()));
    cache.update::<Employee>(&id, &patch).await.unwrap();
    assert_eq!(cache.items::<Employee>(), fresh_list(&backend).await);
    assert_eq!(cache.find::<Employee>(&id).unwrap().designation, "Foreman");

    cache.delete::<Employee>(&id).await.unwrap();
    assert_eq!(cache.items::<Employee>(), fresh_list(&backend).await);
    assert!(cache.find::<Employee>(&id).is_none());
  }

  #[tokio::test]
  async fn test_cache_reflects_server_not_local_patch() {
    let (cache, backend, _) = cache();
    cache.load_all().await;

    // A row written by someone else shows up with our own write's refetch
    backend.seed("employees", json!({ "name": "other session" }).as_object().unwrap().clone());
    cache.add::<Employee>(&draft("mine")).await.unwrap();

    let names: Vec<_> = cache.items::<Employee>().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["mine", "other session"]);
  }

  #[tokio::test]
  async fn test_failed_mutation_leaves_collection_untouched() {
    let (cache, backend, mut rx) = cache();
    cache.add::<Employee>(&draft("kept")).await.unwrap();
    let before = cache.items::<Employee>();
    drain(&mut rx);
    backend.clear_calls();
    backend.fail("insert", "new row violates row-level security policy");

    let err = cache.add::<Employee>(&draft("lost")).await.unwrap_err();

    assert_eq!(
      err.to_string(),
      "new row violates row-level security policy"
    );
    assert_eq!(cache.items::<Employee>(), before);
    assert!(!cache.is_loading::<Employee>());
    // No refetch after a failed write
    assert!(!backend.calls().iter().any(|c| matches!(c, Call::Select(_))));

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Error);
    assert_eq!(notes[0].title, "Error adding employee");
  }

  #[tokio::test]
  async fn test_failed_refetch_after_write_keeps_write() {
    let (cache, backend, mut rx) = cache();
    cache.load_all().await;
    backend.fail("select", "timeout");

    cache.add::<Employee>(&draft("written")).await.unwrap();

    assert_eq!(backend.rows("employees").len(), 1);
    assert!(cache.items::<Employee>().is_empty());
    assert_eq!(drain(&mut rx)[0].title, "Error fetching employees");
  }

  /// Overlapping mutations are not serialized: the refetch that resolves
  /// last replaces the collection, even when it carries older data.
  #[tokio::test]
  async fn test_overlapping_mutations_last_refetch_wins() {
    let (cache, backend, _) = cache();
    cache.load_all().await;
    // First refetch answers slowly with the state right after the first
    // insert; the second answers at once with both rows.
    backend.delay_selects([Duration::from_millis(80), Duration::ZERO]);

    let (a, b) = (draft("a"), draft("b"));
    let first = cache.add::<Employee>(&a);
    let second = async {
      tokio::time::sleep(Duration::from_millis(10)).await;
      cache.add::<Employee>(&b).await
    };
    let (r1, r2) = tokio::join!(first, second);
    r1.unwrap();
    r2.unwrap();

    assert_eq!(backend.rows("employees").len(), 2);
    let cached: Vec<_> = cache.items::<Employee>().into_iter().map(|e| e.name).collect();
    assert_eq!(cached, vec!["a"]);
  }
}
