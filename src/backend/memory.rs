//! In-memory stand-in for the hosted services, used by tests.
//!
//! Records every call, can be told to fail a given operation, and can delay
//! `select` responses. A delayed select snapshots the table *before*
//! sleeping, like a response that was computed early but delivered late.

use super::{AuthProvider, ObjectStore, RecordStore, Row};
use crate::error::{AuthError, RepositoryError, StoreError};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
  Select(String),
  Insert(String, Row),
  Update(String, String, Row),
  Delete(String, String),
  Put(String),
  DeleteObjects(Vec<String>),
  SignIn(String),
  SignOut,
}

#[derive(Default)]
pub struct MemoryBackend {
  tables: Mutex<HashMap<String, Vec<Row>>>,
  objects: Mutex<BTreeMap<String, (String, usize)>>,
  calls: Mutex<Vec<Call>>,
  failures: Mutex<HashMap<&'static str, String>>,
  select_delays: Mutex<VecDeque<Duration>>,
  clock: Mutex<i64>,
}

impl MemoryBackend {
  pub const PASSWORD: &'static str = "correct horse";
  pub const URL_PREFIX: &'static str = "https://cdn.test/storage/v1/object/public/images/";

  pub fn new() -> Self {
    Self::default()
  }

  /// Make every call of `op` fail with `message` until cleared.
  /// Ops: select, insert, update, delete, put, remove.
  pub fn fail(&self, op: &'static str, message: &str) {
    self.failures.lock().unwrap().insert(op, message.to_string());
  }

  pub fn clear_failures(&self) {
    self.failures.lock().unwrap().clear();
  }

  /// Delays applied to the next selects, in order
  pub fn delay_selects(&self, delays: impl IntoIterator<Item = Duration>) {
    self.select_delays.lock().unwrap().extend(delays);
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn clear_calls(&self) {
    self.calls.lock().unwrap().clear();
  }

  pub fn object_keys(&self) -> Vec<String> {
    self.objects.lock().unwrap().keys().cloned().collect()
  }

  pub fn rows(&self, table: &str) -> Vec<Row> {
    self
      .tables
      .lock()
      .unwrap()
      .get(table)
      .cloned()
      .unwrap_or_default()
  }

  /// Insert a row directly, bypassing the call log
  pub fn seed(&self, table: &str, mut row: Row) -> String {
    let id = row
      .get("id")
      .and_then(Value::as_str)
      .map(String::from)
      .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    row.insert("id".into(), Value::String(id.clone()));
    row.insert("created_at".into(), Value::String(self.tick()));
    self
      .tables
      .lock()
      .unwrap()
      .entry(table.to_string())
      .or_default()
      .push(row);
    id
  }

  /// Put an object directly, bypassing the call log
  pub fn seed_object(&self, key: &str) -> String {
    self
      .objects
      .lock()
      .unwrap()
      .insert(key.to_string(), ("image/jpeg".into(), 1));
    format!("{}{}", Self::URL_PREFIX, key)
  }

  /// Strictly increasing creation timestamps
  fn tick(&self) -> String {
    let mut clock = self.clock.lock().unwrap();
    *clock += 1;
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (base + ChronoDuration::seconds(*clock)).to_rfc3339()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }

  fn failure(&self, op: &str) -> Option<String> {
    self.failures.lock().unwrap().get(op).cloned()
  }
}

#[async_trait]
impl RecordStore for MemoryBackend {
  async fn select(&self, table: &str) -> Result<Vec<Value>, RepositoryError> {
    self.record(Call::Select(table.to_string()));
    if let Some(msg) = self.failure("select") {
      return Err(RepositoryError::remote(msg));
    }

    let mut rows = self.rows(table);
    rows.sort_by(|a, b| {
      let key = |r: &Row| r.get("created_at").and_then(Value::as_str).map(String::from);
      key(b).cmp(&key(a))
    });
    let snapshot: Vec<Value> = rows.into_iter().map(Value::Object).collect();

    let delay = self.select_delays.lock().unwrap().pop_front();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    Ok(snapshot)
  }

  async fn insert(&self, table: &str, row: Row) -> Result<(), RepositoryError> {
    self.record(Call::Insert(table.to_string(), row.clone()));
    if let Some(msg) = self.failure("insert") {
      return Err(RepositoryError::remote(msg));
    }
    self.seed(table, row);
    Ok(())
  }

  async fn update(&self, table: &str, id: &str, row: Row) -> Result<(), RepositoryError> {
    self.record(Call::Update(table.to_string(), id.to_string(), row.clone()));
    if let Some(msg) = self.failure("update") {
      return Err(RepositoryError::remote(msg));
    }

    let mut tables = self.tables.lock().unwrap();
    if let Some(existing) = tables
      .get_mut(table)
      .and_then(|rows| rows.iter_mut().find(|r| r.get("id") == Some(&Value::from(id))))
    {
      existing.extend(row);
    }
    Ok(())
  }

  async fn delete(&self, table: &str, id: &str) -> Result<(), RepositoryError> {
    self.record(Call::Delete(table.to_string(), id.to_string()));
    if let Some(msg) = self.failure("delete") {
      return Err(RepositoryError::remote(msg));
    }

    if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
      rows.retain(|r| r.get("id") != Some(&Value::from(id)));
    }
    Ok(())
  }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
  async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
    self.record(Call::Put(key.to_string()));
    let fail = |message: String| StoreError::Upload {
      key: key.to_string(),
      message,
    };
    if let Some(msg) = self.failure("put") {
      return Err(fail(msg));
    }

    let mut objects = self.objects.lock().unwrap();
    if objects.contains_key(key) {
      return Err(fail("The resource already exists".into()));
    }
    objects.insert(key.to_string(), (content_type.to_string(), bytes.len()));
    Ok(())
  }

  fn public_url(&self, key: &str) -> String {
    format!("{}{}", Self::URL_PREFIX, key)
  }

  async fn delete(&self, keys: &[String]) -> Result<(), StoreError> {
    self.record(Call::DeleteObjects(keys.to_vec()));
    if let Some(msg) = self.failure("remove") {
      return Err(StoreError::Delete {
        keys: keys.to_vec(),
        message: msg,
      });
    }

    let mut objects = self.objects.lock().unwrap();
    for key in keys {
      objects.remove(key);
    }
    Ok(())
  }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    self.record(Call::SignIn(email.to_string()));
    if password != Self::PASSWORD {
      return Err(AuthError::Rejected("Invalid login credentials".into()));
    }
    Ok(Session {
      access_token: format!("token-for-{}", email),
      email: email.to_string(),
      expires_at: Some(Utc::now() + ChronoDuration::hours(1)),
    })
  }

  async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
    self.record(Call::SignOut);
    Ok(())
  }
}
