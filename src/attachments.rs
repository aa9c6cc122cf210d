//! Attachment store client: image upload and best-effort removal.
//!
//! Attachments are referenced from records only by their public URL. The
//! object key is recovered from the URL's final path segment (see
//! [`storage_key`]); this holds for the bucket URLs our object store hands
//! out and is the one place to change if a provider's URLs differ.

use crate::backend::ObjectStore;
use crate::error::{UploadError, ValidationError};
use crate::notify::Notifier;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// A candidate file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
  pub name: String,
  /// Declared MIME type
  pub content_type: String,
  pub bytes: Vec<u8>,
}

impl LocalFile {
  pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      content_type: content_type.into(),
      bytes,
    }
  }

  pub fn size(&self) -> u64 {
    self.bytes.len() as u64
  }

  fn extension(&self) -> Option<&str> {
    self
      .name
      .rsplit_once('.')
      .map(|(_, ext)| ext)
      .filter(|ext| !ext.is_empty())
  }
}

/// Display name of a local path: its file name when it has one
fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

/// Declared type of a local file, guessed from its extension
fn guess_type(path: &Path) -> String {
  mime_guess::from_path(path)
    .first_or_octet_stream()
    .essence_str()
    .to_string()
}

/// Object key embedded in an attachment URL: the text after the last `/`.
///
/// A URL with no `/`, or one ending in `/`, has no key to derive.
pub fn storage_key(url: &str) -> Result<&str, ValidationError> {
  match url.rsplit_once('/') {
    Some((_, key)) if !key.is_empty() => Ok(key),
    _ => Err(ValidationError::UnresolvableUrl(url.to_string())),
  }
}

/// Outcome of a best-effort removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
  Removed,
  /// The reference may be dropped, but the object may still exist
  Orphaned(String),
}

/// Uploads and removes attachments in the object store.
#[derive(Clone)]
pub struct Attachments {
  store: Arc<dyn ObjectStore>,
  notifier: Notifier,
  max_bytes: u64,
}

impl Attachments {
  pub fn new(store: Arc<dyn ObjectStore>, notifier: Notifier) -> Self {
    Self {
      store,
      notifier,
      max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
  }

  pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
    self.max_bytes = max_bytes;
    self
  }

  /// Size gate first, then the declared type must be `image/*`.
  pub fn validate(&self, file: &LocalFile) -> Result<(), ValidationError> {
    if file.size() > self.max_bytes {
      return Err(ValidationError::FileTooLarge {
        name: file.name.clone(),
        size: file.size(),
        limit: self.max_bytes,
      });
    }
    if !file.content_type.starts_with("image/") {
      return Err(ValidationError::NotAnImage {
        name: file.name.clone(),
        content_type: file.content_type.clone(),
      });
    }
    Ok(())
  }

  /// Validate and store one file under a fresh key; returns its public URL.
  pub async fn upload(&self, file: &LocalFile) -> Result<String, UploadError> {
    self.validate(file)?;

    let key = match file.extension() {
      Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
      None => Uuid::new_v4().to_string(),
    };
    debug!(name = %file.name, %key, size = file.size(), "uploading");

    self
      .store
      .put(&key, file.bytes.clone(), &file.content_type)
      .await?;

    let url = self.store.public_url(&key);
    info!(name = %file.name, %url, "uploaded");
    Ok(url)
  }

  /// Read `path` for upload.
  ///
  /// The size gate runs on the file's metadata first, so an oversized file
  /// is refused without being loaded.
  pub async fn read(&self, path: &Path) -> Result<LocalFile, UploadError> {
    let name = file_name(path);
    let read_failed = |e: std::io::Error| UploadError::Read {
      name: name.clone(),
      message: e.to_string(),
    };

    let size = tokio::fs::metadata(path).await.map_err(read_failed)?.len();
    if size > self.max_bytes {
      debug!(%name, size, "refusing oversized file before reading");
      return Err(
        ValidationError::FileTooLarge {
          name: name.clone(),
          size,
          limit: self.max_bytes,
        }
        .into(),
      );
    }

    let bytes = tokio::fs::read(path).await.map_err(read_failed)?;
    Ok(LocalFile::new(name, guess_type(path), bytes))
  }

  /// Read every path in order; unreadable or oversized files are skipped,
  /// each with its own notification.
  pub async fn read_batch(&self, paths: &[PathBuf]) -> Vec<LocalFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
      match self.read(path).await {
        Ok(file) => files.push(file),
        Err(e) => self.notify_skipped(&file_name(path), &e),
      }
    }
    files
  }

  /// Single-image field upload: notifies on every outcome.
  pub async fn attach(&self, file: &LocalFile) -> Option<String> {
    match self.upload(file).await {
      Ok(url) => {
        self
          .notifier
          .success("Upload successful", "Your image has been uploaded");
        Some(url)
      }
      Err(e) => {
        warn!(name = %file.name, error = %e, "upload failed");
        self.notify_rejected(&e);
        None
      }
    }
  }

  /// Read and attach a single image from disk.
  pub async fn attach_path(&self, path: &Path) -> Option<String> {
    match self.read(path).await {
      Ok(file) => self.attach(&file).await,
      Err(e) => {
        warn!(path = %path.display(), error = %e, "upload refused");
        self.notify_rejected(&e);
        None
      }
    }
  }

  /// Why a single-image upload did not happen
  fn notify_rejected(&self, err: &UploadError) {
    match err {
      UploadError::Invalid(ValidationError::FileTooLarge { .. }) => self.notifier.error(
        "File too large",
        format!("Please select an image under {}", human_size(self.max_bytes)),
      ),
      UploadError::Invalid(ValidationError::NotAnImage { .. }) => self
        .notifier
        .error("Invalid file type", "Please select an image file"),
      e => self.notifier.error("Upload failed", e.to_string()),
    }
  }

  /// Why one file of a batch was skipped
  fn notify_skipped(&self, name: &str, err: &UploadError) {
    match err {
      UploadError::Invalid(ValidationError::FileTooLarge { .. }) => self.notifier.error(
        "File too large",
        format!(
          "{} is over {} and will be skipped",
          name,
          human_size(self.max_bytes)
        ),
      ),
      UploadError::Invalid(ValidationError::NotAnImage { .. }) => self.notifier.error(
        "Invalid file type",
        format!("{} is not an image and will be skipped", name),
      ),
      e => {
        warn!(%name, error = %e, "upload failed");
        self
          .notifier
          .error("Upload failed", format!("Could not upload {}: {}", name, e));
      }
    }
  }

  /// Upload `files` one at a time and append the results to `existing`.
  ///
  /// The whole batch is refused up front when it would exceed `max`.
  /// Otherwise each failing file is skipped with its own notification and
  /// the rest carry on; partial success is the normal case.
  pub async fn upload_batch(
    &self,
    existing: &[String],
    files: &[LocalFile],
    max: usize,
  ) -> Result<Vec<String>, ValidationError> {
    if files.is_empty() {
      return Ok(existing.to_vec());
    }

    if existing.len() + files.len() > max {
      let remaining = max.saturating_sub(existing.len());
      self.notifier.error(
        format!("Maximum {} images allowed", max),
        format!("Please select fewer images ({} more allowed)", remaining),
      );
      return Err(ValidationError::TooManyFiles { max, remaining });
    }

    let mut urls = existing.to_vec();
    let mut uploaded = 0usize;

    for file in files {
      match self.upload(file).await {
        Ok(url) => {
          urls.push(url);
          uploaded += 1;
        }
        Err(e) => self.notify_skipped(&file.name, &e),
      }
    }

    if uploaded > 0 {
      self.notifier.success(
        "Upload successful",
        format!("{} image(s) uploaded successfully", uploaded),
      );
    }
    Ok(urls)
  }

  /// Delete the object behind `url`. Never fails; a failure is logged and
  /// reported as [`Removal::Orphaned`].
  pub async fn remove(&self, url: &str) -> Removal {
    let key = match storage_key(url) {
      Ok(key) => key.to_string(),
      Err(e) => {
        warn!(%url, "no storage key in attachment url");
        return Removal::Orphaned(e.to_string());
      }
    };

    match self.store.delete(std::slice::from_ref(&key)).await {
      Ok(()) => {
        info!(%key, "attachment removed");
        Removal::Removed
      }
      Err(e) => {
        warn!(%key, error = %e, "attachment removal failed");
        Removal::Orphaned(e.to_string())
      }
    }
  }

  /// Field-level removal: the caller drops the reference regardless.
  pub async fn detach(&self, url: &str) -> Removal {
    let removal = self.remove(url).await;
    match &removal {
      Removal::Removed => self
        .notifier
        .success("Image removed", "Your image has been deleted"),
      Removal::Orphaned(_) => self.notifier.warning(
        "Warning",
        "Image reference removed, but file deletion may have failed",
      ),
    }
    removal
  }
}

/// "5MB" style size for messages
fn human_size(bytes: u64) -> String {
  const MIB: u64 = 1024 * 1024;
  if bytes >= MIB && bytes % MIB == 0 {
    format!("{}MB", bytes / MIB)
  } else {
    format!("{} bytes", bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::{Call, MemoryBackend};
  use crate::notify::{drain, Level, Notification};
  use tokio::sync::mpsc::UnboundedReceiver;

  fn attachments() -> (
    Attachments,
    Arc<MemoryBackend>,
    UnboundedReceiver<Notification>,
  ) {
    let backend = Arc::new(MemoryBackend::new());
    let (notifier, rx) = Notifier::channel();
    (Attachments::new(backend.clone(), notifier), backend, rx)
  }

  fn jpeg(name: &str, size: usize) -> LocalFile {
    LocalFile::new(name, "image/jpeg", vec![0u8; size])
  }

  #[test]
  fn test_size_and_type_gate() {
    let (att, _, _) = attachments();
    let limit = DEFAULT_MAX_UPLOAD_BYTES as usize;

    assert!(att.validate(&jpeg("ok.jpg", limit)).is_ok());
    assert!(matches!(
      att.validate(&jpeg("big.jpg", limit + 1)),
      Err(ValidationError::FileTooLarge { .. })
    ));
    // Too large wins over wrong type
    assert!(matches!(
      att.validate(&LocalFile::new("big.pdf", "application/pdf", vec![0; limit + 1])),
      Err(ValidationError::FileTooLarge { .. })
    ));
    // Wrong type is rejected even when tiny
    assert!(matches!(
      att.validate(&LocalFile::new("a.pdf", "application/pdf", vec![0; 1])),
      Err(ValidationError::NotAnImage { .. })
    ));
  }

  #[test]
  fn test_storage_key() {
    assert_eq!(
      storage_key("https://cdn.test/public/images/abc.jpg").unwrap(),
      "abc.jpg"
    );
    assert!(storage_key("abc.jpg").is_err());
    assert!(storage_key("https://cdn.test/public/").is_err());
  }

  #[tokio::test]
  async fn test_upload_generates_fresh_keys() {
    let (att, backend, _) = attachments();

    let a = att.upload(&jpeg("site.jpg", 10)).await.unwrap();
    let b = att.upload(&jpeg("site.jpg", 10)).await.unwrap();

    assert_ne!(a, b);
    assert!(a.starts_with(MemoryBackend::URL_PREFIX));
    assert!(a.ends_with(".jpg"));
    assert_eq!(backend.object_keys().len(), 2);
  }

  #[tokio::test]
  async fn test_rejected_file_never_reaches_store() {
    let (att, backend, mut rx) = attachments();

    let url = att
      .attach(&LocalFile::new("notes.txt", "text/plain", vec![1, 2]))
      .await;

    assert_eq!(url, None);
    assert!(backend.calls().is_empty());
    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Invalid file type");
  }

  #[tokio::test]
  async fn test_store_failure_leaves_field_unset() {
    let (att, backend, mut rx) = attachments();
    backend.fail("put", "bucket not found");

    assert_eq!(att.attach(&jpeg("a.jpg", 10)).await, None);
    assert_eq!(drain(&mut rx)[0].title, "Upload failed");
  }

  #[tokio::test]
  async fn test_batch_skips_invalid_files_in_order() {
    let (att, backend, mut rx) = attachments();
    let existing = vec!["https://cdn.test/old.jpg".to_string()];
    let files = vec![
      jpeg("1.jpg", 10),
      LocalFile::new("2.pdf", "application/pdf", vec![0; 10]),
      jpeg("3.jpg", 10),
      jpeg("4.jpg", DEFAULT_MAX_UPLOAD_BYTES as usize + 1),
      jpeg("5.png", 10),
    ];

    let urls = att.upload_batch(&existing, &files, 10).await.unwrap();

    assert_eq!(urls.len(), 4);
    assert_eq!(urls[0], existing[0]);
    let puts: Vec<_> = backend
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::Put(key) => Some(key),
        _ => None,
      })
      .collect();
    assert_eq!(puts.len(), 3);
    // Appended in the candidates' relative order
    for (url, key) in urls[1..].iter().zip(&puts) {
      assert!(url.ends_with(key.as_str()));
    }
    assert!(puts[2].ends_with(".png"));

    let notes = drain(&mut rx);
    let errors = notes.iter().filter(|n| n.level == Level::Error).count();
    assert_eq!(errors, 2);
    assert_eq!(
      notes.last().unwrap().description,
      "3 image(s) uploaded successfully"
    );
  }

  #[tokio::test]
  async fn test_batch_store_failures_are_per_file() {
    let (att, backend, mut rx) = attachments();
    backend.fail("put", "bucket not found");
    let existing = vec!["https://cdn.test/old.jpg".to_string()];

    let urls = att
      .upload_batch(&existing, &[jpeg("a.jpg", 10), jpeg("b.jpg", 10)], 10)
      .await
      .unwrap();

    assert_eq!(urls, existing);
    // Both files were tried; the first failure did not stop the batch
    let puts = backend
      .calls()
      .into_iter()
      .filter(|c| matches!(c, Call::Put(_)))
      .count();
    assert_eq!(puts, 2);

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 2);
    assert!(notes
      .iter()
      .all(|n| n.title == "Upload failed" && n.level == Level::Error));
    assert!(notes[0].description.contains("a.jpg"));
    assert!(notes[1].description.contains("b.jpg"));
  }

  #[tokio::test]
  async fn test_batch_over_capacity_is_refused_whole() {
    let (att, backend, mut rx) = attachments();
    let existing: Vec<String> = (0..9).map(|i| format!("https://cdn.test/{i}.jpg")).collect();

    let err = att
      .upload_batch(&existing, &[jpeg("a.jpg", 1), jpeg("b.jpg", 1)], 10)
      .await
      .unwrap_err();

    assert_eq!(
      err,
      ValidationError::TooManyFiles {
        max: 10,
        remaining: 1
      }
    );
    assert!(backend.calls().is_empty());
    assert_eq!(drain(&mut rx)[0].title, "Maximum 10 images allowed");
  }

  #[tokio::test]
  async fn test_remove_failure_is_best_effort() {
    let (att, backend, mut rx) = attachments();
    let url = backend.seed_object("a.jpg");
    backend.fail("remove", "storage unavailable");

    let removal = att.detach(&url).await;

    assert!(matches!(removal, Removal::Orphaned(_)));
    let notes = drain(&mut rx);
    assert_eq!(notes[0].level, Level::Warning);
    assert_eq!(
      notes[0].description,
      "Image reference removed, but file deletion may have failed"
    );
  }

  #[tokio::test]
  async fn test_remove_without_key_skips_store() {
    let (att, backend, _) = attachments();

    let removal = att.remove("not-a-url").await;

    assert!(matches!(removal, Removal::Orphaned(_)));
    assert!(backend.calls().is_empty());
  }

  #[tokio::test]
  async fn test_remove_deletes_by_key() {
    let (att, backend, _) = attachments();
    let url = backend.seed_object("k.jpg");

    assert_eq!(att.remove(&url).await, Removal::Removed);
    assert_eq!(
      backend.calls(),
      vec![Call::DeleteObjects(vec!["k.jpg".into()])]
    );
    assert!(backend.object_keys().is_empty());
  }

  #[tokio::test]
  async fn test_read_refuses_oversized_file_from_metadata() {
    let (att, _, _) = attachments();
    let att = att.with_max_bytes(10);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.jpg");
    std::fs::write(&path, [0u8; 11]).unwrap();

    let err = att.read(&path).await.unwrap_err();

    assert!(matches!(
      err,
      UploadError::Invalid(ValidationError::FileTooLarge {
        ref name,
        size: 11,
        limit: 10,
      }) if name == "big.jpg"
    ));
  }

  #[tokio::test]
  async fn test_read_guesses_type_from_extension() {
    let (att, _, _) = attachments();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.png");
    std::fs::write(&path, b"png").unwrap();

    let file = att.read(&path).await.unwrap();

    assert_eq!(file, LocalFile::new("site.png", "image/png", b"png".to_vec()));
  }

  #[tokio::test]
  async fn test_attach_path_reports_missing_and_oversized_files() {
    let (att, backend, mut rx) = attachments();
    let att = att.with_max_bytes(4);
    let dir = tempfile::tempdir().unwrap();
    let big = dir.path().join("big.jpg");
    std::fs::write(&big, [0u8; 5]).unwrap();

    assert_eq!(att.attach_path(&dir.path().join("gone.jpg")).await, None);
    assert_eq!(att.attach_path(&big).await, None);

    let titles: Vec<_> = drain(&mut rx).into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Upload failed", "File too large"]);
    assert!(backend.calls().is_empty());
  }

  #[tokio::test]
  async fn test_read_batch_skips_unusable_files_in_order() {
    let (att, _, mut rx) = attachments();
    let att = att.with_max_bytes(4);
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = ["a.jpg", "big.jpg", "missing.jpg", "b.jpg"]
      .iter()
      .map(|name| dir.path().join(name))
      .collect();
    std::fs::write(&paths[0], b"a").unwrap();
    std::fs::write(&paths[1], [0u8; 5]).unwrap();
    std::fs::write(&paths[3], b"b").unwrap();

    let files = att.read_batch(&paths).await;

    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 2);
    assert!(notes[0].description.contains("big.jpg"));
    assert!(notes[1].description.contains("missing.jpg"));
  }

  #[test]
  fn test_human_size() {
    assert_eq!(human_size(DEFAULT_MAX_UPLOAD_BYTES), "5MB");
    assert_eq!(human_size(1000), "1000 bytes");
  }
}
