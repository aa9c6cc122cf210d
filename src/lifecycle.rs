//! Entity deletion with attachment cleanup.
//!
//! The repository never cascades; the caller removes the record first and
//! only then tries to remove the attachments it referenced. A failed
//! attachment removal leaves an orphaned object behind but never undoes or
//! blocks the record deletion.

use crate::attachments::{Attachments, Removal};
use crate::cache::{Cached, EntityCache};
use crate::error::RepositoryError;
use crate::notify::Notifier;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Delete `entity` and then, best-effort, every attachment it references.
///
/// Returns the record deletion result. Attachment failures only produce a
/// warning notification.
pub async fn delete_entity<E: Cached>(
  cache: &EntityCache,
  attachments: &Attachments,
  notifier: &Notifier,
  entity: &E,
) -> Result<(), RepositoryError> {
  cache.delete::<E>(entity.id()).await?;

  // One at a time, in reference order
  let orphaned = stream::iter(entity.attachments())
    .then(|url| async move {
      let removal = attachments.remove(&url).await;
      (url, removal)
    })
    .filter_map(|(url, removal)| async move {
      match removal {
        Removal::Removed => None,
        Removal::Orphaned(reason) => Some((url, reason)),
      }
    })
    .inspect(|(url, reason)| {
      warn!(table = E::TABLE, id = entity.id(), %url, %reason, "attachment left behind")
    })
    .count()
    .await;

  if orphaned > 0 {
    notifier.warning(
      "Warning",
      format!(
        "{} deleted, but {} image(s) could not be removed from storage",
        entity.display_name(),
        orphaned
      ),
    );
  }

  info!(table = E::TABLE, id = entity.id(), orphaned, "entity deleted");
  notifier.success(
    format!("{} deleted", capitalize(E::SINGULAR)),
    format!("{} has been deleted", entity.display_name()),
  );
  Ok(())
}

/// "employee" -> "Employee"
pub fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
