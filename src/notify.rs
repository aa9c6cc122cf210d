//! User-visible notifications (toasts).
//!
//! Producers hold a cloneable [`Notifier`]; the UI owns the receiving end and
//! drains it on every tick. Every notification is also written to the log.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Success,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub level: Level,
  pub title: String,
  pub description: String,
}

/// Sending half of the notification channel
#[derive(Debug, Clone)]
pub struct Notifier {
  tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
  /// Create a notifier together with the receiver the UI drains.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  pub fn success(&self, title: impl Into<String>, description: impl Into<String>) {
    self.send(Level::Success, title.into(), description.into());
  }

  pub fn warning(&self, title: impl Into<String>, description: impl Into<String>) {
    self.send(Level::Warning, title.into(), description.into());
  }

  pub fn error(&self, title: impl Into<String>, description: impl Into<String>) {
    self.send(Level::Error, title.into(), description.into());
  }

  fn send(&self, level: Level, title: String, description: String) {
    match level {
      Level::Success => info!(%title, %description, "notification"),
      Level::Warning => warn!(%title, %description, "notification"),
      Level::Error => error!(%title, %description, "notification"),
    }

    // The UI may already be gone during shutdown
    let _ = self.tx.send(Notification {
      level,
      title,
      description,
    });
  }
}

/// Collect everything currently queued on a receiver.
#[cfg(test)]
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
  let mut out = Vec::new();
  while let Ok(n) = rx.try_recv() {
    out.push(n);
  }
  out
}
