//! One-shot background operations polled from the UI tick.
//!
//! Views never await remote calls directly: they spawn the work as a
//! `Pending<T>` and check it on every tick, so the event loop stays
//! responsive while a network call is in flight.
//!
//! ```ignore
//! let cache = cache.clone();
//! self.saving = Pending::spawn(async move { submission.execute::<E>(cache).await });
//!
//! // In tick
//! if let Some(result) = self.saving.poll() {
//!     form.finish(result);
//! }
//! ```

use std::future::Future;
use tokio::sync::oneshot;

/// Background operation whose result is picked up by polling
#[derive(Debug)]
pub enum Pending<T> {
  Idle,
  Running(oneshot::Receiver<T>),
}

impl<T> Default for Pending<T> {
  fn default() -> Self {
    Pending::Idle
  }
}

impl<T: Send + 'static> Pending<T> {
  /// Start `future` on the runtime.
  pub fn spawn<F>(future: F) -> Self
  where
    F: Future<Output = T> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      // Ignore send errors - the view may have been closed
      let _ = tx.send(future.await);
    });
    Pending::Running(rx)
  }

  pub fn is_running(&self) -> bool {
    matches!(self, Pending::Running(_))
  }

  /// Take the result if it has arrived.
  ///
  /// Goes back to `Idle` once the result has been taken, or when the task
  /// went away without producing one.
  pub fn poll(&mut self) -> Option<T> {
    let Pending::Running(rx) = self else {
      return None;
    };

    match rx.try_recv() {
      Ok(value) => {
        *self = Pending::Idle;
        Some(value)
      }
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => {
        *self = Pending::Idle;
        None
      }
    }
  }
}
