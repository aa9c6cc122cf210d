//! Signed-in session and the auth flow around it.

use crate::backend::AuthProvider;
use crate::error::AuthError;
use crate::notify::Notifier;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// An authenticated session issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub access_token: String,
  pub email: String,
  pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
  pub fn is_expired(&self) -> bool {
    self.expires_at.is_some_and(|at| at <= Utc::now())
  }
}

/// Process-wide holder of the current session.
///
/// Cloning shares the same state. Every transition is broadcast to
/// subscribers; the app loop uses this to load collections after sign-in.
#[derive(Debug, Clone)]
pub struct SessionState {
  tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionState {
  fn default() -> Self {
    Self::new()
  }
}

impl SessionState {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(None);
    Self { tx: Arc::new(tx) }
  }

  /// The active session, if any and not expired
  pub fn current(&self) -> Option<Session> {
    self.tx.borrow().clone().filter(|s| !s.is_expired())
  }

  pub fn is_signed_in(&self) -> bool {
    self.current().is_some()
  }

  pub fn access_token(&self) -> Option<String> {
    self.current().map(|s| s.access_token)
  }

  /// Receive every session transition
  pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
    self.tx.subscribe()
  }

  fn set(&self, session: Option<Session>) {
    self.tx.send_replace(session);
  }
}

/// Sign-in / sign-out against the auth provider, with notifications.
#[derive(Clone)]
pub struct Auth {
  provider: Arc<dyn AuthProvider>,
  state: SessionState,
  notifier: Notifier,
}

impl Auth {
  pub fn new(provider: Arc<dyn AuthProvider>, state: SessionState, notifier: Notifier) -> Self {
    Self {
      provider,
      state,
      notifier,
    }
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
    match self.provider.sign_in(email, password).await {
      Ok(session) => {
        info!(email = %session.email, "signed in");
        self.state.set(Some(session));
        self
          .notifier
          .success("Login successful", "Welcome to the admin panel");
        Ok(())
      }
      Err(e) => {
        warn!(%email, error = %e, "sign-in rejected");
        self.notifier.error("Login failed", e.to_string());
        Err(e)
      }
    }
  }

  /// On failure the session stays as it was.
  pub async fn sign_out(&self) -> Result<(), AuthError> {
    let Some(session) = self.state.current() else {
      return Ok(());
    };

    match self.provider.sign_out(&session).await {
      Ok(()) => {
        info!(email = %session.email, "signed out");
        self.state.set(None);
        self
          .notifier
          .success("Logged out", "You have been successfully logged out");
        Ok(())
      }
      Err(e) => {
        self.notifier.error("Error signing out", e.to_string());
        Err(e)
      }
    }
  }
}
