//! Error types for `tracer-core`.

use thiserror::Error;

/// Every failure the registry surfaces to its caller.
#[derive(Debug, Error)]
pub enum Error {
  /// The entity is absent, or filtered out by the actor's ownership scope.
  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("validation failed: {0}")]
  Validation(String),

  /// The operation is undefined for the entity's current state.
  #[error("invalid state: {0}")]
  InvalidState(String),

  /// Another request moved the entity between our check and our write.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store operation timed out")]
  Timeout,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
    Self::NotFound(format!("{kind} {id} not found"))
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
