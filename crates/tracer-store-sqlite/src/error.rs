//! Error type for `tracer-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that does not decode into its domain type.
  #[error("corrupt column {column}: {value:?}")]
  Corrupt { column: &'static str, value: String },

  /// A conditional write matched no row: the entity left the expected
  /// state between the caller's check and the write.
  #[error("{0}")]
  Conflict(String),
}

impl Error {
  /// Whether this is a UNIQUE or PRIMARY KEY violation.
  pub fn is_unique_violation(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => is_unique_violation(e),
      _ => false,
    }
  }
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == ErrorCode::ConstraintViolation
        && matches!(
          f.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
  )
}

impl From<Error> for tracer_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Conflict(msg) => tracer_core::Error::Conflict(msg),
      e if e.is_unique_violation() => {
        tracer_core::Error::Validation(format!("duplicate value: {e}"))
      }
      e => tracer_core::Error::Store(Box::new(e)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
