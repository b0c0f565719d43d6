//! Error type for `beacon-store-sqlite`.

use beacon_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] beacon_core::Error),

  /// A store call failed. `op` names the operation, `key` the entity.
  #[error("{op} {key}: {source}")]
  Database {
    op:     &'static str,
    key:    String,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl Error {
  /// The underlying SQLite failure, if this is one.
  fn sqlite_code(&self) -> Option<rusqlite::ErrorCode> {
    match self {
      Error::Database {
        source: tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)),
        ..
      } => Some(e.code),
      _ => None,
    }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      // Any constraint (unique, primary key, foreign key, check, trigger)
      // means the write clashes with existing data.
      Error::Database { .. } => match self.sqlite_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => ErrorKind::Conflict,
        _ => ErrorKind::StoreUnavailable,
      },
      Error::Json(_) | Error::Uuid(_) | Error::DateParse(_) | Error::Corrupt(_) => {
        ErrorKind::StoreUnavailable
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Context ─────────────────────────────────────────────────────────────────

/// Attach an operation name and entity key to a raw connection error.
pub(crate) trait Context<T> {
  fn during(self, op: &'static str, key: impl ToString) -> Result<T>;
}

impl<T> Context<T> for std::result::Result<T, tokio_rusqlite::Error> {
  fn during(self, op: &'static str, key: impl ToString) -> Result<T> {
    self.map_err(|source| Error::Database { op, key: key.to_string(), source })
  }
}
