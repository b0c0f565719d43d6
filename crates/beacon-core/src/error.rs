//! Error types for `beacon-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::phase::PhaseRef;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("incident not found: {0}")]
  IncidentNotFound(Uuid),

  #[error("component not found: {0}")]
  ComponentNotFound(Uuid),

  #[error("impact type not found: {0}")]
  ImpactTypeNotFound(Uuid),

  #[error("severity not found: {0:?}")]
  SeverityNotFound(String),

  #[error("phase generation {0} does not exist")]
  GenerationNotFound(u32),

  #[error("phase {} of generation {} does not exist", .0.order, .0.generation)]
  PhaseNotFound(PhaseRef),

  #[error("update {order} of incident {incident} not found")]
  UpdateNotFound { incident: Uuid, order: u32 },

  #[error("conflict: {0}")]
  Conflict(String),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidArgument(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The caller-facing failure taxonomy. None of these are retried by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A caller-supplied value violates a precondition.
  InvalidArgument,
  /// A referenced entity, generation or update order does not exist.
  NotFound,
  /// A uniqueness or referential constraint would be violated by the write.
  Conflict,
  /// The store could not start, run or commit the operation.
  StoreUnavailable,
}

/// Maps an error onto the [`ErrorKind`] taxonomy.
///
/// Store backends implement this for their own error type so that higher
/// layers can pick a response without knowing the backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Error::IncidentNotFound(_)
      | Error::ComponentNotFound(_)
      | Error::ImpactTypeNotFound(_)
      | Error::SeverityNotFound(_)
      | Error::GenerationNotFound(_)
      | Error::PhaseNotFound(_)
      | Error::UpdateNotFound { .. } => ErrorKind::NotFound,
      Error::Conflict(_) => ErrorKind::Conflict,
    }
  }
}
