//! Reference data managed on its own: impact types and severities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Impact types ────────────────────────────────────────────────────────────

/// The kind of effect an incident has on a component (e.g. "degraded",
/// "outage", "maintenance").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactType {
  pub id:           Uuid,
  pub display_name: String,
  pub description:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImpactType {
  pub display_name: String,
  #[serde(default)]
  pub description:  String,
}

impl NewImpactType {
  pub fn validate(&self) -> Result<()> {
    if self.display_name.trim().is_empty() {
      return Err(Error::invalid("impact type display name must not be empty"));
    }
    Ok(())
  }
}

// ─── Severities ──────────────────────────────────────────────────────────────

/// Inclusive upper bound of every severity value.
pub const SEVERITY_MAX: u8 = 100;

/// Check that a severity value lies in `[0, SEVERITY_MAX]`.
///
/// Out-of-range values are an error, never clamped.
pub fn check_severity(value: i64) -> Result<u8> {
  u8::try_from(value)
    .ok()
    .filter(|v| *v <= SEVERITY_MAX)
    .ok_or_else(|| {
      Error::invalid(format!("severity {value} is outside 0..={SEVERITY_MAX}"))
    })
}

/// A named severity level. The display name is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Severity {
  pub display_name: String,
  pub value:        u8,
}

impl Severity {
  pub fn new(display_name: impl Into<String>, value: i64) -> Result<Self> {
    let display_name = display_name.into();
    if display_name.trim().is_empty() {
      return Err(Error::invalid("severity display name must not be empty"));
    }
    Ok(Self { display_name, value: check_severity(value)? })
  }
}
