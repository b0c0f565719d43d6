//! Incident updates, the append-only progress log of an incident.
//!
//! Updates are addressed by a dense per-incident `order` (0, 1, 2, …). An
//! order is never reassigned while its row exists; deleting an update leaves
//! a gap that is not backfilled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
  pub incident_id:  Uuid,
  pub order:        u32,
  pub display_name: String,
  pub description:  String,
  pub created_at:   DateTime<Utc>,
}

/// Content fields of an update; the only part callers may write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncidentUpdate {
  pub display_name: String,
  #[serde(default)]
  pub description:  String,
}

impl NewIncidentUpdate {
  pub fn new(display_name: impl Into<String>, description: impl Into<String>) -> Self {
    Self { display_name: display_name.into(), description: description.into() }
  }

  pub fn validate(&self) -> Result<()> {
    if self.display_name.trim().is_empty() {
      return Err(Error::invalid("update display name must not be empty"));
    }
    Ok(())
  }
}

/// The order the next update receives: `max(existing) + 1`, or `0`.
pub fn next_order(current_max: Option<u32>) -> u32 {
  current_max.map_or(0, |max| max + 1)
}
