//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings with
//! microsecond precision, so SQL string comparison is chronological. UUIDs
//! are stored as hyphenated lowercase strings.

use beacon_core::{
  component::Component,
  incident::{AffectingIncident, Impact, Incident},
  label::Labels,
  phase::PhaseRef,
  reference::ImpactType,
  update::IncidentUpdate,
};
use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Truncate to the precision the store keeps.
///
/// Both stored window bounds and query instants pass through here, so
/// window predicates are evaluated at microsecond precision: an instant
/// within the same microsecond as `began_at` counts as inside the window.
pub fn stored_precision(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  stored_precision(dt).to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn decode_u32(column: &str, v: i64) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Corrupt(format!("{column} out of range: {v}")))
}

pub fn decode_severity(v: i64) -> Result<u8> {
  u8::try_from(v).map_err(|_| Error::Corrupt(format!("severity out of range: {v}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `components` row plus its label rows.
pub struct RawComponent {
  pub component_id: String,
  pub display_name: String,
  pub labels:       Vec<(String, String)>,
}

impl RawComponent {
  pub fn into_component(self) -> Result<Component> {
    Ok(Component {
      id:           decode_uuid(&self.component_id)?,
      display_name: self.display_name,
      labels:       self.labels.into_iter().collect::<Labels>(),
    })
  }
}

pub struct RawImpactType {
  pub impact_type_id: String,
  pub display_name:   String,
  pub description:    String,
}

impl RawImpactType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      impact_type_id: row.get(0)?,
      display_name:   row.get(1)?,
      description:    row.get(2)?,
    })
  }

  pub fn into_impact_type(self) -> Result<ImpactType> {
    Ok(ImpactType {
      id:           decode_uuid(&self.impact_type_id)?,
      display_name: self.display_name,
      description:  self.description,
    })
  }
}

/// Column list matching [`RawIncident::from_row`].
pub const INCIDENT_COLUMNS: &str = "i.incident_id, i.display_name, i.description, \
   i.began_at, i.ended_at, i.phase_generation, i.phase_order";

pub struct RawIncident {
  pub incident_id:      String,
  pub display_name:     String,
  pub description:      String,
  pub began_at:         String,
  pub ended_at:         Option<String>,
  pub phase_generation: i64,
  pub phase_order:      i64,
}

impl RawIncident {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      incident_id:      row.get(0)?,
      display_name:     row.get(1)?,
      description:      row.get(2)?,
      began_at:         row.get(3)?,
      ended_at:         row.get(4)?,
      phase_generation: row.get(5)?,
      phase_order:      row.get(6)?,
    })
  }

  pub fn into_incident(self) -> Result<Incident> {
    Ok(Incident {
      id:           decode_uuid(&self.incident_id)?,
      display_name: self.display_name,
      description:  self.description,
      began_at:     decode_dt(&self.began_at)?,
      ended_at:     self.ended_at.as_deref().map(decode_dt).transpose()?,
      phase:        PhaseRef::new(
        decode_u32("phase_generation", self.phase_generation)?,
        decode_u32("phase_order", self.phase_order)?,
      ),
    })
  }
}

/// Column list matching [`RawUpdate::from_row`].
pub const UPDATE_COLUMNS: &str =
  "incident_id, ordinal, display_name, description, created_at";

pub struct RawUpdate {
  pub incident_id:  String,
  pub ordinal:      i64,
  pub display_name: String,
  pub description:  String,
  pub created_at:   String,
}

impl RawUpdate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      incident_id:  row.get(0)?,
      ordinal:      row.get(1)?,
      display_name: row.get(2)?,
      description:  row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_update(self) -> Result<IncidentUpdate> {
    Ok(IncidentUpdate {
      incident_id:  decode_uuid(&self.incident_id)?,
      order:        decode_u32("ordinal", self.ordinal)?,
      display_name: self.display_name,
      description:  self.description,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// One impact row resolved from either side: `(other_id, impact_type_id,
/// severity)`.
pub struct RawImpact {
  pub other_id:       String,
  pub impact_type_id: String,
  pub severity:       i64,
}

impl RawImpact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      other_id:       row.get(0)?,
      impact_type_id: row.get(1)?,
      severity:       row.get(2)?,
    })
  }

  pub fn into_affected(self) -> Result<Impact> {
    Ok(Impact {
      component_id:   decode_uuid(&self.other_id)?,
      impact_type_id: decode_uuid(&self.impact_type_id)?,
      severity:       decode_severity(self.severity)?,
    })
  }

  pub fn into_affecting(self) -> Result<AffectingIncident> {
    Ok(AffectingIncident {
      incident_id:    decode_uuid(&self.other_id)?,
      impact_type_id: decode_uuid(&self.impact_type_id)?,
      severity:       decode_severity(self.severity)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = [
      base + Duration::microseconds(1),
      base + Duration::seconds(1),
      base + Duration::minutes(10),
      base + Duration::days(400),
    ];
    for t in later {
      assert!(encode_dt(base) < encode_dt(t), "{} !< {}", encode_dt(base), encode_dt(t));
      assert_eq!(encode_dt(base).len(), encode_dt(t).len());
    }
  }

  #[test]
  fn timestamp_decodes_to_stored_precision() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), stored_precision(now));
  }
}
