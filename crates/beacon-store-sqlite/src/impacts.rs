//! Impact rows: replacement on incident writes and windowed resolution.

use beacon_core::{Error, incident::Impact};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::{
  encode::{RawImpact, encode_uuid},
  query::{Filter, Fragment, window_active},
  store::row_exists,
};

/// Check that every component and impact type named by `impacts` exists.
pub fn check_references(
  conn: &Connection,
  impacts: &[Impact],
) -> rusqlite::Result<Option<Error>> {
  for impact in impacts {
    if !row_exists(conn, "components", "component_id", &encode_uuid(impact.component_id))? {
      return Ok(Some(Error::ComponentNotFound(impact.component_id)));
    }
    if !row_exists(
      conn,
      "impact_types",
      "impact_type_id",
      &encode_uuid(impact.impact_type_id),
    )? {
      return Ok(Some(Error::ImpactTypeNotFound(impact.impact_type_id)));
    }
  }
  Ok(None)
}

/// Delete every impact of `incident_id` and insert `impacts` in their place.
///
/// Not transactional on its own; callers run it inside the incident write.
pub fn replace(conn: &Connection, incident_id: &str, impacts: &[Impact]) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM impacts WHERE incident_id = ?1",
    rusqlite::params![incident_id],
  )?;
  let mut stmt = conn.prepare(
    "INSERT INTO impacts (incident_id, component_id, impact_type_id, severity)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for impact in impacts {
    stmt.execute(rusqlite::params![
      incident_id,
      encode_uuid(impact.component_id),
      encode_uuid(impact.impact_type_id),
      impact.severity,
    ])?;
  }
  Ok(())
}

/// Impacts of one incident active at `at` (or ongoing), as
/// `(component, type, severity)`.
pub fn affected(
  conn: &Connection,
  incident_id: &str,
  at: Option<DateTime<Utc>>,
) -> rusqlite::Result<Vec<RawImpact>> {
  let filter = Filter::new()
    .and(Fragment::eq("m.incident_id", incident_id.to_owned()))
    .and(window_active("i", at));
  resolve(conn, "m.component_id", &filter)
}

/// Impacts on one component active at `at` (or ongoing), as
/// `(incident, type, severity)`.
pub fn affecting(
  conn: &Connection,
  component_id: &str,
  at: Option<DateTime<Utc>>,
) -> rusqlite::Result<Vec<RawImpact>> {
  let filter = Filter::new()
    .and(Fragment::eq("m.component_id", component_id.to_owned()))
    .and(window_active("i", at));
  resolve(conn, "m.incident_id", &filter)
}

fn resolve(
  conn: &Connection,
  other_column: &str,
  filter: &Filter,
) -> rusqlite::Result<Vec<RawImpact>> {
  let sql = format!(
    "SELECT {other_column}, m.impact_type_id, m.severity
     FROM impacts AS m
     JOIN incidents AS i ON i.incident_id = m.incident_id
     {}
     ORDER BY {other_column}, m.impact_type_id",
    filter.where_clause()
  );
  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(rusqlite::params_from_iter(filter.params()), RawImpact::from_row)?
    .collect()
}
