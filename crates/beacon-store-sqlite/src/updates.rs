//! Incident-update order allocation, run inside a caller's transaction.

use beacon_core::update::next_order;
use rusqlite::Connection;

/// The order the next update of `incident_id` receives.
///
/// Must be called in the same write transaction as the insert that uses
/// it; the transaction's write lock is what keeps two creators from
/// reading the same maximum.
pub fn allocate(conn: &Connection, incident_id: &str) -> rusqlite::Result<u32> {
  let max: Option<i64> = conn.query_row(
    "SELECT MAX(ordinal) FROM incident_updates WHERE incident_id = ?1",
    rusqlite::params![incident_id],
    |r| r.get(0),
  )?;
  Ok(next_order(max.map(|m| m as u32)))
}
