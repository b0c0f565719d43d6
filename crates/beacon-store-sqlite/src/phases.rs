//! Phase-generation queries, run inside a caller's transaction.

use beacon_core::phase::{Phase, PhaseRef};
use rusqlite::{Connection, OptionalExtension as _};

/// `MAX(generation)` over all phases, or `0` when the table is empty.
pub fn current_generation(conn: &Connection) -> rusqlite::Result<u32> {
  let max: Option<i64> =
    conn.query_row("SELECT MAX(generation) FROM phases", [], |r| r.get(0))?;
  // Generations are CHECKed to be >= 1 and allocated one at a time.
  Ok(max.map_or(0, |g| g as u32))
}

pub fn exists(conn: &Connection, phase: PhaseRef) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM phases WHERE generation = ?1 AND ordinal = ?2",
        rusqlite::params![phase.generation, phase.order],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Names of one generation, by ascending order.
pub fn names(conn: &Connection, generation: u32) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn
    .prepare("SELECT name FROM phases WHERE generation = ?1 ORDER BY ordinal ASC")?;
  stmt
    .query_map(rusqlite::params![generation], |r| r.get(0))?
    .collect()
}

pub fn insert(conn: &Connection, phases: &[Phase]) -> rusqlite::Result<()> {
  let mut stmt = conn
    .prepare("INSERT INTO phases (generation, ordinal, name) VALUES (?1, ?2, ?3)")?;
  for phase in phases {
    stmt.execute(rusqlite::params![phase.generation, phase.order, phase.name])?;
  }
  Ok(())
}
