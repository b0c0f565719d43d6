//! [`SqliteStore`], the SQLite implementation of [`StatusStore`].

use std::path::Path;

use beacon_core::{
  component::{Component, NewComponent},
  incident::{AffectingIncident, Impact, Incident, NewIncident},
  phase::{self, PhaseRef},
  reference::{ImpactType, NewImpactType, Severity},
  store::{ComponentQuery, IncidentQuery, StatusStore},
  update::{IncidentUpdate, NewIncidentUpdate},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    INCIDENT_COLUMNS, RawComponent, RawImpact, RawImpactType, RawIncident, RawUpdate,
    UPDATE_COLUMNS, decode_severity, encode_dt, encode_uuid, stored_precision,
  },
  error::Context as _,
  impacts, phases,
  query::{Filter, component_affected, labels_contain, window_active},
  schema::SCHEMA,
  updates,
};

/// Outcome of a closure run on the connection thread: either a value or a
/// domain error detected mid-transaction (which rolls the transaction back).
type Checked<T> = std::result::Result<T, beacon_core::Error>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Beacon store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// operation runs in its own transaction; writes take the write lock up
/// front (`BEGIN IMMEDIATE`).
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let key = path.as_ref().display().to_string();
    let conn = tokio_rusqlite::Connection::open(path).await.during("open", key)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .during("open", ":memory:")?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .during("init_schema", "")?;
    Ok(())
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

pub(crate) fn row_exists(
  conn: &Connection,
  table: &str,
  column: &str,
  id: &str,
) -> rusqlite::Result<bool> {
  conn.query_row(
    &format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE {column} = ?1)"),
    rusqlite::params![id],
    |r| r.get(0),
  )
}

fn load_labels(conn: &Connection, component_id: &str) -> rusqlite::Result<Vec<(String, String)>> {
  let mut stmt = conn.prepare(
    "SELECT key, value FROM component_labels WHERE component_id = ?1 ORDER BY key",
  )?;
  stmt
    .query_map(rusqlite::params![component_id], |r| Ok((r.get(0)?, r.get(1)?)))?
    .collect()
}

fn write_labels(
  conn: &Connection,
  component_id: &str,
  input: &NewComponent,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM component_labels WHERE component_id = ?1",
    rusqlite::params![component_id],
  )?;
  let mut stmt = conn.prepare(
    "INSERT INTO component_labels (component_id, key, value) VALUES (?1, ?2, ?3)",
  )?;
  for (key, value) in &input.labels {
    stmt.execute(rusqlite::params![component_id, key, value])?;
  }
  Ok(())
}

fn select_incident(conn: &Connection, incident_id: &str) -> rusqlite::Result<Option<RawIncident>> {
  conn
    .query_row(
      &format!("SELECT {INCIDENT_COLUMNS} FROM incidents AS i WHERE i.incident_id = ?1"),
      rusqlite::params![incident_id],
      RawIncident::from_row,
    )
    .optional()
}

fn select_update(
  conn: &Connection,
  incident_id: &str,
  order: u32,
) -> rusqlite::Result<Option<RawUpdate>> {
  conn
    .query_row(
      &format!(
        "SELECT {UPDATE_COLUMNS} FROM incident_updates WHERE incident_id = ?1 AND ordinal = ?2"
      ),
      rusqlite::params![incident_id, order],
      RawUpdate::from_row,
    )
    .optional()
}

/// Encoded scalar columns of an incident write.
struct IncidentRow {
  display_name: String,
  description:  String,
  began_at:     String,
  ended_at:     Option<String>,
}

impl From<&NewIncident> for IncidentRow {
  fn from(input: &NewIncident) -> Self {
    Self {
      display_name: input.display_name.clone(),
      description:  input.description.clone(),
      began_at:     encode_dt(input.began_at),
      ended_at:     input.ended_at.map(encode_dt),
    }
  }
}

/// Check the phase reference and impact targets of an incident write.
fn check_incident_refs(conn: &Connection, input: &NewIncident) -> rusqlite::Result<Checked<()>> {
  if let Some(phase) = input.phase
    && !phases::exists(conn, phase)?
  {
    return Ok(Err(beacon_core::Error::PhaseNotFound(phase)));
  }
  if let Some(err) = impacts::check_references(conn, &input.impacts)? {
    return Ok(Err(err));
  }
  Ok(Ok(()))
}

// ─── StatusStore impl ────────────────────────────────────────────────────────

impl StatusStore for SqliteStore {
  type Error = Error;

  // ── Components ────────────────────────────────────────────────────────────

  async fn create_component(&self, input: NewComponent) -> Result<Component> {
    input.validate()?;

    let component = Component {
      id:           Uuid::new_v4(),
      display_name: input.display_name.clone(),
      labels:       input.labels.clone(),
    };
    let id_str = encode_uuid(component.id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO components (component_id, display_name) VALUES (?1, ?2)",
          rusqlite::params![id_str, input.display_name],
        )?;
        write_labels(&tx, &id_str, &input)?;
        tx.commit()?;
        Ok(())
      })
      .await
      .during("create_component", component.id)?;

    tracing::debug!(component = %component.id, "component created");
    Ok(component)
  }

  async fn get_component(&self, id: Uuid) -> Result<Option<Component>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComponent> = self
      .conn
      .call(move |conn| {
        let display_name: Option<String> = conn
          .query_row(
            "SELECT display_name FROM components WHERE component_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(display_name) = display_name else {
          return Ok(None);
        };
        let labels = load_labels(conn, &id_str)?;
        Ok(Some(RawComponent { component_id: id_str, display_name, labels }))
      })
      .await
      .during("get_component", id)?;

    raw.map(RawComponent::into_component).transpose()
  }

  async fn list_components(&self, query: &ComponentQuery) -> Result<Vec<Component>> {
    let filter = Filter::new()
      .and_maybe(labels_contain("c.component_id", &query.labels)?)
      .and_maybe(
        query
          .affected
          .then(|| component_affected("c.component_id", query.at)),
      );

    let raws: Vec<RawComponent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql = format!(
          "SELECT c.component_id, c.display_name
           FROM components AS c
           {}
           ORDER BY c.display_name, c.component_id",
          filter.where_clause()
        );
        let heads: Vec<(String, String)> = {
          let mut stmt = tx.prepare(&sql)?;
          stmt
            .query_map(rusqlite::params_from_iter(filter.params()), |r| {
              Ok((r.get(0)?, r.get(1)?))
            })?
            .collect::<rusqlite::Result<_>>()?
        };

        let mut raws = Vec::with_capacity(heads.len());
        for (component_id, display_name) in heads {
          let labels = load_labels(&tx, &component_id)?;
          raws.push(RawComponent { component_id, display_name, labels });
        }
        tx.commit()?;
        Ok(raws)
      })
      .await
      .during("list_components", "")?;

    raws.into_iter().map(RawComponent::into_component).collect()
  }

  async fn update_component(&self, id: Uuid, input: NewComponent) -> Result<Component> {
    input.validate()?;

    let id_str = encode_uuid(id);
    let component = Component {
      id,
      display_name: input.display_name.clone(),
      labels: input.labels.clone(),
    };

    let found: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE components SET display_name = ?1 WHERE component_id = ?2",
          rusqlite::params![input.display_name, id_str],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        write_labels(&tx, &id_str, &input)?;
        tx.commit()?;
        Ok(true)
      })
      .await
      .during("update_component", id)?;

    if !found {
      return Err(beacon_core::Error::ComponentNotFound(id).into());
    }
    tracing::debug!(component = %id, "component updated");
    Ok(component)
  }

  async fn delete_component(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM components WHERE component_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .during("delete_component", id)?;

    if deleted == 0 {
      return Err(beacon_core::Error::ComponentNotFound(id).into());
    }
    tracing::debug!(component = %id, "component deleted");
    Ok(())
  }

  // ── Impact types ──────────────────────────────────────────────────────────

  async fn create_impact_type(&self, input: NewImpactType) -> Result<ImpactType> {
    input.validate()?;

    let impact_type = ImpactType {
      id:           Uuid::new_v4(),
      display_name: input.display_name,
      description:  input.description,
    };
    let id_str = encode_uuid(impact_type.id);
    let name = impact_type.display_name.clone();
    let description = impact_type.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO impact_types (impact_type_id, display_name, description)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, description],
        )?;
        Ok(())
      })
      .await
      .during("create_impact_type", impact_type.id)?;

    Ok(impact_type)
  }

  async fn get_impact_type(&self, id: Uuid) -> Result<Option<ImpactType>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawImpactType> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT impact_type_id, display_name, description
               FROM impact_types WHERE impact_type_id = ?1",
              rusqlite::params![id_str],
              RawImpactType::from_row,
            )
            .optional()?,
        )
      })
      .await
      .during("get_impact_type", id)?;

    raw.map(RawImpactType::into_impact_type).transpose()
  }

  async fn list_impact_types(&self) -> Result<Vec<ImpactType>> {
    let raws: Vec<RawImpactType> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT impact_type_id, display_name, description
           FROM impact_types ORDER BY display_name, impact_type_id",
        )?;
        let rows = stmt
          .query_map([], RawImpactType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .during("list_impact_types", "")?;

    raws.into_iter().map(RawImpactType::into_impact_type).collect()
  }

  async fn update_impact_type(&self, id: Uuid, input: NewImpactType) -> Result<ImpactType> {
    input.validate()?;

    let id_str = encode_uuid(id);
    let name = input.display_name.clone();
    let description = input.description.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE impact_types SET display_name = ?1, description = ?2
           WHERE impact_type_id = ?3",
          rusqlite::params![name, description, id_str],
        )?)
      })
      .await
      .during("update_impact_type", id)?;

    if changed == 0 {
      return Err(beacon_core::Error::ImpactTypeNotFound(id).into());
    }
    Ok(ImpactType { id, display_name: input.display_name, description: input.description })
  }

  async fn delete_impact_type(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM impact_types WHERE impact_type_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .during("delete_impact_type", id)?;

    if deleted == 0 {
      return Err(beacon_core::Error::ImpactTypeNotFound(id).into());
    }
    Ok(())
  }

  // ── Severities ────────────────────────────────────────────────────────────

  async fn create_severity(&self, severity: Severity) -> Result<Severity> {
    let Severity { display_name, value } =
      Severity::new(severity.display_name, severity.value.into())?;
    let name = display_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO severities (display_name, value) VALUES (?1, ?2)",
          rusqlite::params![name, value],
        )?;
        Ok(())
      })
      .await
      .during("create_severity", &display_name)?;

    Ok(Severity { display_name, value })
  }

  async fn get_severity(&self, display_name: String) -> Result<Option<Severity>> {
    let key = display_name.clone();

    let raw: Option<(String, i64)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT display_name, value FROM severities WHERE display_name = ?1",
              rusqlite::params![display_name],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await
      .during("get_severity", key)?;

    raw
      .map(|(display_name, value)| {
        Ok(Severity { display_name, value: decode_severity(value)? })
      })
      .transpose()
  }

  async fn list_severities(&self) -> Result<Vec<Severity>> {
    let raws: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT display_name, value FROM severities ORDER BY value ASC")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .during("list_severities", "")?;

    raws
      .into_iter()
      .map(|(display_name, value)| {
        Ok(Severity { display_name, value: decode_severity(value)? })
      })
      .collect()
  }

  async fn update_severity(&self, display_name: String, severity: Severity) -> Result<Severity> {
    let severity = Severity::new(severity.display_name, severity.value.into())?;
    let key = display_name.clone();
    let new_name = severity.display_name.clone();
    let value = severity.value;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE severities SET display_name = ?1, value = ?2 WHERE display_name = ?3",
          rusqlite::params![new_name, value, display_name],
        )?)
      })
      .await
      .during("update_severity", &key)?;

    if changed == 0 {
      return Err(beacon_core::Error::SeverityNotFound(key).into());
    }
    Ok(severity)
  }

  async fn delete_severity(&self, display_name: String) -> Result<()> {
    let key = display_name.clone();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM severities WHERE display_name = ?1",
          rusqlite::params![display_name],
        )?)
      })
      .await
      .during("delete_severity", &key)?;

    if deleted == 0 {
      return Err(beacon_core::Error::SeverityNotFound(key).into());
    }
    Ok(())
  }

  // ── Phase generations ─────────────────────────────────────────────────────

  async fn current_generation(&self) -> Result<u32> {
    self
      .conn
      .call(|conn| Ok(phases::current_generation(conn)?))
      .await
      .during("current_generation", "")
  }

  async fn list_phases(&self, generation: Option<i64>) -> Result<Vec<String>> {
    let key = generation.map_or_else(|| "current".to_owned(), |g| g.to_string());

    let names: Checked<Vec<String>> = self
      .conn
      .call(move |conn| {
        // Resolve and read in one snapshot so a concurrent generation write
        // cannot slip between the two.
        let tx = conn.transaction()?;
        let current = phases::current_generation(&tx)?;
        let generation = match phase::resolve_generation(generation, current) {
          Ok(g) => g,
          Err(e) => return Ok(Err(e)),
        };
        let names = phases::names(&tx, generation)?;
        tx.commit()?;
        Ok(Ok(names))
      })
      .await
      .during("list_phases", key)?;

    Ok(names?)
  }

  async fn create_generation(&self, names: Vec<String>) -> Result<u32> {
    // Fail fast before taking the write lock; the real check reruns with the
    // allocated number.
    phase::build_generation(1, &names)?;

    let created: Checked<u32> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let next = phases::current_generation(&tx)? + 1;
        let rows = match phase::build_generation(next, &names) {
          Ok(rows) => rows,
          Err(e) => return Ok(Err(e)),
        };
        phases::insert(&tx, &rows)?;
        tx.commit()?;
        Ok(Ok(next))
      })
      .await
      .during("create_generation", "")?;

    let generation = created?;
    tracing::info!(generation, "phase generation created");
    Ok(generation)
  }

  // ── Incidents ─────────────────────────────────────────────────────────────

  async fn create_incident(&self, input: NewIncident) -> Result<Incident> {
    input.validate()?;

    let id = Uuid::new_v4();
    let id_str = encode_uuid(id);
    let row = IncidentRow::from(&input);

    let raw: Checked<RawIncident> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Err(e) = check_incident_refs(&tx, &input)? {
          return Ok(Err(e));
        }

        let phase = match input.phase {
          Some(phase) => phase,
          None => match phases::current_generation(&tx)? {
            0 => return Ok(Err(beacon_core::Error::GenerationNotFound(0))),
            current => PhaseRef::new(current, 0),
          },
        };

        tx.execute(
          "INSERT INTO incidents (
             incident_id, display_name, description, began_at, ended_at,
             phase_generation, phase_order
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            row.display_name,
            row.description,
            row.began_at,
            row.ended_at,
            phase.generation,
            phase.order,
          ],
        )?;
        impacts::replace(&tx, &id_str, &input.impacts)?;

        let raw = select_incident(&tx, &id_str)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await
      .during("create_incident", id)?;

    let incident = raw?.into_incident()?;
    tracing::debug!(incident = %id, phase = ?incident.phase, "incident created");
    Ok(incident)
  }

  async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_incident(conn, &id_str)?))
      .await
      .during("get_incident", id)?;

    raw.map(RawIncident::into_incident).transpose()
  }

  async fn list_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>> {
    let filter = Filter::new().and_maybe(query.active.then(|| window_active("i", query.at)));

    let raws: Vec<RawIncident> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {INCIDENT_COLUMNS}
           FROM incidents AS i
           {}
           ORDER BY i.began_at DESC, i.incident_id",
          filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(filter.params()), RawIncident::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .during("list_incidents", "")?;

    raws.into_iter().map(RawIncident::into_incident).collect()
  }

  async fn update_incident(&self, id: Uuid, input: NewIncident) -> Result<Incident> {
    input.validate()?;

    let id_str = encode_uuid(id);
    let row = IncidentRow::from(&input);

    let raw: Checked<RawIncident> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "incidents", "incident_id", &id_str)? {
          return Ok(Err(beacon_core::Error::IncidentNotFound(id)));
        }
        if let Err(e) = check_incident_refs(&tx, &input)? {
          return Ok(Err(e));
        }

        tx.execute(
          "UPDATE incidents SET
             display_name     = ?1,
             description      = ?2,
             began_at         = ?3,
             ended_at         = ?4,
             phase_generation = COALESCE(?5, phase_generation),
             phase_order      = COALESCE(?6, phase_order)
           WHERE incident_id = ?7",
          rusqlite::params![
            row.display_name,
            row.description,
            row.began_at,
            row.ended_at,
            input.phase.map(|p| p.generation),
            input.phase.map(|p| p.order),
            id_str,
          ],
        )?;
        // Readers never see the gap: the delete and the inserts commit
        // together or not at all.
        impacts::replace(&tx, &id_str, &input.impacts)?;

        let raw = select_incident(&tx, &id_str)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await
      .during("update_incident", id)?;

    let incident = raw?.into_incident()?;
    tracing::debug!(incident = %id, phase = ?incident.phase, "incident updated");
    Ok(incident)
  }

  async fn delete_incident(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM incidents WHERE incident_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .during("delete_incident", id)?;

    if deleted == 0 {
      return Err(beacon_core::Error::IncidentNotFound(id).into());
    }
    tracing::debug!(incident = %id, "incident deleted");
    Ok(())
  }

  // ── Temporal impact resolution ────────────────────────────────────────────

  async fn affected_components(
    &self,
    incident_id: Uuid,
    at:          Option<DateTime<Utc>>,
  ) -> Result<Vec<Impact>> {
    let id_str = encode_uuid(incident_id);

    let raws: Checked<Vec<RawImpact>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "incidents", "incident_id", &id_str)? {
          return Ok(Err(beacon_core::Error::IncidentNotFound(incident_id)));
        }
        let rows = impacts::affected(&tx, &id_str, at)?;
        tx.commit()?;
        Ok(Ok(rows))
      })
      .await
      .during("affected_components", incident_id)?;

    raws?.into_iter().map(RawImpact::into_affected).collect()
  }

  async fn affecting_incidents(
    &self,
    component_id: Uuid,
    at:           Option<DateTime<Utc>>,
  ) -> Result<Vec<AffectingIncident>> {
    let id_str = encode_uuid(component_id);

    let raws: Checked<Vec<RawImpact>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "components", "component_id", &id_str)? {
          return Ok(Err(beacon_core::Error::ComponentNotFound(component_id)));
        }
        let rows = impacts::affecting(&tx, &id_str, at)?;
        tx.commit()?;
        Ok(Ok(rows))
      })
      .await
      .during("affecting_incidents", component_id)?;

    raws?.into_iter().map(RawImpact::into_affecting).collect()
  }

  // ── Incident updates ──────────────────────────────────────────────────────

  async fn next_update_order(&self, incident_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(incident_id);

    let next: Checked<u32> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "incidents", "incident_id", &id_str)? {
          return Ok(Err(beacon_core::Error::IncidentNotFound(incident_id)));
        }
        let next = updates::allocate(&tx, &id_str)?;
        tx.commit()?;
        Ok(Ok(next))
      })
      .await
      .during("next_update_order", incident_id)?;

    Ok(next?)
  }

  async fn create_update(
    &self,
    incident_id: Uuid,
    input:       NewIncidentUpdate,
  ) -> Result<IncidentUpdate> {
    input.validate()?;

    let id_str = encode_uuid(incident_id);
    let created_at = stored_precision(Utc::now());
    let created_at_str = encode_dt(created_at);
    let display_name = input.display_name.clone();
    let description = input.description.clone();

    let order: Checked<u32> = self
      .conn
      .call(move |conn| {
        // IMMEDIATE: the max is read under the write lock, so no other
        // writer can allocate the same order before this insert commits.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "incidents", "incident_id", &id_str)? {
          return Ok(Err(beacon_core::Error::IncidentNotFound(incident_id)));
        }
        let order = updates::allocate(&tx, &id_str)?;
        tx.execute(
          "INSERT INTO incident_updates (
             incident_id, ordinal, display_name, description, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, order, display_name, description, created_at_str],
        )?;
        tx.commit()?;
        Ok(Ok(order))
      })
      .await
      .during("create_update", incident_id)?;

    let order = order?;
    tracing::debug!(incident = %incident_id, order, "incident update created");
    Ok(IncidentUpdate {
      incident_id,
      order,
      display_name: input.display_name,
      description: input.description,
      created_at,
    })
  }

  async fn get_update(&self, incident_id: Uuid, order: u32) -> Result<Option<IncidentUpdate>> {
    let id_str = encode_uuid(incident_id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_update(conn, &id_str, order)?))
      .await
      .during("get_update", format!("{incident_id}/{order}"))?;

    raw.map(RawUpdate::into_update).transpose()
  }

  async fn list_updates(&self, incident_id: Uuid) -> Result<Vec<IncidentUpdate>> {
    let id_str = encode_uuid(incident_id);

    let raws: Checked<Vec<RawUpdate>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !row_exists(&tx, "incidents", "incident_id", &id_str)? {
          return Ok(Err(beacon_core::Error::IncidentNotFound(incident_id)));
        }
        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {UPDATE_COLUMNS} FROM incident_updates
             WHERE incident_id = ?1 ORDER BY ordinal ASC"
          ))?;
          stmt
            .query_map(rusqlite::params![id_str], RawUpdate::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(Ok(rows))
      })
      .await
      .during("list_updates", incident_id)?;

    raws?.into_iter().map(RawUpdate::into_update).collect()
  }

  async fn update_update(
    &self,
    incident_id: Uuid,
    order:       u32,
    input:       NewIncidentUpdate,
  ) -> Result<IncidentUpdate> {
    input.validate()?;

    let id_str = encode_uuid(incident_id);

    let raw: Option<RawUpdate> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE incident_updates SET display_name = ?1, description = ?2
           WHERE incident_id = ?3 AND ordinal = ?4",
          rusqlite::params![input.display_name, input.description, id_str, order],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = select_update(&tx, &id_str, order)?;
        tx.commit()?;
        Ok(raw)
      })
      .await
      .during("update_update", format!("{incident_id}/{order}"))?;

    raw
      .ok_or(beacon_core::Error::UpdateNotFound { incident: incident_id, order })?
      .into_update()
  }

  async fn delete_update(&self, incident_id: Uuid, order: u32) -> Result<()> {
    let id_str = encode_uuid(incident_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM incident_updates WHERE incident_id = ?1 AND ordinal = ?2",
          rusqlite::params![id_str, order],
        )?)
      })
      .await
      .during("delete_update", format!("{incident_id}/{order}"))?;

    if deleted == 0 {
      return Err(beacon_core::Error::UpdateNotFound { incident: incident_id, order }.into());
    }
    tracing::debug!(incident = %incident_id, order, "incident update deleted");
    Ok(())
  }
}
