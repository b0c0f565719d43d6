//! Handlers for `/incidents` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/incidents` | Newest first; `?active=true` narrows to incidents active at `?at=` (default: ongoing) |
//! | `POST`   | `/incidents` | Body: [`IncidentBody`]; omitted `phase` pins order 0 of the current generation |
//! | `GET`    | `/incidents/:id` | `affects` resolved at `?at=` (default: ongoing) |
//! | `PUT`    | `/incidents/:id` | Replaces fields and the whole impact list; omitted `phase` keeps the current one |
//! | `DELETE` | `/incidents/:id` | Cascades to impacts and updates |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{
  incident::{Impact, Incident, NewIncident},
  phase::PhaseRef,
  store::{IncidentQuery, StatusStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AtParams,
  error::ApiError,
  wire::{self, WireIncident},
};

// ─── Request bodies ──────────────────────────────────────────────────────────

/// One entry of an incident's `affects` list.
#[derive(Debug, Deserialize)]
pub struct ImpactBody {
  /// Component id.
  pub reference: Uuid,
  /// Impact type id.
  #[serde(rename = "type")]
  pub kind:      Uuid,
  pub severity:  i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentBody {
  pub display_name: String,
  #[serde(default)]
  pub description:  String,
  pub began_at:     DateTime<Utc>,
  #[serde(default)]
  pub ended_at:     Option<DateTime<Utc>>,
  #[serde(default)]
  pub phase:        Option<PhaseRef>,
  #[serde(default)]
  pub affects:      Vec<ImpactBody>,
}

impl TryFrom<IncidentBody> for NewIncident {
  type Error = beacon_core::Error;

  fn try_from(b: IncidentBody) -> Result<Self, Self::Error> {
    let impacts = b
      .affects
      .into_iter()
      .map(|a| Impact::new(a.reference, a.kind, a.severity))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(NewIncident {
      display_name: b.display_name,
      description: b.description,
      began_at: b.began_at,
      ended_at: b.ended_at,
      phase: b.phase,
      impacts,
    })
  }
}

async fn project<S: StatusStore>(
  store: &S,
  incident: Incident,
  at: Option<DateTime<Utc>>,
) -> Result<WireIncident, ApiError> {
  let affects = store
    .affected_components(incident.id, at)
    .await
    .map_err(ApiError::store)?;
  let updates = store.list_updates(incident.id).await.map_err(ApiError::store)?;
  Ok(wire::incident(incident, &affects, &updates))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  #[serde(default)]
  pub active: bool,
  pub at:     Option<DateTime<Utc>>,
}

/// `GET /incidents[?active=true][&at=...]`
pub async fn list<S: StatusStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<WireIncident>>, ApiError> {
  let query = IncidentQuery { active: params.active, at: params.at };
  let incidents = store
    .list_incidents(&query)
    .await
    .map_err(ApiError::store)?;

  let mut out = Vec::with_capacity(incidents.len());
  for incident in incidents {
    out.push(project(store.as_ref(), incident, params.at).await?);
  }
  Ok(Json(out))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /incidents`
pub async fn create<S: StatusStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<IncidentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let incident = store
    .create_incident(body.try_into()?)
    .await
    .map_err(ApiError::store)?;
  let wire = project(store.as_ref(), incident, None).await?;
  Ok((StatusCode::CREATED, Json(wire)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /incidents/:id[?at=...]`
pub async fn get_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<AtParams>,
) -> Result<Json<WireIncident>, ApiError> {
  let incident = store
    .get_incident(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("incident {id} not found")))?;
  Ok(Json(project(store.as_ref(), incident, params.at).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /incidents/:id`
pub async fn update_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<IncidentBody>,
) -> Result<Json<WireIncident>, ApiError> {
  let incident = store
    .update_incident(id, body.try_into()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project(store.as_ref(), incident, None).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /incidents/:id`
pub async fn delete_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_incident(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
