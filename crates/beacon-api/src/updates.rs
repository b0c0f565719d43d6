//! Handlers for `/incidents/:id/updates` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/incidents/:id/updates` | Ascending order |
//! | `POST`   | `/incidents/:id/updates` | Allocates the next order |
//! | `GET`    | `/incidents/:id/updates/:order` | |
//! | `PUT`    | `/incidents/:id/updates/:order` | Content only; order is fixed |
//! | `DELETE` | `/incidents/:id/updates/:order` | Leaves a gap in the sequence |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{store::StatusStore, update::NewIncidentUpdate};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  wire::{self, WireIncidentUpdate},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub display_name: String,
  #[serde(default)]
  pub description:  String,
}

impl From<UpdateBody> for NewIncidentUpdate {
  fn from(b: UpdateBody) -> Self { NewIncidentUpdate::new(b.display_name, b.description) }
}

/// `GET /incidents/:id/updates`
pub async fn list<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<Uuid>,
) -> Result<Json<Vec<WireIncidentUpdate>>, ApiError> {
  let updates = store
    .list_updates(incident_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updates.into_iter().map(wire::incident_update).collect()))
}

/// `POST /incidents/:id/updates`
pub async fn create<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(incident_id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let update = store
    .create_update(incident_id, body.into())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(wire::incident_update(update))))
}

/// `GET /incidents/:id/updates/:order`
pub async fn get_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path((incident_id, order)): Path<(Uuid, u32)>,
) -> Result<Json<WireIncidentUpdate>, ApiError> {
  let update = store
    .get_update(incident_id, order)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("update {order} of incident {incident_id} not found"))
    })?;
  Ok(Json(wire::incident_update(update)))
}

/// `PUT /incidents/:id/updates/:order`
pub async fn update_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path((incident_id, order)): Path<(Uuid, u32)>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<WireIncidentUpdate>, ApiError> {
  let update = store
    .update_update(incident_id, order, body.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(wire::incident_update(update)))
}

/// `DELETE /incidents/:id/updates/:order`
pub async fn delete_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path((incident_id, order)): Path<(Uuid, u32)>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_update(incident_id, order)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
