//! Handlers for `/impact-types` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/impact-types` | Ordered by display name |
//! | `POST`   | `/impact-types` | Body: `{"displayName":"outage","description":"..."}` |
//! | `GET`    | `/impact-types/:id` | 404 if not found |
//! | `PUT`    | `/impact-types/:id` | |
//! | `DELETE` | `/impact-types/:id` | 409 while an impact still uses it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{reference::NewImpactType, store::StatusStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, wire::WireImpactType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTypeBody {
  pub display_name: String,
  #[serde(default)]
  pub description:  String,
}

impl From<ImpactTypeBody> for NewImpactType {
  fn from(b: ImpactTypeBody) -> Self {
    NewImpactType { display_name: b.display_name, description: b.description }
  }
}

/// `GET /impact-types`
pub async fn list<S: StatusStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<WireImpactType>>, ApiError> {
  let types = store.list_impact_types().await.map_err(ApiError::store)?;
  Ok(Json(types.into_iter().map(WireImpactType::from).collect()))
}

/// `POST /impact-types`
pub async fn create<S: StatusStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<ImpactTypeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let created = store
    .create_impact_type(body.into())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(WireImpactType::from(created))))
}

/// `GET /impact-types/:id`
pub async fn get_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<WireImpactType>, ApiError> {
  let found = store
    .get_impact_type(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("impact type {id} not found")))?;
  Ok(Json(found.into()))
}

/// `PUT /impact-types/:id`
pub async fn update_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ImpactTypeBody>,
) -> Result<Json<WireImpactType>, ApiError> {
  let updated = store
    .update_impact_type(id, body.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated.into()))
}

/// `DELETE /impact-types/:id`
pub async fn delete_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_impact_type(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
