//! Handlers for `/severities` endpoints. Severities are keyed by display
//! name; `value` must lie in `0..=100` and is unique across severities.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{reference::Severity, store::StatusStore};
use serde::Deserialize;

use crate::{error::ApiError, wire::WireSeverity};

/// `value` is taken as a wide integer so out-of-range input is reported as
/// a validation error instead of a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityBody {
  pub display_name: String,
  pub value:        i64,
}

impl TryFrom<SeverityBody> for Severity {
  type Error = beacon_core::Error;

  fn try_from(b: SeverityBody) -> Result<Self, Self::Error> {
    Severity::new(b.display_name, b.value)
  }
}

/// `GET /severities`
pub async fn list<S: StatusStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<WireSeverity>>, ApiError> {
  let all = store.list_severities().await.map_err(ApiError::store)?;
  Ok(Json(all.into_iter().map(WireSeverity::from).collect()))
}

/// `POST /severities`
pub async fn create<S: StatusStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<SeverityBody>,
) -> Result<impl IntoResponse, ApiError> {
  let created = store
    .create_severity(body.try_into()?)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(WireSeverity::from(created))))
}

/// `GET /severities/:name`
pub async fn get_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<WireSeverity>, ApiError> {
  let found = store
    .get_severity(name.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("severity {name} not found")))?;
  Ok(Json(found.into()))
}

/// `PUT /severities/:name`. The body may rename the severity.
pub async fn update_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Json(body): Json<SeverityBody>,
) -> Result<Json<WireSeverity>, ApiError> {
  let updated = store
    .update_severity(name, body.try_into()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated.into()))
}

/// `DELETE /severities/:name`
pub async fn delete_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
  store.delete_severity(name).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
