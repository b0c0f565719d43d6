//! Handlers for `/phases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/phases` | Names of `?generation=` (default: current), index = order |
//! | `POST` | `/phases` | Body: `["investigating","identified",...]`, creates the next generation |
//! | `GET`  | `/phases/generation` | `{"generation": n}`, `0` when none exist |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::store::StatusStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub generation: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationBody {
  pub generation: u32,
}

/// `GET /phases[?generation=<n>]`
pub async fn list<S: StatusStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<String>>, ApiError> {
  let names = store
    .list_phases(params.generation)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(names))
}

/// `POST /phases`
pub async fn create<S: StatusStore>(
  State(store): State<Arc<S>>,
  Json(names): Json<Vec<String>>,
) -> Result<impl IntoResponse, ApiError> {
  let generation = store
    .create_generation(names)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(GenerationBody { generation })))
}

/// `GET /phases/generation`
pub async fn current<S: StatusStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<GenerationBody>, ApiError> {
  let generation = store.current_generation().await.map_err(ApiError::store)?;
  Ok(Json(GenerationBody { generation }))
}
