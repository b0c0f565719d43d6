//! Handlers for `/components` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/components` | Optional `?labels=k:v,k2:v2`, `?affected=true`, `?at=<rfc3339>` |
//! | `POST`   | `/components` | Body: [`ComponentBody`] |
//! | `GET`    | `/components/:id` | `affectedBy` resolved at `?at=` (default: ongoing) |
//! | `PUT`    | `/components/:id` | Replaces name and full label set |
//! | `DELETE` | `/components/:id` | 409 while an incident still references it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use beacon_core::{
  component::{Component, NewComponent},
  label::{self, Labels},
  store::{ComponentQuery, StatusStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AtParams,
  error::ApiError,
  wire::{self, WireComponent},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBody {
  pub display_name: String,
  #[serde(default)]
  pub labels:       Labels,
}

impl From<ComponentBody> for NewComponent {
  fn from(b: ComponentBody) -> Self {
    NewComponent { display_name: b.display_name, labels: b.labels }
  }
}

async fn project<S: StatusStore>(
  store: &S,
  component: Component,
  at: Option<DateTime<Utc>>,
) -> Result<WireComponent, ApiError> {
  let affected_by = store
    .affecting_incidents(component.id, at)
    .await
    .map_err(ApiError::store)?;
  Ok(wire::component(component, &affected_by))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Comma-separated `key:value` pairs; all must be present on a component.
  pub labels:   Option<String>,
  /// Only return components with an active impact.
  #[serde(default)]
  pub affected: bool,
  pub at:       Option<DateTime<Utc>>,
}

/// `GET /components[?labels=...][&affected=true][&at=...]`
pub async fn list<S: StatusStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<WireComponent>>, ApiError> {
  let query = ComponentQuery {
    labels:   params
      .labels
      .as_deref()
      .map(label::parse_selector)
      .transpose()?
      .unwrap_or_default(),
    affected: params.affected,
    at:       params.at,
  };

  let components = store
    .list_components(&query)
    .await
    .map_err(ApiError::store)?;

  let mut out = Vec::with_capacity(components.len());
  for component in components {
    out.push(project(store.as_ref(), component, params.at).await?);
  }
  Ok(Json(out))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /components`
pub async fn create<S: StatusStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<ComponentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let component = store
    .create_component(body.into())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(wire::component(component, &[]))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /components/:id[?at=...]`
pub async fn get_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<AtParams>,
) -> Result<Json<WireComponent>, ApiError> {
  let component = store
    .get_component(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("component {id} not found")))?;
  Ok(Json(project(store.as_ref(), component, params.at).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /components/:id`
pub async fn update_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ComponentBody>,
) -> Result<Json<WireComponent>, ApiError> {
  let component = store
    .update_component(id, body.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project(store.as_ref(), component, None).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /components/:id`
pub async fn delete_one<S: StatusStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_component(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
