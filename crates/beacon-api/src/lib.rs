//! JSON REST API for Beacon.
//!
//! Exposes an axum [`Router`] backed by any [`beacon_core::store::StatusStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", beacon_api::api_router(store.clone()))
//! ```

pub mod components;
pub mod error;
pub mod impact_types;
pub mod incidents;
pub mod phases;
pub mod severities;
pub mod updates;
pub mod wire;

use std::sync::Arc;

use axum::{Router, routing::get};
use beacon_core::store::StatusStore;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub use error::ApiError;

/// `?at=<rfc3339>` on single-entity reads. Absent means "currently ongoing".
#[derive(Debug, Deserialize, Default)]
pub struct AtParams {
  pub at: Option<DateTime<Utc>>,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: StatusStore + 'static,
{
  Router::new()
    // Components
    .route(
      "/components",
      get(components::list::<S>).post(components::create::<S>),
    )
    .route(
      "/components/{id}",
      get(components::get_one::<S>)
        .put(components::update_one::<S>)
        .delete(components::delete_one::<S>),
    )
    // Impact types
    .route(
      "/impact-types",
      get(impact_types::list::<S>).post(impact_types::create::<S>),
    )
    .route(
      "/impact-types/{id}",
      get(impact_types::get_one::<S>)
        .put(impact_types::update_one::<S>)
        .delete(impact_types::delete_one::<S>),
    )
    // Severities
    .route(
      "/severities",
      get(severities::list::<S>).post(severities::create::<S>),
    )
    .route(
      "/severities/{name}",
      get(severities::get_one::<S>)
        .put(severities::update_one::<S>)
        .delete(severities::delete_one::<S>),
    )
    // Phases
    .route("/phases", get(phases::list::<S>).post(phases::create::<S>))
    .route("/phases/generation", get(phases::current::<S>))
    // Incidents
    .route(
      "/incidents",
      get(incidents::list::<S>).post(incidents::create::<S>),
    )
    .route(
      "/incidents/{id}",
      get(incidents::get_one::<S>)
        .put(incidents::update_one::<S>)
        .delete(incidents::delete_one::<S>),
    )
    // Incident updates
    .route(
      "/incidents/{id}/updates",
      get(updates::list::<S>).post(updates::create::<S>),
    )
    .route(
      "/incidents/{id}/updates/{order}",
      get(updates::get_one::<S>)
        .put(updates::update_one::<S>)
        .delete(updates::delete_one::<S>),
    )
    .with_state(store)
}
