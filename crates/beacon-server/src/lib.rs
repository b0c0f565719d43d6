//! HTTP server for Beacon.
//!
//! Mounts the JSON API under `/api` with per-request tracing, and carries
//! the runtime configuration and startup provisioning.

pub mod provision;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use beacon_core::store::StatusStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use provision::{ProvisionConfig, provision};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BEACON_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub provision:  ProvisionConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("beacon.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: StatusStore + 'static,
{
  Router::new()
    .nest("/api", beacon_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
