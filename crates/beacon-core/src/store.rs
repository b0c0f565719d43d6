//! The `StatusStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `beacon-store-sqlite`).
//! Higher layers (`beacon-api`, `beacon-server`) receive a store handle
//! explicitly and depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Classify,
  component::{Component, NewComponent},
  incident::{AffectingIncident, Impact, Incident, NewIncident},
  label::Labels,
  reference::{ImpactType, NewImpactType, Severity},
  update::{IncidentUpdate, NewIncidentUpdate},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`StatusStore::list_components`]. All filters are ANDed.
#[derive(Debug, Clone, Default)]
pub struct ComponentQuery {
  /// Components must carry every one of these labels.
  pub labels:   Labels,
  /// Only return components with at least one active impact.
  pub affected: bool,
  /// Instant for the `affected` filter; `None` means currently ongoing.
  pub at:       Option<DateTime<Utc>>,
}

/// Parameters for [`StatusStore::list_incidents`].
#[derive(Debug, Clone, Default)]
pub struct IncidentQuery {
  /// Only return incidents whose window is active.
  pub active: bool,
  /// Instant for the `active` filter; `None` means currently ongoing.
  pub at:     Option<DateTime<Utc>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Beacon store backend.
///
/// Every method is one logical operation and runs in one store transaction.
/// Implementations hold no state across calls beyond the connection itself.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait StatusStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Components ────────────────────────────────────────────────────────

  fn create_component(
    &self,
    input: NewComponent,
  ) -> impl Future<Output = Result<Component, Self::Error>> + Send + '_;

  fn get_component(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Component>, Self::Error>> + Send + '_;

  /// List components matching `query`. Label containment and the affected
  /// filter are evaluated by the store, not in process.
  fn list_components<'a>(
    &'a self,
    query: &'a ComponentQuery,
  ) -> impl Future<Output = Result<Vec<Component>, Self::Error>> + Send + 'a;

  /// Replace a component's display name and full label set.
  fn update_component(
    &self,
    id: Uuid,
    input: NewComponent,
  ) -> impl Future<Output = Result<Component, Self::Error>> + Send + '_;

  /// Fails with a conflict while any incident still impacts the component.
  fn delete_component(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Impact types ──────────────────────────────────────────────────────

  fn create_impact_type(
    &self,
    input: NewImpactType,
  ) -> impl Future<Output = Result<ImpactType, Self::Error>> + Send + '_;

  fn get_impact_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ImpactType>, Self::Error>> + Send + '_;

  fn list_impact_types(
    &self,
  ) -> impl Future<Output = Result<Vec<ImpactType>, Self::Error>> + Send + '_;

  fn update_impact_type(
    &self,
    id: Uuid,
    input: NewImpactType,
  ) -> impl Future<Output = Result<ImpactType, Self::Error>> + Send + '_;

  fn delete_impact_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Severities ────────────────────────────────────────────────────────

  fn create_severity(
    &self,
    severity: Severity,
  ) -> impl Future<Output = Result<Severity, Self::Error>> + Send + '_;

  fn get_severity(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<Option<Severity>, Self::Error>> + Send + '_;

  /// All severities ordered by value.
  fn list_severities(
    &self,
  ) -> impl Future<Output = Result<Vec<Severity>, Self::Error>> + Send + '_;

  /// Replace the severity stored under `display_name`.
  fn update_severity(
    &self,
    display_name: String,
    severity: Severity,
  ) -> impl Future<Output = Result<Severity, Self::Error>> + Send + '_;

  fn delete_severity(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Phase generations ─────────────────────────────────────────────────

  /// The highest generation in the store, or `0` when none exist.
  fn current_generation(
    &self,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Phase names of `generation` (default: current) ordered by `order`.
  ///
  /// Position in the returned list is the phase's order.
  fn list_phases(
    &self,
    generation: Option<i64>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Persist `names` as generation `current + 1` and return its number.
  fn create_generation(
    &self,
    names: Vec<String>,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  // ── Incidents ─────────────────────────────────────────────────────────

  fn create_incident(
    &self,
    input: NewIncident,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  fn get_incident(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  /// Incidents ordered by `began_at`, newest first.
  fn list_incidents<'a>(
    &'a self,
    query: &'a IncidentQuery,
  ) -> impl Future<Output = Result<Vec<Incident>, Self::Error>> + Send + 'a;

  /// Replace an incident's fields and phase reference, and its impact list
  /// wholesale, in one transaction.
  fn update_incident(
    &self,
    id: Uuid,
    input: NewIncident,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  /// Delete an incident together with its impacts and updates.
  fn delete_incident(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Temporal impact resolution ────────────────────────────────────────

  /// Impacts of `incident_id` active at `at`, or currently ongoing when
  /// `at` is `None`.
  ///
  /// `at` is compared at the store's timestamp precision.
  fn affected_components(
    &self,
    incident_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Impact>, Self::Error>> + Send + '_;

  /// Impacts on `component_id` active at `at`, or currently ongoing when
  /// `at` is `None`.
  fn affecting_incidents(
    &self,
    component_id: Uuid,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<AffectingIncident>, Self::Error>> + Send + '_;

  // ── Incident updates ──────────────────────────────────────────────────

  /// The order the next update of `incident_id` would receive.
  fn next_update_order(
    &self,
    incident_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Allocate the next order and persist the update atomically.
  fn create_update(
    &self,
    incident_id: Uuid,
    input: NewIncidentUpdate,
  ) -> impl Future<Output = Result<IncidentUpdate, Self::Error>> + Send + '_;

  fn get_update(
    &self,
    incident_id: Uuid,
    order: u32,
  ) -> impl Future<Output = Result<Option<IncidentUpdate>, Self::Error>> + Send + '_;

  /// All updates of an incident in ascending order.
  fn list_updates(
    &self,
    incident_id: Uuid,
  ) -> impl Future<Output = Result<Vec<IncidentUpdate>, Self::Error>> + Send + '_;

  /// Rewrite the content fields of an update; its order never changes.
  fn update_update(
    &self,
    incident_id: Uuid,
    order: u32,
    input: NewIncidentUpdate,
  ) -> impl Future<Output = Result<IncidentUpdate, Self::Error>> + Send + '_;

  /// Delete exactly `(incident_id, order)`. Remaining orders are untouched.
  fn delete_update(
    &self,
    incident_id: Uuid,
    order: u32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
