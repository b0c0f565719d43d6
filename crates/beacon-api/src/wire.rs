//! Wire representation of persisted entities.
//!
//! Pure projections: no store access, no failure modes. Handlers load the
//! entity and whatever impact resolution and update list it needs, then
//! project.

use beacon_core::{
  component::Component,
  incident::{AffectingIncident, Impact, Incident},
  label::Labels,
  phase::PhaseRef,
  reference::{ImpactType, Severity},
  update::IncidentUpdate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One impact as seen from the other side of the relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactRef {
  /// The incident (on a component) or the component (on an incident).
  pub reference: Uuid,
  #[serde(rename = "type")]
  pub kind:      Uuid,
  pub severity:  u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComponent {
  pub id:           Uuid,
  pub display_name: String,
  pub labels:       Labels,
  pub affected_by:  Vec<ImpactRef>,
}

/// `phase` is the pinned `(generation, order)` pair, never the phase name.
/// `updates` lists update orders only; bodies live under their own path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIncident {
  pub id:           Uuid,
  pub display_name: String,
  pub description:  String,
  pub began_at:     DateTime<Utc>,
  pub ended_at:     Option<DateTime<Utc>>,
  pub phase:        PhaseRef,
  pub affects:      Vec<ImpactRef>,
  pub updates:      Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIncidentUpdate {
  pub incident_id:  Uuid,
  pub order:        u32,
  pub display_name: String,
  pub description:  String,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImpactType {
  pub id:           Uuid,
  pub display_name: String,
  pub description:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSeverity {
  pub display_name: String,
  pub value:        u8,
}

impl From<ImpactType> for WireImpactType {
  fn from(t: ImpactType) -> Self {
    Self { id: t.id, display_name: t.display_name, description: t.description }
  }
}

impl From<Severity> for WireSeverity {
  fn from(s: Severity) -> Self { Self { display_name: s.display_name, value: s.value } }
}

pub fn component(c: Component, affected_by: &[AffectingIncident]) -> WireComponent {
  WireComponent {
    id:           c.id,
    display_name: c.display_name,
    labels:       c.labels,
    affected_by:  affected_by
      .iter()
      .map(|a| ImpactRef {
        reference: a.incident_id,
        kind:      a.impact_type_id,
        severity:  a.severity,
      })
      .collect(),
  }
}

pub fn incident(
  i: Incident,
  affects: &[Impact],
  updates: &[IncidentUpdate],
) -> WireIncident {
  WireIncident {
    id:           i.id,
    display_name: i.display_name,
    description:  i.description,
    began_at:     i.began_at,
    ended_at:     i.ended_at,
    phase:        i.phase,
    affects:      affects
      .iter()
      .map(|a| ImpactRef {
        reference: a.component_id,
        kind:      a.impact_type_id,
        severity:  a.severity,
      })
      .collect(),
    updates:      updates.iter().map(|u| u.order).collect(),
  }
}

pub fn incident_update(u: IncidentUpdate) -> WireIncidentUpdate {
  WireIncidentUpdate {
    incident_id:  u.incident_id,
    order:        u.order,
    display_name: u.display_name,
    description:  u.description,
    created_at:   u.created_at,
  }
}
