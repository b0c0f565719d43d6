//! Incidents, their impacts and the impact window.
//!
//! An incident affects components through [`Impact`] rows. Whether an impact
//! is active at an instant is decided by the incident's window
//! `[began_at, ended_at)`; an absent `ended_at` means the incident is still
//! ongoing.
//!
//! Stores may keep instants at a coarser precision than [`DateTime`]; the
//! SQLite store keeps microseconds. Windows are then evaluated on the stored
//! values, so an incident read back from the store is the one whose
//! [`Incident::window`] agrees with resolution.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, phase::PhaseRef, reference::check_severity};

// ─── Window ──────────────────────────────────────────────────────────────────

/// The half-open interval during which an incident's impacts are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactWindow {
  pub began_at: DateTime<Utc>,
  pub ended_at: Option<DateTime<Utc>>,
}

impl ImpactWindow {
  pub fn new(began_at: DateTime<Utc>, ended_at: Option<DateTime<Utc>>) -> Result<Self> {
    if let Some(end) = ended_at
      && end < began_at
    {
      return Err(Error::invalid(format!(
        "incident ends at {end} before it begins at {began_at}"
      )));
    }
    Ok(Self { began_at, ended_at })
  }

  /// `began_at <= at && (ended_at is absent || ended_at > at)`.
  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.began_at <= at && self.ended_at.is_none_or(|end| end > at)
  }

  /// The "currently ongoing" test used when no instant is given.
  pub fn is_ongoing(&self) -> bool { self.ended_at.is_none() }

  /// Dispatch on an optional instant the same way the store does.
  pub fn is_active(&self, at: Option<DateTime<Utc>>) -> bool {
    match at {
      Some(at) => self.contains(at),
      None => self.is_ongoing(),
    }
  }
}

// ─── Impacts ─────────────────────────────────────────────────────────────────

/// One declared effect of an incident on a component.
///
/// Keyed by `(incident, component, impact type)`; an incident affects a
/// component with at most one impact of each type. Also the incident-side
/// result of impact resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Impact {
  pub component_id:   Uuid,
  pub impact_type_id: Uuid,
  pub severity:       u8,
}

impl Impact {
  pub fn new(component_id: Uuid, impact_type_id: Uuid, severity: i64) -> Result<Self> {
    Ok(Self { component_id, impact_type_id, severity: check_severity(severity)? })
  }
}

/// An impact seen from the component side: which incident, how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffectingIncident {
  pub incident_id:    Uuid,
  pub impact_type_id: Uuid,
  pub severity:       u8,
}

// ─── Incident ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
  pub id:           Uuid,
  pub display_name: String,
  pub description:  String,
  pub began_at:     DateTime<Utc>,
  pub ended_at:     Option<DateTime<Utc>>,
  pub phase:        PhaseRef,
}

impl Incident {
  /// The window as stored, for evaluating activity in-process.
  pub fn window(&self) -> ImpactWindow {
    ImpactWindow { began_at: self.began_at, ended_at: self.ended_at }
  }
}

/// Input for creating or replacing an [`Incident`].
///
/// `impacts` is the complete impact list; on update it replaces whatever the
/// incident had before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
  pub display_name: String,
  pub description:  String,
  pub began_at:     DateTime<Utc>,
  pub ended_at:     Option<DateTime<Utc>>,
  /// `None` on create pins the incident to order 0 of the current
  /// generation. On update, `None` keeps the existing reference.
  pub phase:        Option<PhaseRef>,
  pub impacts:      Vec<Impact>,
}

impl NewIncident {
  pub fn new(display_name: impl Into<String>, began_at: DateTime<Utc>) -> Self {
    Self {
      display_name: display_name.into(),
      description: String::new(),
      began_at,
      ended_at: None,
      phase: None,
      impacts: Vec::new(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.display_name.trim().is_empty() {
      return Err(Error::invalid("incident display name must not be empty"));
    }
    ImpactWindow::new(self.began_at, self.ended_at)?;

    let mut seen = HashSet::with_capacity(self.impacts.len());
    for impact in &self.impacts {
      if !seen.insert((impact.component_id, impact.impact_type_id)) {
        return Err(Error::invalid(format!(
          "component {} is impacted twice with type {}",
          impact.component_id, impact.impact_type_id
        )));
      }
    }
    Ok(())
  }
}
