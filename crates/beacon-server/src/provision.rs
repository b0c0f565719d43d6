//! Startup provisioning of the reference vocabulary.
//!
//! The core assumes generation 1 of the phases and a base set of impact
//! types and severities exist before any request that references them.
//! [`provision`] seeds them from the `[provision]` config table and is safe
//! to run on every start: existing generations are never rewritten and
//! entries are matched by display name.

use anyhow::Context as _;
use beacon_core::{
  reference::{NewImpactType, Severity},
  store::StatusStore,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ProvisionConfig {
  /// Names of generation 1, in order. Ignored once any generation exists.
  #[serde(default)]
  pub phases:       Vec<String>,
  #[serde(default)]
  pub impact_types: Vec<ImpactTypeSeed>,
  #[serde(default)]
  pub severities:   Vec<SeveritySeed>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ImpactTypeSeed {
  pub display_name: String,
  #[serde(default)]
  pub description:  String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SeveritySeed {
  pub display_name: String,
  pub value:        i64,
}

/// Apply `seed` to `store`.
pub async fn provision<S: StatusStore>(store: &S, seed: &ProvisionConfig) -> anyhow::Result<()> {
  if !seed.phases.is_empty() {
    let current = store
      .current_generation()
      .await
      .context("failed to read current phase generation")?;
    if current == 0 {
      let generation = store
        .create_generation(seed.phases.clone())
        .await
        .context("failed to provision phases")?;
      tracing::info!(generation, phases = seed.phases.len(), "provisioned phase generation");
    }
  }

  if !seed.impact_types.is_empty() {
    let existing = store
      .list_impact_types()
      .await
      .context("failed to list impact types")?;
    for t in &seed.impact_types {
      if existing.iter().any(|e| e.display_name == t.display_name) {
        continue;
      }
      store
        .create_impact_type(NewImpactType {
          display_name: t.display_name.clone(),
          description:  t.description.clone(),
        })
        .await
        .with_context(|| format!("failed to provision impact type {:?}", t.display_name))?;
      tracing::info!(name = %t.display_name, "provisioned impact type");
    }
  }

  for s in &seed.severities {
    let found = store
      .get_severity(s.display_name.clone())
      .await
      .with_context(|| format!("failed to look up severity {:?}", s.display_name))?;
    if found.is_some() {
      continue;
    }
    let severity = Severity::new(s.display_name.clone(), s.value)
      .with_context(|| format!("invalid severity {:?}", s.display_name))?;
    store
      .create_severity(severity)
      .await
      .with_context(|| format!("failed to provision severity {:?}", s.display_name))?;
    tracing::info!(name = %s.display_name, value = s.value, "provisioned severity");
  }

  Ok(())
}
