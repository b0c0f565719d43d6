//! Phase generations: versioned snapshots of the resolution-progress
//! vocabulary.
//!
//! A generation is never edited. Replacing the vocabulary means writing a
//! whole new generation; incidents keep pointing at the `(generation, order)`
//! pair they were written with, so history is never rewritten.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A pinned reference to one phase of one generation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PhaseRef {
  pub generation: u32,
  pub order:      u32,
}

impl PhaseRef {
  pub fn new(generation: u32, order: u32) -> Self { Self { generation, order } }
}

/// A single persisted phase row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
  pub name:       String,
  pub generation: u32,
  pub order:      u32,
}

/// Resolve the generation a phase listing should read.
///
/// `current` is the highest generation in the store (`0` when none exist).
/// An omitted request means `current`. Requests below 1 are rejected as
/// invalid; requests above `current` do not exist yet.
pub fn resolve_generation(requested: Option<i64>, current: u32) -> Result<u32> {
  let Some(requested) = requested else {
    if current == 0 {
      return Err(Error::GenerationNotFound(0));
    }
    return Ok(current);
  };

  if requested < 1 {
    return Err(Error::invalid(format!(
      "phase generation must be at least 1, got {requested}"
    )));
  }

  match u32::try_from(requested) {
    Ok(g) if g <= current => Ok(g),
    Ok(g) => Err(Error::GenerationNotFound(g)),
    Err(_) => Err(Error::GenerationNotFound(u32::MAX)),
  }
}

/// Check the names submitted for a new generation and build its rows.
///
/// The position of each name is its `order`.
pub fn build_generation(generation: u32, names: &[String]) -> Result<Vec<Phase>> {
  if names.is_empty() {
    return Err(Error::invalid("a phase generation needs at least one phase"));
  }
  if let Some(pos) = names.iter().position(|n| n.trim().is_empty()) {
    return Err(Error::invalid(format!("phase name at position {pos} is empty")));
  }

  Ok(
    names
      .iter()
      .enumerate()
      .map(|(order, name)| Phase {
        name: name.clone(),
        generation,
        order: order as u32,
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn omitted_generation_uses_current() {
    assert_eq!(resolve_generation(None, 3).unwrap(), 3);
  }

  #[test]
  fn omitted_generation_without_any_is_not_found() {
    assert!(matches!(
      resolve_generation(None, 0),
      Err(Error::GenerationNotFound(0))
    ));
  }

  #[test]
  fn generation_below_one_is_invalid() {
    for g in [0, -1, i64::MIN] {
      assert!(matches!(
        resolve_generation(Some(g), 2),
        Err(Error::InvalidArgument(_))
      ));
    }
  }

  #[test]
  fn generation_above_current_is_not_found() {
    assert!(matches!(
      resolve_generation(Some(3), 2),
      Err(Error::GenerationNotFound(3))
    ));
    assert!(matches!(
      resolve_generation(Some(i64::MAX), 2),
      Err(Error::GenerationNotFound(_))
    ));
  }

  #[test]
  fn older_generation_is_allowed() {
    assert_eq!(resolve_generation(Some(1), 2).unwrap(), 1);
  }

  #[test]
  fn build_generation_orders_by_position() {
    let names = vec!["Scheduled".to_string(), "Investigating".into(), "Done".into()];
    let phases = build_generation(4, &names).unwrap();
    assert_eq!(phases.len(), 3);
    for (i, phase) in phases.iter().enumerate() {
      assert_eq!(phase.generation, 4);
      assert_eq!(phase.order, i as u32);
      assert_eq!(phase.name, names[i]);
    }
  }

  #[test]
  fn empty_generation_is_invalid() {
    assert!(matches!(
      build_generation(1, &[]),
      Err(Error::InvalidArgument(_))
    ));
  }

  #[test]
  fn blank_phase_name_is_invalid() {
    let names = vec!["Open".to_string(), "  ".into()];
    assert!(matches!(
      build_generation(1, &names),
      Err(Error::InvalidArgument(_))
    ));
  }
}
