//! Component labels and containment matching.
//!
//! A label set is an open key/value mapping. Queries use containment: a
//! component matches when its labels include every pair of the query. Values
//! are opaque and compared exactly.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// A component's label set. Keys are unique by construction.
pub type Labels = BTreeMap<String, String>;

/// `true` iff every pair in `query` is present and equal in `labels`.
///
/// An empty query matches every label set.
pub fn matches(labels: &Labels, query: &Labels) -> bool {
  query
    .iter()
    .all(|(key, value)| labels.get(key).is_some_and(|v| v == value))
}

/// Parse a selector of the form `key:value,key2:value2` into a query.
///
/// Whitespace around keys and values is trimmed. An empty selector is the
/// empty query. A key given twice with different values can never match, so
/// it is rejected.
pub fn parse_selector(selector: &str) -> Result<Labels> {
  let mut query = Labels::new();

  for pair in selector.split(',').map(str::trim).filter(|p| !p.is_empty()) {
    let (key, value) = pair
      .split_once(':')
      .ok_or_else(|| Error::invalid(format!("label selector {pair:?} is not key:value")))?;
    let key = key.trim();
    if key.is_empty() {
      return Err(Error::invalid(format!("label selector {pair:?} has an empty key")));
    }

    let value = value.trim().to_owned();
    match query.get(key) {
      Some(existing) if *existing != value => {
        return Err(Error::invalid(format!(
          "label {key:?} selected with both {existing:?} and {value:?}"
        )));
      }
      _ => {
        query.insert(key.to_owned(), value);
      }
    }
  }

  Ok(query)
}

/// Reject label sets with blank keys before they reach the store.
pub fn validate(labels: &Labels) -> Result<()> {
  if labels.keys().any(|k| k.trim().is_empty()) {
    return Err(Error::invalid("label keys must not be empty"));
  }
  Ok(())
}
