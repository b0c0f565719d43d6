//! Composable `WHERE` fragments.
//!
//! A [`Fragment`] is a boolean SQL expression with anonymous `?` placeholders
//! and the values bound to them, in order. Fragments are ANDed into a
//! [`Filter`] which renders the final clause, so label containment and the
//! impact window can be combined with each other and with plain equality
//! conditions in one statement.

use beacon_core::label::Labels;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::{Result, encode::encode_dt};

// ─── Fragment ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
  sql:    String,
  params: Vec<Value>,
}

impl Fragment {
  pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
    Self { sql: sql.into(), params }
  }

  /// `column = ?`
  pub fn eq(column: &str, value: impl Into<Value>) -> Self {
    Self::new(format!("{column} = ?"), vec![value.into()])
  }

  pub fn sql(&self) -> &str { &self.sql }

  pub fn params(&self) -> &[Value] { &self.params }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A conjunction of fragments.
#[derive(Debug, Clone, Default)]
pub struct Filter {
  fragments: Vec<Fragment>,
}

impl Filter {
  pub fn new() -> Self { Self::default() }

  pub fn and(mut self, fragment: Fragment) -> Self {
    self.fragments.push(fragment);
    self
  }

  pub fn and_maybe(self, fragment: Option<Fragment>) -> Self {
    match fragment {
      Some(f) => self.and(f),
      None => self,
    }
  }

  /// `WHERE a AND b ...`, or the empty string when there are no fragments.
  pub fn where_clause(&self) -> String {
    if self.fragments.is_empty() {
      return String::new();
    }
    let conds: Vec<String> = self
      .fragments
      .iter()
      .map(|f| format!("({})", f.sql))
      .collect();
    format!("WHERE {}", conds.join(" AND "))
  }

  /// Bound values in placeholder order.
  pub fn params(&self) -> Vec<Value> {
    self
      .fragments
      .iter()
      .flat_map(|f| f.params.iter().cloned())
      .collect()
  }
}

// ─── Label containment ───────────────────────────────────────────────────────

/// Components whose label rows contain every pair of `query`.
///
/// `component_id` is the qualified column of the component being filtered
/// (e.g. `c.component_id`). The query is bound once as a JSON object and
/// unpacked with `json_each`, so the test runs entirely in SQLite against
/// the `component_labels` index. Returns `None` for the empty query, which
/// matches everything.
pub fn labels_contain(component_id: &str, query: &Labels) -> Result<Option<Fragment>> {
  if query.is_empty() {
    return Ok(None);
  }
  let sql = format!(
    "NOT EXISTS (
       SELECT 1 FROM json_each(?) AS q
       WHERE NOT EXISTS (
         SELECT 1 FROM component_labels AS l
         WHERE l.component_id = {component_id}
           AND l.key = q.key
           AND l.value = q.value
       )
     )"
  );
  Ok(Some(Fragment::new(sql, vec![Value::Text(serde_json::to_string(query)?)])))
}

// ─── Impact window ───────────────────────────────────────────────────────────

/// Incidents (aliased `incident`) whose window is active.
///
/// With an instant this is the half-open test
/// `began_at <= at AND (ended_at IS NULL OR ended_at > at)`. Without one it
/// narrows to `ended_at IS NULL`.
pub fn window_active(incident: &str, at: Option<DateTime<Utc>>) -> Fragment {
  match at {
    Some(at) => {
      let at = encode_dt(at);
      Fragment::new(
        format!(
          "{incident}.began_at <= ? AND ({incident}.ended_at IS NULL OR {incident}.ended_at > ?)"
        ),
        vec![Value::Text(at.clone()), Value::Text(at)],
      )
    }
    None => Fragment::new(format!("{incident}.ended_at IS NULL"), vec![]),
  }
}

/// Components (by qualified id column) with at least one active impact.
pub fn component_affected(component_id: &str, at: Option<DateTime<Utc>>) -> Fragment {
  let window = window_active("ai", at);
  Fragment::new(
    format!(
      "EXISTS (
         SELECT 1 FROM impacts AS am
         JOIN incidents AS ai ON ai.incident_id = am.incident_id
         WHERE am.component_id = {component_id} AND {}
       )",
      window.sql
    ),
    window.params,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_filter_renders_nothing() {
    let f = Filter::new();
    assert_eq!(f.where_clause(), "");
    assert!(f.params().is_empty());
  }

  #[test]
  fn fragments_are_anded_with_params_in_order() {
    let f = Filter::new()
      .and(Fragment::eq("a", 1_i64))
      .and_maybe(None)
      .and(Fragment::eq("b", "x".to_string()));
    assert_eq!(f.where_clause(), "WHERE (a = ?) AND (b = ?)");
    assert_eq!(f.params(), vec![Value::Integer(1), Value::Text("x".into())]);
  }

  #[test]
  fn empty_label_query_adds_no_fragment() {
    assert!(labels_contain("c.component_id", &Labels::new()).unwrap().is_none());
  }

  #[test]
  fn label_query_binds_one_json_object() {
    let mut q = Labels::new();
    q.insert("env".into(), "prod".into());
    let frag = labels_contain("c.component_id", &q).unwrap().unwrap();
    assert!(frag.sql().contains("json_each(?)"));
    assert_eq!(frag.params(), &[Value::Text(r#"{"env":"prod"}"#.into())]);
  }

  #[test]
  fn ongoing_window_binds_nothing() {
    let frag = window_active("i", None);
    assert_eq!(frag.sql(), "i.ended_at IS NULL");
    assert!(frag.params().is_empty());
  }

  #[test]
  fn instant_window_binds_the_instant_twice() {
    let frag = window_active("i", Some(Utc::now()));
    assert_eq!(frag.params().len(), 2);
    assert!(frag.sql().contains("i.ended_at > ?"));
  }
}
