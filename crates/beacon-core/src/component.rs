//! Components: the things a status page reports on.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  label::{self, Labels},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
  pub id:           Uuid,
  pub display_name: String,
  pub labels:       Labels,
}

/// Input for creating or replacing a [`Component`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComponent {
  pub display_name: String,
  #[serde(default)]
  pub labels:       Labels,
}

impl NewComponent {
  pub fn new(display_name: impl Into<String>) -> Self {
    Self { display_name: display_name.into(), labels: Labels::new() }
  }

  pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.labels.insert(key.into(), value.into());
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.display_name.trim().is_empty() {
      return Err(Error::invalid("component display name must not be empty"));
    }
    label::validate(&self.labels)
  }
}
