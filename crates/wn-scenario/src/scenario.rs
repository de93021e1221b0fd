//! Named status-override sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wn_records::PipeStatus;

/// Pipe id → forced status, ordered by id.
pub type StatusOverrides = BTreeMap<String, PipeStatus>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub overrides: StatusOverrides,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: StatusOverrides::new(),
        }
    }

    /// The unmodified network.
    pub fn baseline() -> Self {
        Self::new("baseline")
    }

    pub fn close(mut self, pipe_id: impl Into<String>) -> Self {
        self.overrides.insert(pipe_id.into(), PipeStatus::Closed);
        self
    }

    pub fn open(mut self, pipe_id: impl Into<String>) -> Self {
        self.overrides.insert(pipe_id.into(), PipeStatus::Open);
        self
    }

    pub fn closed_pipes(&self) -> impl Iterator<Item = &str> {
        self.overrides
            .iter()
            .filter(|(_, s)| **s == PipeStatus::Closed)
            .map(|(id, _)| id.as_str())
    }
}
