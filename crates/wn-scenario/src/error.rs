//! Scenario errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wn_solver::SolverError;

pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Lifecycle step a scenario failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Applying,
    Simulating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Applying => "applying overrides",
            Stage::Simulating => "simulating",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Status override names unknown pipe '{pipe_id}'")]
    UnknownPipe { pipe_id: String },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Scenario '{scenario}' failed while {stage}: {source}")]
    Failed {
        scenario: String,
        stage: Stage,
        #[source]
        source: Box<ScenarioError>,
    },
}

impl ScenarioError {
    pub(crate) fn at(self, scenario: &str, stage: Stage) -> Self {
        ScenarioError::Failed {
            scenario: scenario.to_string(),
            stage,
            source: Box::new(self),
        }
    }

    /// The error underneath any stage wrapper.
    pub fn root(&self) -> &ScenarioError {
        match self {
            ScenarioError::Failed { source, .. } => source.root(),
            other => other,
        }
    }
}
