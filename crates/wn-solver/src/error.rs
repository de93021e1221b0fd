//! Error types for solver operations.

use std::fmt;

use thiserror::Error;
use wn_core::WnError;

/// One node or pipe lacking data the solver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryIssue {
    pub entity_id: String,
    pub field: &'static str,
    /// What was found instead: "missing" or the unparseable text.
    pub found: String,
}

impl fmt::Display for BoundaryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.entity_id, self.field, self.found)
    }
}

/// Solver failures. Never retried by callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Missing solver boundary data: {}", join(.issues))]
    MissingBoundaryData { issues: Vec<BoundaryIssue> },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

fn join(issues: &[BoundaryIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for WnError {
    fn from(e: SolverError) -> Self {
        WnError::Invariant {
            what: e.to_string(),
        }
    }
}
