//! Graph construction errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wn_core::WnError;

pub type GraphResult<T> = Result<T, GraphError>;

/// Which end of a pipe a reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Start => f.write_str("start"),
            Endpoint::End => f.write_str("end"),
        }
    }
}

/// A pipe names a node that is not in the node set.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Pipe '{pipe_id}' references missing {endpoint} node '{node_id}'")]
pub struct ReferenceError {
    pub pipe_id: String,
    pub endpoint: Endpoint,
    pub node_id: String,
}

/// Geometry that cannot carry a pipe.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryError {
    #[error("Pipe '{pipe_id}' geometry has {count} vertex(es); at least 2 are required")]
    TooFewVertices { pipe_id: String, count: usize },

    #[error("Pipe '{pipe_id}' has no length and its geometry has zero length")]
    ZeroLength { pipe_id: String },

    #[error("Pipe '{pipe_id}' geometry contains a non-finite coordinate")]
    NonFinite { pipe_id: String },
}

impl GeometryError {
    pub fn pipe_id(&self) -> &str {
        match self {
            GeometryError::TooFewVertices { pipe_id, .. }
            | GeometryError::ZeroLength { pipe_id }
            | GeometryError::NonFinite { pipe_id } => pipe_id,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Unknown pipe id '{pipe_id}'")]
    UnknownPipe { pipe_id: String },

    #[error("Network invariant violated: {what}")]
    Invariant { what: String },
}

impl From<GraphError> for WnError {
    fn from(err: GraphError) -> Self {
        WnError::Invariant {
            what: err.to_string(),
        }
    }
}
