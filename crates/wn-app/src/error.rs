//! Error types for the wn-app service layer.

use std::path::PathBuf;

use wn_graph::{GeometryError, GraphError, ReferenceError};
use wn_records::{RecordsError, SchemaErrors};
use wn_scenario::{ScenarioError, Stage};
use wn_solver::SolverError;

/// The failure classes reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Required field absent or value unusable.
    Schema,
    /// A pipe or override names an id that does not exist.
    Reference,
    /// Degenerate pipe geometry.
    Geometry,
    /// Network structure: split components, duplicate ids, broken invariants.
    Topology,
    /// The hydraulic solver failed.
    Solver,
    /// Unreadable input files or formats.
    Input,
    /// The deployment file itself.
    Configuration,
    /// The scenario result store.
    Storage,
}

/// Application error type wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Schema(#[from] SchemaErrors),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Status override names unknown pipe '{pipe_id}'")]
    UnknownOverride { pipe_id: String },

    #[error("Scenario '{scenario}' failed while {stage}: {source}")]
    Scenario {
        scenario: String,
        stage: Stage,
        #[source]
        source: Box<AppError>,
    },

    #[error("Network is not connected: {components} components, {isolated} isolated node(s)")]
    Disconnected { components: usize, isolated: usize },

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("No {role} input configured")]
    MissingInput { role: &'static str },

    #[error("Failed to read {role} input: {path}")]
    InputFileRead {
        role: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Deployment error: {0}")]
    Project(String),

    #[error("Scenario not found in deployment: {0}")]
    ScenarioNotFound(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wn-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Schema(_) => ErrorCategory::Schema,
            AppError::Reference(_) | AppError::UnknownOverride { .. } => ErrorCategory::Reference,
            AppError::Geometry(_) => ErrorCategory::Geometry,
            AppError::Solver(_) => ErrorCategory::Solver,
            AppError::Scenario { source, .. } => source.category(),
            AppError::Disconnected { .. } | AppError::Graph(_) => ErrorCategory::Topology,
            AppError::Input(_) | AppError::MissingInput { .. } | AppError::InputFileRead { .. } => {
                ErrorCategory::Input
            }
            AppError::Project(_) | AppError::ScenarioNotFound(_) => ErrorCategory::Configuration,
            AppError::Results(_) | AppError::Io(_) => ErrorCategory::Storage,
        }
    }
}

impl From<RecordsError> for AppError {
    fn from(err: RecordsError) -> Self {
        match err {
            RecordsError::Schema(errors) => AppError::Schema(errors),
            other => AppError::Input(other.to_string()),
        }
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Reference(e) => AppError::Reference(e),
            GraphError::Geometry(e) => AppError::Geometry(e),
            other => AppError::Graph(other.to_string()),
        }
    }
}

impl From<ScenarioError> for AppError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::UnknownPipe { pipe_id } => AppError::UnknownOverride { pipe_id },
            ScenarioError::Solver(e) => AppError::Solver(e),
            ScenarioError::Failed {
                scenario,
                stage,
                source,
            } => AppError::Scenario {
                scenario,
                stage,
                source: Box::new(AppError::from(*source)),
            },
        }
    }
}

impl From<wn_project::ProjectError> for AppError {
    fn from(err: wn_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<wn_results::ResultsError> for AppError {
    fn from(err: wn_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
