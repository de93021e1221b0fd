//! wn-results: content-addressed cache of scenario results.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_scenario_id;
pub use store::ScenarioStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scenario not found: {scenario_id}")]
    ScenarioNotFound { scenario_id: String },

    #[error("Invalid scenario id: {0}")]
    InvalidId(String),

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
