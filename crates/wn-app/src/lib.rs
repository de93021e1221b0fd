//! Shared application service layer for waternet.
//!
//! Turns a deployment and its input files into a validated network, then
//! runs what-if scenarios against it and shapes the output for the map
//! layer. Front ends call into `service`; everything below it is usable
//! on its own with in-memory buffers.

pub mod analysis;
pub mod context;
pub mod error;
pub mod leaks;
pub mod pipeline;
pub mod service;
pub mod view;

pub use analysis::{
    AnalysisSession, ScenarioCache, ScenarioReport, analyze_all, analyze_scenario,
    classify_settings, scenario_from_def, solver_label,
};
pub use context::{InputBuffers, RequestContext};
pub use error::{AppError, AppResult, ErrorCategory};
pub use leaks::{leak_counts_by_year, leak_year_range, leaks_in_year};
pub use pipeline::{BuiltNetwork, NetworkSummary, build_network, source_for};
pub use service::{
    ScenarioRequest, ScenarioResponse, list_cached, load_and_build, resolve_scenario,
    run_configured_scenarios, run_scenario, validate_deployment,
};
pub use view::{NetworkView, NodeView, PipeView};
