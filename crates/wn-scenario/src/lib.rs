//! wn-scenario: what-if analysis on a shared baseline network.
//!
//! - `ScenarioEngine`: clone the baseline, apply status overrides, solve
//! - `ScenarioRun`: the lifecycle Created → Applied → Simulated →
//!   Classified → Diffed as a typestate; each transition consumes the run
//! - classifier: served/disconnected nodes, pipe criticality tiers, diff

pub mod classify;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod scenario;

pub use classify::{
    Classification, ClassifySettings, Criticality, ScenarioDiff, ServiceMap, ServiceStatus,
    classify, classify_nodes, classify_pipe, classify_pipes, diff,
};
pub use engine::{ScenarioEngine, TaggedResult};
pub use error::{ScenarioError, ScenarioResult, Stage};
pub use lifecycle::{
    Applied, Classified, Created, Diffed, ScenarioOutcome, ScenarioRun, Simulated,
};
pub use scenario::{Scenario, StatusOverrides};
