//! Stored scenario data.

use serde::{Deserialize, Serialize};
use wn_scenario::StatusOverrides;
use wn_solver::SimulationResult;

pub type ScenarioId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioManifest {
    pub scenario_id: ScenarioId,
    pub scenario_name: String,
    pub deployment: String,
    pub overrides: StatusOverrides,
    pub solver: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl ScenarioManifest {
    /// A manifest stamped with the current time.
    pub fn now(
        scenario_id: impl Into<ScenarioId>,
        scenario_name: impl Into<String>,
        deployment: impl Into<String>,
        overrides: StatusOverrides,
        solver: impl Into<String>,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            scenario_name: scenario_name.into(),
            deployment: deployment.into(),
            overrides,
            solver: solver.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A manifest together with the result it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScenario {
    pub manifest: ScenarioManifest,
    pub result: SimulationResult,
}
