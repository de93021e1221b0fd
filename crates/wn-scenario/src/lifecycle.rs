//! Scenario lifecycle as a typestate.
//!
//! Created → Applied → Simulated → Classified → Diffed. Each transition
//! consumes the run. Applying and simulating can fail; the error names the
//! stage and the run is gone. Classifying and diffing cannot fail.

use serde::{Deserialize, Serialize};
use tracing::info;
use wn_graph::Network;
use wn_solver::SimulationResult;

use crate::classify::{Classification, ClassifySettings, ScenarioDiff, classify, diff};
use crate::engine::ScenarioEngine;
use crate::error::{ScenarioError, ScenarioResult, Stage};
use crate::scenario::Scenario;

pub struct Created;

pub struct Applied {
    network: Network,
}

pub struct Simulated {
    network: Network,
    result: SimulationResult,
}

pub struct Classified {
    network: Network,
    result: SimulationResult,
    classification: Classification,
}

pub struct Diffed {
    result: SimulationResult,
    classification: Classification,
    diff: ScenarioDiff,
}

pub struct ScenarioRun<S> {
    scenario: Scenario,
    state: S,
}

/// Everything a finished scenario produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub result: SimulationResult,
    pub classification: Classification,
    pub diff: ScenarioDiff,
}

impl<S> ScenarioRun<S> {
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }
}

impl ScenarioRun<Created> {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            state: Created,
        }
    }

    pub fn apply(self, engine: &ScenarioEngine<'_>) -> ScenarioResult<ScenarioRun<Applied>> {
        let network = engine
            .derive(&self.scenario.overrides)
            .map_err(|e| e.at(&self.scenario.name, Stage::Applying))?;
        info!(scenario = %self.scenario.name, "overrides applied");
        Ok(ScenarioRun {
            scenario: self.scenario,
            state: Applied { network },
        })
    }
}

impl ScenarioRun<Applied> {
    pub fn network(&self) -> &Network {
        &self.state.network
    }

    pub fn simulate(self, engine: &ScenarioEngine<'_>) -> ScenarioResult<ScenarioRun<Simulated>> {
        let result = engine
            .solver()
            .solve(&self.state.network)
            .map_err(|e| ScenarioError::from(e).at(&self.scenario.name, Stage::Simulating))?;
        info!(scenario = %self.scenario.name, solver = engine.solver().name(), "simulated");
        Ok(ScenarioRun {
            scenario: self.scenario,
            state: Simulated {
                network: self.state.network,
                result,
            },
        })
    }
}

impl ScenarioRun<Simulated> {
    pub fn result(&self) -> &SimulationResult {
        &self.state.result
    }

    pub fn classify(self, settings: &ClassifySettings) -> ScenarioRun<Classified> {
        let classification = classify(&self.state.network, &self.state.result, settings);
        ScenarioRun {
            scenario: self.scenario,
            state: Classified {
                network: self.state.network,
                result: self.state.result,
                classification,
            },
        }
    }
}

impl ScenarioRun<Classified> {
    pub fn classification(&self) -> &Classification {
        &self.state.classification
    }

    pub fn diff(self, baseline: &Classification) -> ScenarioRun<Diffed> {
        let d = diff(
            &baseline.service,
            &self.state.classification.service,
            &self.state.network,
        );
        info!(
            scenario = %self.scenario.name,
            newly_disconnected = d.newly_disconnected.len(),
            demand_at_risk = d.demand_at_risk,
            "diffed against baseline"
        );
        ScenarioRun {
            scenario: self.scenario,
            state: Diffed {
                result: self.state.result,
                classification: self.state.classification,
                diff: d,
            },
        }
    }
}

impl ScenarioRun<Diffed> {
    pub fn diff_summary(&self) -> &ScenarioDiff {
        &self.state.diff
    }

    pub fn into_outcome(self) -> ScenarioOutcome {
        ScenarioOutcome {
            scenario: self.scenario,
            result: self.state.result,
            classification: self.state.classification,
            diff: self.state.diff,
        }
    }
}
