//! Scenario engine.
//!
//! The baseline is borrowed immutably and cloned per evaluation, so any
//! number of evaluations can run against it concurrently.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wn_graph::Network;
use wn_solver::{HydraulicSolver, SimulationResult};

use crate::classify::{ClassifySettings, Classification, classify};
use crate::error::{ScenarioError, ScenarioResult};
use crate::lifecycle::{ScenarioOutcome, ScenarioRun};
use crate::scenario::{Scenario, StatusOverrides};

/// A solver result together with the overrides that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedResult {
    pub overrides: StatusOverrides,
    pub result: SimulationResult,
}

#[derive(Clone, Copy)]
pub struct ScenarioEngine<'a> {
    baseline: &'a Network,
    solver: &'a dyn HydraulicSolver,
}

impl<'a> ScenarioEngine<'a> {
    pub fn new(baseline: &'a Network, solver: &'a dyn HydraulicSolver) -> Self {
        Self { baseline, solver }
    }

    pub fn baseline(&self) -> &'a Network {
        self.baseline
    }

    pub fn solver(&self) -> &'a dyn HydraulicSolver {
        self.solver
    }

    /// Independent copy of the baseline with the overrides applied.
    pub fn derive(&self, overrides: &StatusOverrides) -> ScenarioResult<Network> {
        let mut network = self.baseline.clone();
        for (pipe_id, &status) in overrides {
            if network.set_status(pipe_id, status).is_err() {
                return Err(ScenarioError::UnknownPipe {
                    pipe_id: pipe_id.clone(),
                });
            }
        }
        debug!(overrides = overrides.len(), "derived network");
        Ok(network)
    }

    /// Derive and solve; the solver result is returned unmodified.
    pub fn evaluate(&self, overrides: &StatusOverrides) -> ScenarioResult<TaggedResult> {
        let network = self.derive(overrides)?;
        let result = self.solver.solve(&network)?;
        Ok(TaggedResult {
            overrides: overrides.clone(),
            result,
        })
    }

    /// Evaluate many scenarios in parallel. Output order follows input order.
    pub fn evaluate_batch(
        &self,
        scenarios: &[Scenario],
    ) -> Vec<(String, ScenarioResult<TaggedResult>)> {
        info!(count = scenarios.len(), solver = self.solver.name(), "evaluating scenario batch");
        scenarios
            .par_iter()
            .map(|s| (s.name.clone(), self.evaluate(&s.overrides)))
            .collect()
    }

    /// Classify the unmodified baseline.
    pub fn classify_baseline(&self, settings: &ClassifySettings) -> ScenarioResult<Classification> {
        let result = self.solver.solve(self.baseline)?;
        Ok(classify(self.baseline, &result, settings))
    }

    /// Drive one scenario through its full lifecycle.
    pub fn run(
        &self,
        scenario: Scenario,
        baseline: &Classification,
        settings: &ClassifySettings,
    ) -> ScenarioResult<ScenarioOutcome> {
        let outcome = ScenarioRun::new(scenario)
            .apply(self)?
            .simulate(self)?
            .classify(settings)
            .diff(baseline)
            .into_outcome();
        Ok(outcome)
    }

    /// `run` for many scenarios in parallel against one baseline classification.
    pub fn run_batch(
        &self,
        scenarios: Vec<Scenario>,
        baseline: &Classification,
        settings: &ClassifySettings,
    ) -> Vec<ScenarioResult<ScenarioOutcome>> {
        scenarios
            .into_par_iter()
            .map(|s| self.run(s, baseline, settings))
            .collect()
    }
}
