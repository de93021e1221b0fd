//! Scenario analysis against a built network.
//!
//! The baseline is solved and classified once per session. Each scenario is
//! then run through its lifecycle and diffed against that baseline. With a
//! cache attached, solver results are looked up by content hash first.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use wn_project::{Deployment, ScenarioDef};
use wn_results::{ScenarioManifest, ScenarioStore, compute_scenario_id};
use wn_scenario::{
    Classification, ClassifySettings, Scenario, ScenarioDiff, ScenarioEngine, classify, diff,
};
use wn_solver::{HydraulicSolver, SimulationResult, SolverSettings};

use crate::error::AppResult;
use crate::pipeline::BuiltNetwork;

/// Everything one scenario analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario_id: String,
    pub scenario: Scenario,
    pub result: SimulationResult,
    pub classification: Classification,
    pub diff: ScenarioDiff,
    pub from_cache: bool,
}

/// Scenario results persisted for one deployment.
#[derive(Debug, Clone)]
pub struct ScenarioCache {
    pub store: ScenarioStore,
    pub deployment: String,
}

impl ScenarioCache {
    pub fn new(store: ScenarioStore, deployment: impl Into<String>) -> Self {
        Self {
            store,
            deployment: deployment.into(),
        }
    }

    pub fn for_deployment(deployment_path: &Path, deployment: &Deployment) -> AppResult<Self> {
        let store = ScenarioStore::for_deployment(deployment_path)?;
        Ok(Self::new(store, deployment.name.clone()))
    }

    fn lookup(&self, scenario_id: &str) -> Option<SimulationResult> {
        if !self.store.has(scenario_id) {
            return None;
        }
        match self.store.load_result(scenario_id) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(scenario_id, error = %e, "unreadable cache entry, recomputing");
                None
            }
        }
    }

    fn save(&self, scenario_id: &str, scenario: &Scenario, solver: &str, result: &SimulationResult) {
        let manifest = ScenarioManifest::now(
            scenario_id,
            scenario.name.clone(),
            self.deployment.clone(),
            scenario.overrides.clone(),
            solver,
        );
        if let Err(e) = self.store.save(&manifest, result) {
            warn!(scenario = %scenario.name, error = %e, "failed to cache scenario result");
        }
    }
}

/// Identifies a solver and its settings for cache keys.
pub fn solver_label(solver: &dyn HydraulicSolver, settings: &SolverSettings) -> String {
    match serde_json::to_string(settings) {
        Ok(json) => format!("{}:{json}", solver.name()),
        Err(_) => solver.name().to_string(),
    }
}

pub fn classify_settings(deployment: &Deployment) -> ClassifySettings {
    ClassifySettings {
        pressure_threshold_m: deployment.service.pressure_threshold_m,
        reference_year: deployment.reference_year(),
    }
}

pub fn scenario_from_def(def: &ScenarioDef) -> Scenario {
    let closed = def
        .close
        .iter()
        .fold(Scenario::new(&def.name), |s, id| s.close(id));
    def.open.iter().fold(closed, |s, id| s.open(id))
}

pub struct AnalysisSession<'a> {
    built: &'a BuiltNetwork,
    engine: ScenarioEngine<'a>,
    solver_label: String,
    settings: ClassifySettings,
    baseline: Classification,
    cache: Option<ScenarioCache>,
}

impl<'a> AnalysisSession<'a> {
    /// Solve and classify the baseline.
    pub fn new(
        built: &'a BuiltNetwork,
        solver: &'a dyn HydraulicSolver,
        solver_label: impl Into<String>,
        settings: ClassifySettings,
        cache: Option<ScenarioCache>,
    ) -> AppResult<Self> {
        let solver_label = solver_label.into();
        let engine = ScenarioEngine::new(&built.network, solver);
        let baseline_scenario = Scenario::baseline();
        let id = compute_scenario_id(&built.network, &baseline_scenario.overrides, &solver_label);

        let baseline = match cache.as_ref().and_then(|c| c.lookup(&id)) {
            Some(result) => classify(&built.network, &result, &settings),
            None => {
                let result = solver.solve(&built.network)?;
                if let Some(cache) = &cache {
                    cache.save(&id, &baseline_scenario, &solver_label, &result);
                }
                classify(&built.network, &result, &settings)
            }
        };
        info!(
            disconnected = baseline.disconnected().count(),
            solver = solver.name(),
            "baseline classified"
        );

        Ok(Self {
            built,
            engine,
            solver_label,
            settings,
            baseline,
            cache,
        })
    }

    pub fn baseline(&self) -> &Classification {
        &self.baseline
    }

    pub fn settings(&self) -> &ClassifySettings {
        &self.settings
    }

    pub fn analyze(&self, scenario: Scenario) -> AppResult<ScenarioReport> {
        let network = &self.built.network;
        let scenario_id = compute_scenario_id(network, &scenario.overrides, &self.solver_label);

        if let Some(result) = self.cache.as_ref().and_then(|c| c.lookup(&scenario_id)) {
            debug!(scenario = %scenario.name, scenario_id, "cache hit");
            let classification = classify(network, &result, &self.settings);
            let d = diff(&self.baseline.service, &classification.service, network);
            return Ok(ScenarioReport {
                scenario_id,
                scenario,
                result,
                classification,
                diff: d,
                from_cache: true,
            });
        }

        let outcome = self.engine.run(scenario, &self.baseline, &self.settings)?;
        if let Some(cache) = &self.cache {
            cache.save(&scenario_id, &outcome.scenario, &self.solver_label, &outcome.result);
        }
        Ok(ScenarioReport {
            scenario_id,
            scenario: outcome.scenario,
            result: outcome.result,
            classification: outcome.classification,
            diff: outcome.diff,
            from_cache: false,
        })
    }

    /// Analyze scenarios in parallel. Output order follows input order and
    /// one failure does not affect the others.
    pub fn analyze_all(&self, scenarios: Vec<Scenario>) -> Vec<(String, AppResult<ScenarioReport>)> {
        scenarios
            .into_par_iter()
            .map(|s| (s.name.clone(), self.analyze(s)))
            .collect()
    }
}

/// One uncached scenario against a freshly solved baseline.
pub fn analyze_scenario(
    built: &BuiltNetwork,
    scenario: Scenario,
    solver: &dyn HydraulicSolver,
    settings: &ClassifySettings,
) -> AppResult<ScenarioReport> {
    AnalysisSession::new(built, solver, solver.name(), *settings, None)?.analyze(scenario)
}

/// Many uncached scenarios; the baseline is solved once.
pub fn analyze_all(
    built: &BuiltNetwork,
    scenarios: Vec<Scenario>,
    solver: &dyn HydraulicSolver,
    settings: &ClassifySettings,
) -> AppResult<Vec<(String, AppResult<ScenarioReport>)>> {
    let session = AnalysisSession::new(built, solver, solver.name(), *settings, None)?;
    Ok(session.analyze_all(scenarios))
}
