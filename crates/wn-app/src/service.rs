//! Request-level entry points shared by front ends.

use std::path::Path;

use tracing::info;
use uuid::Uuid;
use wn_project::Deployment;
use wn_results::{ScenarioManifest, ScenarioStore};
use wn_scenario::Scenario;
use wn_solver::build_solver;

use crate::analysis::{
    AnalysisSession, ScenarioCache, ScenarioReport, classify_settings, scenario_from_def,
    solver_label,
};
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::pipeline::{BuiltNetwork, build_network};
use crate::view::NetworkView;

/// Load and validate a deployment file.
pub fn validate_deployment(path: &Path) -> AppResult<Deployment> {
    Ok(wn_project::load_yaml(path)?)
}

/// Load a deployment and build its network.
pub fn load_and_build(path: &Path) -> AppResult<(RequestContext, BuiltNetwork)> {
    let ctx = RequestContext::load(path)?;
    let built = build_network(&ctx)?;
    Ok((ctx, built))
}

/// A named scenario from the deployment, extended with extra overrides.
///
/// Without a name, or with a name the deployment does not define while
/// overrides are given, an ad-hoc scenario is built from the overrides.
pub fn resolve_scenario(
    deployment: &Deployment,
    name: Option<&str>,
    close: &[String],
    open: &[String],
) -> AppResult<Scenario> {
    let base = match name {
        Some(n) => match deployment.scenario(n) {
            Some(def) => scenario_from_def(def),
            None if close.is_empty() && open.is_empty() => {
                return Err(AppError::ScenarioNotFound(n.to_string()));
            }
            None => Scenario::new(n),
        },
        None => Scenario::new("ad-hoc"),
    };
    let closed = close.iter().fold(base, |s, id| s.close(id));
    Ok(open.iter().fold(closed, |s, id| s.open(id)))
}

pub struct ScenarioRequest<'a> {
    pub deployment_path: &'a Path,
    pub name: Option<&'a str>,
    pub close: &'a [String],
    pub open: &'a [String],
    /// Overrides the deployment's service threshold.
    pub threshold_m: Option<f64>,
    pub use_cache: bool,
}

#[derive(Debug, Clone)]
pub struct ScenarioResponse {
    pub request_id: Uuid,
    pub report: ScenarioReport,
    pub view: NetworkView,
}

fn open_session<'a>(
    ctx: &RequestContext,
    deployment_path: &Path,
    built: &'a BuiltNetwork,
    solver: &'a dyn wn_solver::HydraulicSolver,
    threshold_m: Option<f64>,
    use_cache: bool,
) -> AppResult<AnalysisSession<'a>> {
    let mut settings = classify_settings(&ctx.deployment);
    if let Some(t) = threshold_m {
        settings.pressure_threshold_m = t;
    }
    let cache = if use_cache {
        Some(ScenarioCache::for_deployment(deployment_path, &ctx.deployment)?)
    } else {
        None
    };
    let label = solver_label(solver, &ctx.deployment.solver);
    AnalysisSession::new(built, solver, label, settings, cache)
}

/// Build, solve the baseline and analyze one scenario.
pub fn run_scenario(request: &ScenarioRequest) -> AppResult<ScenarioResponse> {
    let (ctx, built) = load_and_build(request.deployment_path)?;
    let scenario = resolve_scenario(&ctx.deployment, request.name, request.close, request.open)?;
    let solver = build_solver(&ctx.deployment.solver);
    let session = open_session(
        &ctx,
        request.deployment_path,
        &built,
        solver.as_ref(),
        request.threshold_m,
        request.use_cache,
    )?;

    let report = session.analyze(scenario)?;
    info!(
        request = %ctx.request_id,
        scenario = %report.scenario.name,
        from_cache = report.from_cache,
        newly_disconnected = report.diff.newly_disconnected.len(),
        "scenario analysed"
    );
    let view = NetworkView::scenario(&built, &report);
    Ok(ScenarioResponse {
        request_id: ctx.request_id,
        report,
        view,
    })
}

/// Analyze every scenario the deployment defines.
pub fn run_configured_scenarios(
    deployment_path: &Path,
    use_cache: bool,
) -> AppResult<Vec<(String, AppResult<ScenarioReport>)>> {
    let (ctx, built) = load_and_build(deployment_path)?;
    let solver = build_solver(&ctx.deployment.solver);
    let session = open_session(&ctx, deployment_path, &built, solver.as_ref(), None, use_cache)?;
    let scenarios = ctx.deployment.scenarios.iter().map(scenario_from_def).collect();
    Ok(session.analyze_all(scenarios))
}

/// Cached scenario manifests for a deployment, oldest first.
pub fn list_cached(deployment_path: &Path) -> AppResult<Vec<ScenarioManifest>> {
    let deployment = validate_deployment(deployment_path)?;
    let store = ScenarioStore::for_deployment(deployment_path)?;
    Ok(store.list(&deployment.name)?)
}
