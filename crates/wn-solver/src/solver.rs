//! The solver collaborator interface and its factory.

use serde::{Deserialize, Serialize};
use wn_graph::Network;

use crate::error::SolverResult;
use crate::hazen_williams::HazenWilliamsSolver;
use crate::hydrostatic::HydrostaticSolver;
use crate::newton::NewtonConfig;
use crate::result::SimulationResult;

/// Steady-state solve of a network with its current pipe statuses.
///
/// Implementations hold no per-call state, so one instance can serve
/// concurrent scenario evaluations.
pub trait HydraulicSolver: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, network: &Network) -> SolverResult<SimulationResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Hydrostatic,
    HazenWilliams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub kind: SolverKind,
    pub max_iterations: usize,
    /// Flow balance tolerance, m^3/s.
    pub tolerance: f64,
    /// Hazen-Williams C for pipes without one.
    pub default_roughness: Option<f64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let newton = NewtonConfig::default();
        Self {
            kind: SolverKind::default(),
            max_iterations: newton.max_iterations,
            tolerance: newton.abs_tol,
            default_roughness: None,
        }
    }
}

pub fn build_solver(settings: &SolverSettings) -> Box<dyn HydraulicSolver> {
    match settings.kind {
        SolverKind::Hydrostatic => Box::new(HydrostaticSolver::new()),
        SolverKind::HazenWilliams => Box::new(HazenWilliamsSolver::new(
            NewtonConfig {
                max_iterations: settings.max_iterations,
                abs_tol: settings.tolerance,
                ..NewtonConfig::default()
            },
            settings.default_roughness,
        )),
    }
}
