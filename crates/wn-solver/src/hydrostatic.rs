//! Frictionless supply-reachability solver.
//!
//! Every supplied node sees the highest source head of its open-pipe
//! island; pressure is that head minus elevation, floored at zero. Demand
//! is routed back to the sources along the breadth-first supply tree.
//! Pressure depends only on reachability, so closing pipes can only lower it.

use tracing::debug;

use crate::error::SolverResult;
use crate::model::{HydraulicModel, ModelOptions};
use crate::result::SimulationResult;
use crate::solver::HydraulicSolver;
use wn_graph::Network;

#[derive(Debug, Clone, Copy, Default)]
pub struct HydrostaticSolver;

impl HydrostaticSolver {
    pub fn new() -> Self {
        Self
    }

    pub fn solve_model(&self, model: &HydraulicModel) -> SimulationResult {
        let n = model.nodes.len();
        let heads: Vec<f64> = (0..n)
            .map(|i| model.island_head[i].unwrap_or(0.0))
            .collect();

        // Subtree demand, leaves first.
        let mut carried: Vec<f64> = model.nodes.iter().map(|nd| nd.demand_m3s).collect();
        let mut flows = vec![0.0; model.pipes.len()];
        for &i in model.tree.order.iter().rev() {
            if let Some((pipe, parent)) = model.tree.parent[i] {
                let q = carried[i];
                flows[pipe] = if model.pipes[pipe].start == parent { q } else { -q };
                carried[parent] += q;
            }
        }

        debug!(supplied = model.supplied_count(), "hydrostatic solve");
        model.assemble(&heads, &flows, true)
    }
}

impl HydraulicSolver for HydrostaticSolver {
    fn name(&self) -> &str {
        "hydrostatic"
    }

    fn solve(&self, network: &Network) -> SolverResult<SimulationResult> {
        let model = HydraulicModel::from_network(network, &ModelOptions::default())?;
        Ok(self.solve_model(&model))
    }
}
