//! Hazen-Williams steady-state solver.
//!
//! Unknowns are the heads of supplied junctions; reservoirs and tanks fix
//! theirs. Each open pipe carries `Q = k * sign(dh) * |dh|^0.54` with
//! `k = (10.67 L / (C^1.852 D^4.87))^-0.54`, the inverse of
//! `hL = 10.67 L Q^1.852 / (C^1.852 D^4.87)`. The power law is smoothed
//! near `dh = 0` so the Jacobian stays finite.

use nalgebra::{DMatrix, DVector};
use tracing::info;
use wn_core::constants::HAZEN_WILLIAMS_SI;
use wn_graph::Network;

use crate::error::SolverResult;
use crate::model::{HydraulicModel, ModelOptions, ModelPipe};
use crate::newton::{NewtonConfig, newton_solve};
use crate::result::SimulationResult;
use crate::solver::HydraulicSolver;

const HEADLOSS_EXPONENT: f64 = 1.852;
const DIAMETER_EXPONENT: f64 = 4.87;
const FLOW_EXPONENT: f64 = 1.0 / HEADLOSS_EXPONENT;
/// Head difference below which the flow law is smoothed, metres.
const SMOOTHING_M: f64 = 1e-6;
/// Initial head drop per supply-tree level, metres.
const INITIAL_DROP_M: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct HazenWilliamsSolver {
    pub config: NewtonConfig,
    pub default_roughness: Option<f64>,
}

/// `k` such that `Q = k * |dh|^0.54`.
fn conductance(p: &ModelPipe) -> f64 {
    let resistance = HAZEN_WILLIAMS_SI * p.length_m
        / (p.roughness.powf(HEADLOSS_EXPONENT) * p.diameter_m.powf(DIAMETER_EXPONENT));
    resistance.powf(-FLOW_EXPONENT)
}

/// Flow for a head difference and its derivative.
fn flow_and_slope(k: f64, dh: f64) -> (f64, f64) {
    let s = dh * dh + SMOOTHING_M * SMOOTHING_M;
    let a = (FLOW_EXPONENT - 1.0) / 2.0;
    let q = k * dh * s.powf(a);
    let slope = k * s.powf(a - 1.0) * (FLOW_EXPONENT * dh * dh + SMOOTHING_M * SMOOTHING_M);
    (q, slope)
}

impl HazenWilliamsSolver {
    pub fn new(config: NewtonConfig, default_roughness: Option<f64>) -> Self {
        Self {
            config,
            default_roughness,
        }
    }

    fn model_options(&self) -> ModelOptions {
        ModelOptions {
            require_roughness: true,
            default_roughness: self.default_roughness,
        }
    }

    pub fn solve_model(&self, model: &HydraulicModel) -> SolverResult<SimulationResult> {
        let n = model.nodes.len();

        let mut unknown: Vec<Option<usize>> = vec![None; n];
        let mut free = Vec::new();
        for (i, node) in model.nodes.iter().enumerate() {
            if model.is_supplied(i) && node.fixed_head.is_none() {
                unknown[i] = Some(free.len());
                free.push(i);
            }
        }

        let k: Vec<f64> = model.pipes.iter().map(conductance).collect();
        let active: Vec<usize> = model
            .pipes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.open && p.start != p.end && model.is_supplied(p.start))
            .map(|(i, _)| i)
            .collect();

        let base: Vec<f64> = (0..n)
            .map(|i| {
                model.nodes[i]
                    .fixed_head
                    .or(model.island_head[i])
                    .unwrap_or(0.0)
            })
            .collect();
        let heads_of = |x: &DVector<f64>| {
            let mut h = base.clone();
            for (u, &i) in free.iter().enumerate() {
                h[i] = x[u];
            }
            h
        };

        let residual = |x: &DVector<f64>| {
            let h = heads_of(x);
            let mut r = DVector::zeros(free.len());
            for (u, &i) in free.iter().enumerate() {
                r[u] = -model.nodes[i].demand_m3s;
            }
            for &p in &active {
                let pipe = &model.pipes[p];
                let (q, _) = flow_and_slope(k[p], h[pipe.start] - h[pipe.end]);
                if let Some(u) = unknown[pipe.start] {
                    r[u] -= q;
                }
                if let Some(u) = unknown[pipe.end] {
                    r[u] += q;
                }
            }
            r
        };

        let jacobian = |x: &DVector<f64>| {
            let h = heads_of(x);
            let mut jac = DMatrix::zeros(free.len(), free.len());
            for &p in &active {
                let pipe = &model.pipes[p];
                let (_, g) = flow_and_slope(k[p], h[pipe.start] - h[pipe.end]);
                let (us, ue) = (unknown[pipe.start], unknown[pipe.end]);
                if let Some(a) = us {
                    jac[(a, a)] -= g;
                    if let Some(b) = ue {
                        jac[(a, b)] += g;
                    }
                }
                if let Some(b) = ue {
                    jac[(b, b)] -= g;
                    if let Some(a) = us {
                        jac[(b, a)] += g;
                    }
                }
            }
            jac
        };

        let heads = if free.is_empty() {
            base.clone()
        } else {
            let x0 = DVector::from_iterator(
                free.len(),
                free.iter()
                    .map(|&i| base[i] - INITIAL_DROP_M * model.tree.depth[i] as f64),
            );
            let solution = newton_solve(x0, residual, jacobian, &self.config)?;
            info!(
                iterations = solution.iterations,
                residual = solution.residual_norm,
                "hazen-williams converged"
            );
            heads_of(&solution.x)
        };

        let mut flows = vec![0.0; model.pipes.len()];
        for &p in &active {
            let pipe = &model.pipes[p];
            flows[p] = flow_and_slope(k[p], heads[pipe.start] - heads[pipe.end]).0;
        }
        Ok(model.assemble(&heads, &flows, false))
    }
}

impl HydraulicSolver for HazenWilliamsSolver {
    fn name(&self) -> &str {
        "hazen-williams"
    }

    fn solve(&self, network: &Network) -> SolverResult<SimulationResult> {
        let model = HydraulicModel::from_network(network, &self.model_options())?;
        self.solve_model(&model)
    }
}
