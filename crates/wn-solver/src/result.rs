//! Steady-state results keyed by entity id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    /// Pressure head, metres.
    pub pressure_m: f64,
    /// Delivered demand, l/s. Negative at sources (supply).
    pub demand_lps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeResult {
    /// Positive from start node to end node.
    pub flow_lps: f64,
    pub velocity_mps: f64,
}

/// One representative time point. Ordered maps so equal inputs compare equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    pub nodes: BTreeMap<String, NodeResult>,
    pub pipes: BTreeMap<String, PipeResult>,
}

impl SimulationResult {
    pub fn node(&self, id: &str) -> Option<&NodeResult> {
        self.nodes.get(id)
    }

    pub fn pipe(&self, id: &str) -> Option<&PipeResult> {
        self.pipes.get(id)
    }

    pub fn pressure(&self, id: &str) -> Option<f64> {
        self.node(id).map(|n| n.pressure_m)
    }

    pub fn flow(&self, id: &str) -> Option<f64> {
        self.pipe(id).map(|p| p.flow_lps)
    }
}
