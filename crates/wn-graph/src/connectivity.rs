//! Connectivity analyzer.
//!
//! Components are computed over topology only: every pipe is an edge
//! whatever its status. Pressure-based service loss is a different notion
//! and lives in the scenario classifier.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Endpoint;
use crate::network::{Network, RejectReason};

/// A pipe excluded because one of its endpoints does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanPipe {
    pub pipe_id: String,
    pub endpoint: Endpoint,
    pub missing_node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// Components of nodes with at least one pipe; largest first, ties by
    /// smallest member id. Members are sorted.
    pub components: Vec<Vec<String>>,
    /// Nodes without any pipe.
    pub isolated_nodes: Vec<String>,
    /// Pipes whose start and end are the same node.
    pub self_loops: Vec<String>,
    pub orphan_pipes: Vec<OrphanPipe>,
}

impl ConnectivityReport {
    /// Exactly one component holds every node that has a pipe.
    pub fn is_fully_connected(&self) -> bool {
        self.components.len() == 1
    }

    pub fn component_of(&self, node_id: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|c| c.binary_search_by(|m| m.as_str().cmp(node_id)).is_ok())
    }
}

/// Connected components by breadth-first traversal, O(V + E).
pub fn analyze(network: &Network) -> ConnectivityReport {
    let n = network.nodes().len();
    let mut seen = vec![false; n];
    let mut report = ConnectivityReport::default();

    for node in network.nodes() {
        if seen[node.ix.slot()] {
            continue;
        }
        seen[node.ix.slot()] = true;
        if network.degree(node.ix) == 0 {
            report.isolated_nodes.push(node.id.clone());
            continue;
        }

        let mut members = Vec::new();
        let mut queue = VecDeque::from([node.ix]);
        while let Some(ix) = queue.pop_front() {
            if let Some(current) = network.node(ix) {
                members.push(current.id.clone());
            }
            for &p in network.incident_pipes(ix) {
                let Some(next) = network.pipe(p).and_then(|pipe| pipe.other_end(ix)) else {
                    continue;
                };
                if !seen[next.slot()] {
                    seen[next.slot()] = true;
                    queue.push_back(next);
                }
            }
        }
        members.sort();
        report.components.push(members);
    }

    report
        .components
        .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    report.isolated_nodes.sort();

    report.self_loops = network
        .pipes()
        .iter()
        .filter(|p| p.is_self_loop())
        .map(|p| p.id.clone())
        .collect();

    report.orphan_pipes = network
        .rejected()
        .iter()
        .filter_map(|r| match &r.reason {
            RejectReason::Reference(e) => Some(OrphanPipe {
                pipe_id: e.pipe_id.clone(),
                endpoint: e.endpoint,
                missing_node_id: e.node_id.clone(),
            }),
            RejectReason::Geometry(_) => None,
        })
        .collect();

    debug!(
        components = report.components.len(),
        isolated = report.isolated_nodes.len(),
        orphans = report.orphan_pipes.len(),
        "connectivity analyzed"
    );
    report
}
