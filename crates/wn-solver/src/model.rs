//! Solver-side view of a network.
//!
//! Checks the boundary data each node kind and pipe needs, converts to SI,
//! and works out which nodes are supplied: reachable from a reservoir or
//! tank through open pipes.

use std::collections::VecDeque;

use tracing::debug;
use wn_core::{as_lps, as_m, as_m3ps, as_mps, lps, m, m3ps, mean_velocity, mm};
use wn_graph::Network;
use wn_records::{NodeKind, Numeric};

use crate::error::{BoundaryIssue, SolverError, SolverResult};
use crate::result::{NodeResult, PipeResult, SimulationResult};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelOptions {
    /// Pipes must carry a Hazen-Williams C (or fall back to the default).
    pub require_roughness: bool,
    pub default_roughness: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ModelNode {
    pub id: String,
    pub kind: NodeKind,
    pub elevation: f64,
    pub demand_m3s: f64,
    pub fixed_head: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ModelPipe {
    pub id: String,
    pub start: usize,
    pub end: usize,
    pub length_m: f64,
    pub diameter_m: f64,
    pub roughness: f64,
    pub open: bool,
}

/// Breadth-first supply tree from all sources at once.
#[derive(Debug, Clone, Default)]
pub(crate) struct SupplyTree {
    /// Visit order, sources first.
    pub order: Vec<usize>,
    /// `(pipe, parent node)` for every supplied non-root node.
    pub parent: Vec<Option<(usize, usize)>>,
    pub depth: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct HydraulicModel {
    pub(crate) nodes: Vec<ModelNode>,
    pub(crate) pipes: Vec<ModelPipe>,
    /// Open, non-self-loop pipes per node.
    pub(crate) open_adjacency: Vec<Vec<usize>>,
    /// Highest source head of the node's open-pipe island; `None` if unsupplied.
    pub(crate) island_head: Vec<Option<f64>>,
    pub(crate) tree: SupplyTree,
}

struct Collector {
    issues: Vec<BoundaryIssue>,
}

impl Collector {
    fn need(&mut self, entity: &str, field: &'static str, value: &Numeric) -> f64 {
        match value {
            Numeric::Value(v) => *v,
            Numeric::Missing => {
                self.push(entity, field, "missing".into());
                0.0
            }
            Numeric::Invalid(raw) => {
                self.push(entity, field, format!("invalid value '{raw}'"));
                0.0
            }
        }
    }

    fn push(&mut self, entity: &str, field: &'static str, found: String) {
        self.issues.push(BoundaryIssue {
            entity_id: entity.to_string(),
            field,
            found,
        });
    }
}

impl HydraulicModel {
    /// Assemble the model, listing every entity that lacks boundary data.
    pub fn from_network(network: &Network, options: &ModelOptions) -> SolverResult<Self> {
        let mut c = Collector { issues: Vec::new() };

        let nodes: Vec<ModelNode> = network
            .nodes()
            .iter()
            .map(|n| {
                let (elevation, demand_lps, fixed_head) = match n.kind {
                    NodeKind::Junction | NodeKind::Meter => {
                        let e = c.need(&n.id, "elevation", &n.elevation);
                        let d = c.need(&n.id, "demand", &n.demand);
                        (e, d, None)
                    }
                    NodeKind::Reservoir => {
                        let h = c.need(&n.id, "head", &n.head);
                        (n.elevation.value().unwrap_or(h), 0.0, Some(h))
                    }
                    NodeKind::Tank => {
                        let e = c.need(&n.id, "elevation", &n.elevation);
                        let l = c.need(&n.id, "level", &n.level);
                        (e, 0.0, Some(e + l))
                    }
                };
                ModelNode {
                    id: n.id.clone(),
                    kind: n.kind,
                    elevation,
                    demand_m3s: as_m3ps(lps(demand_lps)),
                    fixed_head,
                }
            })
            .collect();

        let pipes: Vec<ModelPipe> = network
            .pipes()
            .iter()
            .map(|p| {
                let diameter_mm = c.need(&p.id, "diameter", &p.diameter);
                let roughness = match (options.require_roughness, &p.roughness, options.default_roughness) {
                    (false, r, _) => r.value().unwrap_or(0.0),
                    (true, Numeric::Value(v), _) => *v,
                    (true, _, Some(default)) => default,
                    (true, r, None) => c.need(&p.id, "roughness", r),
                };
                ModelPipe {
                    id: p.id.clone(),
                    start: p.start.slot(),
                    end: p.end.slot(),
                    length_m: p.length_m,
                    diameter_m: as_m(mm(diameter_mm)),
                    roughness,
                    open: p.is_open(),
                }
            })
            .collect();

        if !c.issues.is_empty() {
            return Err(SolverError::MissingBoundaryData { issues: c.issues });
        }

        let mut open_adjacency = vec![Vec::new(); nodes.len()];
        for (i, p) in pipes.iter().enumerate() {
            if p.open && p.start != p.end {
                open_adjacency[p.start].push(i);
                open_adjacency[p.end].push(i);
            }
        }

        let mut model = Self {
            nodes,
            pipes,
            open_adjacency,
            island_head: Vec::new(),
            tree: SupplyTree::default(),
        };
        model.island_head = model.island_heads();
        model.tree = model.supply_tree();
        debug!(
            nodes = model.nodes.len(),
            supplied = model.supplied_count(),
            "hydraulic model assembled"
        );
        Ok(model)
    }

    fn other_end(&self, pipe: usize, node: usize) -> usize {
        let p = &self.pipes[pipe];
        if p.start == node { p.end } else { p.start }
    }

    fn island_heads(&self) -> Vec<Option<f64>> {
        let n = self.nodes.len();
        let mut heads = vec![None; n];
        let mut seen = vec![false; n];
        for root in 0..n {
            if seen[root] {
                continue;
            }
            seen[root] = true;
            let mut members = vec![root];
            let mut queue = VecDeque::from([root]);
            while let Some(i) = queue.pop_front() {
                for &p in &self.open_adjacency[i] {
                    let j = self.other_end(p, i);
                    if !seen[j] {
                        seen[j] = true;
                        members.push(j);
                        queue.push_back(j);
                    }
                }
            }
            let head = members
                .iter()
                .filter_map(|&i| self.nodes[i].fixed_head)
                .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))));
            for i in members {
                heads[i] = head;
            }
        }
        heads
    }

    fn supply_tree(&self) -> SupplyTree {
        let n = self.nodes.len();
        let mut tree = SupplyTree {
            order: Vec::with_capacity(n),
            parent: vec![None; n],
            depth: vec![0; n],
        };
        let mut seen = vec![false; n];
        let mut queue = VecDeque::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.fixed_head.is_some() {
                seen[i] = true;
                queue.push_back(i);
            }
        }
        while let Some(i) = queue.pop_front() {
            tree.order.push(i);
            for &p in &self.open_adjacency[i] {
                let j = self.other_end(p, i);
                if !seen[j] {
                    seen[j] = true;
                    tree.parent[j] = Some((p, i));
                    tree.depth[j] = tree.depth[i] + 1;
                    queue.push_back(j);
                }
            }
        }
        tree
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_supplied(&self, node: usize) -> bool {
        self.island_head.get(node).is_some_and(Option::is_some)
    }

    pub fn supplied_count(&self) -> usize {
        self.island_head.iter().filter(|h| h.is_some()).count()
    }

    pub fn node_id(&self, node: usize) -> Option<&str> {
        self.nodes.get(node).map(|n| n.id.as_str())
    }

    /// Turn heads (m) and flows (m^3/s, start to end) into a result.
    ///
    /// Unsupplied nodes report zero pressure and zero delivered demand.
    /// Sources report the net inflow from their pipes, so supply is negative.
    pub(crate) fn assemble(
        &self,
        heads: &[f64],
        flows_m3s: &[f64],
        clamp_pressure: bool,
    ) -> SimulationResult {
        let mut inflow = vec![0.0; self.nodes.len()];
        for (p, &q) in self.pipes.iter().zip(flows_m3s) {
            inflow[p.start] -= q;
            inflow[p.end] += q;
        }

        let mut result = SimulationResult::default();
        for (i, node) in self.nodes.iter().enumerate() {
            let entry = if self.is_supplied(i) {
                let raw = heads[i] - node.elevation;
                let pressure_m = if clamp_pressure { raw.max(0.0) } else { raw };
                let demand_m3s = if node.fixed_head.is_some() {
                    inflow[i]
                } else {
                    node.demand_m3s
                };
                NodeResult {
                    pressure_m,
                    demand_lps: as_lps(m3ps(demand_m3s)),
                }
            } else {
                NodeResult {
                    pressure_m: 0.0,
                    demand_lps: 0.0,
                }
            };
            result.nodes.insert(node.id.clone(), entry);
        }
        for (p, &q) in self.pipes.iter().zip(flows_m3s) {
            let velocity = mean_velocity(m3ps(q), m(p.diameter_m));
            result.pipes.insert(
                p.id.clone(),
                PipeResult {
                    flow_lps: as_lps(m3ps(q)),
                    velocity_mps: as_mps(velocity),
                },
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wn_graph::NetworkBuilder;
    use wn_records::{NodeRecord, PipeRecord, PipeStatus};

    fn reservoir(id: &str, x: f64, head: f64) -> NodeRecord {
        let mut n = NodeRecord::junction(id, x, 0.0);
        n.kind = NodeKind::Reservoir;
        n.head = Numeric::Value(head);
        n
    }

    fn junction(id: &str, x: f64, elevation: f64, demand: f64) -> NodeRecord {
        let mut n = NodeRecord::junction(id, x, 0.0);
        n.elevation = Numeric::Value(elevation);
        n.demand = Numeric::Value(demand);
        n
    }

    fn pipe(id: &str, a: &str, b: &str) -> PipeRecord {
        let mut p = PipeRecord::between(id, a, b);
        p.diameter = Numeric::Value(150.0);
        p
    }

    #[test]
    fn lists_every_missing_field() {
        let mut bare = PipeRecord::between("P1", "J1", "J2");
        bare.diameter = Numeric::Invalid("wide".into());
        let net = NetworkBuilder::default()
            .build(
                vec![NodeRecord::junction("J1", 0.0, 0.0), NodeRecord::junction("J2", 1.0, 0.0)],
                vec![bare],
            )
            .unwrap();
        let err = HydraulicModel::from_network(
            &net,
            &ModelOptions {
                require_roughness: true,
                default_roughness: None,
            },
        )
        .unwrap_err();
        let SolverError::MissingBoundaryData { issues } = err else {
            panic!("unexpected error");
        };
        let names: Vec<String> = issues
            .iter()
            .map(|i| format!("{}.{}", i.entity_id, i.field))
            .collect();
        assert_eq!(
            names,
            vec![
                "J1.elevation",
                "J1.demand",
                "J2.elevation",
                "J2.demand",
                "P1.diameter",
                "P1.roughness"
            ]
        );
        assert_eq!(issues[4].found, "invalid value 'wide'");
    }

    #[test]
    fn default_roughness_fills_gaps() {
        let net = NetworkBuilder::default()
            .build(
                vec![reservoir("R", 0.0, 50.0), junction("J", 1.0, 0.0, 1.0)],
                vec![pipe("P1", "R", "J")],
            )
            .unwrap();
        let model = HydraulicModel::from_network(
            &net,
            &ModelOptions {
                require_roughness: true,
                default_roughness: Some(130.0),
            },
        )
        .unwrap();
        assert_eq!(model.pipes[0].roughness, 130.0);
        assert!((model.pipes[0].diameter_m - 0.15).abs() < 1e-12);
    }

    #[test]
    fn closed_pipe_cuts_supply() {
        let mut closed = pipe("P2", "J1", "J2");
        closed.status = PipeStatus::Closed;
        let net = NetworkBuilder::default()
            .build(
                vec![
                    reservoir("R", 0.0, 50.0),
                    junction("J1", 1.0, 0.0, 1.0),
                    junction("J2", 2.0, 0.0, 1.0),
                ],
                vec![pipe("P1", "R", "J1"), closed],
            )
            .unwrap();
        let model = HydraulicModel::from_network(&net, &ModelOptions::default()).unwrap();
        assert!(model.is_supplied(0));
        assert!(model.is_supplied(1));
        assert!(!model.is_supplied(2));
        assert_eq!(model.tree.parent[1], Some((0, 0)));
        assert_eq!(model.tree.depth[1], 1);
    }
}
