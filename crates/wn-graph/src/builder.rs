//! Network graph builder.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wn_core::{Coord, Id, NodeIx, haversine_length, planar_length};
use wn_records::{NodeRecord, PipeRecord};

use crate::error::{Endpoint, GeometryError, GraphError, GraphResult, ReferenceError};
use crate::indexing::IdLookup;
use crate::network::{GeometrySource, Network, Node, Pipe, RejectReason, RejectedPipe};
use crate::validate;

/// What to do with a pipe whose endpoints or geometry cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Abort the build with the first offending pipe.
    #[default]
    FailFast,
    /// Exclude the pipe, record it in `Network::rejected()`, keep going.
    RejectAndContinue,
}

/// How lengths are computed from geometry when the record has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthMetric {
    /// Euclidean distance in projected metres.
    #[default]
    Planar,
    /// Great-circle distance over lon/lat degrees.
    Haversine,
}

impl LengthMetric {
    pub fn length(self, points: &[Coord]) -> f64 {
        match self {
            LengthMetric::Planar => planar_length(points),
            LengthMetric::Haversine => haversine_length(points),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildOptions {
    #[serde(default)]
    pub reference_policy: ReferencePolicy,
    /// Unset means planar here; deployments choose from their target CRS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_metric: Option<LengthMetric>,
}

/// Builds a `Network` from normalized records.
///
/// Node ids go into a lookup table once; every pipe endpoint is then a
/// single hash lookup.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    options: BuildOptions,
}

struct Resolved {
    start: NodeIx,
    end: NodeIx,
    geometry: Vec<Coord>,
    source: GeometrySource,
    length_m: f64,
}

impl NetworkBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Build and validate a network.
    pub fn build(&self, nodes: Vec<NodeRecord>, pipes: Vec<PipeRecord>) -> GraphResult<Network> {
        let node_lookup = IdLookup::from_ids(nodes.iter().map(|n| n.id.as_str()))
            .map_err(|id| GraphError::DuplicateId { kind: "node", id })?;
        IdLookup::from_ids(pipes.iter().map(|p| p.id.as_str()))
            .map_err(|id| GraphError::DuplicateId { kind: "pipe", id })?;

        let nodes: Vec<Node> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, r)| Node {
                ix: Id::from_usize(i),
                id: r.id,
                position: r.position,
                kind: r.kind,
                elevation: r.elevation,
                demand: r.demand,
                head: r.head,
                level: r.level,
            })
            .collect();

        let mut accepted: Vec<Pipe> = Vec::with_capacity(pipes.len());
        let mut rejected = Vec::new();
        for record in pipes {
            match self.resolve(&record, &node_lookup, &nodes) {
                Ok(r) => accepted.push(Pipe {
                    ix: Id::from_usize(accepted.len()),
                    id: record.id,
                    start: r.start,
                    end: r.end,
                    geometry: r.geometry,
                    geometry_source: r.source,
                    length_m: r.length_m,
                    diameter: record.diameter,
                    roughness: record.roughness,
                    material: record.material,
                    installation: record.installation,
                    status: record.status,
                }),
                Err(reason) => match self.options.reference_policy {
                    ReferencePolicy::FailFast => return Err(reason.into()),
                    ReferencePolicy::RejectAndContinue => {
                        warn!(pipe = %record.id, reason = ?reason, "pipe rejected");
                        rejected.push(RejectedPipe { record, reason });
                    }
                },
            }
        }

        let pipe_lookup = IdLookup::from_ids(accepted.iter().map(|p| p.id.as_str()))
            .map_err(|id| GraphError::DuplicateId { kind: "pipe", id })?;
        let (node_pipe_offsets, node_pipes) = build_adjacency(&nodes, &accepted);

        let network = Network {
            nodes,
            pipes: accepted,
            node_pipe_offsets,
            node_pipes,
            node_lookup,
            pipe_lookup,
            rejected,
        };
        validate::validate_network(&network)?;

        info!(
            nodes = network.nodes.len(),
            pipes = network.pipes.len(),
            rejected = network.rejected.len(),
            "network built"
        );
        Ok(network)
    }

    fn resolve(
        &self,
        record: &PipeRecord,
        lookup: &IdLookup,
        nodes: &[Node],
    ) -> Result<Resolved, RejectReason> {
        let endpoint = |endpoint: Endpoint, node_id: &str| {
            lookup.get(node_id).ok_or_else(|| {
                RejectReason::Reference(ReferenceError {
                    pipe_id: record.id.clone(),
                    endpoint,
                    node_id: node_id.to_string(),
                })
            })
        };
        let start = endpoint(Endpoint::Start, &record.start_id)?;
        let end = endpoint(Endpoint::End, &record.end_id)?;

        let (geometry, source) = match &record.geometry {
            Some(g) if g.len() < 2 => {
                return Err(RejectReason::Geometry(GeometryError::TooFewVertices {
                    pipe_id: record.id.clone(),
                    count: g.len(),
                }));
            }
            Some(g) => {
                if !g.iter().all(Coord::is_finite) {
                    return Err(RejectReason::Geometry(GeometryError::NonFinite {
                        pipe_id: record.id.clone(),
                    }));
                }
                (g.clone(), GeometrySource::Supplied)
            }
            None => (
                vec![nodes[start.slot()].position, nodes[end.slot()].position],
                GeometrySource::Derived,
            ),
        };

        let length_m = match record.length.value() {
            Some(v) => v,
            None => self.options.length_metric.unwrap_or_default().length(&geometry),
        };
        if !(length_m.is_finite() && length_m > 0.0) {
            return Err(RejectReason::Geometry(GeometryError::ZeroLength {
                pipe_id: record.id.clone(),
            }));
        }

        Ok(Resolved {
            start,
            end,
            geometry,
            source,
            length_m,
        })
    }
}

/// Compact node → pipe adjacency, pipes listed in id order per node.
fn build_adjacency(nodes: &[Node], pipes: &[Pipe]) -> (Vec<usize>, Vec<Id>) {
    let mut per_node: Vec<Vec<Id>> = vec![Vec::new(); nodes.len()];
    for pipe in pipes {
        per_node[pipe.start.slot()].push(pipe.ix);
        per_node[pipe.end.slot()].push(pipe.ix);
    }

    let mut offsets = Vec::with_capacity(nodes.len() + 1);
    let mut flat = Vec::with_capacity(pipes.len() * 2);
    offsets.push(0);
    for list in per_node {
        flat.extend(list);
        offsets.push(flat.len());
    }
    (offsets, flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wn_records::Numeric;

    fn nodes() -> Vec<NodeRecord> {
        vec![
            NodeRecord::junction("A", 0.0, 0.0),
            NodeRecord::junction("B", 3.0, 4.0),
            NodeRecord::junction("C", 6.0, 8.0),
        ]
    }

    fn reject() -> NetworkBuilder {
        NetworkBuilder::new(BuildOptions {
            reference_policy: ReferencePolicy::RejectAndContinue,
            ..Default::default()
        })
    }

    #[test]
    fn derived_geometry_is_a_straight_segment() {
        let net = NetworkBuilder::default()
            .build(nodes(), vec![PipeRecord::between("P1", "A", "B")])
            .unwrap();
        let p = &net.pipes()[0];
        assert_eq!(p.geometry, vec![Coord::new(0.0, 0.0), Coord::new(3.0, 4.0)]);
        assert_eq!(p.geometry_source, GeometrySource::Derived);
        assert_eq!(p.length_m, 5.0);
    }

    #[test]
    fn supplied_geometry_is_preserved() {
        let mut rec = PipeRecord::between("P1", "A", "B");
        let line = vec![Coord::new(0.1, 0.0), Coord::new(1.0, 1.0), Coord::new(3.0, 4.1)];
        rec.geometry = Some(line.clone());
        rec.length = Numeric::Value(120.0);
        let net = NetworkBuilder::default().build(nodes(), vec![rec]).unwrap();
        assert_eq!(net.pipes()[0].geometry, line);
        assert_eq!(net.pipes()[0].length_m, 120.0);
    }

    #[test]
    fn fail_fast_names_pipe_and_missing_node() {
        let err = NetworkBuilder::default()
            .build(nodes(), vec![PipeRecord::between("P9", "X", "A")])
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::Reference(ReferenceError {
                pipe_id: "P9".into(),
                endpoint: Endpoint::Start,
                node_id: "X".into(),
            })
        );
        assert!(err.to_string().contains("P9"));
        assert!(err.to_string().contains("'X'"));
    }

    #[test]
    fn reject_and_continue_collects() {
        let net = reject()
            .build(
                nodes(),
                vec![
                    PipeRecord::between("P1", "A", "B"),
                    PipeRecord::between("P2", "B", "Z"),
                ],
            )
            .unwrap();
        assert_eq!(net.pipes().len(), 1);
        assert_eq!(net.rejected().len(), 1);
        assert_eq!(net.rejected()[0].record.id, "P2");
        assert!(matches!(
            &net.rejected()[0].reason,
            RejectReason::Reference(ReferenceError { endpoint: Endpoint::End, node_id, .. }) if node_id == "Z"
        ));
    }

    #[test]
    fn zero_length_is_geometry_error() {
        let mut ns = nodes();
        ns.push(NodeRecord::junction("A2", 0.0, 0.0));
        let err = NetworkBuilder::default()
            .build(ns, vec![PipeRecord::between("P1", "A", "A2")])
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::Geometry(GeometryError::ZeroLength {
                pipe_id: "P1".into()
            })
        );
    }

    #[test]
    fn single_vertex_geometry_is_rejected() {
        let mut rec = PipeRecord::between("P1", "A", "B");
        rec.geometry = Some(vec![Coord::new(0.0, 0.0)]);
        let net = reject().build(nodes(), vec![rec]).unwrap();
        assert!(net.pipes().is_empty());
        assert!(matches!(
            net.rejected()[0].reason,
            RejectReason::Geometry(GeometryError::TooFewVertices { count: 1, .. })
        ));
    }

    #[test]
    fn duplicate_ids_fail_regardless_of_policy() {
        let mut ns = nodes();
        ns.push(NodeRecord::junction("A", 9.0, 9.0));
        assert!(matches!(
            reject().build(ns, vec![]),
            Err(GraphError::DuplicateId { kind: "node", .. })
        ));
        let pipes = vec![
            PipeRecord::between("P1", "A", "B"),
            PipeRecord::between("P1", "B", "C"),
        ];
        assert!(matches!(
            reject().build(nodes(), pipes),
            Err(GraphError::DuplicateId { kind: "pipe", .. })
        ));
    }

    #[test]
    fn parallel_pipes_stay_distinct() {
        let net = NetworkBuilder::default()
            .build(
                nodes(),
                vec![
                    PipeRecord::between("P1", "A", "B"),
                    PipeRecord::between("P2", "A", "B"),
                ],
            )
            .unwrap();
        let a = net.node_ix("A").unwrap();
        assert_eq!(net.degree(a), 2);
        assert_ne!(net.pipe_ix("P1"), net.pipe_ix("P2"));
    }

    #[test]
    fn haversine_metric_uses_degrees() {
        let ns = vec![
            NodeRecord::junction("A", 0.0, 0.0),
            NodeRecord::junction("B", 0.0, 1.0),
        ];
        let net = NetworkBuilder::new(BuildOptions {
            length_metric: Some(LengthMetric::Haversine),
            ..Default::default()
        })
        .build(ns, vec![PipeRecord::between("P1", "A", "B")])
        .unwrap();
        assert!((net.pipes()[0].length_m - 111_195.0).abs() < 100.0);
    }
}
