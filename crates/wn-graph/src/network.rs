//! The network model: nodes, pipes and their adjacency.

use serde::{Deserialize, Serialize};
use wn_core::{Coord, NodeIx, PipeIx};
use wn_records::{Installation, NodeKind, Numeric, PipeRecord, PipeStatus};

use crate::error::{GeometryError, GraphError, GraphResult, ReferenceError};
use crate::indexing::IdLookup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub ix: NodeIx,
    pub id: String,
    pub position: Coord,
    pub kind: NodeKind,
    pub elevation: Numeric,
    pub demand: Numeric,
    pub head: Numeric,
    pub level: Numeric,
}

impl Node {
    /// Base demand in l/s; missing or invalid demand counts as zero.
    pub fn base_demand_lps(&self) -> f64 {
        self.demand.value().unwrap_or(0.0)
    }
}

/// Where a pipe's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometrySource {
    /// Multi-vertex geometry from the input, kept verbatim.
    Supplied,
    /// Straight segment between the resolved endpoint positions.
    Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub ix: PipeIx,
    pub id: String,
    pub start: NodeIx,
    pub end: NodeIx,
    pub geometry: Vec<Coord>,
    pub geometry_source: GeometrySource,
    /// Metres; from the record when positive, otherwise from geometry.
    pub length_m: f64,
    /// Millimetres.
    pub diameter: Numeric,
    pub roughness: Numeric,
    pub material: Option<String>,
    pub installation: Installation,
    pub status: PipeStatus,
}

impl Pipe {
    pub fn is_open(&self) -> bool {
        self.status == PipeStatus::Open
    }

    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }

    /// The endpoint opposite `node`, or `None` if the pipe does not touch it.
    pub fn other_end(&self, node: NodeIx) -> Option<NodeIx> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// Why the builder excluded a pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    Reference(ReferenceError),
    Geometry(GeometryError),
}

impl From<RejectReason> for GraphError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::Reference(e) => GraphError::Reference(e),
            RejectReason::Geometry(e) => GraphError::Geometry(e),
        }
    }
}

/// A pipe record excluded under `ReferencePolicy::RejectAndContinue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPipe {
    pub record: PipeRecord,
    pub reason: RejectReason,
}

/// A built network.
///
/// Nodes and pipes are stored densely, indexed by `NodeIx`/`PipeIx`.
/// Parallel pipes between the same node pair stay distinct by id.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) pipes: Vec<Pipe>,

    /// Node i's incident pipes are `node_pipes[node_pipe_offsets[i]..node_pipe_offsets[i + 1]]`.
    pub(crate) node_pipe_offsets: Vec<usize>,
    pub(crate) node_pipes: Vec<PipeIx>,

    pub(crate) node_lookup: IdLookup,
    pub(crate) pipe_lookup: IdLookup,

    pub(crate) rejected: Vec<RejectedPipe>,
}

impl Network {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn node(&self, ix: NodeIx) -> Option<&Node> {
        self.nodes.get(ix.slot())
    }

    pub fn pipe(&self, ix: PipeIx) -> Option<&Pipe> {
        self.pipes.get(ix.slot())
    }

    pub fn node_ix(&self, id: &str) -> Option<NodeIx> {
        self.node_lookup.get(id)
    }

    pub fn pipe_ix(&self, id: &str) -> Option<PipeIx> {
        self.pipe_lookup.get(id)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.node_ix(id).and_then(|ix| self.node(ix))
    }

    pub fn pipe_by_id(&self, id: &str) -> Option<&Pipe> {
        self.pipe_ix(id).and_then(|ix| self.pipe(ix))
    }

    /// Pipes incident to a node (a self-loop appears twice).
    pub fn incident_pipes(&self, ix: NodeIx) -> &[PipeIx] {
        let i = ix.slot();
        if i >= self.nodes.len() {
            return &[];
        }
        &self.node_pipes[self.node_pipe_offsets[i]..self.node_pipe_offsets[i + 1]]
    }

    pub fn degree(&self, ix: NodeIx) -> usize {
        self.incident_pipes(ix).len()
    }

    /// Pipe records the build excluded, in input order.
    pub fn rejected(&self) -> &[RejectedPipe] {
        &self.rejected
    }

    /// Change a pipe's status. Topology and adjacency are untouched.
    pub fn set_status(&mut self, pipe_id: &str, status: PipeStatus) -> GraphResult<PipeStatus> {
        let ix = self
            .pipe_ix(pipe_id)
            .ok_or_else(|| GraphError::UnknownPipe {
                pipe_id: pipe_id.to_string(),
            })?;
        let pipe = &mut self.pipes[ix.slot()];
        Ok(std::mem::replace(&mut pipe.status, status))
    }

    /// Statuses of every pipe in dense order.
    pub fn statuses(&self) -> Vec<(&str, PipeStatus)> {
        self.pipes.iter().map(|p| (p.id.as_str(), p.status)).collect()
    }
}
