//! wn-graph: network model layer for waternet.
//!
//! Provides:
//! - `Network`: validated, immutable-after-build multigraph of nodes and pipes
//! - `NetworkBuilder` with an explicit reference-error policy
//! - post-build invariant checks
//! - the connectivity analyzer (topology only, pipe status is ignored)
//!
//! # Example
//!
//! ```
//! use wn_graph::{BuildOptions, NetworkBuilder};
//! use wn_records::{NodeRecord, PipeRecord};
//!
//! let nodes = vec![NodeRecord::junction("A", 0.0, 0.0), NodeRecord::junction("B", 3.0, 4.0)];
//! let pipes = vec![PipeRecord::between("P1", "A", "B")];
//! let network = NetworkBuilder::new(BuildOptions::default()).build(nodes, pipes).unwrap();
//!
//! assert_eq!(network.pipes().len(), 1);
//! assert_eq!(network.pipes()[0].length_m, 5.0);
//! ```

pub mod builder;
pub mod connectivity;
pub mod error;
pub mod indexing;
pub mod network;
pub(crate) mod validate;

pub use builder::{BuildOptions, LengthMetric, NetworkBuilder, ReferencePolicy};
pub use connectivity::{ConnectivityReport, OrphanPipe, analyze};
pub use error::{Endpoint, GeometryError, GraphError, GraphResult, ReferenceError};
pub use indexing::IdLookup;
pub use network::{GeometrySource, Network, Node, Pipe, RejectReason, RejectedPipe};
