//! Content-based hashing for scenario ids.

use serde::Serialize;
use sha2::{Digest, Sha256};
use wn_graph::{Network, Node, Pipe};
use wn_scenario::StatusOverrides;

#[derive(Serialize)]
struct HashInput<'a> {
    nodes: &'a [Node],
    pipes: &'a [Pipe],
    overrides: &'a StatusOverrides,
    solver: &'a str,
}

/// SHA-256 over the canonical JSON of everything that determines a result.
///
/// `solver` should identify both the solver and its settings.
pub fn compute_scenario_id(network: &Network, overrides: &StatusOverrides, solver: &str) -> String {
    let input = HashInput {
        nodes: network.nodes(),
        pipes: network.pipes(),
        overrides,
        solver,
    };
    let json = serde_json::to_string(&input).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether `id` looks like a value produced by `compute_scenario_id`.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| b.is_ascii_hexdigit())
}
