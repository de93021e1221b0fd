//! Post-build invariant checks.

use crate::error::{GraphError, GraphResult};
use crate::network::{GeometrySource, Network};

fn broken(what: String) -> GraphError {
    GraphError::Invariant { what }
}

/// Every pipe endpoint resolves, dense indices match positions, adjacency is
/// consistent, derived geometry ends at the resolved node positions.
pub(crate) fn validate_network(net: &Network) -> GraphResult<()> {
    for (i, node) in net.nodes.iter().enumerate() {
        if node.ix.slot() != i {
            return Err(broken(format!("node '{}' stored at slot {i}", node.id)));
        }
    }

    for (i, pipe) in net.pipes.iter().enumerate() {
        if pipe.ix.slot() != i {
            return Err(broken(format!("pipe '{}' stored at slot {i}", pipe.id)));
        }
        let (Some(start), Some(end)) = (net.node(pipe.start), net.node(pipe.end)) else {
            return Err(broken(format!("pipe '{}' has a dangling endpoint", pipe.id)));
        };
        if pipe.geometry_source == GeometrySource::Derived
            && (pipe.geometry.first() != Some(&start.position)
                || pipe.geometry.last() != Some(&end.position))
        {
            return Err(broken(format!(
                "pipe '{}' geometry does not end at its nodes",
                pipe.id
            )));
        }
    }

    validate_adjacency(net)?;

    if net.node_lookup.len() != net.nodes.len() || net.pipe_lookup.len() != net.pipes.len() {
        return Err(broken("id lookup out of sync with storage".into()));
    }
    Ok(())
}

fn validate_adjacency(net: &Network) -> GraphResult<()> {
    if net.node_pipe_offsets.len() != net.nodes.len() + 1 {
        return Err(broken("adjacency offsets length mismatch".into()));
    }
    if net.node_pipes.len() != net.pipes.len() * 2 {
        return Err(broken(format!(
            "adjacency holds {} entries for {} pipes",
            net.node_pipes.len(),
            net.pipes.len()
        )));
    }
    for node in &net.nodes {
        for &p in net.incident_pipes(node.ix) {
            let touches = net
                .pipe(p)
                .is_some_and(|pipe| pipe.start == node.ix || pipe.end == node.ix);
            if !touches {
                return Err(broken(format!(
                    "pipe {p} listed at node '{}' but not incident to it",
                    node.id
                )));
            }
        }
    }
    Ok(())
}
