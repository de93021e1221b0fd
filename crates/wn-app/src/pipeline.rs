//! Build pipeline: load → normalize → reproject → build → connectivity gate.

use serde::Serialize;
use tracing::{info, warn};
use wn_graph::{ConnectivityReport, Network, NetworkBuilder, analyze};
use wn_project::InputFormat;
use wn_records::{
    AssetRecord, Crs, LeakSet, NetworkSource, RoleBuffers, SolverNativeSource,
    StandardReprojector, TabularSource, VectorFileSource, normalize_all,
};

use crate::context::{InputBuffers, RequestContext};
use crate::error::{AppError, AppResult};

/// A validated network with the context data read alongside it.
#[derive(Debug, Clone)]
pub struct BuiltNetwork {
    pub network: Network,
    pub connectivity: ConnectivityReport,
    pub assets: Vec<AssetRecord>,
    pub leaks: LeakSet,
}

/// Counts for reporting a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub pipes: usize,
    pub rejected_pipes: usize,
    pub components: usize,
    pub isolated_nodes: usize,
    pub self_loops: usize,
    pub assets: usize,
    pub leaks: usize,
    pub dropped_leaks: usize,
}

impl BuiltNetwork {
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            nodes: self.network.nodes().len(),
            pipes: self.network.pipes().len(),
            rejected_pipes: self.network.rejected().len(),
            components: self.connectivity.components.len(),
            isolated_nodes: self.connectivity.isolated_nodes.len(),
            self_loops: self.connectivity.self_loops.len(),
            assets: self.assets.len(),
            leaks: self.leaks.leaks.len(),
            dropped_leaks: self.leaks.dropped,
        }
    }
}

fn required(buffer: &Option<Vec<u8>>, role: &'static str) -> AppResult<Vec<u8>> {
    buffer.clone().ok_or(AppError::MissingInput { role })
}

fn role_buffers(inputs: &InputBuffers) -> AppResult<RoleBuffers> {
    Ok(RoleBuffers {
        nodes: required(&inputs.nodes, "nodes")?,
        pipes: required(&inputs.pipes, "pipes")?,
        assets: inputs.assets.clone(),
        leaks: inputs.leaks.clone(),
    })
}

/// The loader for the deployment's input format.
pub fn source_for(format: InputFormat, inputs: &InputBuffers) -> AppResult<Box<dyn NetworkSource>> {
    Ok(match format {
        InputFormat::Tabular => Box::new(TabularSource::new(role_buffers(inputs)?)),
        InputFormat::Geojson => Box::new(VectorFileSource::new(role_buffers(inputs)?)),
        InputFormat::Inp => Box::new(SolverNativeSource {
            inp: required(&inputs.network, "network")?,
            assets: inputs.assets.clone(),
            leaks: inputs.leaks.clone(),
        }),
    })
}

/// Run the whole build for one request.
///
/// Schema errors of every entity kind are collected before any graph
/// building starts.
pub fn build_network(ctx: &RequestContext) -> AppResult<BuiltNetwork> {
    let deployment = &ctx.deployment;
    let source = source_for(deployment.inputs.format, &ctx.inputs)?;
    let tables = source.load()?;
    info!(
        request = %ctx.request_id,
        format = source.format(),
        nodes = tables.nodes.len(),
        pipes = tables.pipes.len(),
        "loaded input tables"
    );

    let mut inputs = normalize_all(
        &tables,
        &deployment.schema_set(),
        &deployment.normalize_options(),
    )?;

    let from = Crs::new(&deployment.crs.source);
    let to = Crs::new(&deployment.crs.target);
    inputs.reproject(&StandardReprojector, &from, &to)?;

    let network =
        NetworkBuilder::new(deployment.build_options()).build(inputs.nodes, inputs.pipes)?;
    let connectivity = analyze(&network);

    if !connectivity.isolated_nodes.is_empty() {
        warn!(
            request = %ctx.request_id,
            isolated = connectivity.isolated_nodes.len(),
            "network has nodes without pipes"
        );
    }
    if deployment.connectivity.require_connected && !connectivity.is_fully_connected() {
        warn!(
            request = %ctx.request_id,
            components = connectivity.components.len(),
            "connectivity gate failed"
        );
        return Err(AppError::Disconnected {
            components: connectivity.components.len(),
            isolated: connectivity.isolated_nodes.len(),
        });
    }

    info!(
        request = %ctx.request_id,
        nodes = network.nodes().len(),
        pipes = network.pipes().len(),
        components = connectivity.components.len(),
        "network built"
    );
    Ok(BuiltNetwork {
        network,
        connectivity,
        assets: inputs.assets,
        leaks: inputs.leaks,
    })
}
