//! Output model for the map layer.

use serde::Serialize;
use wn_core::Coord;
use wn_records::{AssetRecord, NodeKind, PipeStatus};
use wn_scenario::{Criticality, ScenarioDiff, ServiceStatus, classify_pipes};

use crate::analysis::ScenarioReport;
use crate::pipeline::BuiltNetwork;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub position: Coord,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipeView {
    pub id: String,
    pub geometry: Vec<Coord>,
    pub status: PipeStatus,
    pub criticality: Criticality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_lps: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub nodes: Vec<NodeView>,
    pub pipes: Vec<PipeView>,
    pub assets: Vec<AssetRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ScenarioDiff>,
}

impl NetworkView {
    /// Positions, geometry and criticality; no simulation.
    pub fn topology(built: &BuiltNetwork, reference_year: i32) -> Self {
        let tiers = classify_pipes(&built.network, reference_year);
        let nodes = built
            .network
            .nodes()
            .iter()
            .map(|n| NodeView {
                id: n.id.clone(),
                position: n.position,
                kind: n.kind,
                service_status: None,
                pressure_m: None,
            })
            .collect();
        let pipes = built
            .network
            .pipes()
            .iter()
            .map(|p| PipeView {
                id: p.id.clone(),
                geometry: p.geometry.clone(),
                status: p.status,
                criticality: tiers.get(&p.id).copied().unwrap_or(Criticality::Low),
                flow_lps: None,
            })
            .collect();
        Self {
            scenario: None,
            nodes,
            pipes,
            assets: built.assets.clone(),
            diff: None,
        }
    }

    /// Service, pressure and flow of one analysed scenario, with its diff.
    pub fn scenario(built: &BuiltNetwork, report: &ScenarioReport) -> Self {
        let classification = &report.classification;
        let nodes = built
            .network
            .nodes()
            .iter()
            .map(|n| NodeView {
                id: n.id.clone(),
                position: n.position,
                kind: n.kind,
                service_status: classification.service.get(&n.id).copied(),
                pressure_m: report.result.pressure(&n.id),
            })
            .collect();
        let pipes = built
            .network
            .pipes()
            .iter()
            .map(|p| PipeView {
                id: p.id.clone(),
                geometry: p.geometry.clone(),
                status: report.scenario.overrides.get(&p.id).copied().unwrap_or(p.status),
                criticality: classification
                    .criticality
                    .get(&p.id)
                    .copied()
                    .unwrap_or(Criticality::Low),
                flow_lps: report.result.flow(&p.id),
            })
            .collect();
        Self {
            scenario: Some(report.scenario.name.clone()),
            nodes,
            pipes,
            assets: built.assets.clone(),
            diff: Some(report.diff.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
