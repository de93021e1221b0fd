//! Service and criticality classification, and the baseline/scenario diff.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use wn_graph::{Network, Pipe};
use wn_records::Installation;
use wn_solver::SimulationResult;

/// Pipes older than this are high criticality, years.
pub const HIGH_AGE_YEARS: f64 = 50.0;
/// Pipes older than this are at least medium criticality, years.
pub const MEDIUM_AGE_YEARS: f64 = 30.0;
/// Materials that are high criticality regardless of age (lower case).
pub const HIGH_RISK_MATERIALS: &[&str] = &["cast iron"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceStatus {
    Served,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criticality {
    Low,
    Medium,
    High,
}

pub type ServiceMap = BTreeMap<String, ServiceStatus>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifySettings {
    /// Minimum pressure for a node to count as served, metres.
    pub pressure_threshold_m: f64,
    /// Year pipe ages are measured against.
    pub reference_year: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub service: ServiceMap,
    pub criticality: BTreeMap<String, Criticality>,
}

impl Classification {
    pub fn disconnected(&self) -> impl Iterator<Item = &str> {
        self.service
            .iter()
            .filter(|(_, s)| **s == ServiceStatus::Disconnected)
            .map(|(id, _)| id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioDiff {
    pub newly_disconnected: BTreeSet<String>,
    pub newly_served: BTreeSet<String>,
    /// Base demand of the newly disconnected nodes, l/s.
    pub demand_at_risk: f64,
}

/// Disconnected iff pressure is strictly below the threshold.
pub fn classify_nodes(result: &SimulationResult, pressure_threshold_m: f64) -> ServiceMap {
    result
        .nodes
        .iter()
        .map(|(id, r)| {
            let status = if r.pressure_m < pressure_threshold_m {
                ServiceStatus::Disconnected
            } else {
                ServiceStatus::Served
            };
            (id.clone(), status)
        })
        .collect()
}

/// Tier from material and age. Unknown age falls back to material alone.
pub fn classify_pipe(
    material: Option<&str>,
    installation: Installation,
    reference_year: i32,
) -> Criticality {
    let risky_material = material.is_some_and(|m| {
        let m = m.trim().to_lowercase();
        HIGH_RISK_MATERIALS.contains(&m.as_str())
    });
    let age = installation.age_at(reference_year);
    match age {
        _ if risky_material => Criticality::High,
        Some(a) if a > HIGH_AGE_YEARS => Criticality::High,
        Some(a) if a > MEDIUM_AGE_YEARS => Criticality::Medium,
        _ => Criticality::Low,
    }
}

fn tier(pipe: &Pipe, reference_year: i32) -> Criticality {
    classify_pipe(pipe.material.as_deref(), pipe.installation, reference_year)
}

pub fn classify_pipes(network: &Network, reference_year: i32) -> BTreeMap<String, Criticality> {
    network
        .pipes()
        .iter()
        .map(|p| (p.id.clone(), tier(p, reference_year)))
        .collect()
}

pub fn classify(
    network: &Network,
    result: &SimulationResult,
    settings: &ClassifySettings,
) -> Classification {
    Classification {
        service: classify_nodes(result, settings.pressure_threshold_m),
        criticality: classify_pipes(network, settings.reference_year),
    }
}

/// Compare two service maps over the nodes both contain.
pub fn diff(baseline: &ServiceMap, scenario: &ServiceMap, network: &Network) -> ScenarioDiff {
    let mut out = ScenarioDiff::default();
    for (id, before) in baseline {
        let Some(after) = scenario.get(id) else {
            continue;
        };
        match (before, after) {
            (ServiceStatus::Served, ServiceStatus::Disconnected) => {
                out.demand_at_risk += network
                    .node_by_id(id)
                    .map(|n| n.base_demand_lps())
                    .unwrap_or(0.0);
                out.newly_disconnected.insert(id.clone());
            }
            (ServiceStatus::Disconnected, ServiceStatus::Served) => {
                out.newly_served.insert(id.clone());
            }
            _ => {}
        }
    }
    out
}
