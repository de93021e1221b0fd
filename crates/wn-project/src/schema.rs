//! Deployment schema definitions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use wn_graph::{BuildOptions, LengthMetric};
use wn_records::{AgeConvention, Crs, EntityKind, NormalizeOptions, SchemaSet};
use wn_solver::SolverSettings;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    #[serde(default)]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub crs: CrsDef,
    pub inputs: InputsDef,
    /// Extra header spellings: entity kind → canonical field → aliases.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_aliases: BTreeMap<EntityKind, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub build: BuildOptions,
    #[serde(default)]
    pub ages: AgesDef,
    #[serde(default)]
    pub service: ServiceDef,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub connectivity: ConnectivityDef,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrsDef {
    pub source: String,
    pub target: String,
}

impl Default for CrsDef {
    fn default() -> Self {
        Self {
            source: "EPSG:4326".into(),
            target: "EPSG:4326".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// One CSV per entity role.
    Tabular,
    /// One GeoJSON FeatureCollection per entity role.
    Geojson,
    /// One INP model for nodes and pipes; assets and leaks as CSV.
    Inp,
}

/// Which file feeds which entity role. Paths are relative to the deployment file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputsDef {
    pub format: InputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipes: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaks: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AgesDef {
    #[serde(default)]
    pub convention: AgeConvention,
    /// Defaults to the current calendar year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ServiceDef {
    pub pressure_threshold_m: f64,
}

impl Default for ServiceDef {
    fn default() -> Self {
        Self {
            pressure_threshold_m: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ConnectivityDef {
    /// Fail the build when the network splits into several components.
    #[serde(default)]
    pub require_connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub close: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open: Vec<String>,
}

impl Deployment {
    /// A deployment with defaults for everything but name and inputs.
    pub fn new(name: impl Into<String>, inputs: InputsDef) -> Self {
        Self {
            version: crate::LATEST_VERSION,
            name: name.into(),
            crs: CrsDef::default(),
            inputs,
            field_aliases: BTreeMap::new(),
            build: BuildOptions::default(),
            ages: AgesDef::default(),
            service: ServiceDef::default(),
            solver: SolverSettings::default(),
            connectivity: ConnectivityDef::default(),
            scenarios: Vec::new(),
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.ages
            .reference_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }

    /// Build options with the length metric filled in from the target CRS.
    pub fn build_options(&self) -> BuildOptions {
        let geographic = Crs::new(&self.crs.target).is_geographic();
        BuildOptions {
            length_metric: Some(self.build.length_metric.unwrap_or(if geographic {
                LengthMetric::Haversine
            } else {
                LengthMetric::Planar
            })),
            ..self.build
        }
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            age_convention: self.ages.convention,
            reference_year: self.reference_year(),
        }
    }

    /// Built-in schemas extended with the deployment's aliases.
    pub fn schema_set(&self) -> SchemaSet {
        let mut set = SchemaSet::default();
        for (kind, fields) in &self.field_aliases {
            let schema = set.get_mut(*kind);
            for (canonical, aliases) in fields {
                for alias in aliases {
                    schema.add_alias(canonical, alias.clone());
                }
            }
        }
        set
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioDef> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

impl InputsDef {
    pub fn tabular(nodes: impl Into<PathBuf>, pipes: impl Into<PathBuf>) -> Self {
        Self {
            format: InputFormat::Tabular,
            nodes: Some(nodes.into()),
            pipes: Some(pipes.into()),
            network: None,
            assets: None,
            leaks: None,
        }
    }

    /// Every configured path paired with the role it feeds.
    pub fn roles(&self) -> Vec<(&'static str, &Path)> {
        [
            ("nodes", &self.nodes),
            ("pipes", &self.pipes),
            ("network", &self.network),
            ("assets", &self.assets),
            ("leaks", &self.leaks),
        ]
        .into_iter()
        .filter_map(|(role, p)| p.as_deref().map(|p| (role, p)))
        .collect()
    }
}
