//! Typed, normalized records.

use serde::{Deserialize, Serialize};
use std::fmt;
use wn_core::{Coord, parse_real};

/// An optional numeric field after normalization.
///
/// Blank cells become `Missing`; text that does not parse (or parses to a
/// physically meaningless value) keeps its raw form in `Invalid`. Neither is
/// ever coerced to zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "raw", rename_all = "snake_case")]
pub enum Numeric {
    Value(f64),
    #[default]
    Missing,
    Invalid(String),
}

impl Numeric {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Numeric::Missing;
        }
        match parse_real(raw) {
            Some(v) => Numeric::Value(v),
            None => Numeric::Invalid(raw.trim().to_string()),
        }
    }

    /// Like `parse`, but a value that is not strictly positive is `Invalid`.
    pub fn parse_positive(raw: &str) -> Self {
        match Self::parse(raw) {
            Numeric::Value(v) if v <= 0.0 => Numeric::Invalid(raw.trim().to_string()),
            other => other,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Numeric::Missing)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Numeric::Invalid(_))
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Value(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Junction,
    Reservoir,
    Tank,
    Meter,
}

impl NodeKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "junction" | "node" => Some(NodeKind::Junction),
            "reservoir" | "source" => Some(NodeKind::Reservoir),
            "tank" => Some(NodeKind::Tank),
            "meter" => Some(NodeKind::Meter),
            _ => None,
        }
    }

    /// Reservoirs and tanks fix the hydraulic head at their node.
    pub fn is_source(self) -> bool {
        matches!(self, NodeKind::Reservoir | NodeKind::Tank)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub position: Coord,
    pub kind: NodeKind,
    /// Ground elevation, metres.
    pub elevation: Numeric,
    /// Base demand, litres per second.
    pub demand: Numeric,
    /// Fixed total head of a reservoir, metres.
    pub head: Numeric,
    /// Water level above a tank's elevation, metres.
    pub level: Numeric,
}

impl NodeRecord {
    /// A junction with only the required fields populated.
    pub fn junction(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Coord::new(x, y),
            kind: NodeKind::Junction,
            elevation: Numeric::Missing,
            demand: Numeric::Missing,
            head: Numeric::Missing,
            level: Numeric::Missing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PipeStatus {
    #[default]
    Open,
    Closed,
}

impl PipeStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "open" | "cv" => Some(PipeStatus::Open),
            "closed" | "close" => Some(PipeStatus::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for PipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeStatus::Open => f.write_str("Open"),
            PipeStatus::Closed => f.write_str("Closed"),
        }
    }
}

/// How the `age_or_year` column of a deployment is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeConvention {
    /// The column holds the pipe age in years.
    #[default]
    Age,
    /// The column holds the calendar year of installation.
    InstallationYear,
}

/// Installation data of a pipe, interpreted under the deployment's convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Installation {
    Age(f64),
    Year(i32),
    #[default]
    Unknown,
}

impl Installation {
    /// Age in years relative to `reference_year`.
    pub fn age_at(self, reference_year: i32) -> Option<f64> {
        match self {
            Installation::Age(a) => Some(a),
            Installation::Year(y) => Some(f64::from(reference_year - y)),
            Installation::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeRecord {
    pub id: String,
    pub start_id: String,
    pub end_id: String,
    /// Metres.
    pub length: Numeric,
    /// Millimetres.
    pub diameter: Numeric,
    /// Hazen-Williams C.
    pub roughness: Numeric,
    pub material: Option<String>,
    pub installation: Installation,
    pub status: PipeStatus,
    /// Original multi-vertex geometry, when the input carried one.
    pub geometry: Option<Vec<Coord>>,
}

impl PipeRecord {
    /// An open pipe with only the required fields populated.
    pub fn between(
        id: impl Into<String>,
        start_id: impl Into<String>,
        end_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_id: start_id.into(),
            end_id: end_id.into(),
            length: Numeric::Missing,
            diameter: Numeric::Missing,
            roughness: Numeric::Missing,
            material: None,
            installation: Installation::Unknown,
            status: PipeStatus::Open,
            geometry: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Valve,
    Hydrant,
    Meter,
    Other(String),
}

impl AssetKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "valve" => AssetKind::Valve,
            "hydrant" => AssetKind::Hydrant,
            "meter" => AssetKind::Meter,
            _ => AssetKind::Other(raw.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Open,
    Closed,
    Available,
    Unknown,
    Other(String),
}

impl AssetStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" => AssetStatus::Unknown,
            "open" => AssetStatus::Open,
            "closed" | "close" => AssetStatus::Closed,
            "available" => AssetStatus::Available,
            _ => AssetStatus::Other(raw.trim().to_string()),
        }
    }
}

/// Read-only context data; not part of the hydraulic graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub kind: AssetKind,
    pub position: Coord,
    pub status: AssetStatus,
}

/// A recorded leak, located by position and year of occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakRecord {
    pub id: Option<String>,
    pub position: Coord,
    pub year: i32,
}

/// Leaks kept after normalization, plus how many rows lacked a position or year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeakSet {
    pub leaks: Vec<LeakRecord>,
    pub dropped: usize,
}
