//! Deployment validation logic.

use std::collections::HashSet;

use wn_graph::LengthMetric;
use wn_records::{Crs, EntitySchema, Reprojector, StandardReprojector};

use crate::schema::{Deployment, InputFormat, ScenarioDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing input: {role} is required for {format} inputs")]
    MissingInput { role: String, format: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_deployment(d: &Deployment) -> Result<(), ValidationError> {
    if d.version != crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion { version: d.version });
    }
    if d.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    validate_inputs(d)?;
    validate_crs(d)?;
    validate_aliases(d)?;

    let threshold = d.service.pressure_threshold_m;
    if !threshold.is_finite() {
        return Err(invalid("service.pressure_threshold_m", threshold, "must be finite"));
    }
    if let Some(year) = d.ages.reference_year
        && !(1800..=9999).contains(&year)
    {
        return Err(invalid("ages.reference_year", year, "must be a calendar year"));
    }

    let s = &d.solver;
    if s.max_iterations == 0 {
        return Err(invalid("solver.max_iterations", 0, "must be positive"));
    }
    if !(s.tolerance.is_finite() && s.tolerance > 0.0) {
        return Err(invalid("solver.tolerance", s.tolerance, "must be positive"));
    }
    if let Some(c) = s.default_roughness
        && !(c.is_finite() && c > 0.0)
    {
        return Err(invalid("solver.default_roughness", c, "must be positive"));
    }

    let mut names = HashSet::new();
    for scenario in &d.scenarios {
        if !names.insert(scenario.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: scenario.name.clone(),
                context: "scenarios".to_string(),
            });
        }
        validate_scenario(scenario)?;
    }

    Ok(())
}

fn validate_inputs(d: &Deployment) -> Result<(), ValidationError> {
    let inputs = &d.inputs;
    let missing = |role: &str, format: &str| ValidationError::MissingInput {
        role: role.to_string(),
        format: format.to_string(),
    };
    match inputs.format {
        InputFormat::Tabular | InputFormat::Geojson => {
            let format = if inputs.format == InputFormat::Tabular {
                "tabular"
            } else {
                "geojson"
            };
            if inputs.nodes.is_none() {
                return Err(missing("nodes", format));
            }
            if inputs.pipes.is_none() {
                return Err(missing("pipes", format));
            }
            if inputs.network.is_some() {
                return Err(ValidationError::Unsupported {
                    feature: "inputs.network".into(),
                    reason: format!("only used with inp inputs, not {format}"),
                });
            }
        }
        InputFormat::Inp => {
            if inputs.network.is_none() {
                return Err(missing("network", "inp"));
            }
            if inputs.nodes.is_some() || inputs.pipes.is_some() {
                return Err(ValidationError::Unsupported {
                    feature: "inputs.nodes/pipes".into(),
                    reason: "inp inputs read nodes and pipes from the network file".into(),
                });
            }
        }
    }
    Ok(())
}

fn validate_crs(d: &Deployment) -> Result<(), ValidationError> {
    for (field, code) in [("crs.source", &d.crs.source), ("crs.target", &d.crs.target)] {
        if code.trim().is_empty() {
            return Err(invalid(field, "", "must not be empty"));
        }
    }
    let (from, to) = (Crs::new(&d.crs.source), Crs::new(&d.crs.target));
    if StandardReprojector.project(&[], &from, &to).is_err() {
        return Err(ValidationError::Unsupported {
            feature: format!("reprojection {from} -> {to}"),
            reason: "supported: identity, EPSG:3857 <-> EPSG:4326, EPSG:27700 -> EPSG:4326".into(),
        });
    }
    match (d.build.length_metric, to.is_geographic()) {
        (Some(LengthMetric::Planar), true) => Err(invalid(
            "build.length_metric",
            "planar",
            "target CRS is in degrees; use haversine",
        )),
        (Some(LengthMetric::Haversine), false) => Err(invalid(
            "build.length_metric",
            "haversine",
            "target CRS is projected; use planar",
        )),
        _ => Ok(()),
    }
}

fn validate_aliases(d: &Deployment) -> Result<(), ValidationError> {
    for (kind, fields) in &d.field_aliases {
        let schema = EntitySchema::for_kind(*kind);
        for canonical in fields.keys() {
            if !schema.fields.iter().any(|f| f.name == canonical) {
                return Err(invalid(
                    format!("field_aliases.{kind}"),
                    canonical,
                    "not a field of this entity kind",
                ));
            }
        }
    }
    Ok(())
}

fn validate_scenario(s: &ScenarioDef) -> Result<(), ValidationError> {
    if s.name.trim().is_empty() {
        return Err(invalid("scenarios.name", "", "must not be empty"));
    }
    let closed: HashSet<&str> = s.close.iter().map(String::as_str).collect();
    if let Some(both) = s.open.iter().find(|p| closed.contains(p.as_str())) {
        return Err(invalid(
            format!("scenarios.{}", s.name),
            both,
            "pipe is both opened and closed",
        ));
    }
    Ok(())
}
