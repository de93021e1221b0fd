//! GeoJSON feature collections, one buffer per entity role.
//!
//! Feature properties become columns. Point geometries fill `x`/`y` unless
//! the properties already carry them; line geometries are kept verbatim as
//! the row's geometry.

use serde::Deserialize;
use serde_json::{Map, Value};
use wn_core::Coord;

use super::{NetworkSource, RoleBuffers, SourceTables};
use crate::error::{RecordsError, RecordsResult};
use crate::raw::RawTable;
use crate::schema::{EntityKind, header_key};

#[derive(Debug, Clone)]
pub struct VectorFileSource {
    pub buffers: RoleBuffers,
}

impl VectorFileSource {
    pub fn new(buffers: RoleBuffers) -> Self {
        Self { buffers }
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Point { coordinates: Vec<f64> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Unsupported,
}

fn to_coord(v: &[f64]) -> Option<Coord> {
    match v {
        [x, y, ..] => Some(Coord::new(*x, *y)),
        _ => None,
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a GeoJSON FeatureCollection into a raw table.
pub fn read_geojson(bytes: &[u8], role: EntityKind) -> RecordsResult<RawTable> {
    let collection: FeatureCollection =
        serde_json::from_slice(bytes).map_err(|e| RecordsError::GeoJson {
            role,
            message: e.to_string(),
        })?;

    // Union of property keys, in first-seen order.
    let mut headers: Vec<String> = Vec::new();
    for feature in &collection.features {
        for key in feature.properties.iter().flat_map(|p| p.keys()) {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let has_column = |name: &str| headers.iter().any(|h| header_key(h) == name);
    let add_id = !has_column("id") && collection.features.iter().any(|f| f.id.is_some());
    let add_xy = !has_column("x")
        && collection
            .features
            .iter()
            .any(|f| matches!(f.geometry, Some(Geometry::Point { .. })));
    if add_id {
        headers.push("id".to_string());
    }
    if add_xy {
        headers.push("x".to_string());
        headers.push("y".to_string());
    }

    let mut table = RawTable::new(headers);
    for (index, feature) in collection.features.iter().enumerate() {
        let props = feature.properties.as_ref();
        let mut values: Vec<String> = table
            .headers
            .iter()
            .map(|h| props.and_then(|p| p.get(h)).map(cell).unwrap_or_default())
            .collect();

        let mut geometry = None;
        match &feature.geometry {
            Some(Geometry::Point { coordinates }) if add_xy => {
                let c = to_coord(coordinates).ok_or_else(|| RecordsError::GeoJson {
                    role,
                    message: format!("feature {index}: point needs two coordinates"),
                })?;
                let n = values.len();
                values[n - 2] = c.x.to_string();
                values[n - 1] = c.y.to_string();
            }
            Some(Geometry::LineString { coordinates }) => {
                geometry = Some(coordinates.iter().filter_map(|c| to_coord(c)).collect());
            }
            Some(Geometry::MultiLineString { coordinates }) => {
                // Parts are joined end to end; pipes are single lines in practice.
                geometry = Some(
                    coordinates
                        .iter()
                        .flatten()
                        .filter_map(|c| to_coord(c))
                        .collect(),
                );
            }
            _ => {}
        }
        if add_id {
            let pos = table.headers.len() - if add_xy { 3 } else { 1 };
            values[pos] = feature.id.as_ref().map(cell).unwrap_or_default();
        }
        table.push(values, geometry);
    }
    Ok(table)
}

impl NetworkSource for VectorFileSource {
    fn format(&self) -> &'static str {
        "geojson"
    }

    fn load(&self) -> RecordsResult<SourceTables> {
        let b = &self.buffers;
        Ok(SourceTables {
            nodes: read_geojson(&b.nodes, EntityKind::Node)?,
            pipes: read_geojson(&b.pipes, EntityKind::Pipe)?,
            assets: b
                .assets
                .as_deref()
                .map(|bytes| read_geojson(bytes, EntityKind::Asset))
                .transpose()?,
            leaks: b
                .leaks
                .as_deref()
                .map(|bytes| read_geojson(bytes, EntityKind::Leak))
                .transpose()?,
        })
    }
}
