//! Solver-native INP text.
//!
//! Reads the sections that describe topology and boundary data:
//! JUNCTIONS, RESERVOIRS, TANKS, PIPES, COORDINATES, VERTICES and STATUS.
//! Other sections (pumps, patterns, curves, options...) are skipped.

use std::collections::HashMap;

use tracing::debug;
use wn_core::{Coord, parse_real};

use super::tabular::read_csv;
use super::{NetworkSource, SourceTables};
use crate::error::{RecordsError, RecordsResult};
use crate::raw::RawTable;
use crate::schema::EntityKind;

const NODE_HEADERS: [&str; 8] = ["id", "x", "y", "elevation", "demand", "kind", "head", "level"];
const PIPE_HEADERS: [&str; 7] = [
    "id",
    "start_id",
    "end_id",
    "length",
    "diameter",
    "roughness",
    "status",
];

/// An INP model plus optional CSV asset and leak tables.
#[derive(Debug, Clone)]
pub struct SolverNativeSource {
    pub inp: Vec<u8>,
    pub assets: Option<Vec<u8>>,
    pub leaks: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Junctions,
    Reservoirs,
    Tanks,
    Pipes,
    Coordinates,
    Vertices,
    Status,
    Other,
}

impl Section {
    fn from_header(line: &str) -> Self {
        match line.to_ascii_uppercase().as_str() {
            "[JUNCTIONS]" => Section::Junctions,
            "[RESERVOIRS]" => Section::Reservoirs,
            "[TANKS]" => Section::Tanks,
            "[PIPES]" => Section::Pipes,
            "[COORDINATES]" => Section::Coordinates,
            "[VERTICES]" => Section::Vertices,
            "[STATUS]" => Section::Status,
            _ => Section::Other,
        }
    }
}

#[derive(Default)]
struct NodeRow {
    id: String,
    kind: &'static str,
    elevation: String,
    demand: String,
    head: String,
    level: String,
}

#[derive(Default)]
struct PipeRow {
    id: String,
    start: String,
    end: String,
    length: String,
    diameter: String,
    roughness: String,
    status: String,
}

fn field(tokens: &[&str], i: usize) -> String {
    tokens.get(i).map(|s| s.to_string()).unwrap_or_default()
}

fn coord_of(tokens: &[&str], line: usize) -> RecordsResult<Coord> {
    let x = tokens.get(1).and_then(|t| parse_real(t));
    let y = tokens.get(2).and_then(|t| parse_real(t));
    match (x, y) {
        (Some(x), Some(y)) => Ok(Coord::new(x, y)),
        _ => Err(RecordsError::Inp {
            line,
            message: format!("expected '<id> <x> <y>', got '{}'", tokens.join(" ")),
        }),
    }
}

/// Parse INP text into node and pipe tables.
pub fn read_inp(text: &str) -> RecordsResult<(RawTable, RawTable)> {
    let mut section = Section::Other;
    let mut nodes: Vec<NodeRow> = Vec::new();
    let mut pipes: Vec<PipeRow> = Vec::new();
    let mut coords: HashMap<String, Coord> = HashMap::new();
    let mut vertices: HashMap<String, Vec<Coord>> = HashMap::new();
    let mut statuses: HashMap<String, String> = HashMap::new();

    for (i, raw_line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw_line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            section = Section::from_header(line);
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match section {
            Section::Junctions => nodes.push(NodeRow {
                id: field(&tokens, 0),
                kind: "Junction",
                elevation: field(&tokens, 1),
                demand: field(&tokens, 2),
                ..Default::default()
            }),
            Section::Reservoirs => nodes.push(NodeRow {
                id: field(&tokens, 0),
                kind: "Reservoir",
                head: field(&tokens, 1),
                ..Default::default()
            }),
            Section::Tanks => nodes.push(NodeRow {
                id: field(&tokens, 0),
                kind: "Tank",
                elevation: field(&tokens, 1),
                level: field(&tokens, 2),
                ..Default::default()
            }),
            Section::Pipes => pipes.push(PipeRow {
                id: field(&tokens, 0),
                start: field(&tokens, 1),
                end: field(&tokens, 2),
                length: field(&tokens, 3),
                diameter: field(&tokens, 4),
                roughness: field(&tokens, 5),
                status: field(&tokens, 7),
            }),
            Section::Coordinates => {
                coords.insert(field(&tokens, 0), coord_of(&tokens, line_no)?);
            }
            Section::Vertices => {
                vertices
                    .entry(field(&tokens, 0))
                    .or_default()
                    .push(coord_of(&tokens, line_no)?);
            }
            Section::Status => {
                statuses.insert(field(&tokens, 0), field(&tokens, 1));
            }
            Section::Other => {}
        }
    }

    let mut node_table = RawTable::new(NODE_HEADERS.iter().map(|s| s.to_string()).collect());
    for n in &nodes {
        let (x, y) = coords
            .get(&n.id)
            .map(|c| (c.x.to_string(), c.y.to_string()))
            .unwrap_or_default();
        node_table.push(
            vec![
                n.id.clone(),
                x,
                y,
                n.elevation.clone(),
                n.demand.clone(),
                n.kind.to_string(),
                n.head.clone(),
                n.level.clone(),
            ],
            None,
        );
    }

    let mut pipe_table = RawTable::new(PIPE_HEADERS.iter().map(|s| s.to_string()).collect());
    for p in pipes {
        // Interior vertices only make sense between known endpoint positions.
        let geometry = match (vertices.remove(&p.id), coords.get(&p.start), coords.get(&p.end)) {
            (Some(inner), Some(a), Some(b)) => {
                let mut line = Vec::with_capacity(inner.len() + 2);
                line.push(*a);
                line.extend(inner);
                line.push(*b);
                Some(line)
            }
            _ => None,
        };
        let status = statuses.get(&p.id).cloned().unwrap_or(p.status);
        pipe_table.push(
            vec![
                p.id,
                p.start,
                p.end,
                p.length,
                p.diameter,
                p.roughness,
                status,
            ],
            geometry,
        );
    }

    debug!(
        nodes = node_table.len(),
        pipes = pipe_table.len(),
        "parsed INP sections"
    );
    Ok((node_table, pipe_table))
}

impl NetworkSource for SolverNativeSource {
    fn format(&self) -> &'static str {
        "inp"
    }

    fn load(&self) -> RecordsResult<SourceTables> {
        let text = std::str::from_utf8(&self.inp).map_err(|_| RecordsError::Encoding {
            role: EntityKind::Node,
        })?;
        let (nodes, pipes) = read_inp(text)?;
        Ok(SourceTables {
            nodes,
            pipes,
            assets: self
                .assets
                .as_deref()
                .map(|b| read_csv(b, EntityKind::Asset))
                .transpose()?,
            leaks: self
                .leaks
                .as_deref()
                .map(|b| read_csv(b, EntityKind::Leak))
                .transpose()?,
        })
    }
}
