//! Schema normalizer: raw tables in, typed records out.
//!
//! Every entity kind is checked independently. Missing required columns are
//! reported before any row is read; row-level problems are collected so one
//! pass reports every offending id.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use wn_core::{Coord, parse_real};

use crate::error::{FieldIssue, SchemaError, SchemaErrors};
use crate::raw::{RawRow, RawTable};
use crate::record::{
    AgeConvention, AssetKind, AssetRecord, AssetStatus, Installation, LeakRecord, LeakSet,
    NodeKind, NodeRecord, Numeric, PipeRecord, PipeStatus,
};
use crate::schema::{EntityKind, EntitySchema, SchemaSet};
use crate::source::SourceTables;

/// Oldest installation year accepted under `AgeConvention::InstallationYear`.
pub const EARLIEST_INSTALLATION_YEAR: i32 = 1800;
/// Largest age accepted under `AgeConvention::Age`.
pub const MAX_AGE_YEARS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub age_convention: AgeConvention,
    /// Year ages are measured against; installation years must not exceed it.
    pub reference_year: i32,
}

/// Typed records of one build request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedInputs {
    pub nodes: Vec<NodeRecord>,
    pub pipes: Vec<PipeRecord>,
    pub assets: Vec<AssetRecord>,
    pub leaks: LeakSet,
}

/// Column lookup for one table.
struct Columns {
    map: HashMap<&'static str, usize>,
}

impl Columns {
    fn resolve(table: &RawTable, schema: &EntitySchema) -> Result<Self, SchemaError> {
        let missing = schema.missing(&table.headers);
        if !missing.is_empty() {
            return Err(SchemaError::MissingFields {
                kind: schema.kind,
                missing,
                found: table.headers.iter().map(|h| h.trim().to_string()).collect(),
            });
        }
        Ok(Self {
            map: schema.resolve(&table.headers),
        })
    }

    /// Trimmed cell text; empty string when the column is absent.
    fn text<'r>(&self, row: &'r RawRow, field: &str) -> &'r str {
        self.map
            .get(field)
            .and_then(|&i| row.values.get(i))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

/// Issue collector for one table.
struct Issues {
    kind: EntityKind,
    items: Vec<FieldIssue>,
}

impl Issues {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    fn push(&mut self, entity: &str, field: &str, value: &str, reason: &str) {
        self.items.push(FieldIssue {
            entity_id: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }

    fn finish<T>(self, records: T) -> Result<T, SchemaError> {
        if self.items.is_empty() {
            Ok(records)
        } else {
            Err(SchemaError::InvalidValues {
                kind: self.kind,
                issues: self.items,
            })
        }
    }
}

/// Entity label for issues: the id if present, else `row N`.
fn label(id: &str, row_index: usize) -> String {
    if id.is_empty() {
        format!("row {}", row_index + 1)
    } else {
        id.to_string()
    }
}

fn required_id(cols: &Columns, row: &RawRow, idx: usize, issues: &mut Issues) -> Option<String> {
    let id = cols.text(row, "id");
    if id.is_empty() {
        issues.push(&label(id, idx), "id", id, "required value is blank");
        None
    } else {
        Some(id.to_string())
    }
}

fn required_position(
    cols: &Columns,
    row: &RawRow,
    entity: &str,
    issues: &mut Issues,
) -> Option<Coord> {
    let mut coord = [0.0; 2];
    let mut ok = true;
    for (slot, field) in ["x", "y"].into_iter().enumerate() {
        let raw = cols.text(row, field);
        match parse_real(raw) {
            Some(v) => coord[slot] = v,
            None => {
                let reason = if raw.is_empty() {
                    "required value is blank"
                } else {
                    "not a number"
                };
                issues.push(entity, field, raw, reason);
                ok = false;
            }
        }
    }
    ok.then(|| Coord::from(coord))
}

fn check_duplicates<'a>(ids: impl Iterator<Item = &'a str>, issues: &mut Issues) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            issues.push(id, "id", id, "duplicate id");
        }
    }
}

/// Normalize a node table.
pub fn normalize_nodes(
    table: &RawTable,
    schema: &EntitySchema,
) -> Result<Vec<NodeRecord>, SchemaError> {
    let cols = Columns::resolve(table, schema)?;
    let mut issues = Issues::new(EntityKind::Node);
    let mut nodes = Vec::with_capacity(table.len());

    for (idx, row) in table.rows.iter().enumerate() {
        let id = required_id(&cols, row, idx, &mut issues);
        let entity = label(id.as_deref().unwrap_or(""), idx);
        let position = required_position(&cols, row, &entity, &mut issues);

        let kind_raw = cols.text(row, "kind");
        let kind = NodeKind::parse(kind_raw);
        if kind.is_none() {
            issues.push(&entity, "kind", kind_raw, "unknown node kind");
        }

        let elevation = Numeric::parse(cols.text(row, "elevation"));
        let demand = Numeric::parse(cols.text(row, "demand"));
        let head = Numeric::parse(cols.text(row, "head"));
        let level = Numeric::parse(cols.text(row, "level"));

        match kind {
            Some(NodeKind::Reservoir) if head.value().is_none() => {
                issues.push(&entity, "head", cols.text(row, "head"), "reservoir requires a head");
            }
            Some(NodeKind::Tank) => {
                if elevation.value().is_none() {
                    issues.push(
                        &entity,
                        "elevation",
                        cols.text(row, "elevation"),
                        "tank requires an elevation",
                    );
                }
                if level.value().is_none() {
                    issues.push(&entity, "level", cols.text(row, "level"), "tank requires a level");
                }
            }
            _ => {}
        }

        if let (Some(id), Some(position), Some(kind)) = (id, position, kind) {
            nodes.push(NodeRecord {
                id,
                position,
                kind,
                elevation,
                demand,
                head,
                level,
            });
        }
    }

    check_duplicates(nodes.iter().map(|n| n.id.as_str()), &mut issues);
    debug!(count = nodes.len(), "normalized node records");
    issues.finish(nodes)
}

fn parse_installation(
    raw: &str,
    options: &NormalizeOptions,
) -> Result<Installation, &'static str> {
    if raw.is_empty() {
        return Ok(Installation::Unknown);
    }
    let value = parse_real(raw).ok_or("not a number")?;
    match options.age_convention {
        AgeConvention::Age => {
            if (0.0..=MAX_AGE_YEARS).contains(&value) {
                Ok(Installation::Age(value))
            } else {
                Err("age outside 0..=300 years")
            }
        }
        AgeConvention::InstallationYear => {
            if value.fract() != 0.0 {
                return Err("installation year is not a whole year");
            }
            let year = value as i32;
            if (EARLIEST_INSTALLATION_YEAR..=options.reference_year).contains(&year) {
                Ok(Installation::Year(year))
            } else {
                Err("installation year outside 1800..=reference year")
            }
        }
    }
}

/// Normalize a pipe table under the deployment's age convention.
pub fn normalize_pipes(
    table: &RawTable,
    schema: &EntitySchema,
    options: &NormalizeOptions,
) -> Result<Vec<PipeRecord>, SchemaError> {
    let cols = Columns::resolve(table, schema)?;
    let mut issues = Issues::new(EntityKind::Pipe);
    let mut pipes = Vec::with_capacity(table.len());

    for (idx, row) in table.rows.iter().enumerate() {
        let id = required_id(&cols, row, idx, &mut issues);
        let entity = label(id.as_deref().unwrap_or(""), idx);

        let mut endpoint = |field: &str| {
            let v = cols.text(row, field);
            if v.is_empty() {
                issues.push(&entity, field, v, "required value is blank");
                None
            } else {
                Some(v.to_string())
            }
        };
        let start_id = endpoint("start_id");
        let end_id = endpoint("end_id");

        let installation = match parse_installation(cols.text(row, "age_or_year"), options) {
            Ok(inst) => Some(inst),
            Err(reason) => {
                issues.push(&entity, "age_or_year", cols.text(row, "age_or_year"), reason);
                None
            }
        };

        let status_raw = cols.text(row, "status");
        let status = PipeStatus::parse(status_raw);
        if status.is_none() {
            issues.push(&entity, "status", status_raw, "status must be Open or Closed");
        }

        let material = Some(cols.text(row, "material"))
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        let geometry = match &row.geometry {
            Some(g) if g.len() < 2 => {
                issues.push(
                    &entity,
                    "geometry",
                    &format!("{} vertex", g.len()),
                    "line geometry needs at least two vertices",
                );
                None
            }
            other => other.clone(),
        };

        if let (Some(id), Some(start_id), Some(end_id), Some(installation), Some(status)) =
            (id, start_id, end_id, installation, status)
        {
            pipes.push(PipeRecord {
                id,
                start_id,
                end_id,
                length: Numeric::parse_positive(cols.text(row, "length")),
                diameter: Numeric::parse_positive(cols.text(row, "diameter")),
                roughness: Numeric::parse_positive(cols.text(row, "roughness")),
                material,
                installation,
                status,
                geometry,
            });
        }
    }

    check_duplicates(pipes.iter().map(|p| p.id.as_str()), &mut issues);
    debug!(count = pipes.len(), "normalized pipe records");
    issues.finish(pipes)
}

/// Normalize an asset table.
pub fn normalize_assets(
    table: &RawTable,
    schema: &EntitySchema,
) -> Result<Vec<AssetRecord>, SchemaError> {
    let cols = Columns::resolve(table, schema)?;
    let mut issues = Issues::new(EntityKind::Asset);
    let mut assets = Vec::with_capacity(table.len());

    for (idx, row) in table.rows.iter().enumerate() {
        let id = required_id(&cols, row, idx, &mut issues);
        let entity = label(id.as_deref().unwrap_or(""), idx);
        let position = required_position(&cols, row, &entity, &mut issues);
        let kind_raw = cols.text(row, "kind");
        if kind_raw.is_empty() {
            issues.push(&entity, "kind", kind_raw, "required value is blank");
        }
        if let (Some(id), Some(position), false) = (id, position, kind_raw.is_empty()) {
            assets.push(AssetRecord {
                id,
                kind: AssetKind::parse(kind_raw),
                position,
                status: AssetStatus::parse(cols.text(row, "status")),
            });
        }
    }

    check_duplicates(assets.iter().map(|a| a.id.as_str()), &mut issues);
    issues.finish(assets)
}

/// Normalize a leak table.
///
/// Rows lacking a position or a year are dropped and counted rather than
/// reported, matching how leak histories are usually exported.
pub fn normalize_leaks(table: &RawTable, schema: &EntitySchema) -> Result<LeakSet, SchemaError> {
    let cols = Columns::resolve(table, schema)?;
    let mut issues = Issues::new(EntityKind::Leak);
    let mut set = LeakSet::default();

    for (idx, row) in table.rows.iter().enumerate() {
        let (x, y, year) = (
            cols.text(row, "x"),
            cols.text(row, "y"),
            cols.text(row, "year"),
        );
        if x.is_empty() || y.is_empty() || year.is_empty() {
            set.dropped += 1;
            continue;
        }
        let id = Some(cols.text(row, "id"))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let entity = label(id.as_deref().unwrap_or(""), idx);
        let Some(position) = required_position(&cols, row, &entity, &mut issues) else {
            continue;
        };
        match parse_real(year) {
            Some(v) if v.fract() == 0.0 => set.leaks.push(LeakRecord {
                id,
                position,
                year: v as i32,
            }),
            _ => issues.push(&entity, "year", year, "year must be a whole number"),
        }
    }

    if set.dropped > 0 {
        warn!(dropped = set.dropped, "leak rows without position or year were dropped");
    }
    issues.finish(set)
}

/// Normalize every table of a source, collecting schema errors across
/// entity kinds before failing.
pub fn normalize_all(
    tables: &SourceTables,
    schemas: &SchemaSet,
    options: &NormalizeOptions,
) -> Result<NormalizedInputs, SchemaErrors> {
    let mut errors = Vec::new();

    let nodes = normalize_nodes(&tables.nodes, &schemas.node).map_err(|e| errors.push(e));
    let pipes = normalize_pipes(&tables.pipes, &schemas.pipe, options).map_err(|e| errors.push(e));
    let assets = match &tables.assets {
        Some(t) => normalize_assets(t, &schemas.asset).map_err(|e| errors.push(e)),
        None => Ok(Vec::new()),
    };
    let leaks = match &tables.leaks {
        Some(t) => normalize_leaks(t, &schemas.leak).map_err(|e| errors.push(e)),
        None => Ok(LeakSet::default()),
    };

    match (nodes, pipes, assets, leaks) {
        (Ok(nodes), Ok(pipes), Ok(assets), Ok(leaks)) if errors.is_empty() => Ok(NormalizedInputs {
            nodes,
            pipes,
            assets,
            leaks,
        }),
        _ => Err(SchemaErrors(errors)),
    }
}
