//! Entity schemas: canonical field names, accepted aliases, required sets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The kinds of entity an input table can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    Pipe,
    Asset,
    Leak,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Node => "node",
            EntityKind::Pipe => "pipe",
            EntityKind::Asset => "asset",
            EntityKind::Leak => "leak",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical name used by the normalizer.
    pub name: &'static str,
    /// Alternative spellings accepted in input headers.
    pub aliases: Vec<String>,
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &'static str, required: bool, aliases: &[&str]) -> Self {
        Self {
            name,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            required,
        }
    }

    fn matches(&self, header: &str) -> bool {
        let key = header_key(header);
        key == self.name || self.aliases.iter().any(|a| header_key(a) == key)
    }
}

/// Whitespace-trimmed, case-folded form used for header matching.
pub fn header_key(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

/// Field layout of one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub fields: Vec<FieldSpec>,
}

impl EntitySchema {
    /// Built-in schema for an entity kind.
    pub fn for_kind(kind: EntityKind) -> Self {
        let fields = match kind {
            EntityKind::Node => vec![
                FieldSpec::new("id", true, &["nodeid", "node_id", "node"]),
                FieldSpec::new("x", true, &["xcoord", "x_coord", "lon", "longitude", "easting"]),
                FieldSpec::new("y", true, &["ycoord", "y_coord", "lat", "latitude", "northing"]),
                FieldSpec::new("elevation", false, &["elev", "z"]),
                FieldSpec::new("demand", false, &["base_demand", "basedemand"]),
                FieldSpec::new("kind", false, &["type", "node_type", "nodetype"]),
                FieldSpec::new("head", false, &["total_head", "totalhead"]),
                FieldSpec::new("level", false, &["init_level", "initlevel"]),
            ],
            EntityKind::Pipe => vec![
                FieldSpec::new("id", true, &["pipeid", "pipe_id", "link", "linkid"]),
                FieldSpec::new("start_id", true, &["startid", "start", "from", "node1"]),
                FieldSpec::new("end_id", true, &["endid", "end", "to", "node2"]),
                FieldSpec::new("length", false, &["len"]),
                FieldSpec::new("diameter", false, &["diam"]),
                FieldSpec::new("roughness", false, &["c", "hw_c"]),
                FieldSpec::new("material", false, &["mat"]),
                FieldSpec::new(
                    "age_or_year",
                    false,
                    &["age", "year", "install_year", "installation_year"],
                ),
                FieldSpec::new("status", false, &[]),
            ],
            EntityKind::Asset => vec![
                FieldSpec::new("id", true, &["assetid", "asset_id"]),
                FieldSpec::new("kind", true, &["type", "asset_type", "assettype"]),
                FieldSpec::new("x", true, &["xcoord", "x_coord", "lon", "longitude", "easting"]),
                FieldSpec::new("y", true, &["ycoord", "y_coord", "lat", "latitude", "northing"]),
                FieldSpec::new("status", false, &[]),
            ],
            EntityKind::Leak => vec![
                FieldSpec::new("id", false, &["leakid", "leak_id"]),
                FieldSpec::new("x", true, &["xcoord", "x_coord", "lon", "longitude", "easting"]),
                FieldSpec::new("y", true, &["ycoord", "y_coord", "lat", "latitude", "northing"]),
                FieldSpec::new("year", true, &["leak_year"]),
            ],
        };
        Self { kind, fields }
    }

    /// Accept an extra header spelling for a canonical field.
    ///
    /// Unknown canonical names are ignored so a deployment file cannot
    /// invent fields the normalizer never reads.
    pub fn with_alias(mut self, canonical: &str, alias: impl Into<String>) -> Self {
        self.add_alias(canonical, alias);
        self
    }

    pub fn add_alias(&mut self, canonical: &str, alias: impl Into<String>) -> bool {
        let key = header_key(canonical);
        match self.fields.iter_mut().find(|f| f.name == key) {
            Some(field) => {
                field.aliases.push(alias.into());
                true
            }
            None => false,
        }
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Map canonical field names to header positions.
    ///
    /// The first header matching a field wins.
    pub fn resolve(&self, headers: &[String]) -> HashMap<&'static str, usize> {
        let mut columns = HashMap::new();
        for field in &self.fields {
            if let Some(pos) = headers.iter().position(|h| field.matches(h)) {
                columns.insert(field.name, pos);
            }
        }
        columns
    }

    /// Required canonical fields that no header provides.
    pub fn missing(&self, headers: &[String]) -> Vec<String> {
        let columns = self.resolve(headers);
        self.required()
            .filter(|f| !columns.contains_key(f.name))
            .map(|f| f.name.to_string())
            .collect()
    }
}

/// Schemas for every entity kind of one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSet {
    pub node: EntitySchema,
    pub pipe: EntitySchema,
    pub asset: EntitySchema,
    pub leak: EntitySchema,
}

impl Default for SchemaSet {
    fn default() -> Self {
        Self {
            node: EntitySchema::for_kind(EntityKind::Node),
            pipe: EntitySchema::for_kind(EntityKind::Pipe),
            asset: EntitySchema::for_kind(EntityKind::Asset),
            leak: EntitySchema::for_kind(EntityKind::Leak),
        }
    }
}

impl SchemaSet {
    pub fn get(&self, kind: EntityKind) -> &EntitySchema {
        match kind {
            EntityKind::Node => &self.node,
            EntityKind::Pipe => &self.pipe,
            EntityKind::Asset => &self.asset,
            EntityKind::Leak => &self.leak,
        }
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> &mut EntitySchema {
        match kind {
            EntityKind::Node => &mut self.node,
            EntityKind::Pipe => &mut self.pipe,
            EntityKind::Asset => &mut self.asset,
            EntityKind::Leak => &mut self.leak,
        }
    }
}
