//! Record loading and schema errors.

use crate::schema::EntityKind;
use std::fmt;

pub type RecordsResult<T> = Result<T, RecordsError>;

/// One offending value inside an otherwise well-formed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Entity id, or `row N` (1-based, header excluded) when the id itself is unusable.
    pub entity_id: String,
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} = '{}' ({})",
            self.entity_id, self.field, self.value, self.reason
        )
    }
}

/// Schema failure for one entity kind.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{kind} table is missing required fields [{}]; found [{}]", .missing.join(", "), .found.join(", "))]
    MissingFields {
        kind: EntityKind,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("{kind} table has {} invalid value(s): {}", .issues.len(), join_issues(.issues))]
    InvalidValues {
        kind: EntityKind,
        issues: Vec<FieldIssue>,
    },
}

impl SchemaError {
    pub fn kind(&self) -> EntityKind {
        match self {
            SchemaError::MissingFields { kind, .. } | SchemaError::InvalidValues { kind, .. } => {
                *kind
            }
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// All schema failures of one normalization pass, at most one per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaErrors(pub Vec<SchemaError>);

impl SchemaErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }

    pub fn for_kind(&self, kind: EntityKind) -> Option<&SchemaError> {
        self.0.iter().find(|e| e.kind() == kind)
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

#[derive(thiserror::Error, Debug)]
pub enum RecordsError {
    #[error("Schema errors:\n{0}")]
    Schema(#[from] SchemaErrors),

    #[error("CSV error in {role} input: {message}")]
    Csv { role: EntityKind, message: String },

    #[error("GeoJSON error in {role} input: {message}")]
    GeoJson { role: EntityKind, message: String },

    #[error("INP error at line {line}: {message}")]
    Inp { line: usize, message: String },

    #[error("Unsupported reprojection from {from} to {to}")]
    UnsupportedCrs { from: String, to: String },

    #[error("Input is not valid UTF-8: {role}")]
    Encoding { role: EntityKind },
}
