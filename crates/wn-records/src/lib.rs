//! wn-records: raw asset tables, entity schemas and the schema normalizer.
//!
//! Provides:
//! - `RawTable`: header + string rows, the only shape loaders produce
//! - `NetworkSource` loaders for tabular (CSV), vector (GeoJSON) and
//!   solver-native (INP) inputs
//! - the normalizer turning raw tables into typed node/pipe/asset/leak records
//! - the coordinate reprojection collaborator

pub mod crs;
pub mod error;
pub mod normalize;
pub mod raw;
pub mod record;
pub mod schema;
pub mod source;

pub use crs::{Crs, Reprojector, StandardReprojector};
pub use error::{FieldIssue, RecordsError, RecordsResult, SchemaError, SchemaErrors};
pub use normalize::{
    NormalizeOptions, NormalizedInputs, normalize_all, normalize_assets, normalize_leaks,
    normalize_nodes, normalize_pipes,
};
pub use raw::{RawRow, RawTable};
pub use record::*;
pub use schema::{EntityKind, EntitySchema, FieldSpec, SchemaSet};
pub use source::{
    NetworkSource, RoleBuffers, SolverNativeSource, SourceTables, TabularSource,
    VectorFileSource,
};
