//! Input loaders.
//!
//! Each input format implements `NetworkSource`; everything downstream of
//! `load()` only sees `RawTable`s. Which buffer feeds which entity role is
//! always stated by the caller, never guessed from file names.

mod native;
mod tabular;
mod vector;

pub use native::SolverNativeSource;
pub use tabular::TabularSource;
pub use vector::VectorFileSource;

use crate::error::RecordsResult;
use crate::raw::RawTable;

/// Raw tables for every entity role of one build request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTables {
    pub nodes: RawTable,
    pub pipes: RawTable,
    pub assets: Option<RawTable>,
    pub leaks: Option<RawTable>,
}

/// Something that yields node and pipe tables (and optionally assets and leaks).
pub trait NetworkSource {
    /// Short format label used in logs.
    fn format(&self) -> &'static str;

    fn load(&self) -> RecordsResult<SourceTables>;
}

/// Uploaded buffers, one per entity role.
#[derive(Debug, Clone, Default)]
pub struct RoleBuffers {
    pub nodes: Vec<u8>,
    pub pipes: Vec<u8>,
    pub assets: Option<Vec<u8>>,
    pub leaks: Option<Vec<u8>>,
}
