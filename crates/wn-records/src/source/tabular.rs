//! CSV tables, one buffer per entity role.

use super::{NetworkSource, RoleBuffers, SourceTables};
use crate::error::{RecordsError, RecordsResult};
use crate::raw::RawTable;
use crate::schema::EntityKind;

#[derive(Debug, Clone)]
pub struct TabularSource {
    pub buffers: RoleBuffers,
}

impl TabularSource {
    pub fn new(buffers: RoleBuffers) -> Self {
        Self { buffers }
    }
}

/// Read a CSV buffer into a raw table.
///
/// Rows may be ragged; short rows are padded with blanks.
pub fn read_csv(bytes: &[u8], role: EntityKind) -> RecordsResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| RecordsError::Csv {
            role,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::new(headers);
    for result in rdr.records() {
        let record = result.map_err(|e| RecordsError::Csv {
            role,
            message: e.to_string(),
        })?;
        table.push(record.iter().map(|v| v.to_string()).collect(), None);
    }
    Ok(table)
}

impl NetworkSource for TabularSource {
    fn format(&self) -> &'static str {
        "tabular"
    }

    fn load(&self) -> RecordsResult<SourceTables> {
        let b = &self.buffers;
        Ok(SourceTables {
            nodes: read_csv(&b.nodes, EntityKind::Node)?,
            pipes: read_csv(&b.pipes, EntityKind::Pipe)?,
            assets: b
                .assets
                .as_deref()
                .map(|bytes| read_csv(bytes, EntityKind::Asset))
                .transpose()?,
            leaks: b
                .leaks
                .as_deref()
                .map(|bytes| read_csv(bytes, EntityKind::Leak))
                .transpose()?,
        })
    }
}
