//! Raw, untyped tables as produced by the input loaders.

use wn_core::Coord;

/// One input row, values aligned with the owning table's headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub values: Vec<String>,
    /// Multi-vertex geometry carried by vector inputs (pipes only).
    pub geometry: Option<Vec<Coord>>,
}

/// Header + rows. Headers are kept exactly as supplied; matching against
/// schema fields happens during normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor used by loaders and tests.
    pub fn from_rows<H, R, V>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = V>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut table = Self::new(headers.into_iter().map(Into::into).collect());
        for row in rows {
            table.push(row.into_iter().map(Into::into).collect(), None);
        }
        table
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push(&mut self, mut values: Vec<String>, geometry: Option<Vec<Coord>>) {
        values.resize(self.headers.len(), String::new());
        self.rows.push(RawRow { values, geometry });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
