//! Column search
//!
//! Scans one column's span in every row; only matching rows are decoded.

use tracing::debug;

use super::handle::Table;
use super::row::Row;
use crate::codec::Value;
use crate::error::{DbfError, Result};

impl Table {
    /// Rows whose `column` matches `value`
    ///
    /// With `exact`, the stored bytes must equal the value encoded at full
    /// column width (padding included). Otherwise the stored bytes only
    /// have to contain the unpadded encoding. Memo columns cannot be
    /// searched. Deleted rows are included.
    pub fn search(&self, column: &str, value: &Value, exact: bool) -> Result<Vec<Row>> {
        let (column, header) = {
            let directory = self.directory.read();
            let (_, column) = self.resolve_column(&directory, column)?;
            (column.clone(), directory.header.clone())
        };

        if column.data_type.is_memo() {
            return Err(DbfError::NotSearchable(column.name));
        }

        let encoder = self.encoder();
        let needle = if exact {
            encoder.encode(&column, value, 0)?.bytes
        } else {
            encoder.payload(&column, value)?
        };

        let mut positions = Vec::new();
        for position in 0..header.row_count {
            let stored = self.data.read_vec(
                header.row_offset(position) + column.position as u64,
                column.length as usize,
                "search read",
            )?;
            let hit = if exact {
                stored == needle
            } else {
                contains(&stored, &needle)
            };
            if hit {
                positions.push(position);
            }
        }

        debug!(column = %column.name, exact, hits = positions.len(), "search finished");
        positions.into_iter().map(|p| self.row_at(p)).collect()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
