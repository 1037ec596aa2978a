//! Column directory
//!
//! Header plus ordered column records: the single in-memory source of truth
//! for a table's layout.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use super::{Column, FileType, Header, TableFlags, COLUMN_SIZE, HEADER_SIZE, TERMINATOR};
use crate::error::{DbfError, Result};
use crate::io::BlockFile;
use crate::nullflags;

/// Header, user columns and the optional null-flag column
#[derive(Debug, Clone)]
pub struct Directory {
    pub header: Header,
    pub columns: Vec<Column>,
    pub null_flags: Option<Column>,
}

impl Directory {
    /// Build the directory of a new, empty table
    ///
    /// Column positions are assigned in order starting after the delete flag,
    /// and a null-flag column is synthesized when any column needs one.
    pub fn new(file_type: FileType, mut columns: Vec<Column>, code_page: u8) -> Result<Self> {
        if columns.is_empty() {
            return Err(DbfError::InvalidRequest("a table needs at least one column".to_string()));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name.eq_ignore_ascii_case(&column.name)) {
                return Err(DbfError::InvalidRequest(format!("duplicate column {}", column.name)));
            }
        }

        let null_flags = if nullflags::needs_null_flags(&columns) {
            let bytes = nullflags::byte_length(&columns).max(1);
            let length = u8::try_from(bytes).map_err(|_| {
                DbfError::InvalidRequest("too many variable columns".to_string())
            })?;
            Some(Column::null_flags(length))
        } else {
            None
        };

        let mut position = 1u32;
        for column in columns.iter_mut() {
            column.position = position;
            position += column.length as u32;
        }
        let mut null_flags = null_flags;
        if let Some(nf) = null_flags.as_mut() {
            nf.position = position;
            position += nf.length as u32;
        }

        let row_length = u16::try_from(position)
            .map_err(|_| DbfError::InvalidRequest(format!("row length {} exceeds 65535", position)))?;

        let record_count = columns.len() + null_flags.is_some() as usize;
        let first_row = HEADER_SIZE + COLUMN_SIZE * record_count + 1;
        let first_row = u16::try_from(first_row)
            .map_err(|_| DbfError::InvalidRequest("too many columns".to_string()))?;

        let mut flags = TableFlags::default();
        flags.set(TableFlags::MEMO, columns.iter().any(|c| c.data_type.is_memo()));

        let header = Header {
            file_type,
            year: 0,
            month: 1,
            day: 1,
            row_count: 0,
            first_row,
            row_length,
            flags,
            code_page,
            reserved: [0; 16],
            reserved_tail: [0; 2],
        };

        Ok(Self {
            header,
            columns,
            null_flags,
        })
    }

    /// Read header and column directory from the start of `file`
    pub fn read(file: &BlockFile) -> Result<Self> {
        let mut raw = [0u8; HEADER_SIZE];
        file.read_at(0, &mut raw, "header read")?;
        let header = Header::parse(&raw)?;

        if (header.first_row as usize) <= HEADER_SIZE {
            return Err(DbfError::MalformedDirectory(format!(
                "first row offset {} leaves no room for a column directory",
                header.first_row
            )));
        }

        let region_len = header.first_row as usize - HEADER_SIZE;
        let region = file.read_vec(HEADER_SIZE as u64, region_len, "column directory read")?;

        let mut columns = Vec::new();
        let mut null_flags = None;
        let mut terminated = false;

        for record in region.chunks(COLUMN_SIZE) {
            if record[0] == TERMINATOR {
                terminated = true;
                break;
            }
            if record.len() < COLUMN_SIZE {
                break;
            }

            let column = Column::parse(record)?;
            trace!(name = %column.name, kind = %column.data_type, length = column.length, "column record");
            if column.is_null_flags() {
                null_flags = Some(column);
            } else {
                columns.push(column);
            }
        }

        if !terminated {
            return Err(DbfError::MalformedDirectory(
                "column directory has no 0x0D terminator".to_string(),
            ));
        }
        if columns.is_empty() {
            return Err(DbfError::MalformedDirectory("table declares no columns".to_string()));
        }

        let mut directory = Self {
            header,
            columns,
            null_flags,
        };
        directory.assign_positions()?;
        Ok(directory)
    }

    /// Recompute column positions from declared order and check them
    /// against the header's row length
    fn assign_positions(&mut self) -> Result<()> {
        let mut position = 1u32;
        for column in self.columns.iter_mut() {
            column.position = position;
            position += column.length as u32;
        }
        if let Some(nf) = self.null_flags.as_mut() {
            nf.position = position;
            position += nf.length as u32;
        }

        if position as usize != self.header.row_length as usize {
            return Err(DbfError::RowLengthMismatch {
                declared: self.header.row_length,
                computed: position as usize,
            });
        }
        Ok(())
    }

    /// Serialize header, records, terminator and (optionally) the zero
    /// padding up to the first row
    pub fn encode(&self, pad: bool) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.header.first_row as usize);
        buf.put_slice(&self.header.encode());
        for column in &self.columns {
            buf.put_slice(&column.encode());
        }
        if let Some(nf) = &self.null_flags {
            buf.put_slice(&nf.encode());
        }
        buf.put_u8(TERMINATOR);

        if pad {
            let target = self.header.first_row as usize;
            if buf.len() < target {
                let fill = target - buf.len();
                buf.put_bytes(0, fill);
            }
        }
        buf
    }

    /// Persist the directory at offset 0
    ///
    /// Padding is written only for new tables so an existing backlink area
    /// between the terminator and the first row is preserved.
    pub fn write(&self, file: &BlockFile, pad: bool) -> Result<()> {
        file.write_at(0, &self.encode(pad))
    }

    /// Index and definition of a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_length(&self) -> usize {
        self.header.row_length as usize
    }
}
