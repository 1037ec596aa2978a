//! Table header
//!
//! The 32-byte little-endian record at offset 0.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use chrono::{Datelike, NaiveDate};

use super::HEADER_SIZE;
use crate::error::{DbfError, Result};

/// File-type tag (header byte 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileType(pub u8);

impl FileType {
    pub const FOXBASE: FileType = FileType(0x02);
    pub const FOXBASE_PLUS: FileType = FileType(0x03);
    pub const VISUAL_FOXPRO: FileType = FileType(0x30);
    pub const VISUAL_FOXPRO_AUTOINCREMENT: FileType = FileType(0x31);
    pub const VISUAL_FOXPRO_VARCHAR: FileType = FileType(0x32);
    pub const DBASE_IV_SQL_TABLE: FileType = FileType(0x43);
    pub const DBASE_IV_SQL_SYSTEM: FileType = FileType(0x63);
    pub const FOXBASE_PLUS_MEMO: FileType = FileType(0x83);
    pub const DBASE_IV_MEMO: FileType = FileType(0x8B);
    pub const DBASE_IV_SQL_MEMO: FileType = FileType(0xCB);
    pub const FOXPRO_2_MEMO: FileType = FileType(0xF5);
    pub const FOXBASE_2: FileType = FileType(0xFB);

    /// Name of a recognized tag
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0x02 => "FoxBASE",
            0x03 => "FoxBASE+/dBase III plus",
            0x30 => "Visual FoxPro",
            0x31 => "Visual FoxPro (autoincrement)",
            0x32 => "Visual FoxPro (varchar/varbinary)",
            0x43 => "dBase IV SQL table",
            0x63 => "dBase IV SQL system",
            0x83 => "FoxBASE+/dBase III plus with memo",
            0x8B => "dBase IV with memo",
            0xCB => "dBase IV SQL table with memo",
            0xF5 => "FoxPro 2.x with memo",
            0xFB => "FoxBASE",
            _ => return None,
        };
        Some(name)
    }

    /// Types whose layout this crate round-trips exactly
    pub fn is_tested(self) -> bool {
        matches!(self.0, 0x30 | 0x31 | 0x32)
    }

    /// Reject unknown or untested tags unless `untested` is set
    pub fn validate(self, untested: bool) -> Result<()> {
        if self.is_tested() || untested {
            return Ok(());
        }
        match self.name() {
            Some(name) => Err(DbfError::UntestedFileType(format!("0x{:02x} ({})", self.0, name))),
            None => Err(DbfError::InvalidFileType(self.0)),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:02x})", name, self.0),
            None => write!(f, "unknown (0x{:02x})", self.0),
        }
    }
}

/// Table flags (header byte 28)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableFlags(pub u8);

impl TableFlags {
    pub const STRUCTURAL_INDEX: u8 = 0x01;
    pub const MEMO: u8 = 0x02;
    pub const CATALOG: u8 = 0x04;

    pub fn has_memo(self) -> bool {
        self.0 & Self::MEMO != 0
    }

    pub fn is_catalog(self) -> bool {
        self.0 & Self::CATALOG != 0
    }

    pub fn has_structural_index(self) -> bool {
        self.0 & Self::STRUCTURAL_INDEX != 0
    }

    pub fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// In-memory copy of the table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub file_type: FileType,
    /// Last-modified year as an offset from the configured century
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub row_count: u32,
    /// Byte offset of row 0
    pub first_row: u16,
    /// Bytes per row, delete flag included
    pub row_length: u16,
    pub flags: TableFlags,
    pub code_page: u8,
    /// Bytes 12..28 (transaction/encryption/multi-user area), kept verbatim
    pub reserved: [u8; 16],
    /// Bytes 30..32
    pub reserved_tail: [u8; 2],
}

impl Header {
    /// Parse the fixed 32-byte header
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(DbfError::Incomplete {
                operation: "header read",
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        let file_type = FileType(buf.get_u8());
        let year = buf.get_u8();
        let month = buf.get_u8();
        let day = buf.get_u8();
        let row_count = buf.get_u32_le();
        let first_row = buf.get_u16_le();
        let row_length = buf.get_u16_le();
        let mut reserved = [0u8; 16];
        buf.copy_to_slice(&mut reserved);
        let flags = TableFlags(buf.get_u8());
        let code_page = buf.get_u8();
        let mut reserved_tail = [0u8; 2];
        buf.copy_to_slice(&mut reserved_tail);

        Ok(Self {
            file_type,
            year,
            month,
            day,
            row_count,
            first_row,
            row_length,
            flags,
            code_page,
            reserved,
            reserved_tail,
        })
    }

    /// Serialize back into the on-disk layout
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.put_u8(self.file_type.0);
        buf.put_u8(self.year);
        buf.put_u8(self.month);
        buf.put_u8(self.day);
        buf.put_u32_le(self.row_count);
        buf.put_u16_le(self.first_row);
        buf.put_u16_le(self.row_length);
        buf.put_slice(&self.reserved);
        buf.put_u8(self.flags.0);
        buf.put_u8(self.code_page);
        buf.put_slice(&self.reserved_tail);

        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// Last-modified date, if the stored fields form a valid date
    pub fn modified(&self, year_base: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year_base + self.year as i32, self.month as u32, self.day as u32)
    }

    /// Stamp the last-modified fields with `date`
    pub fn touch(&mut self, date: NaiveDate, year_base: i32) {
        self.year = (date.year() - year_base).clamp(0, u8::MAX as i32) as u8;
        self.month = date.month() as u8;
        self.day = date.day() as u8;
    }

    /// Expected total file size, EOF marker included
    pub fn file_size(&self) -> u64 {
        self.first_row as u64 + self.row_count as u64 * self.row_length as u64 + 1
    }

    /// Byte offset of the row at `position`
    pub fn row_offset(&self, position: u32) -> u64 {
        self.first_row as u64 + position as u64 * self.row_length as u64
    }
}
