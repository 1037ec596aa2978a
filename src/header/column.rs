//! Column directory records

use bytes::{Buf, BufMut, BytesMut};

use super::{COLUMN_SIZE, MAX_NAME_LENGTH, NULL_FLAG_COLUMN};
use crate::codec::ColumnType;
use crate::error::{DbfError, Result};

/// Column flags (record byte 18)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnFlags(pub u8);

impl ColumnFlags {
    pub const HIDDEN: u8 = 0x01;
    pub const NULLABLE: u8 = 0x02;
    pub const BINARY: u8 = 0x04;
    pub const AUTOINCREMENT: u8 = 0x0C;

    pub fn is_hidden(self) -> bool {
        self.0 & Self::HIDDEN != 0
    }

    pub fn is_nullable(self) -> bool {
        self.0 & Self::NULLABLE != 0
    }

    pub fn is_binary(self) -> bool {
        self.0 & Self::BINARY != 0 && !self.is_autoincrement()
    }

    pub fn is_autoincrement(self) -> bool {
        self.0 & Self::AUTOINCREMENT == Self::AUTOINCREMENT
    }
}

/// One column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    /// Byte offset within the row; the delete flag occupies offset 0
    pub position: u32,
    pub length: u8,
    pub decimals: u8,
    pub flags: ColumnFlags,
    /// Next autoincrement value
    pub next: u32,
    /// Autoincrement step
    pub step: u16,
}

impl Column {
    /// Define a column. Fixed-width types ignore `length` and use their
    /// canonical width.
    pub fn new(name: &str, data_type: ColumnType, length: u8, decimals: u8) -> Result<Self> {
        if name.is_empty() || name.len() > MAX_NAME_LENGTH || !name.is_ascii() {
            return Err(DbfError::InvalidRequest(format!(
                "column name {:?} must be 1..={} ASCII characters",
                name, MAX_NAME_LENGTH
            )));
        }
        if data_type == ColumnType::NullFlags {
            return Err(DbfError::InvalidRequest(format!(
                "{} columns are managed internally",
                NULL_FLAG_COLUMN
            )));
        }

        let length = data_type.fixed_length().unwrap_or(length);
        if length == 0 {
            return Err(DbfError::InvalidRequest(format!("column {} needs a length", name)));
        }
        if data_type.is_variable() && length < 2 {
            return Err(DbfError::InvalidRequest(format!(
                "variable column {} needs at least 2 bytes",
                name
            )));
        }
        let decimals = if data_type.has_decimals() { decimals } else { 0 };

        Ok(Self {
            name: name.to_string(),
            data_type,
            position: 0,
            length,
            decimals,
            flags: ColumnFlags::default(),
            next: 0,
            step: 0,
        })
    }

    pub fn nullable(mut self) -> Self {
        self.flags.0 |= ColumnFlags::NULLABLE;
        self
    }

    pub fn binary(mut self) -> Self {
        self.flags.0 |= ColumnFlags::BINARY;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.flags.0 |= ColumnFlags::HIDDEN;
        self
    }

    /// Mark as autoincrement starting at `next`, advancing by `step`
    pub fn autoincrement(mut self, next: u32, step: u16) -> Self {
        self.flags.0 |= ColumnFlags::AUTOINCREMENT;
        self.next = next;
        self.step = step;
        self
    }

    /// Synthetic null-flag column of `length` bytes
    pub(crate) fn null_flags(length: u8) -> Self {
        Self {
            name: NULL_FLAG_COLUMN.to_string(),
            data_type: ColumnType::NullFlags,
            position: 0,
            length,
            decimals: 0,
            flags: ColumnFlags(ColumnFlags::HIDDEN | ColumnFlags::BINARY),
            next: 0,
            step: 0,
        }
    }

    pub fn is_null_flags(&self) -> bool {
        self.data_type == ColumnType::NullFlags || self.name == NULL_FLAG_COLUMN
    }

    /// Parse one 32-byte directory record
    pub fn parse(record: &[u8]) -> Result<Self> {
        if record.len() < COLUMN_SIZE {
            return Err(DbfError::MalformedDirectory(format!(
                "column record truncated to {} bytes",
                record.len()
            )));
        }

        let name_len = record[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&record[..name_len]).trim_end().to_string();

        let mut buf = &record[11..COLUMN_SIZE];
        let tag = buf.get_u8();
        let position = buf.get_u32_le();
        let length = buf.get_u8();
        let decimals = buf.get_u8();
        let flags = ColumnFlags(buf.get_u8());
        let next = buf.get_u32_le();
        let step = buf.get_u16_le();

        let data_type = if name == NULL_FLAG_COLUMN {
            ColumnType::NullFlags
        } else {
            ColumnType::from_tag(tag)?
        };

        Ok(Self {
            name,
            data_type,
            position,
            length,
            decimals,
            flags,
            next,
            step,
        })
    }

    /// Serialize into a 32-byte directory record
    pub fn encode(&self) -> [u8; COLUMN_SIZE] {
        let mut buf = BytesMut::with_capacity(COLUMN_SIZE);
        let name = self.name.as_bytes();
        let name_len = name.len().min(11);
        buf.put_slice(&name[..name_len]);
        buf.put_bytes(0, 11 - name_len);
        buf.put_u8(self.data_type.tag());
        buf.put_u32_le(self.position);
        buf.put_u8(self.length);
        buf.put_u8(self.decimals);
        buf.put_u8(self.flags.0);
        buf.put_u32_le(self.next);
        buf.put_u16_le(self.step);
        buf.put_bytes(0, 7);

        let mut out = [0u8; COLUMN_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// Byte range of this column within a row image
    pub fn span(&self) -> std::ops::Range<usize> {
        let start = self.position as usize;
        start..start + self.length as usize
    }
}
