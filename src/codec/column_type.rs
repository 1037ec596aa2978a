//! Column type tags

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DbfError, Result};

/// Declared type of a column (record byte 11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Character,
    Currency,
    Double,
    Date,
    DateTime,
    Float,
    Numeric,
    Integer,
    Logical,
    Memo,
    Varchar,
    Varbinary,
    Blob,
    General,
    Picture,
    /// Synthetic `_NullFlags` bitmap column
    NullFlags,
}

impl ColumnType {
    pub fn tag(self) -> u8 {
        match self {
            ColumnType::Character => b'C',
            ColumnType::Currency => b'Y',
            ColumnType::Double => b'B',
            ColumnType::Date => b'D',
            ColumnType::DateTime => b'T',
            ColumnType::Float => b'F',
            ColumnType::Numeric => b'N',
            ColumnType::Integer => b'I',
            ColumnType::Logical => b'L',
            ColumnType::Memo => b'M',
            ColumnType::Varchar => b'V',
            ColumnType::Varbinary => b'Q',
            ColumnType::Blob => b'W',
            ColumnType::General => b'G',
            ColumnType::Picture => b'P',
            ColumnType::NullFlags => b'0',
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        let kind = match tag {
            b'C' => ColumnType::Character,
            b'Y' => ColumnType::Currency,
            b'B' => ColumnType::Double,
            b'D' => ColumnType::Date,
            b'T' => ColumnType::DateTime,
            b'F' => ColumnType::Float,
            b'N' => ColumnType::Numeric,
            b'I' => ColumnType::Integer,
            b'L' => ColumnType::Logical,
            b'M' => ColumnType::Memo,
            b'V' => ColumnType::Varchar,
            b'Q' => ColumnType::Varbinary,
            b'W' => ColumnType::Blob,
            b'G' => ColumnType::General,
            b'P' => ColumnType::Picture,
            b'0' => ColumnType::NullFlags,
            other => return Err(DbfError::UnknownDataType(other)),
        };
        Ok(kind)
    }

    /// Width forced by the type, if any
    pub fn fixed_length(self) -> Option<u8> {
        match self {
            ColumnType::Integer => Some(4),
            ColumnType::Double | ColumnType::Currency => Some(8),
            ColumnType::Date | ColumnType::DateTime => Some(8),
            ColumnType::Logical => Some(1),
            ColumnType::Memo => Some(4),
            _ => None,
        }
    }

    /// Varchar/Varbinary: actual length lives in the null-flag bitmap
    pub fn is_variable(self) -> bool {
        matches!(self, ColumnType::Varchar | ColumnType::Varbinary)
    }

    /// Column span holds a memo block address rather than content
    pub fn is_memo(self) -> bool {
        matches!(self, ColumnType::Memo)
    }

    pub fn has_decimals(self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Float | ColumnType::Double)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Character => "Character",
            ColumnType::Currency => "Currency",
            ColumnType::Double => "Double",
            ColumnType::Date => "Date",
            ColumnType::DateTime => "DateTime",
            ColumnType::Float => "Float",
            ColumnType::Numeric => "Numeric",
            ColumnType::Integer => "Integer",
            ColumnType::Logical => "Logical",
            ColumnType::Memo => "Memo",
            ColumnType::Varchar => "Varchar",
            ColumnType::Varbinary => "Varbinary",
            ColumnType::Blob => "Blob",
            ColumnType::General => "General",
            ColumnType::Picture => "Picture",
            ColumnType::NullFlags => "NullFlags",
        }
    }
}

impl TryFrom<u8> for ColumnType {
    type Error = DbfError;

    fn try_from(tag: u8) -> Result<Self> {
        Self::from_tag(tag)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
