//! Decoding: raw column bytes to values

use std::str;

use bytes::Buf;
use chrono::NaiveDate;

use super::julian;
use super::{ColumnType, Value};
use crate::encoding::TextConverter;
use crate::error::{DbfError, ParseError, Result};
use crate::header::Column;
use crate::memo::{MemoFile, MemoKind};
use crate::nullflags::VarFlags;

/// Decodes column spans of one table
pub struct Decoder<'a> {
    converter: &'a dyn TextConverter,
    memo: Option<&'a MemoFile>,
}

impl<'a> Decoder<'a> {
    pub fn new(converter: &'a dyn TextConverter, memo: Option<&'a MemoFile>) -> Self {
        Self { converter, memo }
    }

    /// Decode the span of `column`. `flags` is only consulted for
    /// Varchar/Varbinary columns.
    pub fn decode(&self, column: &Column, raw: &[u8], flags: VarFlags) -> Result<Value> {
        let width = column.length as usize;
        if raw.len() < width {
            return Err(DbfError::Incomplete {
                operation: "column read",
                expected: width,
                actual: raw.len(),
            });
        }
        let raw = &raw[..width];

        let minimum = match column.data_type {
            ColumnType::Integer => 4,
            ColumnType::Double | ColumnType::Currency | ColumnType::DateTime => 8,
            _ => 1,
        };
        if width < minimum {
            return Err(decode_error(
                column,
                raw,
                format!("{} column is {} bytes wide, needs {}", column.data_type, width, minimum),
            ));
        }

        match column.data_type {
            ColumnType::Character => {
                if column.flags.is_binary() {
                    Ok(Value::Bytes(raw.to_vec()))
                } else {
                    Ok(Value::Text(self.converter.decode(raw)?))
                }
            }
            ColumnType::Varchar | ColumnType::Varbinary => self.decode_variable(column, raw, flags),
            ColumnType::Integer => Ok(Value::Integer((&raw[..4]).get_i32_le())),
            ColumnType::Double => Ok(Value::Float((&raw[..8]).get_f64_le())),
            ColumnType::Currency => {
                let scaled = (&raw[..8]).get_i64_le();
                Ok(Value::Float(scaled as f64 / 10_000.0))
            }
            ColumnType::Float => decode_float(column, raw),
            ColumnType::Numeric if column.decimals > 0 => decode_float(column, raw),
            ColumnType::Numeric => decode_integer_text(column, raw),
            ColumnType::Logical => Ok(Value::Boolean(raw[0] == b'T')),
            ColumnType::Date => decode_date(column, raw),
            ColumnType::DateTime => decode_datetime(column, raw),
            ColumnType::Memo => self.decode_memo(column, raw),
            ColumnType::Blob | ColumnType::General | ColumnType::Picture | ColumnType::NullFlags => {
                Ok(Value::Bytes(raw.to_vec()))
            }
        }
    }

    fn decode_variable(&self, column: &Column, raw: &[u8], flags: VarFlags) -> Result<Value> {
        if flags.null {
            return Ok(Value::Null);
        }

        let payload = if flags.short {
            let len = raw[raw.len() - 1] as usize;
            if len >= raw.len() {
                return Err(decode_error(
                    column,
                    raw,
                    format!("stored length {} exceeds column width {}", len, raw.len()),
                ));
            }
            &raw[..len]
        } else {
            raw
        };

        match column.data_type {
            ColumnType::Varbinary => Ok(Value::Bytes(payload.to_vec())),
            _ => Ok(Value::Text(self.converter.decode(payload)?)),
        }
    }

    fn decode_memo(&self, column: &Column, raw: &[u8]) -> Result<Value> {
        let block = memo_address(column, raw)?;
        if block == 0 {
            return Ok(empty_memo(column));
        }

        let memo = self.memo.ok_or_else(|| {
            DbfError::InvalidRequest(format!("column {} needs a memo file", column.name))
        })?;
        let content = memo.read(block)?;
        if content.data.is_empty() {
            return Ok(empty_memo(column));
        }

        match content.kind {
            MemoKind::Text if !column.flags.is_binary() => {
                Ok(Value::Text(self.converter.decode(&content.data)?))
            }
            _ => Ok(Value::Bytes(content.data)),
        }
    }
}

/// Block address stored in a memo column: 4-byte LE integer (Visual
/// FoxPro) or right-justified ASCII digits (10-byte dBase columns)
pub fn memo_address(column: &Column, raw: &[u8]) -> Result<u32> {
    if raw.len() == 4 {
        return Ok((&raw[..4]).get_u32_le());
    }
    let text = ascii_field(column, raw)?;
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<u32>().map_err(|e| decode_error(column, raw, e))
}

fn empty_memo(column: &Column) -> Value {
    if column.flags.is_binary() {
        Value::Bytes(Vec::new())
    } else {
        Value::Text(String::new())
    }
}

fn decode_float(column: &Column, raw: &[u8]) -> Result<Value> {
    let text = ascii_field(column, raw)?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|e| decode_error(column, raw, e))
}

fn decode_integer_text(column: &Column, raw: &[u8]) -> Result<Value> {
    let text = ascii_field(column, raw)?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    text.parse::<i64>()
        .map(Value::BigInt)
        .map_err(|e| decode_error(column, raw, e))
}

fn decode_date(column: &Column, raw: &[u8]) -> Result<Value> {
    let text = ascii_field(column, raw)?;
    if text.is_empty() || text.bytes().all(|b| b == b'0') {
        return Ok(Value::Null);
    }
    NaiveDate::parse_from_str(text, "%Y%m%d")
        .map(Value::Date)
        .map_err(|e| decode_error(column, raw, e))
}

fn decode_datetime(column: &Column, raw: &[u8]) -> Result<Value> {
    let mut buf = &raw[..8];
    let day = buf.get_u32_le();
    let millis = buf.get_u32_le();
    if day == 0 {
        return Ok(Value::Null);
    }
    julian::parts_to_datetime(day as i64, millis)
        .map(Value::DateTime)
        .ok_or_else(|| {
            decode_error(
                column,
                raw,
                format!("julian day {} / {} ms is not a valid timestamp", day, millis),
            )
        })
}

/// ASCII sub-field with space and NUL padding stripped
fn ascii_field<'r>(column: &Column, raw: &'r [u8]) -> Result<&'r str> {
    let text = str::from_utf8(raw).map_err(|e| decode_error(column, raw, e))?;
    Ok(text.trim_matches(|c: char| c == ' ' || c == '\0'))
}

pub(crate) fn decode_error(column: &Column, raw: &[u8], source: impl Into<ParseError>) -> DbfError {
    DbfError::Decode {
        column: column.name.clone(),
        raw: raw.to_vec(),
        source: source.into(),
    }
}
