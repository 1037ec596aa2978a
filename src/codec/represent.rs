//! Encoding: values to raw column bytes

use bytes::BufMut;
use chrono::NaiveTime;

use super::julian;
use super::{ColumnType, Value};
use crate::encoding::TextConverter;
use crate::error::{DbfError, Result};
use crate::header::Column;
use crate::memo::{MemoFile, MemoKind};
use crate::nullflags::VarFlags;

/// A column span ready to be copied into a row image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Exactly `column.length` bytes
    pub bytes: Vec<u8>,
    /// Bitmap flags for Varchar/Varbinary columns
    pub flags: VarFlags,
}

/// Encodes values for one table
pub struct Encoder<'a> {
    converter: &'a dyn TextConverter,
    memo: Option<&'a MemoFile>,
}

impl<'a> Encoder<'a> {
    pub fn new(converter: &'a dyn TextConverter, memo: Option<&'a MemoFile>) -> Self {
        Self { converter, memo }
    }

    /// Encode `value` into the full-width span of `column`
    ///
    /// Memo values are written to the memo file; `current_block` is the
    /// address the row holds today (0 for none) and is reused when the new
    /// content fits.
    pub fn encode(&self, column: &Column, value: &Value, current_block: u32) -> Result<Encoded> {
        check(column, value)?;
        let width = column.length as usize;

        let bytes = match column.data_type {
            ColumnType::Character => {
                let payload = self.payload(column, value)?;
                fit_left(column, payload, b' ')?
            }
            ColumnType::Varchar | ColumnType::Varbinary => {
                let payload = self.payload(column, value)?;
                return fit_variable(column, payload);
            }
            ColumnType::Float | ColumnType::Numeric => {
                let payload = self.payload(column, value)?;
                fit_right(column, payload)?
            }
            ColumnType::Date | ColumnType::Logical => {
                let payload = self.payload(column, value)?;
                fit_left(column, payload, b' ')?
            }
            ColumnType::Memo => {
                let block = self.store_memo(column, value, current_block)?;
                encode_memo_address(column, block)?
            }
            ColumnType::Integer
            | ColumnType::Double
            | ColumnType::Currency
            | ColumnType::DateTime
            | ColumnType::Blob
            | ColumnType::General
            | ColumnType::Picture
            | ColumnType::NullFlags => {
                let payload = self.payload(column, value)?;
                fit_left(column, payload, 0)?
            }
        };

        debug_assert_eq!(bytes.len(), width);
        Ok(Encoded {
            bytes,
            flags: VarFlags::default(),
        })
    }

    /// Stored representation without width padding
    ///
    /// This is what substring search looks for; for memo columns it is the
    /// content that would be written to the memo file.
    pub fn payload(&self, column: &Column, value: &Value) -> Result<Vec<u8>> {
        check(column, value)?;

        let payload = match (column.data_type, value) {
            (_, Value::Null) => null_payload(column),

            (ColumnType::Character | ColumnType::Varchar | ColumnType::Memo, Value::Text(s)) => {
                self.converter.encode(s)?
            }
            (_, Value::Bytes(b)) => b.clone(),

            (ColumnType::Integer, v) => {
                let n = v.as_i64().unwrap_or_default();
                let n = i32::try_from(n).map_err(|_| DbfError::ValueOutOfRange {
                    column: column.name.clone(),
                    data_type: column.data_type.to_string(),
                    value: n.to_string(),
                })?;
                n.to_le_bytes().to_vec()
            }
            (ColumnType::Double, v) => v.as_f64().unwrap_or_default().to_le_bytes().to_vec(),
            (ColumnType::Currency, v) => {
                let scaled = match v {
                    Value::Float(f) => (f * 10_000.0).round() as i64,
                    other => other.as_i64().unwrap_or_default().saturating_mul(10_000),
                };
                scaled.to_le_bytes().to_vec()
            }
            (ColumnType::Numeric, v) if column.decimals == 0 => match v {
                Value::Float(f) => format!("{:.0}", f).into_bytes(),
                other => other.as_i64().unwrap_or_default().to_string().into_bytes(),
            },
            (ColumnType::Float | ColumnType::Numeric, v) => {
                let f = v.as_f64().unwrap_or_default();
                format!("{:.*}", column.decimals as usize, f).into_bytes()
            }
            (ColumnType::Logical, Value::Boolean(b)) => vec![if *b { b'T' } else { b'F' }],
            (ColumnType::Date, v) => match v.as_date() {
                Some(d) => d.format("%Y%m%d").to_string().into_bytes(),
                None => null_payload(column),
            },
            (ColumnType::DateTime, Value::DateTime(dt)) => datetime_bytes(*dt),
            (ColumnType::DateTime, Value::Date(d)) => datetime_bytes(d.and_time(NaiveTime::MIN)),

            _ => return Err(mismatch(column, value)),
        };
        Ok(payload)
    }

    fn store_memo(&self, column: &Column, value: &Value, current_block: u32) -> Result<u32> {
        if value.is_null() {
            return Ok(0);
        }

        let memo = self.memo.ok_or_else(|| {
            DbfError::InvalidRequest(format!("column {} needs a memo file", column.name))
        })?;
        let kind = match value {
            Value::Text(_) if !column.flags.is_binary() => MemoKind::Text,
            _ => MemoKind::Binary,
        };
        let payload = self.payload(column, value)?;
        memo.store(kind, &payload, current_block)
    }
}

/// Reject values whose variant the column cannot hold
pub fn check(column: &Column, value: &Value) -> Result<()> {
    let ok = match (column.data_type, value) {
        (_, Value::Null) => true,
        (ColumnType::Character, Value::Text(_) | Value::Bytes(_)) => true,
        (ColumnType::Varchar, Value::Text(_)) => true,
        (ColumnType::Varbinary, Value::Bytes(_)) => true,
        (ColumnType::Memo, Value::Text(_) | Value::Bytes(_)) => true,
        (ColumnType::Integer, Value::Integer(_) | Value::BigInt(_)) => true,
        (
            ColumnType::Double | ColumnType::Currency | ColumnType::Float | ColumnType::Numeric,
            Value::Float(_) | Value::Integer(_) | Value::BigInt(_),
        ) => true,
        (ColumnType::Logical, Value::Boolean(_)) => true,
        (ColumnType::Date | ColumnType::DateTime, Value::Date(_) | Value::DateTime(_)) => true,
        (
            ColumnType::Blob | ColumnType::General | ColumnType::Picture | ColumnType::NullFlags,
            Value::Bytes(_),
        ) => true,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(mismatch(column, value))
    }
}

fn null_payload(column: &Column) -> Vec<u8> {
    match column.data_type {
        ColumnType::Character | ColumnType::Date | ColumnType::Logical => {
            vec![b' '; column.length as usize]
        }
        ColumnType::Float | ColumnType::Numeric => Vec::new(),
        ColumnType::Varchar | ColumnType::Varbinary | ColumnType::Memo => Vec::new(),
        _ => vec![0; column.length as usize],
    }
}

fn datetime_bytes(dt: chrono::NaiveDateTime) -> Vec<u8> {
    let (day, millis) = julian::datetime_to_parts(dt);
    let mut buf = Vec::with_capacity(8);
    buf.put_u32_le(day as u32);
    buf.put_u32_le(millis);
    buf
}

fn encode_memo_address(column: &Column, block: u32) -> Result<Vec<u8>> {
    if column.length == 4 {
        return Ok(block.to_le_bytes().to_vec());
    }
    let digits = if block == 0 { Vec::new() } else { block.to_string().into_bytes() };
    fit_right(column, digits)
}

/// Left-justify, padding with `fill`
fn fit_left(column: &Column, mut payload: Vec<u8>, fill: u8) -> Result<Vec<u8>> {
    let width = column.length as usize;
    if payload.len() > width {
        return Err(too_long(column, payload.len()));
    }
    payload.resize(width, fill);
    Ok(payload)
}

/// Right-justify with leading spaces
fn fit_right(column: &Column, payload: Vec<u8>) -> Result<Vec<u8>> {
    let width = column.length as usize;
    if payload.len() > width {
        return Err(too_long(column, payload.len()));
    }
    let mut out = vec![b' '; width - payload.len()];
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Varchar/Varbinary layout: full width as-is, shorter payloads zero-filled
/// with their length in the last byte, empty payloads flagged null when
/// the column allows it
fn fit_variable(column: &Column, mut payload: Vec<u8>) -> Result<Encoded> {
    let width = column.length as usize;
    let mut flags = VarFlags::default();

    if payload.len() > width {
        return Err(too_long(column, payload.len()));
    }

    if payload.is_empty() && column.flags.is_nullable() {
        flags.null = true;
        payload.resize(width, 0);
    } else if payload.len() < width {
        let len = payload.len() as u8;
        payload.resize(width, 0);
        payload[width - 1] = len;
        flags.short = true;
    }

    Ok(Encoded {
        bytes: payload,
        flags,
    })
}

fn mismatch(column: &Column, value: &Value) -> DbfError {
    DbfError::TypeMismatch {
        column: column.name.clone(),
        expected: column.data_type.to_string(),
        actual: value.kind().to_string(),
    }
}

fn too_long(column: &Column, length: usize) -> DbfError {
    DbfError::ValueTooLong {
        column: column.name.clone(),
        length,
        max: column.length as usize,
    }
}
