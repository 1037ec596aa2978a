//! Rows and fields
//!
//! Created on every read; changing a field only changes storage once the
//! row is written back with [`Table::write_row`](super::Table::write_row).

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::codec::{self, Value};
use crate::error::{DbfError, Result};
use crate::header::Column;

/// One column value of a row
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    column: Column,
    name: String,
    value: Value,
}

impl Field {
    pub(crate) fn new(column: Column, name: String, value: Value) -> Self {
        Self { column, name, value }
    }

    /// Definition of the column this field belongs to
    pub fn column(&self) -> &Column {
        &self.column
    }

    /// Exposed name (the column name unless renamed)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Replace the value, rejecting variants the column cannot hold
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        codec::check(&self.column, &value)?;
        self.value = value;
        Ok(())
    }

    pub(crate) fn assign(&mut self, value: Value) {
        self.value = value;
    }

    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.column.name.eq_ignore_ascii_case(name)
    }
}

/// A materialized row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    position: u32,
    deleted: bool,
    fields: Vec<Field>,
}

impl Row {
    pub(crate) fn new(position: u32, deleted: bool, fields: Vec<Field>) -> Self {
        Self {
            position,
            deleted,
            fields,
        }
    }

    /// Zero-based row number
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Fields in column order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    /// Field by exposed or on-disk name, case-insensitive
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.matches(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.matches(name))
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).map(Field::value)
    }

    /// Set a field by name
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.field_mut(name)
            .ok_or_else(|| DbfError::ColumnNotFound(name.to_string()))?
            .set_value(value)
    }

    /// Ordered name/value pairs
    pub fn to_map(&self) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}
