//! Tests for column search
//!
//! These tests verify:
//! - Exact matches compare the full padded column span
//! - Substring matches look for the unpadded value anywhere in the span
//! - Memo columns and unknown columns are rejected

use std::io::Cursor;

use foxdbf::{Column, ColumnType, Config, DbfError, FileType, Table, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn memory_table(columns: Vec<Column>, with_memo: bool) -> Table {
    let memo = with_memo.then(|| Box::new(Cursor::new(Vec::new())) as Box<dyn foxdbf::io::Stream>);
    Table::create_with_streams(
        Config::default(),
        FileType::VISUAL_FOXPRO,
        columns,
        Box::new(Cursor::new(Vec::new())),
        memo,
    )
    .unwrap()
}

fn word_table(words: &[&str]) -> Table {
    let table = memory_table(vec![Column::new("WORD", ColumnType::Character, 8, 0).unwrap()], false);
    for word in words {
        let mut row = table.new_row();
        row.set("WORD", *word).unwrap();
        table.write_row(&mut row).unwrap();
    }
    table
}

fn positions(rows: &[foxdbf::Row]) -> Vec<u32> {
    rows.iter().map(|r| r.position()).collect()
}

// =============================================================================
// Character Search Tests
// =============================================================================

#[test]
fn test_exact_search_matches_padded_value_only() {
    let table = word_table(&["TEST", "TESTING", "A TEST"]);

    let hits = table.search("WORD", &Value::from("TEST"), true).unwrap();
    assert_eq!(positions(&hits), vec![0]);
    assert_eq!(hits[0].value("WORD"), Some(&Value::Text("TEST    ".into())));
}

#[test]
fn test_substring_search_matches_anywhere() {
    let table = word_table(&["TEST", "TESTING", "A TEST"]);

    let hits = table.search("WORD", &Value::from("TEST"), false).unwrap();
    assert_eq!(positions(&hits), vec![0, 1, 2]);

    let hits = table.search("WORD", &Value::from("ING"), false).unwrap();
    assert_eq!(positions(&hits), vec![1]);
}

#[test]
fn test_search_is_case_sensitive() {
    let table = word_table(&["TEST", "test"]);
    let hits = table.search("word", &Value::from("test"), true).unwrap();
    assert_eq!(positions(&hits), vec![1]);
}

#[test]
fn test_search_includes_deleted_rows() {
    let table = word_table(&["TEST", "OTHER"]);
    table.delete(0).unwrap();

    let hits = table.search("WORD", &Value::from("TEST"), true).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].is_deleted());
}

#[test]
fn test_search_without_hits() {
    let table = word_table(&["ALPHA", "BETA"]);
    assert!(table.search("WORD", &Value::from("GAMMA"), false).unwrap().is_empty());
}

// =============================================================================
// Other Column Types
// =============================================================================

#[test]
fn test_exact_integer_search() {
    let table = memory_table(vec![Column::new("N", ColumnType::Integer, 4, 0).unwrap()], false);
    for n in [5, 70, 5] {
        let mut row = table.new_row();
        row.set("N", n).unwrap();
        table.write_row(&mut row).unwrap();
    }

    let hits = table.search("N", &Value::Integer(5), true).unwrap();
    assert_eq!(positions(&hits), vec![0, 2]);
}

#[test]
fn test_numeric_search_is_textual() {
    let table = memory_table(vec![Column::new("AMT", ColumnType::Numeric, 6, 0).unwrap()], false);
    for n in [12i64, 120, 3] {
        let mut row = table.new_row();
        row.set("AMT", n).unwrap();
        table.write_row(&mut row).unwrap();
    }

    let exact = table.search("AMT", &Value::BigInt(12), true).unwrap();
    assert_eq!(positions(&exact), vec![0]);

    let partial = table.search("AMT", &Value::BigInt(12), false).unwrap();
    assert_eq!(positions(&partial), vec![0, 1]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_memo_column_not_searchable() {
    let table = memory_table(
        vec![Column::new("BODY", ColumnType::Memo, 4, 0).unwrap()],
        true,
    );
    let result = table.search("BODY", &Value::from("x"), false);
    assert!(matches!(result, Err(DbfError::NotSearchable(_))));
}

#[test]
fn test_unknown_column() {
    let table = word_table(&["A"]);
    let result = table.search("NOPE", &Value::from("A"), false);
    assert!(matches!(result, Err(DbfError::ColumnNotFound(_))));
}
