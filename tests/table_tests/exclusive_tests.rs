//! Tests for exclusive and write-locked handles
//!
//! These tests verify:
//! - A second exclusive open of the same file is refused, even in-process
//! - Closing other handles to the file keeps the exclusive lock held
//! - Dropping the exclusive handle releases it
//! - Exclusive access needs a writable handle
//! - Range-locked writes go through on an unshared file

use std::path::{Path, PathBuf};

use foxdbf::header::FileType;
use foxdbf::{Column, ColumnType, Config, DbfError, Table, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("locked.dbf");
    let columns = vec![Column::new("N", ColumnType::Integer, 4, 0).unwrap()];
    let config = Config::builder().path(&path).build();
    Table::create(config, FileType::VISUAL_FOXPRO, columns).unwrap();
    (temp_dir, path)
}

fn open_exclusive(path: &Path) -> foxdbf::Result<Table> {
    Table::open(Config::builder().path(path).exclusive(true).build())
}

// =============================================================================
// Exclusive Open Tests
// =============================================================================

#[cfg(unix)]
#[test]
fn test_second_exclusive_open_is_locked() {
    let (_temp, path) = setup_table();
    let first = open_exclusive(&path).unwrap();

    assert!(matches!(open_exclusive(&path), Err(DbfError::Locked(_))));
    // The refused attempt closed its descriptor; the first lock must survive
    assert!(matches!(open_exclusive(&path), Err(DbfError::Locked(_))));

    drop(first);
    assert!(open_exclusive(&path).is_ok());
}

#[cfg(unix)]
#[test]
fn test_shared_handle_close_keeps_exclusive_lock() {
    let (_temp, path) = setup_table();
    let exclusive = open_exclusive(&path).unwrap();

    let shared = Table::open(Config::builder().path(&path).read_only(true).build()).unwrap();
    assert_eq!(shared.row_count(), 0);
    drop(shared);

    assert!(matches!(open_exclusive(&path), Err(DbfError::Locked(_))));

    let mut row = exclusive.new_row();
    row.set("N", 5).unwrap();
    exclusive.write_row(&mut row).unwrap();
    assert_eq!(exclusive.row_at(0).unwrap().value("N"), Some(&Value::Integer(5)));
}

#[test]
fn test_exclusive_read_only_is_config_error() {
    let (_temp, path) = setup_table();
    let config = Config::builder().path(&path).exclusive(true).read_only(true).build();
    assert!(matches!(Table::open(config), Err(DbfError::Config(_))));
}

// =============================================================================
// Write Lock Tests
// =============================================================================

#[test]
fn test_write_lock_appends() {
    let (_temp, path) = setup_table();
    let table = Table::open(Config::builder().path(&path).write_lock(true).build()).unwrap();

    for n in 0..3 {
        let mut row = table.new_row();
        row.set("N", n).unwrap();
        table.write_row(&mut row).unwrap();
    }
    drop(table);

    let table = Table::open(Config::builder().path(&path).build()).unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.row_at(2).unwrap().value("N"), Some(&Value::Integer(2)));
}
