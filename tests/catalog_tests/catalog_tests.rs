//! Tests for database catalogs
//!
//! These tests verify:
//! - Member tables are found through OBJECTTYPE = "Table" rows
//! - Member files are matched case-insensitively
//! - Underscore to space translation of member names
//! - Deleted catalog entries are ignored

use std::path::Path;

use foxdbf::catalog::{OBJECT_NAME_COLUMN, OBJECT_TYPE_COLUMN};
use foxdbf::{Catalog, Column, ColumnType, Config, FileType, Table, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn create_catalog(path: &Path, entries: &[(&str, &str)]) {
    let columns = vec![
        Column::new("OBJECTID", ColumnType::Integer, 4, 0).unwrap(),
        Column::new(OBJECT_TYPE_COLUMN, ColumnType::Character, 10, 0).unwrap(),
        Column::new(OBJECT_NAME_COLUMN, ColumnType::Character, 128, 0).unwrap(),
    ];
    let config = Config::builder().path(path).build();
    let catalog = Table::create(config, FileType::VISUAL_FOXPRO, columns).unwrap();

    for (id, (kind, name)) in entries.iter().enumerate() {
        let mut row = catalog.new_row();
        row.set("OBJECTID", id as i32 + 1).unwrap();
        row.set(OBJECT_TYPE_COLUMN, *kind).unwrap();
        row.set(OBJECT_NAME_COLUMN, *name).unwrap();
        catalog.write_row(&mut row).unwrap();
    }
}

fn create_member(path: &Path, rows: i32) {
    let columns = vec![Column::new("N", ColumnType::Integer, 4, 0).unwrap()];
    let config = Config::builder().path(path).build();
    let table = Table::create(config, FileType::VISUAL_FOXPRO, columns).unwrap();
    for n in 0..rows {
        let mut row = table.new_row();
        row.set("N", n).unwrap();
        table.write_row(&mut row).unwrap();
    }
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[test]
fn test_open_catalog_members() {
    let temp = TempDir::new().unwrap();
    let dbc = temp.path().join("shop.dbc");
    create_catalog(
        &dbc,
        &[
            ("Database", "Database"),
            ("Table", "customers"),
            ("Table", "orders"),
            ("Index", "customers"),
        ],
    );
    create_member(&temp.path().join("CUSTOMERS.DBF"), 3);
    create_member(&temp.path().join("orders.dbf"), 1);

    let catalog = Catalog::open(Config::builder().path(&dbc).build()).unwrap();
    assert_eq!(catalog.table_names(), vec!["customers", "orders"]);
    assert_eq!(catalog.database().row_count(), 4);

    let customers = catalog.table("Customers").unwrap();
    assert_eq!(customers.row_count(), 3);
    assert_eq!(
        customers.row_at(2).unwrap().value("N"),
        Some(&Value::Integer(2))
    );
    assert!(catalog.table("index").is_none());
}

#[test]
fn test_catalog_spaces_translation() {
    let temp = TempDir::new().unwrap();
    let dbc = temp.path().join("shop.dbc");
    create_catalog(&dbc, &[("Table", "order_items")]);
    create_member(&temp.path().join("order items.dbf"), 2);

    let plain = Catalog::open(Config::builder().path(&dbc).build());
    assert!(plain.is_err());

    let catalog = Catalog::open(Config::builder().path(&dbc).catalog_spaces(true).build()).unwrap();
    assert_eq!(catalog.table("order_items").unwrap().row_count(), 2);
}

#[test]
fn test_catalog_without_tables() {
    let temp = TempDir::new().unwrap();
    let dbc = temp.path().join("empty.dbc");
    create_catalog(&dbc, &[("Database", "Database")]);

    let catalog = Catalog::open(Config::builder().path(&dbc).build()).unwrap();
    assert!(catalog.tables().is_empty());
}

#[test]
fn test_catalog_skips_deleted_members() {
    let temp = TempDir::new().unwrap();
    let dbc = temp.path().join("shop.dbc");
    create_catalog(&dbc, &[("Table", "live"), ("Table", "dropped")]);
    create_member(&temp.path().join("live.dbf"), 1);

    let database = Table::open(Config::builder().path(&dbc).build()).unwrap();
    database.delete(1).unwrap();
    drop(database);

    let catalog = Catalog::open(Config::builder().path(&dbc).build()).unwrap();
    assert_eq!(catalog.table_names(), vec!["live"]);
    assert!(catalog.table("dropped").is_none());
}
