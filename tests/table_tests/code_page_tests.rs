//! Tests for code-page interpretation
//!
//! These tests verify:
//! - The header's code-page byte selects the text converter
//! - Windows and DOS pages decode non-ASCII bytes
//! - Writes encode through the interpreted page
//! - Pages without a codec are reported, not guessed

use std::fs;
use std::path::{Path, PathBuf};

use foxdbf::header::FileType;
use foxdbf::{Column, ColumnType, Config, DbfError, Table, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Byte offset of the NAME span in row 0 (32 header + 32 column + 0x0D + flag)
const NAME_OFFSET: usize = 66;

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("names.dbf");
    (temp_dir, path)
}

/// One Character column holding "Xavier", rewritten with `first` and `mark`
fn create_names(path: &Path, mark: u8, first: u8) {
    let columns = vec![Column::new("NAME", ColumnType::Character, 10, 0).unwrap()];
    let config = Config::builder().path(path).build();
    let table = Table::create(config, FileType::VISUAL_FOXPRO, columns).unwrap();
    let mut row = table.new_row();
    row.set("NAME", "Xavier").unwrap();
    table.write_row(&mut row).unwrap();
    drop(table);

    let mut bytes = fs::read(path).unwrap();
    bytes[29] = mark;
    bytes[NAME_OFFSET] = first;
    fs::write(path, bytes).unwrap();
}

fn open_interpreted(path: &Path) -> foxdbf::Result<Table> {
    Table::open(
        Config::builder()
            .path(path)
            .interpret_code_page(true)
            .trim_spaces(true)
            .build(),
    )
}

// =============================================================================
// Interpretation Tests
// =============================================================================

#[test]
fn test_central_european_windows_page() {
    let (_temp, path) = setup_temp_table();
    create_names(&path, 0xC8, 0x8A);

    let table = open_interpreted(&path).unwrap();
    assert_eq!(table.converter().code_page(), 0xC8);
    assert_eq!(
        table.row().unwrap().value("NAME"),
        Some(&Value::Text("\u{0160}avier".into()))
    );
}

#[test]
fn test_international_dos_page() {
    let (_temp, path) = setup_temp_table();
    create_names(&path, 0x02, 0x82);

    let table = open_interpreted(&path).unwrap();
    assert_eq!(
        table.row().unwrap().value("NAME"),
        Some(&Value::Text("\u{e9}avier".into()))
    );
}

#[test]
fn test_unknown_mark_falls_back_to_1250() {
    let (_temp, path) = setup_temp_table();
    create_names(&path, 0x00, 0xE8);

    let table = open_interpreted(&path).unwrap();
    assert_eq!(
        table.row().unwrap().value("NAME"),
        Some(&Value::Text("\u{010D}avier".into()))
    );
}

#[test]
fn test_without_interpretation_uses_1252() {
    let (_temp, path) = setup_temp_table();
    create_names(&path, 0xC8, 0xE8);
    let table = Table::open(Config::builder().path(&path).trim_spaces(true).build()).unwrap();
    assert_eq!(
        table.row().unwrap().value("NAME"),
        Some(&Value::Text("\u{e8}avier".into()))
    );
}

#[test]
fn test_write_encodes_through_interpreted_page() {
    let (_temp, path) = setup_temp_table();
    create_names(&path, 0xC8, b'X');

    let table = open_interpreted(&path).unwrap();
    let mut row = table.row().unwrap();
    row.set("NAME", "\u{010D}aj").unwrap();
    table.write_row(&mut row).unwrap();
    drop(table);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[NAME_OFFSET..NAME_OFFSET + 3], &[0xE8, b'a', b'j']);
}

#[test]
fn test_page_without_codec_is_unsupported() {
    let (_temp, path) = setup_temp_table();
    create_names(&path, 0x68, b'X');

    let result = open_interpreted(&path);
    assert!(matches!(result, Err(DbfError::UnsupportedCodePage(0x68))));
}
