//! Tests for the header and column directory
//!
//! These tests verify:
//! - Directory construction (positions, first row offset, null flags)
//! - Encode/read cycles through a positioned stream
//! - Structural validation failures
//! - Header date handling and code-page lookups

use std::io::Cursor;

use chrono::NaiveDate;
use foxdbf::encoding::{CodePage, TextConverter, Utf8Converter};
use foxdbf::header::{Directory, FileType, TableFlags, HEADER_SIZE, NULL_FLAG_COLUMN};
use foxdbf::io::BlockFile;
use foxdbf::{Column, ColumnType, DbfError};

// =============================================================================
// Helper Functions
// =============================================================================

fn memory_file(bytes: Vec<u8>) -> BlockFile {
    BlockFile::new(Box::new(Cursor::new(bytes)))
}

fn sample_columns() -> Vec<Column> {
    vec![
        Column::new("ID", ColumnType::Integer, 4, 0).unwrap(),
        Column::new("NAME", ColumnType::Character, 20, 0).unwrap(),
        Column::new("NOTE", ColumnType::Varchar, 10, 0).unwrap().nullable(),
        Column::new("BODY", ColumnType::Memo, 4, 0).unwrap(),
    ]
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_directory_layout() {
    let directory = Directory::new(FileType::VISUAL_FOXPRO_VARCHAR, sample_columns(), 0x03).unwrap();

    let positions: Vec<u32> = directory.columns.iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![1, 5, 25, 35]);

    let null_flags = directory.null_flags.as_ref().unwrap();
    assert_eq!(null_flags.name, NULL_FLAG_COLUMN);
    assert_eq!(null_flags.position, 39);
    assert_eq!(null_flags.length, 1);

    assert_eq!(directory.header.row_length, 40);
    assert_eq!(directory.header.first_row as usize, HEADER_SIZE + 32 * 5 + 1);
    assert!(directory.header.flags.has_memo());
    assert_eq!(directory.header.code_page, 0x03);
}

#[test]
fn test_no_null_flags_for_fixed_columns() {
    let columns = vec![Column::new("ID", ColumnType::Integer, 4, 0).unwrap()];
    let directory = Directory::new(FileType::VISUAL_FOXPRO, columns, 0x03).unwrap();
    assert!(directory.null_flags.is_none());
    assert_eq!(directory.header.first_row, 65);
    assert!(!directory.header.flags.has_memo());
}

#[test]
fn test_fixed_types_use_canonical_length() {
    let column = Column::new("D", ColumnType::DateTime, 3, 0).unwrap();
    assert_eq!(column.length, 8);
    let column = Column::new("L", ColumnType::Logical, 9, 0).unwrap();
    assert_eq!(column.length, 1);
}

#[test]
fn test_duplicate_column_rejected() {
    let columns = vec![
        Column::new("ID", ColumnType::Integer, 4, 0).unwrap(),
        Column::new("id", ColumnType::Integer, 4, 0).unwrap(),
    ];
    let result = Directory::new(FileType::VISUAL_FOXPRO, columns, 0x03);
    assert!(matches!(result, Err(DbfError::InvalidRequest(_))));
}

#[test]
fn test_column_name_validation() {
    assert!(Column::new("", ColumnType::Character, 5, 0).is_err());
    assert!(Column::new("ELEVENCHARS", ColumnType::Character, 5, 0).is_err());
    assert!(Column::new("OK", ColumnType::Character, 0, 0).is_err());
    assert!(Column::new("V", ColumnType::Varchar, 1, 0).is_err());
    assert!(Column::new("TENCHARSXX", ColumnType::Character, 5, 0).is_ok());
}

// =============================================================================
// Read / Encode Tests
// =============================================================================

#[test]
fn test_encode_then_read() {
    let original = Directory::new(FileType::VISUAL_FOXPRO_VARCHAR, sample_columns(), 0x03).unwrap();
    let bytes = original.encode(true).to_vec();
    assert_eq!(bytes.len(), original.header.first_row as usize);

    let read = Directory::read(&memory_file(bytes)).unwrap();
    assert_eq!(read.header, original.header);
    assert_eq!(read.columns, original.columns);
    assert_eq!(read.null_flags, original.null_flags);
}

#[test]
fn test_read_ignores_backlink_area() {
    let columns = vec![Column::new("ID", ColumnType::Integer, 4, 0).unwrap()];
    let mut directory = Directory::new(FileType::VISUAL_FOXPRO, columns, 0x03).unwrap();
    directory.header.first_row += 263;

    let mut bytes = directory.encode(true).to_vec();
    assert_eq!(bytes.len(), 65 + 263);
    bytes[70] = 0x55;

    let read = Directory::read(&memory_file(bytes)).unwrap();
    assert_eq!(read.columns.len(), 1);
}

#[test]
fn test_missing_terminator() {
    let columns = vec![Column::new("ID", ColumnType::Integer, 4, 0).unwrap()];
    let directory = Directory::new(FileType::VISUAL_FOXPRO, columns, 0x03).unwrap();
    let mut bytes = directory.encode(true).to_vec();
    bytes[64] = 0x00;

    let result = Directory::read(&memory_file(bytes));
    assert!(matches!(result, Err(DbfError::MalformedDirectory(_))));
}

#[test]
fn test_unknown_column_type_in_directory() {
    let columns = vec![Column::new("ID", ColumnType::Integer, 4, 0).unwrap()];
    let directory = Directory::new(FileType::VISUAL_FOXPRO, columns, 0x03).unwrap();
    let mut bytes = directory.encode(true).to_vec();
    bytes[HEADER_SIZE + 11] = b'Z';

    let result = Directory::read(&memory_file(bytes));
    assert!(matches!(result, Err(DbfError::UnknownDataType(b'Z'))));
}

#[test]
fn test_column_lookup_is_case_insensitive() {
    let directory = Directory::new(FileType::VISUAL_FOXPRO_VARCHAR, sample_columns(), 0x03).unwrap();
    let (index, column) = directory.column("name").unwrap();
    assert_eq!(index, 1);
    assert_eq!(column.data_type, ColumnType::Character);
    assert!(directory.column("missing").is_none());
}

// =============================================================================
// Header Field Tests
// =============================================================================

#[test]
fn test_modified_date_uses_year_base() {
    let mut directory = Directory::new(
        FileType::VISUAL_FOXPRO,
        vec![Column::new("ID", ColumnType::Integer, 4, 0).unwrap()],
        0x03,
    )
    .unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
    directory.header.touch(date, 2000);
    assert_eq!(directory.header.year, 24);
    assert_eq!(directory.header.modified(2000), Some(date));
    assert_eq!(
        directory.header.modified(1900),
        NaiveDate::from_ymd_opt(1924, 7, 15)
    );
}

#[test]
fn test_file_type_validation() {
    assert!(FileType::VISUAL_FOXPRO.validate(false).is_ok());
    assert!(matches!(
        FileType::FOXPRO_2_MEMO.validate(false),
        Err(DbfError::UntestedFileType(_))
    ));
    assert!(FileType::FOXPRO_2_MEMO.validate(true).is_ok());
    assert!(matches!(FileType(0x99).validate(true), Err(DbfError::InvalidFileType(0x99))));
}

#[test]
fn test_table_flags() {
    let mut flags = TableFlags::default();
    flags.set(TableFlags::CATALOG, true);
    assert!(flags.is_catalog());
    assert!(!flags.has_memo());
    flags.set(TableFlags::CATALOG, false);
    assert_eq!(flags, TableFlags(0));
}

// =============================================================================
// Code Page Tests
// =============================================================================

#[test]
fn test_code_page_lookup() {
    let western = CodePage::from_mark(0x03);
    assert_eq!(western.number, 1252);
    assert!(western.converter().is_ok());

    assert_eq!(CodePage::from_number(437).unwrap().mark, 0x01);
    assert!(CodePage::lookup(0xEE).is_none());
    assert_eq!(CodePage::from_mark(0xEE).number, 1250);

    assert!(CodePage::from_mark(0xC9).converter().is_ok());
    assert!(matches!(
        CodePage::from_mark(0x69).converter(),
        Err(DbfError::UnsupportedCodePage(0x69))
    ));
}

#[test]
fn test_custom_converter_mark() {
    let converter = Utf8Converter::new(0xC9);
    assert_eq!(converter.code_page(), 0xC9);
    assert_eq!(converter.decode("\u{416}".as_bytes()).unwrap(), "\u{416}");
}
