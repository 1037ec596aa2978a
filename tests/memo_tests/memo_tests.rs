//! Tests for the memo block allocator
//!
//! These tests verify:
//! - Header layout of new memo files
//! - Allocation monotonicity and exact cursor advance
//! - Reads of text, binary and empty values
//! - In-place overwrite versus fresh allocation
//! - Rejection of corrupt addresses and lengths

use std::fs::{self, OpenOptions};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use foxdbf::io::BlockFile;
use foxdbf::memo::{MemoFile, MemoKind, HEADER_REGION};
use foxdbf::DbfError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_memo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.fpt");
    (temp_dir, path)
}

fn file_at(path: &Path, create: bool) -> BlockFile {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(create)
        .open(path)
        .unwrap();
    BlockFile::new(Box::new(file))
}

fn memory_memo(block_size: u16) -> MemoFile {
    MemoFile::create(BlockFile::new(Box::new(Cursor::new(Vec::new()))), block_size, None).unwrap()
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_create_writes_header_region() {
    let (_temp, path) = setup_temp_memo();
    let memo = MemoFile::create(file_at(&path, true), 64, Some(path.clone())).unwrap();
    assert_eq!(memo.next_free(), 8);
    assert_eq!(memo.path(), Some(path.as_path()));

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u64, HEADER_REGION);
    assert_eq!(&bytes[..8], &[0, 0, 0, 8, 0, 0, 0, 64]);
}

#[test]
fn test_block_layout_on_disk() {
    let (_temp, path) = setup_temp_memo();
    let memo = MemoFile::create(file_at(&path, true), 64, None).unwrap();
    let block = memo.write(MemoKind::Text, b"hello").unwrap();
    assert_eq!(block, 8);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 512 + 64);
    assert_eq!(&bytes[512..520], &[0, 0, 0, 1, 0, 0, 0, 5]);
    assert_eq!(&bytes[520..525], b"hello");
    assert!(bytes[525..].iter().all(|&b| b == 0));
    assert_eq!(&bytes[..4], &[0, 0, 0, 9]);
}

#[test]
fn test_large_block_size_starts_after_header() {
    let memo = memory_memo(1024);
    assert_eq!(memo.next_free(), 1);
    assert_eq!(memo.write(MemoKind::Text, b"x").unwrap(), 1);
    assert_eq!(memo.next_free(), 2);
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn test_allocation_is_monotonic() {
    let memo = memory_memo(64);
    let sizes = [0usize, 1, 56, 57, 200, 1000, 3];

    let mut last = 0;
    for size in sizes {
        let before = memo.next_free();
        let needed = memo.blocks_needed(size);
        let block = memo.write(MemoKind::Binary, &vec![0xAB; size]).unwrap();

        assert_eq!(block, before);
        assert!(block > last);
        assert_eq!(memo.next_free(), before + needed);
        last = block;
    }
}

#[test]
fn test_read_back_values() {
    let memo = memory_memo(32);
    let text = memo.write(MemoKind::Text, b"some notes").unwrap();
    let binary = memo.write(MemoKind::Binary, &[0, 1, 2, 255]).unwrap();
    let long = vec![b'z'; 500];
    let spread = memo.write(MemoKind::Text, &long).unwrap();

    let read = memo.read(text).unwrap();
    assert_eq!(read.kind, MemoKind::Text);
    assert_eq!(read.data, b"some notes");

    let read = memo.read(binary).unwrap();
    assert_eq!(read.kind, MemoKind::Binary);
    assert_eq!(read.data, vec![0, 1, 2, 255]);

    assert_eq!(memo.read(spread).unwrap().data, long);
}

#[test]
fn test_empty_value_occupies_one_block() {
    let memo = memory_memo(64);
    let block = memo.write(MemoKind::Text, b"").unwrap();
    assert_eq!(memo.next_free(), block + 1);
    assert!(memo.read(block).unwrap().data.is_empty());
}

#[test]
fn test_reopen_keeps_cursor() {
    let (_temp, path) = setup_temp_memo();
    {
        let memo = MemoFile::create(file_at(&path, true), 64, None).unwrap();
        memo.write(MemoKind::Text, b"first").unwrap();
        memo.write(MemoKind::Text, &[b'x'; 100]).unwrap();
    }

    let memo = MemoFile::open(file_at(&path, false), None).unwrap();
    assert_eq!(memo.block_size(), 64);
    assert_eq!(memo.next_free(), 8 + 1 + 2);
    assert_eq!(memo.read(8).unwrap().data, b"first");
}

// =============================================================================
// Store Tests
// =============================================================================

#[test]
fn test_store_overwrites_in_place_when_it_fits() {
    let memo = memory_memo(64);
    let block = memo.write(MemoKind::Text, &[b'a'; 100]).unwrap();
    let cursor = memo.next_free();

    let same = memo.store(MemoKind::Text, b"short", block).unwrap();
    assert_eq!(same, block);
    assert_eq!(memo.next_free(), cursor);
    assert_eq!(memo.read(block).unwrap().data, b"short");
}

#[test]
fn test_store_allocates_when_too_big() {
    let memo = memory_memo(64);
    let block = memo.write(MemoKind::Text, b"tiny").unwrap();
    let cursor = memo.next_free();

    let moved = memo.store(MemoKind::Text, &[b'b'; 300], block).unwrap();
    assert_eq!(moved, cursor);
    assert!(memo.next_free() > cursor);
}

#[test]
fn test_store_without_current_block_allocates() {
    let memo = memory_memo(64);
    let first = memo.store(MemoKind::Text, b"one", 0).unwrap();
    let second = memo.store(MemoKind::Text, b"two", 0).unwrap();
    assert!(second > first);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_address_inside_header_rejected() {
    let memo = memory_memo(64);
    assert!(matches!(memo.read(3), Err(DbfError::InvalidMemoBlock { block: 3, .. })));
}

#[test]
fn test_length_past_end_is_incomplete() {
    let (_temp, path) = setup_temp_memo();
    {
        let memo = MemoFile::create(file_at(&path, true), 64, None).unwrap();
        memo.write(MemoKind::Text, b"hello").unwrap();
    }

    let mut bytes = fs::read(&path).unwrap();
    bytes[516..520].copy_from_slice(&10_000u32.to_be_bytes());
    fs::write(&path, bytes).unwrap();

    let memo = MemoFile::open(file_at(&path, false), None).unwrap();
    assert!(matches!(memo.read(8), Err(DbfError::Incomplete { .. })));
}

#[test]
fn test_zero_block_size_rejected_on_open() {
    let (_temp, path) = setup_temp_memo();
    fs::write(&path, [0u8; 512]).unwrap();
    let result = MemoFile::open(file_at(&path, false), None);
    assert!(matches!(result, Err(DbfError::InvalidMemoBlock { .. })));
}
