//! Memo block allocator
//!
//! Appends memo values at the free-block cursor and reads them back by
//! block number.

use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::block::{BlockHeader, MemoHeader, MemoKind, BLOCK_HEADER_SIZE, MEMO_HEADER_SIZE};
use crate::error::{DbfError, Result};
use crate::io::BlockFile;

/// Block size used for newly created memo files
pub const DEFAULT_BLOCK_SIZE: u16 = 64;

/// Bytes reserved for the memo header at the start of the file
pub const HEADER_REGION: u64 = 512;

/// One memo value as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoContent {
    pub kind: MemoKind,
    pub data: Vec<u8>,
}

/// Memo file handle
///
/// ## Concurrency:
/// - `header`: Mutex, the memo write domain. Held from cursor read through
///   header persist and block write, so allocations never overlap.
/// - Reads only take the stream mutex inside `BlockFile`.
pub struct MemoFile {
    path: Option<PathBuf>,
    file: BlockFile,
    header: Mutex<MemoHeader>,
}

impl MemoFile {
    /// Open an existing memo file
    pub fn open(file: BlockFile, path: Option<PathBuf>) -> Result<Self> {
        let mut raw = [0u8; MEMO_HEADER_SIZE];
        file.read_at(0, &mut raw, "memo header read")?;
        let header = MemoHeader::parse(&raw)?;

        debug!(
            path = ?path,
            block_size = header.block_size,
            next_free = header.next_free,
            "opened memo file"
        );

        Ok(Self {
            path,
            file,
            header: Mutex::new(header),
        })
    }

    /// Initialize an empty memo file with the given block size
    pub fn create(file: BlockFile, block_size: u16, path: Option<PathBuf>) -> Result<Self> {
        if block_size == 0 {
            return Err(DbfError::InvalidRequest("memo block size must be positive".to_string()));
        }

        let first = first_block(block_size);
        let header = MemoHeader {
            next_free: first,
            block_size,
        };

        let region = first as usize * block_size as usize;
        let mut buf = BytesMut::with_capacity(region);
        buf.put_slice(&header.encode());
        buf.put_bytes(0, region - MEMO_HEADER_SIZE);
        file.write_at(0, &buf)?;

        debug!(path = ?path, block_size, next_free = first, "created memo file");

        Ok(Self {
            path,
            file,
            header: Mutex::new(header),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn block_size(&self) -> u16 {
        self.header.lock().block_size
    }

    /// Current free-block cursor
    pub fn next_free(&self) -> u32 {
        self.header.lock().next_free
    }

    /// Blocks occupied by a payload of `len` bytes, sub-header included
    pub fn blocks_needed(&self, len: usize) -> u32 {
        blocks_for(len, self.block_size())
    }

    /// Read the value stored at `block`
    pub fn read(&self, block: u32) -> Result<MemoContent> {
        let block_size = self.block_size();
        if block < first_block(block_size) {
            return Err(DbfError::InvalidMemoBlock {
                block,
                reason: "address points into the memo header".to_string(),
            });
        }

        let offset = block as u64 * block_size as u64;
        let mut raw = [0u8; BLOCK_HEADER_SIZE];
        self.file.read_at(offset, &mut raw, "memo block header read")?;
        let sub = BlockHeader::parse(&raw);

        if sub.length == 0 {
            return Ok(MemoContent {
                kind: sub.kind,
                data: Vec::new(),
            });
        }

        // Refuse to allocate for lengths the file cannot contain
        let data_start = offset + BLOCK_HEADER_SIZE as u64;
        let available = self.file.len()?.saturating_sub(data_start);
        if (sub.length as u64) > available {
            return Err(DbfError::Incomplete {
                operation: "memo read",
                expected: sub.length as usize,
                actual: available as usize,
            });
        }

        let data = self.file.read_vec(data_start, sub.length as usize, "memo read")?;
        trace!(block, length = sub.length, kind = ?sub.kind, "memo read");
        Ok(MemoContent {
            kind: sub.kind,
            data,
        })
    }

    /// Append a value at the free-block cursor; returns its block number
    pub fn write(&self, kind: MemoKind, data: &[u8]) -> Result<u32> {
        let mut header = self.header.lock();
        self.allocate(&mut header, kind, data)
    }

    /// Write a value for a field whose row currently points at
    /// `current_block` (0 = none)
    ///
    /// The existing blocks are overwritten when the new value fits in them;
    /// otherwise a fresh allocation is made.
    pub fn store(&self, kind: MemoKind, data: &[u8], current_block: u32) -> Result<u32> {
        let mut header = self.header.lock();

        if current_block >= first_block(header.block_size) && current_block < header.next_free {
            let offset = current_block as u64 * header.block_size as u64;
            let mut raw = [0u8; BLOCK_HEADER_SIZE];
            if self.file.read_at(offset, &mut raw, "memo block header read").is_ok() {
                let old = BlockHeader::parse(&raw);
                let held = blocks_for(old.length as usize, header.block_size);
                let needed = blocks_for(data.len(), header.block_size);
                if needed <= held {
                    self.write_block(current_block, header.block_size, kind, data)?;
                    trace!(block = current_block, length = data.len(), "memo overwritten in place");
                    return Ok(current_block);
                }
            }
        }

        self.allocate(&mut header, kind, data)
    }

    fn allocate(&self, header: &mut MemoHeader, kind: MemoKind, data: &[u8]) -> Result<u32> {
        let block = header.next_free;
        let needed = blocks_for(data.len(), header.block_size);

        let next_free = block.checked_add(needed).ok_or_else(|| DbfError::InvalidMemoBlock {
            block,
            reason: "memo file is full".to_string(),
        })?;

        // Advance and persist the cursor before the payload lands
        let mut updated = *header;
        updated.next_free = next_free;
        self.file.write_at(0, &updated.encode())?;
        *header = updated;

        self.write_block(block, header.block_size, kind, data)?;
        debug!(block, blocks = needed, length = data.len(), "memo allocated");
        Ok(block)
    }

    fn write_block(&self, block: u32, block_size: u16, kind: MemoKind, data: &[u8]) -> Result<()> {
        let length = u32::try_from(data.len()).map_err(|_| {
            DbfError::InvalidRequest(format!("memo value of {} bytes is too large", data.len()))
        })?;

        let total = blocks_for(data.len(), block_size) as usize * block_size as usize;
        let mut buf = BytesMut::with_capacity(total);
        BlockHeader { kind, length }.put(&mut buf);
        buf.put_slice(data);
        buf.put_bytes(0, total - buf.len());

        self.file.write_at(block as u64 * block_size as u64, &buf)
    }
}

/// First block past the header region
fn first_block(block_size: u16) -> u32 {
    HEADER_REGION.div_ceil(block_size as u64) as u32
}

fn blocks_for(len: usize, block_size: u16) -> u32 {
    (BLOCK_HEADER_SIZE + len).div_ceil(block_size as usize).max(1) as u32
}
