//! Memo file header and block sub-header

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DbfError, Result};

/// Size of the memo file header fields
pub const MEMO_HEADER_SIZE: usize = 8;

/// Size of the sub-header at the start of every memo value
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Content discriminator stored in a block's signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    Binary,
    Text,
}

impl MemoKind {
    pub fn signature(self) -> u32 {
        match self {
            MemoKind::Binary => 0,
            MemoKind::Text => 1,
        }
    }

    /// Anything but 1 is treated as binary (pictures, OLE objects)
    pub fn from_signature(signature: u32) -> Self {
        if signature == 1 {
            MemoKind::Text
        } else {
            MemoKind::Binary
        }
    }
}

/// Memo file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoHeader {
    /// First unallocated block
    pub next_free: u32,
    pub block_size: u16,
}

impl MemoHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MEMO_HEADER_SIZE {
            return Err(DbfError::Incomplete {
                operation: "memo header read",
                expected: MEMO_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = &bytes[..MEMO_HEADER_SIZE];
        let next_free = buf.get_u32();
        buf.advance(2);
        let block_size = buf.get_u16();

        if block_size == 0 {
            return Err(DbfError::InvalidMemoBlock {
                block: 0,
                reason: "memo header declares a block size of 0".to_string(),
            });
        }

        Ok(Self {
            next_free,
            block_size,
        })
    }

    pub fn encode(&self) -> [u8; MEMO_HEADER_SIZE] {
        let mut buf = BytesMut::with_capacity(MEMO_HEADER_SIZE);
        buf.put_u32(self.next_free);
        buf.put_u16(0);
        buf.put_u16(self.block_size);

        let mut out = [0u8; MEMO_HEADER_SIZE];
        out.copy_from_slice(&buf);
        out
    }
}

/// Sub-header at the start of a memo value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: MemoKind,
    pub length: u32,
}

impl BlockHeader {
    pub fn parse(bytes: &[u8; BLOCK_HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        let kind = MemoKind::from_signature(buf.get_u32());
        let length = buf.get_u32();
        Self { kind, length }
    }

    pub fn put(&self, buf: &mut BytesMut) {
        buf.put_u32(self.kind.signature());
        buf.put_u32(self.length);
    }
}
