//! Memo Module
//!
//! Block-structured companion file (.FPT / .DCT) holding memo content.
//!
//! ## File Format (big-endian, unlike the table file)
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ Header (8 bytes, padded with zeros to 512)             │
//! │   NextFree: u32 BE (4) | Unused (2) | BlockSize: u16 BE│
//! ├────────────────────────────────────────────────────────┤
//! │ Block N at N * BlockSize                               │
//! │   Signature: u32 BE (1 = text, 0 = binary)             │
//! │   Length: u32 BE                                       │
//! │   Payload (Length bytes)                               │
//! │   Zero padding to a BlockSize multiple                 │
//! ├────────────────────────────────────────────────────────┤
//! │ ... next blocks ...                                    │
//! └────────────────────────────────────────────────────────┘
//! ```

mod block;
mod file;

pub use block::{BlockHeader, MemoHeader, MemoKind, BLOCK_HEADER_SIZE, MEMO_HEADER_SIZE};
pub use file::{MemoContent, MemoFile, DEFAULT_BLOCK_SIZE, HEADER_REGION};
