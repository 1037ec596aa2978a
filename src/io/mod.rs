//! I/O Module
//!
//! Byte-addressable access to the table and memo files.
//!
//! ## Responsibilities
//! - Positioned reads that report short reads as `Incomplete`
//! - Positioned writes, optionally wrapped in an advisory range lock
//! - Whole-file exclusive locks for handles opened exclusively
//! - One mutex per file so seek+read and seek+write pairs never interleave
//!
//! ## Locking
//! ```text
//! write_at(offset, bytes)
//!   ├── try_lock(offset, len) ──busy──> sleep(LOCK_RETRY_DELAY) ──┐
//!   │        ▲                                                     │
//!   │        └─────────────────────────────────────────────────────┘
//!   ├── seek + write_all + flush
//!   └── unlock(offset, len)
//! ```
//! Polling retry only: no fairness and no timeout.

mod lock;
mod stream;

pub use lock::{
    platform_file_lock, platform_lock, FileLock, NoopRangeLock, RangeLock, LOCK_RETRY_DELAY,
};
pub use stream::{BlockFile, Stream};
