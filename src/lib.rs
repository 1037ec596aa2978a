//! # foxdbf
//!
//! Reader and writer for FoxPro / dBase tables:
//! - Fixed-layout `.DBF` row files with a typed column directory
//! - Block-structured `.FPT` / `.DCT` memo files
//! - Byte-exact encode/decode of every FoxPro column type
//! - Null/variable-length bitmap for Varchar, Varbinary and nullable columns
//! - Row pointer navigation and linear column search
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Table / Catalog facade                       │
//! │        (open, create, navigate, read, write, search)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Type Codec                               │
//! │        (interpret / represent, julian dates, currency)       │
//! └──────┬──────────────┬──────────────────┬────────────────────┘
//!        │              │                  │
//!        ▼              ▼                  ▼
//!  ┌───────────┐ ┌─────────────┐   ┌──────────────┐
//!  │  Header + │ │ Null-flag   │   │ Memo block   │
//!  │ Directory │ │  bitmap     │   │  allocator   │
//!  └─────┬─────┘ └─────────────┘   └──────┬───────┘
//!        │                                │
//!        ▼                                ▼
//!  ┌─────────────────────────────────────────────┐
//!  │   BlockFile (positioned I/O + range locks)  │
//!  └─────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod io;
pub mod encoding;
pub mod header;
pub mod codec;
pub mod nullflags;
pub mod memo;
pub mod table;
pub mod catalog;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use catalog::Catalog;
pub use codec::{ColumnType, Value};
pub use config::{ColumnOverride, Config};
pub use encoding::{CodePage, TextConverter};
pub use error::{DbfError, Result};
pub use header::{Column, FileType, Header};
pub use table::{Field, Position, Row, Table};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of foxdbf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
