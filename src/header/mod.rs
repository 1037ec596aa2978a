//! Header Module
//!
//! Table header and column directory of a .DBF/.DBC file.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (32 bytes, little-endian)                             │
//! │   Type (1) | YY (1) | MM (1) | DD (1) | RowCount: u32 (4)    │
//! │   FirstRow: u16 (2) | RowLength: u16 (2) | Reserved (16)     │
//! │   TableFlags (1) | CodePage (1) | Reserved (2)               │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Column directory (32 bytes per column)                       │
//! │   Name (11) | Type (1) | Offset: u32 (4) | Length (1)        │
//! │   Decimals (1) | Flags (1) | AutoNext: u32 (4)               │
//! │   AutoStep: u16 (2) | Reserved (7)                           │
//! │   ... repeated, `_NullFlags` record last if present ...      │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Terminator 0x0D, zero padding up to FirstRow                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Rows: DeleteFlag (1) | column spans ... | null-flag bitmap   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ EOF marker 0x1A                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod column;
mod directory;
mod table_header;

pub use column::{Column, ColumnFlags};
pub use directory::Directory;
pub use table_header::{FileType, Header, TableFlags};

// =============================================================================
// Shared Constants
// =============================================================================

/// Size of the fixed table header
pub const HEADER_SIZE: usize = 32;

/// Size of one column directory record
pub const COLUMN_SIZE: usize = 32;

/// Byte that ends the column directory
pub const TERMINATOR: u8 = 0x0D;

/// Byte written after the last row
pub const EOF_MARKER: u8 = 0x1A;

/// Delete-flag byte of a live row
pub const ACTIVE_MARKER: u8 = 0x20;

/// Delete-flag byte of a deleted row
pub const DELETED_MARKER: u8 = 0x2A;

/// Reserved name of the synthetic null-flag column
pub const NULL_FLAG_COLUMN: &str = "_NullFlags";

/// Maximum column name length
pub const MAX_NAME_LENGTH: usize = 10;
