//! Table Module
//!
//! The public face of the engine: open or create a table, move the row
//! pointer, read and write rows, search a column.
//!
//! ## Read Path
//! ```text
//! row_at(n)
//!   ├── offset = first_row + n * row_length
//!   ├── read row_length bytes
//!   ├── byte 0: 0x20 active / 0x2A deleted
//!   ├── _NullFlags span -> per-column VarFlags
//!   └── per column: Decoder::decode(span, flags) -> Value
//!         └── memo columns: block address -> MemoFile::read
//! ```
//!
//! ## Write Path
//! ```text
//! write_row(row)
//!   ├── append? assign autoincrement values
//!   ├── per column: Encoder::encode -> span bytes + VarFlags
//!   │     └── memo columns: MemoFile::store (in place or fresh blocks)
//!   ├── write row image (+ 0x1A after an appended row)
//!   └── bump row count, stamp date, rewrite header + directory
//! ```

mod handle;
mod navigator;
mod row;
mod search;

pub use handle::{find_memo, memo_path_for, Rows, Table};
pub use navigator::{Navigator, Position};
pub use row::{Field, Row};
