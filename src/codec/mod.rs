//! Codec Module
//!
//! Per-type conversion between fixed-width column spans and [`Value`]s.
//!
//! ## Layouts
//! ```text
//! C  Character   code-page text, space padded, not trimmed
//! I  Integer     i32 LE
//! B  Double      f64 LE
//! F  Float       ASCII decimal, right-justified
//! N  Numeric     ASCII decimal; i64 when decimals == 0
//! L  Logical     'T' / 'F'
//! D  Date        ASCII YYYYMMDD, blank = null
//! T  DateTime    u32 LE julian day | u32 LE millis since midnight
//! Y  Currency    i64 LE scaled by 10^4
//! M  Memo        u32 LE memo block address
//! V  Varchar     text, length/null from the null-flag bitmap
//! Q  Varbinary   bytes, length/null from the null-flag bitmap
//! W/G/P          raw bytes
//! ```

mod column_type;
mod interpret;
pub mod julian;
mod represent;
mod value;

pub use column_type::ColumnType;
pub use interpret::{memo_address, Decoder};
pub use represent::{check, Encoded, Encoder};
pub use value::Value;
