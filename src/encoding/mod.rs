//! Encoding Module
//!
//! Character-set conversion between a table's legacy code page and Rust
//! strings.
//!
//! ## Responsibilities
//! - `TextConverter`: pluggable decode/encode capability used by the codec
//!   for Character, Varchar and text memo values
//! - Converters for every Windows, Macintosh, CJK and DOS code page the
//!   header can name (`encoding_rs`, `oem_cp`), plus UTF-8 pass-through
//! - The code-page byte lookup table stored at header offset 29

mod code_page;
mod converter;

pub use code_page::{CodePage, CODE_PAGES, DEFAULT_CODE_PAGE_MARK};
pub use converter::{CodePageConverter, TextConverter, Utf8Converter, Windows1252Converter};
