//! Text converters
//!
//! The converter is the only place raw table bytes become Rust strings.
//! Windows, Macintosh and CJK code pages go through `encoding_rs`; the
//! DOS OEM pages through `oem_cp`.

use std::fmt;

use encoding_rs::Encoding;

use crate::error::{DbfError, Result};

/// Converts between a legacy code page and UTF-8 strings
pub trait TextConverter: fmt::Debug + Send + Sync {
    /// Decode raw column/memo bytes into a string
    fn decode(&self, bytes: &[u8]) -> Result<String>;

    /// Encode a string into the legacy code page
    fn encode(&self, text: &str) -> Result<Vec<u8>>;

    /// Code-page mark (header byte 29) this converter produces
    fn code_page(&self) -> u8;
}

// =============================================================================
// Code Page Converter
// =============================================================================

#[derive(Clone, Copy)]
enum Backend {
    Encoding(&'static Encoding),
    Oem(u16),
}

/// Converter for one of the code pages a table header can name
#[derive(Clone, Copy)]
pub struct CodePageConverter {
    mark: u8,
    number: u16,
    backend: Backend,
}

impl CodePageConverter {
    /// Converter for code page `number`, reporting `mark`; `None` when
    /// neither backend knows the page
    pub fn new(mark: u8, number: u16) -> Option<Self> {
        let backend = match windows_encoding(number) {
            Some(encoding) => Backend::Encoding(encoding),
            None if oem_cp::code_table::DECODING_TABLE_CP_MAP.get(&number).is_some()
                && oem_cp::code_table::ENCODING_TABLE_CP_MAP.get(&number).is_some() =>
            {
                Backend::Oem(number)
            }
            None => return None,
        };
        Some(Self { mark, number, backend })
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    fn unmappable(&self, text: &str) -> DbfError {
        DbfError::Encoding(format!(
            "{:?} has no representation in code page {}",
            text, self.number
        ))
    }
}

impl fmt::Debug for CodePageConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodePageConverter")
            .field("mark", &format_args!("0x{:02x}", self.mark))
            .field("number", &self.number)
            .finish()
    }
}

impl TextConverter for CodePageConverter {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self.backend {
            Backend::Encoding(encoding) => decode_with(encoding, bytes),
            Backend::Oem(number) => oem_cp::code_table::DECODING_TABLE_CP_MAP
                .get(&number)
                .and_then(|table| table.decode_string_checked(bytes))
                .ok_or_else(|| {
                    DbfError::Encoding(format!("bytes {:02x?} are undefined in code page {}", bytes, number))
                }),
        }
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self.backend {
            Backend::Encoding(encoding) => encode_with(encoding, text),
            Backend::Oem(number) => oem_cp::code_table::ENCODING_TABLE_CP_MAP
                .get(&number)
                .and_then(|table| oem_cp::encode_string_checked(text, table))
                .ok_or_else(|| self.unmappable(text)),
        }
    }

    fn code_page(&self) -> u8 {
        self.mark
    }
}

/// `encoding_rs` encoding for a Windows, Macintosh or CJK page number
fn windows_encoding(number: u16) -> Option<&'static Encoding> {
    let encoding = match number {
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1252 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        10000 => encoding_rs::MACINTOSH,
        10007 => encoding_rs::X_MAC_CYRILLIC,
        _ => return None,
    };
    Some(encoding)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| DbfError::Encoding(format!("malformed {} bytes {:02x?}", encoding.name(), bytes)))
}

fn encode_with(encoding: &'static Encoding, text: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(DbfError::Encoding(format!(
            "{:?} has no {} representation",
            text,
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

// =============================================================================
// Fixed Converters
// =============================================================================

/// Windows-1252 (Western European Windows), code-page mark 0x03
#[derive(Debug, Default, Clone, Copy)]
pub struct Windows1252Converter;

impl TextConverter for Windows1252Converter {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        decode_with(encoding_rs::WINDOWS_1252, bytes)
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        encode_with(encoding_rs::WINDOWS_1252, text)
    }

    fn code_page(&self) -> u8 {
        0x03
    }
}

/// UTF-8 pass-through for tables written by tools that store UTF-8 text
#[derive(Debug, Clone, Copy)]
pub struct Utf8Converter {
    mark: u8,
}

impl Utf8Converter {
    /// Create a UTF-8 converter reporting the given code-page mark
    pub fn new(mark: u8) -> Self {
        Self { mark }
    }
}

impl Default for Utf8Converter {
    fn default() -> Self {
        Self::new(0x03)
    }
}

impl TextConverter for Utf8Converter {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DbfError::Encoding(format!("invalid UTF-8: {}", e)))
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }

    fn code_page(&self) -> u8 {
        self.mark
    }
}
