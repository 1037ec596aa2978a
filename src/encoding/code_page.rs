//! Code-page marks
//!
//! Fixed lookup table from the header's code-page byte to the code page
//! it names. Unknown marks resolve to Central-European Windows (1250).

use std::sync::Arc;

use serde::Serialize;

use super::converter::{CodePageConverter, TextConverter};
use crate::error::{DbfError, Result};

/// Mark used when a header byte is not in the table
pub const DEFAULT_CODE_PAGE_MARK: u8 = 0xC8;

/// A code page known to FoxPro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodePage {
    /// Header byte
    pub mark: u8,
    /// Windows/DOS code page number
    pub number: u16,
    /// Human readable name
    pub name: &'static str,
}

pub const CODE_PAGES: &[CodePage] = &[
    CodePage { mark: 0x01, number: 437, name: "U.S. MS-DOS" },
    CodePage { mark: 0x02, number: 850, name: "International MS-DOS" },
    CodePage { mark: 0x03, number: 1252, name: "Windows ANSI" },
    CodePage { mark: 0x04, number: 10000, name: "Standard Macintosh" },
    CodePage { mark: 0x64, number: 852, name: "Eastern European MS-DOS" },
    CodePage { mark: 0x65, number: 866, name: "Russian MS-DOS" },
    CodePage { mark: 0x66, number: 865, name: "Nordic MS-DOS" },
    CodePage { mark: 0x67, number: 861, name: "Icelandic MS-DOS" },
    CodePage { mark: 0x68, number: 895, name: "Kamenicky (Czech) MS-DOS" },
    CodePage { mark: 0x69, number: 620, name: "Mazovia (Polish) MS-DOS" },
    CodePage { mark: 0x6A, number: 737, name: "Greek MS-DOS (437G)" },
    CodePage { mark: 0x6B, number: 857, name: "Turkish MS-DOS" },
    CodePage { mark: 0x78, number: 950, name: "Chinese (Hong Kong SAR, Taiwan) Windows" },
    CodePage { mark: 0x79, number: 949, name: "Korean Windows" },
    CodePage { mark: 0x7A, number: 936, name: "Chinese (PRC, Singapore) Windows" },
    CodePage { mark: 0x7B, number: 932, name: "Japanese Windows" },
    CodePage { mark: 0x7C, number: 874, name: "Thai Windows" },
    CodePage { mark: 0x7D, number: 1255, name: "Hebrew Windows" },
    CodePage { mark: 0x7E, number: 1256, name: "Arabic Windows" },
    CodePage { mark: 0x96, number: 10007, name: "Russian Macintosh" },
    CodePage { mark: 0x97, number: 10029, name: "Macintosh EE" },
    CodePage { mark: 0x98, number: 10006, name: "Greek Macintosh" },
    CodePage { mark: 0xC8, number: 1250, name: "Eastern European Windows" },
    CodePage { mark: 0xC9, number: 1251, name: "Russian Windows" },
    CodePage { mark: 0xCA, number: 1254, name: "Turkish Windows" },
    CodePage { mark: 0xCB, number: 1253, name: "Greek Windows" },
];

impl CodePage {
    /// Look up a header byte, falling back to Eastern European Windows
    pub fn from_mark(mark: u8) -> CodePage {
        Self::lookup(mark).unwrap_or_else(Self::fallback)
    }

    /// Exact lookup without fallback
    pub fn lookup(mark: u8) -> Option<CodePage> {
        CODE_PAGES.iter().copied().find(|cp| cp.mark == mark)
    }

    /// Look up by Windows/DOS code page number
    pub fn from_number(number: u16) -> Option<CodePage> {
        CODE_PAGES.iter().copied().find(|cp| cp.number == number)
    }

    fn fallback() -> CodePage {
        CodePage { mark: DEFAULT_CODE_PAGE_MARK, number: 1250, name: "Eastern European Windows" }
    }

    /// Converter for this code page
    ///
    /// Kamenicky, Mazovia and the Macintosh EE / Greek pages have no
    /// backing codec and fail with `UnsupportedCodePage`.
    pub fn converter(&self) -> Result<Arc<dyn TextConverter>> {
        CodePageConverter::new(self.mark, self.number)
            .map(|converter| Arc::new(converter) as Arc<dyn TextConverter>)
            .ok_or(DbfError::UnsupportedCodePage(self.mark))
    }
}
