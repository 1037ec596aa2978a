//! Error types for foxdbf
//!
//! Provides a unified error type for all table, memo and codec operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using DbfError
pub type Result<T> = std::result::Result<T, DbfError>;

/// Boxed parse failure carried by [`DbfError::Decode`]
pub type ParseError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for foxdbf operations
#[derive(Debug, Error)]
pub enum DbfError {
    // -------------------------------------------------------------------------
    // Structural Errors
    // -------------------------------------------------------------------------
    #[error("Invalid file type: 0x{0:02x}")]
    InvalidFileType(u8),

    #[error("Untested file type {0} (enable `untested` to open anyway)")]
    UntestedFileType(String),

    #[error("Malformed column directory: {0}")]
    MalformedDirectory(String),

    #[error("Row length mismatch: header declares {declared} bytes, columns need {computed}")]
    RowLengthMismatch { declared: u16, computed: usize },

    #[error("Invalid delete flag 0x{flag:02x} at row {position}")]
    InvalidDeleteFlag { position: u32, flag: u8 },

    #[error("Invalid memo block {block}: {reason}")]
    InvalidMemoBlock { block: u32, reason: String },

    // -------------------------------------------------------------------------
    // Boundary Signals
    // -------------------------------------------------------------------------
    #[error("Beginning of file")]
    BeginningOfFile,

    #[error("End of file")]
    EndOfFile,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Incomplete {operation}: expected {expected} bytes, got {actual}")]
    Incomplete {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Memo file not found: {0}")]
    MissingMemoFile(PathBuf),

    #[error("File is locked by another process: {0}")]
    Locked(String),

    #[error("Table was opened read-only")]
    ReadOnly,

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Code page mismatch: table uses 0x{actual:02x}, converter expects 0x{expected:02x}")]
    CodePageMismatch { expected: u8, actual: u8 },

    #[error("No built-in converter for code page 0x{0:02x}")]
    UnsupportedCodePage(u8),

    // -------------------------------------------------------------------------
    // Type Errors
    // -------------------------------------------------------------------------
    #[error("Unknown data type: 0x{0:02x}")]
    UnknownDataType(u8),

    #[error("Column {column} of type {expected} cannot hold a {actual} value")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Cannot decode column {column} from {raw:?}")]
    Decode {
        column: String,
        raw: Vec<u8>,
        #[source]
        source: ParseError,
    },

    #[error("Value {value} is out of range for {data_type} column {column}")]
    ValueOutOfRange {
        column: String,
        data_type: String,
        value: String,
    },

    #[error("Value for column {column} needs {length} bytes, column holds {max}")]
    ValueTooLong {
        column: String,
        length: usize,
        max: usize,
    },

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {0} is memo-backed and cannot be searched")]
    NotSearchable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbfError {
    /// True for the BOF/EOF control-flow signals
    pub fn is_boundary(&self) -> bool {
        matches!(self, DbfError::BeginningOfFile | DbfError::EndOfFile)
    }
}
