//! Configuration for foxdbf
//!
//! Centralized open/create options with sensible defaults.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::Value;
use crate::encoding::TextConverter;

/// Per-column value conversion applied after decoding
pub type ConvertFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Main configuration for opening a table
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Source
    // -------------------------------------------------------------------------
    /// Path of the table file (.DBF / .DBC). The memo file is located next to
    /// it with the matching extension (.FPT / .DCT).
    pub path: PathBuf,

    /// Text converter; `None` means Windows-1252 unless
    /// `interpret_code_page` picks one from the header
    pub converter: Option<Arc<dyn TextConverter>>,

    // -------------------------------------------------------------------------
    // Open Behaviour
    // -------------------------------------------------------------------------
    /// Take a whole-file lock at open and fail if another process holds one
    pub exclusive: bool,

    /// Accept file types other than the Visual FoxPro family
    pub untested: bool,

    /// Open without write access
    pub read_only: bool,

    /// Lock each written byte range, retrying on contention
    pub write_lock: bool,

    // -------------------------------------------------------------------------
    // Code Page
    // -------------------------------------------------------------------------
    /// Fail when the header code page differs from the converter's
    pub validate_code_page: bool,

    /// Select the converter from the header code-page byte
    pub interpret_code_page: bool,

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------
    /// Trim trailing/leading spaces from Character values
    pub trim_spaces: bool,

    /// Century the two-digit header year is relative to
    pub year_base: i32,

    /// Drop rows that fail to decode during bulk iteration
    pub skip_invalid_rows: bool,

    /// Per-column rename/trim/convert overrides, keyed by column name
    pub column_overrides: HashMap<String, ColumnOverride>,

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------
    /// Translate underscores in member table names into spaces when
    /// locating member files
    pub catalog_spaces: bool,
}

/// Per-column modification applied when rows are assembled
#[derive(Clone, Default)]
pub struct ColumnOverride {
    /// Name exposed in rows instead of the on-disk name
    pub rename: Option<String>,

    /// Overrides `Config::trim_spaces` for this column
    pub trim: Option<bool>,

    /// Conversion applied to each decoded value
    pub convert: Option<ConvertFn>,
}

impl ColumnOverride {
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn convert(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.convert = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ColumnOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnOverride")
            .field("rename", &self.rename)
            .field("trim", &self.trim)
            .field("convert", &self.convert.is_some())
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("converter", &self.converter)
            .field("exclusive", &self.exclusive)
            .field("untested", &self.untested)
            .field("read_only", &self.read_only)
            .field("write_lock", &self.write_lock)
            .field("validate_code_page", &self.validate_code_page)
            .field("interpret_code_page", &self.interpret_code_page)
            .field("trim_spaces", &self.trim_spaces)
            .field("year_base", &self.year_base)
            .field("skip_invalid_rows", &self.skip_invalid_rows)
            .field("column_overrides", &self.column_overrides)
            .field("catalog_spaces", &self.catalog_spaces)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            converter: None,
            exclusive: false,
            untested: false,
            read_only: false,
            write_lock: false,
            validate_code_page: false,
            interpret_code_page: false,
            trim_spaces: false,
            year_base: 2000,
            skip_invalid_rows: false,
            column_overrides: HashMap::new(),
            catalog_spaces: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Override registered for a column, if any (names compare
    /// case-insensitively)
    pub fn column_override(&self, column: &str) -> Option<&ColumnOverride> {
        self.column_overrides.get(column).or_else(|| {
            self.column_overrides
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, modification)| modification)
        })
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the table file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the text converter
    pub fn converter(mut self, converter: Arc<dyn TextConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.config.exclusive = exclusive;
        self
    }

    pub fn untested(mut self, untested: bool) -> Self {
        self.config.untested = untested;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    pub fn write_lock(mut self, write_lock: bool) -> Self {
        self.config.write_lock = write_lock;
        self
    }

    pub fn validate_code_page(mut self, validate: bool) -> Self {
        self.config.validate_code_page = validate;
        self
    }

    pub fn interpret_code_page(mut self, interpret: bool) -> Self {
        self.config.interpret_code_page = interpret;
        self
    }

    pub fn trim_spaces(mut self, trim: bool) -> Self {
        self.config.trim_spaces = trim;
        self
    }

    /// Set the century the two-digit header year counts from
    pub fn year_base(mut self, base: i32) -> Self {
        self.config.year_base = base;
        self
    }

    pub fn skip_invalid_rows(mut self, skip: bool) -> Self {
        self.config.skip_invalid_rows = skip;
        self
    }

    /// Register a rename/trim/convert override for one column
    pub fn column_override(mut self, column: impl Into<String>, modification: ColumnOverride) -> Self {
        self.config.column_overrides.insert(column.into(), modification);
        self
    }

    pub fn catalog_spaces(mut self, spaces: bool) -> Self {
        self.config.catalog_spaces = spaces;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
