//! Table handle
//!
//! Owns the table stream, the optional memo file, the in-memory directory
//! and the row pointer.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use chrono::Local;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::navigator::{Navigator, Position};
use super::row::{Field, Row};
use crate::codec::{memo_address, ColumnType, Decoder, Encoder, Value};
use crate::config::Config;
use crate::encoding::{CodePage, TextConverter, Windows1252Converter};
use crate::error::{DbfError, Result};
use crate::header::{Column, Directory, FileType, Header, ACTIVE_MARKER, DELETED_MARKER, EOF_MARKER};
use crate::io::{platform_file_lock, platform_lock, BlockFile, FileLock, Stream};
use crate::memo::{MemoFile, DEFAULT_BLOCK_SIZE};
use crate::nullflags::{NullFlagLayout, VarFlags};

/// An open table
///
/// ## Concurrency:
/// - `directory`: RwLock. Readers share it; `write_row` holds it for write
///   while the row image, header and directory are persisted.
/// - `write_lock`: Mutex serializing all mutations of the table file.
/// - Memo allocations are serialized inside [`MemoFile`].
/// - The pointer is atomic; concurrent navigation is last-writer-wins.
pub struct Table {
    config: Config,
    path: Option<PathBuf>,
    converter: Arc<dyn TextConverter>,
    pub(super) data: BlockFile,
    memo: Option<MemoFile>,
    pub(super) directory: RwLock<Directory>,
    layout: NullFlagLayout,
    navigator: Navigator,
    write_lock: Mutex<()>,
    _exclusive: Option<Box<dyn FileLock>>,
}

impl Table {
    // =========================================================================
    // Open / Create
    // =========================================================================

    /// Open the table at `config.path`, together with its memo file if one
    /// sits next to it
    pub fn open(config: Config) -> Result<Self> {
        let path = config.path.clone();
        if path.as_os_str().is_empty() {
            return Err(DbfError::Config("no table path configured".to_string()));
        }

        let file = Self::open_file(&path, config.read_only)?;
        let exclusive = Self::exclusive_lock(&file, &config, &path)?;
        let data = Self::block_file(file, &config)?;

        let memo = match find_memo(&path) {
            Some(memo_path) => {
                let file = Self::open_file(&memo_path, config.read_only)?;
                let blocks = Self::block_file(file, &config)?;
                Some(MemoFile::open(blocks, Some(memo_path))?)
            }
            None => None,
        };

        let table = Self::load(config, Some(path), data, memo, exclusive)?;
        info!(
            path = ?table.path,
            rows = table.row_count(),
            columns = table.column_count(),
            "opened table"
        );
        Ok(table)
    }

    /// Open a table over caller-supplied streams
    ///
    /// No file locks are taken; `config.path` is only used in messages.
    pub fn from_streams(
        config: Config,
        data: Box<dyn Stream>,
        memo: Option<Box<dyn Stream>>,
    ) -> Result<Self> {
        let data = BlockFile::new(data);
        let memo = match memo {
            Some(stream) => Some(MemoFile::open(BlockFile::new(stream), None)?),
            None => None,
        };
        let path = (!config.path.as_os_str().is_empty()).then(|| config.path.clone());
        Self::load(config, path, data, memo, None)
    }

    /// Create a new, empty table at `config.path`
    ///
    /// Existing files are truncated. A memo file is created when any column
    /// is a memo column.
    pub fn create(config: Config, file_type: FileType, columns: Vec<Column>) -> Result<Self> {
        let path = config.path.clone();
        if path.as_os_str().is_empty() {
            return Err(DbfError::Config("no table path configured".to_string()));
        }
        if config.read_only {
            return Err(DbfError::ReadOnly);
        }

        let file = Self::create_file(&path)?;
        let exclusive = Self::exclusive_lock(&file, &config, &path)?;
        let data = Self::block_file(file, &config)?;

        let memo = if columns.iter().any(|c| c.data_type.is_memo()) {
            let memo_path = memo_path_for(&path);
            let file = Self::create_file(&memo_path)?;
            let blocks = Self::block_file(file, &config)?;
            Some(MemoFile::create(blocks, DEFAULT_BLOCK_SIZE, Some(memo_path))?)
        } else {
            None
        };

        Self::initialize(&config, &data, file_type, columns)?;
        let table = Self::load(config, Some(path), data, memo, exclusive)?;
        info!(path = ?table.path, columns = table.column_count(), "created table");
        Ok(table)
    }

    /// Create a new table over caller-supplied (empty) streams
    pub fn create_with_streams(
        config: Config,
        file_type: FileType,
        columns: Vec<Column>,
        data: Box<dyn Stream>,
        memo: Option<Box<dyn Stream>>,
    ) -> Result<Self> {
        let data = BlockFile::new(data);
        let needs_memo = columns.iter().any(|c| c.data_type.is_memo());
        let memo = match memo {
            Some(stream) if needs_memo => Some(MemoFile::create(
                BlockFile::new(stream),
                DEFAULT_BLOCK_SIZE,
                None,
            )?),
            Some(_) | None => None,
        };

        Self::initialize(&config, &data, file_type, columns)?;
        let path = (!config.path.as_os_str().is_empty()).then(|| config.path.clone());
        Self::load(config, path, data, memo, None)
    }

    /// Write the directory and EOF marker of an empty table
    fn initialize(
        config: &Config,
        data: &BlockFile,
        file_type: FileType,
        columns: Vec<Column>,
    ) -> Result<()> {
        file_type.validate(config.untested)?;

        let code_page = match &config.converter {
            Some(converter) => converter.code_page(),
            None => Windows1252Converter.code_page(),
        };

        let mut directory = Directory::new(file_type, columns, code_page)?;
        directory.header.touch(Local::now().date_naive(), config.year_base);

        let mut image = directory.encode(true);
        image.put_u8(EOF_MARKER);
        data.write_at(0, &image)
    }

    /// Shared tail of every open path
    fn load(
        config: Config,
        path: Option<PathBuf>,
        data: BlockFile,
        memo: Option<MemoFile>,
        exclusive: Option<Box<dyn FileLock>>,
    ) -> Result<Self> {
        let directory = Directory::read(&data)?;
        let header = &directory.header;
        header.file_type.validate(config.untested)?;

        if memo.is_none() && directory.columns.iter().any(|c| c.data_type.is_memo()) {
            let expected = path
                .as_deref()
                .map(memo_path_for)
                .unwrap_or_else(|| PathBuf::from("<memo stream>"));
            return Err(DbfError::MissingMemoFile(expected));
        }
        if memo.is_none() && header.flags.has_memo() {
            warn!(path = ?path, "table flags a memo file but none was found");
        }

        let converter = select_converter(&config, header)?;
        if config.validate_code_page && converter.code_page() != header.code_page {
            return Err(DbfError::CodePageMismatch {
                expected: converter.code_page(),
                actual: header.code_page,
            });
        }

        let layout = NullFlagLayout::new(&directory.columns);
        let reserved = directory.null_flags.as_ref().map_or(0, |nf| nf.length as usize);
        if reserved < layout.byte_length() {
            return Err(DbfError::MalformedDirectory(format!(
                "null flag column holds {} bytes but {} are needed",
                reserved,
                layout.byte_length()
            )));
        }

        debug!(
            file_type = %header.file_type,
            rows = header.row_count,
            row_length = header.row_length,
            first_row = header.first_row,
            code_page = header.code_page,
            memo = memo.is_some(),
            "table directory loaded"
        );

        Ok(Self {
            config,
            path,
            converter,
            data,
            memo,
            directory: RwLock::new(directory),
            layout,
            navigator: Navigator::new(),
            write_lock: Mutex::new(()),
            _exclusive: exclusive,
        })
    }

    fn open_file(path: &Path, read_only: bool) -> Result<File> {
        Ok(OpenOptions::new().read(true).write(!read_only).open(path)?)
    }

    fn create_file(path: &Path) -> Result<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?)
    }

    /// Hold a whole-file lock for the handle's lifetime
    fn exclusive_lock(file: &File, config: &Config, path: &Path) -> Result<Option<Box<dyn FileLock>>> {
        if !config.exclusive {
            return Ok(None);
        }
        if config.read_only {
            return Err(DbfError::Config("exclusive access needs a writable handle".to_string()));
        }
        let lock = platform_file_lock(file)?;
        if !lock.try_lock_exclusive()? {
            return Err(DbfError::Locked(path.display().to_string()));
        }
        Ok(Some(lock))
    }

    fn block_file(file: File, config: &Config) -> Result<BlockFile> {
        // An exclusive holder already owns the file
        if config.write_lock && !config.exclusive {
            let lock = platform_lock(&file)?;
            Ok(BlockFile::new(Box::new(file)).with_lock(lock))
        } else {
            Ok(BlockFile::new(Box::new(file)))
        }
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the header
    pub fn header(&self) -> Header {
        self.directory.read().header.clone()
    }

    /// Snapshot of the user columns, in declared order
    pub fn columns(&self) -> Vec<Column> {
        self.directory.read().columns.clone()
    }

    pub fn column(&self, name: &str) -> Option<Column> {
        let directory = self.directory.read();
        self.resolve_column(&directory, name).ok().map(|(_, c)| c.clone())
    }

    pub fn column_count(&self) -> usize {
        self.directory.read().column_count()
    }

    pub fn row_count(&self) -> u32 {
        self.directory.read().header.row_count
    }

    pub fn memo(&self) -> Option<&MemoFile> {
        self.memo.as_ref()
    }

    pub fn converter(&self) -> &dyn TextConverter {
        self.converter.as_ref()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn pointer(&self) -> u32 {
        self.navigator.pointer()
    }

    /// Move the pointer to row `n`
    pub fn go_to(&self, n: u32) -> Position {
        self.navigator.go_to(n, self.row_count())
    }

    /// Move the pointer by `delta` rows
    pub fn skip(&self, delta: i64) -> Position {
        self.navigator.skip(delta, self.row_count())
    }

    pub fn at_eof(&self) -> bool {
        self.navigator.at_eof(self.row_count())
    }

    pub fn at_bof(&self) -> bool {
        self.navigator.at_bof()
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Read the row under the pointer
    pub fn row(&self) -> Result<Row> {
        self.row_at(self.navigator.pointer())
    }

    /// Read the row at `position` without moving the pointer
    pub fn row_at(&self, position: u32) -> Result<Row> {
        let directory = self.directory.read();
        if position >= directory.header.row_count {
            return Err(DbfError::EndOfFile);
        }

        let raw = self.data.read_vec(
            directory.header.row_offset(position),
            directory.row_length(),
            "row read",
        )?;
        self.assemble(&directory, position, &raw)
    }

    /// Iterate over all rows from the first, independent of the pointer
    pub fn iter(&self, skip_deleted: bool) -> Rows<'_> {
        Rows {
            table: self,
            position: 0,
            skip_deleted,
        }
    }

    /// Read all rows into memory
    pub fn rows(&self, skip_deleted: bool) -> Result<Vec<Row>> {
        self.iter(skip_deleted).collect()
    }

    /// Read one field of the row under the pointer
    ///
    /// Only the column's span (and the null-flag bytes for variable
    /// columns) is read.
    pub fn field(&self, name: &str) -> Result<Field> {
        let directory = self.directory.read();
        let position = self.navigator.pointer();
        if position >= directory.header.row_count {
            return Err(DbfError::EndOfFile);
        }

        let (index, column) = self.resolve_column(&directory, name)?;
        let base = directory.header.row_offset(position);
        let raw = self
            .data
            .read_vec(base + column.position as u64, column.length as usize, "field read")?;

        let flags = match (&directory.null_flags, column.data_type.is_variable()) {
            (Some(nf), true) => {
                let bitmap = self
                    .data
                    .read_vec(base + nf.position as u64, nf.length as usize, "null flag read")?;
                self.layout.read(&bitmap, index)
            }
            _ => VarFlags::default(),
        };

        let value = self.decoder().decode(column, &raw, flags)?;
        Ok(self.make_field(column, value))
    }

    /// Whether the row under the pointer is marked deleted
    pub fn is_deleted(&self) -> Result<bool> {
        let directory = self.directory.read();
        let position = self.navigator.pointer();
        if position >= directory.header.row_count {
            return Err(DbfError::EndOfFile);
        }
        let mut flag = [0u8; 1];
        self.data
            .read_at(directory.header.row_offset(position), &mut flag, "delete flag read")?;
        parse_delete_flag(position, flag[0])
    }

    fn assemble(&self, directory: &Directory, position: u32, raw: &[u8]) -> Result<Row> {
        let deleted = parse_delete_flag(position, raw[0])?;
        let bitmap = directory
            .null_flags
            .as_ref()
            .map_or(&[][..], |nf| &raw[nf.span()]);

        let decoder = self.decoder();
        let mut fields = Vec::with_capacity(directory.columns.len());
        for (index, column) in directory.columns.iter().enumerate() {
            let flags = self.layout.read(bitmap, index);
            let value = decoder.decode(column, &raw[column.span()], flags)?;
            fields.push(self.make_field(column, value));
        }
        Ok(Row::new(position, deleted, fields))
    }

    /// Apply trim, convert and rename overrides to a decoded value
    fn make_field(&self, column: &Column, value: Value) -> Field {
        let modification = self.config.column_override(&column.name);
        let trim = modification
            .and_then(|m| m.trim)
            .unwrap_or(self.config.trim_spaces);

        let value = match value {
            Value::Text(text) if trim && column.data_type == ColumnType::Character => {
                Value::Text(text.trim().to_string())
            }
            other => other,
        };
        let value = match modification.and_then(|m| m.convert.as_ref()) {
            Some(convert) => convert(value),
            None => value,
        };
        Field::new(column.clone(), self.field_name(column), value)
    }

    fn field_name(&self, column: &Column) -> String {
        self.config
            .column_override(&column.name)
            .and_then(|m| m.rename.clone())
            .unwrap_or_else(|| column.name.clone())
    }

    /// Find a column by on-disk or renamed name
    pub(super) fn resolve_column<'d>(
        &self,
        directory: &'d Directory,
        name: &str,
    ) -> Result<(usize, &'d Column)> {
        if let Some(found) = directory.column(name) {
            return Ok(found);
        }
        directory
            .columns
            .iter()
            .enumerate()
            .find(|(_, c)| self.field_name(c).eq_ignore_ascii_case(name))
            .ok_or_else(|| DbfError::ColumnNotFound(name.to_string()))
    }

    pub(super) fn decoder(&self) -> Decoder<'_> {
        Decoder::new(self.converter.as_ref(), self.memo.as_ref())
    }

    pub(super) fn encoder(&self) -> Encoder<'_> {
        Encoder::new(self.converter.as_ref(), self.memo.as_ref())
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// An empty row positioned for append
    pub fn new_row(&self) -> Row {
        let directory = self.directory.read();
        let fields = directory
            .columns
            .iter()
            .map(|c| Field::new(c.clone(), self.field_name(c), Value::Null))
            .collect();
        Row::new(directory.header.row_count, false, fields)
    }

    /// Persist `row` at its position, appending when the position equals
    /// the row count
    ///
    /// Autoincrement columns are assigned on append and the assigned value
    /// is stored back into `row`. Returns the row's position.
    pub fn write_row(&self, row: &mut Row) -> Result<u32> {
        if self.config.read_only {
            return Err(DbfError::ReadOnly);
        }

        let _guard = self.write_lock.lock();
        let mut directory = self.directory.write();

        let count = directory.header.row_count;
        let position = row.position();
        if position > count {
            return Err(DbfError::InvalidRequest(format!(
                "row position {} is past the end of a {} row table",
                position, count
            )));
        }
        if row.fields().len() != directory.columns.len() {
            return Err(DbfError::InvalidRequest(format!(
                "row has {} fields but the table has {} columns",
                row.fields().len(),
                directory.columns.len()
            )));
        }

        let appending = position == count;
        let offset = directory.header.row_offset(position);

        let mut next_values = Vec::new();
        let existing = if appending {
            for (index, column) in directory.columns.iter().enumerate() {
                if !column.flags.is_autoincrement() {
                    continue;
                }
                let assigned = match column.data_type {
                    ColumnType::Integer => Value::Integer(column.next as i32),
                    _ => Value::BigInt(column.next as i64),
                };
                row.fields_mut()[index].assign(assigned);
                next_values.push((index, column.next.wrapping_add(column.step as u32)));
            }
            None
        } else {
            Some(self.data.read_vec(offset, directory.row_length(), "row read")?)
        };

        let image = self.serialize(&directory, row, existing.as_deref())?;
        self.data.write_at(offset, &image)?;

        if appending {
            self.data
                .write_at(offset + directory.row_length() as u64, &[EOF_MARKER])?;
            directory.header.row_count += 1;
        }
        for (index, next) in next_values {
            directory.columns[index].next = next;
        }

        directory.header.touch(Local::now().date_naive(), self.config.year_base);
        directory.write(&self.data, false)?;

        debug!(position, appended = appending, "row written");
        Ok(position)
    }

    /// Build the on-disk image of `row`
    fn serialize(&self, directory: &Directory, row: &Row, existing: Option<&[u8]>) -> Result<BytesMut> {
        let encoder = self.encoder();
        let mut image = BytesMut::with_capacity(directory.row_length());
        image.put_u8(if row.is_deleted() { DELETED_MARKER } else { ACTIVE_MARKER });

        let mut bitmap = vec![0u8; directory.null_flags.as_ref().map_or(0, |nf| nf.length as usize)];

        for (index, (column, field)) in directory.columns.iter().zip(row.fields()).enumerate() {
            let current_block = match existing {
                Some(raw) if column.data_type.is_memo() => {
                    memo_address(column, &raw[column.span()]).unwrap_or(0)
                }
                _ => 0,
            };
            let encoded = encoder.encode(column, field.value(), current_block)?;
            image.put_slice(&encoded.bytes);
            self.layout.write(&mut bitmap, index, encoded.flags);
        }
        image.put_slice(&bitmap);
        Ok(image)
    }

    /// Mark the row at `position` deleted
    pub fn delete(&self, position: u32) -> Result<()> {
        self.set_delete_flag(position, DELETED_MARKER)
    }

    /// Clear the deleted mark of the row at `position`
    pub fn recall(&self, position: u32) -> Result<()> {
        self.set_delete_flag(position, ACTIVE_MARKER)
    }

    fn set_delete_flag(&self, position: u32, marker: u8) -> Result<()> {
        if self.config.read_only {
            return Err(DbfError::ReadOnly);
        }
        let _guard = self.write_lock.lock();
        let directory = self.directory.read();
        if position >= directory.header.row_count {
            return Err(DbfError::EndOfFile);
        }
        self.data
            .write_at(directory.header.row_offset(position), &[marker])?;
        debug!(position, deleted = marker == DELETED_MARKER, "delete flag set");
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.data.flush()
    }
}

/// Lazy row iterator returned by [`Table::iter`]
///
/// Undecodable rows are skipped (with a warning) when
/// `Config::skip_invalid_rows` is set; otherwise the error is yielded.
pub struct Rows<'a> {
    table: &'a Table,
    position: u32,
    skip_deleted: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let position = self.position;
            if position >= self.table.row_count() {
                return None;
            }
            self.position += 1;

            match self.table.row_at(position) {
                Ok(row) if self.skip_deleted && row.is_deleted() => continue,
                Ok(row) => return Some(Ok(row)),
                Err(e) if self.table.config.skip_invalid_rows && is_row_damage(&e) => {
                    warn!(position, error = %e, "skipping invalid row");
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn is_row_damage(error: &DbfError) -> bool {
    matches!(
        error,
        DbfError::Decode { .. }
            | DbfError::InvalidDeleteFlag { .. }
            | DbfError::InvalidMemoBlock { .. }
            | DbfError::Encoding(_)
    )
}

fn parse_delete_flag(position: u32, flag: u8) -> Result<bool> {
    match flag {
        ACTIVE_MARKER => Ok(false),
        DELETED_MARKER => Ok(true),
        flag => Err(DbfError::InvalidDeleteFlag { position, flag }),
    }
}

/// Converter precedence: explicit, then header code page, then 1252
fn select_converter(config: &Config, header: &Header) -> Result<Arc<dyn TextConverter>> {
    if let Some(converter) = &config.converter {
        return Ok(Arc::clone(converter));
    }
    if config.interpret_code_page {
        return CodePage::from_mark(header.code_page).converter();
    }
    Ok(Arc::new(Windows1252Converter))
}

/// Memo companion path for a table path: .DBC pairs with .DCT, anything
/// else with .FPT, in the table extension's letter case
pub fn memo_path_for(path: &Path) -> PathBuf {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let memo_ext = if ext.eq_ignore_ascii_case("dbc") { "dct" } else { "fpt" };
    let lowercase = ext.chars().any(|c| c.is_ascii_lowercase());
    if lowercase {
        path.with_extension(memo_ext)
    } else {
        path.with_extension(memo_ext.to_ascii_uppercase())
    }
}

/// Locate an existing memo file next to `path`, trying both letter cases
pub fn find_memo(path: &Path) -> Option<PathBuf> {
    let preferred = memo_path_for(path);
    if preferred.is_file() {
        return Some(preferred);
    }
    let ext = preferred.extension()?.to_str()?.to_string();
    let flipped = if ext.chars().any(|c| c.is_ascii_lowercase()) {
        ext.to_ascii_uppercase()
    } else {
        ext.to_ascii_lowercase()
    };
    let alternate = path.with_extension(flipped);
    alternate.is_file().then_some(alternate)
}
