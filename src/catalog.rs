//! Database catalogs
//!
//! A catalog (.DBC) is itself a table. Rows whose OBJECTTYPE is `Table`
//! name member tables stored as sibling .DBF files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec::Value;
use crate::config::Config;
use crate::error::{DbfError, Result};
use crate::table::Table;

/// Column holding the object kind
pub const OBJECT_TYPE_COLUMN: &str = "OBJECTTYPE";

/// Column holding the object name
pub const OBJECT_NAME_COLUMN: &str = "OBJECTNAME";

/// OBJECTTYPE value of member tables
pub const TABLE_OBJECT: &str = "Table";

/// An open catalog and its member tables
pub struct Catalog {
    database: Table,
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    /// Open the catalog at `config.path` and every member table it lists
    ///
    /// Members are opened with the same options as the catalog itself.
    pub fn open(config: Config) -> Result<Self> {
        let database = Table::open(config.clone())?;
        let directory = config
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let members = database.search(OBJECT_TYPE_COLUMN, &Value::from(TABLE_OBJECT), true)?;

        let mut tables = BTreeMap::new();
        for row in members {
            // REMOVE TABLE only marks the catalog row deleted
            if row.is_deleted() {
                debug!(position = row.position(), "skipping deleted catalog entry");
                continue;
            }
            let name = row
                .value(OBJECT_NAME_COLUMN)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| DbfError::ColumnNotFound(OBJECT_NAME_COLUMN.to_string()))?;
            if name.is_empty() {
                continue;
            }

            let file_stem = if config.catalog_spaces {
                name.replace('_', " ")
            } else {
                name.clone()
            };
            let path = locate_member(&directory, &file_stem)?;
            debug!(table = %name, path = ?path, "opening catalog member");

            let member_config = Config {
                path,
                ..config.clone()
            };
            tables.insert(name, Table::open(member_config)?);
        }

        info!(path = ?config.path, tables = tables.len(), "opened catalog");
        Ok(Self { database, tables })
    }

    /// The catalog table itself
    pub fn database(&self) -> &Table {
        &self.database
    }

    /// Member tables by name
    pub fn tables(&self) -> &BTreeMap<String, Table> {
        &self.tables
    }

    /// Member table by name, case-insensitive
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, t)| t)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

/// Find `<stem>.dbf` in `directory`, ignoring letter case
fn locate_member(directory: &Path, stem: &str) -> Result<PathBuf> {
    let wanted = format!("{}.dbf", stem);
    let search_dir = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };

    for entry in fs::read_dir(search_dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().eq_ignore_ascii_case(&wanted) {
            return Ok(entry.path());
        }
    }

    Err(DbfError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("catalog member {} not found in {}", wanted, search_dir.display()),
    )))
}
