//! Transfer documents
//!
//! A `TransferDocument` is an ordered collection of named tables plus
//! document metadata. Insertion order is semantically meaningful: it is the
//! serialization order, and downstream tooling evaluates formula sections in
//! file order. Documents are built once per output artifact and written with
//! a single call; reading delegates to the two-pass codec.

use crate::catalog::AttributeCatalog;
use crate::codec::{parse_section, scan_sections, BlockWriter, FormatError};
use crate::models::{Table, TableMode, TableSchema};
use crate::registry::TableRegistry;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Format code of the mandatory leading header table
pub const VERSION_CODE: &str = "VERSION";
/// Display name of the version table in the attribute catalog
pub const VERSION_DISPLAY_NAME: &str = "Version block";

/// Schema of the mandatory version-header section.
pub fn version_schema() -> TableSchema {
    TableSchema::define(
        VERSION_CODE,
        VERSION_DISPLAY_NAME,
        &["VERSNR", "FILETYPE", "LANGUAGE", "UNIT"],
    )
    .expect("version schema is statically valid")
    .with_default("VERSNR", 10)
    .expect("VERSNR is a version column")
    .with_default("FILETYPE", "Demand")
    .expect("FILETYPE is a version column")
    .with_default("LANGUAGE", "DEU")
    .expect("LANGUAGE is a version column")
    .with_default("UNIT", "KM")
    .expect("UNIT is a version column")
}

/// Version table with one header row for the given file type
/// (`Trans` for transfer files, `Net` for net files).
pub fn version_table(filetype: &str) -> Table {
    let schema = Arc::new(version_schema());
    let mut table = Table::with_mode(schema, TableMode::None);
    let mut row = table.make_row();
    row.set("FILETYPE", filetype)
        .expect("FILETYPE is a version column");
    table
        .add_row(row)
        .expect("single row cannot collide");
    table
}

/// Options for the document read path
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions<'a> {
    /// Catalog for boolean re-typing; without it 0/1 fields stay integers
    pub catalog: Option<&'a AttributeCatalog>,
    /// Only parse sections whose code is listed; `None` parses everything
    pub sections: Option<&'a [&'a str]>,
}

/// Ordered collection of named tables plus document metadata
#[derive(Debug, Clone)]
pub struct TransferDocument {
    author: String,
    date: NaiveDate,
    /// Tables in insertion order
    tables: Vec<(String, Table)>,
    /// Name -> position in `tables`
    index: HashMap<String, usize>,
}

impl TransferDocument {
    /// New transfer document carrying the mandatory version header table.
    pub fn new(author: impl Into<String>) -> Self {
        let mut doc = Self::bare(author);
        doc.add_table_as("Version", version_table("Trans"));
        doc
    }

    fn bare(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            date: Utc::now().date_naive(),
            tables: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Add a table under its format code.
    pub fn add_table(&mut self, table: Table) {
        let name = table.schema().code().to_string();
        self.add_table_as(name, table);
    }

    /// Add a table under an explicit name. Re-adding under an existing name
    /// replaces the table in place (last write wins), keeping its position
    /// in the serialization order. Callers rely on this to build a table
    /// incrementally under one name.
    pub fn add_table_as(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        match self.index.get(&name) {
            Some(pos) => self.tables[*pos].1 = table,
            None => {
                self.index.insert(name.clone(), self.tables.len());
                self.tables.push((name, table));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.index.get(name).map(|pos| &self.tables[*pos].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.index.get(name).map(|pos| &mut self.tables[*pos].1)
    }

    /// Tables in insertion (= serialization) order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// All tables of one format code whose mode is in `modes`.
    pub fn tables_with_code<'a>(
        &'a self,
        code: &'a str,
        modes: &'a [TableMode],
    ) -> impl Iterator<Item = (&'a str, &'a Table)> {
        self.tables().filter(move |(_, table)| {
            table.schema().code() == code && modes.contains(&table.mode())
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Write the whole document: banner block, then every table as one
    /// section, in insertion order.
    pub fn write(&self, path: impl AsRef<Path>, catalog: &AttributeCatalog) -> Result<(), FormatError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BlockWriter::new(file);
        writer.write_banner(&self.author, self.date)?;
        for (_, table) in &self.tables {
            writer.write_table(table, catalog)?;
        }
        writer.flush()?;
        info!(path = %path.display(), tables = self.tables.len(), "wrote transfer file");
        Ok(())
    }

    /// Append the document's sections to an existing file, skipping the
    /// version header table.
    pub fn append(&self, path: impl AsRef<Path>, catalog: &AttributeCatalog) -> Result<(), FormatError> {
        let path = path.as_ref();
        let file = OpenOptions::new().append(true).open(path)?;
        let mut writer = BlockWriter::new(file);
        for (_, table) in &self.tables {
            if table.schema().code() == VERSION_CODE {
                continue;
            }
            writer.write_table(table, catalog)?;
        }
        writer.flush()?;
        info!(path = %path.display(), "appended to transfer file");
        Ok(())
    }

    /// Read a transfer file back into a document.
    pub fn read(path: impl AsRef<Path>, registry: &TableRegistry) -> Result<Self, FormatError> {
        Self::read_with(path, registry, ReadOptions::default())
    }

    /// Read a transfer file with explicit options: a catalog for boolean
    /// re-typing and/or a section-code filter.
    pub fn read_with(
        path: impl AsRef<Path>,
        registry: &TableRegistry,
        options: ReadOptions<'_>,
    ) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let mut input = BufReader::new(File::open(path)?);
        let sections = scan_sections(&mut input)?;

        let mut doc = Self::bare("");
        for section in &sections {
            if let Some(filter) = options.sections {
                if !filter.iter().any(|code| code.eq_ignore_ascii_case(&section.code)) {
                    continue;
                }
            }
            let table = parse_section(&mut input, section, registry, options.catalog)?;
            doc.add_table_as(section.name.clone(), table);
        }
        info!(
            path = %path.display(),
            sections = sections.len(),
            tables = doc.len(),
            "read transfer file"
        );
        Ok(doc)
    }

    /// Path of a numbered modification file inside `folder`:
    /// artifact number 22 becomes `M000022.tra`.
    pub fn modification_path(folder: impl AsRef<Path>, number: u32) -> PathBuf {
        folder.as_ref().join(format!("M{number:06}.tra"))
    }

    /// Write the document as a numbered modification file and return its
    /// path.
    pub fn write_modification(
        &self,
        folder: impl AsRef<Path>,
        number: u32,
        catalog: &AttributeCatalog,
    ) -> Result<PathBuf, FormatError> {
        let path = Self::modification_path(folder, number);
        self.write(&path, catalog)?;
        Ok(path)
    }
}
