//! Tables
//!
//! A `Table` owns a schema and an ordered, append-only sequence of rows. A
//! keyed frame (primary-key projection -> row index) enforces key uniqueness
//! and supports structured lookups. The modification mode tags the whole
//! table for serialization.

use super::row::Row;
use super::schema::{ColumnDef, SchemaError, TableSchema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Modification mode of a whole section, written as a single-character tag
/// in the section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableMode {
    /// No tag (e.g. the version header section)
    None,
    #[default]
    Insert,
    Update,
    Delete,
    Unchanged,
}

impl TableMode {
    pub fn tag(&self) -> &'static str {
        match self {
            TableMode::None => "",
            TableMode::Insert => "+",
            TableMode::Update => "*",
            TableMode::Delete => "-",
            TableMode::Unchanged => "!",
        }
    }

    pub fn from_tag(c: char) -> Option<TableMode> {
        match c {
            '+' => Some(TableMode::Insert),
            '*' => Some(TableMode::Update),
            '-' => Some(TableMode::Delete),
            '!' => Some(TableMode::Unchanged),
            _ => None,
        }
    }

    /// Human-readable suffix for the table banner comment
    pub fn banner_suffix(&self) -> &'static str {
        match self {
            TableMode::Insert => " (inserted)",
            TableMode::Update => " (updated)",
            TableMode::Delete => " (deleted)",
            TableMode::None | TableMode::Unchanged => "",
        }
    }
}

/// Error during table mutation
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Duplicate primary key ({key}) in table '{table}'")]
    DuplicateKey { table: String, key: String },
    #[error("Row built for schema '{row}' cannot be added to table '{table}'")]
    SchemaMismatch { table: String, row: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Ordered, append-only collection of rows conforming to one schema
#[derive(Debug, Clone)]
pub struct Table {
    schema: Arc<TableSchema>,
    mode: TableMode,
    rows: Vec<Row>,
    /// Primary-key projection -> row index
    keyed: HashMap<Vec<String>, usize>,
}

impl Table {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self::with_mode(schema, TableMode::default())
    }

    pub fn with_mode(schema: Arc<TableSchema>, mode: TableMode) -> Self {
        Self {
            schema,
            mode,
            rows: Vec::new(),
            keyed: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TableMode) {
        self.mode = mode;
    }

    /// Create a row shaped for this table, with all fields defaulted.
    pub fn make_row(&self) -> Row {
        self.schema.clone().make_row()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Look up a row by its primary-key projection (values rendered as in
    /// the exchange format).
    pub fn get(&self, key: &[&str]) -> Option<&Row> {
        let key: Vec<String> = key.iter().map(|k| (*k).to_string()).collect();
        self.keyed.get(&key).map(|pos| &self.rows[*pos])
    }

    fn check_row(&self, row: &Row) -> Result<(), TableError> {
        if !Arc::ptr_eq(row.schema(), &self.schema) {
            return Err(TableError::SchemaMismatch {
                table: self.schema.code().to_string(),
                row: row.schema().code().to_string(),
            });
        }
        Ok(())
    }

    /// Append one row. Fails without mutating the table if the row's
    /// primary-key projection is already present.
    pub fn add_row(&mut self, row: Row) -> Result<(), TableError> {
        self.check_row(&row)?;
        let key = row.key();
        if self.keyed.contains_key(&key) {
            return Err(TableError::DuplicateKey {
                table: self.schema.code().to_string(),
                key: key.join(";"),
            });
        }
        self.keyed.insert(key, self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    /// Append a batch of rows with all-or-nothing semantics: a key conflict
    /// with an existing row or within the batch rejects the whole batch
    /// before any row is committed.
    pub fn add_rows(&mut self, rows: Vec<Row>) -> Result<(), TableError> {
        let mut batch_keys: HashMap<Vec<String>, usize> = HashMap::new();
        for (offset, row) in rows.iter().enumerate() {
            self.check_row(row)?;
            let key = row.key();
            if self.keyed.contains_key(&key) || batch_keys.contains_key(&key) {
                return Err(TableError::DuplicateKey {
                    table: self.schema.code().to_string(),
                    key: key.join(";"),
                });
            }
            batch_keys.insert(key, offset);
        }
        for row in rows {
            let key = row.key();
            self.keyed.insert(key, self.rows.len());
            self.rows.push(row);
        }
        Ok(())
    }

    /// Append columns to the schema. Existing rows are eagerly backfilled
    /// with the new columns' defaults, so every row always matches the
    /// current schema shape.
    pub fn extend_columns(&mut self, new_columns: Vec<ColumnDef>) -> Result<(), TableError> {
        let extended = Arc::new(self.schema.extended(&new_columns)?);
        for row in &mut self.rows {
            row.rebind(extended.clone());
        }
        self.schema = extended;
        Ok(())
    }
}
