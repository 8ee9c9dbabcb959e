//! Table schema definitions
//!
//! A `TableSchema` fixes a table's identity in the exchange format (format
//! code, display name) and its shape: ordered columns, primary key, per-column
//! defaults and unit converters. Schemas are immutable once defined; column
//! extension produces a new schema.

use super::row::Row;
use super::value::CellValue;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Error during schema definition
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema '{0}' has an empty column list")]
    EmptyColumns(String),
    #[error("Primary-key column '{1}' not in column list of schema '{0}'")]
    UnknownPrimaryKey(String, String),
    #[error("Column '{1}' not in column list of schema '{0}'")]
    UnknownColumn(String, String),
    #[error("Column '{1}' already defined in schema '{0}'")]
    DuplicateColumn(String, String),
}

/// Character substitutions applied to column names so that the generated
/// field identifiers are ASCII-safe.
static TRANSLITERATIONS: Lazy<HashMap<char, char>> = Lazy::new(|| {
    "-()äöüÄÖÜß"
        .chars()
        .zip("___aouAOUs".chars())
        .collect()
});

/// Transliterate a column name into an ASCII-safe, lowercase field
/// identifier. Pure and total: every input produces a valid identifier.
pub fn transliterate(column_name: &str) -> String {
    column_name
        .chars()
        .map(|c| *TRANSLITERATIONS.get(&c).unwrap_or(&c))
        .collect::<String>()
        .to_lowercase()
}

/// Converter for columns stored as a decimal with a unit suffix
/// (e.g. `0.234km` for a length column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    pub unit: String,
    pub decimals: usize,
}

impl UnitConverter {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            decimals: 3,
        }
    }

    /// Render a value as fixed-precision decimal plus unit suffix.
    /// Absent values render as the empty string.
    pub fn render(&self, value: &CellValue) -> String {
        match value.as_f64() {
            Some(f) => format!("{:.*}{}", self.decimals, f, self.unit),
            None => String::new(),
        }
    }

    /// Parse a suffixed decimal back into a float value. Accepts `,` as an
    /// alternative decimal separator. Unparseable fields become `Empty`.
    pub fn parse(&self, raw: &str) -> CellValue {
        let stripped = raw
            .trim()
            .trim_end_matches(self.unit.as_str())
            .replace(',', ".");
        match stripped.parse::<f64>() {
            Ok(f) => CellValue::Float(f),
            Err(_) => CellValue::Empty,
        }
    }
}

/// One column of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name as written in section headers
    pub name: String,
    /// Transliterated lowercase field identifier
    pub field: String,
    /// Value a row takes when the column is not set
    pub default: CellValue,
    pub converter: Option<UnitConverter>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let field = transliterate(&name);
        Self {
            name,
            field,
            default: CellValue::Empty,
            converter: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<CellValue>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_converter(mut self, converter: UnitConverter) -> Self {
        self.converter = Some(converter);
        self
    }
}

/// Immutable definition of a table kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    code: String,
    name: String,
    columns: Vec<ColumnDef>,
    pkey: Vec<String>,
    /// Uppercase column name -> position
    index: HashMap<String, usize>,
}

impl TableSchema {
    /// Define a schema from its format code, display name and column names.
    ///
    /// The primary key defaults to the first column. An empty column list is
    /// rejected.
    pub fn define(
        code: impl Into<String>,
        name: impl Into<String>,
        columns: &[&str],
    ) -> Result<Self, SchemaError> {
        let defs: Vec<ColumnDef> = columns.iter().map(|c| ColumnDef::new(*c)).collect();
        Self::from_columns(code, name, defs)
    }

    /// Define a schema from fully specified column definitions.
    pub fn from_columns(
        code: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
    ) -> Result<Self, SchemaError> {
        let code = code.into();
        let name = name.into();
        if columns.is_empty() {
            return Err(SchemaError::EmptyColumns(code));
        }
        let mut index = HashMap::new();
        for (pos, col) in columns.iter().enumerate() {
            if index.insert(col.name.to_uppercase(), pos).is_some() {
                return Err(SchemaError::DuplicateColumn(code, col.name.clone()));
            }
        }
        let pkey = vec![columns[0].name.clone()];
        Ok(Self {
            code,
            name,
            columns,
            pkey,
            index,
        })
    }

    /// Replace the default primary key (first column) with an explicit one.
    pub fn with_pkey(mut self, pkey: &[&str]) -> Result<Self, SchemaError> {
        for col in pkey {
            if self.position(col).is_none() {
                return Err(SchemaError::UnknownPrimaryKey(
                    self.code,
                    (*col).to_string(),
                ));
            }
        }
        self.pkey = pkey.iter().map(|c| (*c).to_string()).collect();
        Ok(self)
    }

    /// Declare a default value for a column.
    pub fn with_default(
        mut self,
        column: &str,
        default: impl Into<CellValue>,
    ) -> Result<Self, SchemaError> {
        match self.position(column) {
            Some(pos) => {
                self.columns[pos].default = default.into();
                Ok(self)
            }
            None => Err(SchemaError::UnknownColumn(self.code, column.to_string())),
        }
    }

    /// Declare a unit converter for a column.
    pub fn with_converter(
        mut self,
        column: &str,
        converter: UnitConverter,
    ) -> Result<Self, SchemaError> {
        match self.position(column) {
            Some(pos) => {
                self.columns[pos].converter = Some(converter);
                Ok(self)
            }
            None => Err(SchemaError::UnknownColumn(self.code, column.to_string())),
        }
    }

    /// Format code used in section headers
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable table label, resolved against the attribute catalog
    /// during serialization
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn pkey(&self) -> &[String] {
        &self.pkey
    }

    /// Position of a column, matched case-insensitively against the column
    /// name or its transliterated field identifier.
    pub fn position(&self, column: &str) -> Option<usize> {
        if let Some(pos) = self.index.get(&column.to_uppercase()) {
            return Some(*pos);
        }
        let field = transliterate(column);
        self.columns.iter().position(|c| c.field == field)
    }

    pub fn column(&self, column: &str) -> Option<&ColumnDef> {
        self.position(column).map(|pos| &self.columns[pos])
    }

    /// Create a row with every field set to the column default.
    pub fn make_row(self: Arc<Self>) -> Row {
        Row::new(self)
    }

    /// Derive a schema with the same identity but the column order declared
    /// by a section header. Columns known to `self` keep their default and
    /// converter; unknown header columns become plain text columns.
    ///
    /// The registered primary key survives only if all its columns are
    /// present in the header; otherwise the first header column is used.
    pub fn reordered(&self, header_columns: &[String]) -> Result<Self, SchemaError> {
        let defs: Vec<ColumnDef> = header_columns
            .iter()
            .map(|name| match self.column(name) {
                Some(col) => col.clone(),
                None => ColumnDef::new(name.as_str()),
            })
            .collect();
        let mut schema = Self::from_columns(self.code.clone(), self.name.clone(), defs)?;
        let pkey_present = self
            .pkey
            .iter()
            .all(|k| schema.position(k).is_some());
        if pkey_present {
            schema.pkey = self.pkey.clone();
        }
        Ok(schema)
    }

    /// Append columns and return the extended schema. Used by
    /// `Table::extend_columns`; fails on a duplicate column name.
    pub(crate) fn extended(&self, new_columns: &[ColumnDef]) -> Result<Self, SchemaError> {
        let mut columns = self.columns.clone();
        columns.extend_from_slice(new_columns);
        let mut schema = Self::from_columns(self.code.clone(), self.name.clone(), columns)?;
        schema.pkey = self.pkey.clone();
        Ok(schema)
    }
}
