//! Typed rows
//!
//! A `Row` is a fixed-shape record bound to one schema: one value slot per
//! schema column, initialized to the column defaults. Rows are mutable until
//! they are inserted into a table.

use super::schema::{SchemaError, TableSchema};
use super::value::CellValue;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<TableSchema>,
    values: Vec<CellValue>,
}

impl Row {
    pub(crate) fn new(schema: Arc<TableSchema>) -> Self {
        let values = schema.columns().iter().map(|c| c.default.clone()).collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Set a field by column name (case-insensitive, transliterated field
    /// identifiers accepted too).
    pub fn set(
        &mut self,
        column: &str,
        value: impl Into<CellValue>,
    ) -> Result<&mut Self, SchemaError> {
        match self.schema.position(column) {
            Some(pos) => {
                self.values[pos] = value.into();
                Ok(self)
            }
            None => Err(SchemaError::UnknownColumn(
                self.schema.code().to_string(),
                column.to_string(),
            )),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.schema.position(column).map(|pos| &self.values[pos])
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub(crate) fn set_at(&mut self, pos: usize, value: CellValue) {
        self.values[pos] = value;
    }

    /// Projection of the primary-key columns, rendered for keyed-frame
    /// lookups.
    pub(crate) fn key(&self) -> Vec<String> {
        self.schema
            .pkey()
            .iter()
            .map(|col| self.get(col).map(CellValue::render).unwrap_or_default())
            .collect()
    }

    /// Rebind to an extended schema, backfilling the new trailing columns
    /// with their defaults.
    pub(crate) fn rebind(&mut self, schema: Arc<TableSchema>) {
        for col in schema.columns().iter().skip(self.values.len()) {
            self.values.push(col.default.clone());
        }
        self.schema = schema;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<TableSchema> {
        Arc::new(
            TableSchema::define("DUMMY", "Dummies", &["ID", "NAME", "VALUE"])
                .unwrap()
                .with_default("VALUE", -11)
                .unwrap(),
        )
    }

    #[test]
    fn test_row_defaults() {
        let row = schema().make_row();
        assert_eq!(row.get("ID"), Some(&CellValue::Empty));
        assert_eq!(row.get("NAME"), Some(&CellValue::Empty));
        assert_eq!(row.get("VALUE"), Some(&CellValue::Int(-11)));
    }

    #[test]
    fn test_set_and_get() {
        let mut row = schema().make_row();
        row.set("id", 2).unwrap();
        row.set("NAME", "ABC").unwrap();
        assert_eq!(row.get("ID"), Some(&CellValue::Int(2)));
        assert_eq!(row.get("name"), Some(&CellValue::Text("ABC".to_string())));
    }

    #[test]
    fn test_set_unknown_column() {
        let mut row = schema().make_row();
        let result = row.set("MISSING", 1);
        assert!(matches!(result, Err(SchemaError::UnknownColumn(_, _))));
    }

    #[test]
    fn test_key_projection() {
        let mut row = schema().make_row();
        row.set("ID", 2).unwrap();
        assert_eq!(row.key(), vec!["2".to_string()]);
    }
}
