//! Models module for the SDK
//!
//! Core data structures of the tabular engine: cell values, schemas with
//! typed rows, and tables with primary-key enforcement.

pub mod row;
pub mod schema;
pub mod table;
pub mod value;

pub use row::Row;
pub use schema::{transliterate, ColumnDef, SchemaError, TableSchema, UnitConverter};
pub use table::{Table, TableError, TableMode};
pub use value::CellValue;
