//! Demand Modelling SDK - tabular-entity and transfer-file engine
//!
//! Provides the reusable core underneath transfer-file generation for a
//! transportation-demand modelling application:
//! - Schema/row/table model with primary-key enforcement
//! - Attribute-catalog adapter for type-aware serialization
//! - Category-based sequential identifier allocation
//! - Block-structured text codec (write and two-pass random-access read)
//! - Transfer documents orchestrating whole-file write/append/read

pub mod allocator;
pub mod catalog;
pub mod codec;
pub mod document;
pub mod models;
pub mod registry;

// Re-export commonly used types
pub use allocator::{AllocatorError, CategoryAllocator};
pub use catalog::{AttributeCatalog, CatalogError};
pub use codec::{BlockWriter, FormatError, SectionIndex};
pub use document::{version_schema, version_table, ReadOptions, TransferDocument};
pub use models::{
    CellValue, ColumnDef, Row, SchemaError, Table, TableError, TableMode, TableSchema,
    UnitConverter,
};
pub use registry::TableRegistry;
