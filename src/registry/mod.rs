//! Table registry
//!
//! Maps a table's format code to its registered schema, so that sections in
//! a transfer file can be resolved to the right table shape while reading.
//! The registry is built explicitly during program initialization and passed
//! by reference into the read path; it is never ambient global state.

use crate::models::TableSchema;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Catalog of registered table schemas, keyed by format code
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    schemas: HashMap<String, Arc<TableSchema>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with the mandatory version-header schema.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(crate::document::version_schema());
        registry
    }

    /// Register a schema under its format code. Registering the same code
    /// again replaces the earlier schema (last write wins).
    pub fn register(&mut self, schema: TableSchema) -> Arc<TableSchema> {
        let schema = Arc::new(schema);
        debug!(code = schema.code(), "registering table schema");
        self.schemas
            .insert(schema.code().to_uppercase(), schema.clone());
        schema
    }

    /// Resolve a format code to its registered schema.
    pub fn resolve(&self, code: &str) -> Option<&Arc<TableSchema>> {
        self.schemas.get(&code.to_uppercase())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
