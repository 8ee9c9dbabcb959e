//! Attribute catalog adapter
//!
//! Wraps the externally supplied table/attribute metadata and answers the two
//! questions serialization needs: the canonical external name of a table, and
//! whether a column is boolean-typed. The catalog is read-only; it is built
//! once from the external metadata source and then only queried.

use std::collections::HashMap;

/// Error during catalog lookup
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Table '{0}' not in the attribute catalog")]
    UnknownTable(String),
}

/// Read-only table/attribute metadata
///
/// Two lookup tables: display name -> canonical external table identifier,
/// and (external identifier, column) -> value type. Only the `bool` value
/// type is consumed here; everything else is opaque.
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    tables: HashMap<String, String>,
    value_types: HashMap<(String, String), String>,
}

impl AttributeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-seeded with the mandatory version-header table, which
    /// every transfer file carries.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.insert_table(crate::document::VERSION_DISPLAY_NAME, "Version");
        catalog
    }

    /// Register a table's canonical external identifier.
    pub fn insert_table(&mut self, display_name: impl Into<String>, external_id: impl Into<String>) {
        self.tables.insert(display_name.into(), external_id.into());
    }

    /// Register the value type of one attribute. Column names are matched
    /// case-insensitively.
    pub fn insert_attribute(
        &mut self,
        external_id: impl Into<String>,
        column: &str,
        value_type: impl Into<String>,
    ) {
        self.value_types
            .insert((external_id.into(), column.to_uppercase()), value_type.into());
    }

    /// Canonical external identifier of a table. A miss is a hard error:
    /// a table the catalog does not recognize cannot be legally named in
    /// the exchange format.
    pub fn resolve_external_name(&self, display_name: &str) -> Result<&str, CatalogError> {
        self.tables
            .get(display_name)
            .map(String::as_str)
            .ok_or_else(|| CatalogError::UnknownTable(display_name.to_string()))
    }

    /// Whether a column is boolean-typed. Unknown tables and columns yield
    /// `false`: most columns carry no type metadata and absence is the
    /// common case, not a failure.
    pub fn is_boolean(&self, display_name: &str, column: &str) -> bool {
        let Ok(external) = self.resolve_external_name(display_name) else {
            return false;
        };
        self.value_types
            .get(&(external.to_string(), column.to_uppercase()))
            .is_some_and(|vt| vt == "bool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> AttributeCatalog {
        let mut catalog = AttributeCatalog::new();
        catalog.insert_table("Zones", "Zone");
        catalog.insert_attribute("Zone", "ISCORDON", "bool");
        catalog.insert_attribute("Zone", "TYPNR", "int");
        catalog
    }

    #[test]
    fn test_resolve_external_name() {
        let catalog = catalog();
        assert_eq!(catalog.resolve_external_name("Zones").unwrap(), "Zone");
        assert!(matches!(
            catalog.resolve_external_name("Links"),
            Err(CatalogError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_is_boolean() {
        let catalog = catalog();
        assert!(catalog.is_boolean("Zones", "ISCORDON"));
        assert!(catalog.is_boolean("Zones", "iscordon"));
        assert!(!catalog.is_boolean("Zones", "TYPNR"));
        // unknown columns and tables are not errors
        assert!(!catalog.is_boolean("Zones", "NAME"));
        assert!(!catalog.is_boolean("Links", "ISCORDON"));
    }
}
