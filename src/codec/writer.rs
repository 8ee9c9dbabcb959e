//! Block writer
//!
//! Serializes tables into the section-delimited text format. Rendering is
//! type-aware: unit-converted columns carry their suffix, and columns the
//! attribute catalog marks boolean are written as 0/1.

use super::{encode_latin1, FormatError, VISION_MARKER};
use crate::catalog::AttributeCatalog;
use crate::models::{CellValue, ColumnDef, Table};
use chrono::NaiveDate;
use std::io::Write;

/// Writer for one open transfer-file stream
pub struct BlockWriter<W: Write> {
    out: W,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn writeln(&mut self, line: &str) -> Result<(), FormatError> {
        self.out.write_all(&encode_latin1(line))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Write the document banner: the `$VISION` marker, author and date
    /// comments, and the two placeholder routing lines.
    pub fn write_banner(&mut self, author: &str, date: NaiveDate) -> Result<(), FormatError> {
        self.writeln(VISION_MARKER)?;
        self.writeln(&format!("* {author}"))?;
        self.writeln(&format!("* {date}"))?;
        self.writeln("* From: *")?;
        self.writeln("* To: *")?;
        Ok(())
    }

    /// Write one table as a complete section: comment banner, section
    /// header, one data line per row, blank separator.
    ///
    /// The catalog must know the table; serializing a table it cannot name
    /// is a configuration error.
    pub fn write_table(
        &mut self,
        table: &Table,
        catalog: &AttributeCatalog,
    ) -> Result<(), FormatError> {
        let schema = table.schema();
        // hard error on an unknown table, before anything is emitted
        catalog.resolve_external_name(schema.display_name())?;

        let boolean_columns: Vec<bool> = schema
            .columns()
            .iter()
            .map(|col| catalog.is_boolean(schema.display_name(), &col.name))
            .collect();

        self.writeln("*")?;
        self.writeln(&format!(
            "* Table: {}{}",
            schema.display_name(),
            table.mode().banner_suffix()
        ))?;
        self.writeln("*")?;

        self.writeln(&format!(
            "${}{}:{}",
            table.mode().tag(),
            schema.code(),
            schema.column_names().join(";")
        ))?;

        for row in table.rows() {
            let fields: Vec<String> = schema
                .columns()
                .iter()
                .zip(row.values())
                .zip(&boolean_columns)
                .map(|((col, value), is_bool)| render_cell(col, value, *is_bool))
                .collect();
            self.writeln(&fields.join(";"))?;
        }
        self.writeln("")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), FormatError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render one cell under the column's unit converter and the catalog's
/// boolean typing. Absent values always render empty.
fn render_cell(col: &ColumnDef, value: &CellValue, is_bool: bool) -> String {
    if let Some(conv) = &col.converter {
        return conv.render(value);
    }
    if is_bool {
        return match value {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => (*b as i64).to_string(),
            other => match other.as_f64() {
                Some(f) => ((f != 0.0) as i64).to_string(),
                None => other.render(),
            },
        };
    }
    value.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TableMode, TableSchema, UnitConverter};
    use std::sync::Arc;

    fn written(table: &Table, catalog: &AttributeCatalog) -> String {
        let mut writer = BlockWriter::new(Vec::new());
        writer.write_table(table, catalog).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn zone_catalog() -> AttributeCatalog {
        let mut catalog = AttributeCatalog::new();
        catalog.insert_table("Zones", "Zone");
        catalog.insert_attribute("Zone", "ISCORDON", "bool");
        catalog
    }

    #[test]
    fn test_section_layout() {
        let schema = Arc::new(
            TableSchema::define("BEZIRK", "Zones", &["NO", "NAME"]).unwrap(),
        );
        let mut table = Table::new(schema);
        let mut row = table.make_row();
        row.set("NO", 2).unwrap();
        row.set("NAME", "A-Stadt").unwrap();
        table.add_row(row).unwrap();

        let text = written(&table, &zone_catalog());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "*");
        assert_eq!(lines[1], "* Table: Zones (inserted)");
        assert_eq!(lines[2], "*");
        assert_eq!(lines[3], "$+BEZIRK:NO;NAME");
        assert_eq!(lines[4], "2;A-Stadt");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn test_mode_tag_in_header() {
        let schema = Arc::new(TableSchema::define("BEZIRK", "Zones", &["NO"]).unwrap());
        let table = Table::with_mode(schema, TableMode::Update);
        let text = written(&table, &zone_catalog());
        assert!(text.contains("$*BEZIRK:NO"));
        assert!(text.contains("* Table: Zones (updated)"));
    }

    #[test]
    fn test_boolean_and_converter_rendering() {
        let schema = Arc::new(
            TableSchema::define("BEZIRK", "Zones", &["NO", "ISCORDON", "LENGTH"])
                .unwrap()
                .with_converter("LENGTH", UnitConverter::new("km"))
                .unwrap(),
        );
        let mut table = Table::new(schema);
        let mut row = table.make_row();
        row.set("NO", 1).unwrap();
        row.set("ISCORDON", true).unwrap();
        row.set("LENGTH", 0.234).unwrap();
        table.add_row(row).unwrap();
        let mut row = table.make_row();
        row.set("NO", 2).unwrap();
        table.add_row(row).unwrap();

        let text = written(&table, &zone_catalog());
        assert!(text.contains("1;1;0.234km"));
        // absent boolean and unit values render empty
        assert!(text.contains("2;;"));
    }

    #[test]
    fn test_unknown_table_is_hard_error() {
        let schema = Arc::new(TableSchema::define("STRECKE", "Links", &["NO"]).unwrap());
        let table = Table::new(schema);
        let mut writer = BlockWriter::new(Vec::new());
        let result = writer.write_table(&table, &zone_catalog());
        assert!(matches!(result, Err(FormatError::Catalog(_))));
    }

    #[test]
    fn test_banner() {
        let mut writer = BlockWriter::new(Vec::new());
        writer
            .write_banner("ACME Modelling", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "$VISION");
        assert_eq!(lines[1], "* ACME Modelling");
        assert_eq!(lines[2], "* 2026-03-01");
        assert_eq!(lines[3], "* From: *");
        assert_eq!(lines[4], "* To: *");
    }
}
