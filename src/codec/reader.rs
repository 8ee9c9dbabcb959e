//! Block reader
//!
//! Two-pass, random-access read strategy. The format carries no section
//! lengths, so a first linear scan records the byte range of every section
//! body while parsing only the header lines. A second pass then seeks to
//! each recorded range and bulk-parses it with the column order the header
//! declared. Large uniform sections (full matrices) are parsed from one
//! contiguous buffer instead of line by line.

use super::{decode_latin1, FormatError, VISION_MARKER};
use crate::catalog::AttributeCatalog;
use crate::models::{CellValue, Table, TableMode};
use crate::registry::TableRegistry;
use std::collections::HashSet;
use std::io::{BufRead, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Byte range and declared shape of one section, recorded during the scan
/// pass
#[derive(Debug, Clone)]
pub struct SectionIndex {
    /// In-memory table name; duplicate codes get `_1`, `_2`... suffixes
    pub name: String,
    pub code: String,
    pub mode: TableMode,
    /// Column order declared by the header line
    pub columns: Vec<String>,
    /// Offset of the first body byte (right after the header line)
    pub start: u64,
    /// Offset one past the last body byte
    pub end: u64,
}

/// Scan a transfer stream for section boundaries.
///
/// Fails fast if the first line is not the `$VISION` marker. Every further
/// `$` line closes the previous section at the offset before the line and
/// opens a new one right after it.
pub fn scan_sections<R: BufRead>(input: &mut R) -> Result<Vec<SectionIndex>, FormatError> {
    let mut buf = Vec::new();
    let mut offset = input.read_until(b'\n', &mut buf)? as u64;
    if decode_latin1(&buf).trim() != VISION_MARKER {
        return Err(FormatError::MissingVisionMarker);
    }

    let mut sections: Vec<SectionIndex> = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    loop {
        buf.clear();
        let consumed = input.read_until(b'\n', &mut buf)?;
        if consumed == 0 {
            break;
        }
        let line_start = offset;
        offset += consumed as u64;

        let line = decode_latin1(&buf);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('$') {
            if let Some(open) = sections.last_mut() {
                open.end = line_start;
            }
            let (mode, code, columns) = parse_header(header)
                .ok_or_else(|| FormatError::MalformedHeader(trimmed.to_string()))?;

            let mut name = code.clone();
            let mut suffix = 1;
            while names.contains(&name) {
                name = format!("{code}_{suffix}");
                suffix += 1;
            }
            names.insert(name.clone());

            sections.push(SectionIndex {
                name,
                code,
                mode,
                columns,
                start: offset,
                end: offset,
            });
        }
    }
    if let Some(open) = sections.last_mut() {
        open.end = offset;
    }
    Ok(sections)
}

/// Split a header line (without the `$`) into mode tag, format code and
/// column list.
fn parse_header(header: &str) -> Option<(TableMode, String, Vec<String>)> {
    let (head, cols) = header.split_once(':')?;
    let mut chars = head.chars();
    let first = chars.next()?;
    let (mode, code) = match TableMode::from_tag(first) {
        Some(mode) => (mode, chars.as_str()),
        None => (TableMode::None, head),
    };
    if code.is_empty() {
        return None;
    }
    let columns = cols
        .split(';')
        .map(|c| c.trim().to_string())
        .collect::<Vec<_>>();
    Some((mode, code.to_uppercase(), columns))
}

/// Bulk-parse one section's byte range into a table.
///
/// The registry resolves the section code to its registered schema, which is
/// then reordered to the header's declared column order. When a catalog is
/// supplied, its boolean typing is applied so that 0/1 fields come back as
/// boolean values.
pub fn parse_section<R: Read + Seek>(
    input: &mut R,
    section: &SectionIndex,
    registry: &TableRegistry,
    catalog: Option<&AttributeCatalog>,
) -> Result<Table, FormatError> {
    let registered = registry
        .resolve(&section.code)
        .ok_or_else(|| FormatError::UnknownSectionCode(section.code.clone()))?;
    let schema = Arc::new(registered.reordered(&section.columns)?);

    let boolean_columns: Vec<bool> = schema
        .columns()
        .iter()
        .map(|col| {
            catalog.is_some_and(|c| c.is_boolean(schema.display_name(), &col.name))
        })
        .collect();

    input.seek(SeekFrom::Start(section.start))?;
    let mut body = vec![0u8; (section.end - section.start) as usize];
    input.read_exact(&mut body)?;
    let text = decode_latin1(&body);

    let mut table = Table::with_mode(schema.clone(), section.mode);
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('*') {
            continue;
        }
        let mut row = schema.clone().make_row();
        let mut fields = line.split(';');
        for (pos, col) in schema.columns().iter().enumerate() {
            let raw = fields.next().unwrap_or("");
            let value = if raw.trim().is_empty() {
                // absent fields take the schema default
                col.default.clone()
            } else if let Some(conv) = &col.converter {
                conv.parse(raw)
            } else if boolean_columns[pos] {
                match CellValue::parse(raw).as_f64() {
                    Some(f) => CellValue::Bool(f != 0.0),
                    None => CellValue::parse(raw),
                }
            } else {
                CellValue::parse(raw)
            };
            row.set_at(pos, value);
        }
        rows.push(row);
    }
    table.add_rows(rows)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableSchema;
    use std::io::Cursor;

    const SAMPLE: &str = "$VISION\n\
        * author\n\
        * 2026-03-01\n\
        *\n\
        $VERSION:VERSNR;FILETYPE;LANGUAGE;UNIT\n\
        10;Trans;DEU;KM\n\
        \n\
        *\n\
        * Table: Zones\n\
        *\n\
        $+BEZIRK:NO;NAME\n\
        2;A-Stadt\n\
        4;B-Dorf\n\
        \n";

    fn registry() -> TableRegistry {
        let mut registry = TableRegistry::with_builtins();
        registry.register(TableSchema::define("BEZIRK", "Zones", &["NO", "NAME"]).unwrap());
        registry
    }

    #[test]
    fn test_scan_records_boundaries() {
        let mut input = Cursor::new(SAMPLE.as_bytes());
        let sections = scan_sections(&mut input).unwrap();
        assert_eq!(sections.len(), 2);

        let version = &sections[0];
        assert_eq!(version.code, "VERSION");
        assert_eq!(version.mode, TableMode::None);
        assert_eq!(version.columns, ["VERSNR", "FILETYPE", "LANGUAGE", "UNIT"]);

        let zones = &sections[1];
        assert_eq!(zones.code, "BEZIRK");
        assert_eq!(zones.mode, TableMode::Insert);
        let body = &SAMPLE.as_bytes()[zones.start as usize..zones.end as usize];
        assert_eq!(std::str::from_utf8(body).unwrap(), "2;A-Stadt\n4;B-Dorf\n\n");
    }

    #[test]
    fn test_scan_requires_vision_marker() {
        let mut input = Cursor::new(b"$NOTVISION\n$+BEZIRK:NO\n".as_slice());
        assert!(matches!(
            scan_sections(&mut input),
            Err(FormatError::MissingVisionMarker)
        ));
    }

    #[test]
    fn test_malformed_header() {
        let mut input = Cursor::new(b"$VISION\n$BROKENHEADER\n".as_slice());
        assert!(matches!(
            scan_sections(&mut input),
            Err(FormatError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_duplicate_codes_get_suffixed_names() {
        let text = "$VISION\n$+FOO:A;B\n1;2\n\n$*FOO:A;B\n3;4\n\n";
        let mut input = Cursor::new(text.as_bytes());
        let sections = scan_sections(&mut input).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "FOO");
        assert_eq!(sections[0].mode, TableMode::Insert);
        assert_eq!(sections[1].name, "FOO_1");
        assert_eq!(sections[1].mode, TableMode::Update);
        assert_eq!(sections[1].code, "FOO");
    }

    #[test]
    fn test_parse_section() {
        let mut input = Cursor::new(SAMPLE.as_bytes());
        let sections = scan_sections(&mut input).unwrap();
        let registry = registry();
        let zones = parse_section(&mut input, &sections[1], &registry, None).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones.mode(), TableMode::Insert);
        assert_eq!(zones.rows()[0].get("NO"), Some(&CellValue::Int(2)));
        assert_eq!(
            zones.rows()[1].get("NAME"),
            Some(&CellValue::Text("B-Dorf".to_string()))
        );
    }

    #[test]
    fn test_parse_section_unknown_code() {
        let text = "$VISION\n$+NOSUCH:A\n1\n";
        let mut input = Cursor::new(text.as_bytes());
        let sections = scan_sections(&mut input).unwrap();
        let registry = registry();
        assert!(matches!(
            parse_section(&mut input, &sections[0], &registry, None),
            Err(FormatError::UnknownSectionCode(_))
        ));
    }

    #[test]
    fn test_header_column_order_drives_parsing() {
        // same table, reversed column order in the header
        let text = "$VISION\n$+BEZIRK:NAME;NO\nA-Stadt;2\n";
        let mut input = Cursor::new(text.as_bytes());
        let sections = scan_sections(&mut input).unwrap();
        let registry = registry();
        let zones = parse_section(&mut input, &sections[0], &registry, None).unwrap();
        assert_eq!(zones.rows()[0].get("NO"), Some(&CellValue::Int(2)));
        assert_eq!(
            zones.rows()[0].get("NAME"),
            Some(&CellValue::Text("A-Stadt".to_string()))
        );
    }
}
