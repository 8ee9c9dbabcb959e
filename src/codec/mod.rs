//! Exchange-format codec
//!
//! Low-level writer and reader for the block-structured transfer format:
//! `;`-delimited data lines grouped into sections, each opened by a
//! `$<mode><CODE>:<col1;col2;...>` header, with `*`-prefixed comment lines
//! and blank separators in between. The byte stream is Windows-1252/Latin-1
//! text; the first line of a document is the `$VISION` marker.

pub mod reader;
pub mod writer;

pub use reader::{parse_section, scan_sections, SectionIndex};
pub use writer::BlockWriter;

use crate::catalog::CatalogError;
use crate::models::{SchemaError, TableError};

/// First line every transfer document must carry
pub const VISION_MARKER: &str = "$VISION";

/// Error in the exchange-format read/write path
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Not a transfer file: first line is not '$VISION'")]
    MissingVisionMarker,
    #[error("Malformed section header: '{0}'")]
    MalformedHeader(String),
    #[error("Unknown section code '{0}': no matching schema registered")]
    UnknownSectionCode(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode a Latin-1 byte slice. Every byte maps to the Unicode code point
/// of the same value, so this cannot fail.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// Encode text as Latin-1, replacing characters outside the byte range
/// with `?`.
pub(crate) fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_round_trip() {
        let text = "Straße; Größe";
        let bytes = encode_latin1(text);
        assert_eq!(decode_latin1(&bytes), text);
    }

    #[test]
    fn test_encode_replaces_out_of_range() {
        assert_eq!(encode_latin1("a€b"), b"a?b");
    }
}
