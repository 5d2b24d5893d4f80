//! Source documents and LSP position arithmetic
//!
//! Positions follow the LSP convention: zero-based lines and UTF-16 code unit
//! columns. [`LineIndex`] converts between those and byte offsets into the
//! document text.

use crate::error::{Error, Result};
use lsp_types::{Position, Range, Uri};
use std::path::{Path, PathBuf};
use url::Url;

/// An opened source document
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    uri: Uri,
    text: String,
    lines: LineIndex,
}

impl Document {
    /// Builds a document from an absolute or relative path and its text
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let uri = path_to_uri(&path)?;
        let lines = LineIndex::new(&text);
        Ok(Self {
            path,
            uri,
            text,
            lines,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Text covered by `range`, or `None` when the range lies outside the document
    pub fn slice(&self, range: &Range) -> Option<&str> {
        let start = self.lines.offset(&self.text, range.start)?;
        let end = self.lines.offset(&self.text, range.end)?;
        self.text.get(start..end.max(start))
    }
}

/// Byte offsets of line starts within a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of `position` in `text`
    ///
    /// Columns past the end of a line clamp to the line end, matching how
    /// editors treat out-of-range columns.
    pub fn offset(&self, text: &str, position: Position) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .map_or(text.len(), |next| next - 1);
        let line = text.get(line_start..line_end)?;

        let mut units = 0u32;
        for (i, c) in line.char_indices() {
            if units >= position.character {
                return Some(line_start + i);
            }
            units += c.len_utf16() as u32;
        }
        Some(line_end)
    }

    /// LSP position of byte `offset` in `text`
    pub fn position(&self, text: &str, offset: usize) -> Option<Position> {
        if offset > text.len() {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let character = text
            .get(line_start..offset)?
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        Some(Position::new(line as u32, character))
    }
}

/// Whether `position` lies within `range` (end exclusive)
pub fn range_contains_position(range: &Range, position: Position) -> bool {
    position >= range.start && position < range.end
}

/// Whether `outer` fully covers `inner`
pub fn range_contains_range(outer: &Range, inner: &Range) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Whether two ranges share any position
pub fn ranges_overlap(a: &Range, b: &Range) -> bool {
    a.start < b.end && b.start < a.end
}

/// Convert a file path to a `file://` URI
///
/// Relative paths are taken from the current directory.
pub fn path_to_uri(path: &Path) -> Result<Uri> {
    let abs_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let url = Url::from_file_path(&abs_path).map_err(|()| {
        Error::invalid_input(format!("Cannot express {} as a URI", abs_path.display()))
    })?;
    url.as_str()
        .parse()
        .map_err(|e| Error::invalid_input(format!("Invalid URI {url}: {e}")))
}

/// Convert a `file://` URI to a file path, percent-decoding it
pub fn uri_to_path(uri: &Uri) -> Result<PathBuf> {
    let uri_str = uri.as_str();
    Url::parse(uri_str)
        .map_err(|e| Error::invalid_input(format!("Invalid URI {uri_str}: {e}")))?
        .to_file_path()
        .map_err(|()| Error::invalid_input(format!("Not a file URI: {uri_str}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "package p;\n\nclass A {\n    void foo() { bar(); }\n}\n";

    #[test]
    fn test_offset_and_position_agree() {
        let index = LineIndex::new(SOURCE);
        let offset = SOURCE.find("bar").unwrap();
        let position = index.position(SOURCE, offset).unwrap();

        assert_eq!(position, Position::new(3, 17));
        assert_eq!(index.offset(SOURCE, position), Some(offset));
    }

    #[test]
    fn test_offset_counts_utf16_units() {
        let text = "s = \"\u{1F600}\"; call();\n";
        let index = LineIndex::new(text);
        // The emoji is two UTF-16 units but four bytes
        let call_col = text[..text.find("call").unwrap()]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum::<u32>();
        assert_eq!(
            index.offset(text, Position::new(0, call_col)),
            text.find("call")
        );
    }

    #[test]
    fn test_offset_clamps_column_and_rejects_missing_line() {
        let index = LineIndex::new(SOURCE);
        assert_eq!(index.offset(SOURCE, Position::new(0, 500)), Some(10));
        assert_eq!(index.offset(SOURCE, Position::new(99, 0)), None);
    }

    #[test]
    fn test_document_slice() {
        let doc = Document::new("/w/A.java", SOURCE).unwrap();
        let range = Range::new(Position::new(3, 4), Position::new(3, 25));
        assert_eq!(doc.slice(&range), Some("void foo() { bar(); }"));
    }

    #[test]
    fn test_range_predicates() {
        let outer = Range::new(Position::new(2, 0), Position::new(4, 1));
        let inner = Range::new(Position::new(3, 4), Position::new(3, 25));
        assert!(range_contains_range(&outer, &inner));
        assert!(!range_contains_range(&inner, &outer));
        assert!(range_contains_position(&outer, Position::new(3, 0)));
        assert!(!range_contains_position(&outer, Position::new(4, 1)));
        assert!(ranges_overlap(&outer, &inner));
    }

    #[test]
    fn test_uri_round_trip_with_space() {
        let path = PathBuf::from("/tmp/my project/A.java");
        let uri = path_to_uri(&path).unwrap();
        assert_eq!(uri.as_str(), "file:///tmp/my%20project/A.java");
        assert_eq!(uri_to_path(&uri).unwrap(), path);
    }

    #[test]
    fn test_uri_to_path_decodes_non_ascii() {
        let uri: Uri = "file:///w/caf%C3%A9/A%2BB.java".parse().unwrap();
        assert_eq!(
            uri_to_path(&uri).unwrap(),
            PathBuf::from("/w/caf\u{e9}/A+B.java")
        );
    }

    #[test]
    fn test_uri_to_path_rejects_non_file() {
        let uri: Uri = "https://example.com/A.java".parse().unwrap();
        assert!(uri_to_path(&uri).is_err());
    }
}
