//! Mapping between byte offsets and 1-based line/column positions.
//!
//! Columns count characters, not bytes. Offsets that do not fall inside the
//! text map to the `(0, 0)` sentinel instead of failing.

/// Sentinel returned for offsets outside the text.
pub const UNKNOWN_POSITION: (usize, usize) = (0, 0);

/// Maps `offset` to a 1-based `(line, column)` pair.
///
/// Offset `text.len()` (just past the last character) is a valid cursor
/// position. Negative offsets and offsets beyond the end return
/// [`UNKNOWN_POSITION`].
///
/// ```
/// # use pipegraph_parser::locate::find_line_and_column;
/// let text = "a: 1\nb: 2\n";
/// assert_eq!(find_line_and_column(text, 0), (1, 1));
/// assert_eq!(find_line_and_column(text, 5), (2, 1));
/// assert_eq!(find_line_and_column(text, -1), (0, 0));
/// ```
pub fn find_line_and_column(text: &str, offset: i64) -> (usize, usize) {
    let Ok(offset) = usize::try_from(offset) else {
        return UNKNOWN_POSITION;
    };
    LineIndex::new(text).position(offset)
}

/// Precomputed line starts for repeated lookups in the same text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based `(line, column)` of a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        if offset > self.text.len() {
            return UNKNOWN_POSITION;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = count_chars(&self.text.as_bytes()[line_start..offset]) + 1;
        (line + 1, column)
    }

    /// Byte offset of a 1-based `(line, column)` position.
    ///
    /// Columns past the end of the line clamp to the line end.
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line - 1)?;
        let end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        let line_text = &self.text[start..end];

        let offset = line_text
            .char_indices()
            .nth(column - 1)
            .map_or(end, |(i, _)| start + i);
        Some(offset)
    }
}

/// Number of characters starting in `bytes` (UTF-8 continuation bytes are skipped).
fn count_chars(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}
