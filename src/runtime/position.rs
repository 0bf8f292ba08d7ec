/// Offset-to-location table for a source text
///
/// Lines are split on `\n` only. Line and column numbers are 0-based here and
/// rendered 1-based by the diagnostics. Columns are byte offsets from the line's start.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,

    /// Offset of the first byte of every line, in ascending order
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Build the line table of a source text
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            source,
            line_starts,
        }
    }

    /// Get the number of lines (an empty source has a single empty line)
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the (line, column) pair of an offset
    ///
    /// Offsets past the end of the source are clamped to the end.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());

        // Greatest line start <= offset
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;

        (line, offset - self.line_starts[line])
    }

    /// Get a line's text, without its line terminator
    pub fn line_text(&self, line: usize) -> &'a str {
        let start = match self.line_starts.get(line) {
            Some(start) => *start,
            None => return "",
        };

        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());

        let text = &self.source[start..end];
        text.strip_suffix('\r').unwrap_or(text)
    }
}

/// Render the three-line diagnostic used for every located message
///
/// ```text
/// <line containing the offset>
/// <spaces up to the column>^
/// [name: ]<line>:<col>: <message>
/// ```
pub fn format_located(source: &str, offset: usize, message: &str, name: Option<&str>) -> String {
    let index = LineIndex::new(source);
    let (line, col) = index.line_col(offset);

    format!(
        "{}\n{}^\n{}{}:{}: {}",
        index.line_text(line),
        " ".repeat(col),
        name.map(|name| format!("{}: ", name)).unwrap_or_default(),
        line + 1,
        col + 1,
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let index = LineIndex::new("abcd");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(0), (0, 0));
        assert_eq!(index.line_col(3), (0, 3));
        assert_eq!(index.line_col(4), (0, 4));
        assert_eq!(index.line_text(0), "abcd");
    }

    #[test]
    fn line_starts_belong_to_their_line() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_col(2), (0, 2));
        assert_eq!(index.line_col(3), (1, 0));
        assert_eq!(index.line_col(6), (2, 0));
        assert_eq!(index.line_col(7), (3, 0));
        assert_eq!(index.line_text(2), "");
        assert_eq!(index.line_text(3), "ef");
    }

    #[test]
    fn clamps_past_end() {
        let index = LineIndex::new("ab\n");
        assert_eq!(index.line_col(40), (1, 0));
    }

    #[test]
    fn strips_carriage_returns() {
        let index = LineIndex::new("ab\r\ncd");
        assert_eq!(index.line_text(0), "ab");
        assert_eq!(index.line_col(4), (1, 0));
    }

    #[test]
    fn formats_with_and_without_name() {
        assert_eq!(
            format_located("xabcd", 0, "Expected abcd", None),
            "xabcd\n^\n1:1: Expected abcd"
        );
        assert_eq!(
            format_located("ab\ncd", 4, "Expected x", Some("g.peg")),
            "cd\n ^\ng.peg: 2:2: Expected x"
        );
    }
}
