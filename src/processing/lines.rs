//! Line indexing over borrowed source text.
//!
//! Line numbers are 1-based and follow `str::lines()` semantics: a trailing
//! newline does not start an extra line, and `\r\n` terminators are not part
//! of a line's text. Slices spanning several lines keep their interior
//! terminators untouched.

/// Byte-offset index of the lines in a piece of source text.
#[derive(Debug, Clone)]
pub struct SourceLines<'a> {
    content: &'a str,
    starts: Vec<usize>,
}

impl<'a> SourceLines<'a> {
    /// Index the lines of `content`.
    pub fn new(content: &'a str) -> Self {
        let mut starts = Vec::new();
        if !content.is_empty() {
            starts.push(0);
            for (idx, byte) in content.bytes().enumerate() {
                if byte == b'\n' && idx + 1 < content.len() {
                    starts.push(idx + 1);
                }
            }
        }
        Self { content, starts }
    }

    /// Total number of lines.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// The underlying text.
    pub fn content(&self) -> &'a str {
        self.content
    }

    /// Text of line `n` without its terminator. Out-of-range lines are empty.
    pub fn line(&self, n: usize) -> &'a str {
        if n == 0 || n > self.len() {
            return "";
        }
        self.slice(n, n)
    }

    /// Whether line `n` contains only whitespace.
    pub fn is_blank(&self, n: usize) -> bool {
        self.line(n).trim().is_empty()
    }

    /// Exact text from the start of line `start` to the end of line `end`,
    /// excluding the final line terminator. Bounds are clamped.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        if self.is_empty() {
            return "";
        }
        let start = start.clamp(1, self.len());
        let end = end.clamp(start, self.len());

        let from = self.starts[start - 1];
        let to = if end < self.len() {
            self.starts[end]
        } else {
            self.content.len()
        };

        let text = &self.content[from..to];
        let text = text.strip_suffix('\n').unwrap_or(text);
        text.strip_suffix('\r').unwrap_or(text)
    }

    /// 1-based line containing byte `offset`. Offsets past the end map to
    /// the last line.
    pub fn line_of_byte(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|&start| start <= offset)
            .max(1)
            .min(self.len().max(1))
    }

    /// Terminator used by the first line: `"\r\n"` or `"\n"`.
    pub fn line_ending(&self) -> &'static str {
        match self.content.find('\n') {
            Some(pos) if self.content[..pos].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    /// Line numbers that contain non-whitespace text.
    pub fn non_blank_lines(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.len()).filter(move |&n| !self.is_blank(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count_matches_str_lines() {
        for text in ["", "a", "a\n", "a\nb", "a\nb\n", "\n", "\n\n", "a\r\nb\r\n"] {
            assert_eq!(
                SourceLines::new(text).len(),
                text.lines().count(),
                "line count mismatch for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_line_text() {
        let lines = SourceLines::new("first\r\nsecond\n\nfourth");
        assert_eq!(lines.line(1), "first");
        assert_eq!(lines.line(2), "second");
        assert_eq!(lines.line(3), "");
        assert_eq!(lines.line(4), "fourth");
        assert_eq!(lines.line(5), "");
        assert!(lines.is_blank(3));
        assert!(!lines.is_blank(4));
    }

    #[test]
    fn test_slice_keeps_interior_terminators() {
        let lines = SourceLines::new("a\r\nb\r\nc\r\n");
        assert_eq!(lines.slice(1, 2), "a\r\nb");
        assert_eq!(lines.slice(2, 3), "b\r\nc");
        assert_eq!(lines.slice(3, 99), "c");
    }

    #[test]
    fn test_line_of_byte() {
        let lines = SourceLines::new("ab\ncd\nef");
        assert_eq!(lines.line_of_byte(0), 1);
        assert_eq!(lines.line_of_byte(2), 1); // the newline itself
        assert_eq!(lines.line_of_byte(3), 2);
        assert_eq!(lines.line_of_byte(7), 3);
        assert_eq!(lines.line_of_byte(100), 3);
    }

    #[test]
    fn test_line_ending() {
        assert_eq!(SourceLines::new("a\r\nb\r\n").line_ending(), "\r\n");
        assert_eq!(SourceLines::new("a\nb").line_ending(), "\n");
        assert_eq!(SourceLines::new("single").line_ending(), "\n");
    }

    #[test]
    fn test_non_blank_lines() {
        let lines = SourceLines::new("x = 1\n\n   \ny = 2\n");
        assert_eq!(lines.non_blank_lines().collect::<Vec<_>>(), vec![1, 4]);
    }
}
