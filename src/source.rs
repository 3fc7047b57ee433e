//! Host collaborators: read-only text access and style painting
//!
//! The lexer never owns document text. It reads through [`TextSource`] and
//! reports styling through [`StyleSink`]. [`RopeSource`] and [`StyleRecorder`]
//! are the bundled implementations used by the CLI, tests and benches.

use std::ops::Range;

use ropey::Rope;

use crate::syntax::{Span, TextEdit, TokenKind};

/// Read-only view of the document being lexed. Offsets and columns are bytes.
pub trait TextSource {
    /// Text of the byte range, clamped to the document
    fn text(&self, range: Range<usize>) -> String;

    /// Zero-based (line, column) of a byte offset
    fn line_of_offset(&self, offset: usize) -> (usize, usize);

    /// Byte offset of a (line, column) position, clamped to the document
    fn offset_of_line_col(&self, line: usize, col: usize) -> usize;

    /// Document length in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiver of styling decisions, painted as runs from a movable cursor
pub trait StyleSink {
    /// Move the paint cursor to an absolute offset
    fn begin_styling(&mut self, offset: usize);

    /// Paint `len` bytes from the cursor and advance it
    fn apply_style(&mut self, len: usize, kind: TokenKind);
}

/// [`TextSource`] over a ropey rope
#[derive(Debug, Clone, Default)]
pub struct RopeSource {
    rope: Rope,
}

impl RopeSource {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Insert text at a byte offset and describe the edit
    pub fn insert(&mut self, offset: usize, text: &str) -> TextEdit {
        let offset = offset.min(self.rope.len_bytes());
        let char_idx = self.rope.byte_to_char(offset);
        self.rope.insert(char_idx, text);
        TextEdit::insert(offset, text.len())
    }

    /// Remove a byte range and describe the edit
    pub fn delete(&mut self, range: Range<usize>) -> TextEdit {
        let len = self.rope.len_bytes();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        self.rope.remove(start_char..end_char);
        TextEdit::delete(start, end - start)
    }

    /// Replace a byte range with new text and describe the edit
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> TextEdit {
        let removed = self.delete(range);
        self.insert(removed.start, text);
        TextEdit::replace(removed.start, removed.old_end - removed.start, text.len())
    }
}

impl From<&str> for RopeSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl TextSource for RopeSource {
    fn text(&self, range: Range<usize>) -> String {
        let len = self.rope.len_bytes();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        self.rope.slice(start_char..end_char).to_string()
    }

    fn line_of_offset(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.rope.len_bytes());
        let line = self.rope.byte_to_line(offset);
        (line, offset - self.rope.line_to_byte(line))
    }

    fn offset_of_line_col(&self, line: usize, col: usize) -> usize {
        let len = self.rope.len_bytes();
        if line >= self.rope.len_lines() {
            return len;
        }
        (self.rope.line_to_byte(line) + col).min(len)
    }

    fn len(&self) -> usize {
        self.rope.len_bytes()
    }
}

/// [`StyleSink`] that records every painted run
#[derive(Debug, Clone, Default)]
pub struct StyleRecorder {
    cursor: usize,
    runs: Vec<Span>,
    begins: usize,
}

impl StyleRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs in the order they were painted
    pub fn runs(&self) -> &[Span] {
        &self.runs
    }

    /// Number of `begin_styling` calls received
    pub fn begin_count(&self) -> usize {
        self.begins
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
        self.runs.clear();
        self.begins = 0;
    }
}

impl StyleSink for StyleRecorder {
    fn begin_styling(&mut self, offset: usize) {
        self.cursor = offset;
        self.begins += 1;
    }

    fn apply_style(&mut self, len: usize, kind: TokenKind) {
        self.runs.push(Span::new(self.cursor, len, kind));
        self.cursor += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_round_trip() {
        let source = RopeSource::new("ab\ncdé\n\nx");
        for offset in [0, 1, 3, 5, 8, 9] {
            let (line, col) = source.line_of_offset(offset);
            assert_eq!(source.offset_of_line_col(line, col), offset);
        }
        assert_eq!(source.line_of_offset(4), (1, 1));
        assert_eq!(source.line_of_offset(9), (3, 0));
    }

    #[test]
    fn test_only_line_feed_breaks_lines() {
        let source = RopeSource::new("a\rb\u{85}c\nd");
        assert_eq!(source.line_of_offset(5), (0, 5));
        assert_eq!(source.line_of_offset(7), (1, 0));
    }

    #[test]
    fn test_offsets_clamped() {
        let source = RopeSource::new("abc\n");
        assert_eq!(source.offset_of_line_col(10, 0), 4);
        assert_eq!(source.offset_of_line_col(0, 99), 4);
        assert_eq!(source.text(2..100), "c\n");
        assert_eq!(source.text(7..9), "");
    }

    #[test]
    fn test_edits_report_byte_ranges() {
        let mut source = RopeSource::new("hello world");
        let edit = source.insert(5, ",");
        assert_eq!(edit, TextEdit::insert(5, 1));
        assert_eq!(source.text(0..source.len()), "hello, world");

        let edit = source.replace(0..5, "goodbye");
        assert_eq!(edit, TextEdit::replace(0, 5, 7));
        assert_eq!(source.text(0..source.len()), "goodbye, world");

        let edit = source.delete(7..8);
        assert_eq!(edit, TextEdit::delete(7, 1));
        assert_eq!(source.text(0..source.len()), "goodbye world");
    }

    #[test]
    fn test_recorder_advances_cursor() {
        let mut sink = StyleRecorder::new();
        sink.begin_styling(4);
        sink.apply_style(2, TokenKind::String);
        sink.apply_style(1, TokenKind::Newline);
        assert_eq!(
            sink.runs(),
            &[
                Span::new(4, 2, TokenKind::String),
                Span::new(6, 1, TokenKind::Newline)
            ]
        );
        assert_eq!(sink.begin_count(), 1);
    }
}
