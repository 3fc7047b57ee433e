//! Block tokenizer
//!
//! Walks a window left to right. At each offset the block patterns are tried
//! in catalog order, anchored at that offset, and the first match becomes a
//! span. Matches may cover several lines; the line/column cursor is advanced
//! by counting the embedded newlines and the span end is translated through
//! the host's line/column mapping.

use crate::source::TextSource;

use super::cache::Span;
use super::catalog::TokenCatalog;

/// Where a pass starts: an existing span boundary or the document start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Anchor {
    pub fn at(source: &dyn TextSource, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let (line, col) = source.line_of_offset(offset);
        Self { offset, line, col }
    }
}

/// Result of one block pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPass {
    /// Gap-free, ascending spans starting at the anchor
    pub spans: Vec<Span>,
    /// Absolute offset where the pass stopped
    pub end: usize,
    /// Bytes of the input text that were consumed
    pub consumed: usize,
    /// False when no pattern matched before the pass was done
    pub complete: bool,
}

pub struct BlockTokenizer<'a> {
    catalog: &'a TokenCatalog,
}

impl<'a> BlockTokenizer<'a> {
    pub fn new(catalog: &'a TokenCatalog) -> Self {
        Self { catalog }
    }

    /// Tokenize all of `text`, which must be the document text starting at
    /// `anchor`.
    ///
    /// Never loops: every accepted span has positive length. If nothing
    /// matches (not even a fallback) the pass stops and the tail stays
    /// unstyled.
    pub fn tokenize(&self, text: &str, anchor: Anchor, source: &dyn TextSource) -> BlockPass {
        self.tokenize_until(text, anchor, source, |_| false)
    }

    /// Like [`tokenize`](Self::tokenize), but `stop` is asked at every line
    /// start reached after the first token and ends the pass there when it
    /// returns true.
    ///
    /// `text` should run to the end of the document so that patterns ending
    /// in `\z` only match at the real document end.
    pub fn tokenize_until(
        &self,
        text: &str,
        anchor: Anchor,
        source: &dyn TextSource,
        mut stop: impl FnMut(usize) -> bool,
    ) -> BlockPass {
        let mut spans = Vec::new();
        let mut pos = 0;
        let mut offset = anchor.offset;
        let mut line = anchor.line;
        let mut col = anchor.col;

        let mut stopped = false;

        while pos < text.len() {
            if pos > 0 && col == 0 && stop(offset) {
                stopped = true;
                break;
            }

            let rest = &text[pos..];
            let at_line_start = col == 0;

            let Some((pattern, len)) = self
                .catalog
                .block_patterns()
                .iter()
                .find_map(|p| p.match_len(rest, at_line_start).map(|len| (p, len)))
            else {
                tracing::warn!(
                    "No block pattern matched at offset {} (line {}), leaving {} bytes unstyled",
                    offset,
                    line,
                    text.len() - pos
                );
                break;
            };

            let matched = &rest[..len];
            match matched.rfind('\n') {
                Some(last) => {
                    line += matched.bytes().filter(|&b| b == b'\n').count();
                    col = len - last - 1;
                }
                None => col += len,
            }

            let end = source.offset_of_line_col(line, col);
            if end <= offset {
                tracing::error!(
                    "Non-positive span length for '{}' at offset {} (end {}), stopping pass",
                    pattern.name,
                    offset,
                    end
                );
                debug_assert!(end > offset, "span must have positive length");
                break;
            }

            tracing::trace!(
                "{} at {}..{} (line {}, col {})",
                pattern.name,
                offset,
                end,
                line,
                col
            );

            spans.push(Span::new(offset, end - offset, pattern.kind));
            offset = end;
            pos += len;
        }

        BlockPass {
            spans,
            end: offset,
            consumed: pos,
            complete: stopped || pos == text.len(),
        }
    }
}
