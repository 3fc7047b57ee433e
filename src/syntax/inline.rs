//! Inline tokenizer
//!
//! Runs every inline pattern over each physical line of a block-tokenized
//! window. Patterns paint a per-byte buffer in declaration order, so a later
//! pattern overwrites an earlier one where they overlap. The painted buffer is
//! then run-length encoded into overlay spans.
//!
//! Overlays never change block boundaries. Lines that begin inside a literal
//! block get no overlays.

use super::cache::Span;
use super::catalog::TokenCatalog;
use super::kinds::TokenKind;

pub struct InlineTokenizer<'a> {
    catalog: &'a TokenCatalog,
}

impl<'a> InlineTokenizer<'a> {
    pub fn new(catalog: &'a TokenCatalog) -> Self {
        Self { catalog }
    }

    /// Overlay spans for `text`, which starts at absolute offset `base` and is
    /// covered by `blocks`. Text past the last block is ignored.
    pub fn overlay(&self, text: &str, base: usize, blocks: &[Span]) -> Vec<Span> {
        let covered = blocks
            .last()
            .map(|last| last.end().saturating_sub(base).min(text.len()))
            .unwrap_or(0);

        let mut overlays = Vec::new();
        let mut line_start = 0;
        for line in text[..covered].split_inclusive('\n') {
            let offset = base + line_start;
            line_start += line.len();

            if is_literal_line(blocks, offset) {
                continue;
            }
            self.overlay_line(line, offset, &mut overlays);
        }

        tracing::trace!(
            "Inline pass over {}..{}: {} overlays",
            base,
            base + covered,
            overlays.len()
        );
        overlays
    }

    /// Overlay spans for one line (including its trailing newline, if any)
    pub fn overlay_line(&self, line: &str, offset: usize, out: &mut Vec<Span>) {
        let mut paint: Vec<Option<TokenKind>> = vec![None; line.len()];
        let mut painted = false;

        for pattern in self.catalog.inline_patterns() {
            for range in pattern.find_ranges(line) {
                paint[range].fill(Some(pattern.kind));
                painted = true;
            }
        }
        if !painted {
            return;
        }

        let mut run: Option<(usize, TokenKind)> = None;
        for (i, slot) in paint.iter().enumerate() {
            match (run, *slot) {
                (Some((_, kind)), Some(next)) if kind == next => {}
                (current, next) => {
                    if let Some((start, kind)) = current {
                        out.push(Span::new(offset + start, i - start, kind));
                    }
                    run = next.map(|kind| (i, kind));
                }
            }
        }
        if let Some((start, kind)) = run {
            out.push(Span::new(offset + start, line.len() - start, kind));
        }
    }
}

fn is_literal_line(blocks: &[Span], offset: usize) -> bool {
    let idx = blocks.partition_point(|span| span.start <= offset);
    idx > 0 && {
        let block = &blocks[idx - 1];
        block.kind == TokenKind::LiteralBlock && offset < block.end()
    }
}
