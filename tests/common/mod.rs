//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use rstlex::syntax::TokenCatalog;
use rstlex::{RopeSource, RstLexer, Span, StyleRecorder, TextSource, TokenKind};

pub const SAMPLE: &str = include_str!("../../samples/sample.rst");

/// Lexer, source and sink after a full pass over `text`
pub struct Lexed {
    pub lexer: RstLexer,
    pub source: RopeSource,
    pub sink: StyleRecorder,
}

impl Lexed {
    pub fn text(&self) -> String {
        self.source.text(0..self.source.len())
    }

    pub fn spans(&self) -> Vec<Span> {
        self.lexer.cache().spans()
    }

    pub fn overlays(&self) -> Vec<Span> {
        self.lexer.cache().overlays()
    }

    /// Block span containing the first occurrence of `needle`
    pub fn block_of(&self, needle: &str) -> Span {
        let text = self.text();
        let offset = text
            .find(needle)
            .unwrap_or_else(|| panic!("{:?} not in document", needle));
        self.lexer
            .cache()
            .block_at(offset)
            .unwrap_or_else(|| panic!("no block span at {:?}", needle))
    }

    /// Overlay covering exactly `needle`, if any
    pub fn overlay_of(&self, needle: &str) -> Option<TokenKind> {
        let text = self.text();
        let start = text.find(needle)?;
        self.overlays()
            .into_iter()
            .find(|o| o.start == start && o.len == needle.len())
            .map(|o| o.kind)
    }
}

/// Full lex with the default catalog
pub fn lex(text: &str) -> Lexed {
    lex_with(RstLexer::new().unwrap(), text)
}

/// Full lex with a custom directive set
pub fn lex_with_directives(directives: &[&str], text: &str) -> Lexed {
    let catalog = TokenCatalog::with_directives(directives).unwrap();
    lex_with(RstLexer::with_catalog(catalog), text)
}

pub fn lex_with(mut lexer: RstLexer, text: &str) -> Lexed {
    let source = RopeSource::new(text);
    let mut sink = StyleRecorder::new();
    lexer.relex_all(&source, &mut sink);
    Lexed {
        lexer,
        source,
        sink,
    }
}

pub fn kinds(spans: &[Span]) -> Vec<TokenKind> {
    spans.iter().map(|s| s.kind).collect()
}

/// Spans are ascending, positive and cover `[start, end)` with no gaps
pub fn assert_partition(spans: &[Span], start: usize, end: usize) {
    let mut cursor = start;
    for span in spans {
        assert!(span.len > 0, "empty span {:?}", span);
        assert_eq!(span.start, cursor, "gap or overlap at {:?}", span);
        cursor = span.end();
    }
    assert_eq!(cursor, end, "spans end at {} instead of {}", cursor, end);
}
