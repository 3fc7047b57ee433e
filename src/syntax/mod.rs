//! reStructuredText syntax highlighting
//!
//! Regex driven, incremental lexing for editor highlighting:
//! - Block tokens: anchored, priority ordered patterns, possibly multi-line
//! - Inline tokens: per-line overlays painted on top of block tokens
//! - A span cache keyed by offset, so an edit only re-lexes a widened window
//!
//! ## Architecture
//!
//! ```text
//! Edit → SpanCache::widen → BlockTokenizer → InlineTokenizer
//!      → SpanCache::replace → StyleSink
//! ```

mod block;
mod cache;
mod catalog;
mod inline;
mod kinds;
mod lexer;

pub use block::{Anchor, BlockPass, BlockTokenizer};
pub use cache::{Span, SpanCache, Window};
pub use catalog::{BlockPattern, InlinePattern, TokenCatalog, DEFAULT_DIRECTIVES};
pub use inline::InlineTokenizer;
pub use kinds::{StyleId, TokenKind, STYLE_COUNT, STYLE_NAMES};
pub use lexer::{LexPhase, RelexReport, RstLexer, TextEdit, DEFAULT_WIDEN_MARGIN};
