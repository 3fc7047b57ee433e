//! rstlex - incremental reStructuredText lexer
//!
//! This crate provides regex based block and inline tokenizing of
//! reStructuredText, a span cache for re-lexing only the region around an
//! edit, and the style tables an editor host paints with.

pub mod config;
pub mod config_paths;
pub mod source;
pub mod syntax;
pub mod theme;
pub mod tracing;

// Re-export commonly used types
pub use config::LexerConfig;
pub use source::{RopeSource, StyleRecorder, StyleSink, TextSource};
pub use syntax::{RelexReport, RstLexer, Span, TextEdit, TokenKind};
pub use theme::{PropertyFile, StyleTable, ThemeStore};
