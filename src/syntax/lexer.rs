//! Incremental relex orchestration
//!
//! Each edit notification runs one cycle:
//! Idle → Widening → BlockPass → InlinePass → Committed → Idle.
//!
//! Widening happens in pre-edit coordinates against the cached spans. The
//! window's old entries are dropped, everything after it is shifted by the
//! edit delta, and the window is re-tokenized from the current text. Results
//! are committed to the cache and painted through the [`StyleSink`].
//!
//! Calls must be serialized by the host. Nothing here is reentrant.

use std::sync::Arc;

use serde::Serialize;

use crate::config::LexerConfig;
use crate::source::{StyleSink, TextSource};
use crate::theme::{Color, FontSpec, PropertyFile, StyleProps, StyleTable, ThemeStore};

use super::block::{Anchor, BlockTokenizer};
use super::cache::{Span, SpanCache, Window};
use super::catalog::TokenCatalog;
use super::inline::InlineTokenizer;
use super::kinds::{StyleId, TokenKind};

/// Default number of cached spans stepped over on each side of an edit
pub const DEFAULT_WIDEN_MARGIN: usize = 2;

/// A change to the document in byte offsets: `[start, old_end)` of the old
/// text was replaced by `[start, new_end)` of the new text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl TextEdit {
    pub fn insert(at: usize, len: usize) -> Self {
        Self {
            start: at,
            old_end: at,
            new_end: at + len,
        }
    }

    pub fn delete(at: usize, len: usize) -> Self {
        Self {
            start: at,
            old_end: at + len,
            new_end: at,
        }
    }

    pub fn replace(at: usize, old_len: usize, new_len: usize) -> Self {
        Self {
            start: at,
            old_end: at + old_len,
            new_end: at + new_len,
        }
    }

    /// Smallest edit turning `old` into `new` (common prefix and suffix
    /// removed), or None if they are equal
    pub fn from_diff(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }

        let old_bytes = old.as_bytes();
        let new_bytes = new.as_bytes();

        let mut start = 0;
        let max_start = old_bytes.len().min(new_bytes.len());
        while start < max_start && old_bytes[start] == new_bytes[start] {
            start += 1;
        }

        // Suffix may not overlap the prefix
        let mut old_end = old_bytes.len();
        let mut new_end = new_bytes.len();
        while old_end > start && new_end > start && old_bytes[old_end - 1] == new_bytes[new_end - 1]
        {
            old_end -= 1;
            new_end -= 1;
        }

        // Keep the boundaries on char boundaries of both texts
        while !old.is_char_boundary(start) || !new.is_char_boundary(start) {
            start -= 1;
        }
        while !old.is_char_boundary(old_end) || !new.is_char_boundary(new_end) {
            old_end += 1;
            new_end += 1;
        }

        Some(Self {
            start,
            old_end,
            new_end,
        })
    }

    pub fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }

    /// Single edit equivalent to `self` followed by `next`, where `next` is
    /// expressed in the coordinates produced by `self`
    pub fn compose(self, next: TextEdit) -> TextEdit {
        let end = self.new_end.max(next.old_end);
        TextEdit {
            start: self.start.min(next.start),
            old_end: end - self.new_end + self.old_end,
            new_end: end - next.old_end + next.new_end,
        }
    }

    /// Swap reversed bounds and clamp to the old and new document lengths
    fn clamped(self, old_len: usize, new_len: usize) -> TextEdit {
        let start = self.start.min(old_len).min(new_len);
        TextEdit {
            start,
            old_end: self.old_end.clamp(start, old_len.max(start)),
            new_end: self.new_end.clamp(start, new_len.max(start)),
        }
    }
}

/// Where the orchestrator is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LexPhase {
    Idle,
    Widening,
    BlockPass,
    InlinePass,
    Committed,
}

/// Summary of one relex pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelexReport {
    /// Range that was re-tokenized and repainted, in post-edit coordinates.
    /// May extend past the widened window when a construct grew across it.
    pub window: Window,
    /// Block spans committed
    pub blocks: usize,
    /// Inline overlays committed
    pub overlays: usize,
    /// Cached block spans dropped and replaced by this pass
    pub invalidated: usize,
    /// False if the pass stopped early and left part of the window unstyled
    pub complete: bool,
}

/// Incremental reStructuredText lexer
#[derive(Debug, Clone)]
pub struct RstLexer {
    catalog: Arc<TokenCatalog>,
    cache: SpanCache,
    styles: StyleTable,
    margin: usize,
    /// Document length as of the last committed pass
    committed_len: usize,
    phase: LexPhase,
    paused: bool,
    pending: Option<TextEdit>,
}

impl RstLexer {
    /// Lexer with the default directive set and styles
    pub fn new() -> Result<Self, String> {
        Ok(Self::with_catalog(TokenCatalog::new()?))
    }

    pub fn with_catalog(catalog: TokenCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            cache: SpanCache::new(),
            styles: StyleTable::new("rst"),
            margin: DEFAULT_WIDEN_MARGIN,
            committed_len: 0,
            phase: LexPhase::Idle,
            paused: false,
            pending: None,
        }
    }

    /// Build from configuration. A configured theme file that cannot be
    /// loaded is logged and the built-in styles are kept.
    pub fn from_config(config: &LexerConfig) -> Result<Self, String> {
        let mut lexer = Self::with_catalog(TokenCatalog::with_directives(&config.directives)?);
        lexer.styles = StyleTable::new(config.language.clone());
        lexer.margin = config.widen_margin;

        if let Some(path) = config.theme_path() {
            match PropertyFile::from_file(&path) {
                Ok(file) => {
                    lexer.reload_styles(&file);
                }
                Err(e) => tracing::warn!("Ignoring theme: {}", e),
            }
        }
        Ok(lexer)
    }

    pub fn catalog(&self) -> &TokenCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &SpanCache {
        &self.cache
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn phase(&self) -> LexPhase {
        self.phase
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    pub fn set_margin(&mut self, margin: usize) {
        self.margin = margin;
    }

    /// Replace the directive keyword set. The catalog is rebuilt and the
    /// cache cleared, so the host should follow up with [`relex_all`].
    ///
    /// [`relex_all`]: Self::relex_all
    pub fn set_directives<S: AsRef<str>>(&mut self, directives: &[S]) -> Result<(), String> {
        self.catalog = Arc::new(TokenCatalog::with_directives(directives)?);
        self.clear();
        Ok(())
    }

    /// Forget all cached spans (document reload)
    pub fn clear(&mut self) {
        self.cache.clear();
        self.committed_len = 0;
        self.pending = None;
    }

    /// Handle an edit the host has already applied to `source`.
    ///
    /// While paused the edit is only recorded and None is returned.
    pub fn on_edit(
        &mut self,
        source: &dyn TextSource,
        sink: &mut dyn StyleSink,
        edit: TextEdit,
    ) -> Option<RelexReport> {
        if self.paused {
            let composed = match self.pending {
                Some(pending) => pending.compose(edit),
                None => edit,
            };
            tracing::trace!("Paused, pending edit now {:?}", composed);
            self.pending = Some(composed);
            return None;
        }
        Some(self.relex(source, sink, edit))
    }

    /// Drop the cache and lex the whole document
    pub fn relex_all(&mut self, source: &dyn TextSource, sink: &mut dyn StyleSink) -> RelexReport {
        self.cache.clear();
        self.pending = None;
        self.run_pass(source, sink, 0, source.len(), 0)
    }

    /// Stop lexing on edits until [`resume`](Self::resume); edits made in
    /// between are merged into one
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Leave the paused state and run a single pass for every edit recorded
    /// while paused
    pub fn resume(
        &mut self,
        source: &dyn TextSource,
        sink: &mut dyn StyleSink,
    ) -> Option<RelexReport> {
        self.paused = false;
        let edit = self.pending.take()?;
        tracing::debug!("Resuming with composed edit {:?}", edit);
        Some(self.relex(source, sink, edit))
    }

    fn relex(
        &mut self,
        source: &dyn TextSource,
        sink: &mut dyn StyleSink,
        edit: TextEdit,
    ) -> RelexReport {
        self.phase = LexPhase::Widening;
        let new_len = source.len();

        if self.cache.is_empty() {
            return self.run_pass(source, sink, 0, new_len, 0);
        }

        let old_len = self.committed_len;
        let edit = edit.clamped(old_len, new_len);
        let delta = new_len as isize - old_len as isize;
        if delta != edit.delta() {
            tracing::warn!(
                "Edit {:?} does not match length change {} -> {}",
                edit,
                old_len,
                new_len
            );
        }

        let window = self
            .cache
            .widen(edit.start, edit.old_end, old_len, self.margin);
        let invalidated = self.cache.invalidate(window.range());
        self.cache.shift(window.end, delta);

        let end = (window.end as isize + delta).clamp(window.start as isize, new_len as isize);
        self.run_pass(source, sink, window.start, end as usize, invalidated)
    }

    /// Re-tokenize from `start`. The pass reads up to the document end and
    /// keeps going past `end` until it reaches a line start that is already a
    /// cached block boundary, so a construct that grew across `end` replaces
    /// the stale spans it now covers.
    fn run_pass(
        &mut self,
        source: &dyn TextSource,
        sink: &mut dyn StyleSink,
        start: usize,
        end: usize,
        invalidated: usize,
    ) -> RelexReport {
        let doc_len = source.len();
        let start = start.min(doc_len);
        let end = end.clamp(start, doc_len);

        self.phase = LexPhase::BlockPass;
        let text = source.text(start..doc_len);
        let anchor = Anchor::at(source, start);
        let cache = &self.cache;
        let pass = BlockTokenizer::new(&self.catalog).tokenize_until(
            &text,
            anchor,
            source,
            |offset| offset >= end && cache.starts_block(offset),
        );

        self.phase = LexPhase::InlinePass;
        let overlays = if pass.spans.is_empty() {
            Vec::new()
        } else {
            InlineTokenizer::new(&self.catalog).overlay(&text[..pass.consumed], start, &pass.spans)
        };

        let window = Window::new(start, pass.end.max(end));
        let invalidated =
            invalidated + self.cache.replace(window.start, window.end, &pass.spans, &overlays);
        self.committed_len = doc_len;
        self.phase = LexPhase::Committed;

        emit(sink, &self.cache, window);

        tracing::debug!(
            "Relexed {}..{} (window ended at {}): {} blocks, {} overlays, {} invalidated{}",
            window.start,
            window.end,
            end,
            pass.spans.len(),
            overlays.len(),
            invalidated,
            if pass.complete { "" } else { " (incomplete)" }
        );

        self.phase = LexPhase::Idle;
        RelexReport {
            window,
            blocks: pass.spans.len(),
            overlays: overlays.len(),
            invalidated,
            complete: pass.complete,
        }
    }

    /// Block spans and overlays in `range` composed into painted runs
    pub fn styled_runs(&self, range: std::ops::Range<usize>) -> Vec<Span> {
        self.cache.styled_runs(range)
    }

    /// Re-read style overrides from a theme store; returns slots updated
    pub fn reload_styles(&mut self, store: &dyn ThemeStore) -> usize {
        self.styles.reload(store)
    }

    pub fn style_for_id(&self, id: u8) -> &StyleProps {
        self.styles.style_for_id(id)
    }

    pub fn style_id(&self, kind: TokenKind) -> StyleId {
        kind.style_id()
    }

    pub fn default_color(&self, kind: TokenKind) -> Color {
        self.styles.default_color(kind)
    }

    pub fn default_paper(&self, kind: TokenKind) -> Color {
        self.styles.default_paper(kind)
    }

    pub fn default_font(&self, kind: TokenKind) -> FontSpec {
        self.styles.default_font(kind)
    }
}

/// Paint the composed runs of `window` in increasing offset order. The
/// cursor is only re-anchored where an unlexed gap interrupts the runs.
fn emit(sink: &mut dyn StyleSink, cache: &SpanCache, window: Window) {
    let mut cursor = None;
    for run in cache.styled_runs(window.range()) {
        if cursor != Some(run.start) {
            sink.begin_styling(run.start);
        }
        sink.apply_style(run.len, run.kind);
        cursor = Some(run.end());
    }
}
