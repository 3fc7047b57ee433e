//! Span cache and window widening
//!
//! Block spans and inline overlays are kept in two ordered maps keyed by
//! absolute start offset. Within a committed region the block spans never
//! overlap and leave no gaps.
//!
//! Widening is a conservative approximation, not dependency tracking. From
//! the edit, it steps outward over a small margin of cached spans and then
//! keeps going past fallback spans (plain text, spaces, newlines, colons),
//! stopping at the first structural span in each direction. Fallback spans
//! can never begin a longer multi-line match, but a structural span near the
//! edit can still be stale when an edit changes what precedes it. Too small a
//! margin shows up as stale highlighting next to edits that turn plain text
//! into a multi-line construct, such as typing an underline beneath a line.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use super::kinds::TokenKind;

/// A contiguous styling decision over `len` bytes starting at `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
    pub kind: TokenKind,
}

impl Span {
    pub const fn new(start: usize, len: usize, kind: TokenKind) -> Self {
        Self { start, len, kind }
    }

    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Half-open range of the document that is (re)tokenized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    len: usize,
    kind: TokenKind,
}

/// Ordered store of block spans and inline overlays
#[derive(Debug, Clone, Default)]
pub struct SpanCache {
    blocks: BTreeMap<usize, Entry>,
    overlays: BTreeMap<usize, Entry>,
}

impl SpanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Drop everything (document reload)
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.overlays.clear();
    }

    /// Block spans in ascending order
    pub fn spans(&self) -> Vec<Span> {
        to_spans(&self.blocks)
    }

    /// Inline overlays in ascending order
    pub fn overlays(&self) -> Vec<Span> {
        to_spans(&self.overlays)
    }

    /// The block span containing `offset`
    pub fn block_at(&self, offset: usize) -> Option<Span> {
        let (&start, entry) = self.blocks.range(..=offset).next_back()?;
        (offset < start + entry.len).then(|| Span::new(start, entry.len, entry.kind))
    }

    /// Whether a cached block span starts exactly at `offset`
    pub fn starts_block(&self, offset: usize) -> bool {
        self.blocks.contains_key(&offset)
    }

    /// End of the last cached block span
    pub fn covered_end(&self) -> usize {
        self.blocks
            .iter()
            .next_back()
            .map(|(&start, entry)| start + entry.len)
            .unwrap_or(0)
    }

    /// Window to re-tokenize for an edit touching `[edit_start, edit_end)`.
    ///
    /// Bounds are swapped if reversed and clamped to `doc_len`. An empty
    /// cache yields the whole document.
    pub fn widen(
        &self,
        edit_start: usize,
        edit_end: usize,
        doc_len: usize,
        margin: usize,
    ) -> Window {
        let (lo, hi) = if edit_start <= edit_end {
            (edit_start, edit_end)
        } else {
            (edit_end, edit_start)
        };
        let lo = lo.min(doc_len);
        let hi = hi.min(doc_len);

        if self.blocks.is_empty() {
            return Window::new(0, doc_len);
        }

        let start = widen_boundary(self.blocks.range(..=lo).rev(), margin).unwrap_or(0);
        let end = widen_boundary(self.blocks.range(hi..), margin)
            .unwrap_or(doc_len)
            .clamp(start, doc_len.max(start));

        tracing::debug!(
            "Widened edit {}..{} to window {}..{} (margin {})",
            lo,
            hi,
            start,
            end,
            margin
        );
        Window::new(start, end)
    }

    /// Remove every entry keyed in `range`. An overlay that starts before the
    /// range and reaches into it is cut short. Returns the number of block
    /// spans removed.
    pub fn invalidate(&mut self, range: Range<usize>) -> usize {
        if range.start >= range.end {
            return 0;
        }

        let removed = remove_range(&mut self.blocks, &range);
        remove_range(&mut self.overlays, &range);

        if let Some((&start, entry)) = self.overlays.range_mut(..range.start).next_back() {
            if start + entry.len > range.start {
                entry.len = range.start - start;
            }
        }
        removed
    }

    /// Move every entry keyed at or after `from` by `delta` bytes
    pub fn shift(&mut self, from: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        shift_map(&mut self.blocks, from, delta);
        shift_map(&mut self.overlays, from, delta);
    }

    /// Replace the contents of `[start, end)` with freshly tokenized spans.
    /// Returns the number of cached block spans dropped.
    pub fn replace(
        &mut self,
        start: usize,
        end: usize,
        blocks: &[Span],
        overlays: &[Span],
    ) -> usize {
        let removed = self.invalidate(start..end);
        for span in blocks.iter().filter(|s| s.len > 0) {
            self.blocks.insert(
                span.start,
                Entry {
                    len: span.len,
                    kind: span.kind,
                },
            );
        }
        for span in overlays.iter().filter(|s| s.len > 0) {
            self.overlays.insert(
                span.start,
                Entry {
                    len: span.len,
                    kind: span.kind,
                },
            );
        }
        removed
    }

    /// Block spans intersecting `range` with overlays painted on top,
    /// as non-overlapping runs clipped to the range.
    pub fn styled_runs(&self, range: Range<usize>) -> Vec<Span> {
        let mut runs = Vec::new();
        if range.start >= range.end {
            return runs;
        }

        let first = self
            .blocks
            .range(..=range.start)
            .next_back()
            .map(|(&start, _)| start)
            .unwrap_or(range.start);

        for (&start, block) in self.blocks.range(first..range.end) {
            let lo = start.max(range.start);
            let hi = (start + block.len).min(range.end);
            if lo >= hi {
                continue;
            }

            let mut cursor = lo;
            for overlay in self.overlays_intersecting(lo..hi) {
                let o_lo = overlay.start.max(lo);
                let o_hi = overlay.end().min(hi);
                if o_lo > cursor {
                    runs.push(Span::new(cursor, o_lo - cursor, block.kind));
                }
                runs.push(Span::new(o_lo, o_hi - o_lo, overlay.kind));
                cursor = o_hi;
            }
            if cursor < hi {
                runs.push(Span::new(cursor, hi - cursor, block.kind));
            }
        }
        runs
    }

    fn overlays_intersecting(&self, range: Range<usize>) -> impl Iterator<Item = Span> + '_ {
        let first = self
            .overlays
            .range(..range.start)
            .next_back()
            .filter(|(start, entry)| **start + entry.len > range.start)
            .map(|(&start, _)| start)
            .unwrap_or(range.start);

        self.overlays
            .range(first..range.end)
            .map(|(&start, entry)| Span::new(start, entry.len, entry.kind))
    }
}

/// Step over `margin` boundaries, then past fallback spans, and return the
/// first structural boundary reached
fn widen_boundary<'a>(
    boundaries: impl Iterator<Item = (&'a usize, &'a Entry)>,
    margin: usize,
) -> Option<usize> {
    boundaries
        .enumerate()
        .find(|(step, (_, entry))| *step >= margin && !entry.kind.is_fallback())
        .map(|(_, (&start, _))| start)
}

fn to_spans(map: &BTreeMap<usize, Entry>) -> Vec<Span> {
    map.iter()
        .map(|(&start, entry)| Span::new(start, entry.len, entry.kind))
        .collect()
}

fn remove_range(map: &mut BTreeMap<usize, Entry>, range: &Range<usize>) -> usize {
    let keys: Vec<usize> = map.range(range.clone()).map(|(&k, _)| k).collect();
    for key in &keys {
        map.remove(key);
    }
    keys.len()
}

fn shift_map(map: &mut BTreeMap<usize, Entry>, from: usize, delta: isize) {
    let tail = map.split_off(&from);
    for (start, entry) in tail {
        let moved = start as isize + delta;
        if moved < 0 {
            tracing::error!("Span at {} shifted before document start by {}", start, delta);
            debug_assert!(moved >= 0, "shift moved span before document start");
            continue;
        }
        map.insert(moved as usize, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(spans: &[Span]) -> SpanCache {
        let mut cache = SpanCache::new();
        let end = spans.last().map(|s| s.end()).unwrap_or(0);
        cache.replace(0, end, spans, &[]);
        cache
    }

    /// "para one\n\n- item\n\npara two\n"
    fn sample() -> SpanCache {
        use TokenKind as K;
        cache_with(&[
            Span::new(0, 4, K::String),
            Span::new(4, 1, K::Space),
            Span::new(5, 3, K::String),
            Span::new(8, 1, K::Newline),
            Span::new(9, 1, K::Newline),
            Span::new(10, 7, K::Bullet),
            Span::new(17, 1, K::Newline),
            Span::new(18, 4, K::String),
            Span::new(22, 1, K::Space),
            Span::new(23, 3, K::String),
            Span::new(26, 1, K::Newline),
        ])
    }

    #[test]
    fn test_empty_cache_widens_to_document() {
        let cache = SpanCache::new();
        assert_eq!(cache.widen(3, 4, 10, 2), Window::new(0, 10));
    }

    #[test]
    fn test_widen_walks_past_fallbacks() {
        let cache = sample();
        // Edit inside "two": nothing structural after it, the bullet before it
        let window = cache.widen(24, 25, 27, 2);
        assert_eq!(window, Window::new(10, 27));
    }

    #[test]
    fn test_widen_stops_at_structural_boundary() {
        let cache = sample();
        // Edit inside "one": backward reaches document start, forward stops at
        // the bullet once the margin is used up
        let window = cache.widen(1, 2, 27, 2);
        assert_eq!(window, Window::new(0, 10));
    }

    #[test]
    fn test_margin_zero_stops_at_nearest_structural() {
        let cache = sample();
        assert_eq!(cache.widen(12, 12, 27, 0), Window::new(10, 27));
    }

    #[test]
    fn test_widen_clamps_bounds() {
        let cache = sample();
        let window = cache.widen(100, 50, 27, 2);
        assert!(window.start <= window.end);
        assert!(window.end <= 27);
    }

    #[test]
    fn test_invalidate_and_shift() {
        let mut cache = sample();
        let removed = cache.invalidate(18..27);
        assert_eq!(removed, 4);
        assert_eq!(cache.covered_end(), 18);

        let mut cache = sample();
        cache.invalidate(0..10);
        cache.shift(10, 3);
        assert_eq!(cache.spans()[0], Span::new(13, 7, TokenKind::Bullet));
    }

    #[test]
    fn test_invalidate_truncates_straddling_overlay() {
        let mut cache = SpanCache::new();
        cache.replace(
            0,
            10,
            &[Span::new(0, 10, TokenKind::String)],
            &[Span::new(2, 6, TokenKind::Emphasis)],
        );
        cache.invalidate(5..10);
        assert_eq!(cache.overlays(), vec![Span::new(2, 3, TokenKind::Emphasis)]);
    }

    #[test]
    fn test_replace_counts_dropped_blocks() {
        let mut cache = sample();
        assert!(cache.starts_block(10));
        let dropped = cache.replace(8, 18, &[Span::new(8, 10, TokenKind::Quote)], &[]);
        assert_eq!(dropped, 4);
        assert!(!cache.starts_block(10));
        assert_eq!(cache.block_at(12), Some(Span::new(8, 10, TokenKind::Quote)));
    }

    #[test]
    fn test_block_at() {
        let cache = sample();
        assert_eq!(cache.block_at(12), Some(Span::new(10, 7, TokenKind::Bullet)));
        assert_eq!(cache.block_at(27), None);
    }

    #[test]
    fn test_styled_runs_paint_overlays() {
        let mut cache = SpanCache::new();
        cache.replace(
            0,
            12,
            &[
                Span::new(0, 4, TokenKind::String),
                Span::new(4, 1, TokenKind::Space),
                Span::new(5, 6, TokenKind::String),
                Span::new(11, 1, TokenKind::Newline),
            ],
            &[Span::new(5, 4, TokenKind::Emphasis)],
        );
        assert_eq!(
            cache.styled_runs(0..12),
            vec![
                Span::new(0, 4, TokenKind::String),
                Span::new(4, 1, TokenKind::Space),
                Span::new(5, 4, TokenKind::Emphasis),
                Span::new(9, 2, TokenKind::String),
                Span::new(11, 1, TokenKind::Newline),
            ]
        );
        let total: usize = cache.styled_runs(2..7).iter().map(|s| s.len).sum();
        assert_eq!(total, 5);
    }
}
