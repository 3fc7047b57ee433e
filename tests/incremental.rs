//! Incremental relex tests
//!
//! Windowing locality, edits that create structure, batching, and agreement
//! between incremental and full relexing.

mod common;

use common::{assert_partition, lex, Lexed, SAMPLE};
use rstlex::syntax::LexPhase;
use rstlex::{RopeSource, RstLexer, Span, StyleRecorder, TextEdit, TextSource, TokenKind};

const PARAGRAPHS: &str = "First paragraph here.\n\
\n\
- item\n\
\n\
Second paragraph text.\n\
\n\
- other\n\
\n\
Third paragraph stays.\n";

/// Incremental state must equal a fresh full lex of the same text
fn assert_matches_full_relex(lexed: &Lexed) {
    let fresh = lex(&lexed.text());
    assert_eq!(lexed.spans(), fresh.spans(), "block spans differ");
    assert_eq!(lexed.overlays(), fresh.overlays(), "overlays differ");
}

fn edit(
    lexed: &mut Lexed,
    f: impl FnOnce(&mut RopeSource) -> TextEdit,
) -> Option<rstlex::RelexReport> {
    let change = f(&mut lexed.source);
    let mut sink = StyleRecorder::new();
    let report = lexed.lexer.on_edit(&lexed.source, &mut sink, change);
    lexed.sink = sink;
    report
}

// ========================================================================
// Windowing locality
// ========================================================================

#[test]
fn test_edit_inside_paragraph_stays_local() {
    let mut lexed = lex(PARAGRAPHS);
    let before = lexed.spans();
    let total = lexed.lexer.cache().block_count();

    let second = PARAGRAPHS.find("Second").unwrap();
    let first_bullet = PARAGRAPHS.find("- item").unwrap();
    let second_bullet = PARAGRAPHS.find("- other").unwrap();

    let report = edit(&mut lexed, |s| s.insert(second + 3, "x")).unwrap();

    assert_eq!(report.window.start, first_bullet);
    assert_eq!(report.window.end, second_bullet + 1);
    assert!(report.invalidated < total);

    // Nothing before the window changed
    let after = lexed.spans();
    let untouched_before: Vec<Span> = before
        .iter()
        .copied()
        .filter(|s| s.end() <= first_bullet)
        .collect();
    assert_eq!(&after[..untouched_before.len()], &untouched_before[..]);

    // The distant paragraph only moved by the inserted byte
    let third = PARAGRAPHS.find("Third").unwrap();
    let shifted: Vec<Span> = before
        .iter()
        .filter(|s| s.start >= third)
        .map(|s| Span::new(s.start + 1, s.len, s.kind))
        .collect();
    let tail: Vec<Span> = after
        .iter()
        .copied()
        .filter(|s| s.start > third)
        .collect();
    assert_eq!(tail, shifted);

    assert_matches_full_relex(&lexed);
}

#[test]
fn test_invalidated_count_matches_window() {
    let mut lexed = lex(PARAGRAPHS);
    let second = PARAGRAPHS.find("Second").unwrap();
    let first_bullet = PARAGRAPHS.find("- item").unwrap();
    let second_bullet = PARAGRAPHS.find("- other").unwrap();
    let in_window = lexed
        .spans()
        .iter()
        .filter(|s| s.start >= first_bullet && s.start < second_bullet)
        .count();

    let report = edit(&mut lexed, |s| s.replace(second..second + 1, "Z")).unwrap();
    assert_eq!(report.invalidated, in_window);
    assert_eq!(report.blocks, in_window);
}

// ========================================================================
// Edits that create or remove structure
// ========================================================================

#[test]
fn test_typing_underline_creates_section() {
    let text = "Intro text.\n\nTitle\n";
    let mut lexed = lex(text);
    assert!(lexed.spans().iter().all(|s| s.kind.is_fallback()));

    edit(&mut lexed, |s| s.insert(text.len(), "=====\n"));
    assert_eq!(lexed.block_of("Title").kind, TokenKind::Section);
    assert_eq!(lexed.block_of("Title"), Span::new(13, 12, TokenKind::Section));
    assert_matches_full_relex(&lexed);
}

#[test]
fn test_underline_after_structural_block() {
    let text = "- item\n\nTitle\n";
    let mut lexed = lex(text);

    edit(&mut lexed, |s| s.insert(text.len(), "=====\n"));
    assert_eq!(lexed.block_of("Title").kind, TokenKind::Section);
    assert_matches_full_relex(&lexed);
}

#[test]
fn test_deleting_underline_removes_section() {
    let text = "Intro.\n\nTitle\n=====\n\nBody.\n";
    let mut lexed = lex(text);
    assert_eq!(lexed.block_of("Title").kind, TokenKind::Section);

    let underline = text.find("=====").unwrap();
    edit(&mut lexed, |s| s.delete(underline..underline + 6));
    assert_eq!(lexed.block_of("Title").kind, TokenKind::String);
    assert_matches_full_relex(&lexed);
}

#[test]
fn test_edits_across_sample_match_full_relex() {
    let mut lexed = lex(SAMPLE);

    let at = SAMPLE.find("paragraph has").unwrap();
    edit(&mut lexed, |s| s.insert(at, "very "));
    assert_matches_full_relex(&lexed);

    let text = lexed.text();
    let at = text.find("Definition of").unwrap();
    edit(&mut lexed, |s| s.insert(at, "A "));
    assert_matches_full_relex(&lexed);

    let text = lexed.text();
    let start = text.find("**strong text**, ").unwrap();
    edit(&mut lexed, |s| s.delete(start..start + "**strong text**, ".len()));
    assert_matches_full_relex(&lexed);

    let text = lexed.text();
    let start = text.find("Visit").unwrap();
    edit(&mut lexed, |s| s.replace(start..start + 5, "Browse"));
    assert_matches_full_relex(&lexed);

    assert_partition(&lexed.spans(), 0, lexed.source.len());
}

#[test]
fn test_window_end_is_not_end_of_input() {
    // A transition needs a blank line after it; the window ending right after
    // the dashes must not look like the end of the document
    let text = "para\n\n----\n- item\n";
    let mut lexed = lex(text);

    edit(&mut lexed, |s| s.insert(2, "x"));
    assert!(lexed.spans().iter().all(|s| s.kind != TokenKind::Transition));
    assert_eq!(
        lexed.spans(),
        vec![
            Span::new(0, 5, TokenKind::String),
            Span::new(5, 1, TokenKind::Newline),
            Span::new(6, 1, TokenKind::Newline),
            Span::new(7, 4, TokenKind::String),
            Span::new(11, 1, TokenKind::Newline),
            Span::new(12, 7, TokenKind::Bullet),
        ]
    );
    assert_matches_full_relex(&lexed);
}

#[test]
fn test_construct_growing_past_window_replaces_stale_spans() {
    let text = "- one\n\nzz\n\n- two\n";
    let mut lexed = lex(text);
    assert_eq!(lexed.block_of("- two").kind, TokenKind::Bullet);

    // Indenting the paragraph joins both items into one list
    let report = edit(&mut lexed, |s| s.insert(7, "  ")).unwrap();
    assert_eq!(report.window.range(), 0..19);
    assert!(report.complete);
    assert_eq!(lexed.spans(), vec![Span::new(0, 19, TokenKind::Bullet)]);
    assert_matches_full_relex(&lexed);
}

#[test]
fn test_edit_from_diff() {
    let old = "Some text with *emphasis*.\n";
    let new = "Some text with **strong**.\n";
    let mut lexed = lex(old);

    let change = TextEdit::from_diff(old, new).unwrap();
    lexed.source = RopeSource::new(new);
    let mut sink = StyleRecorder::new();
    lexed.lexer.on_edit(&lexed.source, &mut sink, change);

    assert_eq!(lexed.overlay_of("**strong**"), Some(TokenKind::Strong));
    assert_matches_full_relex(&lexed);
}

// ========================================================================
// Style emission
// ========================================================================

#[test]
fn test_sink_receives_window_runs() {
    let mut lexed = lex(PARAGRAPHS);
    let second = PARAGRAPHS.find("Second").unwrap();
    let report = edit(&mut lexed, |s| s.insert(second, "*bold* ")).unwrap();

    // One increasing sequence of runs covering the window, overlays composed in
    let runs = lexed.sink.runs();
    assert_partition(runs, report.window.start, report.window.end);
    assert_eq!(lexed.sink.begin_count(), 1);
    assert!(runs.contains(&Span::new(second, 6, TokenKind::Emphasis)));
    assert!(report.overlays >= 1);
}

#[test]
fn test_phase_returns_to_idle() {
    let mut lexed = lex(PARAGRAPHS);
    assert_eq!(lexed.lexer.phase(), LexPhase::Idle);
    edit(&mut lexed, |s| s.insert(0, "x"));
    assert_eq!(lexed.lexer.phase(), LexPhase::Idle);
}

// ========================================================================
// Cache lifecycle
// ========================================================================

#[test]
fn test_edit_on_empty_cache_lexes_everything() {
    let mut lexer = RstLexer::new().unwrap();
    let source = RopeSource::new("Title\n=====\n");
    let mut sink = StyleRecorder::new();

    let report = lexer
        .on_edit(&source, &mut sink, TextEdit::insert(3, 1))
        .unwrap();
    assert_eq!(report.window.range(), 0..source.len());
    assert_eq!(lexer.cache().spans(), vec![Span::new(0, 12, TokenKind::Section)]);
}

#[test]
fn test_clear_discards_cache() {
    let mut lexed = lex(SAMPLE);
    assert!(!lexed.lexer.cache().is_empty());
    lexed.lexer.clear();
    assert!(lexed.lexer.cache().is_empty());
    assert_eq!(lexed.lexer.cache().overlay_count(), 0);
}

#[test]
fn test_out_of_range_edit_is_clamped() {
    let mut lexed = lex(PARAGRAPHS);
    let mut sink = StyleRecorder::new();
    let report = lexed
        .lexer
        .on_edit(&lexed.source, &mut sink, TextEdit::replace(10_000, 5, 5))
        .unwrap();
    assert!(report.window.end <= lexed.source.len());
    assert_matches_full_relex(&lexed);
}

// ========================================================================
// Pause / resume
// ========================================================================

#[test]
fn test_paused_edits_are_batched() {
    let mut lexed = lex(SAMPLE);
    let blocks_before = lexed.lexer.cache().block_count();

    lexed.lexer.pause();
    assert!(lexed.lexer.is_paused());

    let at = SAMPLE.find("paragraph has").unwrap();
    assert!(edit(&mut lexed, |s| s.insert(at, "x")).is_none());
    assert!(edit(&mut lexed, |s| s.insert(at + 1, "y")).is_none());
    let text = lexed.text();
    let roles = text.find("Roles").unwrap();
    assert!(edit(&mut lexed, |s| s.delete(roles..roles + 1)).is_none());

    // Nothing was re-lexed while paused
    assert_eq!(lexed.lexer.cache().block_count(), blocks_before);

    let mut sink = StyleRecorder::new();
    let report = lexed.lexer.resume(&lexed.source, &mut sink).unwrap();
    assert!(!lexed.lexer.is_paused());
    assert!(report.window.start <= at);
    assert!(report.window.end >= roles);
    assert_matches_full_relex(&lexed);
}

#[test]
fn test_resume_without_edits_does_nothing() {
    let mut lexed = lex(SAMPLE);
    lexed.lexer.pause();
    let mut sink = StyleRecorder::new();
    assert!(lexed.lexer.resume(&lexed.source, &mut sink).is_none());
    assert!(sink.runs().is_empty());
}
