//! Token kinds and style slots
//!
//! Every span the lexer emits carries a [`TokenKind`]. Kinds map many-to-one
//! onto numeric [`StyleId`] slots, which is what the host paints with and what
//! theme property keys (`style.<language>.<id>`) address.

use serde::Serialize;

/// Number of style slots
pub const STYLE_COUNT: usize = 26;

/// Human names of the style slots. Index into this array is the StyleId.
pub const STYLE_NAMES: [&str; STYLE_COUNT] = [
    "default",         // 0
    "comment",         // 1
    "title",           // 2
    "transition",      // 3
    "list",            // 4
    "definition",      // 5
    "field name",      // 6
    "option",          // 7
    "literal block",   // 8
    "line block",      // 9
    "quote",           // 10
    "doctest",         // 11
    "table",           // 12
    "footnote",        // 13
    "target",          // 14
    "directive name",  // 15
    "emphasis",        // 16
    "strong",          // 17
    "inline literal",  // 18
    "url",             // 19
    "link",            // 20
    "footnote ref",    // 21
    "substitution",    // 22
    "target ref",      // 23
    "reference",       // 24
    "trailing space",  // 25
];

/// Numeric style slot (0..=25)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StyleId(pub u8);

impl StyleId {
    pub const DEFAULT: StyleId = StyleId(0);

    /// Returns the slot if it is in range
    pub fn new(id: u8) -> Option<Self> {
        ((id as usize) < STYLE_COUNT).then_some(StyleId(id))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Human readable slot name, if the slot exists
    pub fn description(self) -> Option<&'static str> {
        STYLE_NAMES.get(self.index()).copied()
    }

    /// All slots in ascending order
    pub fn all() -> impl Iterator<Item = StyleId> {
        (0..STYLE_COUNT as u8).map(StyleId)
    }
}

/// Closed set of token kinds produced by the block and inline tokenizers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    // Block kinds
    Title,
    Section,
    Transition,
    Bullet,
    Enumerated,
    Definition,
    Field,
    Option,
    LiteralBlock,
    Quote,
    LineBlock,
    Doctest,
    Table,
    Footnote,
    Target,
    Directive,
    Comment,
    // Fallback kinds
    String,
    Colon,
    Space,
    Newline,
    // Inline kinds
    Emphasis,
    Strong,
    Literal,
    Url,
    Link,
    FootnoteRef,
    Substitution,
    TargetRef,
    Reference,
    FieldName,
    DirectiveName,
    TrailingSpace,
}

impl TokenKind {
    /// Every kind, block kinds first
    pub const ALL: [TokenKind; 33] = [
        TokenKind::Title,
        TokenKind::Section,
        TokenKind::Transition,
        TokenKind::Bullet,
        TokenKind::Enumerated,
        TokenKind::Definition,
        TokenKind::Field,
        TokenKind::Option,
        TokenKind::LiteralBlock,
        TokenKind::Quote,
        TokenKind::LineBlock,
        TokenKind::Doctest,
        TokenKind::Table,
        TokenKind::Footnote,
        TokenKind::Target,
        TokenKind::Directive,
        TokenKind::Comment,
        TokenKind::String,
        TokenKind::Colon,
        TokenKind::Space,
        TokenKind::Newline,
        TokenKind::Emphasis,
        TokenKind::Strong,
        TokenKind::Literal,
        TokenKind::Url,
        TokenKind::Link,
        TokenKind::FootnoteRef,
        TokenKind::Substitution,
        TokenKind::TargetRef,
        TokenKind::Reference,
        TokenKind::FieldName,
        TokenKind::DirectiveName,
        TokenKind::TrailingSpace,
    ];

    /// Stable lowercase name, used in logs and CLI output
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Title => "title",
            TokenKind::Section => "section",
            TokenKind::Transition => "transition",
            TokenKind::Bullet => "bullet",
            TokenKind::Enumerated => "enumerated",
            TokenKind::Definition => "definition",
            TokenKind::Field => "field",
            TokenKind::Option => "option",
            TokenKind::LiteralBlock => "literal-block",
            TokenKind::Quote => "quote",
            TokenKind::LineBlock => "line-block",
            TokenKind::Doctest => "doctest",
            TokenKind::Table => "table",
            TokenKind::Footnote => "footnote",
            TokenKind::Target => "target",
            TokenKind::Directive => "directive",
            TokenKind::Comment => "comment",
            TokenKind::String => "string",
            TokenKind::Colon => "colon",
            TokenKind::Space => "space",
            TokenKind::Newline => "newline",
            TokenKind::Emphasis => "emphasis",
            TokenKind::Strong => "strong",
            TokenKind::Literal => "literal",
            TokenKind::Url => "url",
            TokenKind::Link => "link",
            TokenKind::FootnoteRef => "footnote-ref",
            TokenKind::Substitution => "substitution",
            TokenKind::TargetRef => "target-ref",
            TokenKind::Reference => "reference",
            TokenKind::FieldName => "field-name",
            TokenKind::DirectiveName => "directive-name",
            TokenKind::TrailingSpace => "trailing-space",
        }
    }

    /// Look up a kind by its [`name`](Self::name)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Fallback kinds only guarantee forward progress; they never start a
    /// structural match, so window widening walks past them.
    pub fn is_fallback(self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Colon | TokenKind::Space | TokenKind::Newline
        )
    }

    /// Kinds produced by the inline tokenizer
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            TokenKind::Emphasis
                | TokenKind::Strong
                | TokenKind::Literal
                | TokenKind::Url
                | TokenKind::Link
                | TokenKind::FootnoteRef
                | TokenKind::Substitution
                | TokenKind::TargetRef
                | TokenKind::Reference
                | TokenKind::FieldName
                | TokenKind::DirectiveName
                | TokenKind::TrailingSpace
        )
    }

    /// Style slot this kind is painted with
    pub fn style_id(self) -> StyleId {
        let id = match self {
            TokenKind::String
            | TokenKind::Colon
            | TokenKind::Space
            | TokenKind::Newline
            | TokenKind::Field
            | TokenKind::Directive => 0,
            TokenKind::Comment => 1,
            TokenKind::Title | TokenKind::Section => 2,
            TokenKind::Transition => 3,
            TokenKind::Bullet | TokenKind::Enumerated => 4,
            TokenKind::Definition => 5,
            TokenKind::FieldName => 6,
            TokenKind::Option => 7,
            TokenKind::LiteralBlock => 8,
            TokenKind::LineBlock => 9,
            TokenKind::Quote => 10,
            TokenKind::Doctest => 11,
            TokenKind::Table => 12,
            TokenKind::Footnote => 13,
            TokenKind::Target => 14,
            TokenKind::DirectiveName => 15,
            TokenKind::Emphasis => 16,
            TokenKind::Strong => 17,
            TokenKind::Literal => 18,
            TokenKind::Url => 19,
            TokenKind::Link => 20,
            TokenKind::FootnoteRef => 21,
            TokenKind::Substitution => 22,
            TokenKind::TargetRef => 23,
            TokenKind::Reference => 24,
            TokenKind::TrailingSpace => 25,
        };
        StyleId(id)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}
