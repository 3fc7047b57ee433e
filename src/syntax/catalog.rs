//! Token catalog: the ordered block and inline pattern lists
//!
//! Block patterns are tried in declaration order at the current offset and the
//! first one that matches wins, so specific constructs (directives, titles,
//! tables) are declared ahead of generic ones (comments, definitions) and the
//! four fallback patterns come last.
//!
//! Inline patterns are searched for anywhere within a single line. Each one
//! styles a designated capture group, which may be narrower than the match.
//!
//! The catalog is immutable once built. Changing the directive keyword set
//! means building a new catalog.

use regex::{Captures, Regex, RegexBuilder};

use super::kinds::TokenKind;

/// Directive names recognised by default
pub const DEFAULT_DIRECTIVES: &[&str] = &[
    "attention",
    "caution",
    "danger",
    "error",
    "hint",
    "important",
    "note",
    "tip",
    "warning",
    "admonition",
    "image",
    "figure",
    "topic",
    "sidebar",
    "code",
    "math",
    "rubric",
    "epigraph",
    "highlights",
    "compound",
    "container",
    "table",
    "csv-table",
    "list-table",
    "contents",
    "sectnum",
    "section-autonumbering",
    "section-numbering",
    "header",
    "footer",
    "target-notes",
    "meta",
    "include",
    "raw",
    "class",
    "role",
    "default-role",
];

/// Extra check run on a successful regex match
type Guard = fn(&Captures<'_>) -> bool;

/// A block pattern, matched anchored at the current offset
#[derive(Debug, Clone)]
pub struct BlockPattern {
    /// Short name for diagnostics (several patterns may share a kind)
    pub name: &'static str,
    pub kind: TokenKind,
    regex: Regex,
    /// Only attempted when the offset is at the start of a line
    line_start: bool,
    guard: Option<Guard>,
}

impl BlockPattern {
    fn new(name: &'static str, kind: TokenKind, pattern: &str) -> Result<Self, String> {
        let regex = Regex::new(pattern)
            .map_err(|e| format!("Invalid block pattern '{}': {}", name, e))?;
        Ok(Self {
            name,
            kind,
            regex,
            line_start: true,
            guard: None,
        })
    }

    fn anywhere(mut self) -> Self {
        self.line_start = false;
        self
    }

    fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Length of the match at the start of `rest`, if there is a non-empty one.
    ///
    /// Every block regex begins with `\A`, so the match cannot float past the
    /// current offset.
    pub fn match_len(&self, rest: &str, at_line_start: bool) -> Option<usize> {
        if self.line_start && !at_line_start {
            return None;
        }
        let len = match self.guard {
            Some(guard) => {
                let caps = self.regex.captures(rest)?;
                if !guard(&caps) {
                    return None;
                }
                caps.get(0)?.end()
            }
            None => self.regex.find(rest)?.end(),
        };
        (len > 0).then_some(len)
    }
}

/// An inline pattern, searched for freely within one line
#[derive(Debug, Clone)]
pub struct InlinePattern {
    pub name: &'static str,
    pub kind: TokenKind,
    regex: Regex,
    /// Capture group that carries the styled range
    group: usize,
}

impl InlinePattern {
    fn new(name: &'static str, kind: TokenKind, pattern: &str) -> Result<Self, String> {
        let regex = Regex::new(pattern)
            .map_err(|e| format!("Invalid inline pattern '{}': {}", name, e))?;
        Ok(Self {
            name,
            kind,
            regex,
            group: 1,
        })
    }

    /// Byte ranges (relative to `line`) of every non-overlapping occurrence
    pub fn find_ranges<'a>(
        &'a self,
        line: &'a str,
    ) -> impl Iterator<Item = std::ops::Range<usize>> + 'a {
        self.regex
            .captures_iter(line)
            .filter_map(move |caps| caps.get(self.group))
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
    }
}

/// Title over- and underline must be the same run of characters
fn same_adornment(caps: &Captures<'_>) -> bool {
    match (caps.get(1), caps.get(2)) {
        (Some(over), Some(under)) => over.as_str() == under.as_str(),
        _ => false,
    }
}

/// Immutable, ordered set of block and inline patterns
#[derive(Debug, Clone)]
pub struct TokenCatalog {
    block: Vec<BlockPattern>,
    inline: Vec<InlinePattern>,
    directives: Vec<String>,
}

impl TokenCatalog {
    /// Build a catalog using [`DEFAULT_DIRECTIVES`]
    pub fn new() -> Result<Self, String> {
        Self::with_directives(DEFAULT_DIRECTIVES)
    }

    /// Build a catalog whose directive-name pattern alternates `directives`.
    ///
    /// Names are escaped, blank names dropped and duplicates removed keeping
    /// the first occurrence, so the alternation order follows the input.
    pub fn with_directives<S: AsRef<str>>(directives: &[S]) -> Result<Self, String> {
        let mut names: Vec<String> = Vec::with_capacity(directives.len());
        for name in directives {
            let name = name.as_ref().trim();
            if !name.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name.to_string());
            }
        }

        let block = block_patterns()?;
        let mut inline = inline_patterns_before_directives()?;
        if let Some(directive) = directive_name_pattern(&names)? {
            inline.push(directive);
        }
        inline.extend(inline_patterns_after_directives()?);

        tracing::debug!(
            "Built token catalog: {} block patterns, {} inline patterns, {} directives",
            block.len(),
            inline.len(),
            names.len()
        );

        Ok(Self {
            block,
            inline,
            directives: names,
        })
    }

    pub fn block_patterns(&self) -> &[BlockPattern] {
        &self.block
    }

    pub fn inline_patterns(&self) -> &[InlinePattern] {
        &self.inline
    }

    /// The directive keyword set this catalog was built from
    pub fn directives(&self) -> &[String] {
        &self.directives
    }
}

fn block_patterns() -> Result<Vec<BlockPattern>, String> {
    use TokenKind as K;

    Ok(vec![
        // Explicit markup: ".. " constructs, most specific first
        BlockPattern::new(
            "code-directive",
            K::LiteralBlock,
            r"\A\.\. +(?:code|code-block|sourcecode)::[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*[ ]{2,}\S[^\n]*(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "directive",
            K::Directive,
            r"\A\.\. +(?:\|[^|\n]+\| +)?[\w-]+::[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*[ ]{2,}\S[^\n]*(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "footnote",
            K::Footnote,
            r"\A\.\. +\[[^\]\n]+\](?:[ \t][^\n]*)?(?:\n|\z)(?:(?:[ \t]*\n)*[ ]{3,}\S[^\n]*(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "target",
            K::Target,
            r"\A\.\. +_[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*[ ]{2,}\S[^\n]*(?:\n|\z))*",
        )?,
        BlockPattern::new("anonymous-target", K::Target, r"\A__(?:[ \t][^\n]*)?(?:\n|\z)")?,
        BlockPattern::new(
            "comment",
            K::Comment,
            r"\A\.\.(?:[ \t][^\n]*)?(?:\n|\z)(?:(?:[ \t]*\n)*[ ]{2,}\S[^\n]*(?:\n|\z))*",
        )?,
        // Table borders look like title adornment, so tables go first
        BlockPattern::new(
            "grid-table",
            K::Table,
            r"\A *\+(?:[-=]+\+)+[ \t]*\n(?: *[+|][^\n]*(?:\n|\z))+",
        )?,
        BlockPattern::new(
            "simple-table",
            K::Table,
            r"\A *={2,}(?: +={2,})+[ \t]*\n(?:[^\n]*\S[^\n]*(?:\n|\z))+",
        )?,
        // Section structure
        BlockPattern::new(
            "title",
            K::Title,
            r#"\A([=`'"~^_*+#-]{2,})[ \t]*\n[^\n]+\n([=`'"~^_*+#-]{2,})[ \t]*(?:\n|\z)"#,
        )?
        .with_guard(same_adornment),
        BlockPattern::new(
            "transition",
            K::Transition,
            r#"\A\n[=`'"~^_*+#-]{4,}[ \t]*\n(?:[ \t]*\n|\z)"#,
        )?,
        BlockPattern::new(
            "section",
            K::Section,
            r#"\A\S[^\n]*\n[=`'"~^_*+#-]{2,}[ \t]*(?:\n|\z)"#,
        )?,
        // Lists
        BlockPattern::new(
            "bullet",
            K::Bullet,
            r"\A *[-+*•‣⁃] +\S[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*(?: *[-+*•‣⁃] +\S[^\n]*|[ ]{2,}\S[^\n]*)(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "enumerated",
            K::Enumerated,
            r"\A *\(?(?:\d+|[a-zA-Z]|#)[.)] +\S[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*(?: *\(?(?:\d+|[a-zA-Z]|#)[.)] +\S[^\n]*|[ ]{2,}\S[^\n]*)(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "field",
            K::Field,
            r"\A:[^:\n]+:(?:[ \t][^\n]*)?(?:\n|\z)(?:(?:[ \t]*\n)*(?::[^:\n]+:(?:[ \t][^\n]*)?|[ ]+\S[^\n]*)(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "option",
            K::Option,
            r"\A(?:--?|/)\w[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*(?:(?:--?|/)\w[^\n]*|[ ]+\S[^\n]*)(?:\n|\z))*",
        )?,
        // Prefixed blocks; doctest before the generic '>' quote
        BlockPattern::new(
            "doctest",
            K::Doctest,
            r"\A>>>[^\n]*(?:\n|\z)(?:[^\n]*\S[^\n]*(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "quoted-literal",
            K::LiteralBlock,
            r"\A>[^\n]*(?:\n|\z)(?:>[^\n]*(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "line-block",
            K::LineBlock,
            r"\A *\|(?:[ \t][^\n]*)?(?:\n|\z)(?:(?: *\|(?:[ \t][^\n]*)?|[ ]{2,}\S[^\n]*)(?:\n|\z))*",
        )?,
        // Indentation driven
        BlockPattern::new(
            "definition",
            K::Definition,
            r"\A\w[^\n]*\n[ ]+\S[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*(?:[ ]+\S[^\n]*|\w[^\n]*\n[ ]+\S[^\n]*)(?:\n|\z))*",
        )?,
        BlockPattern::new(
            "quote",
            K::Quote,
            r"\A[ ]{2,}\S[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*[ ]{2,}\S[^\n]*(?:\n|\z))*",
        )?,
        // "::" closing a paragraph, then a blank line and an indented body
        BlockPattern::new(
            "literal",
            K::LiteralBlock,
            r"\A::[ \t]*\n(?:[ \t]*\n)+[ ]+\S[^\n]*(?:\n|\z)(?:(?:[ \t]*\n)*[ ]+\S[^\n]*(?:\n|\z))*",
        )?
        .anywhere(),
        // Fallbacks
        BlockPattern::new("newline", K::Newline, r"\A\n")?.anywhere(),
        BlockPattern::new("space", K::Space, r"\A +")?.anywhere(),
        BlockPattern::new("string", K::String, r"\A[^: \n]+")?.anywhere(),
        BlockPattern::new("colon", K::Colon, r"\A:")?.anywhere(),
    ])
}

fn inline_patterns_before_directives() -> Result<Vec<InlinePattern>, String> {
    use TokenKind as K;

    Ok(vec![
        InlinePattern::new("emphasis", K::Emphasis, r"(\*\w[^*\n]*\*)")?,
        InlinePattern::new("strong", K::Strong, r"(\*\*\w[^*\n]*\*\*)")?,
        InlinePattern::new(
            "url",
            K::Url,
            r"(?:^|[^\w/])((?:https?|ftp|file)://[\w\-.:/~%?=&#+@]+)",
        )?,
        InlinePattern::new("link", K::Link, r"\b(\w+_)\b")?,
        InlinePattern::new("phrase-link", K::Link, r"(`[^`\n]+`__?)")?,
        InlinePattern::new("embedded-uri", K::Url, r"(`[^`<\n]+<[^>\n]+>`__?)")?,
        InlinePattern::new("footnote-ref", K::FootnoteRef, r"(\[[\w*#]+\]_)")?,
        InlinePattern::new("substitution", K::Substitution, r"(\|\w[^|\n]*\|)")?,
        InlinePattern::new("target-ref", K::TargetRef, r"(_`[^`\n]+`)")?,
        InlinePattern::new("reference", K::Reference, r"(:[\w.+-]+:`[^`\n]+`)")?,
        // Literal after the others so nothing paints inside ``...``
        InlinePattern::new("literal", K::Literal, r"(``[^`\n]+``)")?,
    ])
}

fn inline_patterns_after_directives() -> Result<Vec<InlinePattern>, String> {
    use TokenKind as K;

    Ok(vec![
        InlinePattern::new("field-name", K::FieldName, r"^:([^:`\n]+):(?:[ \t\n]|$)")?,
        InlinePattern::new("trailing-space", K::TrailingSpace, r"([ \t]+)\r?\n")?,
    ])
}

/// `.. name::` where name is one of the configured directives
fn directive_name_pattern(names: &[String]) -> Result<Option<InlinePattern>, String> {
    if names.is_empty() {
        return Ok(None);
    }

    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"^(\.\. +(?:{})::)", alternation);

    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| format!("Invalid directive keyword pattern: {}", e))?;

    Ok(Some(InlinePattern {
        name: "directive-name",
        kind: TokenKind::DirectiveName,
        regex,
        group: 1,
    }))
}
