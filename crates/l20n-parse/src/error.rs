//! Parse errors and their diagnostic rendering.

use ariadne::{Color, Label, Report, ReportKind, Source};
use l20n_tokenizer::TokenKind;

use crate::Span;

/// Bytes of source shown after the error offset in a message.
const CONTEXT_WIDTH: usize = 10;

/// What the parser expected when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ParseErrorKind {
    /// A specific punctuation or operator token.
    Token(TokenKind),
    /// Required whitespace separator.
    WhiteSpace,
    /// Comment, import or entity at the top level.
    Entry,
    /// An identifier (entity id, key, property, interpolated name).
    Identifier,
    /// A `$name` macro parameter.
    Variable,
    /// A string or hash value.
    Value,
    /// A primary expression.
    Expression,
    /// A number literal that fits in 64 bits.
    NumberInRange,
    /// Closing `*/` of a comment.
    CommentEnd,
    /// Closing `}}` of an interpolation.
    InterpolationEnd,
    /// Import argument with interpolation in it.
    PlainString,
    /// Second `*` item in a hash.
    SingleDefault,
    /// `::` after a member access, a call, or another `::`.
    AttributeAccessBase,
    /// `.`, `[` after `::`.
    AttributeAccessEnd,
    /// Expressions or hashes nested past [`MAX_NESTING`](crate::MAX_NESTING).
    NestingTooDeep,
}

impl ParseErrorKind {
    /// The `<description>` part of `Expected <description> at pos ...`.
    pub fn description(&self) -> &'static str {
        match self {
            ParseErrorKind::Token(kind) => kind.describe(),
            ParseErrorKind::WhiteSpace => "white space",
            ParseErrorKind::Entry => "entry",
            ParseErrorKind::Identifier => "identifier",
            ParseErrorKind::Variable => "variable",
            ParseErrorKind::Value => "value",
            ParseErrorKind::Expression => "expression",
            ParseErrorKind::NumberInRange => "number in range",
            ParseErrorKind::CommentEnd => "\"*/\"",
            ParseErrorKind::InterpolationEnd => "\"}}\"",
            ParseErrorKind::PlainString => "plain string",
            ParseErrorKind::SingleDefault => "at most one default item",
            ParseErrorKind::AttributeAccessBase => "attribute access on a plain reference",
            ParseErrorKind::AttributeAccessEnd => "end of attribute access",
            ParseErrorKind::NestingTooDeep => "shallower nesting",
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            ParseErrorKind::WhiteSpace => {
                Some("separate the entity id, its value and its attributes with white space")
            }
            ParseErrorKind::Entry => Some("entries start with `<`, `/*` or `import(`"),
            ParseErrorKind::Value => Some("values are quoted strings or `{ key: value }` hashes"),
            ParseErrorKind::Variable => Some("macro parameters are written `$name`"),
            ParseErrorKind::SingleDefault => Some("only one hash item can be marked with `*`"),
            ParseErrorKind::AttributeAccessBase | ParseErrorKind::AttributeAccessEnd => {
                Some("attributes are read directly from an entity: `entity::attr`")
            }
            ParseErrorKind::InterpolationEnd => Some("close the interpolation with `}}`"),
            ParseErrorKind::NestingTooDeep => {
                Some("move deeply nested expressions or hashes into separate entities")
            }
            _ => None,
        }
    }
}

/// A parser error with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseError {
    /// What was expected.
    pub kind: ParseErrorKind,
    /// The offending input; `span.start` is the reported position.
    pub span: Span,
    /// Source excerpt around the position.
    pub context: String,
}

impl ParseError {
    /// Create a new parse error, capturing context from `source`.
    pub fn new(kind: ParseErrorKind, span: Span, source: &str) -> Self {
        Self::within(kind, span, source, 0)
    }

    /// Like [`ParseError::new`], but the context never reaches back before
    /// `floor`, the start of the entry being parsed.
    pub(crate) fn within(kind: ParseErrorKind, span: Span, source: &str, floor: u32) -> Self {
        let context = context_at(source, floor as usize, span.start as usize).to_string();
        Self {
            kind,
            span,
            context,
        }
    }

    /// Byte offset the error is reported at.
    pub fn offset(&self) -> u32 {
        self.span.start
    }

    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range: std::ops::Range<usize> = self.span.into();
        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(format!("expected {}", self.kind.description()))
            .with_label(
                Label::new((filename, range))
                    .with_message(format!("expected {} here", self.kind.description()))
                    .with_color(Color::Red),
            );
        if let Some(help) = self.kind.help() {
            report = report.with_help(help);
        }
        report
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expected {} at pos {}: \"{}\"",
            self.kind.description(),
            self.span.start,
            self.context
        )
    }
}

impl std::error::Error for ParseError {}

/// Source excerpt for an error at `pos`.
///
/// The window opens at the entity the error sits in: the last `<` between
/// `floor` and `pos`, or just past the last `>` when that comes later. With
/// neither, it opens one character before `pos`. It closes `CONTEXT_WIDTH`
/// bytes past `pos`.
fn context_at(source: &str, floor: usize, pos: usize) -> &str {
    let pos = pos.min(source.len());
    let floor = floor.min(pos);
    let head = &source[floor..pos];
    let start = floor
        + match (head.rfind('<'), head.rfind('>')) {
            (Some(open), Some(close)) if close > open => close + 1,
            (None, Some(close)) => close + 1,
            (Some(open), _) => open,
            (None, None) => head.char_indices().next_back().map_or(0, |(i, _)| i),
        };
    let mut end = (pos + CONTEXT_WIDTH).min(source.len());
    while !source.is_char_boundary(end) {
        end += 1;
    }
    &source[start..end]
}
