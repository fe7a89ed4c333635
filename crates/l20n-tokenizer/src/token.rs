//! Token types for the L20n tokenizer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    // Structural tokens
    /// `<`, opens an entity or compares
    Lt,
    /// `>`, closes an entity or compares
    Gt,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    /// `.`
    Dot,
    /// `?`
    Question,

    // Operators
    /// `*`, multiplication or default marker
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,

    // Atoms
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Identifier,
    /// `$name`
    Variable,
    /// `@name`
    Global,
    /// Unsigned decimal integer, leading zeros allowed.
    Number,
    /// Quoted string including its delimiters: `'a'`, `"a"`, `'''a'''`, `"""a"""`.
    String,

    // Trivia
    /// Block comment `/* ... */`.
    Comment,
    /// A run of whitespace, newlines included.
    Whitespace,

    // Special tokens
    /// End of file
    Eof,
    /// Lexer error (unrecognized or unterminated input)
    Error,
}

impl TokenKind {
    /// Whether this token is whitespace.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }

    /// Whether this token can start a value (string or hash).
    pub fn is_value_start(&self) -> bool {
        matches!(self, TokenKind::String | TokenKind::LBrace)
    }

    /// Human readable form used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Lt => "\"<\"",
            TokenKind::Gt => "\">\"",
            TokenKind::LBracket => "\"[\"",
            TokenKind::RBracket => "\"]\"",
            TokenKind::LParen => "\"(\"",
            TokenKind::RParen => "\")\"",
            TokenKind::LBrace => "\"{\"",
            TokenKind::RBrace => "\"}\"",
            TokenKind::Comma => "\",\"",
            TokenKind::Colon => "\":\"",
            TokenKind::DoubleColon => "\"::\"",
            TokenKind::Dot => "\".\"",
            TokenKind::Question => "\"?\"",
            TokenKind::Star => "\"*\"",
            TokenKind::Slash => "\"/\"",
            TokenKind::Percent => "\"%\"",
            TokenKind::Plus => "\"+\"",
            TokenKind::Minus => "\"-\"",
            TokenKind::Bang => "\"!\"",
            TokenKind::Tilde => "\"~\"",
            TokenKind::EqEq => "\"==\"",
            TokenKind::NotEq => "\"!=\"",
            TokenKind::LtEq => "\"<=\"",
            TokenKind::GtEq => "\">=\"",
            TokenKind::AndAnd => "\"&&\"",
            TokenKind::OrOr => "\"||\"",
            TokenKind::Identifier => "identifier",
            TokenKind::Variable => "variable",
            TokenKind::Global => "global",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "white space",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid input",
        }
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }

    /// Whether this token is of the given kind.
    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
