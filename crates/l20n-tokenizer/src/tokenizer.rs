//! Tokenizer for L20n resources.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from L20n source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Per delimiter, the content start of the earliest string found to run
    /// off the end of the input. Indexed by [`delimiter_slot`].
    unterminated: [Option<u32>; 4],
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            unterminated: [None; 4],
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Move the cursor to `pos`, which must lie on a character boundary.
    ///
    /// Positions past the end of the source clamp to the end.
    pub fn reset(&mut self, pos: u32) {
        let pos = (pos as usize).min(self.source.len());
        debug_assert!(self.source.is_char_boundary(pos));
        self.pos = pos as u32;
        self.remaining = &self.source[pos..];
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Advance by n bytes.
    #[inline]
    fn advance_by(&mut self, n: usize) {
        self.pos += n as u32;
        self.remaining = &self.remaining[n..];
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text)
    }

    /// Consume `n` bytes of punctuation and produce a token of `kind`.
    fn punct(&mut self, kind: TokenKind, n: usize) -> Token<'src> {
        let start = self.pos;
        self.advance_by(n);
        self.token(kind, start)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if self.is_eof() {
            return self.token(TokenKind::Eof, self.pos);
        }

        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match c {
            '[' => self.punct(TokenKind::LBracket, 1),
            ']' => self.punct(TokenKind::RBracket, 1),
            '(' => self.punct(TokenKind::LParen, 1),
            ')' => self.punct(TokenKind::RParen, 1),
            '{' => self.punct(TokenKind::LBrace, 1),
            '}' => self.punct(TokenKind::RBrace, 1),
            ',' => self.punct(TokenKind::Comma, 1),
            '.' => self.punct(TokenKind::Dot, 1),
            '?' => self.punct(TokenKind::Question, 1),
            '*' => self.punct(TokenKind::Star, 1),
            '%' => self.punct(TokenKind::Percent, 1),
            '+' => self.punct(TokenKind::Plus, 1),
            '-' => self.punct(TokenKind::Minus, 1),
            '~' => self.punct(TokenKind::Tilde, 1),

            ':' if self.starts_with("::") => self.punct(TokenKind::DoubleColon, 2),
            ':' => self.punct(TokenKind::Colon, 1),
            '<' if self.starts_with("<=") => self.punct(TokenKind::LtEq, 2),
            '<' => self.punct(TokenKind::Lt, 1),
            '>' if self.starts_with(">=") => self.punct(TokenKind::GtEq, 2),
            '>' => self.punct(TokenKind::Gt, 1),
            '!' if self.starts_with("!=") => self.punct(TokenKind::NotEq, 2),
            '!' => self.punct(TokenKind::Bang, 1),
            '=' if self.starts_with("==") => self.punct(TokenKind::EqEq, 2),
            '&' if self.starts_with("&&") => self.punct(TokenKind::AndAnd, 2),
            '|' if self.starts_with("||") => self.punct(TokenKind::OrOr, 2),

            '/' if self.starts_with("/*") => self.tokenize_comment(),
            '/' => self.punct(TokenKind::Slash, 1),

            '\'' | '"' => self.tokenize_string(c),

            '$' => self.tokenize_sigil(TokenKind::Variable),
            '@' => self.tokenize_sigil(TokenKind::Global),

            _ if c.is_ascii_digit() => self.tokenize_number(),
            _ if is_identifier_start(c) => {
                self.eat_identifier();
                self.token(TokenKind::Identifier, start)
            }
            _ if c.is_whitespace() => self.tokenize_whitespace(),

            // Lone `=`, `&`, `|` and anything outside the grammar
            _ => {
                self.advance();
                self.token(TokenKind::Error, start)
            }
        }
    }

    /// Tokenize a run of whitespace, newlines included.
    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        self.token(TokenKind::Whitespace, start)
    }

    /// Consume `[A-Za-z0-9_]*`.
    fn eat_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenize `$name` or `@name`. A sigil not followed by an identifier is an error.
    fn tokenize_sigil(&mut self, kind: TokenKind) -> Token<'src> {
        let start = self.pos;
        self.advance();
        match self.peek() {
            Some(c) if is_identifier_start(c) => {
                self.eat_identifier();
                self.token(kind, start)
            }
            _ => self.token(TokenKind::Error, start),
        }
    }

    /// Tokenize a decimal integer.
    ///
    /// Digits running straight into identifier characters (`012x1`) form a
    /// single error token rather than a number followed by an identifier.
    fn tokenize_number(&mut self) -> Token<'src> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if matches!(self.peek(), Some(c) if is_identifier_start(c)) {
            self.eat_identifier();
            return self.token(TokenKind::Error, start);
        }
        self.token(TokenKind::Number, start)
    }

    /// Tokenize a block comment: `/* ... */`.
    fn tokenize_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        match self.remaining[2..].find("*/") {
            Some(end) => {
                self.advance_by(2 + end + 2);
                self.token(TokenKind::Comment, start)
            }
            None => {
                // Unterminated comment swallows the rest of the input
                self.advance_by(self.remaining.len());
                self.token(TokenKind::Error, start)
            }
        }
    }

    /// Tokenize a quoted string opened by `quote`.
    ///
    /// `'''` and `"""` open a triple-quoted string which may contain the bare
    /// quote character. A backslash always escapes the following character, so
    /// an escaped delimiter never closes the string.
    fn tokenize_string(&mut self, quote: char) -> Token<'src> {
        let start = self.pos;
        let delimiter: &'static str = match (quote, self.peek_nth(1), self.peek_nth(2)) {
            ('\'', Some('\''), Some('\'')) => "'''",
            ('"', Some('"'), Some('"')) => "\"\"\"",
            ('\'', _, _) => "'",
            _ => "\"",
        };
        self.advance_by(delimiter.len());

        // A string opening inside the content of one already known to run off
        // the end sees the same escapes from here on, so it cannot close
        // either. Recovery re-lexes such tails once per junk entry.
        let slot = delimiter_slot(delimiter);
        if self.unterminated[slot].is_some_and(|known| start >= known) {
            self.advance_by(self.remaining.len());
            return self.token(TokenKind::Error, start);
        }

        loop {
            if self.starts_with(delimiter) {
                self.advance_by(delimiter.len());
                return self.token(TokenKind::String, start);
            }
            match self.advance() {
                None => {
                    let content = start + delimiter.len() as u32;
                    let known = self.unterminated[slot].get_or_insert(content);
                    *known = (*known).min(content);
                    return self.token(TokenKind::Error, start);
                }
                Some('\\') => {
                    self.advance();
                }
                Some(_) => {}
            }
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

fn delimiter_slot(delimiter: &str) -> usize {
    match delimiter {
        "'" => 0,
        "\"" => 1,
        "'''" => 2,
        _ => 3,
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
