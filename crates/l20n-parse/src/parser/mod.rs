//! Recursive-descent parser for L20n resources.

use l20n_tokenizer::{Token, TokenKind, Tokenizer};
use tracing::{debug, trace};

use crate::ast::{
    Attribute, Comment, Entity, Entry, Expression, HashItem, HashValue, Identifier,
    ImportStatement, JunkEntry, Resource, StringValue, Value,
};
use crate::emitter::{Emitter, EmitterUnavailable, Event, ListenerId};
use crate::{ParseError, ParseErrorKind, ParserOptions, Span, string};

mod expression;
mod recovery;

#[cfg(test)]
mod tests;

type Result<T> = std::result::Result<T, ParseError>;

/// How deeply expressions and hash values may nest within one entry.
///
/// Operator chains count one level per operator, so `a.b.c` is three
/// levels deep. Entries nested past this become junk.
pub const MAX_NESTING: usize = 64;

/// L20n resource parser.
///
/// A recovering parser (the default) records every malformed entry as a
/// [`JunkEntry`], reports it to `"error"` listeners and carries on, so
/// [`Parser::parse`] never fails. A strict parser returns the first error
/// and has no event emitter.
#[derive(Debug)]
pub struct Parser {
    options: ParserOptions,
    emitter: Option<Emitter>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a recovering parser.
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    /// Create a parser that fails on the first malformed entry.
    pub fn strict() -> Self {
        Self::with_options(ParserOptions::new().strict())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        let emitter = (!options.strict).then(Emitter::new);
        Self { options, emitter }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a complete resource.
    pub fn parse(&mut self, source: &str) -> Result<Resource> {
        let mut parser = ResourceParser::new(source);
        let mut body = Vec::new();

        while let Some(start) = parser.next_entry_start() {
            match parser.entry() {
                Ok(entry) => body.push(entry),
                Err(error) if self.options.strict => {
                    debug!("strict parse failed: {error}");
                    return Err(error);
                }
                Err(error) => {
                    let junk = parser.recover(start, error);
                    if let Some(emitter) = &mut self.emitter {
                        emitter.emit(&Event::Error(&junk.error));
                    }
                    body.push(Entry::Junk(junk));
                }
            }
        }

        let resource = Resource { body };
        debug!(entries = resource.body.len(), "parsed resource");
        if let Some(emitter) = &mut self.emitter {
            emitter.emit(&Event::Change(&resource));
        }
        Ok(resource)
    }

    /// Parse a standalone string body, decomposing `{{ name }}` references.
    ///
    /// Errors are returned in both modes.
    pub fn parse_string(&self, source: &str) -> Result<StringValue> {
        string::parse_string(source)
    }

    /// Subscribe to `"error"` or `"change"` events.
    pub fn add_event_listener<F>(
        &mut self,
        event: &str,
        listener: F,
    ) -> std::result::Result<ListenerId, EmitterUnavailable>
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        let emitter = self.emitter.as_mut().ok_or(EmitterUnavailable)?;
        Ok(emitter.add_event_listener(event, listener))
    }

    /// Unsubscribe a listener. Unknown ids are ignored.
    pub fn remove_event_listener(
        &mut self,
        event: &str,
        id: ListenerId,
    ) -> std::result::Result<(), EmitterUnavailable> {
        let emitter = self.emitter.as_mut().ok_or(EmitterUnavailable)?;
        emitter.remove_event_listener(event, id);
        Ok(())
    }
}

/// Wraps the tokenizer with a single pending slot for one-token lookahead.
#[derive(Clone)]
struct TokenSource<'src> {
    tokenizer: Tokenizer<'src>,
    pending: Option<Token<'src>>,
}

impl<'src> TokenSource<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            pending: None,
        }
    }

    /// Look at the next token, whitespace included.
    fn peek_raw(&mut self) -> Token<'src> {
        self.pending
            .get_or_insert_with(|| self.tokenizer.next_token())
            .clone()
    }

    /// Look at the next non-whitespace token, consuming any whitespace.
    fn peek(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.peek_raw()
    }

    fn next(&mut self) -> Token<'src> {
        self.pending
            .take()
            .unwrap_or_else(|| self.tokenizer.next_token())
    }

    /// Consume a whitespace run. Returns whether there was one.
    fn skip_whitespace(&mut self) -> bool {
        if self.peek_raw().kind.is_trivia() {
            self.next();
            true
        } else {
            false
        }
    }

    fn reset(&mut self, pos: u32) {
        self.pending = None;
        self.tokenizer.reset(pos);
    }
}

/// An attribute or hash item before it is assigned its final node type.
struct KeyedValue {
    key: Identifier,
    index: Vec<Expression>,
    value: Value,
    default: bool,
    span: Span,
}

/// Parsing state for one call to [`Parser::parse`].
struct ResourceParser<'src> {
    source: &'src str,
    tokens: TokenSource<'src>,
    /// Start of the entry being parsed.
    entry_start: u32,
    /// Recovery never resumes before this, even when the error is reported
    /// earlier.
    resume_floor: u32,
    /// Current nesting level, see [`MAX_NESTING`].
    depth: usize,
}

impl<'src> ResourceParser<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: TokenSource::new(source),
            entry_start: 0,
            resume_floor: 0,
            depth: 0,
        }
    }

    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::within(kind, span, self.source, self.entry_start)
    }

    /// Enter one nesting level, failing at `span` past [`MAX_NESTING`].
    ///
    /// Levels left behind by an error are cleared when the next entry starts.
    fn descend(&mut self, span: Span) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(ParseErrorKind::NestingTooDeep, span));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    /// Consume `kind` at the cursor, without skipping whitespace.
    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>> {
        let token = self.tokens.peek_raw();
        if token.is(kind) {
            Ok(self.tokens.next())
        } else {
            Err(self.error(ParseErrorKind::Token(kind), token.span))
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        self.tokens.peek_raw().is(kind).then(|| self.tokens.next())
    }

    fn require_whitespace(&mut self) -> Result<()> {
        if self.tokens.skip_whitespace() {
            return Ok(());
        }
        let token = self.tokens.peek_raw();
        Err(self.error(ParseErrorKind::WhiteSpace, token.span))
    }

    fn identifier(&mut self) -> Result<Identifier> {
        let token = self.tokens.peek_raw();
        if !token.is(TokenKind::Identifier) {
            return Err(self.error(ParseErrorKind::Identifier, token.span));
        }
        self.tokens.next();
        Ok(Identifier::new(token.text, token.span))
    }

    /// Skip to the next entry. Returns its start, or `None` at end of input.
    fn next_entry_start(&mut self) -> Option<u32> {
        let token = self.tokens.peek();
        (!token.is(TokenKind::Eof)).then_some(token.span.start)
    }

    fn entry(&mut self) -> Result<Entry> {
        let token = self.tokens.peek_raw();
        trace!("entry at {}: {:?}", token.span.start, token.kind);
        self.entry_start = token.span.start;
        self.resume_floor = token.span.start;
        self.depth = 0;
        match token.kind {
            TokenKind::Comment => {
                self.tokens.next();
                let content = &token.text[2..token.text.len() - 2];
                Ok(Entry::Comment(Comment {
                    content: content.to_string(),
                    span: token.span,
                }))
            }
            TokenKind::Error if token.text.starts_with("/*") => Err(self.error(
                ParseErrorKind::CommentEnd,
                Span::empty(token.span.end),
            )),
            TokenKind::Identifier if token.text == "import" => self.import().map(Entry::Import),
            TokenKind::Lt => self.entity().map(Entry::Entity),
            _ => Err(self.error(ParseErrorKind::Entry, token.span)),
        }
    }

    /// Turn a failed entry starting at `start` into junk and move past it.
    fn recover(&mut self, start: u32, error: ParseError) -> JunkEntry {
        let failed_at = error.offset().max(self.resume_floor);
        let boundary =
            recovery::next_entry_boundary(self.source, start as usize, failed_at as usize);
        debug!(start, boundary, "recovering from: {error}");
        self.tokens.reset(boundary as u32);
        JunkEntry {
            raw_text: self.source[start as usize..boundary].to_string(),
            error,
            span: Span::new(start, boundary as u32),
        }
    }

    fn import(&mut self) -> Result<ImportStatement> {
        let keyword = self.tokens.next();
        self.expect(TokenKind::LParen)?;
        self.tokens.skip_whitespace();

        let token = self.tokens.peek_raw();
        if !token.is(TokenKind::String) {
            return Err(self.error(ParseErrorKind::Token(TokenKind::String), token.span));
        }
        self.tokens.next();
        let uri = self.string(&token)?;
        if uri.is_complex() {
            return Err(self.error(ParseErrorKind::PlainString, token.span));
        }

        self.tokens.skip_whitespace();
        let close = self.expect(TokenKind::RParen)?;
        Ok(ImportStatement {
            uri,
            span: keyword.span.extend(close.span),
        })
    }

    fn entity(&mut self) -> Result<Entity> {
        let open = self.tokens.next();
        let id = self.identifier()?;
        trace!("entity {}", id.name);

        let mut index = Vec::new();
        let mut args = Vec::new();
        match self.tokens.peek_raw().kind {
            TokenKind::LParen => args = self.macro_args()?,
            TokenKind::LBracket => index = self.index()?,
            _ => {}
        }
        self.require_whitespace()?;

        let (value, expression) = if args.is_empty() {
            (self.value_opt()?, None)
        } else {
            (None, Some(self.macro_body()?))
        };

        let attrs = if value.is_some() || expression.is_some() {
            if self.entity_end()? {
                Vec::new()
            } else {
                self.attributes()?
            }
        } else {
            let token = self.tokens.peek_raw();
            if token.is(TokenKind::Gt) {
                return Err(self.error(ParseErrorKind::Value, token.span));
            }
            self.attributes()?
        };

        let close = self.expect(TokenKind::Gt)?;
        Ok(Entity {
            id,
            index,
            args,
            value,
            expression,
            attrs,
            span: open.span.extend(close.span),
        })
    }

    /// `($a, $b)` directly after a macro id.
    fn macro_args(&mut self) -> Result<Vec<Identifier>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        loop {
            let token = self.tokens.peek();
            if !token.is(TokenKind::Variable) {
                return Err(self.error(ParseErrorKind::Variable, token.span));
            }
            self.tokens.next();
            args.push(Identifier::new(
                &token.text[1..],
                Span::new(token.span.start + 1, token.span.end),
            ));
            if !self.tokens.peek().is(TokenKind::Comma) {
                break;
            }
            self.tokens.next();
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn macro_body(&mut self) -> Result<Expression> {
        self.expect(TokenKind::LBrace)?;
        let body = self.expression()?;
        self.tokens.skip_whitespace();
        self.expect(TokenKind::RBrace)?;
        Ok(body)
    }

    /// `[expr, ...]` directly after an id or key.
    fn index(&mut self) -> Result<Vec<Expression>> {
        self.expect(TokenKind::LBracket)?;
        self.expression_list(TokenKind::RBracket, false)
    }

    fn attributes(&mut self) -> Result<Vec<Attribute>> {
        let mut attrs = Vec::new();
        loop {
            let item = self.keyed_value()?;
            attrs.push(Attribute {
                key: item.key,
                index: item.index,
                value: item.value,
                default: item.default,
                span: item.span,
            });
            if self.entity_end()? {
                return Ok(attrs);
            }
        }
    }

    /// After a value or attribute: true at the closing `>`, false when
    /// white space leads to another attribute.
    fn entity_end(&mut self) -> Result<bool> {
        let spaced = self.tokens.skip_whitespace();
        let token = self.tokens.peek_raw();
        match token.kind {
            TokenKind::Gt => Ok(true),
            TokenKind::Eof => Err(self.error(ParseErrorKind::Token(TokenKind::Gt), token.span)),
            _ if spaced => Ok(false),
            _ => Err(self.error(ParseErrorKind::WhiteSpace, token.span)),
        }
    }

    /// `*key[index]: value`, shared by attributes and hash items.
    fn keyed_value(&mut self) -> Result<KeyedValue> {
        let start = self.tokens.peek_raw().span.start;
        let default = self.eat(TokenKind::Star).is_some();
        let key = self.identifier()?;
        let index = if self.tokens.peek_raw().is(TokenKind::LBracket) {
            self.index()?
        } else {
            Vec::new()
        };

        self.tokens.skip_whitespace();
        self.expect(TokenKind::Colon)?;
        self.tokens.skip_whitespace();
        let value = self.value()?;

        let span = Span::new(start, value.span().end);
        Ok(KeyedValue {
            key,
            index,
            value,
            default,
            span,
        })
    }

    fn value(&mut self) -> Result<Value> {
        match self.value_opt()? {
            Some(value) => Ok(value),
            None => {
                let token = self.tokens.peek_raw();
                Err(self.error(ParseErrorKind::Value, token.span))
            }
        }
    }

    fn value_opt(&mut self) -> Result<Option<Value>> {
        let token = self.tokens.peek_raw();
        if !token.kind.is_value_start() {
            return Ok(None);
        }
        if token.is(TokenKind::LBrace) {
            return Ok(Some(Value::Hash(self.hash()?)));
        }
        self.tokens.next();
        Ok(Some(Value::String(self.string(&token)?)))
    }

    /// Resolve a string token, delimiters included in the resulting span.
    fn string(&self, token: &Token<'src>) -> Result<StringValue> {
        let text = token.text;
        let delimiter = if text.len() >= 6 && (text.starts_with("'''") || text.starts_with("\"\"\""))
        {
            3
        } else {
            1
        };
        let raw = &text[delimiter..text.len() - delimiter];
        let mut value = string::classify(
            raw,
            token.span.start + delimiter as u32,
            self.source,
            self.entry_start,
        )?;
        value.span = token.span;
        Ok(value)
    }

    fn hash(&mut self) -> Result<HashValue> {
        let open = self.expect(TokenKind::LBrace)?;
        self.descend(open.span)?;
        let mut content: Vec<HashItem> = Vec::new();

        if !self.tokens.peek().is(TokenKind::RBrace) {
            loop {
                self.tokens.skip_whitespace();
                let item = self.keyed_value()?;
                if item.default && content.iter().any(|existing| existing.default) {
                    // Reported at the `*`, but the item itself parsed fine
                    self.resume_floor = item.span.end;
                    let star = Span::new(item.span.start, item.span.start + 1);
                    return Err(self.error(ParseErrorKind::SingleDefault, star));
                }
                content.push(HashItem {
                    key: item.key,
                    index: item.index,
                    value: item.value,
                    default: item.default,
                    span: item.span,
                });

                if !self.tokens.peek().is(TokenKind::Comma) {
                    break;
                }
                self.tokens.next();
            }
        }

        self.tokens.skip_whitespace();
        let close = self.expect(TokenKind::RBrace)?;
        self.ascend(1);
        Ok(HashValue {
            content,
            span: open.span.extend(close.span),
        })
    }
}
