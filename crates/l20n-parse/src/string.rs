//! String content classification and `{{ name }}` decomposition.

use l20n_tokenizer::{is_identifier_char, is_identifier_start};
use tracing::trace;

use crate::ast::{Identifier, Segment, StringValue};
use crate::{ParseError, ParseErrorKind, Span};

/// Cheap pre-check: whether `raw` could contain interpolation at all.
///
/// Only strings containing `{{` somewhere (escaped or not) are scanned
/// further. Braces split by other characters (`{a{`, `{\{`) never
/// interpolate.
#[inline]
pub fn maybe_complex(raw: &str) -> bool {
    raw.contains("{{")
}

/// Parse a standalone string body into a plain or complex [`StringValue`].
///
/// Unlike strings inside a resource, failures here are always returned to
/// the caller: there is no entry boundary to recover at.
pub fn parse_string(source: &str) -> Result<StringValue, ParseError> {
    classify(source, 0, source, 0)
}

/// Resolve the raw content of a string literal found at `base` in `source`.
///
/// `floor` is the start of the enclosing entry; error context stays after it.
pub(crate) fn classify(
    raw: &str,
    base: u32,
    source: &str,
    floor: u32,
) -> Result<StringValue, ParseError> {
    let span = Span::new(base, base + raw.len() as u32);
    if !maybe_complex(raw) {
        return Ok(StringValue::plain(unescape_quotes(raw), span));
    }

    let (content, segments) = Scanner {
        raw,
        pos: 0,
        base,
        source,
        floor,
    }
    .scan()?;

    let is_complex = segments
        .iter()
        .any(|segment| matches!(segment, Segment::Reference(_)));
    trace!(complex = is_complex, "classified string {:?}", raw);

    Ok(StringValue {
        content,
        segments: is_complex.then_some(segments),
        span,
    })
}

/// Replace `\'` and `\"` with the bare quote. Other backslashes stay.
fn unescape_quotes(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('\'' | '"')) {
            continue;
        }
        out.push(c);
    }
    out
}

struct Scanner<'a> {
    raw: &'a str,
    pos: usize,
    /// Offset of `raw` within `source`.
    base: u32,
    source: &'a str,
    floor: u32,
}

impl<'a> Scanner<'a> {
    #[inline]
    fn rest(&self) -> &'a str {
        &self.raw[self.pos..]
    }

    #[inline]
    fn offset(&self) -> u32 {
        self.base + self.pos as u32
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let len = self.rest().chars().next().map_or(0, |c| c.len_utf8() as u32);
        let start = self.offset();
        ParseError::within(kind, Span::new(start, start + len), self.source, self.floor)
    }

    /// Walk the content, returning the resolved text and its segments.
    fn scan(mut self) -> Result<(String, Vec<Segment>), ParseError> {
        let mut content = String::with_capacity(self.raw.len());
        let mut text = String::new();
        let mut segments = Vec::new();

        while let Some(c) = self.rest().chars().next() {
            let rest = self.rest();
            if rest.starts_with("\\{{") {
                content.push_str("{{");
                text.push_str("{{");
                self.pos += 3;
            } else if rest.starts_with("\\'") || rest.starts_with("\\\"") {
                let quote = &rest[1..2];
                content.push_str(quote);
                text.push_str(quote);
                self.pos += 2;
            } else if rest.starts_with("{{") {
                let open = self.pos;
                let reference = self.interpolation()?;
                content.push_str(&self.raw[open..self.pos]);
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Reference(reference));
            } else {
                content.push(c);
                text.push(c);
                self.pos += c.len_utf8();
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok((content, segments))
    }

    /// `{{ name }}`, with the cursor on the opening braces.
    fn interpolation(&mut self) -> Result<Identifier, ParseError> {
        self.pos += 2;
        self.skip_whitespace();

        let start = self.pos;
        match self.rest().chars().next() {
            Some(c) if is_identifier_start(c) => {}
            _ => return Err(self.error(ParseErrorKind::Identifier)),
        }
        while matches!(self.rest().chars().next(), Some(c) if is_identifier_char(c)) {
            self.pos += 1;
        }
        let name = Identifier::new(
            &self.raw[start..self.pos],
            Span::new(self.base + start as u32, self.offset()),
        );

        self.skip_whitespace();
        if !self.rest().starts_with("}}") {
            return Err(self.error(ParseErrorKind::InterpolationEnd));
        }
        self.pos += 2;
        Ok(name)
    }
}
