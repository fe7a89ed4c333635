#![doc = include_str!("../README.md")]

pub use l20n_tokenizer::{Span, Token, TokenKind, Tokenizer};

pub mod ast;
pub use ast::Resource;

mod emitter;
pub use emitter::{Emitter, EmitterUnavailable, Event, ListenerId};

mod error;
pub use error::{ParseError, ParseErrorKind};

mod options;
pub use options::ParserOptions;

mod parser;
pub use parser::{MAX_NESTING, Parser};

mod string;
pub use string::maybe_complex;

/// Parse a resource, recording malformed entries as junk.
pub fn parse(source: &str) -> Resource {
    // A recovering parser never returns an error
    Parser::new().parse(source).unwrap_or_default()
}

/// Parse a resource, failing on the first malformed entry.
pub fn parse_strict(source: &str) -> Result<Resource, ParseError> {
    Parser::strict().parse(source)
}

/// Parse a standalone string body into a plain or complex string.
pub fn parse_string(source: &str) -> Result<ast::StringValue, ParseError> {
    string::parse_string(source)
}
