#![doc = include_str!("../README.md")]

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::{Tokenizer, is_identifier_char, is_identifier_start};
