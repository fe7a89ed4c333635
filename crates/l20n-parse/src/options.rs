//! Parser configuration.

/// Options controlling how a [`Parser`](crate::Parser) treats malformed input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Fail on the first malformed entry instead of recording it as junk
    /// (default: false)
    ///
    /// Strict parsers have no event emitter.
    pub strict: bool,
}

impl ParserOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the first error instead of recovering.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Record malformed entries as junk and keep going.
    pub fn recovering(mut self) -> Self {
        self.strict = false;
        self
    }
}
