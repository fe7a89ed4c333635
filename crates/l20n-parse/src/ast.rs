//! Syntax tree for L20n resources.
//!
//! A [`Resource`] is an ordered list of [`Entry`] values. Entities hold
//! [`Value`]s (strings and hashes) and, for indexes and macros,
//! [`Expression`] trees. Every node covering a source region carries a
//! [`Span`].

use crate::{ParseError, Span};

/// Root of a parsed resource.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resource {
    /// Entries in source order.
    pub body: Vec<Entry>,
}

impl Resource {
    /// Iterate over the entities, skipping comments, imports and junk.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.body.iter().filter_map(|entry| match entry {
            Entry::Entity(entity) => Some(entity),
            _ => None,
        })
    }

    /// Iterate over the junk entries.
    pub fn junk(&self) -> impl Iterator<Item = &JunkEntry> {
        self.body.iter().filter_map(|entry| match entry {
            Entry::Junk(junk) => Some(junk),
            _ => None,
        })
    }

    /// Find the first entity with the given id.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities().find(|entity| entity.id.name == id)
    }
}

/// A top-level entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Entry {
    /// `/* ... */`
    Comment(Comment),
    /// `import('uri')`
    Import(ImportStatement),
    /// `<id ...>`
    Entity(Entity),
    /// Input that failed to parse, kept verbatim.
    Junk(JunkEntry),
}

impl Entry {
    /// Source region covered by this entry.
    pub fn span(&self) -> Span {
        match self {
            Entry::Comment(comment) => comment.span,
            Entry::Import(import) => import.span,
            Entry::Entity(entity) => entity.span,
            Entry::Junk(junk) => junk.span,
        }
    }

    /// Whether this entry is junk.
    pub fn is_junk(&self) -> bool {
        matches!(self, Entry::Junk(_))
    }

    /// The entity, if this entry is one.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Entry::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Name of the variant, as the JavaScript tree called it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Entry::Comment(_) => "Comment",
            Entry::Import(_) => "ImportStatement",
            Entry::Entity(_) => "Entity",
            Entry::Junk(_) => "JunkEntry",
        }
    }
}

/// A block comment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    /// Text between `/*` and `*/`, unmodified.
    pub content: String,
    pub span: Span,
}

/// An import directive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImportStatement {
    /// The imported resource; always a plain string.
    pub uri: StringValue,
    pub span: Span,
}

/// Placeholder for input the parser skipped while recovering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct JunkEntry {
    /// The skipped source text, verbatim.
    pub raw_text: String,
    /// Why the entry failed.
    pub error: ParseError,
    pub span: Span,
}

impl JunkEntry {
    /// The failure message, in `Expected ... at pos N: "..."` form.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// A named, optionally indexed or parameterized localizable unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entity {
    pub id: Identifier,
    /// Index expressions; empty unless brackets were written.
    pub index: Vec<Expression>,
    /// Macro parameters, without their `$` sigil.
    pub args: Vec<Identifier>,
    /// Value of a regular entity.
    pub value: Option<Value>,
    /// Body of a macro.
    pub expression: Option<Expression>,
    /// Attributes in declaration order.
    pub attrs: Vec<Attribute>,
    pub span: Span,
}

impl Entity {
    /// Whether this entity declares parameters.
    pub fn is_macro(&self) -> bool {
        !self.args.is_empty()
    }

    /// Look up an attribute by key.
    pub fn attr(&self, key: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|attr| attr.key.name == key)
    }
}

/// `key: value` metadata attached to an entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    pub key: Identifier,
    pub index: Vec<Expression>,
    pub value: Value,
    /// Marked with a leading `*`.
    pub default: bool,
    pub span: Span,
}

/// A string or hash value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    String(StringValue),
    Hash(HashValue),
}

impl Value {
    pub fn span(&self) -> Span {
        match self {
            Value::String(string) => string.span,
            Value::Hash(hash) => hash.span,
        }
    }

    /// The string, if this is one.
    pub fn as_string(&self) -> Option<&StringValue> {
        match self {
            Value::String(string) => Some(string),
            Value::Hash(_) => None,
        }
    }

    /// Plain text content of a string value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_string().map(|string| string.content.as_str())
    }

    /// The hash, if this is one.
    pub fn as_hash(&self) -> Option<&HashValue> {
        match self {
            Value::Hash(hash) => Some(hash),
            Value::String(_) => None,
        }
    }
}

/// A string literal.
///
/// Plain strings have `segments: None`. Strings with at least one live
/// `{{ name }}` interpolation are complex and carry their decomposition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringValue {
    /// Literal text with quote escapes resolved.
    pub content: String,
    /// Alternating text and reference segments, for complex strings only.
    pub segments: Option<Vec<Segment>>,
    pub span: Span,
}

impl StringValue {
    /// Create a plain string.
    pub fn plain(content: impl Into<String>, span: Span) -> Self {
        Self {
            content: content.into(),
            segments: None,
            span,
        }
    }

    /// Whether the string contains live interpolation.
    pub fn is_complex(&self) -> bool {
        self.segments.is_some()
    }

    /// Names referenced by `{{ }}` spans, in order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .flatten()
            .filter_map(|segment| match segment {
                Segment::Reference(id) => Some(id.name.as_str()),
                Segment::Text(_) => None,
            })
    }
}

/// Part of a complex string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Segment {
    /// Literal text.
    Text(String),
    /// `{{ name }}`
    Reference(Identifier),
}

/// An ordered keyed collection with at most one default item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HashValue {
    pub content: Vec<HashItem>,
    pub span: Span,
}

impl HashValue {
    /// Look up an item by key.
    pub fn get(&self, key: &str) -> Option<&HashItem> {
        self.content.iter().find(|item| item.key.name == key)
    }

    /// The item marked with `*`, if any.
    pub fn default_item(&self) -> Option<&HashItem> {
        self.content.iter().find(|item| item.default)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HashItem {
    pub key: Identifier,
    pub index: Vec<Expression>,
    pub value: Value,
    pub default: bool,
    pub span: Span,
}

/// `[A-Za-z_][A-Za-z0-9_]*`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// An expression in an index, macro body, or call argument.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Expression {
    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    /// `||` and `&&`
    Logical {
        operator: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Equality, relational, additive and multiplicative operators.
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `!x`, `+x`, `-x`
    Unary {
        operator: UnaryOperator,
        argument: Box<Expression>,
    },
    /// `x.y` or `x[y]` (computed).
    Member {
        expression: Box<Expression>,
        property: Box<Expression>,
        computed: bool,
    },
    /// `x::y` or `x::[y]` (computed).
    AttributeAccess {
        expression: Box<Expression>,
        attribute: Box<Expression>,
        computed: bool,
    },
    /// `callee(arguments...)`
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// `(expression)`
    Parenthesized { expression: Box<Expression> },
    /// A bare identifier referencing an entity or macro.
    Identifier(Identifier),
    /// `$name`
    Variable(Identifier),
    /// `@name`
    Global(Identifier),
    /// `~`
    This,
    /// Unsigned decimal literal.
    Number { value: u64 },
    /// String or hash literal.
    Value(Value),
}

impl Expression {
    /// Operator token of a logical, binary or unary node.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Expression::Logical { operator, .. } => Some(operator.as_str()),
            Expression::Binary { operator, .. } => Some(operator.as_str()),
            Expression::Unary { operator, .. } => Some(operator.as_str()),
            _ => None,
        }
    }

    /// Name of an identifier, variable or global reference.
    pub fn name(&self) -> Option<&str> {
        match self {
            Expression::Identifier(id) | Expression::Variable(id) | Expression::Global(id) => {
                Some(id.name.as_str())
            }
            _ => None,
        }
    }

    /// Value of a number literal.
    pub fn number(&self) -> Option<u64> {
        match self {
            Expression::Number { value } => Some(*value),
            _ => None,
        }
    }

    /// Content of a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expression::Value(value) => value.as_str(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LogicalOperator {
    Or,
    And,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::Or => "||",
            LogicalOperator::And => "&&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum UnaryOperator {
    Not,
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}
