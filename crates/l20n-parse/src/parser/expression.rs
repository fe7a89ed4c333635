//! Expression parsing by precedence climbing.
//!
//! From loosest to tightest binding: conditional, `||`, `&&`, equality,
//! relational, additive, multiplicative, unary, postfix, primary. Binary
//! tiers fold left. Whitespace is free between operators and operands,
//! but postfix operators must touch what they apply to.
//!
//! Every nested expression and every fold of an operator chain counts
//! against [`MAX_NESTING`](crate::MAX_NESTING).

use l20n_tokenizer::TokenKind;

use super::{ResourceParser, Result};
use crate::ast::{
    BinaryOperator, Expression, Identifier, LogicalOperator, UnaryOperator, Value,
};
use crate::{ParseErrorKind, Span};

/// Binary operator tiers, loosest first.
const BINARY_TIERS: &[&[(TokenKind, BinaryOperator)]] = &[
    &[
        (TokenKind::EqEq, BinaryOperator::Eq),
        (TokenKind::NotEq, BinaryOperator::NotEq),
    ],
    &[
        (TokenKind::Lt, BinaryOperator::Lt),
        (TokenKind::Gt, BinaryOperator::Gt),
        (TokenKind::LtEq, BinaryOperator::LtEq),
        (TokenKind::GtEq, BinaryOperator::GtEq),
    ],
    &[
        (TokenKind::Plus, BinaryOperator::Add),
        (TokenKind::Minus, BinaryOperator::Sub),
    ],
    &[
        (TokenKind::Star, BinaryOperator::Mul),
        (TokenKind::Slash, BinaryOperator::Div),
        (TokenKind::Percent, BinaryOperator::Rem),
    ],
];

impl<'src> ResourceParser<'src> {
    pub(super) fn expression(&mut self) -> Result<Expression> {
        let span = self.tokens.peek().span;
        self.descend(span)?;
        let expression = self.conditional()?;
        self.ascend(1);
        Ok(expression)
    }

    /// Comma separated expressions up to and including `close`.
    pub(super) fn expression_list(
        &mut self,
        close: TokenKind,
        allow_empty: bool,
    ) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        if !(allow_empty && self.tokens.peek().is(close)) {
            loop {
                items.push(self.expression()?);
                if !self.tokens.peek().is(TokenKind::Comma) {
                    break;
                }
                self.tokens.next();
            }
        }
        self.tokens.skip_whitespace();
        self.expect(close)?;
        Ok(items)
    }

    fn conditional(&mut self) -> Result<Expression> {
        let test = self.logical_or()?;
        if !self.tokens.peek().is(TokenKind::Question) {
            return Ok(test);
        }
        self.tokens.next();

        let consequent = self.expression()?;
        self.tokens.skip_whitespace();
        self.expect(TokenKind::Colon)?;
        let alternate = self.expression()?;

        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn logical_or(&mut self) -> Result<Expression> {
        let mut left = self.logical_and()?;
        let mut folds = 0;
        while self.tokens.peek().is(TokenKind::OrOr) {
            let token = self.tokens.next();
            self.descend(token.span)?;
            folds += 1;
            let right = self.logical_and()?;
            left = Expression::Logical {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.ascend(folds);
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expression> {
        let mut left = self.binary(0)?;
        let mut folds = 0;
        while self.tokens.peek().is(TokenKind::AndAnd) {
            let token = self.tokens.next();
            self.descend(token.span)?;
            folds += 1;
            let right = self.binary(0)?;
            left = Expression::Logical {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.ascend(folds);
        Ok(left)
    }

    /// Parse the binary tier `tier` of [`BINARY_TIERS`], then unary below it.
    fn binary(&mut self, tier: usize) -> Result<Expression> {
        let Some(operators) = BINARY_TIERS.get(tier) else {
            return self.unary();
        };

        let mut left = self.binary(tier + 1)?;
        let mut folds = 0;
        loop {
            let kind = self.tokens.peek().kind;
            let Some(&(_, operator)) = operators.iter().find(|(token, _)| *token == kind) else {
                self.ascend(folds);
                return Ok(left);
            };
            let token = self.tokens.next();
            self.descend(token.span)?;
            folds += 1;
            let right = self.binary(tier + 1)?;
            left = Expression::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn unary(&mut self) -> Result<Expression> {
        let operator = match self.tokens.peek().kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Minus,
            _ => return self.postfix(),
        };
        let token = self.tokens.next();
        self.descend(token.span)?;
        let argument = self.unary()?;
        self.ascend(1);
        Ok(Expression::Unary {
            operator,
            argument: Box::new(argument),
        })
    }

    /// Member access, calls and attribute access on a primary.
    ///
    /// `::` only applies to the primary itself, and nothing but a call may
    /// follow it.
    fn postfix(&mut self) -> Result<Expression> {
        let mut expression = self.primary()?;
        let mut seen_postfix = false;
        let mut seen_attribute = false;
        let mut folds = 0;

        loop {
            let token = self.tokens.peek_raw();
            if matches!(
                token.kind,
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen | TokenKind::DoubleColon
            ) {
                self.descend(token.span)?;
                folds += 1;
            }
            expression = match token.kind {
                TokenKind::Dot | TokenKind::LBracket if seen_attribute => {
                    return Err(self.error(ParseErrorKind::AttributeAccessEnd, token.span));
                }
                TokenKind::Dot => {
                    self.tokens.next();
                    let property = self.identifier()?;
                    Expression::Member {
                        expression: Box::new(expression),
                        property: Box::new(Expression::Identifier(property)),
                        computed: false,
                    }
                }
                TokenKind::LBracket => {
                    self.tokens.next();
                    let property = self.bracketed()?;
                    Expression::Member {
                        expression: Box::new(expression),
                        property: Box::new(property),
                        computed: true,
                    }
                }
                TokenKind::LParen => {
                    self.tokens.next();
                    let arguments = self.expression_list(TokenKind::RParen, true)?;
                    Expression::Call {
                        callee: Box::new(expression),
                        arguments,
                    }
                }
                TokenKind::DoubleColon if seen_postfix => {
                    return Err(self.error(ParseErrorKind::AttributeAccessBase, token.span));
                }
                TokenKind::DoubleColon => {
                    self.tokens.next();
                    let (attribute, computed) = if self.eat(TokenKind::LBracket).is_some() {
                        (self.bracketed()?, true)
                    } else {
                        (Expression::Identifier(self.identifier()?), false)
                    };
                    seen_attribute = true;
                    Expression::AttributeAccess {
                        expression: Box::new(expression),
                        attribute: Box::new(attribute),
                        computed,
                    }
                }
                _ => {
                    self.ascend(folds);
                    return Ok(expression);
                }
            };
            seen_postfix = true;
        }
    }

    /// The rest of `[expr]` after the opening bracket.
    fn bracketed(&mut self) -> Result<Expression> {
        let inner = self.expression()?;
        self.tokens.skip_whitespace();
        self.expect(TokenKind::RBracket)?;
        Ok(inner)
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = self.tokens.peek();
        let sigil_name = || {
            Identifier::new(
                &token.text[1..],
                Span::new(token.span.start + 1, token.span.end),
            )
        };

        let expression = match token.kind {
            TokenKind::Number => {
                self.tokens.next();
                let value = token
                    .text
                    .parse::<u64>()
                    .map_err(|_| self.error(ParseErrorKind::NumberInRange, token.span))?;
                Expression::Number { value }
            }
            TokenKind::Variable => {
                self.tokens.next();
                Expression::Variable(sigil_name())
            }
            TokenKind::Global => {
                self.tokens.next();
                Expression::Global(sigil_name())
            }
            TokenKind::Tilde => {
                self.tokens.next();
                Expression::This
            }
            TokenKind::Identifier => {
                self.tokens.next();
                Expression::Identifier(Identifier::new(token.text, token.span))
            }
            TokenKind::String => {
                self.tokens.next();
                Expression::Value(Value::String(self.string(&token)?))
            }
            TokenKind::LBrace => Expression::Value(Value::Hash(self.hash()?)),
            TokenKind::LParen => {
                self.tokens.next();
                let inner = self.expression()?;
                self.tokens.skip_whitespace();
                self.expect(TokenKind::RParen)?;
                Expression::Parenthesized {
                    expression: Box::new(inner),
                }
            }
            _ => return Err(self.error(ParseErrorKind::Expression, token.span)),
        };
        Ok(expression)
    }
}
