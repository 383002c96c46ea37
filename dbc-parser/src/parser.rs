//! Recursive-descent parser for contract predicate expressions
//!
//! The grammar is a small, Python-flavoured expression language. Binding
//! strength, loosest first:
//!
//! 1. conditional `a if c else b`
//! 2. `or`, then `and`, then `not`
//! 3. comparison chains (`==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in`, `is`, `is not`)
//! 4. `+ -`, then `* / // %`
//! 5. unary `-` / `+`, then `**` (right associative)
//! 6. postfix attribute access, calls and indexing

use tracing::trace;

use crate::ast::{BinaryOp, CompareOp, Expr, Literal, LogicalOp, UnaryOp};
use crate::error::ParseError;
use crate::lexer::{Lexer, Spanned, Token};

/// Default nesting limit for a single predicate
pub const DEFAULT_MAX_DEPTH: usize = 64;

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: Vec<Spanned<'a>>,
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> ParseResult<Self> {
        Ok(Self {
            tokens: Lexer::new(source).tokenize()?,
            position: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole input as a single expression
    pub fn parse(mut self) -> ParseResult<Expr> {
        let expr = self.parse_expression()?;
        if self.current().is_some() {
            return Err(self.unexpected("end of expression"));
        }
        trace!(expr = %expr, "parsed predicate");
        Ok(expr)
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.enter()?;
        let result = self.parse_conditional_expression();
        self.leave();
        result
    }

    fn parse_conditional_expression(&mut self) -> ParseResult<Expr> {
        let then_branch = self.parse_or_expression()?;

        if !self.check(&Token::If) {
            return Ok(then_branch);
        }
        self.advance();
        let condition = self.parse_or_expression()?;
        self.consume(&Token::Else, "'else'")?;
        let else_branch = self.parse_expression()?;

        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_or_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and_expression()?;
        let mut nested = 0;

        while self.check(&Token::Or) {
            self.advance();
            self.enter()?;
            nested += 1;
            let right = self.parse_and_expression()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.leave_levels(nested);
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not_expression()?;
        let mut nested = 0;

        while self.check(&Token::And) {
            self.advance();
            self.enter()?;
            nested += 1;
            let right = self.parse_not_expression()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.leave_levels(nested);
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> ParseResult<Expr> {
        if !self.check(&Token::Not) {
            return self.parse_comparison_expression();
        }
        self.advance();
        self.enter()?;
        let operand = self.parse_not_expression();
        self.leave();
        Ok(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand?),
        })
    }

    fn parse_comparison_expression(&mut self) -> ParseResult<Expr> {
        let first = self.parse_additive_expression()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.current() {
                Some(Token::EqEq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                Some(Token::Less) => CompareOp::Less,
                Some(Token::LessEq) => CompareOp::LessEq,
                Some(Token::Greater) => CompareOp::Greater,
                Some(Token::GreaterEq) => CompareOp::GreaterEq,
                Some(Token::In) => CompareOp::In,
                Some(Token::Not) if matches!(self.peek(), Some(Token::In)) => {
                    self.advance();
                    CompareOp::NotIn
                }
                Some(Token::Is) if matches!(self.peek(), Some(Token::Not)) => {
                    self.advance();
                    CompareOp::IsNot
                }
                Some(Token::Is) => CompareOp::Is,
                _ => break,
            };

            self.advance();
            self.enter()?;
            rest.push((op, self.parse_additive_expression()?));
        }

        self.leave_levels(rest.len());
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_additive_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative_expression()?;
        let mut nested = 0;

        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };

            self.advance();
            self.enter()?;
            nested += 1;
            let right = self.parse_multiplicative_expression()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.leave_levels(nested);
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary_expression()?;
        let mut nested = 0;

        loop {
            let op = match self.current() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };

            self.advance();
            self.enter()?;
            nested += 1;
            let right = self.parse_unary_expression()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.leave_levels(nested);
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> ParseResult<Expr> {
        let op = match self.current() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.parse_power_expression(),
        };

        self.advance();
        self.enter()?;
        let operand = self.parse_unary_expression();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_power_expression(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix_expression()?;

        if !self.check(&Token::StarStar) {
            return Ok(base);
        }
        self.advance();
        self.enter()?;
        let exponent = self.parse_unary_expression();
        self.leave();
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent?),
        })
    }

    fn parse_postfix_expression(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary_expression()?;
        let mut nested = 0;

        loop {
            if matches!(
                self.current(),
                Some(Token::Dot | Token::LParen | Token::LBracket)
            ) {
                self.enter()?;
                nested += 1;
            }
            match self.current() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = match self.current() {
                        Some(Token::Ident(name)) => name.to_string(),
                        _ => return Err(self.unexpected("attribute name")),
                    };
                    self.advance();
                    expr = Expr::Attribute {
                        object: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LParen) => {
                    self.advance();
                    let args = self.parse_call_arguments()?;
                    expr = Expr::Call {
                        function: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(&Token::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        self.leave_levels(nested);
        Ok(expr)
    }

    /// Arguments after an opening parenthesis, including the closing one.
    /// A lone generator expression is accepted as the only argument.
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(&Token::RParen) {
            self.advance();
            return Ok(args);
        }

        let first = self.parse_expression()?;
        if self.check(&Token::For) {
            args.push(self.parse_comprehension(first)?);
            self.consume(&Token::RParen, "')'")?;
            return Ok(args);
        }
        args.push(first);

        while self.check(&Token::Comma) {
            self.advance();
            if self.check(&Token::RParen) {
                break;
            }
            args.push(self.parse_expression()?);
        }

        self.consume(&Token::RParen, "')'")?;
        Ok(args)
    }

    /// `for target in iterable [if condition]` following an already parsed element
    fn parse_comprehension(&mut self, element: Expr) -> ParseResult<Expr> {
        self.consume(&Token::For, "'for'")?;
        let target = match self.current() {
            Some(Token::Ident(name)) => name.to_string(),
            _ => return Err(self.unexpected("loop variable")),
        };
        self.advance();
        self.consume(&Token::In, "'in'")?;
        let iterable = self.parse_or_expression()?;

        let condition = if self.check(&Token::If) {
            self.advance();
            Some(Box::new(self.parse_or_expression()?))
        } else {
            None
        };

        Ok(Expr::Comprehension {
            element: Box::new(element),
            target,
            iterable: Box::new(iterable),
            condition,
        })
    }

    fn parse_primary_expression(&mut self) -> ParseResult<Expr> {
        let expr = match self.current() {
            Some(Token::Integer(n)) => Expr::Literal(Literal::Integer(*n)),
            Some(Token::Float(x)) => Expr::Literal(Literal::Float(*x)),
            Some(Token::String(s)) => Expr::Literal(Literal::String(s.clone())),
            Some(Token::True) => Expr::Literal(Literal::Boolean(true)),
            Some(Token::False) => Expr::Literal(Literal::Boolean(false)),
            Some(Token::Nil) => Expr::Literal(Literal::Nil),
            Some(Token::Ident(name)) => Expr::Name(name.to_string()),
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                let inner = if self.check(&Token::For) {
                    self.parse_comprehension(inner)?
                } else {
                    inner
                };
                self.consume(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            Some(Token::LBracket) => {
                self.advance();
                return self.parse_list_display();
            }
            _ => return Err(self.unexpected("expression")),
        };

        self.advance();
        Ok(expr)
    }

    /// List display or list comprehension after the opening bracket
    fn parse_list_display(&mut self) -> ParseResult<Expr> {
        let mut items = Vec::new();

        if self.check(&Token::RBracket) {
            self.advance();
            return Ok(Expr::List(items));
        }

        let first = self.parse_expression()?;
        if self.check(&Token::For) {
            let comprehension = self.parse_comprehension(first)?;
            self.consume(&Token::RBracket, "']'")?;
            return Ok(comprehension);
        }
        items.push(first);

        while self.check(&Token::Comma) {
            self.advance();
            if self.check(&Token::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }

        self.consume(&Token::RBracket, "']'")?;
        Ok(Expr::List(items))
    }

    // Helper methods

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.position).map(|spanned| &spanned.token)
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.position + 1).map(|spanned| &spanned.token)
    }

    fn check(&self, expected: &Token<'a>) -> bool {
        self.current().map(std::mem::discriminant) == Some(std::mem::discriminant(expected))
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn consume(&mut self, expected: &Token<'a>, description: &str) -> ParseResult<()> {
        if self.check(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(description))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.position) {
            Some(spanned) => ParseError::UnexpectedToken {
                position: spanned.span.start,
                expected: expected.to_string(),
                found: spanned.token.to_string(),
            },
            None => ParseError::UnexpectedEof,
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::MaxDepthExceeded {
                depth: self.depth,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Leave the levels entered for each node of a left-leaning chain
    fn leave_levels(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }
}

/// Parse a predicate with the default nesting limit
pub fn parse(source: &str) -> ParseResult<Expr> {
    Parser::new(source)?.parse()
}

/// Parse a predicate with a custom nesting limit
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> ParseResult<Expr> {
    Parser::new(source)?.with_max_depth(max_depth).parse()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
