//! Expression grammar.
//!
//! - `mod.rs`: binary operator precedence chain
//! - `primary.rs`: literals, identifiers, records, focus qualifiers
//! - `postfix.rs`: call, member, subscript, meta chains
//!
//! Innermost-first: postfix → unary → `* / %` → `+ -` → `.. .!` →
//! `# $` → `< > <= >= ?=` → `== !=` → `^` → `&&` → `||` → `??` →
//! `?:` → `= :=`.

mod postfix;
mod primary;

use rill_ir::{BinaryOp, Node, NodeId, NodeKind, Span, TokenKind, UnaryOp};

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// Allocate a node.
    pub(crate) fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.arena.alloc(Node::new(kind, span))
    }

    #[inline]
    pub(crate) fn span_of(&self, id: NodeId) -> Span {
        self.arena.get(id).span
    }

    /// Parse `=` and `:=` (lowest precedence, right-associative).
    pub(crate) fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let left = self.parse_conditional()?;

        if self.cursor.check(&TokenKind::Eq) {
            self.cursor.advance();
            let value = self.parse_expression()?;
            let span = self.span_of(left).merge(self.span_of(value));
            return Ok(self.alloc(
                NodeKind::Assign {
                    target: left,
                    value,
                },
                span,
            ));
        }
        if self.cursor.check(&TokenKind::ColonEq) {
            self.cursor.advance();
            let value = self.parse_expression()?;
            let span = self.span_of(left).merge(self.span_of(value));
            return Ok(self.alloc(
                NodeKind::Alias {
                    target: left,
                    value,
                },
                span,
            ));
        }

        Ok(left)
    }

    /// Parse `cond ? a : b` (right-recursive, so depth-guarded like the
    /// primary recursion).
    fn parse_conditional(&mut self) -> Result<NodeId, ParseError> {
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            Err(self.cursor.error(crate::ParseErrorKind::TooDeep {
                max_depth: self.max_depth,
            }))
        } else {
            self.parse_conditional_inner()
        };
        self.depth -= 1;
        result
    }

    fn parse_conditional_inner(&mut self) -> Result<NodeId, ParseError> {
        let cond = self.parse_coalesce()?;

        if !self.cursor.check(&TokenKind::Question) {
            return Ok(cond);
        }
        self.cursor.advance();
        let then_branch = self.parse_conditional()?;
        self.cursor.expect(&TokenKind::Colon)?;
        let else_branch = self.parse_conditional()?;

        let span = self.span_of(cond).merge(self.span_of(else_branch));
        Ok(self.alloc(
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    /// Parse `??`.
    fn parse_coalesce(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_or()?;

        while self.cursor.check(&TokenKind::QuestionQuestion) {
            self.cursor.advance();
            let right = self.parse_or()?;
            let span = self.span_of(left).merge(self.span_of(right));
            left = self.alloc(NodeKind::Coalesce { left, right }, span);
        }

        Ok(left)
    }

    /// Parse `||`.
    fn parse_or(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_and()?;

        while self.cursor.check(&TokenKind::PipePipe) {
            self.cursor.advance();
            let right = self.parse_and()?;
            left = self.binary(BinaryOp::Or, left, right);
        }

        Ok(left)
    }

    /// Parse `&&`.
    fn parse_and(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_xor()?;

        while self.cursor.check(&TokenKind::AmpAmp) {
            self.cursor.advance();
            let right = self.parse_xor()?;
            left = self.binary(BinaryOp::And, left, right);
        }

        Ok(left)
    }

    /// Parse `^`.
    fn parse_xor(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_equality()?;

        while self.cursor.check(&TokenKind::Caret) {
            self.cursor.advance();
            let right = self.parse_equality()?;
            left = self.binary(BinaryOp::Xor, left, right);
        }

        Ok(left)
    }

    /// Parse `==` and `!=`.
    fn parse_equality(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.cursor.advance();
            let right = self.parse_relational()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse `< > <= >=` and the contains operator `?=`.
    fn parse_relational(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_projection()?;

        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Lt => Some(BinaryOp::Lt),
                TokenKind::Gt => Some(BinaryOp::Gt),
                TokenKind::LtEq => Some(BinaryOp::LtEq),
                TokenKind::GtEq => Some(BinaryOp::GtEq),
                TokenKind::QuestionEq => None,
                _ => break,
            };
            self.cursor.advance();
            let right = self.parse_projection()?;
            left = match op {
                Some(op) => self.binary(op, left, right),
                None => {
                    let span = self.span_of(left).merge(self.span_of(right));
                    self.alloc(
                        NodeKind::Contains {
                            haystack: left,
                            needle: right,
                        },
                        span,
                    )
                }
            };
        }

        Ok(left)
    }

    /// Parse `#` (map projection) and `$` (reduce projection).
    fn parse_projection(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_range()?;

        loop {
            let map = match self.cursor.current_kind() {
                TokenKind::Hash => true,
                TokenKind::Dollar => false,
                _ => break,
            };
            self.cursor.advance();
            let body = self.parse_range()?;
            let span = self.span_of(left).merge(self.span_of(body));
            left = if map {
                self.alloc(NodeKind::MapProject { source: left, body }, span)
            } else {
                self.alloc(NodeKind::ReduceProject { source: left, body }, span)
            };
        }

        Ok(left)
    }

    /// Parse `..` (inclusive) and `.!` (exclusive) ranges.
    fn parse_range(&mut self) -> Result<NodeId, ParseError> {
        let left = self.parse_additive()?;

        let inclusive = match self.cursor.current_kind() {
            TokenKind::DotDot => true,
            TokenKind::DotBang => false,
            _ => return Ok(left),
        };
        self.cursor.advance();
        let end = self.parse_additive()?;
        let span = self.span_of(left).merge(self.span_of(end));
        Ok(self.alloc(
            NodeKind::Range {
                start: left,
                end,
                inclusive,
            },
            span,
        ))
    }

    /// Parse `+` and `-`.
    fn parse_additive(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.cursor.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse `*`, `/`, `%`.
    fn parse_multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.cursor.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse `-x` and `!x`.
    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let op = match self.cursor.current_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };

        let start = self.cursor.current_span();
        self.cursor.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(self.span_of(operand));
        Ok(self.alloc(NodeKind::Unary { op, operand }, span))
    }

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        let span = self.span_of(left).merge(self.span_of(right));
        self.alloc(NodeKind::Binary { op, left, right }, span)
    }
}
