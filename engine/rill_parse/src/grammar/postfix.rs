//! Postfix chains: calls, members, subscripts, meta-operations.

use rill_ir::{NodeId, NodeKind, NodeRange, TokenKind};

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    /// Parse a primary expression followed by any number of postfix
    /// operations, composing left to right.
    pub(crate) fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.cursor.current_kind() {
                TokenKind::LParen => {
                    let args = self.parse_args()?;
                    let span = self.span_of(expr).merge(self.cursor.current_span());
                    expr = self.alloc(NodeKind::Call { target: expr, args }, span);
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let index = self.parse_expression()?;
                    let close = self.cursor.current_span();
                    if !self.cursor.check(&TokenKind::RBracket) {
                        return Err(self
                            .cursor
                            .error(ParseErrorKind::UnclosedDelimiter { delimiter: '[' }));
                    }
                    self.cursor.advance();
                    let span = self.span_of(expr).merge(close);
                    expr = self.alloc(
                        NodeKind::Subscript {
                            receiver: expr,
                            index,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    let end = self.cursor.current_span();
                    let name = self.cursor.expect_ident()?;
                    let name = self.arena.intern(&name);
                    let span = self.span_of(expr).merge(end);
                    expr = self.alloc(
                        NodeKind::Member {
                            receiver: expr,
                            name,
                        },
                        span,
                    );
                }
                TokenKind::At => {
                    self.cursor.advance();
                    let end = self.cursor.current_span();
                    let name = self.cursor.expect_ident()?;
                    let name = self.arena.intern(&name);
                    let args = if self.cursor.check(&TokenKind::LParen) {
                        self.parse_args()?
                    } else {
                        NodeRange::EMPTY
                    };
                    let span = self.span_of(expr).merge(end);
                    expr = self.alloc(
                        NodeKind::Meta {
                            receiver: expr,
                            name,
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse a parenthesized, comma-separated argument list. The cursor
    /// must be at `(`.
    pub(crate) fn parse_args(&mut self) -> Result<NodeRange, ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.cursor.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.cursor.check(&TokenKind::Comma) {
                    break;
                }
                self.cursor.advance();
            }
        }
        if !self.cursor.check(&TokenKind::RParen) {
            return Err(self
                .cursor
                .error(ParseErrorKind::UnclosedDelimiter { delimiter: '(' }));
        }
        self.cursor.advance();
        Ok(self.arena.alloc_list(&args))
    }
}
