//! Primary expressions: literals, identifiers, grouping, record
//! literals, and focus qualifiers.

use rill_ir::{FieldDef, NameId, NodeId, NodeKind, Span, TokenKind};

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    pub(crate) fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let span = self.cursor.current_span();

        let kind = match self.cursor.current_kind().clone() {
            TokenKind::Int(n) => NodeKind::Int(n),
            TokenKind::Long(n) => NodeKind::Long(n),
            TokenKind::Float(bits) => NodeKind::Float(bits),
            TokenKind::Double(bits) => NodeKind::Double(bits),
            TokenKind::True => NodeKind::Bool(true),
            TokenKind::False => NodeKind::Bool(false),
            TokenKind::Null => NodeKind::Null,
            TokenKind::Str(text) => {
                let name = self.arena.intern(&text);
                NodeKind::Str(name)
            }
            TokenKind::Ident(text) => {
                let name = self.arena.intern(&text);
                self.cursor.advance();
                // `Name{...}` is a nominal record literal.
                if self.cursor.check(&TokenKind::LBrace) {
                    return self.parse_record(name, span);
                }
                return Ok(self.alloc(NodeKind::Ident(name), span));
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expression()?;
                if !self.cursor.check(&TokenKind::RParen) {
                    return Err(self
                        .cursor
                        .error(ParseErrorKind::UnclosedDelimiter { delimiter: '(' }));
                }
                self.cursor.advance();
                return Ok(inner);
            }
            TokenKind::LBrace => {
                return self.parse_record(NameId::EMPTY, span);
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                let name = self.cursor.expect_ident()?;
                let name = self.arena.intern(&name);
                let close = self.cursor.current_span();
                if !self.cursor.check(&TokenKind::RBracket) {
                    return Err(self
                        .cursor
                        .error(ParseErrorKind::UnclosedDelimiter { delimiter: '[' }));
                }
                self.cursor.advance();
                return Ok(self.alloc(NodeKind::Scope(name), span.merge(close)));
            }
            _ => return Err(self.cursor.unexpected("an expression")),
        };

        self.cursor.advance();
        Ok(self.alloc(kind, span))
    }

    /// Parse a record literal. The cursor must be at `{`; `name` is the
    /// nominal type name or `NameId::EMPTY` for anonymous records.
    ///
    /// Entries: an optional leading `..base` extent, then comma-separated
    /// fields — `name = expr` (computed), `name := expr` (pass-through),
    /// or bare expressions (positional). Named and positional fields do
    /// not mix.
    fn parse_record(&mut self, name: NameId, start: Span) -> Result<NodeId, ParseError> {
        self.cursor.expect(&TokenKind::LBrace)?;

        let mut base = rill_ir::NodeId::INVALID;
        let mut defs: Vec<FieldDef> = Vec::new();
        let mut saw_named = false;
        let mut saw_positional = false;

        if !self.cursor.check(&TokenKind::RBrace) {
            if self.cursor.check(&TokenKind::DotDot) {
                self.cursor.advance();
                base = self.parse_expression()?;
            } else {
                self.parse_field(&mut defs, &mut saw_named, &mut saw_positional)?;
            }
            while self.cursor.check(&TokenKind::Comma) {
                self.cursor.advance();
                self.parse_field(&mut defs, &mut saw_named, &mut saw_positional)?;
            }
        }

        let close = self.cursor.current_span();
        if !self.cursor.check(&TokenKind::RBrace) {
            return Err(self
                .cursor
                .error(ParseErrorKind::UnclosedDelimiter { delimiter: '{' }));
        }
        self.cursor.advance();

        let fields = self.arena.alloc_fields(&defs);
        Ok(self.alloc(
            NodeKind::Record { name, base, fields },
            start.merge(close),
        ))
    }

    fn parse_field(
        &mut self,
        defs: &mut Vec<FieldDef>,
        saw_named: &mut bool,
        saw_positional: &mut bool,
    ) -> Result<(), ParseError> {
        // A named field is `ident =` or `ident :=`; anything else is a
        // positional value expression.
        let named = matches!(self.cursor.current_kind(), TokenKind::Ident(_))
            && matches!(
                self.cursor.peek_kind(),
                TokenKind::Eq | TokenKind::ColonEq
            );

        if named {
            if *saw_positional {
                return Err(self.cursor.error(ParseErrorKind::MixedFields));
            }
            *saw_named = true;
            let field_name = self.cursor.expect_ident()?;
            let field_name = self.arena.intern(&field_name);
            let pass_through = self.cursor.check(&TokenKind::ColonEq);
            self.cursor.advance(); // `=` or `:=`
            let value = self.parse_expression()?;
            defs.push(FieldDef {
                name: field_name,
                value,
                pass_through,
            });
        } else {
            if *saw_named {
                return Err(self.cursor.error(ParseErrorKind::MixedFields));
            }
            *saw_positional = true;
            let value = self.parse_expression()?;
            defs.push(FieldDef {
                name: NameId::EMPTY,
                value,
                pass_through: false,
            });
        }
        Ok(())
    }
}
