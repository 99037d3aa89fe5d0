//! Token cursor.

use rill_ir::{Span, Token, TokenKind, TokenList};

use crate::{ParseError, ParseErrorKind};

/// Navigation state over a token list.
///
/// The list is always `Eof`-terminated, so `current` never runs off the
/// end. The cursor also owns the error constructors, because every error
/// snapshot needs the same three ingredients it tracks: the current
/// token, its character offset, and the consumed source prefix.
pub struct Cursor<'a> {
    source: &'a str,
    tokens: &'a TokenList,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, tokens: &'a TokenList) -> Self {
        Cursor {
            source,
            tokens,
            pos: 0,
        }
    }

    #[inline]
    pub fn current(&self) -> &Token {
        self.tokens.get(self.pos)
    }

    #[inline]
    pub fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Kind of the token after the current one.
    #[inline]
    pub fn peek_kind(&self) -> &TokenKind {
        &self.tokens.get(self.pos + 1).kind
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consume the current token.
    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Consume `kind` or fail.
    pub fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", kind.symbol())))
        }
    }

    /// Consume an identifier, returning its text.
    pub fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Byte offset of the current token.
    fn byte_offset(&self) -> usize {
        (self.current_span().start as usize).min(self.source.len())
    }

    /// Build an error at the current token.
    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        let byte = self.byte_offset();
        let consumed = &self.source[..byte];
        ParseError {
            kind,
            found: self.current_kind().clone(),
            offset: consumed.chars().count(),
            span: self.current_span(),
            consumed: consumed.trim_end().to_string(),
        }
    }

    /// "expected X, found Y" at the current token.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        self.error(ParseErrorKind::Unexpected {
            expected: expected.to_string(),
            found: self.current_kind().describe(),
        })
    }
}
