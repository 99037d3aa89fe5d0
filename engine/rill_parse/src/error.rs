//! Parse errors.
//!
//! A parse failure always records three things alongside its kind: the
//! offending token, the 0-based character offset of that token, and the
//! source text consumed up to the failure point. The consumed buffer is
//! what makes downstream "your expression was understood this far"
//! diagnostics possible, so it is captured eagerly at construction.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{Span, TokenKind};
use rill_lexer::LexError;

/// A parse failure.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("{kind} (at offset {offset}, after `{consumed}`)")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The token the parser was looking at when it failed.
    pub found: TokenKind,
    /// 0-based character offset of `found` in the source.
    pub offset: usize,
    /// Source span of `found`.
    pub span: Span,
    /// Everything successfully consumed before the failure.
    pub consumed: String,
}

/// Specific kinds of parse failure.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("unclosed `{delimiter}`")]
    UnclosedDelimiter { delimiter: char },

    #[error("expression nesting exceeds {max_depth} levels")]
    TooDeep { max_depth: usize },

    #[error("record fields must be all named or all positional")]
    MixedFields,

    #[error("unexpected trailing input after a complete expression")]
    Trailing,

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            ParseErrorKind::Unexpected { .. } => ErrorCode::P001,
            ParseErrorKind::UnclosedDelimiter { .. } => ErrorCode::P002,
            ParseErrorKind::TooDeep { .. } => ErrorCode::P003,
            ParseErrorKind::MixedFields => ErrorCode::P004,
            ParseErrorKind::Trailing => ErrorCode::P005,
            ParseErrorKind::Lex(err) => err.code(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code())
            .with_message(self.kind.to_string())
            .with_label(self.span, "here");
        if !self.consumed.is_empty() {
            diag = diag.with_help(format!("understood up to `{}`", self.consumed));
        }
        diag
    }
}
