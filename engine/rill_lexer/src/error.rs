//! Lexer errors.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::Span;

/// A tokenization failure.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum LexError {
    #[error("unrecognized character `{slice}` at offset {offset}")]
    Unrecognized { slice: String, offset: usize },

    #[error("malformed number literal `{slice}`: {reason}")]
    MalformedNumber {
        slice: String,
        offset: usize,
        reason: String,
    },

    #[error("malformed string literal `{slice}`: {reason}")]
    MalformedString {
        slice: String,
        offset: usize,
        reason: String,
    },
}

impl LexError {
    /// Byte offset of the offending slice.
    pub fn offset(&self) -> usize {
        match self {
            LexError::Unrecognized { offset, .. }
            | LexError::MalformedNumber { offset, .. }
            | LexError::MalformedString { offset, .. } => *offset,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LexError::Unrecognized { .. } => ErrorCode::L001,
            LexError::MalformedNumber { .. } => ErrorCode::L002,
            LexError::MalformedString { .. } => ErrorCode::L003,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let slice_len = match self {
            LexError::Unrecognized { slice, .. }
            | LexError::MalformedNumber { slice, .. }
            | LexError::MalformedString { slice, .. } => slice.len(),
        };
        let start = u32::try_from(self.offset()).unwrap_or(u32::MAX);
        let end = start.saturating_add(u32::try_from(slice_len).unwrap_or(0));
        let mut diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(Span::new(start, end), "here");
        if let LexError::MalformedNumber { reason, .. } = self {
            if reason.contains("32-bit") {
                diag = diag.with_help("add the `L` suffix for a long literal");
            }
        }
        diag
    }
}
