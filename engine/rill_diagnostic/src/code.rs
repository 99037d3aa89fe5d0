//! Stable error codes.

use std::fmt;

/// Searchable error codes, one per distinct failure class.
///
/// `L` codes come from the lexer, `P` from the parser, `B` from the
/// binder. Codes are part of the public contract: hosts match on them,
/// so variants are never renumbered.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer
    /// Unrecognized character.
    L001,
    /// Malformed number literal.
    L002,
    /// Unterminated or malformed string literal.
    L003,

    // Parser
    /// Unexpected token.
    P001,
    /// Unclosed delimiter.
    P002,
    /// Expression nesting too deep.
    P003,
    /// Mixed named and positional record fields.
    P004,
    /// Trailing input after a complete expression.
    P005,

    // Binder
    /// Name not found in any scope.
    B001,
    /// Operator unsupported for the operand type.
    B002,
    /// Missing collection capability.
    B003,
    /// Incompatible cast.
    B004,
    /// Record is missing a required member.
    B005,
    /// Namespace prefix cannot be resolved.
    B006,
    /// Conditional branches have incompatible types.
    B007,
    /// Named scope not found.
    B008,
    /// Unknown meta-operation.
    B009,
    /// Malformed record literal.
    B010,
}

impl ErrorCode {
    /// Short description used as the diagnostic headline fallback.
    pub fn summary(self) -> &'static str {
        match self {
            ErrorCode::L001 => "unrecognized character",
            ErrorCode::L002 => "malformed number literal",
            ErrorCode::L003 => "malformed string literal",
            ErrorCode::P001 => "unexpected token",
            ErrorCode::P002 => "unclosed delimiter",
            ErrorCode::P003 => "expression nesting too deep",
            ErrorCode::P004 => "mixed named and positional fields",
            ErrorCode::P005 => "trailing input after expression",
            ErrorCode::B001 => "name not found",
            ErrorCode::B002 => "operator not supported for this type",
            ErrorCode::B003 => "missing collection capability",
            ErrorCode::B004 => "incompatible cast",
            ErrorCode::B005 => "missing record member",
            ErrorCode::B006 => "unresolved namespace prefix",
            ErrorCode::B007 => "incompatible branch types",
            ErrorCode::B008 => "scope not found",
            ErrorCode::B009 => "unknown meta-operation",
            ErrorCode::B010 => "malformed record literal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The variant name is the code.
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_is_the_code() {
        assert_eq!(ErrorCode::B003.to_string(), "B003");
    }
}
