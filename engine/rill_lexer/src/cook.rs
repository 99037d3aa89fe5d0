//! Turning raw slices into typed tokens.

use rill_ir::TokenKind;

use crate::{raw::RawToken, LexError};

/// Cook a raw token into its typed [`TokenKind`].
pub(crate) fn cook(raw: RawToken, slice: &str, offset: usize) -> Result<TokenKind, LexError> {
    Ok(match raw {
        RawToken::Number => cook_number(slice, offset)?,
        RawToken::Str => cook_string(slice, offset)?,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Null => TokenKind::Null,
        RawToken::Ident => TokenKind::Ident(slice.to_string()),
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,
        RawToken::Caret => TokenKind::Caret,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Question => TokenKind::Question,
        RawToken::Colon => TokenKind::Colon,
        RawToken::QuestionQuestion => TokenKind::QuestionQuestion,
        RawToken::Eq => TokenKind::Eq,
        RawToken::ColonEq => TokenKind::ColonEq,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Comma => TokenKind::Comma,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Hash => TokenKind::Hash,
        RawToken::Dollar => TokenKind::Dollar,
        RawToken::QuestionEq => TokenKind::QuestionEq,
        RawToken::DotDot => TokenKind::DotDot,
        RawToken::DotBang => TokenKind::DotBang,
        RawToken::At => TokenKind::At,
    })
}

/// Numeric literal rules: suffix `L` ⇒ long, `D` ⇒ double, `F` ⇒ float;
/// a decimal point or exponent without a suffix ⇒ double; otherwise int.
fn cook_number(slice: &str, offset: usize) -> Result<TokenKind, LexError> {
    let malformed = |reason: &str| LexError::MalformedNumber {
        slice: slice.to_string(),
        offset,
        reason: reason.to_string(),
    };

    let (body, suffix) = match slice.chars().last() {
        Some(c @ ('L' | 'l' | 'D' | 'd' | 'F' | 'f')) => {
            (&slice[..slice.len() - 1], Some(c.to_ascii_uppercase()))
        }
        _ => (slice, None),
    };
    let digits: String = body.chars().filter(|&c| c != '_').collect();
    let fractional = digits.contains('.') || digits.contains('e') || digits.contains('E');

    Ok(match suffix {
        Some('L') => {
            if fractional {
                return Err(malformed("`L` suffix is not valid on a fractional literal"));
            }
            let value: i64 = digits
                .parse()
                .map_err(|_| malformed("does not fit in 64-bit long"))?;
            TokenKind::Long(value)
        }
        Some('D') => {
            let value: f64 = digits
                .parse()
                .map_err(|_| malformed("not a valid double"))?;
            TokenKind::Double(value.to_bits())
        }
        Some('F') => {
            let value: f32 = digits.parse().map_err(|_| malformed("not a valid float"))?;
            TokenKind::Float(value.to_bits())
        }
        _ if fractional => {
            let value: f64 = digits
                .parse()
                .map_err(|_| malformed("not a valid double"))?;
            TokenKind::Double(value.to_bits())
        }
        _ => {
            let value: i32 = digits
                .parse()
                .map_err(|_| malformed("does not fit in a 32-bit int"))?;
            TokenKind::Int(value)
        }
    })
}

/// Decode the quoted body of a string literal.
fn cook_string(slice: &str, offset: usize) -> Result<TokenKind, LexError> {
    let malformed = |reason: String| LexError::MalformedString {
        slice: slice.to_string(),
        offset,
        reason,
    };

    // The regex guarantees surrounding quotes.
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err(malformed("expected `{` after `\\u`".to_string()));
                }
                let mut hex = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    hex.push(c);
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| malformed(format!("invalid unicode escape `\\u{{{hex}}}`")))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| malformed(format!("`\\u{{{hex}}}` is not a character")))?;
                out.push(decoded);
            }
            Some(other) => {
                return Err(malformed(format!("unknown escape `\\{other}`")));
            }
            None => {
                return Err(malformed("dangling escape at end of string".to_string()));
            }
        }
    }
    Ok(TokenKind::Str(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn long_suffix_rejects_fraction() {
        let err = cook_number("1.5L", 0).unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { .. }));
    }

    #[test]
    fn exponent_form_is_double() {
        assert_eq!(
            cook_number("1e3", 0).unwrap(),
            TokenKind::Double(1000.0f64.to_bits())
        );
    }

    #[test]
    fn unknown_escape_is_reported() {
        let err = cook_string(r#""a\q""#, 0).unwrap_err();
        assert!(matches!(err, LexError::MalformedString { .. }));
    }
}
