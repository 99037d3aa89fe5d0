//! Tokenizer for rill expression text, built on logos.
//!
//! The raw scan recognizes shapes (numbers, strings, operators); the
//! cooking pass turns slices into typed [`TokenKind`]s — parsing numeric
//! suffixes and string escapes — and reports the malformed ones.

mod cook;
mod error;
mod raw;

pub use error::LexError;

use logos::Logos;
use rill_ir::{Span, Token, TokenKind, TokenList};

use raw::RawToken;

/// Tokenize `source` into a [`TokenList`] terminated by `Eof`.
pub fn lex(source: &str) -> Result<TokenList, LexError> {
    let mut tokens = TokenList::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        let raw = result.map_err(|()| LexError::Unrecognized {
            slice: lexer.slice().to_string(),
            offset: lexer.span().start,
        })?;
        let kind = cook::cook(raw, lexer.slice(), lexer.span().start)?;
        tokens.push(Token::new(kind, span));
    }

    let end = u32::try_from(source.len()).unwrap_or(u32::MAX);
    tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let list = lex(source).unwrap();
        list.as_slice().iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn numbers_and_suffixes() {
        assert_eq!(
            kinds("1 42L 1.5 2D 1.5F 1_000"),
            vec![
                TokenKind::Int(1),
                TokenKind::Long(42),
                TokenKind::Double(1.5f64.to_bits()),
                TokenKind::Double(2.0f64.to_bits()),
                TokenKind::Float(1.5f32.to_bits()),
                TokenKind::Int(1000),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn range_operators_split_integers() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokenKind::Int(1),
                TokenKind::DotDot,
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("1.!5"),
            vec![
                TokenKind::Int(1),
                TokenKind::DotBang,
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn double_character_operators() {
        assert_eq!(
            kinds("<= >= == != && || ?? := ?="),
            vec![
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::QuestionQuestion,
                TokenKind::ColonEq,
                TokenKind::QuestionEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("true false null total_price"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Ident("total_price".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes_are_cooked() {
        assert_eq!(
            kinds(r#""a\"b\n\u{41}""#),
            vec![TokenKind::Str("a\"b\nA".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn int_overflow_needs_long_suffix() {
        let err = lex("2147483648").unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { .. }));
        assert_eq!(lex("2147483648L").unwrap().get(0).kind, TokenKind::Long(2_147_483_648));
    }

    #[test]
    fn unrecognized_character() {
        let err = lex("1 ~ 2").unwrap_err();
        match err {
            LexError::Unrecognized { slice, offset } => {
                assert_eq!(slice, "~");
                assert_eq!(offset, 2);
            }
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn spans_cover_slices() {
        let list = lex("ab + 12").unwrap();
        assert_eq!(list.get(0).span, Span::new(0, 2));
        assert_eq!(list.get(1).span, Span::new(3, 4));
        assert_eq!(list.get(2).span, Span::new(5, 7));
        assert_eq!(list.get(3).span, Span::new(7, 7));
    }
}
