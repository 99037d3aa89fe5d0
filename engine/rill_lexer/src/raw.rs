//! Raw token shapes recognized by the logos scanner.

use logos::Logos;

/// Raw token from logos, before cooking.
///
/// Number and string tokens are recognized by shape only; `cook` turns
/// the matched slice into a typed value. The float branch of the number
/// regex requires a digit after the dot, so `1..5` scans as
/// `Int DotDot Int` rather than swallowing `1.` as a double.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum RawToken {
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?[LlDdFf]?")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,

    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,

    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("??")]
    QuestionQuestion,

    #[token("=")]
    Eq,
    #[token(":=")]
    ColonEq,

    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[token("#")]
    Hash,
    #[token("$")]
    Dollar,
    #[token("?=")]
    QuestionEq,
    #[token("..")]
    DotDot,
    #[token(".!")]
    DotBang,

    #[token("@")]
    At,
}
