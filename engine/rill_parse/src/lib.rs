//! Recursive descent parser for rill expressions.
//!
//! Produces the flat [`rill_ir::Expression`] tree. One method per
//! precedence level; every binary level is left-associative, the
//! conditional is the only right-recursive construct, and `=`/`:=` sit
//! below everything else.

mod cursor;
mod error;
mod grammar;

pub use cursor::Cursor;
pub use error::{ParseError, ParseErrorKind};

use rill_ir::{Expression, NodeArena, NodeId, TokenKind};

/// Default nesting guard; deep enough for handwritten expressions,
/// shallow enough to fail before the stack does.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: NodeArena,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a rill_ir::TokenList, max_depth: usize) -> Self {
        Parser {
            cursor: Cursor::new(source, tokens),
            arena: NodeArena::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Parse a complete expression; trailing tokens are an error.
    fn parse_root(mut self, source: &str) -> Result<Expression, ParseError> {
        let root = self.parse_expression()?;
        if !self.cursor.is_at_end() {
            return Err(self.cursor.error(ParseErrorKind::Trailing));
        }
        Ok(Expression::new(source.to_string(), self.arena, root))
    }

    /// Depth-guarded entry point used by every recursive position.
    pub(crate) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            Err(self.cursor.error(ParseErrorKind::TooDeep {
                max_depth: self.max_depth,
            }))
        } else {
            self.parse_assignment()
        };
        self.depth -= 1;
        result
    }
}

/// Parse `source` with the default nesting limit.
pub fn parse(source: &str) -> Result<Expression, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse `source`, failing once nesting exceeds `max_depth`.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Expression, ParseError> {
    let tokens = rill_lexer::lex(source).map_err(|err| {
        let offset = err.offset().min(source.len());
        let consumed = &source[..offset];
        ParseError {
            offset: consumed.chars().count(),
            span: rill_ir::Span::new(
                u32::try_from(offset).unwrap_or(u32::MAX),
                u32::try_from(offset).unwrap_or(u32::MAX),
            ),
            consumed: consumed.trim_end().to_string(),
            found: TokenKind::Eof,
            kind: ParseErrorKind::Lex(err),
        }
    })?;
    tracing::trace!(source, "parsing expression");
    Parser::new(source, &tokens, max_depth).parse_root(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_ir::{BinaryOp, NodeKind};

    fn parse_ok(source: &str) -> Expression {
        match parse(source) {
            Ok(expr) => expr,
            Err(err) => panic!("parse of `{source}` failed: {err}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_ok("1+2*3");
        let arena = expr.arena();
        let NodeKind::Binary { op, left, right } = arena.get(expr.root()).kind else {
            panic!("expected binary root");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(arena.get(left).kind, NodeKind::Int(1)));
        assert!(matches!(
            arena.get(right).kind,
            NodeKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse_ok("(1+2)*3");
        let arena = expr.arena();
        let NodeKind::Binary { op, left, .. } = arena.get(expr.root()).kind else {
            panic!("expected binary root");
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(
            arena.get(left).kind,
            NodeKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn conditional_is_right_recursive() {
        let expr = parse_ok("a ? b : c ? d : e");
        let arena = expr.arena();
        let NodeKind::Conditional { else_branch, .. } = arena.get(expr.root()).kind else {
            panic!("expected conditional root");
        };
        assert!(matches!(
            arena.get(else_branch).kind,
            NodeKind::Conditional { .. }
        ));
    }

    #[test]
    fn postfix_chains_left_to_right() {
        let expr = parse_ok("order.items[0].price");
        let arena = expr.arena();
        let NodeKind::Member { receiver, name } = arena.get(expr.root()).kind else {
            panic!("expected member root");
        };
        assert_eq!(arena.text(name), "price");
        assert!(matches!(
            arena.get(receiver).kind,
            NodeKind::Subscript { .. }
        ));
    }

    #[test]
    fn ranges_and_projections() {
        let expr = parse_ok("1..5 # x*2");
        let arena = expr.arena();
        let NodeKind::MapProject { source, body } = arena.get(expr.root()).kind else {
            panic!("expected projection root");
        };
        assert!(matches!(
            arena.get(source).kind,
            NodeKind::Range {
                inclusive: true,
                ..
            }
        ));
        assert!(matches!(
            arena.get(body).kind,
            NodeKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));

        let expr = parse_ok("1.!5");
        assert!(matches!(
            expr.arena().get(expr.root()).kind,
            NodeKind::Range {
                inclusive: false,
                ..
            }
        ));
    }

    #[test]
    fn contains_sits_with_relational_operators() {
        let expr = parse_ok("basket ?= item && ok");
        let arena = expr.arena();
        let NodeKind::Binary {
            op: BinaryOp::And,
            left,
            ..
        } = arena.get(expr.root()).kind
        else {
            panic!("expected && root");
        };
        assert!(matches!(arena.get(left).kind, NodeKind::Contains { .. }));
    }

    #[test]
    fn coalesce_binds_looser_than_or() {
        let expr = parse_ok("a || b ?? c");
        let arena = expr.arena();
        assert!(matches!(
            arena.get(expr.root()).kind,
            NodeKind::Coalesce { .. }
        ));
    }

    #[test]
    fn meta_operations() {
        let expr = parse_ok("items@size");
        let arena = expr.arena();
        let NodeKind::Meta { name, args, .. } = arena.get(expr.root()).kind else {
            panic!("expected meta root");
        };
        assert_eq!(arena.text(name), "size");
        assert!(args.is_empty());

        let expr = parse_ok("total@cast(long)");
        let arena = expr.arena();
        let NodeKind::Meta { name, args, .. } = arena.get(expr.root()).kind else {
            panic!("expected meta root");
        };
        assert_eq!(arena.text(name), "cast");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn record_literals() {
        let expr = parse_ok("{a = 1, b := x.y}");
        let arena = expr.arena();
        let NodeKind::Record { name, base, fields } = arena.get(expr.root()).kind else {
            panic!("expected record root");
        };
        assert!(name.is_empty());
        assert!(!base.is_valid());
        let defs = arena.fields(fields);
        assert_eq!(defs.len(), 2);
        assert_eq!(arena.text(defs[0].name), "a");
        assert!(!defs[0].pass_through);
        assert_eq!(arena.text(defs[1].name), "b");
        assert!(defs[1].pass_through);
    }

    #[test]
    fn record_with_base_and_nominal_name() {
        let expr = parse_ok("Point{..origin, x = 1}");
        let arena = expr.arena();
        let NodeKind::Record { name, base, fields } = arena.get(expr.root()).kind else {
            panic!("expected record root");
        };
        assert_eq!(arena.text(name), "Point");
        assert!(base.is_valid());
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn tuple_literal_is_positional() {
        let expr = parse_ok("{1, 2, 3}");
        let arena = expr.arena();
        let NodeKind::Record { fields, .. } = arena.get(expr.root()).kind else {
            panic!("expected record root");
        };
        assert!(arena.fields(fields).iter().all(|f| f.name.is_empty()));
    }

    #[test]
    fn mixed_record_fields_are_rejected() {
        let err = parse("{a = 1, 2}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MixedFields);
    }

    #[test]
    fn focus_qualifier() {
        let expr = parse_ok("[order].total");
        let arena = expr.arena();
        let NodeKind::Member { receiver, .. } = arena.get(expr.root()).kind else {
            panic!("expected member root");
        };
        assert!(matches!(arena.get(receiver).kind, NodeKind::Scope(_)));
    }

    #[test]
    fn assignment_and_alias() {
        let expr = parse_ok("x.y = 1 + 2");
        assert!(matches!(
            expr.arena().get(expr.root()).kind,
            NodeKind::Assign { .. }
        ));
        let expr = parse_ok("alias := source.field");
        assert!(matches!(
            expr.arena().get(expr.root()).kind,
            NodeKind::Alias { .. }
        ));
    }

    #[test]
    fn error_preserves_offset_and_consumed_text() {
        let err = parse("1 + (2 *").unwrap_err();
        assert_eq!(err.offset, 8);
        assert_eq!(err.consumed, "1 + (2 *");
        assert_eq!(err.found, TokenKind::Eof);
    }

    #[test]
    fn unclosed_paren_is_reported() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnclosedDelimiter { delimiter: '(' }
        );
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        let err = parse_with_max_depth(&source, 16).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::TooDeep { .. }));
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = parse("1 2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Trailing);
    }

    #[test]
    fn reconstruct_round_trips_structurally() {
        for source in [
            "1+2*3",
            "(1+2)*3",
            "a.b[c] ?= d",
            "x ? y : z ?? w",
            "-total + !flag ? 1 : 2",
            "{a = 1, b := x} # b",
            "Point{..origin, x = 1}",
            "1..5 $ x*x",
            "items@size > 0 && items@list ?= needle",
            "\"a\\\"b\" + 1.5F + 2L",
        ] {
            let first = parse_ok(source);
            let printed = first.reconstruct();
            let second = parse_ok(&printed);
            assert!(
                first.equivalent_to(&second),
                "round trip changed structure: `{source}` -> `{printed}`"
            );
        }
    }
}
