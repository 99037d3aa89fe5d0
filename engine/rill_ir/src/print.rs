//! Precedence-aware expression printing.
//!
//! `reconstruct` renders a subtree back to surface syntax. The output is
//! not byte-identical to the original source (whitespace and redundant
//! parentheses are normalized) but reparsing it yields a structurally
//! equivalent tree, which is what diagnostics and expression export rely
//! on.

use crate::{NodeArena, NodeId, NodeKind};

/// Render `root` back to parseable surface text.
pub fn reconstruct(arena: &NodeArena, root: NodeId) -> String {
    let mut out = String::new();
    write_node(arena, root, 0, &mut out);
    out
}

/// Binding strength of a node, mirroring the parser's precedence chain.
fn prec(kind: &NodeKind) -> u8 {
    use crate::BinaryOp as B;
    match kind {
        NodeKind::Assign { .. } | NodeKind::Alias { .. } => 1,
        NodeKind::Conditional { .. } => 2,
        NodeKind::Coalesce { .. } => 3,
        NodeKind::Binary { op, .. } => match op {
            B::Or => 4,
            B::And => 5,
            B::Xor => 6,
            B::Eq | B::NotEq => 7,
            B::Lt | B::Gt | B::LtEq | B::GtEq => 8,
            B::Add | B::Sub => 11,
            B::Mul | B::Div | B::Mod => 12,
        },
        NodeKind::Contains { .. } => 8,
        NodeKind::MapProject { .. } | NodeKind::ReduceProject { .. } => 9,
        NodeKind::Range { .. } => 10,
        NodeKind::Unary { .. } => 13,
        NodeKind::Member { .. }
        | NodeKind::Call { .. }
        | NodeKind::Subscript { .. }
        | NodeKind::Meta { .. } => 14,
        _ => 15,
    }
}

fn write_node(arena: &NodeArena, id: NodeId, min: u8, out: &mut String) {
    let node = arena.get(id);
    let p = prec(&node.kind);
    let parens = p < min;
    if parens {
        out.push('(');
    }
    write_kind(arena, id, p, out);
    if parens {
        out.push(')');
    }
}

fn write_kind(arena: &NodeArena, id: NodeId, p: u8, out: &mut String) {
    use std::fmt::Write;

    match &arena.get(id).kind {
        NodeKind::Int(n) => {
            let _ = write!(out, "{n}");
        }
        NodeKind::Long(n) => {
            let _ = write!(out, "{n}L");
        }
        NodeKind::Float(bits) => {
            let _ = write!(out, "{:?}F", f32::from_bits(*bits));
        }
        NodeKind::Double(bits) => {
            let _ = write!(out, "{:?}", f64::from_bits(*bits));
        }
        NodeKind::Str(name) => write_quoted(arena.text(*name), out),
        NodeKind::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        NodeKind::Null => out.push_str("null"),
        NodeKind::Ident(name) => out.push_str(arena.text(*name)),
        NodeKind::Scope(name) => {
            let _ = write!(out, "[{}]", arena.text(*name));
        }
        NodeKind::Binary { op, left, right } => {
            write_node(arena, *left, p, out);
            let _ = write!(out, " {} ", op.symbol());
            write_node(arena, *right, p + 1, out);
        }
        NodeKind::Unary { op, operand } => {
            out.push_str(op.symbol());
            write_node(arena, *operand, p, out);
        }
        NodeKind::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            write_node(arena, *cond, p + 1, out);
            out.push_str(" ? ");
            write_node(arena, *then_branch, p, out);
            out.push_str(" : ");
            write_node(arena, *else_branch, p, out);
        }
        NodeKind::Coalesce { left, right } => {
            write_node(arena, *left, p, out);
            out.push_str(" ?? ");
            write_node(arena, *right, p + 1, out);
        }
        NodeKind::Member { receiver, name } => {
            write_node(arena, *receiver, p, out);
            out.push('.');
            out.push_str(arena.text(*name));
        }
        NodeKind::Call { target, args } => {
            write_node(arena, *target, p, out);
            out.push('(');
            for (i, &arg) in arena.list(*args).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(arena, arg, 0, out);
            }
            out.push(')');
        }
        NodeKind::Subscript { receiver, index } => {
            write_node(arena, *receiver, p, out);
            out.push('[');
            write_node(arena, *index, 0, out);
            out.push(']');
        }
        NodeKind::Range {
            start,
            end,
            inclusive,
        } => {
            write_node(arena, *start, p + 1, out);
            out.push_str(if *inclusive { ".." } else { ".!" });
            write_node(arena, *end, p + 1, out);
        }
        NodeKind::Contains { haystack, needle } => {
            write_node(arena, *haystack, p, out);
            out.push_str(" ?= ");
            write_node(arena, *needle, p + 1, out);
        }
        NodeKind::MapProject { source, body } => {
            write_node(arena, *source, p, out);
            out.push_str(" # ");
            write_node(arena, *body, p + 1, out);
        }
        NodeKind::ReduceProject { source, body } => {
            write_node(arena, *source, p, out);
            out.push_str(" $ ");
            write_node(arena, *body, p + 1, out);
        }
        NodeKind::Assign { target, value } => {
            write_node(arena, *target, p + 1, out);
            out.push_str(" = ");
            write_node(arena, *value, p, out);
        }
        NodeKind::Alias { target, value } => {
            write_node(arena, *target, p + 1, out);
            out.push_str(" := ");
            write_node(arena, *value, p, out);
        }
        NodeKind::Record { name, base, fields } => {
            if !name.is_empty() {
                out.push_str(arena.text(*name));
            }
            out.push('{');
            let mut first = true;
            if base.is_valid() {
                out.push_str("..");
                write_node(arena, *base, 0, out);
                first = false;
            }
            for field in arena.fields(*fields) {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                if !field.name.is_empty() {
                    out.push_str(arena.text(field.name));
                    out.push_str(if field.pass_through { " := " } else { " = " });
                }
                write_node(arena, field.value, 0, out);
            }
            out.push('}');
        }
        NodeKind::Meta {
            receiver,
            name,
            args,
        } => {
            write_node(arena, *receiver, p, out);
            out.push('@');
            out.push_str(arena.text(*name));
            if !args.is_empty() {
                out.push('(');
                for (i, &arg) in arena.list(*args).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_node(arena, arg, 0, out);
                }
                out.push(')');
            }
        }
    }
}

fn write_quoted(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, Node, NodeKind, Span};
    use pretty_assertions::assert_eq;

    #[test]
    fn parenthesizes_by_precedence() {
        let mut arena = NodeArena::new();
        let one = arena.alloc(Node::new(NodeKind::Int(1), Span::DUMMY));
        let two = arena.alloc(Node::new(NodeKind::Int(2), Span::DUMMY));
        let three = arena.alloc(Node::new(NodeKind::Int(3), Span::DUMMY));
        let add = arena.alloc(Node::new(
            NodeKind::Binary {
                op: BinaryOp::Add,
                left: one,
                right: two,
            },
            Span::DUMMY,
        ));
        let mul = arena.alloc(Node::new(
            NodeKind::Binary {
                op: BinaryOp::Mul,
                left: add,
                right: three,
            },
            Span::DUMMY,
        ));
        assert_eq!(reconstruct(&arena, mul), "(1 + 2) * 3");
    }

    #[test]
    fn strings_are_escaped() {
        let mut arena = NodeArena::new();
        let name = arena.intern("a\"b\n");
        let node = arena.alloc(Node::new(NodeKind::Str(name), Span::DUMMY));
        assert_eq!(reconstruct(&arena, node), "\"a\\\"b\\n\"");
    }
}
