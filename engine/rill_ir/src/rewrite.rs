//! Structural copying of subtrees between arenas.
//!
//! `NodeArena::rewrite` copies a subtree into a target arena, giving a
//! transform callback the chance to substitute any node with one it has
//! already built in the target. This is how imported expressions are
//! parameterized: the host replaces identifier nodes with literals or
//! other subtrees without mutating the shared original.

use crate::{FieldDef, Node, NodeArena, NodeId, NodeKind};

impl NodeArena {
    /// Copy the subtree at `root` into `target`, applying `transform`.
    ///
    /// For every node (parents before children) the callback receives the
    /// source arena, the source id, and the target arena; returning
    /// `Some(id)` substitutes that already-allocated target node and stops
    /// descent, returning `None` copies the node structurally.
    pub fn rewrite<F>(&self, root: NodeId, target: &mut NodeArena, transform: &mut F) -> NodeId
    where
        F: FnMut(&NodeArena, NodeId, &mut NodeArena) -> Option<NodeId>,
    {
        if let Some(replacement) = transform(self, root, target) {
            return replacement;
        }

        let node = self.get(root);
        let span = node.span;
        let kind = match node.kind {
            NodeKind::Int(n) => NodeKind::Int(n),
            NodeKind::Long(n) => NodeKind::Long(n),
            NodeKind::Float(bits) => NodeKind::Float(bits),
            NodeKind::Double(bits) => NodeKind::Double(bits),
            NodeKind::Bool(b) => NodeKind::Bool(b),
            NodeKind::Null => NodeKind::Null,
            NodeKind::Str(name) => NodeKind::Str(target.intern(self.text(name))),
            NodeKind::Ident(name) => NodeKind::Ident(target.intern(self.text(name))),
            NodeKind::Scope(name) => NodeKind::Scope(target.intern(self.text(name))),
            NodeKind::Binary { op, left, right } => NodeKind::Binary {
                op,
                left: self.rewrite(left, target, transform),
                right: self.rewrite(right, target, transform),
            },
            NodeKind::Unary { op, operand } => NodeKind::Unary {
                op,
                operand: self.rewrite(operand, target, transform),
            },
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => NodeKind::Conditional {
                cond: self.rewrite(cond, target, transform),
                then_branch: self.rewrite(then_branch, target, transform),
                else_branch: self.rewrite(else_branch, target, transform),
            },
            NodeKind::Coalesce { left, right } => NodeKind::Coalesce {
                left: self.rewrite(left, target, transform),
                right: self.rewrite(right, target, transform),
            },
            NodeKind::Member { receiver, name } => NodeKind::Member {
                receiver: self.rewrite(receiver, target, transform),
                name: target.intern(self.text(name)),
            },
            NodeKind::Call { target: callee, args } => {
                let callee = self.rewrite(callee, target, transform);
                let copied: Vec<NodeId> = self
                    .list(args)
                    .to_vec()
                    .into_iter()
                    .map(|arg| self.rewrite(arg, target, transform))
                    .collect();
                NodeKind::Call {
                    target: callee,
                    args: target.alloc_list(&copied),
                }
            }
            NodeKind::Subscript { receiver, index } => NodeKind::Subscript {
                receiver: self.rewrite(receiver, target, transform),
                index: self.rewrite(index, target, transform),
            },
            NodeKind::Range {
                start,
                end,
                inclusive,
            } => NodeKind::Range {
                start: self.rewrite(start, target, transform),
                end: self.rewrite(end, target, transform),
                inclusive,
            },
            NodeKind::Contains { haystack, needle } => NodeKind::Contains {
                haystack: self.rewrite(haystack, target, transform),
                needle: self.rewrite(needle, target, transform),
            },
            NodeKind::MapProject { source, body } => NodeKind::MapProject {
                source: self.rewrite(source, target, transform),
                body: self.rewrite(body, target, transform),
            },
            NodeKind::ReduceProject { source, body } => NodeKind::ReduceProject {
                source: self.rewrite(source, target, transform),
                body: self.rewrite(body, target, transform),
            },
            NodeKind::Assign { target: lhs, value } => NodeKind::Assign {
                target: self.rewrite(lhs, target, transform),
                value: self.rewrite(value, target, transform),
            },
            NodeKind::Alias { target: lhs, value } => NodeKind::Alias {
                target: self.rewrite(lhs, target, transform),
                value: self.rewrite(value, target, transform),
            },
            NodeKind::Record { name, base, fields } => {
                let base = if base.is_valid() {
                    self.rewrite(base, target, transform)
                } else {
                    NodeId::INVALID
                };
                let copied: Vec<FieldDef> = self
                    .fields(fields)
                    .to_vec()
                    .into_iter()
                    .map(|field| FieldDef {
                        name: target.intern(self.text(field.name)),
                        value: self.rewrite(field.value, target, transform),
                        pass_through: field.pass_through,
                    })
                    .collect();
                NodeKind::Record {
                    name: target.intern(self.text(name)),
                    base,
                    fields: target.alloc_fields(&copied),
                }
            }
            NodeKind::Meta {
                receiver,
                name,
                args,
            } => {
                let receiver = self.rewrite(receiver, target, transform);
                let copied: Vec<NodeId> = self
                    .list(args)
                    .to_vec()
                    .into_iter()
                    .map(|arg| self.rewrite(arg, target, transform))
                    .collect();
                NodeKind::Meta {
                    receiver,
                    name: target.intern(self.text(name)),
                    args: target.alloc_list(&copied),
                }
            }
        };
        target.alloc(Node::new(kind, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, Span};

    #[test]
    fn rewrite_substitutes_identifiers() {
        let mut src = NodeArena::new();
        let name = src.intern("rate");
        let ident = src.alloc(Node::new(NodeKind::Ident(name), Span::DUMMY));
        let two = src.alloc(Node::new(NodeKind::Int(2), Span::DUMMY));
        let root = src.alloc(Node::new(
            NodeKind::Binary {
                op: BinaryOp::Mul,
                left: ident,
                right: two,
            },
            Span::DUMMY,
        ));

        let mut dst = NodeArena::new();
        let copied = src.rewrite(root, &mut dst, &mut |arena, id, out| {
            match arena.get(id).kind {
                NodeKind::Ident(n) if arena.text(n) == "rate" => {
                    Some(out.alloc(Node::new(NodeKind::Int(5), Span::DUMMY)))
                }
                _ => None,
            }
        });

        assert_eq!(crate::reconstruct(&dst, copied), "5 * 2");
        // The original tree is untouched.
        assert_eq!(crate::reconstruct(&src, root), "rate * 2");
    }
}
