//! The immutable parse product.

use std::fmt;

use crate::{reconstruct, NodeArena, NodeId};

/// A parsed expression: node arena, root id, and the original source.
///
/// Created once by the parser and never mutated afterwards, so it can be
/// shared freely (including across threads) and bound many times against
/// different focus chains.
#[derive(Clone, Debug)]
pub struct Expression {
    source: String,
    arena: NodeArena,
    root: NodeId,
}

impl Expression {
    pub fn new(source: String, arena: NodeArena, root: NodeId) -> Self {
        Expression {
            source,
            arena,
            root,
        }
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Render the tree back to surface syntax (normalized whitespace and
    /// parentheses; reparses to an equivalent tree).
    pub fn reconstruct(&self) -> String {
        reconstruct(&self.arena, self.root)
    }

    /// Structural equivalence with another expression, ignoring spans,
    /// whitespace, and arena layout.
    pub fn equivalent_to(&self, other: &Expression) -> bool {
        self.arena.equivalent(self.root, &other.arena, other.root)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
