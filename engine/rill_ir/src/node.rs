//! Flat expression node arena.
//!
//! Nodes reference their children through `NodeId` indices into a single
//! contiguous arena; variable-length child lists and record field lists
//! live in side tables addressed by compact ranges. Identifier text is
//! interned per arena (`NameId`), so structural comparison never compares
//! strings more than once.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{BinaryOp, Span, Spanned, UnaryOp};

/// Index of a node within its arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node" (absent else-branch, absent base extent).
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Arena-interned identifier text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct NameId(u32);

impl NameId {
    /// The pre-interned empty string; used for anonymous records and
    /// positional fields.
    pub const EMPTY: NameId = NameId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

/// Range into the arena's child-list side table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NodeRange {
    start: u32,
    len: u32,
}

impl NodeRange {
    pub const EMPTY: NodeRange = NodeRange { start: 0, len: 0 };

    pub fn len(self) -> usize {
        self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Range into the arena's record-field side table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct FieldRange {
    start: u32,
    len: u32,
}

impl FieldRange {
    pub const EMPTY: FieldRange = FieldRange { start: 0, len: 0 };

    pub fn len(self) -> usize {
        self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// One entry of a record literal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldDef {
    /// `NameId::EMPTY` for positional (tuple) fields.
    pub name: NameId,
    pub value: NodeId,
    /// `name := value` fields delegate get/set live to their source.
    pub pass_through: bool,
}

/// Expression node: kind plus source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { kind, span }
    }
}

impl Spanned for Node {
    fn span(&self) -> Span {
        self.span
    }
}

/// Closed set of expression node kinds.
///
/// All children are arena indices; float literals are stored as raw bits
/// so nodes stay `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    /// `42`
    Int(i32),
    /// `42L`
    Long(i64),
    /// `1.5F` (f32 bits)
    Float(u32),
    /// `1.5`, `42D` (f64 bits)
    Double(u64),
    /// `"text"`
    Str(NameId),
    /// `true`, `false`
    Bool(bool),
    /// `null`
    Null,

    /// Bare name resolved through the focus chain.
    Ident(NameId),

    /// `left op right` for the value-combining operators.
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },

    /// `-x`, `!x`
    Unary { op: UnaryOp, operand: NodeId },

    /// `cond ? then : else`
    Conditional {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },

    /// `left ?? right`
    Coalesce { left: NodeId, right: NodeId },

    /// `receiver.name`
    Member { receiver: NodeId, name: NameId },

    /// `target(args)`
    Call { target: NodeId, args: NodeRange },

    /// `receiver[index]`
    Subscript { receiver: NodeId, index: NodeId },

    /// `start..end` (inclusive) / `start.!end` (exclusive)
    Range {
        start: NodeId,
        end: NodeId,
        inclusive: bool,
    },

    /// `haystack ?= needle`
    Contains { haystack: NodeId, needle: NodeId },

    /// `source # body` — evaluate `body` once per element, collect.
    MapProject { source: NodeId, body: NodeId },

    /// `source $ body` — evaluate `body` once per element, fold with `+`.
    ReduceProject { source: NodeId, body: NodeId },

    /// `target = value` — store on every get.
    Assign { target: NodeId, value: NodeId },

    /// `target := value` — live alias of `value`.
    Alias { target: NodeId, value: NodeId },

    /// `{..base, a = 1, b := x}` / `Name{...}` / `{1, 2, 3}`
    Record {
        /// `NameId::EMPTY` for anonymous records.
        name: NameId,
        /// `NodeId::INVALID` when there is no base extent.
        base: NodeId,
        fields: FieldRange,
    },

    /// `receiver@name(args)`
    Meta {
        receiver: NodeId,
        name: NameId,
        args: NodeRange,
    },

    /// `[name]` — switch to a named scope's subject.
    Scope(NameId),
}

/// Flat storage for one parsed expression.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    lists: Vec<NodeId>,
    fields: Vec<FieldDef>,
    strings: Vec<String>,
    string_map: FxHashMap<String, NameId>,
}

impl NodeArena {
    pub fn new() -> Self {
        let mut arena = NodeArena {
            nodes: Vec::new(),
            lists: Vec::new(),
            fields: Vec::new(),
            strings: Vec::new(),
            string_map: FxHashMap::default(),
        };
        // NameId::EMPTY must always be index 0.
        arena.strings.push(String::new());
        arena.string_map.insert(String::new(), NameId::EMPTY);
        arena
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node, returning its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX - 1));
        self.nodes.push(node);
        id
    }

    /// Fetch a node. `id` must have been allocated by this arena.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Intern identifier or string-literal text.
    pub fn intern(&mut self, text: &str) -> NameId {
        if let Some(&id) = self.string_map.get(text) {
            return id;
        }
        let id = NameId(u32::try_from(self.strings.len()).unwrap_or(u32::MAX));
        self.strings.push(text.to_string());
        self.string_map.insert(text.to_string(), id);
        id
    }

    /// Text for an interned name.
    pub fn text(&self, name: NameId) -> &str {
        &self.strings[name.index()]
    }

    /// Store a child-id list, returning its range.
    pub fn alloc_list(&mut self, ids: &[NodeId]) -> NodeRange {
        let start = u32::try_from(self.lists.len()).unwrap_or(u32::MAX);
        self.lists.extend_from_slice(ids);
        NodeRange {
            start,
            len: u32::try_from(ids.len()).unwrap_or(u32::MAX),
        }
    }

    /// Child ids for a stored range.
    pub fn list(&self, range: NodeRange) -> &[NodeId] {
        let start = range.start as usize;
        &self.lists[start..start + range.len()]
    }

    /// Store a record field list, returning its range.
    pub fn alloc_fields(&mut self, defs: &[FieldDef]) -> FieldRange {
        let start = u32::try_from(self.fields.len()).unwrap_or(u32::MAX);
        self.fields.extend_from_slice(defs);
        FieldRange {
            start,
            len: u32::try_from(defs.len()).unwrap_or(u32::MAX),
        }
    }

    /// Field defs for a stored range.
    pub fn fields(&self, range: FieldRange) -> &[FieldDef] {
        let start = range.start as usize;
        &self.fields[start..start + range.len()]
    }

    /// Direct children of a node, in source order.
    ///
    /// This is the generic tree-walk entry point used by rewriting and
    /// analysis passes.
    pub fn children(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self.get(id).kind {
            NodeKind::Int(_)
            | NodeKind::Long(_)
            | NodeKind::Float(_)
            | NodeKind::Double(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::Null
            | NodeKind::Ident(_)
            | NodeKind::Scope(_) => {}
            NodeKind::Binary { left, right, .. }
            | NodeKind::Coalesce { left, right }
            | NodeKind::Subscript {
                receiver: left,
                index: right,
            }
            | NodeKind::Contains {
                haystack: left,
                needle: right,
            }
            | NodeKind::MapProject {
                source: left,
                body: right,
            }
            | NodeKind::ReduceProject {
                source: left,
                body: right,
            }
            | NodeKind::Assign {
                target: left,
                value: right,
            }
            | NodeKind::Alias {
                target: left,
                value: right,
            } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Range { start, end, .. } => {
                out.push(start);
                out.push(end);
            }
            NodeKind::Unary { operand, .. } => out.push(operand),
            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(cond);
                out.push(then_branch);
                out.push(else_branch);
            }
            NodeKind::Member { receiver, .. } => out.push(receiver),
            NodeKind::Call { target, args } => {
                out.push(target);
                out.extend_from_slice(self.list(args));
            }
            NodeKind::Meta { receiver, args, .. } => {
                out.push(receiver);
                out.extend_from_slice(self.list(args));
            }
            NodeKind::Record { base, fields, .. } => {
                if base.is_valid() {
                    out.push(base);
                }
                for field in self.fields(fields) {
                    out.push(field.value);
                }
            }
        }
        out
    }

    /// Structural equivalence of two subtrees, ignoring spans and arena
    /// layout. Used by the parse/print round-trip contract.
    pub fn equivalent(&self, id: NodeId, other: &NodeArena, other_id: NodeId) -> bool {
        use NodeKind as K;
        let (a, b) = (&self.get(id).kind, &other.get(other_id).kind);
        let same = match (a, b) {
            (K::Int(x), K::Int(y)) => x == y,
            (K::Long(x), K::Long(y)) => x == y,
            (K::Float(x), K::Float(y)) => x == y,
            (K::Double(x), K::Double(y)) => x == y,
            (K::Bool(x), K::Bool(y)) => x == y,
            (K::Null, K::Null) => true,
            (K::Str(x), K::Str(y)) => self.text(*x) == other.text(*y),
            (K::Ident(x), K::Ident(y)) => self.text(*x) == other.text(*y),
            (K::Scope(x), K::Scope(y)) => self.text(*x) == other.text(*y),
            (K::Binary { op: x, .. }, K::Binary { op: y, .. }) => x == y,
            (K::Unary { op: x, .. }, K::Unary { op: y, .. }) => x == y,
            (K::Conditional { .. }, K::Conditional { .. })
            | (K::Coalesce { .. }, K::Coalesce { .. })
            | (K::Subscript { .. }, K::Subscript { .. })
            | (K::Contains { .. }, K::Contains { .. })
            | (K::MapProject { .. }, K::MapProject { .. })
            | (K::ReduceProject { .. }, K::ReduceProject { .. })
            | (K::Assign { .. }, K::Assign { .. })
            | (K::Alias { .. }, K::Alias { .. })
            | (K::Call { .. }, K::Call { .. }) => true,
            (K::Member { name: x, .. }, K::Member { name: y, .. }) => {
                self.text(*x) == other.text(*y)
            }
            (K::Range { inclusive: x, .. }, K::Range { inclusive: y, .. }) => x == y,
            (K::Meta { name: x, .. }, K::Meta { name: y, .. }) => self.text(*x) == other.text(*y),
            (
                K::Record {
                    name: xn,
                    base: xb,
                    fields: xf,
                },
                K::Record {
                    name: yn,
                    base: yb,
                    fields: yf,
                },
            ) => {
                self.text(*xn) == other.text(*yn)
                    && xb.is_valid() == yb.is_valid()
                    && xf.len() == yf.len()
                    && self.fields(*xf).iter().zip(other.fields(*yf)).all(|(p, q)| {
                        self.text(p.name) == other.text(q.name)
                            && p.pass_through == q.pass_through
                    })
            }
            _ => false,
        };
        if !same {
            return false;
        }
        let mine = self.children(id);
        let theirs = other.children(other_id);
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(theirs.iter())
                .all(|(&c, &d)| self.equivalent(c, other, d))
    }
}
