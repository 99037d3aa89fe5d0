//! Content-kind identity.

use std::fmt;

/// The closed set of content kinds the engine distinguishes statically.
///
/// Every reflector reports one of these; the binder's operator strategy
/// selection keys off the left operand's kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ContentKind {
    Int,
    Long,
    Float,
    Double,
    BigInt,
    Decimal,
    Bool,
    Str,
    List,
    Record,
    /// Foreign host value behind an adapter.
    Opaque,
    /// The bottom kind: null literals and typed holes. Assignable to
    /// everything; common type with anything is the other side.
    Nil,
}

impl ContentKind {
    /// Canonical type URI for the built-in kinds.
    pub fn uri(self) -> &'static str {
        match self {
            ContentKind::Int => "rill:int",
            ContentKind::Long => "rill:long",
            ContentKind::Float => "rill:float",
            ContentKind::Double => "rill:double",
            ContentKind::BigInt => "rill:bigint",
            ContentKind::Decimal => "rill:decimal",
            ContentKind::Bool => "rill:bool",
            ContentKind::Str => "rill:str",
            ContentKind::List => "rill:list",
            ContentKind::Record => "rill:record",
            ContentKind::Opaque => "rill:opaque",
            ContentKind::Nil => "rill:nil",
        }
    }

    /// Surface name used in casts and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ContentKind::Int => "int",
            ContentKind::Long => "long",
            ContentKind::Float => "float",
            ContentKind::Double => "double",
            ContentKind::BigInt => "bigint",
            ContentKind::Decimal => "decimal",
            ContentKind::Bool => "boolean",
            ContentKind::Str => "string",
            ContentKind::List => "list",
            ContentKind::Record => "record",
            ContentKind::Opaque => "opaque",
            ContentKind::Nil => "nil",
        }
    }

    /// Parse a surface name back to a kind (used by `@cast`).
    pub fn from_name(name: &str) -> Option<ContentKind> {
        Some(match name {
            "int" => ContentKind::Int,
            "long" => ContentKind::Long,
            "float" => ContentKind::Float,
            "double" => ContentKind::Double,
            "bigint" => ContentKind::BigInt,
            "decimal" => ContentKind::Decimal,
            "boolean" => ContentKind::Bool,
            "string" => ContentKind::Str,
            "list" => ContentKind::List,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ContentKind::Int
                | ContentKind::Long
                | ContentKind::Float
                | ContentKind::Double
                | ContentKind::BigInt
                | ContentKind::Decimal
        )
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
