//! The runtime value enum.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::{ContentKind, Heap, RecordValue};

/// Foreign payloads carried through the engine opaquely.
///
/// Host adapters, reflector handles (`@type`), channel handles
/// (`@channel`), and focus handles (`@focus`) all travel as opaque
/// values; the layer that created them downcasts via `as_any`.
pub trait AnyValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Short description for display and debugging.
    fn describe(&self) -> String {
        "<opaque>".to_string()
    }
}

/// Runtime value.
///
/// Primitives are inline; everything heap-shaped goes through [`Heap`]
/// so sharing is `Arc`-based and thread-safe.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(Heap<BigInt>),
    Decimal(Heap<BigDecimal>),
    Str(Heap<String>),
    List(Heap<Vec<Value>>),
    Record(Heap<RecordValue>),
    Opaque(Heap<dyn AnyValue>),
}

impl Value {
    // Factory methods: the only way to build heap variants.

    pub fn big_int(value: BigInt) -> Value {
        Value::BigInt(Heap::new(value))
    }

    pub fn decimal(value: BigDecimal) -> Value {
        Value::Decimal(Heap::new(value))
    }

    pub fn string(value: impl Into<String>) -> Value {
        Value::Str(Heap::new(value.into()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Heap::new(items))
    }

    pub fn record(record: RecordValue) -> Value {
        Value::Record(Heap::new(record))
    }

    pub fn opaque(payload: impl AnyValue) -> Value {
        let arc: Arc<dyn AnyValue> = Arc::new(payload);
        Value::Opaque(Heap::from_arc(arc))
    }

    /// Dynamic content kind of this value.
    pub fn kind(&self) -> ContentKind {
        match self {
            Value::Bool(_) => ContentKind::Bool,
            Value::Int(_) => ContentKind::Int,
            Value::Long(_) => ContentKind::Long,
            Value::Float(_) => ContentKind::Float,
            Value::Double(_) => ContentKind::Double,
            Value::BigInt(_) => ContentKind::BigInt,
            Value::Decimal(_) => ContentKind::Decimal,
            Value::Str(_) => ContentKind::Str,
            Value::List(_) => ContentKind::List,
            Value::Record(_) => ContentKind::Record,
            Value::Opaque(_) => ContentKind::Opaque,
        }
    }

    // Accessors.

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Heap<RecordValue>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&dyn AnyValue> {
        match self {
            Value::Opaque(payload) => Some(&**payload),
            _ => None,
        }
    }

    /// Downcast an opaque payload.
    pub fn downcast_opaque<T: 'static>(&self) -> Option<&T> {
        self.as_opaque()?.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for Value {
    /// Strict structural equality: same kind, same content. Opaque
    /// payloads and record instances compare by identity first. The `==`
    /// operator uses [`crate::loose_eq`], which promotes across numeric
    /// kinds.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.ptr_eq(b) || **a == **b,
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Long(n) => write!(f, "Long({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Double(x) => write!(f, "Double({x})"),
            Value::BigInt(n) => write!(f, "BigInt({n})"),
            Value::Decimal(x) => write!(f, "Decimal({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => write!(f, "List({items:?})"),
            Value::Record(record) => write!(f, "Record({record:?})"),
            Value::Opaque(payload) => write!(f, "Opaque({})", payload.describe()),
        }
    }
}

impl fmt::Display for Value {
    /// Concatenation-friendly rendering: strings are unquoted, numbers
    /// print in their natural form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::BigInt(n) => write!(f, "{n}"),
            Value::Decimal(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Record(record) => write!(f, "{record}"),
            Value::Opaque(payload) => write!(f, "{}", payload.describe()),
        }
    }
}

// Literal conveniences used throughout the engine and tests.

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_is_concatenation_friendly() {
        assert_eq!(Value::string("ab").to_string(), "ab");
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::string("x")]).to_string(),
            "[1, x]"
        );
    }

    #[test]
    fn strict_equality_does_not_promote() {
        assert_ne!(Value::Int(1), Value::Long(1));
        assert_eq!(Value::Int(1), Value::Int(1));
    }

    struct Marker;
    impl AnyValue for Marker {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn opaque_compares_by_identity() {
        let a = Value::opaque(Marker);
        let b = a.clone();
        let c = Value::opaque(Marker);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.downcast_opaque::<Marker>().is_some());
    }
}
