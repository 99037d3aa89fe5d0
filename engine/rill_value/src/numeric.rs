//! The numeric tower: promotion lattice, arithmetic, and comparison.
//!
//! Arithmetic follows the promoted kind's native Rust semantics —
//! integer division by zero panics, float division yields inf/NaN.
//! Nothing here intercepts those outcomes. `BigDecimal %` is remainder
//! (result takes the dividend's sign), not true modulus.

use std::cmp::Ordering;

use bigdecimal::{BigDecimal, FromPrimitive};
use num_bigint::BigInt;

use crate::{ContentKind, Value};

/// The six numeric kinds, in promotion dominance order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NumericKind {
    Int,
    Long,
    Float,
    Double,
    BigInt,
    Decimal,
}

impl NumericKind {
    pub fn content(self) -> ContentKind {
        match self {
            NumericKind::Int => ContentKind::Int,
            NumericKind::Long => ContentKind::Long,
            NumericKind::Float => ContentKind::Float,
            NumericKind::Double => ContentKind::Double,
            NumericKind::BigInt => ContentKind::BigInt,
            NumericKind::Decimal => ContentKind::Decimal,
        }
    }

    pub fn from_content(kind: ContentKind) -> Option<NumericKind> {
        Some(match kind {
            ContentKind::Int => NumericKind::Int,
            ContentKind::Long => NumericKind::Long,
            ContentKind::Float => NumericKind::Float,
            ContentKind::Double => NumericKind::Double,
            ContentKind::BigInt => NumericKind::BigInt,
            ContentKind::Decimal => NumericKind::Decimal,
            _ => return None,
        })
    }
}

/// The fixed pairwise promotion lattice.
///
/// - either operand decimal ⇒ decimal
/// - else either operand bigint: with a float/double partner ⇒ decimal
///   (fractions are never truncated), otherwise ⇒ bigint
/// - else either operand double ⇒ double
/// - else either operand float ⇒ float
/// - else either operand long ⇒ long
/// - else ⇒ int
pub fn promote(a: NumericKind, b: NumericKind) -> NumericKind {
    use NumericKind::*;
    match (a, b) {
        (Decimal, _) | (_, Decimal) => Decimal,
        (BigInt, Float | Double) | (Float | Double, BigInt) => Decimal,
        (BigInt, _) | (_, BigInt) => BigInt,
        (Double, _) | (_, Double) => Double,
        (Float, _) | (_, Float) => Float,
        (Long, _) | (_, Long) => Long,
        (Int, Int) => Int,
    }
}

// Coercions into the promoted representation. These return `None` only
// for non-numeric values; within the tower every smaller kind widens.

fn to_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Int(n) => Some(*n),
        _ => None,
    }
}

fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(i64::from(*n)),
        Value::Long(n) => Some(*n),
        _ => None,
    }
}

fn to_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Int(n) => Some(*n as f32),
        Value::Long(n) => Some(*n as f32),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(f64::from(*n)),
        Value::Long(n) => Some(*n as f64),
        Value::Float(x) => Some(f64::from(*x)),
        Value::Double(x) => Some(*x),
        _ => None,
    }
}

fn to_bigint(value: &Value) -> Option<BigInt> {
    match value {
        Value::Int(n) => Some(BigInt::from(*n)),
        Value::Long(n) => Some(BigInt::from(*n)),
        Value::BigInt(n) => Some((**n).clone()),
        _ => None,
    }
}

fn to_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Int(n) => Some(BigDecimal::from(*n)),
        Value::Long(n) => Some(BigDecimal::from(*n)),
        Value::Float(x) => BigDecimal::from_f32(*x),
        Value::Double(x) => BigDecimal::from_f64(*x),
        Value::BigInt(n) => Some(BigDecimal::from((**n).clone())),
        Value::Decimal(x) => Some((**x).clone()),
        _ => None,
    }
}

macro_rules! numeric_op {
    ($name:ident, $op:tt) => {
        /// Apply the operator at the given promoted kind. Returns `None`
        /// when an operand is not numeric.
        pub fn $name(kind: NumericKind, left: &Value, right: &Value) -> Option<Value> {
            Some(match kind {
                NumericKind::Int => Value::Int(to_i32(left)? $op to_i32(right)?),
                NumericKind::Long => Value::Long(to_i64(left)? $op to_i64(right)?),
                NumericKind::Float => Value::Float(to_f32(left)? $op to_f32(right)?),
                NumericKind::Double => Value::Double(to_f64(left)? $op to_f64(right)?),
                NumericKind::BigInt => Value::big_int(to_bigint(left)? $op to_bigint(right)?),
                NumericKind::Decimal => Value::decimal(to_decimal(left)? $op to_decimal(right)?),
            })
        }
    };
}

numeric_op!(numeric_add, +);
numeric_op!(numeric_sub, -);
numeric_op!(numeric_mul, *);
numeric_op!(numeric_div, /);
numeric_op!(numeric_rem, %);

/// Three-way comparison: numeric pairs compare after promotion, strings
/// compare lexicographically. Everything else is unordered.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Some(a.as_str().cmp(b.as_str()));
    }
    let a = NumericKind::from_content(left.kind())?;
    let b = NumericKind::from_content(right.kind())?;
    match promote(a, b) {
        NumericKind::Int => Some(to_i32(left)?.cmp(&to_i32(right)?)),
        NumericKind::Long => Some(to_i64(left)?.cmp(&to_i64(right)?)),
        NumericKind::Float => to_f32(left)?.partial_cmp(&to_f32(right)?),
        NumericKind::Double => to_f64(left)?.partial_cmp(&to_f64(right)?),
        NumericKind::BigInt => Some(to_bigint(left)?.cmp(&to_bigint(right)?)),
        NumericKind::Decimal => Some(to_decimal(left)?.cmp(&to_decimal(right)?)),
    }
}

/// Equality as the `==` operator sees it: numeric kinds compare by
/// promoted value, everything else structurally.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    if left.kind().is_numeric() && right.kind().is_numeric() {
        return compare(left, right) == Some(Ordering::Equal);
    }
    left == right
}

/// Widen (or narrow) a numeric value to a target kind. Narrowing casts
/// truncate the way the host primitives do; `None` when the value is not
/// numeric at all.
pub fn convert(value: &Value, target: NumericKind) -> Option<Value> {
    use bigdecimal::ToPrimitive;
    Some(match target {
        NumericKind::Int => match value {
            Value::Int(n) => Value::Int(*n),
            Value::Long(n) => Value::Int(*n as i32),
            Value::Float(x) => Value::Int(*x as i32),
            Value::Double(x) => Value::Int(*x as i32),
            Value::BigInt(n) => Value::Int(n.to_i32()?),
            Value::Decimal(x) => Value::Int(x.to_i32()?),
            _ => return None,
        },
        NumericKind::Long => match value {
            Value::Int(n) => Value::Long(i64::from(*n)),
            Value::Long(n) => Value::Long(*n),
            Value::Float(x) => Value::Long(*x as i64),
            Value::Double(x) => Value::Long(*x as i64),
            Value::BigInt(n) => Value::Long(n.to_i64()?),
            Value::Decimal(x) => Value::Long(x.to_i64()?),
            _ => return None,
        },
        NumericKind::Float => Value::Float(match value {
            Value::Decimal(x) => x.to_f32()?,
            Value::BigInt(n) => n.to_f32()?,
            Value::Double(x) => *x as f32,
            other => to_f32(other)?,
        }),
        NumericKind::Double => Value::Double(match value {
            Value::Decimal(x) => x.to_f64()?,
            Value::BigInt(n) => n.to_f64()?,
            other => to_f64(other)?,
        }),
        NumericKind::BigInt => match value {
            Value::Float(x) => Value::big_int(BigInt::from_f32(x.trunc())?),
            Value::Double(x) => Value::big_int(BigInt::from_f64(x.trunc())?),
            Value::Decimal(x) => {
                let (digits, _) = x.with_scale(0).into_bigint_and_exponent();
                Value::big_int(digits)
            }
            other => Value::big_int(to_bigint(other)?),
        },
        NumericKind::Decimal => Value::decimal(to_decimal(value)?),
    })
}
