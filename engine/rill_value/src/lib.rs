//! Runtime values for the rill expression engine.
//!
//! # Heap Enforcement
//!
//! All heap allocations go through factory methods on [`Value`]; the
//! [`Heap<T>`] wrapper has a crate-private constructor, so external code
//! cannot build heap variants directly. Every heap type is `Arc`-backed,
//! making values cheap to clone and safe to share across threads.
//!
//! # Absence
//!
//! There is no null variant. Data absence is `Option::None` at the
//! channel boundary, which keeps "the shape is wrong" (a bind failure)
//! and "the data is absent" (an ordinary runtime state) impossible to
//! conflate.

mod heap;
mod kind;
mod numeric;
mod record;
mod value;

pub use heap::Heap;
pub use kind::ContentKind;
pub use numeric::{
    compare, convert, loose_eq, numeric_add, numeric_div, numeric_mul, numeric_rem, numeric_sub,
    promote, NumericKind,
};
pub use record::RecordValue;
pub use value::{AnyValue, Value};
