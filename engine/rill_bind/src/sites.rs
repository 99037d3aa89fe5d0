//! Operator sites produced by the binder.
//!
//! Each site is the get/set backend of one bound operator node. Absence
//! propagates: an absent operand makes the result absent rather than an
//! error, except for equality, where absence is a comparable state.

use std::cmp::Ordering;
use std::sync::Arc;

use rill_channel::{Channel, Decorator, ScopedSlot, Site};
use rill_ir::BinaryOp;
use rill_value::{loose_eq, Value};

/// `-x`: dynamic negation within the operand's numeric kind.
pub(crate) struct NegSite {
    pub source: Channel,
}

impl Site for NegSite {
    fn get(&self) -> Option<Value> {
        Some(match self.source.get()? {
            Value::Int(n) => Value::Int(-n),
            Value::Long(n) => Value::Long(-n),
            Value::Float(x) => Value::Float(-x),
            Value::Double(x) => Value::Double(-x),
            Value::BigInt(n) => Value::big_int(-(*n).clone()),
            Value::Decimal(x) => Value::decimal(-(*x).clone()),
            _ => return None,
        })
    }
}

/// `!x`.
pub(crate) struct NotSite {
    pub source: Channel,
}

impl Site for NotSite {
    fn get(&self) -> Option<Value> {
        Some(Value::Bool(!self.source.get()?.as_bool()?))
    }
}

/// `< > <= >=` after numeric/string comparison.
pub(crate) struct CompareSite {
    pub left: Channel,
    pub right: Channel,
    pub op: BinaryOp,
}

impl Site for CompareSite {
    fn get(&self) -> Option<Value> {
        let ordering = rill_value::compare(&self.left.get()?, &self.right.get()?)?;
        let result = match self.op {
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::LtEq => ordering != Ordering::Greater,
            BinaryOp::GtEq => ordering != Ordering::Less,
            _ => return None,
        };
        Some(Value::Bool(result))
    }
}

/// `== !=`: absence is a comparable state here.
pub(crate) struct EqualitySite {
    pub left: Channel,
    pub right: Channel,
    pub negate: bool,
}

impl Site for EqualitySite {
    fn get(&self) -> Option<Value> {
        let equal = match (self.left.get(), self.right.get()) {
            (None, None) => true,
            (Some(left), Some(right)) => loose_eq(&left, &right),
            _ => false,
        };
        Some(Value::Bool(equal != self.negate))
    }
}

pub(crate) enum LogicMode {
    And,
    Or,
    Xor,
}

/// `&& || ^` over booleans; `&&`/`||` short-circuit.
pub(crate) struct LogicSite {
    pub left: Channel,
    pub right: Channel,
    pub mode: LogicMode,
}

impl Site for LogicSite {
    fn get(&self) -> Option<Value> {
        let left = self.left.get()?.as_bool()?;
        let value = match self.mode {
            LogicMode::And => {
                if !left {
                    false
                } else {
                    self.right.get()?.as_bool()?
                }
            }
            LogicMode::Or => {
                if left {
                    true
                } else {
                    self.right.get()?.as_bool()?
                }
            }
            LogicMode::Xor => left ^ self.right.get()?.as_bool()?,
        };
        Some(Value::Bool(value))
    }
}

/// `c ? a : b`. Reads pick a branch; writes land in the branch the
/// condition currently selects.
pub(crate) struct ConditionalSite {
    pub cond: Channel,
    pub then_channel: Channel,
    pub else_channel: Channel,
}

impl ConditionalSite {
    fn pick(&self) -> Option<&Channel> {
        match self.cond.get()?.as_bool()? {
            true => Some(&self.then_channel),
            false => Some(&self.else_channel),
        }
    }
}

impl Site for ConditionalSite {
    fn get(&self) -> Option<Value> {
        self.pick()?.get()
    }

    fn set(&self, value: Option<Value>) -> bool {
        match self.pick() {
            Some(branch) => branch.store(value),
            None => false,
        }
    }
}

/// `a ?? b`.
pub(crate) struct CoalesceSite {
    pub left: Channel,
    pub right: Channel,
}

impl Site for CoalesceSite {
    fn get(&self) -> Option<Value> {
        self.left.get().or_else(|| self.right.get())
    }
}

/// String `+`.
pub(crate) struct ConcatSite {
    pub left: Channel,
    pub right: Channel,
}

impl Site for ConcatSite {
    fn get(&self) -> Option<Value> {
        let left = self.left.get()?;
        let right = self.right.get()?;
        Some(Value::string(format!("{left}{right}")))
    }
}

/// Structural `+`: concatenate two iterations.
pub(crate) struct StructuralConcatSite {
    pub left: Arc<dyn Decorator>,
    pub right: Arc<dyn Decorator>,
}

impl Site for StructuralConcatSite {
    fn get(&self) -> Option<Value> {
        let mut items = self.left.iterate()?;
        items.extend(self.right.iterate()?);
        Some(self.left.new_collection(items))
    }
}

/// `a..b` / `a.!b`: an integer interval materialized as a list.
pub(crate) struct RangeSite {
    pub start: Channel,
    pub end: Channel,
    pub inclusive: bool,
    pub long: bool,
}

impl Site for RangeSite {
    fn get(&self) -> Option<Value> {
        let start = as_i64(&self.start.get()?)?;
        let end = as_i64(&self.end.get()?)?;
        let stop = if self.inclusive { end + 1 } else { end };
        let items: Vec<Value> = (start..stop)
            .map(|n| {
                if self.long {
                    Value::Long(n)
                } else {
                    Value::Int(n as i32)
                }
            })
            .collect();
        Some(Value::list(items))
    }
}

/// `coll ?= x`.
pub(crate) struct ContainsSite {
    pub haystack: Arc<dyn Decorator>,
    pub needle: Channel,
}

impl Site for ContainsSite {
    fn get(&self) -> Option<Value> {
        let items = self.haystack.iterate()?;
        let found = match self.needle.get() {
            Some(needle) => items.iter().any(|item| loose_eq(item, &needle)),
            None => false,
        };
        Some(Value::Bool(found))
    }
}

/// `coll[i]`: integer indexing, or slicing when the index evaluates to
/// a list of indices (a range, typically).
pub(crate) struct SubscriptSite {
    pub receiver: Arc<dyn Decorator>,
    pub index: Channel,
}

impl Site for SubscriptSite {
    fn get(&self) -> Option<Value> {
        match self.index.get()? {
            Value::List(indices) => {
                let items: Vec<Value> = indices
                    .iter()
                    .filter_map(|idx| self.receiver.item(as_index(idx)?))
                    .collect();
                Some(self.receiver.new_collection(items))
            }
            scalar => self.receiver.item(as_index(&scalar)?),
        }
    }
}

/// The projection cursor: reads the innermost item pushed by the
/// enclosing projection on this thread.
pub(crate) struct ItemSite {
    pub slot: Arc<ScopedSlot<Value>>,
}

impl Site for ItemSite {
    fn get(&self) -> Option<Value> {
        self.slot.current()
    }
}

/// The reduce accumulator: reads the innermost running value.
pub(crate) struct AccSite {
    pub slot: Arc<ScopedSlot<Option<Value>>>,
}

impl Site for AccSite {
    fn get(&self) -> Option<Value> {
        self.slot.current().flatten()
    }
}

/// `coll # body`: evaluate `body` once per element, collect the present
/// results.
pub(crate) struct ProjectSite {
    pub source: Arc<dyn Decorator>,
    pub body: Channel,
    pub item_slot: Arc<ScopedSlot<Value>>,
}

impl Site for ProjectSite {
    fn get(&self) -> Option<Value> {
        let items = self.source.iterate()?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let _guard = self.item_slot.push(item);
            if let Some(value) = self.body.get() {
                out.push(value);
            }
        }
        Some(Value::list(out))
    }
}

/// `coll $ body`: evaluate `body` once per element and fold the present
/// results with the projected type's `+` strategy. The running value is
/// visible through [`AccSite`] while each element evaluates.
pub(crate) struct ReduceSite {
    pub source: Arc<dyn Decorator>,
    pub body: Channel,
    pub item_slot: Arc<ScopedSlot<Value>>,
    pub acc_slot: Arc<ScopedSlot<Option<Value>>>,
    pub fold: Arc<dyn Fn(Value, Value) -> Option<Value> + Send + Sync>,
}

impl Site for ReduceSite {
    fn get(&self) -> Option<Value> {
        let items = self.source.iterate()?;
        let mut acc: Option<Value> = None;
        for item in items {
            let _item_guard = self.item_slot.push(item);
            let _acc_guard = self.acc_slot.push(acc.clone());
            let value = self.body.get();
            acc = match (acc, value) {
                (None, value) => value,
                (acc, None) => acc,
                (Some(running), Some(next)) => (self.fold)(running, next),
            };
        }
        acc
    }
}

/// `target = value`: reads evaluate the right side and store it into
/// the target; writes forward to the target.
pub(crate) struct AssignSite {
    pub target: Channel,
    pub value: Channel,
}

impl Site for AssignSite {
    fn get(&self) -> Option<Value> {
        let value = self.value.get();
        let _ = self.target.store(value.clone());
        value
    }

    fn set(&self, value: Option<Value>) -> bool {
        self.target.store(value)
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(i64::from(*n)),
        Value::Long(n) => Some(*n),
        _ => None,
    }
}

fn as_index(value: &Value) -> Option<usize> {
    usize::try_from(as_i64(value)?).ok()
}
