//! Record instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::Value;

/// One record instance: an ordered, fixed-length slot vector plus a
/// back-reference to its defining shape and an optional base extent.
///
/// Computed fields occupy their slot; pass-through fields store nothing
/// (`None` forever) because their reads and writes always delegate to
/// the source channel. The shape back-reference is opaque at this layer;
/// the channel layer downcasts it to the defining record reflector to
/// answer member lookups on dynamically obtained records.
pub struct RecordValue {
    shape: Arc<dyn Any + Send + Sync>,
    names: Arc<[String]>,
    slots: RwLock<Vec<Option<Value>>>,
    base: Option<Value>,
}

impl RecordValue {
    pub fn new(
        shape: Arc<dyn Any + Send + Sync>,
        names: Arc<[String]>,
        slots: Vec<Option<Value>>,
        base: Option<Value>,
    ) -> Self {
        RecordValue {
            shape,
            names,
            slots: RwLock::new(slots),
            base,
        }
    }

    /// The defining shape, for downcasting by the channel layer.
    pub fn shape(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Field name at `index`; empty for positional fields.
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Index of a named field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Stored value of a slot. Pass-through slots are always `None`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.slots.read().get(index).cloned().flatten()
    }

    /// Overwrite a slot. Returns false when the index is out of range.
    pub fn set(&self, index: usize, value: Option<Value>) -> bool {
        let mut slots = self.slots.write();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// The base extent this record extends, if any.
    pub fn base(&self) -> Option<&Value> {
        self.base.as_ref()
    }
}

impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
            && *self.slots.read() == *other.slots.read()
            && self.base == other.base
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let mut map = f.debug_map();
        for (i, slot) in slots.iter().enumerate() {
            map.entry(&self.name(i), slot);
        }
        map.finish()
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let slots = self.slots.read();
        let mut first = true;
        for (i, slot) in slots.iter().enumerate() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            let name = self.name(i);
            if !name.is_empty() {
                write!(f, "{name} = ")?;
            }
            match slot {
                Some(value) => write!(f, "{value}")?,
                None => write!(f, "_")?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape() -> Arc<dyn Any + Send + Sync> {
        Arc::new(())
    }

    #[test]
    fn slots_are_positional() {
        let record = RecordValue::new(
            shape(),
            vec!["a".to_string(), "b".to_string()].into(),
            vec![Some(Value::Int(1)), None],
            None,
        );
        assert_eq!(record.field_index("b"), Some(1));
        assert_eq!(record.get(0), Some(Value::Int(1)));
        assert_eq!(record.get(1), None);
        assert!(record.set(1, Some(Value::Int(9))));
        assert_eq!(record.get(1), Some(Value::Int(9)));
        assert!(!record.set(7, None));
    }

    #[test]
    fn display_shows_named_slots() {
        let record = RecordValue::new(
            shape(),
            vec!["a".to_string(), String::new()].into(),
            vec![Some(Value::Int(1)), Some(Value::Int(2))],
            None,
        );
        assert_eq!(record.to_string(), "{a = 1, 2}");
    }
}
