//! Storage sites: the backends behind channels.

use std::sync::OnceLock;

use parking_lot::RwLock;

use rill_value::Value;

/// A storage backend. `get` yields `None` for absent data; `set`
/// returns false when the site rejects the write.
pub trait Site: Send + Sync {
    fn get(&self) -> Option<Value>;

    fn set(&self, value: Option<Value>) -> bool {
        let _ = value;
        false
    }
}

/// Plain read/write storage.
pub struct ValueSite {
    value: RwLock<Option<Value>>,
}

impl ValueSite {
    pub fn new(initial: Option<Value>) -> Self {
        ValueSite {
            value: RwLock::new(initial),
        }
    }
}

impl Site for ValueSite {
    fn get(&self) -> Option<Value> {
        self.value.read().clone()
    }

    fn set(&self, value: Option<Value>) -> bool {
        *self.value.write() = value;
        true
    }
}

/// Immutable storage.
pub struct ConstSite {
    value: Option<Value>,
}

impl ConstSite {
    pub fn new(value: Option<Value>) -> Self {
        ConstSite { value }
    }
}

impl Site for ConstSite {
    fn get(&self) -> Option<Value> {
        self.value.clone()
    }
}

/// The `@nil` site: reads are always absent, writes are swallowed.
///
/// Useful as a typed hole — the channel carries a real reflector for
/// type inference, but no storage.
pub struct NilSite;

impl Site for NilSite {
    fn get(&self) -> Option<Value> {
        None
    }

    fn set(&self, _value: Option<Value>) -> bool {
        true
    }
}

/// The `@constant` site: captures the source's value at first read and
/// serves it forever after.
pub struct FrozenSite {
    source: crate::Channel,
    frozen: OnceLock<Option<Value>>,
}

impl FrozenSite {
    pub fn new(source: crate::Channel) -> Self {
        FrozenSite {
            source,
            frozen: OnceLock::new(),
        }
    }
}

impl Site for FrozenSite {
    fn get(&self) -> Option<Value> {
        self.frozen.get_or_init(|| self.source.get()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, TypeRegistry};
    use pretty_assertions::assert_eq;
    use rill_value::ContentKind;
    use std::sync::Arc;

    #[test]
    fn frozen_site_captures_first_read() {
        let registry = Arc::new(TypeRegistry::new());
        let source = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(1)));
        let frozen = Channel::frozen(
            registry.builtin(ContentKind::Int),
            Box::new(FrozenSite::new(source.clone())),
        );
        assert_eq!(frozen.get(), Some(Value::Int(1)));
        assert!(source.store(Some(Value::Int(2))));
        assert_eq!(frozen.get(), Some(Value::Int(1)));
    }

    #[test]
    fn nil_site_swallows_writes() {
        let site = NilSite;
        assert!(site.set(Some(Value::Int(1))));
        assert_eq!(site.get(), None);
    }
}
