//! Capability views over channel values.
//!
//! A decorator gives the collection operators (`#`, `$`, `?=`, range
//! slicing, `+` concatenation, the `@size` family) one uniform surface
//! per capability, whatever the underlying host representation. A host
//! type that implements a single decorator gains all of them.

use std::fmt;
use std::sync::Arc;

use rill_value::Value;

use crate::{Channel, Reflector, ReflectorRef, TypeRegistry};

/// The three collection capabilities, in increasing strength.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Capability {
    /// Bare element iteration.
    Iteration,
    /// Adds `size` and indexed `item`.
    List,
    /// Adds `add` and `new_collection`.
    Collection,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Iteration => write!(f, "Iteration"),
            Capability::List => write!(f, "List"),
            Capability::Collection => write!(f, "Collection"),
        }
    }
}

/// A capability view over one channel's runtime value.
///
/// `iterate` materializes the current elements — `None` when the
/// underlying value is itself absent, which is how "collection is null"
/// stays an ordinary missing value rather than an error. The `List` and
/// `Collection` operations have defaults in terms of `iterate`, so the
/// minimum viable adapter implements `iterate` and `element` only.
pub trait Decorator: Send + Sync {
    /// Current elements, or `None` when the source value is absent.
    fn iterate(&self) -> Option<Vec<Value>>;

    /// Static element type.
    fn element(&self) -> ReflectorRef;

    fn size(&self) -> Option<usize> {
        self.iterate().map(|items| items.len())
    }

    fn item(&self, index: usize) -> Option<Value> {
        self.iterate()?.into_iter().nth(index)
    }

    /// Append an element. Default: collections are not growable.
    fn add(&self, value: Value) -> bool {
        let _ = value;
        false
    }

    /// Build a fresh collection of this shape from `items`.
    fn new_collection(&self, items: Vec<Value>) -> Value {
        Value::list(items)
    }
}

/// Decorator over the built-in list value.
pub struct ListDecorator {
    source: Channel,
    element: ReflectorRef,
}

impl ListDecorator {
    pub fn new(source: Channel, element: ReflectorRef) -> Self {
        ListDecorator { source, element }
    }
}

impl Decorator for ListDecorator {
    fn iterate(&self) -> Option<Vec<Value>> {
        match self.source.get()? {
            Value::List(items) => Some(items.to_vec()),
            _ => None,
        }
    }

    fn element(&self) -> ReflectorRef {
        self.element.clone()
    }

    fn size(&self) -> Option<usize> {
        match self.source.get()? {
            Value::List(items) => Some(items.len()),
            _ => None,
        }
    }

    fn item(&self, index: usize) -> Option<Value> {
        match self.source.get()? {
            Value::List(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    fn add(&self, value: Value) -> bool {
        let mut items = match self.source.get() {
            Some(Value::List(items)) => items.to_vec(),
            Some(_) => return false,
            None => Vec::new(),
        };
        items.push(value);
        self.source.store(Some(Value::list(items)))
    }
}

/// The decorator for a requested capability, falling back through the
/// stronger capabilities a reflector may expose instead.
pub fn decorator_for(
    registry: &Arc<TypeRegistry>,
    channel: &Channel,
    capability: Capability,
) -> Option<Arc<dyn Decorator>> {
    let reflector = channel.reflector().clone();
    reflector
        .decorate(registry, channel, capability)
        .or_else(|| match capability {
            Capability::Iteration => reflector
                .decorate(registry, channel, Capability::List)
                .or_else(|| reflector.decorate(registry, channel, Capability::Collection)),
            Capability::List => reflector.decorate(registry, channel, Capability::Collection),
            Capability::Collection => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_value::ContentKind;

    #[test]
    fn list_decorator_views_the_current_value() {
        let registry = Arc::new(TypeRegistry::new());
        let cell = Channel::cell(
            registry.builtin(ContentKind::List),
            Some(Value::list(vec![Value::Int(1), Value::Int(2)])),
        );
        let dec = ListDecorator::new(cell.clone(), registry.builtin(ContentKind::Int));
        assert_eq!(dec.size(), Some(2));
        assert_eq!(dec.item(1), Some(Value::Int(2)));
        assert!(dec.add(Value::Int(3)));
        assert_eq!(dec.size(), Some(3));

        assert!(cell.store(None));
        assert_eq!(dec.size(), None);
        assert_eq!(dec.iterate(), None);
    }
}
