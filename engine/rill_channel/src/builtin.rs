//! Reflectors for the built-in value kinds.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use rill_value::ContentKind;

use crate::{
    BindError, Capability, Channel, Decorator, FocusRef, ListDecorator, Reflector, ReflectorRef,
    Signature, TypeRegistry,
};

/// Reflector for a scalar built-in kind.
///
/// One instance per kind lives in the registry; types are compared by
/// URI, so memoizing them per registry is safe.
#[derive(Debug)]
pub struct BuiltinReflector {
    kind: ContentKind,
}

impl BuiltinReflector {
    pub fn new(kind: ContentKind) -> Self {
        BuiltinReflector { kind }
    }
}

impl Reflector for BuiltinReflector {
    fn content(&self) -> ContentKind {
        self.kind
    }

    fn uri(&self) -> &str {
        self.kind.uri()
    }

    fn resolve(
        &self,
        _registry: &Arc<TypeRegistry>,
        _channel: &Channel,
        _focus: &FocusRef,
        _name: &str,
        _args: &[Channel],
    ) -> Result<Option<Channel>, BindError> {
        // Scalars expose no members; absence here lets the caller fall
        // back to the enclosing scope.
        Ok(None)
    }

    fn decorate(
        &self,
        _registry: &Arc<TypeRegistry>,
        _channel: &Channel,
        _capability: Capability,
    ) -> Option<Arc<dyn Decorator>> {
        None
    }

    fn is_assignable_to(&self, uri: &str) -> bool {
        // Nil is the bottom type: assignable anywhere.
        self.kind == ContentKind::Nil || uri == self.uri()
    }

    fn can_cast_from(&self, other: &ReflectorRef) -> bool {
        match self.kind {
            // Everything renders, so everything casts to string.
            ContentKind::Str => true,
            _ => {
                other.is_assignable_to(self.uri())
                    || (self.kind.is_numeric() && other.content().is_numeric())
            }
        }
    }
}

/// Reflector for list values, parameterized by element type.
///
/// All lists share the `rill:list` URI — the element type refines
/// decoration, not assignability.
#[derive(Debug)]
pub struct ListReflector {
    element: ReflectorRef,
}

impl ListReflector {
    pub fn new(element: ReflectorRef) -> Self {
        ListReflector { element }
    }

    pub fn element(&self) -> &ReflectorRef {
        &self.element
    }
}

impl Reflector for ListReflector {
    fn content(&self) -> ContentKind {
        ContentKind::List
    }

    fn uri(&self) -> &str {
        ContentKind::List.uri()
    }

    fn resolve(
        &self,
        _registry: &Arc<TypeRegistry>,
        _channel: &Channel,
        _focus: &FocusRef,
        _name: &str,
        _args: &[Channel],
    ) -> Result<Option<Channel>, BindError> {
        Ok(None)
    }

    fn decorate(
        &self,
        _registry: &Arc<TypeRegistry>,
        channel: &Channel,
        _capability: Capability,
    ) -> Option<Arc<dyn Decorator>> {
        // Lists support all three capabilities with one view.
        Some(Arc::new(ListDecorator::new(
            channel.clone(),
            self.element.clone(),
        )))
    }
}

/// A name→channel table exposed as a resolution anchor.
///
/// The usual way a host supplies external bindings: build the table,
/// wrap it in [`BindingsReflector::anchor`], and hang the resulting
/// channel on a focus scope as its context or subject cell.
#[derive(Debug, Default)]
pub struct BindingsReflector {
    entries: FxHashMap<String, Channel>,
}

impl BindingsReflector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, channel: Channel) -> Self {
        self.entries.insert(name.into(), channel);
        self
    }

    /// Wrap the table in a valueless channel usable as a scope cell.
    pub fn anchor(self) -> Channel {
        Channel::constant(Arc::new(self) as ReflectorRef, None)
    }
}

impl Reflector for BindingsReflector {
    fn content(&self) -> ContentKind {
        ContentKind::Opaque
    }

    fn uri(&self) -> &str {
        "rill:bindings"
    }

    fn resolve(
        &self,
        _registry: &Arc<TypeRegistry>,
        _channel: &Channel,
        _focus: &FocusRef,
        name: &str,
        args: &[Channel],
    ) -> Result<Option<Channel>, BindError> {
        if !args.is_empty() {
            return Ok(None);
        }
        Ok(self.entries.get(name).cloned())
    }

    fn decorate(
        &self,
        _registry: &Arc<TypeRegistry>,
        _channel: &Channel,
        _capability: Capability,
    ) -> Option<Arc<dyn Decorator>> {
        None
    }

    fn signatures(&self) -> Vec<Signature> {
        let mut signatures: Vec<Signature> = self
            .entries
            .iter()
            .map(|(name, channel)| Signature::property(name.clone(), channel.content()))
            .collect();
        signatures.sort_by(|a, b| a.name.cmp(&b.name));
        signatures
    }
}
