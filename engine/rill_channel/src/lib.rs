//! The channel framework: typed, cacheable, bidirectional evaluation
//! cells, and the reflective type protocol that drives member and
//! operator resolution over them.
//!
//! A bound expression is a graph of [`Channel`]s. Each channel owns a
//! storage site, a reflector describing its static type, and a memo map
//! of derived channels keyed by derivation; the memo map is the only
//! per-channel lock, so one compiled graph is safely evaluated from many
//! threads at once. All per-invocation state (the record instance under
//! construction, the projection cursor, the reduce accumulator) lives in
//! [`ScopedSlot`] thread-scoped stacks with guaranteed-release guards.

mod builtin;
mod channel;
mod decorate;
mod error;
mod focus;
mod meta;
mod record;
mod registry;
mod scoped;
mod signature;
mod site;
mod translate;

pub use builtin::{BindingsReflector, BuiltinReflector, ListReflector};
pub use channel::{Channel, MemoKey, WeakChannel};
pub use decorate::{decorator_for, Capability, Decorator, ListDecorator};
pub use error::BindError;
pub use focus::{Focus, FocusExt, FocusRef, LinkedFocus, NamespaceResolver};
pub use meta::{bind_cast, bind_meta, ChannelHandle, FocusHandle, ReflectorHandle};
pub use record::{FunctorSite, RecordField, RecordReflector, RecordSite};
pub use registry::{ArithOp, TypeRegistry};
pub use scoped::{ScopedSlot, SlotGuard};
pub use signature::Signature;
pub use site::{ConstSite, FrozenSite, NilSite, Site, ValueSite};
pub use translate::{CombinedSite, Combiner, TranslatedSite, Translator};

use std::sync::Arc;

/// Shared handle to a type descriptor.
pub type ReflectorRef = Arc<dyn Reflector>;

/// Structural type descriptor: identity, member/operator resolution,
/// capability decoration, and compatibility.
///
/// Invariants: two reflectors with the same URI agree on assignability,
/// and `is_assignable_to(self.uri())` is always true. `resolve` returns
/// `Ok(None)` for a name that is merely absent at this level — callers
/// fall back to the base extent or the enclosing scope, and only the
/// outermost caller turns a final miss into a bind error.
pub trait Reflector: Send + Sync {
    /// Static content kind of values this reflector describes.
    fn content(&self) -> rill_value::ContentKind;

    /// Stable type URI.
    fn uri(&self) -> &str;

    /// Resolve a member (or extension meta-operation) against a channel
    /// of this type.
    fn resolve(
        &self,
        registry: &Arc<TypeRegistry>,
        channel: &Channel,
        focus: &FocusRef,
        name: &str,
        args: &[Channel],
    ) -> Result<Option<Channel>, BindError>;

    /// Obtain a capability view over the channel's runtime value, if
    /// this type supports the capability.
    fn decorate(
        &self,
        registry: &Arc<TypeRegistry>,
        channel: &Channel,
        capability: Capability,
    ) -> Option<Arc<dyn Decorator>>;

    /// Assignability by URI. The default accepts only the exact URI.
    fn is_assignable_to(&self, uri: &str) -> bool {
        uri == self.uri()
    }

    /// Whether a cast from `other` to this type can be attempted.
    fn can_cast_from(&self, other: &ReflectorRef) -> bool {
        other.is_assignable_to(self.uri())
            || (self.content().is_numeric() && other.content().is_numeric())
    }

    /// Member descriptors, for introspection and diagnostics.
    fn signatures(&self) -> Vec<Signature> {
        Vec::new()
    }

    /// The record shape behind this reflector, when it defines one.
    /// Lets the binder recognize functor-callable channels.
    fn as_record(&self) -> Option<Arc<RecordReflector>> {
        None
    }
}

impl std::fmt::Debug for dyn Reflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reflector({})", self.uri())
    }
}
