//! The channel type: a typed, re-evaluatable read/write location.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use rill_value::{ContentKind, Value};

use crate::{Reflector, ReflectorRef, Site};

/// Derivation keys for the per-channel memo map.
///
/// The first caller to request a key builds the derived channel; as long
/// as that channel is alive, every later caller on any thread observes
/// the identical object. That identity stability is what makes
/// self-referential record graphs and repeated meta-resolution correct,
/// not merely cheap.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemoKey {
    /// Built-in meta-operation (`@size`, `@list`, ...).
    Meta(&'static str),
    /// Identity of a translator instance.
    Translator(usize),
    /// Cast target URI.
    Uri(String),
    /// Resolved member name.
    Member(String),
    /// The projection item cursor channel.
    Item,
}

type Watcher = Box<dyn Fn(&Option<Value>) + Send + Sync>;

struct ChannelInner {
    reflector: ReflectorRef,
    constant: bool,
    site: Box<dyn Site>,
    /// Weak cache of derived channels. Entries hold weak references so a
    /// derived channel keeps its source alive (through its site) without
    /// the source keeping every derivation alive in turn.
    memo: Mutex<FxHashMap<MemoKey, Weak<ChannelInner>>>,
    watchers: Mutex<Vec<Watcher>>,
}

/// A typed evaluation cell. Cheap to clone; clones share identity.
///
/// `get` and `store` are callable from any thread. The memo map's lock
/// is the only channel-level lock; per-invocation state belongs in
/// [`crate::ScopedSlot`] storage, never in the channel itself.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    /// A channel over an arbitrary storage site.
    pub fn new(reflector: ReflectorRef, site: Box<dyn Site>) -> Channel {
        Channel::build(reflector, false, site)
    }

    /// A constant channel: `get` always yields `value`, `store` fails.
    pub fn constant(reflector: ReflectorRef, value: Option<Value>) -> Channel {
        Channel::build(reflector, true, Box::new(crate::ConstSite::new(value)))
    }

    /// A read/write storage cell with an optional initial value.
    pub fn cell(reflector: ReflectorRef, initial: Option<Value>) -> Channel {
        Channel::new(reflector, Box::new(crate::ValueSite::new(initial)))
    }

    /// A constant-flagged channel over an arbitrary site (`@constant`).
    pub fn frozen(reflector: ReflectorRef, site: Box<dyn Site>) -> Channel {
        Channel::build(reflector, true, site)
    }

    fn build(reflector: ReflectorRef, constant: bool, site: Box<dyn Site>) -> Channel {
        Channel {
            inner: Arc::new(ChannelInner {
                reflector,
                constant,
                site,
                memo: Mutex::new(FxHashMap::default()),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn reflector(&self) -> &ReflectorRef {
        &self.inner.reflector
    }

    /// Static content kind of this channel.
    pub fn content(&self) -> ContentKind {
        self.inner.reflector.content()
    }

    pub fn is_constant(&self) -> bool {
        self.inner.constant
    }

    /// Read the current value; `None` means the data is absent.
    pub fn get(&self) -> Option<Value> {
        self.inner.site.get()
    }

    /// Write a value. Returns false for constant channels, sites that
    /// reject writes, and values the channel's type cannot hold.
    pub fn store(&self, value: Option<Value>) -> bool {
        if self.inner.constant {
            return false;
        }
        if let Some(v) = &value {
            if !kind_accepts(self.content(), v) {
                return false;
            }
        }
        let stored = self.inner.site.set(value.clone());
        if stored {
            for watcher in self.inner.watchers.lock().iter() {
                watcher(&value);
            }
        }
        stored
    }

    /// Register a store notification callback.
    pub fn subscribe(&self, watcher: impl Fn(&Option<Value>) + Send + Sync + 'static) {
        self.inner.watchers.lock().push(Box::new(watcher));
    }

    /// The memoized derived channel for `key`.
    ///
    /// First builder wins; all later callers observe the same object for
    /// as long as it is alive anywhere. A fully dropped derivation is
    /// rebuilt fresh, which is indistinguishable to callers.
    pub fn derived(&self, key: MemoKey, make: impl FnOnce() -> Channel) -> Channel {
        let mut memo = self.inner.memo.lock();
        if let Some(existing) = memo.get(&key).and_then(Weak::upgrade) {
            return Channel { inner: existing };
        }
        let built = make();
        memo.insert(key, Arc::downgrade(&built.inner));
        built
    }

    /// Fallible variant of [`Channel::derived`]; failures are not cached.
    pub fn try_derived<E>(
        &self,
        key: MemoKey,
        make: impl FnOnce() -> Result<Channel, E>,
    ) -> Result<Channel, E> {
        let mut memo = self.inner.memo.lock();
        if let Some(existing) = memo.get(&key).and_then(Weak::upgrade) {
            return Ok(Channel { inner: existing });
        }
        let built = make()?;
        memo.insert(key, Arc::downgrade(&built.inner));
        Ok(built)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity for keying thread-scoped state.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Downgrade for back-references that must not keep the graph alive.
    pub fn downgrade(&self) -> WeakChannel {
        WeakChannel {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Channel({}{})",
            self.inner.reflector.uri(),
            if self.inner.constant { ", const" } else { "" }
        )
    }
}

/// Weak channel back-reference.
#[derive(Clone)]
pub struct WeakChannel {
    inner: Weak<ChannelInner>,
}

impl WeakChannel {
    pub fn upgrade(&self) -> Option<Channel> {
        self.inner.upgrade().map(|inner| Channel { inner })
    }

    /// Whether this weak reference points at `channel`.
    pub fn refers_to(&self, channel: &Channel) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&channel.inner))
    }
}

/// Dynamic store compatibility: can a channel of `target` kind hold
/// `value`? Numeric stores are accepted when the value widens into the
/// target; nil and opaque targets accept anything (the site decides).
fn kind_accepts(target: ContentKind, value: &Value) -> bool {
    use rill_value::{promote, NumericKind};
    let source = value.kind();
    if target == source || target == ContentKind::Nil || target == ContentKind::Opaque {
        return true;
    }
    match (
        NumericKind::from_content(target),
        NumericKind::from_content(source),
    ) {
        (Some(t), Some(s)) => promote(t, s) == t,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeRegistry;
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new())
    }

    #[test]
    fn cell_round_trips_values() {
        let registry = registry();
        let cell = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(1)));
        assert_eq!(cell.get(), Some(Value::Int(1)));
        assert!(cell.store(Some(Value::Int(2))));
        assert_eq!(cell.get(), Some(Value::Int(2)));
    }

    #[test]
    fn constant_channels_reject_stores() {
        let registry = registry();
        let constant = Channel::constant(registry.builtin(ContentKind::Int), Some(Value::Int(5)));
        assert!(!constant.store(Some(Value::Int(6))));
        assert_eq!(constant.get(), Some(Value::Int(5)));
    }

    #[test]
    fn incompatible_store_returns_false() {
        let registry = registry();
        let cell = Channel::cell(registry.builtin(ContentKind::Int), None);
        assert!(!cell.store(Some(Value::string("nope"))));
        // Widening numeric stores are fine; narrowing ones are not.
        let long_cell = Channel::cell(registry.builtin(ContentKind::Long), None);
        assert!(long_cell.store(Some(Value::Int(1))));
        assert!(!cell.store(Some(Value::Long(1))));
    }

    #[test]
    fn derived_channels_are_identity_stable_while_alive() {
        let registry = registry();
        let cell = Channel::cell(registry.builtin(ContentKind::List), None);
        let a = cell.derived(MemoKey::Meta("size"), || {
            Channel::constant(registry.builtin(ContentKind::Int), None)
        });
        let b = cell.derived(MemoKey::Meta("size"), || {
            Channel::constant(registry.builtin(ContentKind::Int), None)
        });
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn dropped_derivations_are_rebuilt() {
        let registry = registry();
        let cell = Channel::cell(registry.builtin(ContentKind::List), None);
        let first = cell.derived(MemoKey::Meta("size"), || {
            Channel::constant(registry.builtin(ContentKind::Int), None)
        });
        let first_id = first.id();
        drop(first);
        let second = cell.derived(MemoKey::Meta("size"), || {
            Channel::constant(registry.builtin(ContentKind::Int), None)
        });
        // A fresh object is fine once nothing holds the old one.
        let _ = first_id;
        assert!(second.get().is_none());
    }

    #[test]
    fn watchers_fire_after_successful_store() {
        let registry = registry();
        let cell = Channel::cell(registry.builtin(ContentKind::Int), None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cell.subscribe(move |value| sink.lock().push(value.clone()));
        assert!(cell.store(Some(Value::Int(3))));
        assert!(!cell.store(Some(Value::string("x"))));
        assert_eq!(seen.lock().as_slice(), &[Some(Value::Int(3))]);
    }
}
