//! The focus contract: a chain of scopes supplying subject and context
//! channels plus name resolution.
//!
//! The binder depends only on the [`Focus`] trait; hosts may implement
//! it directly over their own scoping structures. [`LinkedFocus`] is the
//! built-in chain used by `chain`/`telescope` and by hosts that just
//! want a ready-made scope stack.

use std::sync::{Arc, Weak};

use crate::Channel;

/// Shared handle to a scope.
pub type FocusRef = Arc<dyn Focus>;

/// Resolves namespace prefixes to URI bases (`ns` headers of imported
/// expression resources).
pub trait NamespaceResolver: Send + Sync {
    fn resolve_prefix(&self, prefix: &str) -> Option<String>;
}

/// One scope in the chain.
pub trait Focus: Send + Sync {
    /// The subject channel: what bare member names resolve against after
    /// the context channel.
    fn subject(&self) -> Option<Channel>;

    /// The context channel: the first resolution target in this scope.
    fn context_channel(&self) -> Option<Channel>;

    fn parent(&self) -> Option<FocusRef>;

    /// Name of this scope, when it is addressable via `[name]`.
    fn scope_name(&self) -> Option<&str> {
        None
    }

    /// Find a named scope, searching outward. The default walks the
    /// parent chain; implementations able to hand out their own handle
    /// should also match themselves.
    fn find(&self, name: &str) -> Option<FocusRef> {
        self.parent().and_then(|parent| parent.find(name))
    }

    /// The nearest namespace resolver, searching outward.
    fn namespace_resolver(&self) -> Option<Arc<dyn NamespaceResolver>> {
        self.parent().and_then(|parent| parent.namespace_resolver())
    }
}

/// Scope-chain combinators available on any focus handle.
pub trait FocusExt {
    /// Push a scope whose *context* channel is `channel`.
    fn chain(&self, channel: Channel) -> FocusRef;

    /// Push a scope whose *subject* channel is `channel`.
    fn telescope(&self, channel: Channel) -> FocusRef;
}

impl FocusExt for FocusRef {
    fn chain(&self, channel: Channel) -> FocusRef {
        LinkedFocus::scope(None, None, Some(channel), Some(self.clone()), None)
    }

    fn telescope(&self, channel: Channel) -> FocusRef {
        LinkedFocus::scope(None, Some(channel), None, Some(self.clone()), None)
    }
}

/// The built-in linked scope chain.
pub struct LinkedFocus {
    me: Weak<LinkedFocus>,
    name: Option<String>,
    subject: Option<Channel>,
    context: Option<Channel>,
    parent: Option<FocusRef>,
    resolver: Option<Arc<dyn NamespaceResolver>>,
}

impl LinkedFocus {
    /// An empty root scope.
    pub fn root() -> FocusRef {
        LinkedFocus::scope(None, None, None, None, None)
    }

    /// A root scope with a subject channel.
    pub fn over(subject: Channel) -> FocusRef {
        LinkedFocus::scope(None, Some(subject), None, None, None)
    }

    /// Full-control constructor.
    pub fn scope(
        name: Option<String>,
        subject: Option<Channel>,
        context: Option<Channel>,
        parent: Option<FocusRef>,
        resolver: Option<Arc<dyn NamespaceResolver>>,
    ) -> FocusRef {
        Arc::new_cyclic(|me| LinkedFocus {
            me: me.clone(),
            name,
            subject,
            context,
            parent,
            resolver,
        })
    }

    /// A named child scope with a subject, addressable via `[name]`.
    pub fn named(name: impl Into<String>, subject: Channel, parent: &FocusRef) -> FocusRef {
        LinkedFocus::scope(
            Some(name.into()),
            Some(subject),
            None,
            Some(parent.clone()),
            None,
        )
    }
}

impl Focus for LinkedFocus {
    fn subject(&self) -> Option<Channel> {
        self.subject.clone()
    }

    fn context_channel(&self) -> Option<Channel> {
        self.context.clone()
    }

    fn parent(&self) -> Option<FocusRef> {
        self.parent.clone()
    }

    fn scope_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn find(&self, name: &str) -> Option<FocusRef> {
        if self.name.as_deref() == Some(name) {
            if let Some(me) = self.me.upgrade() {
                return Some(me);
            }
        }
        self.parent.as_ref().and_then(|parent| parent.find(name))
    }

    fn namespace_resolver(&self) -> Option<Arc<dyn NamespaceResolver>> {
        self.resolver
            .clone()
            .or_else(|| self.parent.as_ref().and_then(|p| p.namespace_resolver()))
    }
}
