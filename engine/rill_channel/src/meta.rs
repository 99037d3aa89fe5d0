//! Built-in meta-operations: the fixed `@name` table resolved centrally
//! before any reflector-specific extension.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use rill_value::{convert, AnyValue, ContentKind, NumericKind, Value};

use crate::{
    decorator_for, BindError, Capability, Channel, Decorator, FocusRef, FrozenSite, MemoKey,
    NilSite, Reflector, ReflectorRef, Site, TypeRegistry,
};

/// `@type` / `@subtype` payload: a reflector as a value.
pub struct ReflectorHandle(pub ReflectorRef);

impl AnyValue for ReflectorHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        self.0.uri().to_string()
    }
}

/// `@channel` payload: the channel object itself.
pub struct ChannelHandle(pub Channel);

impl AnyValue for ChannelHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!("{:?}", self.0)
    }
}

/// `@focus` payload: the focus object.
pub struct FocusHandle(pub FocusRef);

impl AnyValue for FocusHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        "<focus>".to_string()
    }
}

/// Bind an argument-less built-in meta-operation against `channel`.
///
/// Unknown names fall through to the receiver reflector's `resolve` as
/// the extension point; a final miss is `BindError::UnknownMeta`.
/// `@cast` takes a type argument and goes through [`bind_cast`] instead.
pub fn bind_meta(
    registry: &Arc<TypeRegistry>,
    channel: &Channel,
    focus: &FocusRef,
    name: &str,
) -> Result<Channel, BindError> {
    match name {
        "type" => Ok(channel.derived(MemoKey::Meta("type"), || {
            Channel::constant(
                registry.builtin(ContentKind::Opaque),
                Some(Value::opaque(ReflectorHandle(channel.reflector().clone()))),
            )
        })),
        "subtype" => Ok(channel.derived(MemoKey::Meta("subtype"), || {
            Channel::new(
                registry.builtin(ContentKind::Opaque),
                Box::new(SubtypeSite {
                    source: channel.clone(),
                    registry: Arc::clone(registry),
                }),
            )
        })),
        "channel" => Ok(channel.derived(MemoKey::Meta("channel"), || {
            Channel::constant(
                registry.builtin(ContentKind::Opaque),
                Some(Value::opaque(ChannelHandle(channel.clone()))),
            )
        })),
        "focus" => Ok(channel.derived(MemoKey::Meta("focus"), || {
            Channel::constant(
                registry.builtin(ContentKind::Opaque),
                Some(Value::opaque(FocusHandle(focus.clone()))),
            )
        })),
        "nil" => Ok(channel.derived(MemoKey::Meta("nil"), || {
            Channel::new(channel.reflector().clone(), Box::new(NilSite))
        })),
        "size" => {
            let dec = require_decorator(registry, channel, Capability::Iteration)?;
            Ok(channel.derived(MemoKey::Meta("size"), || {
                Channel::new(
                    registry.builtin(ContentKind::Int),
                    Box::new(SizeSite { dec, empty: false }),
                )
            }))
        }
        "empty" => {
            let dec = require_decorator(registry, channel, Capability::Iteration)?;
            Ok(channel.derived(MemoKey::Meta("empty"), || {
                Channel::new(
                    registry.builtin(ContentKind::Bool),
                    Box::new(SizeSite { dec, empty: true }),
                )
            }))
        }
        "list" => {
            let dec = require_decorator(registry, channel, Capability::Iteration)?;
            Ok(channel.derived(MemoKey::Meta("list"), || {
                let element = dec.element();
                Channel::new(
                    registry.list_of(element),
                    Box::new(MaterializeSite { dec }),
                )
            }))
        }
        "top" => {
            let dec = require_decorator(registry, channel, Capability::Iteration)?;
            Ok(channel.derived(MemoKey::Meta("top"), || {
                let element = dec.element();
                Channel::new(element, Box::new(EndSite { dec, last: false }))
            }))
        }
        "last" => {
            let dec = require_decorator(registry, channel, Capability::Iteration)?;
            Ok(channel.derived(MemoKey::Meta("last"), || {
                let element = dec.element();
                Channel::new(element, Box::new(EndSite { dec, last: true }))
            }))
        }
        "constant" => Ok(channel.derived(MemoKey::Meta("constant"), || {
            Channel::frozen(
                channel.reflector().clone(),
                Box::new(FrozenSite::new(channel.clone())),
            )
        })),
        "log" => Ok(channel.derived(MemoKey::Meta("log"), || {
            Channel::new(
                channel.reflector().clone(),
                Box::new(TraceSite {
                    source: channel.clone(),
                    timed: false,
                }),
            )
        })),
        "tune" => Ok(channel.derived(MemoKey::Meta("tune"), || {
            Channel::new(
                channel.reflector().clone(),
                Box::new(TraceSite {
                    source: channel.clone(),
                    timed: true,
                }),
            )
        })),
        other => {
            let reflector = channel.reflector().clone();
            match reflector.resolve(registry, channel, focus, other, &[])? {
                Some(resolved) => Ok(resolved),
                None => Err(BindError::UnknownMeta {
                    name: other.to_string(),
                }),
            }
        }
    }
}

/// Bind `@cast(Type)`. The target must declare cast-compatibility with
/// the source; an impossible pair fails the bind, never the evaluation.
pub fn bind_cast(
    registry: &Arc<TypeRegistry>,
    channel: &Channel,
    target: ReflectorRef,
) -> Result<Channel, BindError> {
    let source = channel.reflector().clone();
    if !target.can_cast_from(&source) {
        return Err(BindError::IncompatibleCast {
            from: source.uri().to_string(),
            to: target.uri().to_string(),
        });
    }
    Ok(
        channel.derived(MemoKey::Uri(target.uri().to_string()), || {
            Channel::new(
                target.clone(),
                Box::new(CastSite {
                    source: channel.clone(),
                    source_kind: source.content(),
                    target,
                }),
            )
        }),
    )
}

fn require_decorator(
    registry: &Arc<TypeRegistry>,
    channel: &Channel,
    capability: Capability,
) -> Result<Arc<dyn Decorator>, BindError> {
    decorator_for(registry, channel, capability).ok_or_else(|| BindError::MissingCapability {
        capability,
        uri: channel.reflector().uri().to_string(),
    })
}

/// `@subtype`: the dynamic type of the current value.
struct SubtypeSite {
    source: Channel,
    registry: Arc<TypeRegistry>,
}

impl Site for SubtypeSite {
    fn get(&self) -> Option<Value> {
        let value = self.source.get()?;
        Some(Value::opaque(ReflectorHandle(
            self.registry.reflector_of(&value),
        )))
    }
}

/// `@size` / `@empty`.
struct SizeSite {
    dec: Arc<dyn Decorator>,
    empty: bool,
}

impl Site for SizeSite {
    fn get(&self) -> Option<Value> {
        let size = self.dec.size()?;
        Some(if self.empty {
            Value::Bool(size == 0)
        } else {
            Value::Int(i32::try_from(size).unwrap_or(i32::MAX))
        })
    }
}

/// `@list`: materialize the iteration.
struct MaterializeSite {
    dec: Arc<dyn Decorator>,
}

impl Site for MaterializeSite {
    fn get(&self) -> Option<Value> {
        Some(Value::list(self.dec.iterate()?))
    }
}

/// `@top` / `@last`.
struct EndSite {
    dec: Arc<dyn Decorator>,
    last: bool,
}

impl Site for EndSite {
    fn get(&self) -> Option<Value> {
        let items = self.dec.iterate()?;
        if self.last {
            items.last().cloned()
        } else {
            items.first().cloned()
        }
    }
}

/// `@cast`.
struct CastSite {
    source: Channel,
    source_kind: ContentKind,
    target: ReflectorRef,
}

impl CastSite {
    fn cast_to(&self, value: Value, kind: ContentKind) -> Option<Value> {
        if value.kind() == kind {
            return Some(value);
        }
        if kind == ContentKind::Str {
            return Some(Value::string(value.to_string()));
        }
        let target = NumericKind::from_content(kind)?;
        convert(&value, target)
    }
}

impl Site for CastSite {
    fn get(&self) -> Option<Value> {
        let value = self.source.get()?;
        self.cast_to(value, self.target.content())
    }

    fn set(&self, value: Option<Value>) -> bool {
        match value {
            Some(value) => match self.cast_to(value, self.source_kind) {
                Some(back) => self.source.store(Some(back)),
                None => false,
            },
            None => self.source.store(None),
        }
    }
}

/// `@log` / `@tune`: transparent tracing wrappers.
struct TraceSite {
    source: Channel,
    timed: bool,
}

impl Site for TraceSite {
    fn get(&self) -> Option<Value> {
        if self.timed {
            let started = Instant::now();
            let value = self.source.get();
            tracing::debug!(target: "rill::tune", elapsed = ?started.elapsed(), value = ?value, "get");
            value
        } else {
            let value = self.source.get();
            tracing::debug!(target: "rill::log", value = ?value, "get");
            value
        }
    }

    fn set(&self, value: Option<Value>) -> bool {
        if self.timed {
            let started = Instant::now();
            let stored = self.source.store(value.clone());
            tracing::debug!(target: "rill::tune", elapsed = ?started.elapsed(), value = ?value, stored, "set");
            stored
        } else {
            let stored = self.source.store(value.clone());
            tracing::debug!(target: "rill::log", value = ?value, stored, "set");
            stored
        }
    }
}
