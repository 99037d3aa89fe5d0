//! Record types: anonymous and nominal fixed-shape values with computed
//! and pass-through fields, base extension, and reentrant
//! self-reference.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;

use rill_value::{ContentKind, Heap, RecordValue, Value};

use crate::{
    BindError, Capability, Channel, Decorator, FocusRef, MemoKey, Reflector, ReflectorRef,
    ScopedSlot, Signature, Site, TypeRegistry, WeakChannel,
};

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// One field of a record type, bound at bind time.
#[derive(Clone)]
pub struct RecordField {
    /// Empty for positional (tuple) fields.
    pub name: String,
    /// The bound source expression.
    pub channel: Channel,
    /// Pass-through fields delegate get/set live to `channel` and store
    /// nothing per instance.
    pub pass_through: bool,
}

/// The defining type of one record literal.
///
/// Created empty and populated field by field while the literal binds,
/// so a field expression can already resolve its earlier siblings
/// through the literal channel. After the bind completes the field list
/// never changes again.
///
/// Every literal bind creates its own reflector; the URI is unique per
/// instance, and assignability extends to the generic record type, the
/// declared nominal type (once its signatures check out), and the base
/// extent's type.
pub struct RecordReflector {
    me: Weak<RecordReflector>,
    uri: String,
    type_name: Option<String>,
    fields: RwLock<Vec<RecordField>>,
    names: RwLock<Arc<[String]>>,
    base: Option<Channel>,
    assignable: Vec<String>,
    /// The channel of the defining literal; member resolution against it
    /// consults the thread-scoped current instance for self-reference.
    literal: OnceLock<WeakChannel>,
    /// The instance under construction on this thread, innermost first.
    current: ScopedSlot<Value>,
}

impl RecordReflector {
    /// Start a record type with no fields yet. `also_assignable` carries
    /// URIs this record may additionally be treated as (the declared
    /// nominal type, checked by the binder).
    pub fn new(
        type_name: Option<String>,
        base: Option<Channel>,
        also_assignable: Vec<String>,
    ) -> Arc<RecordReflector> {
        let id = NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed);
        let uri = match &type_name {
            Some(name) => format!("rill:record:{name}#{id}"),
            None => format!("rill:record#{id}"),
        };
        let mut assignable = also_assignable;
        assignable.push(ContentKind::Record.uri().to_string());
        if let Some(base) = &base {
            assignable.push(base.reflector().uri().to_string());
        }
        Arc::new_cyclic(|me| RecordReflector {
            me: me.clone(),
            uri,
            type_name,
            fields: RwLock::new(Vec::new()),
            names: RwLock::new(Vec::new().into()),
            base,
            assignable,
            literal: OnceLock::new(),
            current: ScopedSlot::new(),
        })
    }

    /// Attach the defining literal's channel. Called once by the binder
    /// right after it wraps this reflector in a channel.
    pub fn attach(&self, channel: &Channel) {
        let _ = self.literal.set(channel.downgrade());
    }

    /// Append a bound field. Only the binder calls this, before the
    /// literal channel escapes.
    pub fn push_field(&self, field: RecordField) {
        let mut fields = self.fields.write();
        fields.push(field);
        *self.names.write() = fields
            .iter()
            .map(|field| field.name.clone())
            .collect::<Vec<_>>()
            .into();
    }

    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Snapshot of one field (channels are cheap handles).
    pub fn field(&self, index: usize) -> Option<RecordField> {
        self.fields.read().get(index).cloned()
    }

    /// Snapshot of all fields.
    pub fn fields(&self) -> Vec<RecordField> {
        self.fields.read().clone()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .read()
            .iter()
            .position(|field| field.name == name)
    }

    pub fn base(&self) -> Option<&Channel> {
        self.base.as_ref()
    }

    /// Construct one record instance.
    ///
    /// The in-progress record is pushed onto the thread-scoped current
    /// slot before any field evaluates and popped on every exit path, so
    /// field expressions may reference siblings or the record itself —
    /// including reentrantly through a functor invocation — without
    /// observing another thread's instance.
    ///
    /// `overrides[i]`, when present, replaces field `i`'s computed
    /// expression (functor call); an override of a pass-through field is
    /// written through to its delegate.
    pub fn instantiate(&self, overrides: &[Option<Value>]) -> Option<Value> {
        let shape: Arc<dyn Any + Send + Sync> = self.me.upgrade()?;
        let fields = self.fields();
        let names = self.names.read().clone();
        let base_value = self.base.as_ref().and_then(Channel::get);
        let record = Value::record(RecordValue::new(
            shape,
            names,
            vec![None; fields.len()],
            base_value,
        ));
        let heap = record.as_record()?.clone();

        let _guard = self.current.push(record.clone());
        for (i, field) in fields.iter().enumerate() {
            let supplied = overrides.get(i).cloned();
            if field.pass_through {
                if let Some(value) = supplied {
                    let _ = field.channel.store(value);
                }
                continue;
            }
            let value = match supplied {
                Some(value) => value,
                None => field.channel.get(),
            };
            heap.set(i, value);
        }
        Some(record)
    }

    /// The record instance to read a field from: the thread's in-flight
    /// instance when resolving against the defining literal, otherwise
    /// the receiver channel's current value.
    fn instance_for(&self, source: &Channel, self_mode: bool) -> Option<Heap<RecordValue>> {
        if self_mode {
            if let Some(Value::Record(heap)) = self.current.current() {
                return Some(heap);
            }
        }
        match source.get()? {
            Value::Record(heap) => Some(heap),
            _ => None,
        }
    }
}

impl Reflector for RecordReflector {
    fn content(&self) -> ContentKind {
        ContentKind::Record
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn resolve(
        &self,
        registry: &Arc<TypeRegistry>,
        channel: &Channel,
        focus: &FocusRef,
        name: &str,
        args: &[Channel],
    ) -> Result<Option<Channel>, BindError> {
        if !args.is_empty() {
            return Ok(None);
        }
        if let Some(index) = self.field_index(name) {
            let Some(owner) = self.me.upgrade() else {
                return Ok(None);
            };
            let self_mode = self
                .literal
                .get()
                .is_some_and(|weak| weak.refers_to(channel));
            let Some(field) = self.field(index) else {
                return Ok(None);
            };
            let reflector = field.channel.reflector().clone();
            let derived = channel.derived(MemoKey::Member(name.to_string()), || {
                Channel::new(
                    reflector,
                    Box::new(FieldSite {
                        owner,
                        source: channel.clone(),
                        index,
                        self_mode,
                    }),
                )
            });
            return Ok(Some(derived));
        }
        // Fall back to the base extent: its members stay live through
        // the base channel.
        if let Some(base) = &self.base {
            let base_reflector = base.reflector().clone();
            return base_reflector.resolve(registry, base, focus, name, args);
        }
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
        uri == self.uri || self.assignable.iter().any(|a| a == uri)
    }

    fn signatures(&self) -> Vec<Signature> {
        self.fields
            .read()
            .iter()
            .filter(|field| !field.name.is_empty())
            .map(|field| Signature::property(field.name.clone(), field.channel.content()))
            .collect()
    }

    fn as_record(&self) -> Option<Arc<RecordReflector>> {
        self.me.upgrade()
    }
}

impl std::fmt::Debug for RecordReflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecordReflector({})", self.uri)
    }
}

/// Site for one resolved record field.
struct FieldSite {
    owner: Arc<RecordReflector>,
    source: Channel,
    index: usize,
    /// True when resolved against the defining literal itself, enabling
    /// current-instance (self/sibling) reads during construction.
    self_mode: bool,
}

impl Site for FieldSite {
    fn get(&self) -> Option<Value> {
        let field = self.owner.field(self.index)?;
        if field.pass_through {
            return field.channel.get();
        }
        let heap = self.owner.instance_for(&self.source, self.self_mode)?;
        heap.get(self.index)
    }

    fn set(&self, value: Option<Value>) -> bool {
        let Some(field) = self.owner.field(self.index) else {
            return false;
        };
        if field.pass_through {
            return field.channel.store(value);
        }
        match self.owner.instance_for(&self.source, self.self_mode) {
            Some(heap) => heap.set(self.index, value),
            None => false,
        }
    }
}

/// Site of the record literal channel itself: every read constructs a
/// fresh instance.
pub struct RecordSite {
    owner: Arc<RecordReflector>,
}

impl RecordSite {
    pub fn new(owner: Arc<RecordReflector>) -> Self {
        RecordSite { owner }
    }
}

impl Site for RecordSite {
    fn get(&self) -> Option<Value> {
        self.owner.instantiate(&[])
    }
}

/// Site of a functor invocation: a record channel called with arguments
/// instantiates with the leading fields overridden.
pub struct FunctorSite {
    owner: Arc<RecordReflector>,
    args: Vec<Channel>,
}

impl FunctorSite {
    pub fn new(owner: Arc<RecordReflector>, args: Vec<Channel>) -> Self {
        FunctorSite { owner, args }
    }
}

impl Site for FunctorSite {
    fn get(&self) -> Option<Value> {
        // An argument slot is an override even when its value is
        // currently absent.
        let overrides: Vec<Option<Value>> = self.args.iter().map(Channel::get).collect();
        self.owner.instantiate(&overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkedFocus, TypeRegistry};
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new())
    }

    fn record_with_passthrough(
        registry: &Arc<TypeRegistry>,
    ) -> (Arc<RecordReflector>, Channel, Channel) {
        let delegate = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(10)));
        let computed = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(1)));
        let reflector = RecordReflector::new(None, None, Vec::new());
        reflector.push_field(RecordField {
            name: "live".to_string(),
            channel: delegate.clone(),
            pass_through: true,
        });
        reflector.push_field(RecordField {
            name: "snap".to_string(),
            channel: computed.clone(),
            pass_through: false,
        });
        (reflector, delegate, computed)
    }

    #[test]
    fn computed_fields_snapshot_and_passthrough_fields_delegate() {
        let registry = registry();
        let (reflector, delegate, computed) = record_with_passthrough(&registry);
        let literal = Channel::new(
            reflector.clone() as ReflectorRef,
            Box::new(RecordSite::new(reflector.clone())),
        );
        reflector.attach(&literal);

        let focus = LinkedFocus::root();
        let live = reflector
            .resolve(&registry, &literal, &focus, "live", &[])
            .unwrap()
            .unwrap();
        let snap = reflector
            .resolve(&registry, &literal, &focus, "snap", &[])
            .unwrap()
            .unwrap();

        // Reading the computed field outside construction instantiates
        // and reads the snapshot.
        assert_eq!(snap.get(), Some(Value::Int(1)));
        // Pass-through reads stay live as the delegate changes.
        assert!(delegate.store(Some(Value::Int(20))));
        assert_eq!(live.get(), Some(Value::Int(20)));

        // Pass-through writes land in the delegate immediately.
        assert!(live.store(Some(Value::Int(30))));
        assert_eq!(delegate.get(), Some(Value::Int(30)));

        // Computed-field writes only touch an instance, never the
        // source expression.
        let instance = reflector.instantiate(&[]).expect("instance");
        let heap = instance.as_record().unwrap();
        assert!(heap.set(1, Some(Value::Int(99))));
        assert_eq!(computed.get(), Some(Value::Int(1)));
    }

    #[test]
    fn instantiation_is_isolated_per_call() {
        let registry = registry();
        let source = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(1)));
        let reflector = RecordReflector::new(None, None, Vec::new());
        reflector.push_field(RecordField {
            name: "a".to_string(),
            channel: source.clone(),
            pass_through: false,
        });
        let first = reflector.instantiate(&[]).unwrap();
        assert!(source.store(Some(Value::Int(2))));
        let second = reflector.instantiate(&[]).unwrap();

        assert_eq!(first.as_record().unwrap().get(0), Some(Value::Int(1)));
        assert_eq!(second.as_record().unwrap().get(0), Some(Value::Int(2)));
    }

    #[test]
    fn functor_overrides_leading_fields() {
        let registry = registry();
        let (reflector, _, _) = record_with_passthrough(&registry);
        let arg = Channel::constant(registry.builtin(ContentKind::Int), Some(Value::Int(5)));
        // Field 0 is pass-through; an override writes through to it.
        let functor = Channel::new(
            reflector.clone() as ReflectorRef,
            Box::new(FunctorSite::new(reflector.clone(), vec![arg])),
        );
        let instance = functor.get().expect("record");
        let heap = instance.as_record().unwrap();
        assert_eq!(heap.get(1), Some(Value::Int(1)));
        assert_eq!(
            reflector.field(0).unwrap().channel.get(),
            Some(Value::Int(5))
        );
    }

    #[test]
    fn current_instance_is_popped_after_construction() {
        let registry = registry();
        let (reflector, _, _) = record_with_passthrough(&registry);
        let _ = reflector.instantiate(&[]);
        assert!(reflector.current.current().is_none());
    }

    #[test]
    fn base_extent_grants_assignability() {
        let registry = registry();
        let base = Channel::cell(registry.builtin(ContentKind::Str), None);
        let reflector = RecordReflector::new(Some("Tagged".to_string()), Some(base), Vec::new());
        assert!(reflector.is_assignable_to("rill:str"));
        assert!(reflector.is_assignable_to("rill:record"));
        assert!(!reflector.is_assignable_to("rill:int"));
    }
}
