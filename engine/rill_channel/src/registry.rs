//! The caller-owned type registry.
//!
//! Everything the original design kept in process-wide statics lives
//! here instead: built-in reflector singletons, registered host
//! adapters, the nominal type table, and the operator/promotion combiner
//! memo. Multiple engines with independent registries coexist safely.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use rill_value::{
    numeric_add, numeric_div, numeric_mul, numeric_rem, numeric_sub, ContentKind, NumericKind,
    Value,
};

use crate::{
    BindError, BuiltinReflector, Combiner, ListReflector, NamespaceResolver, RecordReflector,
    Reflector, ReflectorRef,
};

/// Arithmetic operators subject to numeric promotion.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

/// One arithmetic combiner per (operator, promoted kind) pair.
///
/// Absence on either side propagates as absence; arithmetic faults
/// (integer division by zero, overflow) follow the host primitive.
struct ArithCombiner {
    op: ArithOp,
    kind: NumericKind,
}

impl Combiner for ArithCombiner {
    fn combine(&self, left: Option<Value>, right: Option<Value>) -> Option<Value> {
        let (left, right) = (left?, right?);
        match self.op {
            ArithOp::Add => numeric_add(self.kind, &left, &right),
            ArithOp::Sub => numeric_sub(self.kind, &left, &right),
            ArithOp::Mul => numeric_mul(self.kind, &left, &right),
            ArithOp::Div => numeric_div(self.kind, &left, &right),
            ArithOp::Rem => numeric_rem(self.kind, &left, &right),
        }
    }
}

/// Registry of reflectors and memoized operator implementations.
pub struct TypeRegistry {
    builtins: FxHashMap<ContentKind, ReflectorRef>,
    by_uri: RwLock<FxHashMap<String, ReflectorRef>>,
    named: RwLock<FxHashMap<String, ReflectorRef>>,
    combiners: Mutex<FxHashMap<(ArithOp, NumericKind), Arc<dyn Combiner>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut builtins: FxHashMap<ContentKind, ReflectorRef> = FxHashMap::default();
        let scalar_kinds = [
            ContentKind::Int,
            ContentKind::Long,
            ContentKind::Float,
            ContentKind::Double,
            ContentKind::BigInt,
            ContentKind::Decimal,
            ContentKind::Bool,
            ContentKind::Str,
            ContentKind::Record,
            ContentKind::Opaque,
            ContentKind::Nil,
        ];
        for kind in scalar_kinds {
            builtins.insert(kind, Arc::new(BuiltinReflector::new(kind)) as ReflectorRef);
        }
        let nil = builtins[&ContentKind::Nil].clone();
        builtins.insert(
            ContentKind::List,
            Arc::new(ListReflector::new(nil)) as ReflectorRef,
        );

        TypeRegistry {
            builtins,
            by_uri: RwLock::new(FxHashMap::default()),
            named: RwLock::new(FxHashMap::default()),
            combiners: Mutex::new(FxHashMap::default()),
        }
    }

    /// The singleton reflector for a built-in kind.
    pub fn builtin(&self, kind: ContentKind) -> ReflectorRef {
        self.builtins[&kind].clone()
    }

    /// A list reflector with a refined element type.
    pub fn list_of(&self, element: ReflectorRef) -> ReflectorRef {
        Arc::new(ListReflector::new(element))
    }

    /// Dynamic reflector of a runtime value. Records answer with their
    /// defining shape; everything else uses the built-in singleton.
    pub fn reflector_of(&self, value: &Value) -> ReflectorRef {
        if let Some(record) = value.as_record() {
            let shape = record.shape().clone();
            if let Ok(reflector) = shape.downcast::<RecordReflector>() {
                return reflector;
            }
        }
        self.builtin(value.kind())
    }

    /// Register a host adapter once per content type; memoized by URI.
    pub fn register(&self, reflector: ReflectorRef) {
        self.by_uri
            .write()
            .insert(reflector.uri().to_string(), reflector);
    }

    /// Register a nominal type under a surface name (used by `Name{...}`
    /// literals and `@cast(Name)`).
    pub fn register_named(&self, name: impl Into<String>, reflector: ReflectorRef) {
        let name = name.into();
        self.by_uri
            .write()
            .insert(reflector.uri().to_string(), reflector.clone());
        self.named.write().insert(name, reflector);
    }

    /// Look up a registered reflector by URI.
    pub fn lookup_uri(&self, uri: &str) -> Option<ReflectorRef> {
        self.by_uri.read().get(uri).cloned()
    }

    /// Resolve a surface type name: built-in kind names first, then the
    /// nominal table; `prefix:Name` goes through the namespace resolver.
    pub fn lookup_named(
        &self,
        name: &str,
        resolver: Option<&Arc<dyn NamespaceResolver>>,
    ) -> Result<Option<ReflectorRef>, BindError> {
        if let Some((prefix, local)) = name.split_once(':') {
            let Some(resolver) = resolver else {
                return Err(BindError::UnresolvedNamespace {
                    prefix: prefix.to_string(),
                });
            };
            let Some(base_uri) = resolver.resolve_prefix(prefix) else {
                return Err(BindError::UnresolvedNamespace {
                    prefix: prefix.to_string(),
                });
            };
            return Ok(self.lookup_uri(&format!("{base_uri}{local}")));
        }
        if let Some(kind) = ContentKind::from_name(name) {
            return Ok(Some(self.builtin(kind)));
        }
        Ok(self.named.read().get(name).cloned())
    }

    /// The shared combiner for an (operator, promoted kind) pair.
    ///
    /// Exactly one instance exists per pair per registry; repeated binds
    /// reuse the same arithmetic function object.
    pub fn arith_combiner(&self, op: ArithOp, kind: NumericKind) -> Arc<dyn Combiner> {
        self.combiners
            .lock()
            .entry((op, kind))
            .or_insert_with(|| Arc::new(ArithCombiner { op, kind }))
            .clone()
    }

    /// Common type of two reflectors, asymmetric by design: the left
    /// side wins when each is assignable from the other's direction.
    pub fn common_type(
        &self,
        left: &ReflectorRef,
        right: &ReflectorRef,
    ) -> Result<ReflectorRef, BindError> {
        if right.is_assignable_to(left.uri()) {
            return Ok(left.clone());
        }
        if left.is_assignable_to(right.uri()) {
            return Ok(right.clone());
        }
        if let (Some(a), Some(b)) = (
            NumericKind::from_content(left.content()),
            NumericKind::from_content(right.content()),
        ) {
            return Ok(self.builtin(rill_value::promote(a, b).content()));
        }
        // Structural containers meet at their generic type.
        if left.content() == ContentKind::List && right.content() == ContentKind::List {
            return Ok(self.builtin(ContentKind::List));
        }
        if left.content() == ContentKind::Record && right.content() == ContentKind::Record {
            return Ok(self.builtin(ContentKind::Record));
        }
        Err(BindError::IncompatibleBranches {
            left: left.uri().to_string(),
            right: right.uri().to_string(),
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn combiners_are_memoized_per_pair() {
        let registry = TypeRegistry::new();
        let a = registry.arith_combiner(ArithOp::Add, NumericKind::Long);
        let b = registry.arith_combiner(ArithOp::Add, NumericKind::Long);
        let c = registry.arith_combiner(ArithOp::Mul, NumericKind::Long);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn combiner_applies_promotion_kind() {
        let registry = TypeRegistry::new();
        let add = registry.arith_combiner(ArithOp::Add, NumericKind::Long);
        assert_eq!(
            add.combine(Some(Value::Int(1)), Some(Value::Long(2))),
            Some(Value::Long(3))
        );
        assert_eq!(add.combine(None, Some(Value::Long(2))), None);
    }

    #[test]
    fn common_type_prefers_the_left_side() {
        let registry = TypeRegistry::new();
        let nil = registry.builtin(ContentKind::Nil);
        let int = registry.builtin(ContentKind::Int);
        let str_ = registry.builtin(ContentKind::Str);

        // Nil is assignable to int, so the left (int) wins.
        let common = registry.common_type(&int, &nil).unwrap();
        assert_eq!(common.uri(), int.uri());
        // And with nil on the left, the right side wins through the
        // second directed check.
        let common = registry.common_type(&nil, &int).unwrap();
        assert_eq!(common.uri(), int.uri());

        // Numerics meet at their promotion.
        let common = registry
            .common_type(&int, &registry.builtin(ContentKind::Decimal))
            .unwrap();
        assert_eq!(common.content(), ContentKind::Decimal);

        assert!(registry.common_type(&int, &str_).is_err());
    }

    #[test]
    fn builtin_name_lookup() {
        let registry = TypeRegistry::new();
        let found = registry.lookup_named("long", None).unwrap();
        assert_eq!(found.map(|r| r.content()), Some(ContentKind::Long));
        assert!(registry.lookup_named("nope", None).unwrap().is_none());
        assert!(registry.lookup_named("ns:Thing", None).is_err());
    }
}
