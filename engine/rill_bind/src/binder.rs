//! The single dispatch from node kinds to channels.

use std::sync::Arc;

use rill_channel::{
    bind_cast, bind_meta, decorator_for, ArithOp, BindError, Capability, Channel, CombinedSite,
    Combiner, Decorator, Focus, FocusExt, FocusRef, FunctorSite, LinkedFocus,
    RecordField, RecordReflector, RecordSite, Reflector, ReflectorRef, ScopedSlot,
    TypeRegistry,
};
use rill_ir::{BinaryOp, Expression, NodeArena, NodeId, NodeKind, Span, UnaryOp};
use rill_value::{promote, ContentKind, NumericKind, Value};

use crate::sites::{
    AccSite, AssignSite, CoalesceSite, CompareSite, ConcatSite, ConditionalSite, ContainsSite,
    EqualitySite, ItemSite, LogicMode, LogicSite, NegSite, NotSite, ProjectSite, RangeSite,
    ReduceSite, StructuralConcatSite, SubscriptSite,
};
use crate::BindFailure;

/// Scope name under which a projection exposes its current element.
const ITEM_SCOPE: &str = "item";
/// Scope name under which a reduction exposes its running value.
const ACC_SCOPE: &str = "acc";

/// Binds expression trees to channel graphs against a shared registry.
pub struct Binder {
    registry: Arc<TypeRegistry>,
}

impl Binder {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Binder { registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Bind a parsed expression against a focus chain.
    pub fn bind(&self, expr: &Expression, focus: &FocusRef) -> Result<Channel, BindFailure> {
        let _span = tracing::debug_span!("bind", source = expr.source()).entered();
        self.bind_node(expr.arena(), expr.root(), focus)
    }

    fn bind_node(
        &self,
        arena: &NodeArena,
        id: NodeId,
        focus: &FocusRef,
    ) -> Result<Channel, BindFailure> {
        let node = arena.get(id);
        let span = node.span;

        match &node.kind {
            NodeKind::Int(n) => Ok(self.literal(ContentKind::Int, Value::Int(*n))),
            NodeKind::Long(n) => Ok(self.literal(ContentKind::Long, Value::Long(*n))),
            NodeKind::Float(bits) => {
                Ok(self.literal(ContentKind::Float, Value::Float(f32::from_bits(*bits))))
            }
            NodeKind::Double(bits) => {
                Ok(self.literal(ContentKind::Double, Value::Double(f64::from_bits(*bits))))
            }
            NodeKind::Bool(b) => Ok(self.literal(ContentKind::Bool, Value::Bool(*b))),
            NodeKind::Str(text) => {
                Ok(self.literal(ContentKind::Str, Value::string(arena.text(*text))))
            }
            NodeKind::Null => Ok(Channel::constant(
                self.registry.builtin(ContentKind::Nil),
                None,
            )),

            NodeKind::Ident(name) => self
                .resolve_name(arena.text(*name), focus)
                .map_err(|error| fail(error, span)),

            NodeKind::Member { receiver, name } => {
                let receiver = self.bind_node(arena, *receiver, focus)?;
                self.resolve_member(&receiver, focus, arena.text(*name), &[])
                    .map_err(|error| fail(error, span))
            }

            NodeKind::Call { target, args } => {
                let mut bound_args = Vec::with_capacity(args.len());
                for &arg in arena.list(*args) {
                    bound_args.push(self.bind_node(arena, arg, focus)?);
                }
                // Method-style call: resolve name-with-args against the
                // receiver before considering the bare member.
                if let NodeKind::Member { receiver, name } = arena.get(*target).kind {
                    let receiver = self.bind_node(arena, receiver, focus)?;
                    let text = arena.text(name);
                    let reflector = receiver.reflector().clone();
                    if let Some(found) = reflector
                        .resolve(&self.registry, &receiver, focus, text, &bound_args)
                        .map_err(|error| fail(error, span))?
                    {
                        return Ok(found);
                    }
                    let member = self
                        .resolve_member(&receiver, focus, text, &[])
                        .map_err(|error| fail(error, span))?;
                    return self
                        .bind_functor(member, bound_args)
                        .map_err(|error| fail(error, span));
                }
                let target = self.bind_node(arena, *target, focus)?;
                self.bind_functor(target, bound_args)
                    .map_err(|error| fail(error, span))
            }

            NodeKind::Unary { op, operand } => {
                let operand = self.bind_node(arena, *operand, focus)?;
                self.bind_unary(*op, operand)
                    .map_err(|error| fail(error, span))
            }

            NodeKind::Binary { op, left, right } => {
                let left = self.bind_node(arena, *left, focus)?;
                let right = self.bind_node(arena, *right, focus)?;
                self.bind_binary(*op, left, right)
                    .map_err(|error| fail(error, span))
            }

            NodeKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.bind_node(arena, *cond, focus)?;
                if cond.content() != ContentKind::Bool {
                    return Err(fail(
                        BindError::UnsupportedOperator {
                            op: "?:".to_string(),
                            content: cond.content(),
                        },
                        span,
                    ));
                }
                let then_channel = self.bind_node(arena, *then_branch, focus)?;
                let else_channel = self.bind_node(arena, *else_branch, focus)?;
                let common = self
                    .registry
                    .common_type(then_channel.reflector(), else_channel.reflector())
                    .map_err(|error| fail(error, span))?;
                Ok(Channel::new(
                    common,
                    Box::new(ConditionalSite {
                        cond,
                        then_channel,
                        else_channel,
                    }),
                ))
            }

            NodeKind::Coalesce { left, right } => {
                let left = self.bind_node(arena, *left, focus)?;
                let right = self.bind_node(arena, *right, focus)?;
                let common = self
                    .registry
                    .common_type(left.reflector(), right.reflector())
                    .map_err(|error| fail(error, span))?;
                Ok(Channel::new(
                    common,
                    Box::new(CoalesceSite { left, right }),
                ))
            }

            NodeKind::Range {
                start,
                end,
                inclusive,
            } => {
                let start = self.bind_node(arena, *start, focus)?;
                let end = self.bind_node(arena, *end, focus)?;
                let op = if *inclusive { ".." } else { ".!" };
                for endpoint in [&start, &end] {
                    if !matches!(endpoint.content(), ContentKind::Int | ContentKind::Long) {
                        return Err(fail(
                            BindError::UnsupportedOperator {
                                op: op.to_string(),
                                content: endpoint.content(),
                            },
                            span,
                        ));
                    }
                }
                let long = start.content() == ContentKind::Long
                    || end.content() == ContentKind::Long;
                let element = self.registry.builtin(if long {
                    ContentKind::Long
                } else {
                    ContentKind::Int
                });
                Ok(Channel::new(
                    self.registry.list_of(element),
                    Box::new(RangeSite {
                        start,
                        end,
                        inclusive: *inclusive,
                        long,
                    }),
                ))
            }

            NodeKind::Contains { haystack, needle } => {
                let haystack = self.bind_node(arena, *haystack, focus)?;
                let needle = self.bind_node(arena, *needle, focus)?;
                let dec = self
                    .require_capability(&haystack, Capability::Iteration)
                    .map_err(|error| fail(error, span))?;
                Ok(Channel::new(
                    self.registry.builtin(ContentKind::Bool),
                    Box::new(ContainsSite {
                        haystack: dec,
                        needle,
                    }),
                ))
            }

            NodeKind::Subscript { receiver, index } => {
                let receiver = self.bind_node(arena, *receiver, focus)?;
                let index = self.bind_node(arena, *index, focus)?;
                let dec = self
                    .require_capability(&receiver, Capability::List)
                    .map_err(|error| fail(error, span))?;
                let reflector = if index.content() == ContentKind::List {
                    self.registry.list_of(dec.element())
                } else {
                    dec.element()
                };
                Ok(Channel::new(
                    reflector,
                    Box::new(SubscriptSite {
                        receiver: dec,
                        index,
                    }),
                ))
            }

            NodeKind::MapProject { source, body } => {
                let source = self.bind_node(arena, *source, focus)?;
                let dec = self
                    .require_capability(&source, Capability::Iteration)
                    .map_err(|error| fail(error, span))?;
                let item_slot = Arc::new(ScopedSlot::new());
                let item = Channel::new(
                    dec.element(),
                    Box::new(ItemSite {
                        slot: Arc::clone(&item_slot),
                    }),
                );
                let scope = LinkedFocus::named(ITEM_SCOPE, item, focus);
                let body = self.bind_node(arena, *body, &scope)?;
                Ok(Channel::new(
                    self.registry.list_of(body.reflector().clone()),
                    Box::new(ProjectSite {
                        source: dec,
                        body,
                        item_slot,
                    }),
                ))
            }

            NodeKind::ReduceProject { source, body } => {
                let source = self.bind_node(arena, *source, focus)?;
                let dec = self
                    .require_capability(&source, Capability::Iteration)
                    .map_err(|error| fail(error, span))?;
                let item_slot = Arc::new(ScopedSlot::new());
                let acc_slot: Arc<ScopedSlot<Option<Value>>> = Arc::new(ScopedSlot::new());
                let item = Channel::new(
                    dec.element(),
                    Box::new(ItemSite {
                        slot: Arc::clone(&item_slot),
                    }),
                );
                let acc = Channel::new(
                    self.registry.builtin(ContentKind::Nil),
                    Box::new(AccSite {
                        slot: Arc::clone(&acc_slot),
                    }),
                );
                let acc_scope = LinkedFocus::named(ACC_SCOPE, acc, focus);
                let scope = LinkedFocus::named(ITEM_SCOPE, item, &acc_scope);
                let body = self.bind_node(arena, *body, &scope)?;
                let fold = self
                    .fold_strategy(&body)
                    .map_err(|error| fail(error, span))?;
                Ok(Channel::new(
                    body.reflector().clone(),
                    Box::new(ReduceSite {
                        source: dec,
                        body,
                        item_slot,
                        acc_slot,
                        fold,
                    }),
                ))
            }

            NodeKind::Assign { target, value } => {
                let target = self.bind_node(arena, *target, focus)?;
                let value = self.bind_node(arena, *value, focus)?;
                Ok(Channel::new(
                    value.reflector().clone(),
                    Box::new(AssignSite { target, value }),
                ))
            }

            // `:=` outside a record literal is a live alias of the right
            // side; the left-hand name only labels it.
            NodeKind::Alias { value, .. } => self.bind_node(arena, *value, focus),

            NodeKind::Record { name, base, fields } => {
                self.bind_record(arena, id, *name, *base, *fields, focus)
            }

            NodeKind::Meta {
                receiver,
                name,
                args,
            } => self.bind_meta_node(arena, id, *receiver, *name, *args, focus),

            NodeKind::Scope(name) => {
                let text = arena.text(*name);
                let Some(scope) = focus.find(text) else {
                    return Err(fail(
                        BindError::ScopeNotFound {
                            name: text.to_string(),
                        },
                        span,
                    ));
                };
                scope
                    .subject()
                    .or_else(|| scope.context_channel())
                    .ok_or_else(|| {
                        fail(
                            BindError::ScopeNotFound {
                                name: text.to_string(),
                            },
                            span,
                        )
                    })
            }
        }
    }

    fn literal(&self, kind: ContentKind, value: Value) -> Channel {
        Channel::constant(self.registry.builtin(kind), Some(value))
    }

    /// Walk the focus chain outward, context cell before subject cell.
    fn resolve_name(&self, name: &str, focus: &FocusRef) -> Result<Channel, BindError> {
        let mut scope = Some(focus.clone());
        let mut available = Vec::new();
        while let Some(current) = scope {
            for channel in [current.context_channel(), current.subject()]
                .into_iter()
                .flatten()
            {
                let reflector = channel.reflector().clone();
                if let Some(found) =
                    reflector.resolve(&self.registry, &channel, &current, name, &[])?
                {
                    return Ok(found);
                }
                available.extend(reflector.signatures());
            }
            scope = current.parent();
        }
        available.truncate(8);
        Err(BindError::NameNotFound {
            name: name.to_string(),
            receiver: None,
            available,
        })
    }

    fn resolve_member(
        &self,
        receiver: &Channel,
        focus: &FocusRef,
        name: &str,
        args: &[Channel],
    ) -> Result<Channel, BindError> {
        let reflector = receiver.reflector().clone();
        match reflector.resolve(&self.registry, receiver, focus, name, args)? {
            Some(found) => Ok(found),
            None => Err(BindError::NameNotFound {
                name: name.to_string(),
                receiver: Some(reflector.uri().to_string()),
                available: reflector.signatures(),
            }),
        }
    }

    fn bind_unary(&self, op: UnaryOp, operand: Channel) -> Result<Channel, BindError> {
        match op {
            UnaryOp::Neg => {
                if !operand.content().is_numeric() {
                    return Err(BindError::UnsupportedOperator {
                        op: "-".to_string(),
                        content: operand.content(),
                    });
                }
                Ok(Channel::new(
                    operand.reflector().clone(),
                    Box::new(NegSite { source: operand }),
                ))
            }
            UnaryOp::Not => {
                if operand.content() != ContentKind::Bool {
                    return Err(BindError::UnsupportedOperator {
                        op: "!".to_string(),
                        content: operand.content(),
                    });
                }
                Ok(Channel::new(
                    self.registry.builtin(ContentKind::Bool),
                    Box::new(NotSite { source: operand }),
                ))
            }
        }
    }

    /// Operator strategy selection, driven by the static content kind of
    /// the left operand.
    fn bind_binary(
        &self,
        op: BinaryOp,
        left: Channel,
        right: Channel,
    ) -> Result<Channel, BindError> {
        if op.is_arithmetic() {
            return self.bind_arithmetic(op, left, right);
        }
        if op.is_ordering() {
            let comparable = (left.content() == ContentKind::Str
                && right.content() == ContentKind::Str)
                || (left.content().is_numeric() && right.content().is_numeric());
            if !comparable {
                return Err(BindError::UnsupportedOperator {
                    op: op.symbol().to_string(),
                    content: left.content(),
                });
            }
            return Ok(Channel::new(
                self.registry.builtin(ContentKind::Bool),
                Box::new(CompareSite { left, right, op }),
            ));
        }
        if op.is_equality() {
            return Ok(Channel::new(
                self.registry.builtin(ContentKind::Bool),
                Box::new(EqualitySite {
                    left,
                    right,
                    negate: op == BinaryOp::NotEq,
                }),
            ));
        }
        // Logical operators require boolean operands on both sides.
        for operand in [&left, &right] {
            if operand.content() != ContentKind::Bool {
                return Err(BindError::UnsupportedOperator {
                    op: op.symbol().to_string(),
                    content: operand.content(),
                });
            }
        }
        let mode = match op {
            BinaryOp::And => LogicMode::And,
            BinaryOp::Or => LogicMode::Or,
            _ => LogicMode::Xor,
        };
        Ok(Channel::new(
            self.registry.builtin(ContentKind::Bool),
            Box::new(LogicSite { left, right, mode }),
        ))
    }

    fn bind_arithmetic(
        &self,
        op: BinaryOp,
        left: Channel,
        right: Channel,
    ) -> Result<Channel, BindError> {
        match left.content() {
            // Strings concatenate with `+` and support nothing else.
            ContentKind::Str => {
                if op != BinaryOp::Add {
                    return Err(BindError::UnsupportedOperator {
                        op: op.symbol().to_string(),
                        content: ContentKind::Str,
                    });
                }
                Ok(Channel::new(
                    self.registry.builtin(ContentKind::Str),
                    Box::new(ConcatSite { left, right }),
                ))
            }
            kind if kind.is_numeric() => {
                let Some(l) = NumericKind::from_content(kind) else {
                    unreachable!("is_numeric implies a numeric kind");
                };
                let Some(r) = NumericKind::from_content(right.content()) else {
                    return Err(BindError::UnsupportedOperator {
                        op: op.symbol().to_string(),
                        content: right.content(),
                    });
                };
                let promoted = promote(l, r);
                let combiner = self.registry.arith_combiner(arith_op(op), promoted);
                Ok(Channel::new(
                    self.registry.builtin(promoted.content()),
                    Box::new(CombinedSite::new(left, right, combiner)),
                ))
            }
            other => {
                // Iterable left operands concatenate structurally.
                if op == BinaryOp::Add {
                    if let Some(left_dec) =
                        decorator_for(&self.registry, &left, Capability::Iteration)
                    {
                        let right_dec = decorator_for(
                            &self.registry,
                            &right,
                            Capability::Iteration,
                        )
                        .ok_or(BindError::UnsupportedOperator {
                            op: "+".to_string(),
                            content: right.content(),
                        })?;
                        let element = left_dec.element();
                        return Ok(Channel::new(
                            self.registry.list_of(element),
                            Box::new(StructuralConcatSite {
                                left: left_dec,
                                right: right_dec,
                            }),
                        ));
                    }
                }
                Err(BindError::UnsupportedOperator {
                    op: op.symbol().to_string(),
                    content: other,
                })
            }
        }
    }

    /// Calling a non-member target: records are functors.
    fn bind_functor(&self, target: Channel, args: Vec<Channel>) -> Result<Channel, BindError> {
        match target.reflector().as_record() {
            Some(shape) => Ok(Channel::new(
                target.reflector().clone(),
                Box::new(FunctorSite::new(shape, args)),
            )),
            None => Err(BindError::UnsupportedOperator {
                op: "()".to_string(),
                content: target.content(),
            }),
        }
    }

    /// The `+` strategy used to fold a reduction, chosen from the
    /// projected body's static type.
    fn fold_strategy(
        &self,
        body: &Channel,
    ) -> Result<Arc<dyn Fn(Value, Value) -> Option<Value> + Send + Sync>, BindError> {
        match body.content() {
            kind if kind.is_numeric() => {
                let Some(numeric) = NumericKind::from_content(kind) else {
                    unreachable!("is_numeric implies a numeric kind");
                };
                let combiner = self
                    .registry
                    .arith_combiner(ArithOp::Add, promote(numeric, numeric));
                Ok(Arc::new(move |a, b| combiner.combine(Some(a), Some(b))))
            }
            ContentKind::Str => Ok(Arc::new(|a, b| {
                Some(Value::string(format!("{a}{b}")))
            })),
            ContentKind::List => Ok(Arc::new(|a, b| match (a, b) {
                (Value::List(left), Value::List(right)) => {
                    let mut items = left.to_vec();
                    items.extend(right.iter().cloned());
                    Some(Value::list(items))
                }
                _ => None,
            })),
            other => Err(BindError::UnsupportedOperator {
                op: "$".to_string(),
                content: other,
            }),
        }
    }

    fn require_capability(
        &self,
        channel: &Channel,
        capability: Capability,
    ) -> Result<Arc<dyn rill_channel::Decorator>, BindError> {
        decorator_for(&self.registry, channel, capability).ok_or_else(|| {
            BindError::MissingCapability {
                capability,
                uri: channel.reflector().uri().to_string(),
            }
        })
    }

    fn bind_record(
        &self,
        arena: &NodeArena,
        id: NodeId,
        name: rill_ir::NameId,
        base: NodeId,
        fields: rill_ir::FieldRange,
        focus: &FocusRef,
    ) -> Result<Channel, BindFailure> {
        let span = arena.get(id).span;
        let type_name = (!name.is_empty()).then(|| arena.text(name).to_string());

        // A nominal literal must name a registered type.
        let declared: Option<ReflectorRef> = match &type_name {
            Some(type_name) => {
                let resolver = focus.namespace_resolver();
                match self
                    .registry
                    .lookup_named(type_name, resolver.as_ref())
                    .map_err(|error| fail(error, span))?
                {
                    Some(declared) => Some(declared),
                    None => {
                        return Err(fail(
                            BindError::NameNotFound {
                                name: type_name.clone(),
                                receiver: None,
                                available: Vec::new(),
                            },
                            span,
                        ))
                    }
                }
            }
            None => None,
        };

        let base_channel = if base.is_valid() {
            Some(self.bind_node(arena, base, focus)?)
        } else {
            None
        };

        let also_assignable = declared
            .iter()
            .map(|declared| declared.uri().to_string())
            .collect();
        let reflector = RecordReflector::new(type_name.clone(), base_channel, also_assignable);
        let literal = Channel::new(
            reflector.clone() as ReflectorRef,
            Box::new(RecordSite::new(reflector.clone())),
        );
        reflector.attach(&literal);

        // Fields bind against a scope whose subject is the literal, so
        // later fields resolve earlier siblings (and, at evaluation,
        // the in-flight instance).
        let scope = focus.telescope(literal.clone());
        for def in arena.fields(fields) {
            let channel = self.bind_node(arena, def.value, &scope)?;
            reflector.push_field(RecordField {
                name: arena.text(def.name).to_string(),
                channel,
                pass_through: def.pass_through,
            });
        }

        // Nominal check: every member the declared type requires must be
        // a field or resolvable through the base extent.
        if let Some(declared) = declared {
            for signature in declared.signatures() {
                let through_base = reflector.base().is_some_and(|base| {
                    base.reflector()
                        .clone()
                        .resolve(&self.registry, base, focus, &signature.name, &[])
                        .ok()
                        .flatten()
                        .is_some()
                });
                if reflector.field_index(&signature.name).is_none() && !through_base {
                    return Err(fail(
                        BindError::MalformedRecord {
                            type_name: type_name.clone().unwrap_or_default(),
                            missing: signature.name,
                        },
                        span,
                    ));
                }
            }
        }

        Ok(literal)
    }

    fn bind_meta_node(
        &self,
        arena: &NodeArena,
        id: NodeId,
        receiver: NodeId,
        name: rill_ir::NameId,
        args: rill_ir::NodeRange,
        focus: &FocusRef,
    ) -> Result<Channel, BindFailure> {
        let span = arena.get(id).span;
        let receiver = self.bind_node(arena, receiver, focus)?;
        let text = arena.text(name);

        if text == "cast" {
            let arg_ids = arena.list(args);
            let target_name = match arg_ids {
                [arg] => match &arena.get(*arg).kind {
                    NodeKind::Ident(n) | NodeKind::Str(n) => arena.text(*n),
                    _ => {
                        return Err(fail(
                            BindError::IncompatibleCast {
                                from: receiver.reflector().uri().to_string(),
                                to: "<non-type argument>".to_string(),
                            },
                            span,
                        ))
                    }
                },
                _ => {
                    return Err(fail(
                        BindError::IncompatibleCast {
                            from: receiver.reflector().uri().to_string(),
                            to: "<missing type argument>".to_string(),
                        },
                        span,
                    ))
                }
            };
            let resolver = focus.namespace_resolver();
            let target = self
                .registry
                .lookup_named(target_name, resolver.as_ref())
                .map_err(|error| fail(error, span))?
                .ok_or_else(|| {
                    fail(
                        BindError::NameNotFound {
                            name: target_name.to_string(),
                            receiver: None,
                            available: Vec::new(),
                        },
                        span,
                    )
                })?;
            return bind_cast(&self.registry, &receiver, target)
                .map_err(|error| fail(error, span));
        }

        if args.is_empty() {
            return bind_meta(&self.registry, &receiver, focus, text)
                .map_err(|error| fail(error, span));
        }

        // Meta-operations with arguments go straight to the reflector
        // extension point.
        let mut bound_args = Vec::with_capacity(args.len());
        for &arg in arena.list(args) {
            bound_args.push(self.bind_node(arena, arg, focus)?);
        }
        let reflector = receiver.reflector().clone();
        match reflector
            .resolve(&self.registry, &receiver, focus, text, &bound_args)
            .map_err(|error| fail(error, span))?
        {
            Some(found) => Ok(found),
            None => Err(fail(
                BindError::UnknownMeta {
                    name: text.to_string(),
                },
                span,
            )),
        }
    }
}

fn fail(error: BindError, span: Span) -> BindFailure {
    BindFailure { error, span }
}

fn arith_op(op: BinaryOp) -> ArithOp {
    match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Sub => ArithOp::Sub,
        BinaryOp::Mul => ArithOp::Mul,
        BinaryOp::Div => ArithOp::Div,
        _ => ArithOp::Rem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_channel::BindingsReflector;

    fn binder() -> Binder {
        Binder::new(Arc::new(TypeRegistry::new()))
    }

    /// A focus whose context cell resolves the given bindings.
    fn focus_with(vars: Vec<(&str, Channel)>) -> FocusRef {
        let mut bindings = BindingsReflector::new();
        for (name, channel) in vars {
            bindings = bindings.with(name, channel);
        }
        LinkedFocus::scope(None, None, Some(bindings.anchor()), None, None)
    }

    fn eval(source: &str) -> Option<Value> {
        let binder = binder();
        eval_in(&binder, source, &LinkedFocus::root())
    }

    fn eval_in(binder: &Binder, source: &str, focus: &FocusRef) -> Option<Value> {
        let expr = rill_parse::parse(source).expect("parse");
        let channel = match binder.bind(&expr, focus) {
            Ok(channel) => channel,
            Err(err) => panic!("bind of `{source}` failed: {err}"),
        };
        channel.get()
    }

    fn bind_err(source: &str) -> BindError {
        let binder = binder();
        bind_err_in(&binder, source, &LinkedFocus::root())
    }

    fn bind_err_in(binder: &Binder, source: &str, focus: &FocusRef) -> BindError {
        let expr = rill_parse::parse(source).expect("parse");
        match binder.bind(&expr, focus) {
            Ok(_) => panic!("bind of `{source}` unexpectedly succeeded"),
            Err(err) => err.error,
        }
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1+2*3"), Some(Value::Int(7)));
        assert_eq!(eval("(1+2)*3"), Some(Value::Int(9)));
        assert_eq!(eval("7/2"), Some(Value::Int(3)));
        assert_eq!(eval("7%4"), Some(Value::Int(3)));
    }

    #[test]
    fn promotion_decides_the_result_channel_type() {
        let binder = binder();
        let registry = binder.registry().clone();
        let focus = focus_with(
            vec![
                (
                    "i",
                    Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(2))),
                ),
                (
                    "l",
                    Channel::cell(registry.builtin(ContentKind::Long), Some(Value::Long(3))),
                ),
                (
                    "d",
                    Channel::cell(
                        registry.builtin(ContentKind::Decimal),
                        Some(Value::decimal("1.5".parse().unwrap())),
                    ),
                ),
                (
                    "s",
                    Channel::cell(registry.builtin(ContentKind::Str), Some(Value::string("x"))),
                ),
            ],
        );

        let expr = rill_parse::parse("i + l").unwrap();
        let channel = binder.bind(&expr, &focus).unwrap();
        assert_eq!(channel.content(), ContentKind::Long);
        assert_eq!(channel.get(), Some(Value::Long(5)));

        let expr = rill_parse::parse("i + d").unwrap();
        let channel = binder.bind(&expr, &focus).unwrap();
        assert_eq!(channel.content(), ContentKind::Decimal);
        assert_eq!(channel.get(), Some(Value::decimal("3.5".parse().unwrap())));

        let expr = rill_parse::parse("s + i").unwrap();
        let channel = binder.bind(&expr, &focus).unwrap();
        assert_eq!(channel.content(), ContentKind::Str);
        assert_eq!(channel.get(), Some(Value::string("x2")));
    }

    #[test]
    fn string_operators_other_than_concat_fail_to_bind() {
        let err = bind_err("\"a\" * 2");
        assert!(matches!(err, BindError::UnsupportedOperator { .. }));
    }

    #[test]
    fn comparison_equality_and_logic() {
        assert_eq!(eval("1 < 2"), Some(Value::Bool(true)));
        assert_eq!(eval("2L >= 2"), Some(Value::Bool(true)));
        assert_eq!(eval("\"a\" < \"b\""), Some(Value::Bool(true)));
        assert_eq!(eval("1 == 1L"), Some(Value::Bool(true)));
        assert_eq!(eval("1 != 2"), Some(Value::Bool(true)));
        assert_eq!(eval("true && !false"), Some(Value::Bool(true)));
        assert_eq!(eval("false || true"), Some(Value::Bool(true)));
        assert_eq!(eval("true ^ true"), Some(Value::Bool(false)));
        assert_eq!(eval("null == null"), Some(Value::Bool(true)));
        assert_eq!(eval("null == 1"), Some(Value::Bool(false)));
    }

    #[test]
    fn short_circuit_skips_the_right_side() {
        let binder = binder();
        let registry = binder.registry().clone();
        let poison = Channel::new(
            registry.builtin(ContentKind::Bool),
            Box::new(PanicSite),
        );
        let focus = focus_with(vec![("boom", poison)]);
        assert_eq!(
            eval_in(&binder, "false && boom", &focus),
            Some(Value::Bool(false))
        );
        assert_eq!(
            eval_in(&binder, "true || boom", &focus),
            Some(Value::Bool(true))
        );
    }

    struct PanicSite;

    impl rill_channel::Site for PanicSite {
        fn get(&self) -> Option<Value> {
            panic!("short-circuit failed to skip this operand");
        }
    }

    #[test]
    fn conditional_and_coalesce() {
        assert_eq!(eval("true ? 1 : 2"), Some(Value::Int(1)));
        assert_eq!(eval("false ? 1 : 2"), Some(Value::Int(2)));
        assert_eq!(eval("null ?? 5"), Some(Value::Int(5)));
        assert_eq!(eval("3 ?? 5"), Some(Value::Int(3)));
    }

    #[test]
    fn conditional_branch_typing_is_left_biased() {
        let binder = binder();
        let focus = LinkedFocus::root();
        // null is assignable to int, so the left branch type wins.
        let expr = rill_parse::parse("true ? 1 : null").unwrap();
        let channel = binder.bind(&expr, &focus).unwrap();
        assert_eq!(channel.content(), ContentKind::Int);

        let expr = rill_parse::parse("true ? null : 1").unwrap();
        let channel = binder.bind(&expr, &focus).unwrap();
        assert_eq!(channel.content(), ContentKind::Int);

        let err = bind_err("true ? 1 : \"s\"");
        assert!(matches!(err, BindError::IncompatibleBranches { .. }));
    }

    #[test]
    fn ranges_inclusive_and_exclusive() {
        assert_eq!(
            eval("1..5"),
            Some(Value::list(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4),
                Value::Int(5)
            ]))
        );
        assert_eq!(
            eval("1.!5"),
            Some(Value::list(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4)
            ]))
        );
    }

    #[test]
    fn contains_and_subscript_and_slice() {
        assert_eq!(eval("1..5 ?= 3"), Some(Value::Bool(true)));
        assert_eq!(eval("1..5 ?= 9"), Some(Value::Bool(false)));
        assert_eq!(eval("(10..13)[1]"), Some(Value::Int(11)));
        assert_eq!(
            eval("(10..15)[1..2]"),
            Some(Value::list(vec![Value::Int(11), Value::Int(12)]))
        );
        let err = bind_err("1 ?= 2");
        assert!(matches!(err, BindError::MissingCapability { .. }));
    }

    #[test]
    fn projection_maps_each_item() {
        assert_eq!(
            eval("1..3 # [item] * 10"),
            Some(Value::list(vec![
                Value::Int(10),
                Value::Int(20),
                Value::Int(30)
            ]))
        );
    }

    #[test]
    fn reduction_folds_with_plus() {
        assert_eq!(eval("1..4 $ [item]"), Some(Value::Int(10)));
        assert_eq!(eval("1..3 $ [item] * [item]"), Some(Value::Int(14)));
    }

    #[test]
    fn concatenation_of_iterations() {
        assert_eq!(
            eval("(1..2) + (8..9)"),
            Some(Value::list(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(8),
                Value::Int(9)
            ]))
        );
    }

    #[test]
    fn name_resolution_walks_scopes_and_reports_misses() {
        let binder = binder();
        let registry = binder.registry().clone();
        let outer = focus_with(
            vec![(
                "rate",
                Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(3))),
            )],
        );
        let inner = outer.telescope(Channel::cell(registry.builtin(ContentKind::Str), None));
        assert_eq!(eval_in(&binder, "rate + 1", &inner), Some(Value::Int(4)));

        let err = bind_err_in(&binder, "missing + 1", &inner);
        match err {
            BindError::NameNotFound {
                name, available, ..
            } => {
                assert_eq!(name, "missing");
                assert!(available.iter().any(|sig| sig.name == "rate"));
            }
            other => panic!("expected NameNotFound, got {other}"),
        }
    }

    #[test]
    fn assignment_stores_through_and_alias_is_live() {
        let binder = binder();
        let registry = binder.registry().clone();
        let cell = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(0)));
        let focus = focus_with(vec![("x", cell.clone())]);

        assert_eq!(eval_in(&binder, "x = 41 + 1", &focus), Some(Value::Int(42)));
        assert_eq!(cell.get(), Some(Value::Int(42)));

        let expr = rill_parse::parse("y := x").unwrap();
        let alias = binder.bind(&expr, &focus).unwrap();
        assert!(alias.store(Some(Value::Int(7))));
        assert_eq!(cell.get(), Some(Value::Int(7)));
        assert_eq!(alias.get(), Some(Value::Int(7)));
    }

    #[test]
    fn records_bind_fields_and_members() {
        let binder = binder();
        let registry = binder.registry().clone();
        let delegate = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(10)));
        let focus = focus_with(vec![("source", delegate.clone())]);

        // Computed fields snapshot at instantiation; sibling references
        // read the in-flight instance.
        let value = eval_in(&binder, "{a = 2, b = a * 3}.b", &focus);
        assert_eq!(value, Some(Value::Int(6)));

        // Pass-through member writes reach the delegate.
        let expr = rill_parse::parse("{live := source}.live").unwrap();
        let live = binder.bind(&expr, &focus).unwrap();
        assert!(live.store(Some(Value::Int(5))));
        assert_eq!(delegate.get(), Some(Value::Int(5)));

        // Base extent members resolve through the base channel.
        let value = eval_in(&binder, "{..source}@type", &focus);
        assert!(value.is_some());
    }

    #[test]
    fn functor_calls_reinstantiate_with_overrides() {
        assert_eq!(
            eval("{n = 1, m = n + 1}(5).m"),
            Some(Value::Int(6))
        );
    }

    #[test]
    fn nominal_record_checks_required_members() {
        let binder = binder();
        let registry = binder.registry().clone();
        // Declare a nominal type with required members x and y.
        let shape = RecordReflector::new(Some("Point".to_string()), None, Vec::new());
        shape.push_field(RecordField {
            name: "x".to_string(),
            channel: Channel::cell(registry.builtin(ContentKind::Int), None),
            pass_through: false,
        });
        shape.push_field(RecordField {
            name: "y".to_string(),
            channel: Channel::cell(registry.builtin(ContentKind::Int), None),
            pass_through: false,
        });
        registry.register_named("Point", shape as ReflectorRef);

        let focus = LinkedFocus::root();
        let expr = rill_parse::parse("Point{x = 1, y = 2}").unwrap();
        assert!(binder.bind(&expr, &focus).is_ok());

        let err = bind_err_in(&binder, "Point{x = 1}", &focus);
        match err {
            BindError::MalformedRecord { missing, .. } => assert_eq!(missing, "y"),
            other => panic!("expected MalformedRecord, got {other}"),
        }
    }

    #[test]
    fn meta_operations_through_expressions() {
        assert_eq!(eval("(1..4)@size"), Some(Value::Int(4)));
        assert_eq!(eval("(1..4)@empty"), Some(Value::Bool(false)));
        assert_eq!(eval("(1..4)@last"), Some(Value::Int(4)));
        assert_eq!(eval("(1..4)@top"), Some(Value::Int(1)));
        assert_eq!(eval("3@cast(long)"), Some(Value::Long(3)));

        let err = bind_err("1@size");
        assert!(matches!(err, BindError::MissingCapability { .. }));
        let err = bind_err("1@bogus");
        assert!(matches!(err, BindError::UnknownMeta { .. }));
    }

    #[test]
    fn size_of_absent_collection_evaluates_absent() {
        let binder = binder();
        let registry = binder.registry().clone();
        let focus = focus_with(
            vec![(
                "items",
                Channel::cell(registry.builtin(ContentKind::List), None),
            )],
        );
        assert_eq!(eval_in(&binder, "items@size", &focus), None);
    }

    #[test]
    fn focus_qualifier_reaches_named_scopes() {
        let binder = binder();
        let registry = binder.registry().clone();
        let order = Channel::cell(registry.builtin(ContentKind::Int), Some(Value::Int(9)));
        let root = LinkedFocus::root();
        let named = LinkedFocus::named("order", order, &root);
        assert_eq!(eval_in(&binder, "[order] + 1", &named), Some(Value::Int(10)));

        let err = bind_err_in(&binder, "[basket]", &named);
        assert!(matches!(err, BindError::ScopeNotFound { .. }));
    }
}
