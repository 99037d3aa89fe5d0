//! rill - an embeddable textual expression language.
//!
//! A small DSL that navigates, transforms, and constructs values over a
//! live host object model. Two phases: a recursive-descent parser turns
//! source text into an immutable expression tree, and a binder walks
//! that tree against a pluggable reflective type system to produce a
//! lazily-evaluated, bidirectional channel graph. Bind once, evaluate
//! from as many threads as you like.
//!
//! ```
//! use rill::{Engine, EngineOptions, LinkedFocus};
//!
//! let engine = Engine::new(EngineOptions::default(), |_registry| {});
//! let expr = engine.parse("1 + 2 * 3").unwrap();
//! let channel = engine.bind(&expr, &LinkedFocus::root()).unwrap();
//! assert_eq!(channel.get(), Some(rill::Value::Int(7)));
//! ```

mod engine;

pub use engine::{Engine, EngineError, EngineOptions};

// The full embedding surface, re-exported from the pipeline crates.
pub use rill_bind::{BindFailure, Binder};
pub use rill_channel::{
    bind_cast, bind_meta, decorator_for, ArithOp, BindError, BindingsReflector, BuiltinReflector,
    Capability, Channel, ChannelHandle, Combiner, Decorator, Focus, FocusExt, FocusHandle,
    FocusRef, LinkedFocus, ListDecorator, ListReflector, MemoKey, NamespaceResolver,
    RecordField, RecordReflector, Reflector, ReflectorHandle, ReflectorRef, ScopedSlot, Signature,
    Site, SlotGuard, Translator, TypeRegistry, WeakChannel,
};
pub use rill_diagnostic::{Diagnostic, ErrorCode, Severity};
pub use rill_ir::{Expression, NodeArena, NodeId, NodeKind, Span};
pub use rill_lexer::LexError;
pub use rill_parse::{ParseError, ParseErrorKind};
pub use rill_value::{AnyValue, ContentKind, Heap, NumericKind, RecordValue, Value};
