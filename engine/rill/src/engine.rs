//! The engine facade.

use std::sync::Arc;

use rill_bind::{BindFailure, Binder};
use rill_channel::{Channel, FocusRef, TypeRegistry};
use rill_diagnostic::Diagnostic;
use rill_ir::Expression;
use rill_parse::ParseError;
use rill_value::Value;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Parser nesting guard.
    pub max_parse_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_parse_depth: rill_parse::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Either phase failing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Bind(#[from] BindFailure),
}

impl EngineError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EngineError::Parse(err) => err.to_diagnostic(),
            EngineError::Bind(err) => err.to_diagnostic(),
        }
    }
}

/// The embeddable engine: a caller-owned type registry plus the parse
/// and bind entry points. Engines are independent of each other — there
/// is no process-wide state — and everything an engine produces is safe
/// to share across threads.
pub struct Engine {
    registry: Arc<TypeRegistry>,
    binder: Binder,
    options: EngineOptions,
}

impl Engine {
    /// Create an engine. The setup closure registers host adapters and
    /// nominal types before the first expression binds.
    pub fn new(options: EngineOptions, setup: impl FnOnce(&TypeRegistry)) -> Engine {
        let registry = Arc::new(TypeRegistry::new());
        setup(&registry);
        Engine {
            binder: Binder::new(Arc::clone(&registry)),
            registry,
            options,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse source text into a shareable expression.
    pub fn parse(&self, source: &str) -> Result<Expression, ParseError> {
        rill_parse::parse_with_max_depth(source, self.options.max_parse_depth)
    }

    /// Bind a parsed expression against a focus chain.
    pub fn bind(&self, expr: &Expression, focus: &FocusRef) -> Result<Channel, BindFailure> {
        self.binder.bind(expr, focus)
    }

    /// Parse, bind, and read in one step — the convenience path for
    /// one-shot evaluation.
    pub fn evaluate(&self, source: &str, focus: &FocusRef) -> Result<Option<Value>, EngineError> {
        let expr = self.parse(source)?;
        let channel = self.bind(&expr, focus)?;
        let value = channel.get();
        tracing::trace!(source, ?value, "evaluated");
        Ok(value)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineOptions::default(), |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_channel::LinkedFocus;

    #[test]
    fn one_shot_evaluation() {
        let engine = Engine::default();
        let focus = LinkedFocus::root();
        assert_eq!(
            engine.evaluate("2 * 21", &focus).unwrap(),
            Some(Value::Int(42))
        );
    }

    #[test]
    fn engines_are_independent() {
        let a = Engine::default();
        let b = Engine::default();
        assert!(!Arc::ptr_eq(a.registry(), b.registry()));
    }

    #[test]
    fn errors_lower_to_diagnostics() {
        let engine = Engine::default();
        let focus = LinkedFocus::root();
        let err = engine.evaluate("1 +", &focus).unwrap_err();
        assert_eq!(err.to_diagnostic().code.to_string(), "P001");
        let err = engine.evaluate("nope", &focus).unwrap_err();
        assert_eq!(err.to_diagnostic().code.to_string(), "B001");
    }
}
