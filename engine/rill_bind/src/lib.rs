//! The binder: walks a parsed expression tree against a focus chain and
//! produces a channel graph.
//!
//! Binding is where every static decision is made exactly once: name
//! resolution, operator strategy selection off the left operand's
//! content kind, capability checks, cast validation, record type
//! construction. The first failure aborts the bind — no partial graph
//! ever escapes.

mod binder;
mod sites;

pub use binder::Binder;

use rill_channel::BindError;
use rill_diagnostic::Diagnostic;
use rill_ir::Span;

/// A bind failure located in the source expression.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct BindFailure {
    #[source]
    pub error: BindError,
    pub span: Span,
}

impl BindFailure {
    pub fn to_diagnostic(&self) -> Diagnostic {
        self.error.to_diagnostic().with_label(self.span, "here")
    }
}
