//! Bind-time errors.
//!
//! These are the fatal family: any of them aborts the whole bind and no
//! partial channel graph is ever returned. Runtime data absence is *not*
//! an error — it travels as `None` through channel reads.

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_value::ContentKind;

use crate::{Capability, Signature};

/// A failure while binding an expression tree to a channel graph.
#[derive(Clone, Debug, thiserror::Error)]
pub enum BindError {
    #[error("name `{name}` not found{}", receiver_suffix(.receiver))]
    NameNotFound {
        name: String,
        /// URI of the receiver type the name was resolved against, when
        /// the lookup had one.
        receiver: Option<String>,
        /// Members that *are* available, for "did you mean" output.
        available: Vec<Signature>,
    },

    #[error("operator `{op}` is not supported for {content} operands")]
    UnsupportedOperator { op: String, content: ContentKind },

    #[error("type `{uri}` has no {capability} capability")]
    MissingCapability { capability: Capability, uri: String },

    #[error("cannot cast `{from}` to `{to}`")]
    IncompatibleCast { from: String, to: String },

    #[error("record `{type_name}` is missing required member `{missing}`")]
    MalformedRecord { type_name: String, missing: String },

    #[error("namespace prefix `{prefix}` cannot be resolved")]
    UnresolvedNamespace { prefix: String },

    #[error("branch types `{left}` and `{right}` are incompatible")]
    IncompatibleBranches { left: String, right: String },

    #[error("no scope named `{name}` in the focus chain")]
    ScopeNotFound { name: String },

    #[error("unknown meta-operation `@{name}`")]
    UnknownMeta { name: String },
}

fn receiver_suffix(receiver: &Option<String>) -> String {
    match receiver {
        Some(uri) => format!(" on `{uri}`"),
        None => String::new(),
    }
}

impl BindError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BindError::NameNotFound { .. } => ErrorCode::B001,
            BindError::UnsupportedOperator { .. } => ErrorCode::B002,
            BindError::MissingCapability { .. } => ErrorCode::B003,
            BindError::IncompatibleCast { .. } => ErrorCode::B004,
            BindError::MalformedRecord { .. } => ErrorCode::B005,
            BindError::UnresolvedNamespace { .. } => ErrorCode::B006,
            BindError::IncompatibleBranches { .. } => ErrorCode::B007,
            BindError::ScopeNotFound { .. } => ErrorCode::B008,
            BindError::UnknownMeta { .. } => ErrorCode::B009,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code()).with_message(self.to_string());
        if let BindError::NameNotFound { available, .. } = self {
            if !available.is_empty() {
                let names: Vec<String> =
                    available.iter().map(|sig| sig.to_string()).collect();
                diag = diag.with_help(format!("available members: {}", names.join(", ")));
            }
        }
        diag
    }
}
