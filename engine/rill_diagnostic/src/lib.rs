//! Diagnostics for the rill expression engine.
//!
//! Lex, parse, and bind errors all lower into the same structured
//! [`Diagnostic`] shape so embedding hosts get one rendering surface.
//! Presentation stays with the host; this crate only renders a plain
//! single-expression form suitable for logs.

mod code;
mod diagnostic;

pub use code::ErrorCode;
pub use diagnostic::{Diagnostic, Label, Severity};
