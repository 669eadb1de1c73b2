//! Pure structural atoms shared by every stage of the Act pipeline:
//! source positions, spans, and diagnostic accumulation.
//!
//! This crate has no dependencies and no knowledge of Act syntax or
//! semantics — it exists so that `act-syntax`, `act-core`, `act-query`, and
//! `act-solver` can all report errors the same way.

mod diagnostic;
mod pos;

pub use diagnostic::{Diagnostic, Diagnostics};
pub use pos::{Pos, Span};
