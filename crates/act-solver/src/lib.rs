//! Persistent SMT solver subprocess driver (spec C8): spawns `z3` or
//! `cvc4` once per `prove` invocation, replays the `(reset)` /
//! declarations+assertions / `(check-sat)` protocol for every synthesized
//! [`act_query::Query`], and reinterprets a `sat` counter-model back into
//! act-typed values.

pub mod driver;
pub mod error;
pub mod model;

pub use driver::{Driver, SolverConfig, SolverKind, Verdict};
pub use error::SolverError;
pub use model::{Model, ModelValue};
