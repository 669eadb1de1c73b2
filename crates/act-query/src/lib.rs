//! SMT-LIB2 query synthesis (C7): turns a typechecked program's split
//! claims into the flat list of proof obligations the solver driver (C8)
//! will each discharge independently.
//!
//! The pipeline here is `Act` + `Vec<Claim>` → `Vec<Query>`: [`synth`]
//! walks every `Pass` claim's postconditions and every contract's
//! invariants, rendering each into an SMT-LIB2 term via [`term::render`]
//! with naming conventions from [`naming`].

pub mod naming;
pub mod query;
pub mod synth;
pub mod term;

pub use query::{Query, QueryKind};
pub use synth::{invariant_queries, postcondition_queries, synthesize};
