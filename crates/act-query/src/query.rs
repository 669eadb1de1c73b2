//! The structured SMT-LIB2 query: declaration sections (storage, calldata,
//! environment) plus an assertion section (spec §4.6).

use std::fmt;

use act_core::types::ActType;

/// Which proof obligation a [`Query`] discharges (spec §1 item 3: "for
/// each postcondition and each invariant").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// One individual `ensures` clause of a behaviour's case.
    BehaviourPostcondition {
        contract: String,
        behaviour: String,
        case: usize,
        index: usize,
    },
    /// One individual `ensures` clause of a constructor.
    ConstructorPostcondition { contract: String, index: usize },
    /// The constructor half of one contract invariant's inductive proof.
    ConstructorInvariant { contract: String, invariant_index: usize },
    /// One behaviour-case half of one contract invariant's inductive
    /// proof.
    BehaviourInvariant {
        contract: String,
        behaviour: String,
        case: usize,
        invariant_index: usize,
    },
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::BehaviourPostcondition {
                contract,
                behaviour,
                case,
                index,
            } => write!(f, "{contract}.{behaviour}[case {case}] ensures #{index}"),
            QueryKind::ConstructorPostcondition { contract, index } => {
                write!(f, "{contract} constructor ensures #{index}")
            }
            QueryKind::ConstructorInvariant {
                contract,
                invariant_index,
            } => write!(f, "{contract} invariant #{invariant_index} (constructor)"),
            QueryKind::BehaviourInvariant {
                contract,
                behaviour,
                case,
                invariant_index,
            } => write!(f, "{contract} invariant #{invariant_index} ({behaviour}[case {case}])"),
        }
    }
}

/// One name the driver should `(get-value (...))` on a `sat` verdict, to
/// build the human-readable counter-model (spec §4.7 "model extraction").
/// `term` is the exact SMT-LIB2 term to query — a bare constant name for a
/// scalar, or a `(select ...)` chain for one indexed mapping entry; the
/// solver evaluates either form against its current model once
/// `check-sat` has returned `sat`, so no literal substitution is needed
/// even when `term` mentions another symbolic constant (spec §4.7: "for
/// mappings, `(select ...)` over the supplied index literals").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTarget {
    pub label: String,
    pub term: String,
    pub act_type: ActType,
}

/// One fully synthesized proof obligation, ready to hand to the solver
/// driver. `declarations` and `assertions` are kept separate (rather than
/// pre-joined into one text blob) so a caller inspecting `--debug` output
/// can tell the two sections apart, matching spec §4.6's "structured
/// variable declaration sections ... and assertion section".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: QueryKind,
    pub declarations: Vec<String>,
    pub assertions: Vec<String>,
    /// Every name/term the driver should extract a value for on `sat`, in
    /// the order model fields were enumerated during synthesis (spec
    /// §5's "model extraction lines are issued and read in the order the
    /// model fields are enumerated").
    pub model_targets: Vec<ModelTarget>,
}

impl Query {
    pub fn new(kind: QueryKind) -> Self {
        Query {
            kind,
            declarations: Vec::new(),
            assertions: Vec::new(),
            model_targets: Vec::new(),
        }
    }

    fn push_decl(&mut self, form: String) {
        if !self.declarations.contains(&form) {
            self.declarations.push(form);
        }
    }

    pub fn declare_const(&mut self, name: &str, sort: &str) {
        self.push_decl(format!("(declare-const {name} {sort})"));
    }

    /// Records one counter-model field, skipping a `term` already present
    /// so repeated references to the same storage entry or calldata
    /// argument don't issue duplicate `get-value` calls.
    pub fn push_model_target(&mut self, target: ModelTarget) {
        if !self.model_targets.iter().any(|t| t.term == target.term) {
            self.model_targets.push(target);
        }
    }

    pub fn assert(&mut self, term: String) {
        self.assertions.push(format!("(assert {term})"));
    }

    /// Every top-level SMT-LIB2 form this query needs sent, in order:
    /// declarations first, then assertions. The driver (C8) appends
    /// `(check-sat)` itself after sending these.
    pub fn lines(&self) -> Vec<String> {
        self.declarations.iter().chain(&self.assertions).cloned().collect()
    }

    /// The full query body as one newline-joined string, for `--debug`
    /// output (spec SPEC_FULL §4.6 "debug dump").
    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_const_deduplicates_identical_declarations() {
        let mut q = Query::new(QueryKind::ConstructorPostcondition {
            contract: "Token".into(),
            index: 0,
        });
        q.declare_const("Token_totalSupply_Post", "Int");
        q.declare_const("Token_totalSupply_Post", "Int");
        assert_eq!(q.declarations.len(), 1);
    }

    #[test]
    fn lines_orders_declarations_before_assertions() {
        let mut q = Query::new(QueryKind::ConstructorPostcondition {
            contract: "Token".into(),
            index: 0,
        });
        q.declare_const("x", "Int");
        q.assert("(> x 0)".to_string());
        assert_eq!(q.lines(), vec!["(declare-const x Int)", "(assert (> x 0))"]);
    }
}
