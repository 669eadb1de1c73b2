//! The typed, per-transition data model (spec §3 "Invariant", "Constructor",
//! "Behaviour", "Act (top-level)") — the typechecker's output, before claim
//! splitting turns it into the flat list of proof obligations in
//! [`crate::claim`].

use act_base::Span;
use serde::Serialize;

use crate::expr::{ExprNode, TExpr};
use crate::storage::{Rewrite, RewriteNode, StorageUpdate};
use crate::types::{AbiType, Store, Timing};

/// One calldata argument's resolved name and type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedArg {
    pub name: String,
    pub ty: AbiType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedInterface {
    pub name: String,
    pub args: Vec<TypedArg>,
}

/// A contract-level invariant (spec §3 "Invariant"). `predicate` is always
/// stored untimed; [`Invariant::pre`]/[`Invariant::post`] apply `setTime`
/// on demand since most consumers need both forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Invariant {
    pub contract: String,
    pub extra_preconditions: Vec<TExpr>,
    pub storage_bound_predicates: Vec<TExpr>,
    pub predicate: TExpr,
    pub span: Span,
}

impl Invariant {
    pub fn pre(&self) -> TExpr {
        self.predicate.clone().set_time(Timing::Pre)
    }

    pub fn post(&self) -> TExpr {
        self.predicate.clone().set_time(Timing::Post)
    }

    pub fn to_node(&self) -> InvariantNode {
        InvariantNode {
            contract: self.contract.clone(),
            extra_preconditions: self.extra_preconditions.iter().map(TExpr::to_node).collect(),
            storage_bound_predicates: self.storage_bound_predicates.iter().map(TExpr::to_node).collect(),
            predicate: self.predicate.to_node(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvariantNode {
    pub contract: String,
    pub extra_preconditions: Vec<ExprNode>,
    pub storage_bound_predicates: Vec<ExprNode>,
    pub predicate: ExprNode,
}

/// One normalized case of a behaviour: a boolean guard plus the updates
/// and optional return value that apply when it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedCase {
    pub guard: TExpr,
    pub updates: Vec<Rewrite>,
    pub returns: Option<TExpr>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct TypedCaseNode {
    pub guard: ExprNode,
    pub updates: Vec<RewriteNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<ExprNode>,
}

impl TypedCase {
    pub fn to_node(&self) -> TypedCaseNode {
        TypedCaseNode {
            guard: self.guard.to_node(),
            updates: self.updates.iter().map(Rewrite::to_node).collect(),
            returns: self.returns.as_ref().map(TExpr::to_node),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedConstructor {
    pub contract: String,
    pub interface: TypedInterface,
    pub preconditions: Vec<TExpr>,
    pub postconditions: Vec<TExpr>,
    pub invariants: Vec<Invariant>,
    pub initial_updates: Vec<StorageUpdate>,
    /// Rewrites to storage outside this constructor's own `creates` block.
    /// The grammar has no construct that produces these (the
    /// `ExtCreates`-style extension spec §9 calls half-implemented is
    /// stubbed as an internal error before it ever reaches here), so this
    /// is always empty; kept to mirror spec §3's constructor shape.
    pub external_rewrites: Vec<Rewrite>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct TypedConstructorNode {
    pub interface: TypedInterface,
    pub preconditions: Vec<ExprNode>,
    pub postconditions: Vec<ExprNode>,
    pub invariants: Vec<InvariantNode>,
    pub creates: Vec<RewriteNode>,
}

impl TypedConstructor {
    pub fn to_node(&self) -> TypedConstructorNode {
        TypedConstructorNode {
            interface: self.interface.clone(),
            preconditions: self.preconditions.iter().map(TExpr::to_node).collect(),
            postconditions: self.postconditions.iter().map(TExpr::to_node).collect(),
            invariants: self.invariants.iter().map(Invariant::to_node).collect(),
            creates: self
                .initial_updates
                .iter()
                .map(|u| Rewrite::Update(u.clone()).to_node())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedBehaviour {
    pub name: String,
    pub contract: String,
    pub interface: TypedInterface,
    pub preconditions: Vec<TExpr>,
    pub cases: Vec<TypedCase>,
    pub postconditions: Vec<TExpr>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct TypedBehaviourNode {
    pub name: String,
    pub interface: TypedInterface,
    pub preconditions: Vec<ExprNode>,
    pub cases: Vec<TypedCaseNode>,
    pub postconditions: Vec<ExprNode>,
}

impl TypedBehaviour {
    pub fn to_node(&self) -> TypedBehaviourNode {
        TypedBehaviourNode {
            name: self.name.clone(),
            interface: self.interface.clone(),
            preconditions: self.preconditions.iter().map(TExpr::to_node).collect(),
            cases: self.cases.iter().map(TypedCase::to_node).collect(),
            postconditions: self.postconditions.iter().map(TExpr::to_node).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDef {
    pub name: String,
    pub constructor: TypedConstructor,
    pub behaviours: Vec<TypedBehaviour>,
}

#[derive(Debug, Serialize)]
pub struct ContractDefNode {
    pub name: String,
    pub constructor: TypedConstructorNode,
    pub behaviors: Vec<TypedBehaviourNode>,
}

impl ContractDef {
    pub fn to_node(&self) -> ContractDefNode {
        ContractDefNode {
            name: self.name.clone(),
            constructor: self.constructor.to_node(),
            behaviors: self.behaviours.iter().map(TypedBehaviour::to_node).collect(),
        }
    }
}

/// The fully typed program (spec §3 "Act (top-level)").
#[derive(Debug, Clone, PartialEq)]
pub struct Act {
    pub store: Store,
    pub contracts: Vec<ContractDef>,
}

impl Act {
    pub fn contract(&self, name: &str) -> Option<&ContractDef> {
        self.contracts.iter().find(|c| c.name == name)
    }

    /// The JSON tree `act type` prints (spec.md §6: top object has
    /// `kind: "Program"`, `store`, `contracts`).
    pub fn to_node(&self) -> ProgramNode {
        ProgramNode {
            kind: "Program",
            store: self.store.clone(),
            contracts: self.contracts.iter().map(ContractDef::to_node).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgramNode {
    pub kind: &'static str,
    pub store: Store,
    pub contracts: Vec<ContractDefNode>,
}
