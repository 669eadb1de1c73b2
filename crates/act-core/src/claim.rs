//! Claim splitting (spec §4.4 "Claim splitting"): turns each typed
//! transition and each contract invariant into the flat list of proof
//! obligations the query synthesizer (C7) will each turn into one SMT-LIB2
//! query.

use act_base::Span;

use crate::act::{Act, Invariant, TypedArg, TypedInterface};
use crate::expr::TExpr;
use crate::storage::{Rewrite, StorageLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    Pass,
    Fail,
}

/// A claim produced from one normalized case of one behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourClaim {
    pub kind: ClaimKind,
    pub name: String,
    pub contract: String,
    pub interface: TypedInterface,
    /// Untimed: the case guard, conjoined with the `iff` list (and negated
    /// for `Fail`).
    pub precondition: TExpr,
    /// Timed; always empty for `Fail`.
    pub postconditions: Vec<TExpr>,
    /// `Update` rewrites for `Pass`; every referenced location downgraded
    /// to `Constant` for `Fail` (spec: "empty updates, only locations from
    /// S as Constant").
    pub updates: Vec<Rewrite>,
    /// `None` for `Fail`.
    pub returns: Option<TExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorClaim {
    pub kind: ClaimKind,
    pub contract: String,
    pub interface: TypedInterface,
    pub precondition: TExpr,
    pub postconditions: Vec<TExpr>,
    pub updates: Vec<Rewrite>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvariantClaim {
    pub contract: String,
    pub invariant: Invariant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Behaviour(BehaviourClaim),
    Constructor(ConstructorClaim),
    Invariant(InvariantClaim),
}

/// Conjoins a (possibly empty) list of boolean expressions; an empty list
/// is vacuously `true`.
fn conjoin(exprs: &[TExpr]) -> TExpr {
    exprs
        .iter()
        .cloned()
        .reduce(|acc, e| TExpr::And(Box::new(acc), Box::new(e)))
        .unwrap_or(TExpr::BoolLit(true))
}

/// Downgrades every update in `updates` to a `Constant` rewrite of its
/// location, discarding the rhs — used for the `Fail` half of a split
/// (spec: "empty updates, only locations from S as Constant").
fn as_constants(updates: &[Rewrite]) -> Vec<Rewrite> {
    updates
        .iter()
        .map(|rw| Rewrite::Constant(constant_location(rw)))
        .collect()
}

fn constant_location(rw: &Rewrite) -> StorageLocation {
    rw.item().clone()
}

fn interface_with_args(name: &str, args: &[TypedArg]) -> TypedInterface {
    TypedInterface {
        name: name.to_string(),
        args: args.to_vec(),
    }
}

/// Splits every transition and every contract invariant in `act` into its
/// flat list of proof obligations.
pub fn split_claims(act: &Act) -> Vec<Claim> {
    let mut claims = Vec::new();

    for contract in &act.contracts {
        let ctor = &contract.constructor;
        let iff = conjoin(&ctor.preconditions);
        if ctor.preconditions.is_empty() {
            claims.push(Claim::Constructor(ConstructorClaim {
                kind: ClaimKind::Pass,
                contract: ctor.contract.clone(),
                interface: interface_with_args(&ctor.interface.name, &ctor.interface.args),
                precondition: TExpr::BoolLit(true),
                postconditions: ctor.postconditions.clone(),
                updates: ctor
                    .initial_updates
                    .iter()
                    .cloned()
                    .map(Rewrite::Update)
                    .collect(),
                span: ctor.span,
            }));
        } else {
            claims.push(Claim::Constructor(ConstructorClaim {
                kind: ClaimKind::Pass,
                contract: ctor.contract.clone(),
                interface: interface_with_args(&ctor.interface.name, &ctor.interface.args),
                precondition: iff.clone(),
                postconditions: ctor.postconditions.clone(),
                updates: ctor
                    .initial_updates
                    .iter()
                    .cloned()
                    .map(Rewrite::Update)
                    .collect(),
                span: ctor.span,
            }));
            let init_as_rewrites: Vec<Rewrite> = ctor.initial_updates.iter().cloned().map(Rewrite::Update).collect();
            claims.push(Claim::Constructor(ConstructorClaim {
                kind: ClaimKind::Fail,
                contract: ctor.contract.clone(),
                interface: interface_with_args(&ctor.interface.name, &ctor.interface.args),
                precondition: TExpr::Not(Box::new(iff)),
                postconditions: Vec::new(),
                updates: as_constants(&init_as_rewrites),
                span: ctor.span,
            }));
        }

        for inv in &ctor.invariants {
            claims.push(Claim::Invariant(InvariantClaim {
                contract: ctor.contract.clone(),
                invariant: inv.clone(),
            }));
        }

        for behaviour in &contract.behaviours {
            let iff = conjoin(&behaviour.preconditions);
            for case in &behaviour.cases {
                let base_interface = interface_with_args(&behaviour.interface.name, &behaviour.interface.args);
                if behaviour.preconditions.is_empty() {
                    claims.push(Claim::Behaviour(BehaviourClaim {
                        kind: ClaimKind::Pass,
                        name: behaviour.name.clone(),
                        contract: behaviour.contract.clone(),
                        interface: base_interface,
                        precondition: case.guard.clone(),
                        postconditions: behaviour.postconditions.clone(),
                        updates: case.updates.clone(),
                        returns: case.returns.clone(),
                        span: case.span,
                    }));
                } else {
                    let pass_pre = TExpr::And(Box::new(case.guard.clone()), Box::new(iff.clone()));
                    claims.push(Claim::Behaviour(BehaviourClaim {
                        kind: ClaimKind::Pass,
                        name: behaviour.name.clone(),
                        contract: behaviour.contract.clone(),
                        interface: base_interface.clone(),
                        precondition: pass_pre,
                        postconditions: behaviour.postconditions.clone(),
                        updates: case.updates.clone(),
                        returns: case.returns.clone(),
                        span: case.span,
                    }));
                    let fail_pre =
                        TExpr::And(Box::new(case.guard.clone()), Box::new(TExpr::Not(Box::new(iff.clone()))));
                    claims.push(Claim::Behaviour(BehaviourClaim {
                        kind: ClaimKind::Fail,
                        name: behaviour.name.clone(),
                        contract: behaviour.contract.clone(),
                        interface: base_interface,
                        precondition: fail_pre,
                        postconditions: Vec::new(),
                        updates: as_constants(&case.updates),
                        returns: None,
                        span: case.span,
                    }));
                }
            }
        }
    }

    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::act::{ContractDef, TypedCase, TypedConstructor};
    use crate::types::Store;

    fn empty_interface(name: &str) -> TypedInterface {
        TypedInterface {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    fn dummy_span() -> Span {
        Span::default()
    }

    fn simple_act(iff: Vec<TExpr>) -> Act {
        let ctor = TypedConstructor {
            contract: "Token".into(),
            interface: empty_interface("constructor"),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            invariants: Vec::new(),
            initial_updates: Vec::new(),
            external_rewrites: Vec::new(),
            span: dummy_span(),
        };
        let behaviour = crate::act::TypedBehaviour {
            name: "transfer".into(),
            contract: "Token".into(),
            interface: empty_interface("transfer"),
            preconditions: iff,
            cases: vec![TypedCase {
                guard: TExpr::BoolLit(true),
                updates: Vec::new(),
                returns: None,
                span: dummy_span(),
            }],
            postconditions: Vec::new(),
            span: dummy_span(),
        };
        Act {
            store: Store::new(),
            contracts: vec![ContractDef {
                name: "Token".into(),
                constructor: ctor,
                behaviours: vec![behaviour],
            }],
        }
    }

    #[test]
    fn empty_iff_yields_a_single_pass_claim_per_case() {
        let act = simple_act(Vec::new());
        let claims = split_claims(&act);
        let behaviour_claims: Vec<_> = claims
            .iter()
            .filter_map(|c| match c {
                Claim::Behaviour(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(behaviour_claims.len(), 1);
        assert_eq!(behaviour_claims[0].kind, ClaimKind::Pass);
    }

    #[test]
    fn nonempty_iff_yields_pass_and_fail_claims() {
        let act = simple_act(vec![TExpr::BoolLit(true)]);
        let claims = split_claims(&act);
        let behaviour_claims: Vec<_> = claims
            .iter()
            .filter_map(|c| match c {
                Claim::Behaviour(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(behaviour_claims.len(), 2);
        assert_eq!(behaviour_claims[0].kind, ClaimKind::Pass);
        assert_eq!(behaviour_claims[1].kind, ClaimKind::Fail);
        assert!(behaviour_claims[1].postconditions.is_empty());
        assert!(behaviour_claims[1].returns.is_none());
    }
}
