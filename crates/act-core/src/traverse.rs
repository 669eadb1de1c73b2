//! AST traversal utilities (C6): pure folds over the typed AST collecting
//! referenced storage locations, environment constants, identifiers with
//! positions, and contract names mentioned via `at Contract`.
//!
//! Every collector here is idempotent and order-preserving with
//! de-duplication (spec §4.5), so calling it twice over the same tree, or
//! over trees that were independently typechecked from the same source,
//! yields the same result both times.

use act_base::Span;
use act_syntax::token::EnvVar;

use crate::act::{Act, Invariant, TypedBehaviour, TypedConstructor};
use crate::expr::TExpr;
use crate::storage::{Rewrite, StorageItem, StorageRef};

/// One identifier occurrence collected from an expression tree: either a
/// calldata variable or a storage slot's base name, paired with the span
/// it was referenced at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentRef {
    pub name: String,
    pub span: Span,
}

/// Appends `item` to `out` unless an equal entry is already present. Used
/// throughout this module in place of a `HashSet` so traversal order is
/// preserved (callers that want set semantics get de-duplication for
/// free; callers that care about first-occurrence order keep it).
fn dedup_push<T: PartialEq>(out: &mut Vec<T>, item: T) {
    if !out.contains(&item) {
        out.push(item);
    }
}

/// Collects every storage location (`StorageItem`) read or written by
/// `expr`, in traversal order, de-duplicated.
pub fn storage_locations(expr: &TExpr) -> Vec<StorageItem> {
    let mut out = Vec::new();
    expr.for_each_entry(&mut |_timing, item| dedup_push(&mut out, item.clone()));
    out
}

/// Collects every environment constant (`CALLER`, `TIMESTAMP`, ...)
/// referenced anywhere in `expr`.
pub fn env_vars(expr: &TExpr) -> Vec<EnvVar> {
    let mut out = Vec::new();
    walk_env_vars(expr, &mut out);
    out
}

fn walk_env_vars(e: &TExpr, out: &mut Vec<EnvVar>) {
    match e {
        TExpr::EnvVar(ev) => dedup_push(out, *ev),
        TExpr::IntLit(_) | TExpr::BoolLit(_) | TExpr::ByteStrLit(_) | TExpr::Var { .. } | TExpr::TEntry { .. } => {}
        TExpr::Not(a) | TExpr::Neg(a) => walk_env_vars(a, out),
        TExpr::Add(a, b)
        | TExpr::Sub(a, b)
        | TExpr::Mul(a, b)
        | TExpr::Div(a, b)
        | TExpr::Mod(a, b)
        | TExpr::Exp(a, b)
        | TExpr::Concat(a, b)
        | TExpr::Lt(a, b)
        | TExpr::Le(a, b)
        | TExpr::Gt(a, b)
        | TExpr::Ge(a, b)
        | TExpr::And(a, b)
        | TExpr::Or(a, b) => {
            walk_env_vars(a, out);
            walk_env_vars(b, out);
        }
        TExpr::Eq { lhs, rhs, .. } | TExpr::NEq { lhs, rhs, .. } => {
            walk_env_vars(lhs, out);
            walk_env_vars(rhs, out);
        }
        TExpr::Ite {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            walk_env_vars(cond, out);
            walk_env_vars(then_branch, out);
            walk_env_vars(else_branch, out);
        }
        TExpr::InRange { expr, .. } => walk_env_vars(expr, out),
    }

    // `TEntry`'s mapping indices may themselves reference env vars
    // (`balanceOf[CALLER]`); walk into the storage ref too.
    if let TExpr::TEntry { item, .. } = e {
        walk_storage_ref_env_vars(&item.storage_ref, out);
    }
}

fn walk_storage_ref_env_vars(r: &StorageRef, out: &mut Vec<EnvVar>) {
    match r {
        StorageRef::SVar { .. } => {}
        StorageRef::SMapping { parent, index, .. } => {
            walk_storage_ref_env_vars(parent, out);
            walk_env_vars(index, out);
        }
        StorageRef::SField { parent, .. } => walk_storage_ref_env_vars(parent, out),
    }
}

/// Collects every identifier (calldata variable or storage slot base name)
/// referenced in `expr`, with the span of each occurrence.
pub fn identifiers(expr: &TExpr) -> Vec<IdentRef> {
    let mut out = Vec::new();
    walk_identifiers(expr, &mut out);
    out
}

fn walk_identifiers(e: &TExpr, out: &mut Vec<IdentRef>) {
    match e {
        TExpr::Var { name, .. } => out.push(IdentRef {
            name: name.clone(),
            span: Span::default(),
        }),
        TExpr::TEntry { item, .. } => walk_storage_ref_identifiers(&item.storage_ref, out),
        TExpr::IntLit(_) | TExpr::BoolLit(_) | TExpr::ByteStrLit(_) | TExpr::EnvVar(_) => {}
        TExpr::Not(a) | TExpr::Neg(a) => walk_identifiers(a, out),
        TExpr::Add(a, b)
        | TExpr::Sub(a, b)
        | TExpr::Mul(a, b)
        | TExpr::Div(a, b)
        | TExpr::Mod(a, b)
        | TExpr::Exp(a, b)
        | TExpr::Concat(a, b)
        | TExpr::Lt(a, b)
        | TExpr::Le(a, b)
        | TExpr::Gt(a, b)
        | TExpr::Ge(a, b)
        | TExpr::And(a, b)
        | TExpr::Or(a, b) => {
            walk_identifiers(a, out);
            walk_identifiers(b, out);
        }
        TExpr::Eq { lhs, rhs, .. } | TExpr::NEq { lhs, rhs, .. } => {
            walk_identifiers(lhs, out);
            walk_identifiers(rhs, out);
        }
        TExpr::Ite {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            walk_identifiers(cond, out);
            walk_identifiers(then_branch, out);
            walk_identifiers(else_branch, out);
        }
        TExpr::InRange { expr, .. } => walk_identifiers(expr, out),
    }
}

fn walk_storage_ref_identifiers(r: &StorageRef, out: &mut Vec<IdentRef>) {
    match r {
        StorageRef::SVar { name, span, .. } => out.push(IdentRef {
            name: name.clone(),
            span: *span,
        }),
        StorageRef::SMapping { parent, index, .. } => {
            walk_storage_ref_identifiers(parent, out);
            walk_identifiers(index, out);
        }
        StorageRef::SField { parent, .. } => walk_storage_ref_identifiers(parent, out),
    }
}

/// Collects every contract name referenced by an `at Contract` hop
/// (`SField`) anywhere in `expr`.
pub fn referenced_contracts(expr: &TExpr) -> Vec<String> {
    let mut out = Vec::new();
    expr.for_each_entry(&mut |_timing, item| walk_storage_ref_contracts(&item.storage_ref, &mut out));
    out
}

fn walk_storage_ref_contracts(r: &StorageRef, out: &mut Vec<String>) {
    match r {
        StorageRef::SVar { .. } => {}
        StorageRef::SMapping { parent, .. } => walk_storage_ref_contracts(parent, out),
        StorageRef::SField { parent, contract, .. } => {
            walk_storage_ref_contracts(parent, out);
            dedup_push(out, contract.clone());
        }
    }
}

/// Collects every storage location referenced across a [`Rewrite`] list
/// (the `loc`/`item` of each `Constant` or `Update`, plus anything the
/// rhs of an `Update` itself reads).
pub fn rewrite_locations(rewrites: &[Rewrite]) -> Vec<StorageItem> {
    let mut out = Vec::new();
    for rw in rewrites {
        dedup_push(&mut out, rw.item().clone());
        if let Rewrite::Update(upd) = rw {
            for loc in storage_locations(&upd.rhs) {
                dedup_push(&mut out, loc);
            }
        }
    }
    out
}

/// All storage locations referenced anywhere in one constructor: creates
/// assignments' right-hand sides, preconditions, postconditions, and
/// invariant predicates.
pub fn constructor_locations(ctor: &TypedConstructor) -> Vec<StorageItem> {
    let mut out = Vec::new();
    for upd in &ctor.initial_updates {
        for loc in storage_locations(&upd.rhs) {
            dedup_push(&mut out, loc);
        }
    }
    for e in ctor.preconditions.iter().chain(&ctor.postconditions) {
        for loc in storage_locations(e) {
            dedup_push(&mut out, loc);
        }
    }
    for inv in &ctor.invariants {
        for loc in storage_locations(&inv.predicate) {
            dedup_push(&mut out, loc);
        }
    }
    out
}

/// All storage locations referenced anywhere in one behaviour: iff-list,
/// ensures-list, and every case's guard, updates, and return expression.
pub fn behaviour_locations(behaviour: &TypedBehaviour) -> Vec<StorageItem> {
    let mut out = Vec::new();
    for e in behaviour.preconditions.iter().chain(&behaviour.postconditions) {
        for loc in storage_locations(e) {
            dedup_push(&mut out, loc);
        }
    }
    for case in &behaviour.cases {
        for loc in storage_locations(&case.guard) {
            dedup_push(&mut out, loc);
        }
        for loc in rewrite_locations(&case.updates) {
            dedup_push(&mut out, loc);
        }
        if let Some(r) = &case.returns {
            for loc in storage_locations(r) {
                dedup_push(&mut out, loc);
            }
        }
    }
    out
}

/// Every storage location referenced by an invariant's predicate
/// (untimed form — callers apply `setTime` themselves when they need the
/// pre/post pair).
pub fn invariant_locations(inv: &Invariant) -> Vec<StorageItem> {
    storage_locations(&inv.predicate)
}

/// Every contract name that appears as the target of an `at Contract` hop
/// anywhere in a whole typed program.
pub fn act_referenced_contracts(act: &Act) -> Vec<String> {
    let mut out = Vec::new();
    for contract in &act.contracts {
        for e in contract.constructor.preconditions.iter().chain(&contract.constructor.postconditions) {
            for c in referenced_contracts(e) {
                dedup_push(&mut out, c);
            }
        }
        for behaviour in &contract.behaviours {
            for e in behaviour.preconditions.iter().chain(&behaviour.postconditions) {
                for c in referenced_contracts(e) {
                    dedup_push(&mut out, c);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AbiType, ActType, Timing};
    use act_base::Span;

    fn item(contract: &str, name: &str) -> StorageItem {
        StorageItem {
            act_type: ActType::AInteger,
            value_type: AbiType::Uint(256),
            storage_ref: StorageRef::SVar {
                contract: contract.to_string(),
                name: name.to_string(),
                span: Span::default(),
            },
        }
    }

    #[test]
    fn storage_locations_deduplicates_repeated_entries() {
        let a = TExpr::TEntry {
            timing: Timing::Pre,
            item: item("Token", "totalSupply"),
        };
        let b = TExpr::TEntry {
            timing: Timing::Post,
            item: item("Token", "totalSupply"),
        };
        let expr = TExpr::eq(a, b);
        let locs = storage_locations(&expr);
        assert_eq!(locs.len(), 1);
    }

    #[test]
    fn env_vars_collects_from_mapping_index() {
        let idx = TExpr::EnvVar(EnvVar::Caller);
        let storage_ref = StorageRef::SMapping {
            parent: Box::new(StorageRef::SVar {
                contract: "Token".into(),
                name: "balanceOf".into(),
                span: Span::default(),
            }),
            index: Box::new(idx),
            span: Span::default(),
        };
        let entry = TExpr::TEntry {
            timing: Timing::Pre,
            item: StorageItem {
                act_type: ActType::AInteger,
                value_type: AbiType::Uint(256),
                storage_ref,
            },
        };
        assert_eq!(env_vars(&entry), vec![EnvVar::Caller]);
    }

    #[test]
    fn rewrite_locations_includes_rhs_reads() {
        let lhs = item("Token", "totalSupply");
        let rhs = TExpr::Add(
            Box::new(TExpr::TEntry {
                timing: Timing::Pre,
                item: item("Token", "totalSupply"),
            }),
            Box::new(TExpr::IntLit(1.into())),
        );
        let update = crate::storage::StorageUpdate { item: lhs, rhs };
        let rewrites = vec![Rewrite::Update(update)];
        let locs = rewrite_locations(&rewrites);
        assert_eq!(locs.len(), 1);
    }
}
