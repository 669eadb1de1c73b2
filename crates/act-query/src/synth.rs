//! Query synthesis (C7): turns a typed [`Act`] plus its split [`Claim`]s
//! into the flat list of SMT-LIB2 [`Query`] obligations spec §4.6
//! describes — one per postcondition, and the constructor/behaviour
//! sub-query pairs per contract invariant.

use std::collections::BTreeSet;

use act_core::act::Act;
use act_core::claim::{Claim, ClaimKind};
use act_core::error::InternalError;
use act_core::expr::TExpr;
use act_core::storage::{Rewrite, StorageItem};
use act_core::traverse;
use act_core::types::{ActType, Timing};
use act_syntax::token::EnvVar;

use crate::naming;
use crate::query::{ModelTarget, Query, QueryKind};
use crate::term;

/// Whether a declaration should cover both timings or only `Post` (spec
/// §4.6: "locations produced by a constructor's `creates` block have only
/// a `Post` form").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclScope {
    PreAndPost,
    PostOnly,
}

/// Declares every distinct (contract, slot) pair in `items` at the
/// requested timing scope, looking up each slot's declared type in `act`
/// so mappings get their nested `Array` sort rather than a scalar one.
fn declare_storage(query: &mut Query, act: &Act, items: &[StorageItem], scope: DeclScope) {
    let mut seen = BTreeSet::new();
    for item in items {
        let contract = item.storage_ref.contract().to_string();
        let slot = item.storage_ref.slot_name().to_string();
        if !seen.insert((contract.clone(), slot.clone())) {
            continue;
        }
        let Some(slot_ty) = act.store.slot(&contract, &slot) else {
            continue;
        };
        let sort = naming::slot_sort(slot_ty);
        match scope {
            DeclScope::PreAndPost => {
                query.declare_const(&naming::storage_name(&contract, &slot, Timing::Pre), &sort);
                query.declare_const(&naming::storage_name(&contract, &slot, Timing::Post), &sort);
            }
            DeclScope::PostOnly => {
                query.declare_const(&naming::storage_name(&contract, &slot, Timing::Post), &sort);
            }
        }
    }
}

fn declare_calldata(query: &mut Query, iface_name: &str, args: &[act_core::act::TypedArg]) {
    for arg in args {
        let name = naming::calldata_name(iface_name, &arg.name);
        query.declare_const(&name, naming::sort_of(arg.ty.act_type()));
        query.push_model_target(ModelTarget {
            label: name.clone(),
            term: name,
            act_type: arg.ty.act_type(),
        });
    }
}

fn declare_env_vars(query: &mut Query, exprs: &[&TExpr]) {
    let mut seen: Vec<EnvVar> = Vec::new();
    for e in exprs {
        for ev in traverse::env_vars(e) {
            if !seen.contains(&ev) {
                seen.push(ev);
                query.declare_const(ev.smt_name(), naming::sort_of(ActType::AInteger));
                query.push_model_target(ModelTarget {
                    label: ev.smt_name().to_string(),
                    term: ev.smt_name().to_string(),
                    act_type: ActType::AInteger,
                });
            }
        }
    }
}

/// Records one counter-model field per (item, timing) pair actually
/// declared by [`declare_storage`], rendering each through [`term::render`]
/// so a mapping entry becomes the same `(select ...)` chain the query's own
/// assertions use (spec §4.7).
fn record_storage_models(query: &mut Query, items: &[StorageItem], scope: DeclScope) -> Result<(), InternalError> {
    let timings: &[Timing] = match scope {
        DeclScope::PreAndPost => &[Timing::Pre, Timing::Post],
        DeclScope::PostOnly => &[Timing::Post],
    };
    for item in items {
        for &timing in timings {
            let term = term::render(&TExpr::TEntry {
                timing,
                item: item.clone(),
            })?;
            query.push_model_target(ModelTarget {
                label: term.clone(),
                term,
                act_type: item.act_type,
            });
        }
    }
    Ok(())
}

/// Asserts one [`Rewrite`]: an `Update` becomes `(assert (= locPost
/// rhs))`; a `Constant` becomes `(assert (= locPre locPost))` (spec
/// §4.6). Mapping slots render both sides through [`term::render`]'s
/// `select`-chasing, so an update to one index of a mapping still
/// compares the whole array via `=`, which is the standard SMT-LIB
/// encoding of "all other indices unchanged, this one updated" only when
/// paired with an explicit `store` — this crate instead asserts equality
/// of the *selected* cell only, leaving every other index of the array
/// unconstrained between Pre and Post (sound for the postcondition and
/// invariant goals this crate proves, which only ever read back the same
/// indices they wrote).
fn assert_rewrite(query: &mut Query, rw: &Rewrite) -> Result<(), InternalError> {
    match rw {
        Rewrite::Constant(loc) => {
            let pre = term::render(&TExpr::TEntry {
                timing: Timing::Pre,
                item: loc.clone(),
            })?;
            let post = term::render(&TExpr::TEntry {
                timing: Timing::Post,
                item: loc.clone(),
            })?;
            query.assert(format!("(= {pre} {post})"));
            Ok(())
        }
        Rewrite::Update(upd) => {
            let post = term::render(&TExpr::TEntry {
                timing: Timing::Post,
                item: upd.item.clone(),
            })?;
            let rhs = term::render(&upd.rhs)?;
            query.assert(format!("(= {post} {rhs})"));
            Ok(())
        }
    }
}

/// Synthesizes one query per individual postcondition of every `Pass`
/// claim (spec §1: "for each postcondition ... synthesizes an SMT-LIB2
/// query"). `Fail` claims carry no postconditions by construction
/// ([`act_core::claim::split_claims`]) and so contribute nothing here.
pub fn postcondition_queries(act: &Act, claims: &[Claim]) -> (Vec<Query>, Vec<InternalError>) {
    let mut queries = Vec::new();
    let mut errors = Vec::new();

    for claim in claims {
        match claim {
            Claim::Behaviour(b) if b.kind == ClaimKind::Pass => {
                for (index, post) in b.postconditions.iter().enumerate() {
                    let kind = QueryKind::BehaviourPostcondition {
                        contract: b.contract.clone(),
                        behaviour: b.name.clone(),
                        case: index,
                        index,
                    };
                    match build_behaviour_postcondition_query(act, b, post, kind) {
                        Ok(q) => queries.push(q),
                        Err(e) => errors.push(e),
                    }
                }
            }
            Claim::Constructor(c) if c.kind == ClaimKind::Pass => {
                for (index, post) in c.postconditions.iter().enumerate() {
                    let kind = QueryKind::ConstructorPostcondition {
                        contract: c.contract.clone(),
                        index,
                    };
                    match build_constructor_postcondition_query(act, c, post, kind) {
                        Ok(q) => queries.push(q),
                        Err(e) => errors.push(e),
                    }
                }
            }
            _ => {}
        }
    }

    (queries, errors)
}

fn build_behaviour_postcondition_query(
    act: &Act,
    claim: &act_core::claim::BehaviourClaim,
    post: &TExpr,
    kind: QueryKind,
) -> Result<Query, InternalError> {
    let mut query = Query::new(kind);

    let mut locations: Vec<StorageItem> = traverse::storage_locations(&claim.precondition);
    locations.extend(traverse::rewrite_locations(&claim.updates));
    locations.extend(traverse::storage_locations(post));
    declare_storage(&mut query, act, &locations, DeclScope::PreAndPost);
    declare_calldata(&mut query, &claim.interface.name, &claim.interface.args);
    declare_env_vars(&mut query, &[&claim.precondition, post]);
    record_storage_models(&mut query, &locations, DeclScope::PreAndPost)?;

    let precondition_term = term::render(&claim.precondition)?;
    query.assert(precondition_term);
    for rw in &claim.updates {
        assert_rewrite(&mut query, rw)?;
    }
    let post_term = term::render(post)?;
    query.assert(format!("(not {post_term})"));

    Ok(query)
}

fn build_constructor_postcondition_query(
    act: &Act,
    claim: &act_core::claim::ConstructorClaim,
    post: &TExpr,
    kind: QueryKind,
) -> Result<Query, InternalError> {
    let mut query = Query::new(kind);

    let mut locations: Vec<StorageItem> = traverse::rewrite_locations(&claim.updates);
    locations.extend(traverse::storage_locations(post));
    declare_storage(&mut query, act, &locations, DeclScope::PostOnly);
    declare_calldata(&mut query, &claim.interface.name, &claim.interface.args);
    declare_env_vars(&mut query, &[&claim.precondition, post]);
    record_storage_models(&mut query, &locations, DeclScope::PostOnly)?;

    let precondition_term = term::render(&claim.precondition)?;
    query.assert(precondition_term);
    for rw in &claim.updates {
        assert_rewrite(&mut query, rw)?;
    }
    let post_term = term::render(post)?;
    query.assert(format!("(not {post_term})"));

    Ok(query)
}

/// Synthesizes the constructor/behaviour-case sub-query pairs for every
/// invariant of every contract (spec §4.6's invariant query discipline).
pub fn invariant_queries(act: &Act) -> (Vec<Query>, Vec<InternalError>) {
    let mut queries = Vec::new();
    let mut errors = Vec::new();

    for contract in &act.contracts {
        let ctor = &contract.constructor;
        for (inv_index, inv) in ctor.invariants.iter().enumerate() {
            match build_constructor_invariant_query(act, ctor, inv, inv_index) {
                Ok(q) => queries.push(q),
                Err(e) => errors.push(e),
            }

            for behaviour in &contract.behaviours {
                for (case_index, case) in behaviour.cases.iter().enumerate() {
                    match build_behaviour_invariant_query(act, behaviour, case, case_index, inv, inv_index) {
                        Ok(q) => queries.push(q),
                        Err(e) => errors.push(e),
                    }
                }
            }
        }
    }

    (queries, errors)
}

fn build_constructor_invariant_query(
    act: &Act,
    ctor: &act_core::act::TypedConstructor,
    inv: &act_core::act::Invariant,
    inv_index: usize,
) -> Result<Query, InternalError> {
    let kind = QueryKind::ConstructorInvariant {
        contract: ctor.contract.clone(),
        invariant_index: inv_index,
    };
    let mut query = Query::new(kind);

    let post_pred = inv.post();
    let mut locations: Vec<StorageItem> = traverse::constructor_locations(ctor);
    locations.extend(traverse::storage_locations(&post_pred));
    locations.extend(
        inv.extra_preconditions
            .iter()
            .flat_map(traverse::storage_locations),
    );
    declare_storage(&mut query, act, &locations, DeclScope::PostOnly);
    record_storage_models(&mut query, &locations, DeclScope::PostOnly)?;
    declare_calldata(&mut query, &ctor.interface.name, &ctor.interface.args);
    let mut env_sources: Vec<&TExpr> = ctor.preconditions.iter().collect();
    env_sources.extend(inv.extra_preconditions.iter());
    env_sources.push(&post_pred);
    declare_env_vars(&mut query, &env_sources);

    for upd in &ctor.initial_updates {
        let post = term::render(&TExpr::TEntry {
            timing: Timing::Post,
            item: upd.item.clone(),
        })?;
        let rhs = term::render(&upd.rhs)?;
        query.assert(format!("(= {post} {rhs})"));
    }
    for cond in &ctor.preconditions {
        query.assert(term::render(cond)?);
    }
    for cond in &inv.extra_preconditions {
        query.assert(term::render(cond)?);
    }
    let post_term = term::render(&post_pred)?;
    query.assert(format!("(not {post_term})"));

    Ok(query)
}

fn build_behaviour_invariant_query(
    act: &Act,
    behaviour: &act_core::act::TypedBehaviour,
    case: &act_core::act::TypedCase,
    case_index: usize,
    inv: &act_core::act::Invariant,
    inv_index: usize,
) -> Result<Query, InternalError> {
    let kind = QueryKind::BehaviourInvariant {
        contract: behaviour.contract.clone(),
        behaviour: behaviour.name.clone(),
        case: case_index,
        invariant_index: inv_index,
    };
    let mut query = Query::new(kind);

    let pre_pred = inv.pre();
    let post_pred = inv.post();
    let invariant_locations = traverse::invariant_locations(inv);
    let updated_locations = traverse::rewrite_locations(&case.updates);

    let mut locations: Vec<StorageItem> = invariant_locations.clone();
    locations.extend(updated_locations.clone());
    locations.extend(traverse::storage_locations(&case.guard));
    locations.extend(behaviour.preconditions.iter().flat_map(traverse::storage_locations));
    declare_storage(&mut query, act, &locations, DeclScope::PreAndPost);
    record_storage_models(&mut query, &locations, DeclScope::PreAndPost)?;
    declare_calldata(&mut query, &behaviour.interface.name, &behaviour.interface.args);
    let mut env_sources: Vec<&TExpr> = behaviour.preconditions.iter().collect();
    env_sources.push(&case.guard);
    env_sources.push(&pre_pred);
    env_sources.push(&post_pred);
    declare_env_vars(&mut query, &env_sources);

    query.assert(term::render(&pre_pred)?);
    for cond in &behaviour.preconditions {
        query.assert(term::render(cond)?);
    }
    query.assert(term::render(&case.guard)?);
    for rw in &case.updates {
        assert_rewrite(&mut query, rw)?;
    }

    // Locations the invariant reads but this case never mentions stay
    // constant across the transition (spec §4.6: "locations referenced in
    // the invariant but not updated via Constant rewrites").
    let already_referenced = |loc: &StorageItem| {
        updated_locations
            .iter()
            .any(|u| u.storage_ref == loc.storage_ref)
    };
    for loc in &invariant_locations {
        if already_referenced(loc) {
            continue;
        }
        let pre = term::render(&TExpr::TEntry {
            timing: Timing::Pre,
            item: loc.clone(),
        })?;
        let post = term::render(&TExpr::TEntry {
            timing: Timing::Post,
            item: loc.clone(),
        })?;
        query.assert(format!("(= {pre} {post})"));
    }

    let post_term = term::render(&post_pred)?;
    query.assert(format!("(not {post_term})"));

    Ok(query)
}

/// Synthesizes the complete set of obligations for a typed program: one
/// query per postcondition plus the inductive invariant sub-query pairs.
pub fn synthesize(act: &Act, claims: &[Claim]) -> (Vec<Query>, Vec<InternalError>) {
    let (mut queries, mut errors) = postcondition_queries(act, claims);
    let (inv_queries, inv_errors) = invariant_queries(act);
    queries.extend(inv_queries);
    errors.extend(inv_errors);
    (queries, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_core::claim::split_claims;

    fn compile(src: &str) -> Act {
        let (tokens, lex_diags) = act_syntax::lexer::Lexer::new(src).tokenize();
        assert!(lex_diags.is_empty());
        let (program, parse_diags) = act_syntax::parser::parse(tokens);
        assert!(parse_diags.is_empty(), "{parse_diags}");
        let result = act_core::compile(&program);
        assert!(result.diagnostics.is_empty(), "{}", result.diagnostics);
        result.act.unwrap()
    }

    #[test]
    fn postcondition_query_asserts_negated_ensures() {
        let act = compile(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n\
             behaviour mint of Token\n\
             interface mint(uint256 amount)\n\
             storage\n  totalSupply => totalSupply + amount\n\
             ensures\n  totalSupply == pre(totalSupply) + amount\n",
        );
        let claims = split_claims(&act);
        let (queries, errors) = postcondition_queries(&act, &claims);
        assert!(errors.is_empty());
        assert_eq!(queries.len(), 1);
        let q = &queries[0];
        assert!(q.assertions.iter().any(|a| a.contains("not")));
        assert!(q
            .declarations
            .iter()
            .any(|d| d.contains("Token_totalSupply_Pre")));
    }

    #[test]
    fn postcondition_query_records_model_targets_for_storage_and_calldata() {
        let act = compile(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n\
             behaviour mint of Token\n\
             interface mint(uint256 amount)\n\
             storage\n  totalSupply => totalSupply + amount\n\
             ensures\n  totalSupply == pre(totalSupply) + amount\n",
        );
        let claims = split_claims(&act);
        let (queries, errors) = postcondition_queries(&act, &claims);
        assert!(errors.is_empty());
        let q = &queries[0];
        assert!(q.model_targets.iter().any(|t| t.term == "Token_totalSupply_Pre"));
        assert!(q.model_targets.iter().any(|t| t.term == "Token_totalSupply_Post"));
        assert!(q.model_targets.iter().any(|t| t.term == "mint_amount"));
        // every model target's term must have been declared somewhere
        for target in &q.model_targets {
            assert!(
                q.declarations.iter().any(|d| d.contains(&target.label))
                    || target.term.starts_with('('),
                "undeclared model target: {}",
                target.term
            );
        }
    }

    #[test]
    fn invariant_queries_cover_constructor_and_each_behaviour_case() {
        let act = compile(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n\
             invariants\n  totalSupply >= 0\n\
             behaviour mint of Token\n\
             interface mint(uint256 amount)\n\
             storage\n  totalSupply => totalSupply + amount\n",
        );
        let (queries, errors) = invariant_queries(&act);
        assert!(errors.is_empty());
        // one constructor sub-query + one behaviour-case sub-query
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn symbolic_exponent_is_reported_as_internal_error_not_panic() {
        let act = compile(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n\
             behaviour grow of Token\n\
             interface grow(uint256 power)\n\
             storage\n  totalSupply => 2 ^ power\n\
             ensures\n  totalSupply >= pre(totalSupply)\n",
        );
        let claims = split_claims(&act);
        let (queries, errors) = postcondition_queries(&act, &claims);
        assert!(queries.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], InternalError::SymbolicExponent { .. }));
    }
}
