//! Typechecker / elaborator (C5): the largest component of the pipeline.
//! Resolves names against calldata and the store, checks arity and
//! act-types, normalizes case trees, and elaborates postconditions and
//! state-update right-hand sides to their timed form.

use std::collections::{HashMap, HashSet};
use std::fmt;

use act_base::Span;
use act_syntax::ast as raw;

use crate::act::{Act, ContractDef, Invariant, TypedArg, TypedBehaviour, TypedCase, TypedConstructor, TypedInterface};
use crate::error::InternalError;
use crate::expr::TExpr;
use crate::storage::{Rewrite, StorageItem, StorageRef, StorageUpdate};
use crate::types::{AbiType, ActType, SlotType, Store, Timing};

/// The category of a typechecking error, carried alongside its message so
/// callers (the `type` CLI command's JSON output) can dispatch on it
/// without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeErrorKind {
    UnknownName,
    AmbiguousName,
    ArityMismatch,
    TypeMismatch,
    IllegalStorageReadInCreates,
    IllegalWildcardPlacement,
    DuplicateDefinition,
    TimingMismatch,
    UnsupportedConstruct,
}

/// One typechecking error: a position, a kind, and a human-readable
/// message (spec §4.4's closing paragraph: "all diagnostics carry
/// (position, message)", extended here with a structured `kind`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub kind: TypeErrorKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// An accumulator of typechecking diagnostics, mirroring
/// [`act_base::Diagnostics`] but carrying the structured [`TypeErrorKind`]
/// spec §4.4 asks for.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, span: Span, kind: TypeErrorKind, message: impl Into<String>) {
        self.items.push(Diagnostic {
            span,
            kind,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Merges in diagnostics produced by an earlier phase that reports
    /// plain `act_base::Diagnostic`s (store discovery has no richer
    /// taxonomy than "duplicate definition").
    pub fn push_from(&mut self, d: &act_base::Diagnostic) {
        self.push(d.span, TypeErrorKind::DuplicateDefinition, d.message.clone());
    }

    pub fn push_raw(&mut self, d: Diagnostic) {
        self.items.push(d);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Result of typechecking a whole program: the typed [`Act`] (as complete
/// as could be built), accumulated user-error diagnostics, and, if a
/// genuinely unsupported construct was found, the internal error that
/// should abort the pipeline ahead of query synthesis.
pub struct TypeckResult {
    pub act: Option<Act>,
    pub diagnostics: Diagnostics,
    pub internal_error: Option<InternalError>,
}

/// Name resolution environment for one interface body: the contract being
/// checked (for slot lookups against the store) and the calldata map
/// built from that interface's declared arguments.
struct Env<'a> {
    contract: &'a str,
    store: &'a Store,
    calldata: HashMap<String, AbiType>,
}

impl<'a> Env<'a> {
    fn new(contract: &'a str, store: &'a Store, interface: &raw::Interface) -> Self {
        let calldata = interface
            .args
            .iter()
            .map(|a| (a.name.clone(), AbiType::from_raw(&a.ty)))
            .collect();
        Env { contract, store, calldata }
    }
}

pub fn typecheck(program: &raw::RawProgram, store: &Store) -> TypeckResult {
    let mut tc = Typechecker {
        store,
        diags: Diagnostics::new(),
        internal_error: None,
    };

    let mut ctors: Vec<(String, TypedConstructor)> = Vec::new();
    let mut seen_ctor_contracts: HashSet<String> = HashSet::new();
    let mut behaviours: Vec<TypedBehaviour> = Vec::new();
    let mut seen_behaviour_sigs: HashSet<(String, String, String)> = HashSet::new();

    for decl in program {
        match decl {
            raw::RawBehaviour::Definition(raw_ctor) => {
                let typed = tc.check_constructor(raw_ctor);
                if seen_ctor_contracts.insert(raw_ctor.contract.clone()) {
                    ctors.push((raw_ctor.contract.clone(), typed));
                }
                // Duplicate constructors were already flagged by store
                // discovery (C4); only the first is kept in the typed Act.
            }
            raw::RawBehaviour::Transition(raw_trans) => {
                let sig = (
                    raw_trans.contract.clone(),
                    raw_trans.name.clone(),
                    raw_trans.interface.name.clone(),
                );
                if !seen_behaviour_sigs.insert(sig) {
                    tc.diags.push(
                        raw_trans.span,
                        TypeErrorKind::DuplicateDefinition,
                        format!(
                            "duplicate behaviour '{}' with interface '{}' on contract '{}'",
                            raw_trans.name, raw_trans.interface.name, raw_trans.contract
                        ),
                    );
                }
                if let Some(typed) = tc.check_transition(raw_trans) {
                    behaviours.push(typed);
                }
            }
        }
    }

    let mut contracts = Vec::new();
    for (name, ctor) in ctors {
        let own_behaviours: Vec<TypedBehaviour> = behaviours.iter().filter(|b| b.contract == name).cloned().collect();
        contracts.push(ContractDef {
            name,
            constructor: ctor,
            behaviours: own_behaviours,
        });
    }

    for b in &behaviours {
        if !store.has_contract(&b.contract) {
            tc.diags.push(
                b.span,
                TypeErrorKind::UnknownName,
                format!("behaviour '{}' refers to undeclared contract '{}'", b.name, b.contract),
            );
        } else if !contracts.iter().any(|c| c.name == b.contract) {
            tc.diags.push(
                b.span,
                TypeErrorKind::UnknownName,
                format!("no constructor found for contract '{}'", b.contract),
            );
        }
    }

    let act = if tc.internal_error.is_none() {
        Some(Act {
            store: store.clone(),
            contracts,
        })
    } else {
        None
    };

    TypeckResult {
        act,
        diagnostics: tc.diags,
        internal_error: tc.internal_error,
    }
}

struct Typechecker<'a> {
    store: &'a Store,
    diags: Diagnostics,
    internal_error: Option<InternalError>,
}

impl<'a> Typechecker<'a> {
    fn check_constructor(&mut self, raw_ctor: &raw::RawConstructor) -> TypedConstructor {
        let env = Env::new(&raw_ctor.contract, self.store, &raw_ctor.interface);

        let preconditions = self.check_list_untimed(&env, &raw_ctor.iff);
        let postconditions = self.check_list_timed(&env, &raw_ctor.ensures, Timing::Post);

        let mut initial_updates = Vec::new();
        let mut declared_names = HashSet::new();
        for assign in &raw_ctor.creates {
            match assign {
                raw::RawCreateAssign::Value { ty, name, rhs, span } => {
                    if !declared_names.insert(name.clone()) {
                        continue; // already reported by store discovery
                    }
                    if let Some(pos) = first_storage_read(rhs) {
                        self.diags.push(
                            pos,
                            TypeErrorKind::IllegalStorageReadInCreates,
                            "a creates assignment may not read storage",
                        );
                        continue;
                    }
                    let abi_ty = AbiType::from_raw(ty);
                    let Ok(rhs_typed) = self.check_expr(&env, abi_ty.act_type(), rhs) else {
                        continue;
                    };
                    let item = StorageItem {
                        act_type: abi_ty.act_type(),
                        value_type: abi_ty,
                        storage_ref: StorageRef::SVar {
                            contract: raw_ctor.contract.clone(),
                            name: name.clone(),
                            span: *span,
                        },
                    };
                    initial_updates.push(StorageUpdate { item, rhs: rhs_typed });
                }
                raw::RawCreateAssign::Mapping {
                    ty_keys,
                    ty_val,
                    name,
                    entries,
                    span,
                } => {
                    if !declared_names.insert(name.clone()) {
                        continue;
                    }
                    let key_tys: Vec<AbiType> = ty_keys.iter().map(AbiType::from_raw).collect();
                    let value_ty = AbiType::from_raw(ty_val);
                    for (indices, value_expr) in entries {
                        if indices.len() != key_tys.len() {
                            self.diags.push(
                                *span,
                                TypeErrorKind::ArityMismatch,
                                format!(
                                    "mapping '{name}' expects {} index/indices, found {}",
                                    key_tys.len(),
                                    indices.len()
                                ),
                            );
                            continue;
                        }
                        if let Some(pos) = first_storage_read(value_expr) {
                            self.diags.push(
                                pos,
                                TypeErrorKind::IllegalStorageReadInCreates,
                                "a creates assignment may not read storage",
                            );
                            continue;
                        }
                        let mut storage_ref = StorageRef::SVar {
                            contract: raw_ctor.contract.clone(),
                            name: name.clone(),
                            span: *span,
                        };
                        let mut ok = true;
                        for (idx_expr, key_ty) in indices.iter().zip(&key_tys) {
                            let Some(idx_pos) = first_storage_read(idx_expr) else {
                                let Ok(idx_typed) = self.check_expr(&env, key_ty.act_type(), idx_expr) else {
                                    ok = false;
                                    break;
                                };
                                storage_ref = StorageRef::SMapping {
                                    parent: Box::new(storage_ref),
                                    index: Box::new(idx_typed),
                                    span: *span,
                                };
                                continue;
                            };
                            self.diags.push(
                                idx_pos,
                                TypeErrorKind::IllegalStorageReadInCreates,
                                "a creates assignment's index may not read storage",
                            );
                            ok = false;
                            break;
                        }
                        if !ok {
                            continue;
                        }
                        let Ok(rhs_typed) = self.check_expr(&env, value_ty.act_type(), value_expr) else {
                            continue;
                        };
                        let item = StorageItem {
                            act_type: value_ty.act_type(),
                            value_type: value_ty.clone(),
                            storage_ref: storage_ref,
                        };
                        initial_updates.push(StorageUpdate { item, rhs: rhs_typed });
                    }
                }
                raw::RawCreateAssign::Struct { name, span } => {
                    self.internal_error.get_or_insert(InternalError::StructCreateAssignment {
                        name: name.clone(),
                        span: *span,
                    });
                }
            }
        }

        let invariants = raw_ctor
            .invariants
            .iter()
            .filter_map(|e| {
                let predicate = self.check_expr(&env, ActType::ABoolean, e).ok()?;
                if let Some(span) = first_timed_entry(&predicate) {
                    self.diags.push(
                        span,
                        TypeErrorKind::TimingMismatch,
                        "Neither variable needed here",
                    );
                    return None;
                }
                Some(Invariant {
                    contract: raw_ctor.contract.clone(),
                    extra_preconditions: Vec::new(),
                    storage_bound_predicates: Vec::new(),
                    predicate,
                    span: e.span(),
                })
            })
            .collect();

        TypedConstructor {
            contract: raw_ctor.contract.clone(),
            interface: typed_interface(&raw_ctor.interface),
            preconditions,
            postconditions,
            invariants,
            initial_updates,
            external_rewrites: Vec::new(),
            span: raw_ctor.span,
        }
    }

    fn check_transition(&mut self, raw_trans: &raw::RawTransition) -> Option<TypedBehaviour> {
        if !self.store.has_contract(&raw_trans.contract) {
            self.diags.push(
                raw_trans.span,
                TypeErrorKind::UnknownName,
                format!("undeclared contract '{}'", raw_trans.contract),
            );
            return None;
        }
        let env = Env::new(&raw_trans.contract, self.store, &raw_trans.interface);

        let preconditions = self.check_list_untimed(&env, &raw_trans.iff);
        let postconditions = self.check_list_timed(&env, &raw_trans.ensures, Timing::Post);
        let cases = self.normalize_cases(&env, &raw_trans.cases);

        Some(TypedBehaviour {
            name: raw_trans.name.clone(),
            contract: raw_trans.contract.clone(),
            interface: typed_interface(&raw_trans.interface),
            preconditions,
            cases,
            postconditions,
            span: raw_trans.span,
        })
    }

    fn normalize_cases(&mut self, env: &Env, cases: &raw::RawCases) -> Vec<TypedCase> {
        match cases {
            raw::RawCases::Direct(leaf) => {
                let (updates, returns) = self.check_case_leaf(env, leaf);
                vec![TypedCase {
                    guard: TExpr::BoolLit(true),
                    updates,
                    returns,
                    span: leaf.span,
                }]
            }
            raw::RawCases::Cases(list) => self.normalize_case_list(env, list, None),
        }
    }

    fn normalize_case_list(&mut self, env: &Env, list: &[raw::RawCase], outer: Option<TExpr>) -> Vec<TypedCase> {
        let mut out = Vec::new();
        let mut prior_guards: Vec<TExpr> = Vec::new();
        for (i, case) in list.iter().enumerate() {
            let is_last = i == list.len() - 1;
            let this_guard = match &case.guard {
                raw::RawCaseGuard::Wildcard => {
                    if !is_last {
                        self.diags.push(
                            case.span,
                            TypeErrorKind::IllegalWildcardPlacement,
                            "a wildcard case ('_') may only appear last",
                        );
                    }
                    negate_disjunction(&prior_guards)
                }
                raw::RawCaseGuard::Cond(e) => self
                    .check_untimed(env, ActType::ABoolean, e)
                    .unwrap_or(TExpr::BoolLit(false)),
            };
            prior_guards.push(this_guard.clone());
            let combined = match &outer {
                Some(o) => TExpr::And(Box::new(o.clone()), Box::new(this_guard)),
                None => this_guard,
            };
            match &case.body {
                raw::RawCaseBody::Leaf(leaf) => {
                    let (updates, returns) = self.check_case_leaf(env, leaf);
                    out.push(TypedCase {
                        guard: combined,
                        updates,
                        returns,
                        span: leaf.span,
                    });
                }
                raw::RawCaseBody::Nested(inner) => {
                    out.extend(self.normalize_case_list(env, inner, Some(combined)));
                }
            }
        }
        out
    }

    fn check_case_leaf(&mut self, env: &Env, leaf: &raw::CaseLeaf) -> (Vec<Rewrite>, Option<TExpr>) {
        let mut updates = Vec::new();
        for rw in &leaf.storage {
            if let Some(rewrite) = self.check_rewrite(env, rw) {
                updates.push(rewrite);
            }
        }
        let returns = leaf.returns.as_ref().and_then(|e| self.infer_timed(env, e, Timing::Post).ok());
        (updates, returns)
    }

    fn check_rewrite(&mut self, env: &Env, rw: &raw::RawRewrite) -> Option<Rewrite> {
        let item = self.resolve_storage_item(env, &rw.entry)?;
        match &rw.rhs {
            None => Some(Rewrite::Constant(item)),
            Some(rhs_expr) => {
                let rhs = self.check_timed(env, item.act_type, rhs_expr, Timing::Pre).ok()?;
                Some(Rewrite::Update(StorageUpdate { item, rhs }))
            }
        }
    }

    /// Resolves a [`raw::RawEntry`] to a [`StorageItem`], checking index
    /// arity and key types against the store. Returns `None` (after
    /// pushing a diagnostic) on any resolution failure.
    fn resolve_storage_item(&mut self, env: &Env, entry: &raw::RawEntry) -> Option<StorageItem> {
        if entry.field.is_some() {
            self.diags.push(
                entry.span,
                TypeErrorKind::UnsupportedConstruct,
                "field access on storage entries is not supported",
            );
            return None;
        }
        let Some(slot_ty) = self.store.slot(env.contract, &entry.base) else {
            self.diags.push(
                entry.span,
                TypeErrorKind::UnknownName,
                format!("unknown storage slot '{}' on contract '{}'", entry.base, env.contract),
            );
            return None;
        };
        if entry.indices.len() != slot_ty.arity() {
            self.diags.push(
                entry.span,
                TypeErrorKind::ArityMismatch,
                format!(
                    "slot '{}' expects {} index/indices, found {}",
                    entry.base,
                    slot_ty.arity(),
                    entry.indices.len()
                ),
            );
            return None;
        }
        let key_types: Vec<AbiType> = match slot_ty {
            SlotType::Value(_) => Vec::new(),
            SlotType::Mapping { keys, .. } => keys.clone(),
        };
        let value_type = slot_ty.value_type().clone();
        let act_type = value_type.act_type();

        let mut storage_ref = StorageRef::SVar {
            contract: env.contract.to_string(),
            name: entry.base.clone(),
            span: entry.span,
        };
        for (idx_expr, key_ty) in entry.indices.iter().zip(&key_types) {
            let idx_typed = self.check_untimed(env, key_ty.act_type(), idx_expr)?;
            storage_ref = StorageRef::SMapping {
                parent: Box::new(storage_ref),
                index: Box::new(idx_typed),
                span: entry.span,
            };
        }
        if let Some(contract) = &entry.at_contract {
            storage_ref = StorageRef::SField {
                parent: Box::new(storage_ref),
                contract: contract.clone(),
                span: entry.span,
            };
        }

        Some(StorageItem {
            act_type,
            value_type,
            storage_ref,
        })
    }

    // -- expression checking -------------------------------------------------

    fn check_list_untimed(&mut self, env: &Env, exprs: &[raw::Expr]) -> Vec<TExpr> {
        exprs
            .iter()
            .filter_map(|e| self.check_untimed(env, ActType::ABoolean, e))
            .collect()
    }

    fn check_list_timed(&mut self, env: &Env, exprs: &[raw::Expr], default: Timing) -> Vec<TExpr> {
        exprs
            .iter()
            .filter_map(|e| self.check_timed(env, ActType::ABoolean, e, default).ok())
            .collect()
    }

    /// Checks `e` at `expected`, then verifies no entry in the result is
    /// timed: this is the "Untimed" discipline for preconditions, case
    /// guards, and invariants (spec §3: "inside a behaviour's precondition
    /// and case guard, references are Untimed").
    fn check_untimed(&mut self, env: &Env, expected: ActType, e: &raw::Expr) -> Option<TExpr> {
        let typed = self.check_expr(env, expected, e).ok()?;
        if let Some(span) = first_timed_entry(&typed) {
            self.diags.push(span, TypeErrorKind::TimingMismatch, "Neither variable needed here");
            return None;
        }
        Some(typed)
    }

    /// Checks `e` at `expected`, then applies `setTime(default)` to coerce
    /// every remaining `Neither` entry, leaving explicitly `pre()`/`post()`
    /// wrapped entries untouched.
    fn check_timed(&mut self, env: &Env, expected: ActType, e: &raw::Expr, default: Timing) -> Result<TExpr, ()> {
        let typed = self.check_expr(env, expected, e)?;
        Ok(typed.set_time(default))
    }

    fn infer_timed(&mut self, env: &Env, e: &raw::Expr, default: Timing) -> Result<TExpr, ()> {
        let typed = self.infer_expr(env, e)?;
        Ok(typed.set_time(default))
    }

    /// Infers an act-type for `e` with no expected type supplied, by
    /// trying `AInteger`, then `ABoolean`, then `AByteStr` in turn and
    /// taking the first that succeeds — the same dispatch rule spec §4.4
    /// gives for polymorphic `Eq`/`NEq`, applied here to `returns`
    /// expressions, which the grammar never annotates with a type.
    fn infer_expr(&mut self, env: &Env, e: &raw::Expr) -> Result<TExpr, ()> {
        for candidate in [ActType::AInteger, ActType::ABoolean, ActType::AByteStr] {
            let before = self.diags.len();
            if let Ok(typed) = self.check_expr(env, candidate, e) {
                return Ok(typed);
            }
            self.diags.items.truncate(before);
        }
        self.diags.push(
            e.span(),
            TypeErrorKind::TypeMismatch,
            "cannot harmonize this expression to any act-type",
        );
        Err(())
    }

    fn check_expr(&mut self, env: &Env, expected: ActType, e: &raw::Expr) -> Result<TExpr, ()> {
        match e {
            raw::Expr::IntLit(v, span) => self.expect(expected, ActType::AInteger, *span, TExpr::IntLit(v.clone())),
            raw::Expr::BoolLit(b, span) => self.expect(expected, ActType::ABoolean, *span, TExpr::BoolLit(*b)),
            raw::Expr::ByteStrLit(s, span) => {
                self.expect(expected, ActType::AByteStr, *span, TExpr::ByteStrLit(s.clone()))
            }
            raw::Expr::EnvVar(ev, span) => self.expect(expected, ActType::AInteger, *span, TExpr::EnvVar(*ev)),
            raw::Expr::Var(name, span) => self.check_bare_name(env, expected, name, *span, None),
            raw::Expr::Entry { entry, time } => self.check_entry_expr(env, expected, entry, *time),
            raw::Expr::Unary { op, expr, span } => self.check_unary(env, expected, *op, expr, *span),
            raw::Expr::Binary { op, lhs, rhs, span } => self.check_binary(env, expected, *op, lhs, rhs, *span),
            raw::Expr::Ite {
                cond,
                then_branch,
                else_branch,
                span: _,
            } => {
                let c = self.check_untimed_any_timing(env, ActType::ABoolean, cond)?;
                let t = self.check_expr(env, expected, then_branch)?;
                let e = self.check_expr(env, expected, else_branch)?;
                Ok(TExpr::ite(c, t, e))
            }
            raw::Expr::InRange { expr, ty, span } => {
                if expected != ActType::ABoolean {
                    self.type_mismatch(*span, ActType::ABoolean, expected);
                    return Err(());
                }
                let abi_ty = AbiType::from_raw(ty);
                let inner = self.check_expr(env, abi_ty.act_type(), expr)?;
                Ok(TExpr::InRange {
                    expr: Box::new(inner),
                    ty: abi_ty,
                })
            }
        }
    }

    /// `ITE`'s condition is checked without re-applying the untimed
    /// discipline of the enclosing context, since a condition embedded in
    /// a timed expression may itself reference timed storage.
    fn check_untimed_any_timing(&mut self, env: &Env, expected: ActType, e: &raw::Expr) -> Result<TExpr, ()> {
        self.check_expr(env, expected, e)
    }

    fn expect(&mut self, expected: ActType, actual: ActType, span: Span, value: TExpr) -> Result<TExpr, ()> {
        if expected == actual {
            Ok(value)
        } else {
            self.type_mismatch(span, expected, actual);
            Err(())
        }
    }

    fn type_mismatch(&mut self, span: Span, expected: ActType, actual: ActType) {
        self.diags.push(
            span,
            TypeErrorKind::TypeMismatch,
            format!("expected {expected}, found {actual}"),
        );
    }

    fn check_bare_name(
        &mut self,
        env: &Env,
        expected: ActType,
        name: &str,
        span: Span,
        time: Option<raw::TimeWrap>,
    ) -> Result<TExpr, ()> {
        let calldata_ty = env.calldata.get(name).cloned();
        let slot_ty = self.store.slot(env.contract, name).filter(|s| s.arity() == 0);

        match (calldata_ty, slot_ty) {
            (Some(_), Some(_)) => {
                self.diags.push(
                    span,
                    TypeErrorKind::AmbiguousName,
                    format!("'{name}' matches both a calldata argument and a storage slot"),
                );
                Err(())
            }
            (Some(ty), None) => {
                if time.is_some() {
                    self.diags.push(
                        span,
                        TypeErrorKind::TimingMismatch,
                        format!("'{name}' is a calldata argument and cannot be timed with pre()/post()"),
                    );
                    return Err(());
                }
                self.expect(expected, ty.act_type(), span, TExpr::Var { name: name.to_string(), ty })
            }
            (None, Some(slot)) => {
                let value_type = slot.value_type().clone();
                let act_type = value_type.act_type();
                let item = StorageItem {
                    act_type,
                    value_type,
                    storage_ref: StorageRef::SVar {
                        contract: env.contract.to_string(),
                        name: name.to_string(),
                        span,
                    },
                };
                let timing = match time {
                    Some(raw::TimeWrap::Pre) => Timing::Pre,
                    Some(raw::TimeWrap::Post) => Timing::Post,
                    None => Timing::Neither,
                };
                self.expect(expected, act_type, span, TExpr::TEntry { timing, item })
            }
            (None, None) => {
                self.diags.push(span, TypeErrorKind::UnknownName, format!("unknown name '{name}'"));
                Err(())
            }
        }
    }

    fn check_entry_expr(
        &mut self,
        env: &Env,
        expected: ActType,
        entry: &raw::RawEntry,
        time: Option<raw::TimeWrap>,
    ) -> Result<TExpr, ()> {
        let is_bare = entry.indices.is_empty() && entry.field.is_none() && entry.at_contract.is_none();
        if is_bare {
            return self.check_bare_name(env, expected, &entry.base, entry.span, time);
        }
        let Some(item) = self.resolve_storage_item(env, entry) else {
            return Err(());
        };
        let timing = match time {
            Some(raw::TimeWrap::Pre) => Timing::Pre,
            Some(raw::TimeWrap::Post) => Timing::Post,
            None => Timing::Neither,
        };
        self.expect(expected, item.act_type, entry.span, TExpr::TEntry { timing, item })
    }

    fn check_unary(
        &mut self,
        env: &Env,
        expected: ActType,
        op: raw::UnOp,
        expr: &raw::Expr,
        span: Span,
    ) -> Result<TExpr, ()> {
        match op {
            raw::UnOp::Not => {
                if expected != ActType::ABoolean {
                    self.type_mismatch(span, expected, ActType::ABoolean);
                    return Err(());
                }
                let inner = self.check_expr(env, ActType::ABoolean, expr)?;
                Ok(TExpr::Not(Box::new(inner)))
            }
            raw::UnOp::Neg => {
                if expected != ActType::AInteger {
                    self.type_mismatch(span, expected, ActType::AInteger);
                    return Err(());
                }
                let inner = self.check_expr(env, ActType::AInteger, expr)?;
                Ok(TExpr::Neg(Box::new(inner)))
            }
        }
    }

    fn check_binary(
        &mut self,
        env: &Env,
        expected: ActType,
        op: raw::BinOp,
        lhs: &raw::Expr,
        rhs: &raw::Expr,
        span: Span,
    ) -> Result<TExpr, ()> {
        use raw::BinOp::*;
        match op {
            Add | Sub | Mul | Div | Mod | Exp => {
                if expected != ActType::AInteger {
                    self.type_mismatch(span, expected, ActType::AInteger);
                    return Err(());
                }
                let l = self.check_expr(env, ActType::AInteger, lhs)?;
                let r = self.check_expr(env, ActType::AInteger, rhs)?;
                Ok(match op {
                    Add => TExpr::Add(Box::new(l), Box::new(r)),
                    Sub => TExpr::Sub(Box::new(l), Box::new(r)),
                    Mul => TExpr::Mul(Box::new(l), Box::new(r)),
                    Div => TExpr::Div(Box::new(l), Box::new(r)),
                    Mod => TExpr::Mod(Box::new(l), Box::new(r)),
                    Exp => TExpr::Exp(Box::new(l), Box::new(r)),
                    _ => unreachable!(),
                })
            }
            Concat => {
                if expected != ActType::AByteStr {
                    self.type_mismatch(span, expected, ActType::AByteStr);
                    return Err(());
                }
                let l = self.check_expr(env, ActType::AByteStr, lhs)?;
                let r = self.check_expr(env, ActType::AByteStr, rhs)?;
                Ok(TExpr::Concat(Box::new(l), Box::new(r)))
            }
            Lt | Le | Gt | Ge => {
                if expected != ActType::ABoolean {
                    self.type_mismatch(span, expected, ActType::ABoolean);
                    return Err(());
                }
                let l = self.check_expr(env, ActType::AInteger, lhs)?;
                let r = self.check_expr(env, ActType::AInteger, rhs)?;
                Ok(match op {
                    Lt => TExpr::Lt(Box::new(l), Box::new(r)),
                    Le => TExpr::Le(Box::new(l), Box::new(r)),
                    Gt => TExpr::Gt(Box::new(l), Box::new(r)),
                    Ge => TExpr::Ge(Box::new(l), Box::new(r)),
                    _ => unreachable!(),
                })
            }
            Eq | Neq => {
                if expected != ActType::ABoolean {
                    self.type_mismatch(span, expected, ActType::ABoolean);
                    return Err(());
                }
                for candidate in [ActType::AInteger, ActType::ABoolean, ActType::AByteStr] {
                    let before = self.diags.len();
                    let l = self.check_expr(env, candidate, lhs);
                    let r = self.check_expr(env, candidate, rhs);
                    match (l, r) {
                        (Ok(l), Ok(r)) => {
                            return Ok(if op == Eq { TExpr::eq(l, r) } else { TExpr::neq(l, r) });
                        }
                        _ => self.diags.items.truncate(before),
                    }
                }
                self.diags.push(
                    lhs.span(),
                    TypeErrorKind::TypeMismatch,
                    "cannot harmonize operands of '==' / '=/=' to a common act-type",
                );
                Err(())
            }
            And | Or => {
                if expected != ActType::ABoolean {
                    self.type_mismatch(span, expected, ActType::ABoolean);
                    return Err(());
                }
                let l = self.check_expr(env, ActType::ABoolean, lhs)?;
                let r = self.check_expr(env, ActType::ABoolean, rhs)?;
                Ok(if op == And {
                    TExpr::And(Box::new(l), Box::new(r))
                } else {
                    TExpr::Or(Box::new(l), Box::new(r))
                })
            }
        }
    }
}

fn typed_interface(interface: &raw::Interface) -> TypedInterface {
    TypedInterface {
        name: interface.name.clone(),
        args: interface
            .args
            .iter()
            .map(|a| TypedArg {
                name: a.name.clone(),
                ty: AbiType::from_raw(&a.ty),
            })
            .collect(),
    }
}

fn negate_disjunction(guards: &[TExpr]) -> TExpr {
    match guards.iter().cloned().reduce(|acc, g| TExpr::Or(Box::new(acc), Box::new(g))) {
        Some(disjunction) => TExpr::Not(Box::new(disjunction)),
        None => TExpr::BoolLit(true),
    }
}

/// Finds the first `TEntry` in `e` whose timing is not `Neither`, used to
/// reject explicit `pre()`/`post()` wraps inside untimed contexts (spec
/// scenario 6: "Neither variable needed here").
fn first_timed_entry(e: &TExpr) -> Option<Span> {
    let mut found = None;
    e.for_each_entry(&mut |timing, item| {
        if found.is_none() && *timing != Timing::Neither {
            found = Some(item.storage_ref.span());
        }
    });
    found
}

/// Finds the first storage-reading sub-expression in a raw (untyped)
/// expression tree, used to enforce "no expression reads storage" inside
/// a `creates` block before the typechecker would otherwise happily
/// resolve the reference.
fn first_storage_read(e: &raw::Expr) -> Option<Span> {
    match e {
        raw::Expr::Entry { entry, .. } => Some(entry.span),
        raw::Expr::IntLit(..) | raw::Expr::BoolLit(..) | raw::Expr::ByteStrLit(..) | raw::Expr::EnvVar(..) => None,
        raw::Expr::Var(..) => None,
        raw::Expr::Unary { expr, .. } => first_storage_read(expr),
        raw::Expr::Binary { lhs, rhs, .. } => first_storage_read(lhs).or_else(|| first_storage_read(rhs)),
        raw::Expr::Ite {
            cond,
            then_branch,
            else_branch,
            ..
        } => first_storage_read(cond)
            .or_else(|| first_storage_read(then_branch))
            .or_else(|| first_storage_read(else_branch)),
        raw::Expr::InRange { expr, .. } => first_storage_read(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_syntax::{lexer::Lexer, parser};

    fn typecheck_src(src: &str) -> TypeckResult {
        let (tokens, lex_diags) = Lexer::new(src).tokenize();
        assert!(lex_diags.is_empty());
        let (program, parse_diags) = parser::parse(tokens);
        assert!(parse_diags.is_empty(), "{parse_diags}");
        let (store, store_diags) = crate::store::discover(&program);
        assert!(store_diags.is_empty());
        typecheck(&program, &store)
    }

    #[test]
    fn resolves_value_slot_reference_and_calldata_var() {
        let result = typecheck_src(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n\
             behaviour mint of Token\n\
             interface mint(uint256 amount)\n\
             storage\n  totalSupply => totalSupply + amount\n",
        );
        assert!(result.diagnostics.is_empty(), "{}", result.diagnostics);
        let act = result.act.unwrap();
        let token = act.contract("Token").unwrap();
        assert_eq!(token.behaviours.len(), 1);
        assert_eq!(token.behaviours[0].cases.len(), 1);
        assert_eq!(token.behaviours[0].cases[0].updates.len(), 1);
    }

    #[test]
    fn rejects_pre_post_wrap_in_precondition() {
        let result = typecheck_src(
            "constructor of Token\ninterface constructor()\ncreates\n  uint256 totalSupply := 0\n\
             behaviour noop of Token\n\
             interface noop()\n\
             iff\n  pre(totalSupply) >= 0\n",
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.kind == TypeErrorKind::TimingMismatch));
    }

    #[test]
    fn rejects_storage_read_in_creates() {
        let result = typecheck_src(
            "constructor of Token\n\
             interface constructor()\n\
             creates\n  uint256 totalSupply := 0\n  uint256 x := totalSupply\n",
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.kind == TypeErrorKind::IllegalStorageReadInCreates));
    }

    #[test]
    fn normalizes_wildcard_case_to_negation() {
        let result = typecheck_src(
            "constructor of Vault\ninterface constructor()\ncreates\n  uint256 balance := 0\n\
             behaviour withdraw of Vault\n\
             interface withdraw(uint256 amount)\n\
             case amount <= balance:\n  returns true\n\
             case _:\n  returns false\n",
        );
        assert!(result.diagnostics.is_empty(), "{}", result.diagnostics);
        let act = result.act.unwrap();
        let cases = &act.contract("Vault").unwrap().behaviours[0].cases;
        assert_eq!(cases.len(), 2);
        assert!(matches!(cases[1].guard, TExpr::Not(_)));
    }
}
