//! Typed expressions (spec §3 "Typed expression").
//!
//! `TExpr` is a tagged variant in the sense of spec §9's design note: the
//! GADT-polymorphic `Exp a t` of the original model becomes one enum whose
//! polymorphic constructors (`Eq`, `NEq`, `Ite`, `Var`, `TEntry`) carry
//! their act-type explicitly. Smart constructors below double-check that a
//! node's declared tag matches its operands before handing back a value,
//! so a bug in the typechecker shows up as a panic close to its cause
//! rather than a silently mistyped tree reaching the query synthesizer.

use num_bigint::BigInt;
use serde::Serialize;

use crate::storage::StorageItem;
use crate::types::{AbiType, ActType, Timing};
use act_syntax::token::EnvVar;

/// A fully typed, timing-tagged expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TExpr {
    IntLit(BigInt),
    BoolLit(bool),
    ByteStrLit(String),
    /// `BLOCKHASH` ties to `AInteger` (see spec §9's open question); every
    /// other environment identifier is unambiguously `AInteger` too.
    EnvVar(EnvVar),
    /// A calldata argument reference. Never carries storage, so it needs
    /// no timing.
    Var { name: String, ty: AbiType },
    /// The only construct that reads storage; `timing` is `Neither` until
    /// an enclosing `setTime` pass rewrites it.
    TEntry { timing: Timing, item: StorageItem },

    Not(Box<TExpr>),
    Neg(Box<TExpr>),

    Add(Box<TExpr>, Box<TExpr>),
    Sub(Box<TExpr>, Box<TExpr>),
    Mul(Box<TExpr>, Box<TExpr>),
    Div(Box<TExpr>, Box<TExpr>),
    Mod(Box<TExpr>, Box<TExpr>),
    Exp(Box<TExpr>, Box<TExpr>),

    Concat(Box<TExpr>, Box<TExpr>),

    Lt(Box<TExpr>, Box<TExpr>),
    Le(Box<TExpr>, Box<TExpr>),
    Gt(Box<TExpr>, Box<TExpr>),
    Ge(Box<TExpr>, Box<TExpr>),

    And(Box<TExpr>, Box<TExpr>),
    Or(Box<TExpr>, Box<TExpr>),

    /// Polymorphic equality; `tag` is the act-type both operands were
    /// elaborated at.
    Eq {
        tag: ActType,
        lhs: Box<TExpr>,
        rhs: Box<TExpr>,
    },
    NEq {
        tag: ActType,
        lhs: Box<TExpr>,
        rhs: Box<TExpr>,
    },
    /// Polymorphic if-then-else; `tag` is the act-type of both branches.
    Ite {
        tag: ActType,
        cond: Box<TExpr>,
        then_branch: Box<TExpr>,
        else_branch: Box<TExpr>,
    },
    /// `e in range T`: always boolean, regardless of `e`'s act-type.
    InRange { expr: Box<TExpr>, ty: AbiType },
}

impl TExpr {
    /// The act-type this expression evaluates to. Total: every variant
    /// determines its type either structurally (arithmetic is always
    /// `AInteger`, comparisons and connectives are always `ABoolean`) or
    /// from an explicit tag (`Var`, `TEntry`, `Eq`, `NEq`, `Ite`).
    pub fn act_type(&self) -> ActType {
        match self {
            TExpr::IntLit(_) | TExpr::EnvVar(_) => ActType::AInteger,
            TExpr::BoolLit(_) => ActType::ABoolean,
            TExpr::ByteStrLit(_) => ActType::AByteStr,
            TExpr::Var { ty, .. } => ty.act_type(),
            TExpr::TEntry { item, .. } => item.act_type,
            TExpr::Not(_)
            | TExpr::Lt(..)
            | TExpr::Le(..)
            | TExpr::Gt(..)
            | TExpr::Ge(..)
            | TExpr::And(..)
            | TExpr::Or(..)
            | TExpr::InRange { .. } => ActType::ABoolean,
            TExpr::Neg(_)
            | TExpr::Add(..)
            | TExpr::Sub(..)
            | TExpr::Mul(..)
            | TExpr::Div(..)
            | TExpr::Mod(..)
            | TExpr::Exp(..) => ActType::AInteger,
            TExpr::Concat(..) => ActType::AByteStr,
            TExpr::Eq { tag, .. } | TExpr::NEq { tag, .. } | TExpr::Ite { tag, .. } => *tag,
        }
    }

    /// Smart constructor for `Eq`: panics (a typechecker bug, not a user
    /// error) if the operands disagree on act-type.
    pub fn eq(lhs: TExpr, rhs: TExpr) -> TExpr {
        let tag = lhs.act_type();
        debug_assert_eq!(tag, rhs.act_type(), "Eq operands must share an act-type");
        TExpr::Eq {
            tag,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn neq(lhs: TExpr, rhs: TExpr) -> TExpr {
        let tag = lhs.act_type();
        debug_assert_eq!(tag, rhs.act_type(), "NEq operands must share an act-type");
        TExpr::NEq {
            tag,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn ite(cond: TExpr, then_branch: TExpr, else_branch: TExpr) -> TExpr {
        debug_assert_eq!(cond.act_type(), ActType::ABoolean, "ITE condition must be boolean");
        let tag = then_branch.act_type();
        debug_assert_eq!(tag, else_branch.act_type(), "ITE branches must share an act-type");
        TExpr::Ite {
            tag,
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Walks every `TEntry` under this expression (used by traversal and
    /// by `setTime`).
    pub fn for_each_entry<'a>(&'a self, f: &mut impl FnMut(&'a Timing, &'a StorageItem)) {
        match self {
            TExpr::TEntry { timing, item } => f(timing, item),
            TExpr::IntLit(_) | TExpr::BoolLit(_) | TExpr::ByteStrLit(_) | TExpr::EnvVar(_) | TExpr::Var { .. } => {}
            TExpr::Not(e) | TExpr::Neg(e) => e.for_each_entry(f),
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
                a.for_each_entry(f);
                b.for_each_entry(f);
            }
            TExpr::Eq { lhs, rhs, .. } | TExpr::NEq { lhs, rhs, .. } => {
                lhs.for_each_entry(f);
                rhs.for_each_entry(f);
            }
            TExpr::Ite {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                cond.for_each_entry(f);
                then_branch.for_each_entry(f);
                else_branch.for_each_entry(f);
            }
            TExpr::InRange { expr, .. } => expr.for_each_entry(f),
        }
    }

    /// Maps every `Timing::Neither` occurrence in this expression to `t`,
    /// leaving already-timed entries untouched. This is spec §3's
    /// `setTime(t)` elaboration pass.
    pub fn set_time(self, t: Timing) -> TExpr {
        match self {
            TExpr::TEntry { timing, item } => TExpr::TEntry {
                timing: if timing == Timing::Neither { t } else { timing },
                item,
            },
            leaf @ (TExpr::IntLit(_)
            | TExpr::BoolLit(_)
            | TExpr::ByteStrLit(_)
            | TExpr::EnvVar(_)
            | TExpr::Var { .. }) => leaf,
            TExpr::Not(e) => TExpr::Not(Box::new(e.set_time(t))),
            TExpr::Neg(e) => TExpr::Neg(Box::new(e.set_time(t))),
            TExpr::Add(a, b) => TExpr::Add(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Sub(a, b) => TExpr::Sub(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Mul(a, b) => TExpr::Mul(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Div(a, b) => TExpr::Div(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Mod(a, b) => TExpr::Mod(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Exp(a, b) => TExpr::Exp(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Concat(a, b) => TExpr::Concat(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Lt(a, b) => TExpr::Lt(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Le(a, b) => TExpr::Le(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Gt(a, b) => TExpr::Gt(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Ge(a, b) => TExpr::Ge(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::And(a, b) => TExpr::And(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Or(a, b) => TExpr::Or(Box::new(a.set_time(t)), Box::new(b.set_time(t))),
            TExpr::Eq { tag, lhs, rhs } => TExpr::Eq {
                tag,
                lhs: Box::new(lhs.set_time(t)),
                rhs: Box::new(rhs.set_time(t)),
            },
            TExpr::NEq { tag, lhs, rhs } => TExpr::NEq {
                tag,
                lhs: Box::new(lhs.set_time(t)),
                rhs: Box::new(rhs.set_time(t)),
            },
            TExpr::Ite {
                tag,
                cond,
                then_branch,
                else_branch,
            } => TExpr::Ite {
                tag,
                cond: Box::new(cond.set_time(t)),
                then_branch: Box::new(then_branch.set_time(t)),
                else_branch: Box::new(else_branch.set_time(t)),
            },
            TExpr::InRange { expr, ty } => TExpr::InRange {
                expr: Box::new(expr.set_time(t)),
                ty,
            },
        }
    }

    /// Builds the JSON node for this expression (spec.md §6: "operators
    /// serialise as `{symbol, arity, args}`").
    pub fn to_node(&self) -> ExprNode {
        match self {
            TExpr::IntLit(n) => ExprNode::leaf("int").with_value(n.to_string()),
            TExpr::BoolLit(b) => ExprNode::leaf("bool").with_value(b.to_string()),
            TExpr::ByteStrLit(s) => ExprNode::leaf("bytestr").with_value(s.clone()),
            TExpr::EnvVar(ev) => ExprNode::leaf(ev.smt_name()).with_sort(ActType::AInteger),
            TExpr::Var { name, ty } => ExprNode::leaf("var")
                .with_value(name.clone())
                .with_sort(ty.act_type()),
            TExpr::TEntry { timing, item } => {
                let storage = item.storage_ref.to_node();
                ExprNode {
                    symbol: storage.symbol.to_string(),
                    arity: 0,
                    args: Vec::new(),
                    value: None,
                    sort: Some(item.act_type),
                    timing: Some(*timing),
                    storage: Some(storage),
                }
            }
            TExpr::Not(e) => ExprNode::op("!", vec![e]),
            TExpr::Neg(e) => ExprNode::op("-", vec![e]),
            TExpr::Add(a, b) => ExprNode::op("+", vec![a, b]),
            TExpr::Sub(a, b) => ExprNode::op("-", vec![a, b]),
            TExpr::Mul(a, b) => ExprNode::op("*", vec![a, b]),
            TExpr::Div(a, b) => ExprNode::op("/", vec![a, b]),
            TExpr::Mod(a, b) => ExprNode::op("%", vec![a, b]),
            TExpr::Exp(a, b) => ExprNode::op("^", vec![a, b]),
            TExpr::Concat(a, b) => ExprNode::op("++", vec![a, b]),
            TExpr::Lt(a, b) => ExprNode::op("<", vec![a, b]),
            TExpr::Le(a, b) => ExprNode::op("<=", vec![a, b]),
            TExpr::Gt(a, b) => ExprNode::op(">", vec![a, b]),
            TExpr::Ge(a, b) => ExprNode::op(">=", vec![a, b]),
            TExpr::And(a, b) => ExprNode::op("&&", vec![a, b]),
            TExpr::Or(a, b) => ExprNode::op("||", vec![a, b]),
            TExpr::Eq { tag, lhs, rhs } => ExprNode::op("==", vec![lhs, rhs]).with_sort(*tag),
            TExpr::NEq { tag, lhs, rhs } => ExprNode::op("!=", vec![lhs, rhs]).with_sort(*tag),
            TExpr::Ite {
                tag,
                cond,
                then_branch,
                else_branch,
            } => ExprNode::op("ite", vec![cond, then_branch, else_branch]).with_sort(*tag),
            TExpr::InRange { expr, ty } => ExprNode::op("inRange", vec![expr]).with_sort(ty.act_type()),
        }
    }
}

/// The JSON node produced by [`TExpr::to_node`]. Every node carries
/// `symbol`/`arity`/`args`; the remaining fields are populated only for
/// the node kinds that need them and omitted otherwise.
#[derive(Debug, Serialize)]
pub struct ExprNode {
    pub symbol: String,
    pub arity: usize,
    pub args: Vec<ExprNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<ActType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<crate::storage::StorageRefNode>,
}

impl ExprNode {
    fn leaf(symbol: &str) -> Self {
        ExprNode {
            symbol: symbol.to_string(),
            arity: 0,
            args: Vec::new(),
            value: None,
            sort: None,
            timing: None,
            storage: None,
        }
    }

    fn op(symbol: &str, args: Vec<&TExpr>) -> Self {
        ExprNode {
            symbol: symbol.to_string(),
            arity: args.len(),
            args: args.into_iter().map(TExpr::to_node).collect(),
            value: None,
            sort: None,
            timing: None,
            storage: None,
        }
    }

    fn with_value(mut self, value: String) -> Self {
        self.value = Some(value);
        self
    }

    fn with_sort(mut self, sort: ActType) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_always_ainteger() {
        let e = TExpr::Add(Box::new(TExpr::IntLit(1.into())), Box::new(TExpr::IntLit(2.into())));
        assert_eq!(e.act_type(), ActType::AInteger);
    }

    #[test]
    fn comparisons_are_always_aboolean() {
        let e = TExpr::Lt(Box::new(TExpr::IntLit(1.into())), Box::new(TExpr::IntLit(2.into())));
        assert_eq!(e.act_type(), ActType::ABoolean);
    }

    #[test]
    fn set_time_rewrites_only_neither_entries() {
        let item = StorageItem {
            act_type: ActType::AInteger,
            value_type: AbiType::Uint(256),
            storage_ref: crate::storage::StorageRef::SVar {
                contract: "Token".into(),
                name: "totalSupply".into(),
                span: act_base::Span::default(),
            },
        };
        let already_pre = TExpr::TEntry {
            timing: Timing::Pre,
            item: item.clone(),
        };
        let untimed = TExpr::TEntry {
            timing: Timing::Neither,
            item,
        };
        let expr = TExpr::Eq {
            tag: ActType::AInteger,
            lhs: Box::new(already_pre),
            rhs: Box::new(untimed),
        };
        let timed = expr.set_time(Timing::Post);
        let mut timings = Vec::new();
        timed.for_each_entry(&mut |t, _| timings.push(*t));
        assert_eq!(timings, vec![Timing::Pre, Timing::Post]);
    }
}
