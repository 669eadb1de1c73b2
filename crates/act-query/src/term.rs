//! Renders a typed expression into an SMT-LIB2 term (spec §4.6).
//!
//! Two things can make this fail, both internal errors (spec §7's third
//! kind, §9's open questions): a symbolic exponent with no concrete
//! operand to expand against, and a cross-contract `SField` access, which
//! the SMT encoder has no model for.

use num_bigint::BigInt;

use act_core::eval::{self, Value};
use act_core::error::InternalError;
use act_core::expr::TExpr;
use act_core::storage::StorageRef;
use act_core::types::Timing;

use crate::naming;

/// Renders `e` to its SMT-LIB2 term. `e` must already be fully timed
/// (every `TEntry`'s timing is `Pre` or `Post`, never `Neither`) — that is
/// guaranteed by the typechecker's `setTime` discipline (spec §3) before
/// any expression reaches this crate.
pub fn render(e: &TExpr) -> Result<String, InternalError> {
    match e {
        TExpr::IntLit(v) => Ok(naming::int_literal(v)),
        TExpr::BoolLit(b) => Ok(b.to_string()),
        TExpr::ByteStrLit(s) => Ok(format!("{s:?}")),
        TExpr::EnvVar(ev) => Ok(ev.smt_name().to_string()),
        TExpr::Var { name, .. } => Ok(name.clone()),
        TExpr::TEntry { timing, item } => render_entry(*timing, &item.storage_ref),

        TExpr::Not(a) => Ok(format!("(not {})", render(a)?)),
        TExpr::Neg(a) => Ok(format!("(- {})", render(a)?)),

        TExpr::Add(a, b) => bin("+", a, b),
        TExpr::Sub(a, b) => bin("-", a, b),
        TExpr::Mul(a, b) => bin("*", a, b),
        TExpr::Div(a, b) => bin("div", a, b),
        TExpr::Mod(a, b) => bin("mod", a, b),
        TExpr::Exp(a, b) => render_exp(a, b),

        TExpr::Concat(a, b) => bin("str.++", a, b),

        TExpr::Lt(a, b) => bin("<", a, b),
        TExpr::Le(a, b) => bin("<=", a, b),
        TExpr::Gt(a, b) => bin(">", a, b),
        TExpr::Ge(a, b) => bin(">=", a, b),

        TExpr::And(a, b) => bin("and", a, b),
        TExpr::Or(a, b) => bin("or", a, b),

        TExpr::Eq { lhs, rhs, .. } => bin("=", lhs, rhs),
        TExpr::NEq { lhs, rhs, .. } => Ok(format!("(not (= {} {}))", render(lhs)?, render(rhs)?)),

        TExpr::Ite {
            cond,
            then_branch,
            else_branch,
            ..
        } => Ok(format!(
            "(ite {} {} {})",
            render(cond)?,
            render(then_branch)?,
            render(else_branch)?
        )),

        TExpr::InRange { expr, ty } => render_in_range(expr, ty),
    }
}

fn bin(op: &str, a: &TExpr, b: &TExpr) -> Result<String, InternalError> {
    Ok(format!("({op} {} {})", render(a)?, render(b)?))
}

/// A storage reference, nested by mapping index via SMT-LIB `select`.
/// `contract()`/`slot_name()` identify the base array/constant; each
/// `SMapping` hop wraps the parent in one more `select`.
fn render_entry(timing: Timing, r: &StorageRef) -> Result<String, InternalError> {
    match r {
        StorageRef::SVar { contract, name, .. } => Ok(naming::storage_name(contract, name, timing)),
        StorageRef::SMapping { parent, index, .. } => {
            let base = render_entry(timing, parent)?;
            let idx = render(index)?;
            Ok(format!("(select {base} {idx})"))
        }
        StorageRef::SField { span, .. } => Err(InternalError::CrossContractAccess { span: *span }),
    }
}

/// Exponentiation has no native SMT-LIB operator (spec §4.6): if the
/// exponent folds to a concrete non-negative literal, expand into a chain
/// of multiplications; otherwise this is an internal error, since the
/// query synthesizer has nothing to expand against (spec §9).
fn render_exp(base: &TExpr, exp: &TExpr) -> Result<String, InternalError> {
    let span = exponent_span(exp);
    let Some(Value::Int(n)) = eval::eval(exp) else {
        return Err(InternalError::SymbolicExponent { span });
    };
    let Ok(n): Result<u64, _> = n.try_into() else {
        return Err(InternalError::SymbolicExponent { span });
    };

    if let Some(Value::Int(b)) = eval::eval(base) {
        // Both operands concrete: fold fully rather than emitting a huge
        // multiplication chain of literals.
        let folded = num_traits_pow(&b, n);
        return Ok(naming::int_literal(&folded));
    }

    let base_term = render(base)?;
    if n == 0 {
        return Ok("1".to_string());
    }
    let mut acc = base_term.clone();
    for _ in 1..n {
        acc = format!("(* {acc} {base_term})");
    }
    Ok(acc)
}

fn num_traits_pow(b: &BigInt, n: u64) -> BigInt {
    let mut acc = BigInt::from(1);
    for _ in 0..n {
        acc *= b;
    }
    acc
}

/// `Exp`'s AST has no span of its own (spec §4.6 treats the whole `a ^ b`
/// node as the error site); the best available anchor is wherever the
/// exponent's own storage entries point, falling back to a default span
/// when the exponent is a pure literal/env expression with nothing to
/// anchor to.
fn exponent_span(exp: &TExpr) -> act_base::Span {
    let mut span = None;
    exp.for_each_entry(&mut |_t, item| {
        if span.is_none() {
            span = Some(item.storage_ref.span());
        }
    });
    span.unwrap_or_default()
}

fn render_in_range(expr: &TExpr, ty: &act_core::types::AbiType) -> Result<String, InternalError> {
    let inner = render(expr)?;
    match naming::in_range_bounds(ty) {
        Some((lo, hi)) => Ok(format!(
            "(and (>= {inner} {}) (<= {inner} {}))",
            naming::int_literal(&lo),
            naming::int_literal(&hi)
        )),
        None => Ok("true".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_core::storage::StorageItem;
    use act_core::types::{AbiType, ActType};

    fn totalsupply_entry(timing: Timing) -> TExpr {
        TExpr::TEntry {
            timing,
            item: StorageItem {
                act_type: ActType::AInteger,
                value_type: AbiType::Uint(256),
                storage_ref: StorageRef::SVar {
                    contract: "Token".into(),
                    name: "totalSupply".into(),
                    span: act_base::Span::default(),
                },
            },
        }
    }

    #[test]
    fn renders_storage_entry_with_timing_suffix() {
        assert_eq!(render(&totalsupply_entry(Timing::Pre)).unwrap(), "Token_totalSupply_Pre");
        assert_eq!(render(&totalsupply_entry(Timing::Post)).unwrap(), "Token_totalSupply_Post");
    }

    #[test]
    fn renders_negative_literal_portably() {
        let e = TExpr::IntLit(BigInt::from(-3));
        assert_eq!(render(&e).unwrap(), "(- 3)");
    }

    #[test]
    fn expands_concrete_exponent_into_multiplication_chain() {
        let e = TExpr::Exp(Box::new(totalsupply_entry(Timing::Pre)), Box::new(TExpr::IntLit(BigInt::from(3))));
        assert_eq!(render(&e).unwrap(), "(* (* Token_totalSupply_Pre Token_totalSupply_Pre) Token_totalSupply_Pre)");
    }

    #[test]
    fn folds_fully_concrete_exponent() {
        let e = TExpr::Exp(Box::new(TExpr::IntLit(BigInt::from(2))), Box::new(TExpr::IntLit(BigInt::from(8))));
        assert_eq!(render(&e).unwrap(), "256");
    }

    #[test]
    fn rejects_symbolic_exponent() {
        let e = TExpr::Exp(Box::new(TExpr::IntLit(BigInt::from(2))), Box::new(totalsupply_entry(Timing::Pre)));
        assert!(matches!(render(&e), Err(InternalError::SymbolicExponent { .. })));
    }

    #[test]
    fn renders_select_for_mapping_index() {
        let item = StorageItem {
            act_type: ActType::AInteger,
            value_type: AbiType::Uint(256),
            storage_ref: StorageRef::SMapping {
                parent: Box::new(StorageRef::SVar {
                    contract: "Token".into(),
                    name: "balanceOf".into(),
                    span: act_base::Span::default(),
                }),
                index: Box::new(TExpr::EnvVar(act_syntax::token::EnvVar::Caller)),
                span: act_base::Span::default(),
            },
        };
        let e = TExpr::TEntry {
            timing: Timing::Pre,
            item,
        };
        assert_eq!(render(&e).unwrap(), "(select Token_balanceOf_Pre caller)");
    }
}
