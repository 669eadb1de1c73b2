//! Constant evaluator (C9): a partial function on typed expressions that
//! folds a sub-expression to a concrete value when every leaf is a
//! literal, no environment variable appears, and no storage entry
//! appears.
//!
//! This is needed in two places downstream: the query synthesizer's
//! symbolic-exponent elimination (spec §4.6 — `x ^ n` is expanded into a
//! chain of multiplications only when `n`, or both operands, fold to a
//! concrete value) and diagnostic rendering, where a constant sub-term is
//! worth showing pre-folded to the user.

use num_bigint::BigInt;

use crate::expr::TExpr;

/// A constant-folded value. Bytestrings fold to their literal bytes;
/// `Create` (not yet a construct in this AST — spec §9 notes it is never
/// evaluable even in the original) and any expression touching storage or
/// an environment variable never produce a `Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(BigInt),
    Bool(bool),
    ByteStr(String),
}

impl Value {
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Attempts to fold `expr` to a concrete [`Value`]. Returns `None` the
/// moment any sub-expression reads storage, an environment variable, or an
/// unresolved calldata variable — those are exactly the cases spec §4.8
/// excludes ("leaves are literals, env lookups are absent, and no storage
/// entries appear").
pub fn eval(expr: &TExpr) -> Option<Value> {
    match expr {
        TExpr::IntLit(v) => Some(Value::Int(v.clone())),
        TExpr::BoolLit(b) => Some(Value::Bool(*b)),
        TExpr::ByteStrLit(s) => Some(Value::ByteStr(s.clone())),
        TExpr::EnvVar(_) | TExpr::Var { .. } | TExpr::TEntry { .. } => None,

        TExpr::Not(e) => Some(Value::Bool(!eval(e)?.as_bool()?)),
        TExpr::Neg(e) => Some(Value::Int(-eval(e)?.as_int()?.clone())),

        TExpr::Add(a, b) => int_op(a, b, |x, y| Some(x + y)),
        TExpr::Sub(a, b) => int_op(a, b, |x, y| Some(x - y)),
        TExpr::Mul(a, b) => int_op(a, b, |x, y| Some(x * y)),
        TExpr::Div(a, b) => int_op(a, b, |x, y| if y == BigInt::from(0) { None } else { Some(x / y) }),
        TExpr::Mod(a, b) => int_op(a, b, |x, y| if y == BigInt::from(0) { None } else { Some(x % y) }),
        TExpr::Exp(a, b) => {
            let base = eval(a)?.as_int()?.clone();
            let exp = eval(b)?.as_int()?.clone();
            if exp.sign() == num_bigint::Sign::Minus {
                return None;
            }
            let exp_u32: u32 = exp.to_string().parse().ok()?;
            Some(Value::Int(base.pow(exp_u32)))
        }

        TExpr::Concat(a, b) => {
            let l = eval(a)?;
            let r = eval(b)?;
            let (Value::ByteStr(l), Value::ByteStr(r)) = (l, r) else {
                return None;
            };
            Some(Value::ByteStr(format!("{l}{r}")))
        }

        TExpr::Lt(a, b) => int_cmp(a, b, |x, y| x < y),
        TExpr::Le(a, b) => int_cmp(a, b, |x, y| x <= y),
        TExpr::Gt(a, b) => int_cmp(a, b, |x, y| x > y),
        TExpr::Ge(a, b) => int_cmp(a, b, |x, y| x >= y),

        TExpr::And(a, b) => Some(Value::Bool(eval(a)?.as_bool()? && eval(b)?.as_bool()?)),
        TExpr::Or(a, b) => Some(Value::Bool(eval(a)?.as_bool()? || eval(b)?.as_bool()?)),

        TExpr::Eq { lhs, rhs, .. } => Some(Value::Bool(eval(lhs)? == eval(rhs)?)),
        TExpr::NEq { lhs, rhs, .. } => Some(Value::Bool(eval(lhs)? != eval(rhs)?)),

        TExpr::Ite {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            if eval(cond)?.as_bool()? {
                eval(then_branch)
            } else {
                eval(else_branch)
            }
        }

        TExpr::InRange { expr, ty } => {
            let v = eval(expr)?.as_int()?.clone();
            Some(Value::Bool(in_abi_range(&v, ty)))
        }
    }
}

fn int_op(a: &TExpr, b: &TExpr, f: impl FnOnce(BigInt, BigInt) -> Option<BigInt>) -> Option<Value> {
    let l = eval(a)?.as_int()?.clone();
    let r = eval(b)?.as_int()?.clone();
    f(l, r).map(Value::Int)
}

fn int_cmp(a: &TExpr, b: &TExpr, f: impl FnOnce(&BigInt, &BigInt) -> bool) -> Option<Value> {
    let l = eval(a)?.as_int()?.clone();
    let r = eval(b)?.as_int()?.clone();
    Some(Value::Bool(f(&l, &r)))
}

fn in_abi_range(v: &BigInt, ty: &crate::types::AbiType) -> bool {
    use crate::types::AbiType;
    use num_bigint::Sign;
    match ty {
        AbiType::Uint(w) => v.sign() != Sign::Minus && *v < (BigInt::from(1) << *w as u64),
        AbiType::Int(w) => {
            let bound = BigInt::from(1) << (*w as u64 - 1);
            *v >= -bound.clone() && *v < bound
        }
        AbiType::Address => v.sign() != Sign::Minus && *v < (BigInt::from(1) << 160u64),
        AbiType::Bytes(_) | AbiType::Bool | AbiType::Contract(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AbiType;

    fn lit(n: i64) -> TExpr {
        TExpr::IntLit(BigInt::from(n))
    }

    #[test]
    fn folds_concrete_arithmetic() {
        let e = TExpr::Add(Box::new(lit(2)), Box::new(TExpr::Mul(Box::new(lit(3)), Box::new(lit(4)))));
        assert_eq!(eval(&e), Some(Value::Int(BigInt::from(14))));
    }

    #[test]
    fn folds_concrete_exponent() {
        let e = TExpr::Exp(Box::new(lit(2)), Box::new(lit(8)));
        assert_eq!(eval(&e), Some(Value::Int(BigInt::from(256))));
    }

    #[test]
    fn returns_none_when_an_env_var_appears() {
        let e = TExpr::Add(Box::new(lit(1)), Box::new(TExpr::EnvVar(act_syntax::token::EnvVar::Caller)));
        assert_eq!(eval(&e), None);
    }

    #[test]
    fn returns_none_on_division_by_zero() {
        let e = TExpr::Div(Box::new(lit(1)), Box::new(lit(0)));
        assert_eq!(eval(&e), None);
    }

    #[test]
    fn in_range_checks_against_abi_bound() {
        let e = TExpr::InRange {
            expr: Box::new(lit(255)),
            ty: AbiType::Uint(8),
        };
        assert_eq!(eval(&e), Some(Value::Bool(true)));
        let e2 = TExpr::InRange {
            expr: Box::new(lit(256)),
            ty: AbiType::Uint(8),
        };
        assert_eq!(eval(&e2), Some(Value::Bool(false)));
    }
}
