//! SMT-LIB2 name and sort conventions (spec §4.6, §6).
//!
//! Every symbolic constant this crate emits follows one of three naming
//! schemes: `<contract>_<slot>_Pre`/`_Post` for storage, `<iface>_<name>`
//! for calldata, and the fixed lowercase spelling from
//! [`act_syntax::token::EnvVar::smt_name`] for environment variables.

use act_core::types::{AbiType, ActType, SlotType, Timing};

/// Renders an [`ActType`] to its SMT-LIB2 sort (spec §4.6's closing rule:
/// `AInteger→Int`, `ABoolean→Bool`, `AByteStr→String`). `AContract` has no
/// SMT counterpart in this model — a contract-typed value is always an
/// address, i.e. `AInteger`, by the time it reaches a typed expression
/// ([`AbiType::act_type`]), so this case is unreachable from any value
/// this crate actually renders.
pub fn sort_of(ty: ActType) -> &'static str {
    match ty {
        ActType::AInteger => "Int",
        ActType::ABoolean => "Bool",
        ActType::AByteStr => "String",
        ActType::AContract => "Int",
    }
}

/// The (possibly nested) SMT-LIB2 `Array` sort for a mapping slot, keyed
/// by each index's act-type in turn (spec §4.6: "each dimension uses the
/// key's act-type as its index sort").
pub fn slot_sort(slot: &SlotType) -> String {
    match slot {
        SlotType::Value(v) => sort_of(v.act_type()).to_string(),
        SlotType::Mapping { keys, value } => {
            let value_sort = sort_of(value.act_type()).to_string();
            keys.iter().rev().fold(value_sort, |inner, key| {
                format!("(Array {} {})", sort_of(key.act_type()), inner)
            })
        }
    }
}

/// The base constant name for one storage slot at a given timing, e.g.
/// `Token_balanceOf_Pre`. For a mapping slot this names the whole array;
/// indexing happens via nested `select` at the use site, not in the name.
pub fn storage_name(contract: &str, slot: &str, timing: Timing) -> String {
    let suffix = match timing {
        Timing::Pre => "Pre",
        Timing::Post => "Post",
        Timing::Neither => unreachable!("a storage reference reaching query synthesis must already be timed"),
    };
    format!("{contract}_{slot}_{suffix}")
}

/// The constant name for one calldata argument, e.g. `transfer_to`.
pub fn calldata_name(iface: &str, arg: &str) -> String {
    format!("{iface}_{arg}")
}

/// Renders an integer literal for SMT-LIB2 portability: negative
/// constants use `(- N)` rather than a bare `-N` token (spec §4.6).
pub fn int_literal(v: &num_bigint::BigInt) -> String {
    use num_bigint::Sign;
    if v.sign() == Sign::Minus {
        format!("(- {})", -v)
    } else {
        v.to_string()
    }
}

/// The ABI in-range predicate for `e in range T` (spec's bitvector-free
/// integer model §1 Non-goals: "integers are modelled as mathematical
/// integers with explicit in-range predicates").
pub fn in_range_bounds(ty: &AbiType) -> Option<(num_bigint::BigInt, num_bigint::BigInt)> {
    use num_bigint::BigInt;
    match ty {
        AbiType::Uint(w) => Some((BigInt::from(0), (BigInt::from(1) << *w as u64) - 1)),
        AbiType::Int(w) => {
            let bound = BigInt::from(1) << (*w as u64 - 1);
            Some((-bound.clone(), bound - 1))
        }
        AbiType::Address => Some((BigInt::from(0), (BigInt::from(1) << 160u64) - 1)),
        AbiType::Bytes(_) | AbiType::Bool | AbiType::Contract(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_name_follows_contract_slot_timing_convention() {
        assert_eq!(storage_name("Token", "totalSupply", Timing::Pre), "Token_totalSupply_Pre");
        assert_eq!(storage_name("Token", "totalSupply", Timing::Post), "Token_totalSupply_Post");
    }

    #[test]
    fn negative_literal_uses_solver_portable_form() {
        assert_eq!(int_literal(&num_bigint::BigInt::from(-5)), "(- 5)");
        assert_eq!(int_literal(&num_bigint::BigInt::from(5)), "5");
    }

    #[test]
    fn mapping_sort_nests_by_key_arity() {
        let slot = SlotType::mapping(vec![AbiType::Address, AbiType::Address], AbiType::Uint(256));
        assert_eq!(slot_sort(&slot), "(Array Int (Array Int Int))");
    }
}
