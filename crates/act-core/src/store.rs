//! Store discovery (C4): a pure pass over every constructor's `creates`
//! block, building the global slot schema before the typechecker needs it.

use std::collections::{HashMap, HashSet};

use act_base::{Diagnostics, Span};
use act_syntax::ast::{RawBehaviour, RawCreateAssign, RawProgram};

use crate::types::{AbiType, SlotType, Store};

/// Walks `program`, collecting every contract's slot declarations into a
/// [`Store`]. Duplicate contract (two constructors for one name) or
/// duplicate slot (two `creates` entries with the same name) are
/// accumulated as diagnostics rather than aborting discovery, so later
/// passes still see as complete a store as could be built. spec.md §8
/// scenario 4 requires two diagnostics for a duplicate slot — one at the
/// original declaration, one at the colliding one — so the first-seen span
/// of each `(contract, slot)` pair is tracked here rather than only
/// reporting the second occurrence.
pub fn discover(program: &RawProgram) -> (Store, Diagnostics) {
    let mut store = Store::new();
    let mut diags = Diagnostics::new();
    let mut seen_contracts = HashSet::new();
    let mut first_slot_span: HashMap<(String, String), Span> = HashMap::new();

    for decl in program {
        let RawBehaviour::Definition(ctor) = decl else {
            continue;
        };

        if !seen_contracts.insert(ctor.contract.clone()) {
            diags.push(ctor.span, format!("duplicate constructor for contract '{}'", ctor.contract));
        }
        store.declare_contract(&ctor.contract);

        for assign in &ctor.creates {
            match assign {
                RawCreateAssign::Value { ty, name, span, .. } => {
                    let slot_ty = SlotType::Value(AbiType::from_raw(ty));
                    if !store.declare_slot(&ctor.contract, name, slot_ty) {
                        report_duplicate_slot(&mut diags, &mut first_slot_span, &ctor.contract, name, *span);
                    } else {
                        first_slot_span.insert((ctor.contract.clone(), name.clone()), *span);
                    }
                }
                RawCreateAssign::Mapping {
                    ty_keys,
                    ty_val,
                    name,
                    span,
                    ..
                } => {
                    let keys = ty_keys.iter().map(AbiType::from_raw).collect();
                    let value = AbiType::from_raw(ty_val);
                    let slot_ty = SlotType::mapping(keys, value);
                    if !store.declare_slot(&ctor.contract, name, slot_ty) {
                        report_duplicate_slot(&mut diags, &mut first_slot_span, &ctor.contract, name, *span);
                    } else {
                        first_slot_span.insert((ctor.contract.clone(), name.clone()), *span);
                    }
                }
                RawCreateAssign::Struct { name, span } => {
                    // No declared type to record; referencing this slot
                    // later surfaces as `InternalError::StructCreateAssignment`
                    // when the typechecker elaborates this `creates` entry.
                    let _ = (name, span);
                }
            }
        }
    }

    (store, diags)
}

/// Pushes a diagnostic at the duplicate declaration's span and, the first
/// time this `(contract, slot)` pair collides, also pushes one at the
/// original declaration's span (spec.md §8 scenario 4: "two errors at the
/// two declarations"). The entry is removed from `first_slot_span` after
/// its first collision so a third declaration of the same slot reports
/// only itself, not the original a second time.
fn report_duplicate_slot(
    diags: &mut Diagnostics,
    first_slot_span: &mut HashMap<(String, String), Span>,
    contract: &str,
    name: &str,
    span: Span,
) {
    let key = (contract.to_string(), name.to_string());
    if let Some(original_span) = first_slot_span.remove(&key) {
        diags.push(original_span, format!("duplicate slot '{name}' in contract '{contract}'"));
    }
    diags.push(span, format!("duplicate slot '{name}' in contract '{contract}'"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_syntax::{lexer::Lexer, parser};

    fn discover_src(src: &str) -> (Store, Diagnostics) {
        let (tokens, lex_diags) = Lexer::new(src).tokenize();
        assert!(lex_diags.is_empty());
        let (program, parse_diags) = parser::parse(tokens);
        assert!(parse_diags.is_empty(), "{parse_diags}");
        discover(&program)
    }

    #[test]
    fn collects_value_and_mapping_slots() {
        let (store, diags) = discover_src(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n  mapping(address) uint256 balanceOf := {[CALLER] => supply}\n",
        );
        assert!(diags.is_empty());
        assert_eq!(store.slot("Token", "totalSupply"), Some(&SlotType::Value(AbiType::Uint(256))));
        assert_eq!(
            store.slot("Token", "balanceOf"),
            Some(&SlotType::mapping(vec![AbiType::Address], AbiType::Uint(256)))
        );
    }

    #[test]
    fn reports_duplicate_slot_without_aborting() {
        let (store, diags) = discover_src(
            "constructor of Token\n\
             interface constructor()\n\
             creates\n  uint256 x := 1\n  uint256 x := 2\n",
        );
        assert_eq!(diags.len(), 2);
        assert!(store.slot("Token", "x").is_some());
    }

    #[test]
    fn reports_duplicate_contract() {
        let (_, diags) = discover_src(
            "constructor of Token\ninterface constructor()\ncreates\n  uint256 x := 1\n\
             constructor of Token\ninterface constructor()\ncreates\n  uint256 y := 2\n",
        );
        assert_eq!(diags.len(), 1);
    }
}
