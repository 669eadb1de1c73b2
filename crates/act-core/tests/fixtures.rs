//! End-to-end scenarios over the `.act` fixtures under `tests/fixtures/`
//! (spec.md §8's numbered scenarios, to the extent they don't need a live
//! solver binary — those are exercised at the CLI/solver layer instead).

use act_core::claim::{split_claims, Claim, ClaimKind};
use act_core::types::ActType;
use act_syntax::lexer::Lexer;
use act_syntax::parser;

const TOKEN_SRC: &str = include_str!("fixtures/token.act");
const AMM_SRC: &str = include_str!("fixtures/amm.act");

fn compile(src: &str) -> act_core::CompileResult {
    let (tokens, lex_diags) = Lexer::new(src).tokenize();
    assert!(lex_diags.is_empty(), "{lex_diags}");
    let (program, parse_diags) = parser::parse(tokens);
    assert!(parse_diags.is_empty(), "{parse_diags}");
    act_core::compile(&program)
}

#[test]
fn token_fixture_typechecks_with_the_five_slots_from_scenario_1() {
    let result = compile(TOKEN_SRC);
    assert!(result.diagnostics.is_empty(), "{}", result.diagnostics);
    let act = result.act.expect("well-typed program must produce an Act");

    let token = act.contract("Token").expect("Token contract");
    let mut slots: Vec<&str> = act.store.slots("Token").map(|(name, _)| name).collect();
    slots.sort();
    assert_eq!(
        slots,
        vec!["allowance", "balanceOf", "name", "symbol", "totalSupply"]
    );

    assert_eq!(token.constructor.invariants.len(), 1);
    assert_eq!(token.behaviours.len(), 2);
}

#[test]
fn token_fixture_splits_into_pass_and_fail_claims_plus_one_invariant() {
    let result = compile(TOKEN_SRC);
    let act = result.act.expect("well-typed program must produce an Act");
    let claims = split_claims(&act);

    let transfer_claims: Vec<&Claim> = claims
        .iter()
        .filter(|c| matches!(c, Claim::Behaviour(b) if b.name == "transfer"))
        .collect();
    // `transfer`'s `iff` is non-empty, so scenario 1 expects exactly one
    // Pass and one Fail claim per case (spec.md §4.4).
    assert_eq!(transfer_claims.len(), 2);
    assert!(transfer_claims
        .iter()
        .any(|c| matches!(c, Claim::Behaviour(b) if b.kind == ClaimKind::Pass)));
    assert!(transfer_claims
        .iter()
        .any(|c| matches!(c, Claim::Behaviour(b) if b.kind == ClaimKind::Fail)));

    // `approve` has no `iff`, so it yields a single Pass claim.
    let approve_claims: Vec<&Claim> = claims
        .iter()
        .filter(|c| matches!(c, Claim::Behaviour(b) if b.name == "approve"))
        .collect();
    assert_eq!(approve_claims.len(), 1);

    let invariant_claims: Vec<&Claim> =
        claims.iter().filter(|c| matches!(c, Claim::Invariant(_))).collect();
    assert_eq!(invariant_claims.len(), 1);
}

#[test]
fn amm_fixture_typechecks_and_yields_a_single_swap0_postcondition_claim() {
    let result = compile(AMM_SRC);
    assert!(result.diagnostics.is_empty(), "{}", result.diagnostics);
    let act = result.act.expect("well-typed program must produce an Act");

    let amm = act.contract("Amm").expect("Amm contract");
    assert_eq!(amm.behaviours.len(), 1);
    assert_eq!(amm.behaviours[0].postconditions.len(), 1);

    let claims = split_claims(&act);
    let swap_claims: Vec<&Claim> = claims
        .iter()
        .filter(|c| matches!(c, Claim::Behaviour(b) if b.name == "swap0"))
        .collect();
    assert_eq!(swap_claims.len(), 1, "swap0 has no iff, so only a Pass claim is emitted");
}

#[test]
fn amm_reserves_are_typed_as_integers() {
    let result = compile(AMM_SRC);
    let act = result.act.expect("well-typed program must produce an Act");
    let slot = act.store.slot("Amm", "reserveX").expect("reserveX slot");
    assert_eq!(slot.value_type().act_type(), ActType::AInteger);
}

#[test]
fn scenario_4_duplicate_slot_reports_two_errors_and_produces_no_act() {
    let result = compile(
        "constructor of Token\n\
         interface constructor()\n\
         creates\n  uint256 x := 1\n  uint256 x := 2\n",
    );
    assert!(result.act.is_none());
    assert!(result.diagnostics.len() >= 2, "{}", result.diagnostics);
}

#[test]
fn scenario_5_illegal_storage_read_in_creates_reports_one_error() {
    let result = compile(
        "constructor of Token\n\
         interface constructor()\n\
         creates\n  uint256 balanceOf := 0\n  uint256 x := balanceOf\n",
    );
    assert!(result.act.is_none());
    assert!(!result.diagnostics.is_empty());
}

#[test]
fn scenario_6_timing_mismatch_in_precondition_is_rejected() {
    let result = compile(
        "constructor of Token\ninterface constructor()\ncreates\n  uint256 totalSupply := 0\n\
         behaviour noop of Token\n\
         interface noop()\n\
         iff\n  pre(totalSupply) >= 0\n",
    );
    assert!(result.act.is_none());
    assert!(!result.diagnostics.is_empty());
}
