//! CLI-level checks against the fixtures under `act-core/tests/fixtures/`
//! (spec.md §8, scenario 1 and 3), limited to subcommands that don't need
//! a live solver. `prove` against a real binary is covered by
//! `act-solver`'s `#[ignore]`d tests instead.

use std::path::Path;

use act_cli::commands;

const TOKEN_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../crates/act-core/tests/fixtures/token.act");
const AMM_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../crates/act-core/tests/fixtures/amm.act");

#[test]
fn token_fixture_lexes_parses_and_typechecks_cleanly() {
    let path = Path::new(TOKEN_FIXTURE);
    assert_eq!(commands::run_lex(path), commands::EXIT_OK);
    assert_eq!(commands::run_parse(path), commands::EXIT_OK);
    assert_eq!(commands::run_type(path, true), commands::EXIT_OK);
    assert_eq!(commands::run_type(path, false), commands::EXIT_OK);
}

#[test]
fn amm_fixture_lexes_parses_and_typechecks_cleanly() {
    let path = Path::new(AMM_FIXTURE);
    assert_eq!(commands::run_lex(path), commands::EXIT_OK);
    assert_eq!(commands::run_parse(path), commands::EXIT_OK);
    assert_eq!(commands::run_type(path, true), commands::EXIT_OK);
}
