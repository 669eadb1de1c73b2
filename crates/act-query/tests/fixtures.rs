//! Query synthesis over the same `.act` fixtures act-core's end-to-end
//! tests use (spec.md §8 scenarios 1 and 3), checked without a solver:
//! every synthesized query must render valid-looking SMT-LIB2 text and
//! carry no internal errors.

use act_core::claim::split_claims;
use act_query::synthesize;
use act_syntax::lexer::Lexer;
use act_syntax::parser;

const TOKEN_SRC: &str = include_str!("../../act-core/tests/fixtures/token.act");
const AMM_SRC: &str = include_str!("../../act-core/tests/fixtures/amm.act");

fn compile(src: &str) -> act_core::act::Act {
    let (tokens, lex_diags) = Lexer::new(src).tokenize();
    assert!(lex_diags.is_empty(), "{lex_diags}");
    let (program, parse_diags) = parser::parse(tokens);
    assert!(parse_diags.is_empty(), "{parse_diags}");
    let result = act_core::compile(&program);
    assert!(result.diagnostics.is_empty(), "{}", result.diagnostics);
    result.act.unwrap()
}

#[test]
fn token_fixture_synthesizes_postcondition_and_invariant_queries_with_no_internal_errors() {
    let act = compile(TOKEN_SRC);
    let claims = split_claims(&act);
    let (queries, errors) = synthesize(&act, &claims);

    assert!(errors.is_empty(), "{errors:?}");
    assert!(!queries.is_empty());

    // Every query must declare at least one constant and assert at least
    // one fact, and its rendered text must close every paren it opens —
    // a cheap but effective sanity check on SMT-LIB2 syntax.
    for query in &queries {
        assert!(!query.declarations.is_empty(), "{}", query.kind);
        assert!(!query.assertions.is_empty(), "{}", query.kind);
        let rendered = query.render();
        let opens = rendered.matches('(').count();
        let closes = rendered.matches(')').count();
        assert_eq!(opens, closes, "unbalanced parens in {}:\n{rendered}", query.kind);
    }
}

#[test]
fn amm_fixture_swap0_postcondition_query_references_both_reserve_slots() {
    let act = compile(AMM_SRC);
    let claims = split_claims(&act);
    let (queries, errors) = synthesize(&act, &claims);
    assert!(errors.is_empty(), "{errors:?}");

    let swap_query = queries
        .iter()
        .find(|q| q.kind.to_string().contains("swap0"))
        .expect("a postcondition query for swap0 must be synthesized");

    let rendered = swap_query.render();
    assert!(rendered.contains("Amm_reserveX_Pre"));
    assert!(rendered.contains("Amm_reserveX_Post"));
    assert!(rendered.contains("Amm_reserveY_Pre"));
    assert!(rendered.contains("Amm_reserveY_Post"));
}
