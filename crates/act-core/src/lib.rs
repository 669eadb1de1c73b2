//! Store discovery, typechecker/elaborator, typed AST, traversal
//! utilities, and the constant evaluator for the Act specification
//! language (components C4, C5, C6, C9).
//!
//! The pipeline entry point is [`compile`]: it chains store discovery
//! ([`store::discover`]) and typechecking ([`typeck::typecheck`]) and
//! returns either a fully typed [`act::Act`] or the accumulated
//! diagnostics, matching spec §7's rule that a type-incorrect spec must
//! never reach the query synthesizer.

pub mod act;
pub mod claim;
pub mod error;
pub mod eval;
pub mod expr;
pub mod storage;
pub mod store;
pub mod traverse;
pub mod typeck;
pub mod types;

use act_syntax::ast::RawProgram;

pub use act::Act;
pub use error::InternalError;
pub use typeck::{Diagnostic, Diagnostics, TypeErrorKind};

/// The outcome of running the full C4 → C5 pipeline over a parsed program.
pub struct CompileResult {
    pub act: Option<Act>,
    pub diagnostics: Diagnostics,
    pub internal_error: Option<InternalError>,
}

/// Runs store discovery followed by typechecking over an already-parsed
/// [`RawProgram`]. Store-discovery diagnostics (duplicate contracts,
/// duplicate slots) and typechecker diagnostics are merged into one bag;
/// per spec §7, user errors accumulate across the whole pass and the
/// pipeline does not proceed to query synthesis while any remain.
pub fn compile(program: &RawProgram) -> CompileResult {
    let (store, store_diags) = store::discover(program);
    let result = typeck::typecheck(program, &store);

    let mut diagnostics = Diagnostics::new();
    for d in store_diags.iter() {
        diagnostics.push_from(d);
    }
    for d in result.diagnostics.iter() {
        diagnostics.push_raw(d.clone());
    }

    let act = if diagnostics.is_empty() { result.act } else { None };

    CompileResult {
        act,
        diagnostics,
        internal_error: result.internal_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_syntax::{lexer::Lexer, parser};

    fn parse_src(src: &str) -> RawProgram {
        let (tokens, lex_diags) = Lexer::new(src).tokenize();
        assert!(lex_diags.is_empty());
        let (program, parse_diags) = parser::parse(tokens);
        assert!(parse_diags.is_empty(), "{parse_diags}");
        program
    }

    #[test]
    fn compile_succeeds_on_well_typed_program() {
        let program = parse_src(
            "constructor of Token\n\
             interface constructor(uint256 supply)\n\
             creates\n  uint256 totalSupply := supply\n\
             behaviour mint of Token\n\
             interface mint(uint256 amount)\n\
             storage\n  totalSupply => totalSupply + amount\n",
        );
        let result = compile(&program);
        assert!(result.act.is_some());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn compile_surfaces_store_discovery_errors_without_producing_an_act() {
        let program = parse_src(
            "constructor of Token\n\
             interface constructor()\n\
             creates\n  uint256 x := 1\n  uint256 x := 2\n",
        );
        let result = compile(&program);
        assert!(result.act.is_none());
        assert!(!result.diagnostics.is_empty());
    }
}
