//! The `act` command-line front-end: thin argument parsing and dispatch
//! over the `act-*` library crates (spec.md §6's "CLI surface", carried
//! into this workspace per SPEC_FULL.md §1 as the one binary target).
//!
//! The core pipeline — lex, parse, typecheck, synthesize, prove — lives
//! entirely in `act-syntax`/`act-core`/`act-query`/`act-solver`; this
//! crate only renders their output for a terminal and maps outcomes to
//! exit codes.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
