//! Argument parsing for the `act` binary (spec.md §6 CLI surface, made
//! concrete per SPEC_FULL.md §6).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "act")]
#[command(about = "Verification front-end for the Act specification language")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the token stream produced by the lexer (C2).
    Lex {
        /// The `.act` source file to tokenize.
        file: PathBuf,
    },

    /// Print the untyped AST produced by the parser (C3), in debug form.
    Parse {
        /// The `.act` source file to parse.
        file: PathBuf,
    },

    /// Typecheck the program and print the typed `Program` tree.
    Type {
        /// The `.act` source file to typecheck.
        file: PathBuf,

        /// Emit the typed program as the JSON tree described in spec.md §6
        /// instead of the default debug rendering.
        #[arg(long)]
        json: bool,
    },

    /// Typecheck, synthesize proof obligations, and discharge each one
    /// against a persistent SMT solver session.
    Prove {
        /// The `.act` source file to verify.
        file: PathBuf,

        /// Which SMT solver to drive.
        #[arg(long, default_value = "z3")]
        solver: String,

        /// Per-query solver timeout, in milliseconds.
        #[arg(long, default_value_t = 20_000)]
        smttimeout: u64,

        /// Echo every query's full SMT-LIB2 text before dispatching it.
        #[arg(long)]
        debug: bool,
    },

    /// Emit a Coq proof script. Not implemented by this workspace (spec.md
    /// §1: output back-ends are external collaborators).
    Coq { file: PathBuf },

    /// Emit a K Framework specification. Not implemented by this workspace.
    K { file: PathBuf },

    /// Emit a HEVM equivalence harness. Not implemented by this workspace.
    Hevm { file: PathBuf },
}
