//! Lexer, parser, and untyped AST for the Act specification language
//! (components C2 and C3).
//!
//! ```
//! use act_syntax::{lexer::Lexer, parser};
//!
//! let src = "behaviour transfer of Token\ninterface transfer(uint256 value)\nstorage\n  balanceOf[CALLER] => balanceOf[CALLER] - value\n";
//! let (tokens, lex_diags) = Lexer::new(src).tokenize();
//! assert!(lex_diags.is_empty());
//! let (program, parse_diags) = parser::parse(tokens);
//! assert!(parse_diags.is_empty());
//! assert_eq!(program.len(), 1);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod token;

pub use ast::{RawBehaviour, RawProgram};
pub use token::{Token, TokenKind};
