//! Solver errors: reported per-query, never fatal to the rest of a
//! session unless the subprocess itself has died.

use std::fmt;

/// A failure in the solver subprocess or its protocol. Mirrors
/// `VerificationError`'s one-struct-per-category shape but without the
/// license/refinement variants, which have no counterpart here.
#[derive(Debug)]
pub enum SolverError {
    /// The solver binary could not be spawned (missing executable, bad
    /// permissions, ...).
    SpawnFailed { solver: String, reason: String },
    /// The preamble or a declaration line was rejected: the solver
    /// returned something other than `success`.
    DeclarationRejected { line: String, response: String },
    /// `(check-sat)` (or a `get-value` call) returned a line this driver
    /// doesn't recognize.
    UnrecognizedResponse { response: String },
    /// The subprocess exited or its pipes closed while a query was in
    /// flight.
    ProcessDied,
    /// Reading or writing the subprocess's pipes failed.
    Io(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::SpawnFailed { solver, reason } => {
                write!(f, "failed to start solver '{solver}': {reason}")
            }
            SolverError::DeclarationRejected { line, response } => {
                write!(f, "solver rejected '{line}': {response}")
            }
            SolverError::UnrecognizedResponse { response } => {
                write!(f, "unrecognized solver response: {response}")
            }
            SolverError::ProcessDied => write!(f, "solver subprocess is no longer running"),
            SolverError::Io(msg) => write!(f, "I/O error talking to solver: {msg}"),
        }
    }
}

impl std::error::Error for SolverError {}

impl From<std::io::Error> for SolverError {
    fn from(e: std::io::Error) -> Self {
        SolverError::Io(e.to_string())
    }
}
