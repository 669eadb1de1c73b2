//! Internal errors (spec §7, third error kind): unsupported constructs that
//! abort the pipeline with a stable message rather than a user-facing
//! diagnostic, because the input wasn't wrong, the tool just can't
//! discharge it yet.

use std::fmt;

use act_base::Span;

/// One of the three named unsupported constructs (spec §9's open
/// questions). Raised either while elaborating a constructor's `creates`
/// block (`StructCreateAssignment`) or while synthesizing an SMT query
/// (`SymbolicExponent`, `CrossContractAccess`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// A `creates` entry used the reserved struct-literal shape.
    StructCreateAssignment { name: String, span: Span },
    /// An `Exp` node reached the query synthesizer with neither operand a
    /// concrete literal, so the constant-folding expansion (C9) has
    /// nothing to expand.
    SymbolicExponent { span: Span },
    /// A storage reference crossed into another contract via `SField`.
    /// The SMT encoder has no model for cross-contract state.
    CrossContractAccess { span: Span },
}

impl InternalError {
    pub fn span(&self) -> Span {
        match self {
            InternalError::StructCreateAssignment { span, .. } => *span,
            InternalError::SymbolicExponent { span } => *span,
            InternalError::CrossContractAccess { span } => *span,
        }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalError::StructCreateAssignment { name, span } => {
                write!(
                    f,
                    "{span}: internal error: struct-valued creates assignment for '{name}' is not supported"
                )
            }
            InternalError::SymbolicExponent { span } => {
                write!(
                    f,
                    "{span}: internal error: symbolic exponent has no concrete operand to expand against"
                )
            }
            InternalError::CrossContractAccess { span } => {
                write!(f, "{span}: internal error: cross-contract storage access is not supported")
            }
        }
    }
}

impl std::error::Error for InternalError {}
