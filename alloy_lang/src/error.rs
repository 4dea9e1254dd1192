//! The one error taxonomy in this crate that's a true `Result` error rather
//! than an accumulated [`crate::diagnostic::Diagnostic`] (§7): encoding
//! failures, which can only arise from a bug earlier in the pipeline (a
//! name analysis should have rejected, or a cardinality operator applied to
//! an arity the analyzer should have already flagged).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("encoder reference to undefined name '{name}' after analysis")]
    UndefinedName { name: String },

    #[error("cardinality operator applied to unsupported arity {arity}")]
    UnsupportedCardinalityArity { arity: usize },

    #[error("underlying solver error: {0:?}")]
    Solver(#[from] alloy_sat::types::err::ErrorKind),
}
