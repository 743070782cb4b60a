//! Error types for the apex-inference library
//!
//! Each module owns an error enum built with `thiserror`:
//! - **`CoreError`**: contract violations on permutations, the variable index and graph layout
//! - **`EliminationError`**: misuse of the elimination engine (re-elimination, bad bounds, ...)
//! - **`FactorError`**: numeric failures reported by a factor family while combining factors
//!
//! **`InferenceError`** wraps all three transparently and is what the elimination entry points
//! return, so a failure deep inside a factor family surfaces unchanged:
//!
//! ```text
//! InferenceError::Factor(
//!     FactorError::NotPositiveDefinite { variable: 3 }
//! )
//! ```

use std::error::Error as StdError;

use thiserror::Error;

use crate::{core::CoreError, factors::FactorError, inference::EliminationError};

/// Main result type used throughout the apex-inference library
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Top-level error type for the apex-inference library
///
/// # Error Chain Access
///
/// ```rust,ignore
/// if let Err(e) = eliminate(&graph) {
///     warn!("Full chain: {}", e.chain());
/// }
/// ```
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Permutation, slot and index contract violations
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Elimination engine misuse
    #[error(transparent)]
    Elimination(#[from] EliminationError),

    /// Failures reported by a factor family
    #[error(transparent)]
    Factor(#[from] FactorError),
}

impl InferenceError {
    /// Get the full error chain, one cause per line.
    pub fn chain(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();

        while let Some(err) = source {
            chain.push(format!("  → {}", err));
            source = err.source();
        }

        chain.join("\n")
    }

    /// Get a compact single-line error chain for logging
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// error!("Marginal failed: {}", err.chain_compact());
    /// ```
    pub fn chain_compact(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();

        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }

        chain.join(" → ")
    }

    /// True for errors that indicate a caller bug rather than a data condition.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            InferenceError::Core(_) => true,
            InferenceError::Elimination(EliminationError::NoTouchingFactors { .. }) => false,
            InferenceError::Elimination(_) => true,
            InferenceError::Factor(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_display() {
        let error = InferenceError::from(FactorError::NotPositiveDefinite { variable: 3 });
        assert!(error.to_string().contains("not positive definite"));
        assert!(error.to_string().contains('3'));
    }

    #[test]
    fn test_inference_error_chain() {
        let error = InferenceError::from(CoreError::LengthMismatch {
            operation: "partial_apply",
            left: 2,
            right: 3,
        });

        let chain = error.chain();
        assert!(chain.contains("partial_apply"));
        assert!(chain.contains("2 vs 3"));
    }

    #[test]
    fn test_inference_error_chain_compact() {
        let error = InferenceError::from(EliminationError::AlreadyEliminated { variable: 7 });
        let chain_compact = error.chain_compact();
        assert!(chain_compact.contains("already been eliminated"));
    }

    #[test]
    fn test_transparent_error_conversion() {
        let apex_error: InferenceError = EliminationError::NoTouchingFactors { variable: 1 }.into();
        match apex_error {
            InferenceError::Elimination(EliminationError::NoTouchingFactors { variable }) => {
                assert_eq!(variable, 1)
            }
            _ => panic!("Expected Elimination variant"),
        }
    }

    #[test]
    fn test_contract_violation_classification() {
        assert!(
            InferenceError::from(EliminationError::AlreadyEliminated { variable: 0 })
                .is_contract_violation()
        );
        assert!(
            !InferenceError::from(EliminationError::NoTouchingFactors { variable: 0 })
                .is_contract_violation()
        );
        assert!(
            !InferenceError::from(FactorError::EmptyCombination { variable: 0 })
                .is_contract_violation()
        );
    }
}
