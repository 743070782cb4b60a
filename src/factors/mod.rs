//! Factor families that plug into the elimination engine.
//!
//! The engine in [`crate::inference`] is generic over [`EliminableFactor`](crate::core::EliminableFactor).
//! Two families ship with the crate:
//!
//! ## Symbolic
//! - [`SymbolicFactor`] / [`SymbolicConditional`]: structure only. Eliminating a symbolic graph
//!   yields the sparsity pattern of the Bayes net, which is what ordering heuristics and fill-in
//!   analysis need.
//!
//! ## Gaussian
//! - [`GaussianFactor`] / [`GaussianConditional`]: a quadratic factor in information form
//!   over block variables of arbitrary dimension.
//!
//! ```text
//! f(x) = ½ xᵀ Λ x - ηᵀ x
//! ```
//!
//!   Eliminating variable `x` from the combined factor splits `Λ` into frontal and separator
//!   blocks, takes a Cholesky factor of the frontal block and leaves the Schur complement on the
//!   separator.
//!
//! Both families treat the key order inside a factor as its column order, which is exactly
//! what [`VariableSlots`](crate::core::VariableSlots) records.

use thiserror::Error;
use tracing::error;

use crate::core::Key;

pub mod gaussian;
pub mod symbolic;

pub use gaussian::{GaussianConditional, GaussianFactor};
pub use symbolic::{SymbolicConditional, SymbolicFactor};

/// Factor-specific error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactorError {
    /// Combine-and-eliminate was called without any factor
    #[error("Cannot eliminate variable {variable}: no factors to combine")]
    EmptyCombination { variable: Key },

    /// The variable being eliminated does not appear in the combined factors
    #[error("Cannot eliminate variable {variable}: it is not mentioned by the combined factors")]
    TargetNotInScope { variable: Key },

    /// Two factors disagree on the dimension of a shared variable
    #[error("Dimension mismatch for variable {variable}: expected {expected}, got {actual}")]
    DimensionMismatch {
        variable: Key,
        expected: usize,
        actual: usize,
    },

    /// Malformed factor at construction time
    #[error("Invalid factor: {0}")]
    InvalidFactor(String),

    /// The frontal information block is not positive definite
    #[error("Frontal block of variable {variable} is not positive definite (indeterminant system)")]
    NotPositiveDefinite { variable: Key },
}

impl FactorError {
    /// Log the error with tracing::error and return self for chaining
    ///
    /// This method allows for a consistent error logging pattern throughout
    /// the factors module, ensuring all errors are properly recorded.
    ///
    /// # Example
    /// ```ignore
    /// operation()
    ///     .map_err(|e| FactorError::from(e).log())?;
    /// ```
    #[must_use]
    pub fn log(self) -> Self {
        error!("{}", self);
        self
    }
}

/// Result type for factor operations
pub type FactorResult<T> = Result<T, FactorError>;
