//! Variable elimination and ordering.
//!
//! - [`elimination`]: the generic engine (eliminate one variable, a prefix, everything, or
//!   compute a marginal over a subset)
//! - [`ordering`]: oracles that pick the elimination order
//! - [`config`]: knobs shared by the elimination entry points
//!
//! The engine never inspects factor contents. It only moves factors between the graph, the
//! variable index and the capability [`EliminableFactor`](crate::core::EliminableFactor),
//! which does the actual combining.

use thiserror::Error;
use tracing::error;

use crate::core::Key;

pub mod config;
pub mod elimination;
pub mod ordering;

pub use config::{EliminationConfig, EmptyVariablePolicy};
pub use elimination::{
    eliminate, eliminate_one, eliminate_ordered, eliminate_until, eliminate_with_index,
    eliminate_with_oracle, marginal,
};
pub use ordering::{MinimumDegreeOrdering, NaturalOrdering, OrderingOracle};

/// Elimination-specific error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EliminationError {
    /// The variable was already eliminated by an earlier step
    #[error("Variable {variable} has already been eliminated")]
    AlreadyEliminated { variable: Key },

    /// Nothing constrains the variable and the policy rejects that
    #[error("Variable {variable} has no touching factors")]
    NoTouchingFactors { variable: Key },

    /// Elimination bound beyond the indexed range
    #[error("Bound {bound} exceeds the number of variables ({num_variables})")]
    BoundOutOfRange { bound: usize, num_variables: usize },

    /// Target variable is not indexed
    #[error("Variable {variable} is out of range ({num_variables} variables indexed)")]
    VariableOutOfRange { variable: Key, num_variables: usize },

    /// The index names a factor the graph no longer holds
    #[error("Variable {variable} is indexed under factor {factor}, which is not in the graph")]
    MissingFactor { variable: Key, factor: usize },

    /// Uninformative policy requested for a factor family that has no such conditional
    #[error("Variable {variable} has no touching factors and the factor family cannot build an uninformative conditional")]
    UninformativeUnsupported { variable: Key },
}

impl EliminationError {
    /// Log the error with tracing::error and return self for chaining
    #[must_use]
    pub fn log(self) -> Self {
        error!("{}", self);
        self
    }
}
