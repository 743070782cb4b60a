//! Core data structures for variable elimination.
//!
//! This module contains the symbolic building blocks shared by every factor family:
//! - Variable keys and the capability traits a factor family implements
//! - Permutations (reorderings of the variable range)
//! - The variable index (variable → factors adjacency)
//! - Variable slots (column alignment of factors before they are combined)
//! - Factor graphs and Bayes nets
//!
//! Nothing in here knows what a factor *means* numerically. The engine in
//! [`crate::inference`] is written once against [`EliminableFactor`], and concrete families
//! such as [`crate::factors::symbolic`] and [`crate::factors::gaussian`] plug into it.

pub mod factor_graph;
pub mod permutation;
pub mod variable_index;
pub mod variable_slots;

use thiserror::Error;
use tracing::error;

use crate::factors::FactorError;

pub use factor_graph::{BayesNet, FactorGraph};
pub use permutation::Permutation;
pub use variable_index::VariableIndex;
pub use variable_slots::VariableSlots;

/// Opaque variable identifier, dense in `[0, n)` for an n-variable problem.
pub type Key = usize;

/// Core module error types.
///
/// Every variant is a contract violation: it means the caller handed in inconsistent
/// data (a malformed permutation, an index that does not match its graph, ...).
/// These are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A permutation entry or argument points outside `[0, size)`
    #[error("{operation}: index {index} out of range for size {size}")]
    PermutationIndexOutOfRange {
        operation: &'static str,
        index: usize,
        size: usize,
    },

    /// The same variable was requested twice in a front/back pull
    #[error("{operation}: variable {index} listed more than once")]
    DuplicatePermutationEntry {
        operation: &'static str,
        index: usize,
    },

    /// Two sequences that must have equal length do not
    #[error("{operation}: length mismatch ({left} vs {right})")]
    LengthMismatch {
        operation: &'static str,
        left: usize,
        right: usize,
    },

    /// The values of a permutation are not exactly `{0, ..., n-1}`
    #[error("{operation}: not a bijection over [0, {size}) (value {value} at position {position})")]
    NotABijection {
        operation: &'static str,
        size: usize,
        position: usize,
        value: usize,
    },

    /// A factor references a variable outside the index range
    #[error("factor {factor} references variable {key}, but only {num_variables} variables are indexed")]
    KeyOutOfRange {
        factor: usize,
        key: Key,
        num_variables: usize,
    },

    /// A factor lists the same variable more than once
    #[error("factor {factor} lists variable {key} more than once")]
    DuplicateKey { factor: usize, key: Key },

    /// The variable index disagrees with the factor graph it was built from
    #[error("Inconsistent variable index for variable {variable}, factor {factor}: {message}")]
    InconsistentIndex {
        variable: Key,
        factor: usize,
        message: String,
    },
}

impl CoreError {
    /// Log the error with tracing::error and return self for chaining
    ///
    /// # Example
    /// ```ignore
    /// return Err(CoreError::LengthMismatch { .. }.log());
    /// ```
    #[must_use]
    pub fn log(self) -> Self {
        error!("{}", self);
        self
    }

}

/// Result type for core module operations
pub type CoreResult<T> = Result<T, CoreError>;

/// First key that occurs twice in `keys`.
pub(crate) fn repeated_key(keys: &[Key]) -> Option<Key> {
    keys.iter()
        .enumerate()
        .find(|&(i, key)| keys[..i].contains(key))
        .map(|(_, &key)| key)
}

/// A factor: a local constraint over an ordered list of variables.
///
/// The position of a key in [`Factor::keys`] is the factor's own column position for
/// that variable, which is exactly what [`VariableSlots`] records.
pub trait Factor {
    /// The variables this factor touches, in the factor's own column order.
    fn keys(&self) -> &[Key];

    /// Relabel every key `k` to `inverse[k]`.
    ///
    /// Callers holding a permutation `p` (position → original variable) pass `p.inverse()`
    /// to move into the permuted labelling and `p` itself to move back.
    fn permute_with_inverse(&mut self, inverse: &Permutation);

    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

/// The distribution of one eliminated variable given its separator.
pub trait Conditional {
    /// The eliminated (frontal) variable.
    fn frontal(&self) -> Key;

    /// The separator variables this conditional depends on.
    fn parents(&self) -> &[Key];

    /// Relabel the frontal and parent keys through `inverse`, as [`Factor::permute_with_inverse`].
    fn permute_with_inverse(&mut self, inverse: &Permutation);
}

/// Capability a factor family provides to the elimination engine.
///
/// # Contract
///
/// `combine_and_eliminate` receives every factor touching `target` together with the
/// [`VariableSlots`] built over exactly those factors. It returns the conditional on
/// `target` and a residual factor whose keys are the union of all scopes minus `target`.
/// Results must be deterministic for identical inputs.
///
/// # Example
///
/// ```
/// use apex_inference::core::{EliminableFactor, Factor, VariableSlots};
/// use apex_inference::factors::symbolic::SymbolicFactor;
///
/// let a = SymbolicFactor::new(vec![0, 1]);
/// let b = SymbolicFactor::new(vec![1, 2]);
/// let factors = [&a, &b];
/// let slots = VariableSlots::new(&factors);
///
/// let (_, separator) = SymbolicFactor::combine_and_eliminate(&factors, &slots, 1)?;
/// assert_eq!(separator.keys(), &[0, 2]);
/// # Ok::<(), apex_inference::factors::FactorError>(())
/// ```
pub trait EliminableFactor: Factor + Sized {
    type Conditional: Conditional;

    /// Combine `factors` into one joint factor aligned through `slots`, then split off `target`.
    fn combine_and_eliminate(
        factors: &[&Self],
        slots: &VariableSlots,
        target: Key,
    ) -> Result<(Self::Conditional, Self), FactorError>;

    /// A conditional for a variable no factor constrains, if the family defines one.
    fn uninformative_conditional(_target: Key) -> Option<Self::Conditional> {
        None
    }
}
