//! # Apex Inference
//!
//! A generic variable-elimination engine for sparse probabilistic inference on factor graphs,
//! the back end of SLAM, pose-graph and bundle-adjustment solvers.
//!
//! ## Features
//!
//! - **Generic engine**: written once against the [`EliminableFactor`] capability; any factor
//!   family that can combine a set of factors and split off one variable plugs in
//! - **Partial elimination**: eliminate up to a bound and keep the residual graph
//! - **Marginals**: exact marginal factor graphs over a subset via push-to-back reordering
//! - **Orderings**: natural and greedy minimum-degree oracles with constrained-last groups
//! - **Factor families**: symbolic (structure only) and Gaussian (information form)
//!
//! ## Example
//!
//! ```
//! use apex_inference::core::FactorGraph;
//! use apex_inference::factors::SymbolicFactor;
//! use apex_inference::inference::{EliminationConfig, MinimumDegreeOrdering, eliminate_with_oracle};
//! # use apex_inference::InferenceResult;
//! # fn example() -> InferenceResult<()> {
//!
//! let graph: FactorGraph<SymbolicFactor> = [vec![0, 1], vec![0, 2], vec![0, 3]]
//!     .into_iter()
//!     .map(SymbolicFactor::new)
//!     .collect();
//!
//! let (ordering, bayes_net) =
//!     eliminate_with_oracle(&graph, &MinimumDegreeOrdering, &[], &EliminationConfig::default())?;
//! assert_eq!(ordering.len(), 4);
//! assert_eq!(bayes_net.fill_in(), 3);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod core;
pub mod error;
pub mod factors;
pub mod inference;
#[cfg(feature = "logging")]
pub mod logger;

pub use crate::core::{
    BayesNet, Conditional, EliminableFactor, Factor, FactorGraph, Key, Permutation,
    VariableIndex, VariableSlots,
};
pub use error::{InferenceError, InferenceResult};
pub use factors::{GaussianConditional, GaussianFactor, SymbolicConditional, SymbolicFactor};
pub use inference::{
    EliminationConfig, EmptyVariablePolicy, MinimumDegreeOrdering, NaturalOrdering,
    OrderingOracle,
};
#[cfg(feature = "logging")]
pub use logger::{init_logger, init_logger_with_level};
