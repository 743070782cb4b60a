//! Generic variable elimination.
//!
//! Eliminating variable `v` gathers every factor touching it (via the [`VariableIndex`]),
//! aligns their columns with [`VariableSlots`], and hands them to the factor family's
//! [`EliminableFactor::combine_and_eliminate`]. The consumed factors leave the graph and the
//! index; the separator factor returned by the family is appended to both. Repeating this in
//! natural order `0, 1, ...` turns the graph into a [`BayesNet`].
//!
//! Other orders are obtained by relabelling rather than by a second algorithm:
//! - [`eliminate_ordered`] relabels the graph so that `ordering[i]` becomes variable `i`
//! - [`marginal`] pushes the requested variables to the back and stops before them
//!
//! All entry points take the graph and index by exclusive borrow for the duration of the call.

use tracing::{debug, warn};

use crate::{
    core::{
        BayesNet, CoreError, EliminableFactor, FactorGraph, Key, Permutation, VariableIndex,
        VariableSlots, repeated_key,
    },
    error::InferenceResult,
    inference::{EliminationConfig, EliminationError, EmptyVariablePolicy, OrderingOracle},
};

/// Eliminate a single variable.
///
/// Returns the conditional on `variable`, or `None` when the variable had no touching
/// factors and the policy is [`EmptyVariablePolicy::Skip`].
///
/// # Errors
/// - [`EliminationError::VariableOutOfRange`] if `variable` is not indexed
/// - [`EliminationError::AlreadyEliminated`] on a second elimination of the same variable
/// - [`EliminationError::NoTouchingFactors`] under [`EmptyVariablePolicy::Reject`]
/// - [`EliminationError::MissingFactor`] if the index names a factor the graph lost
/// - [`CoreError::DuplicateKey`] if a touching factor lists a variable twice
/// - any [`FactorError`](crate::factors::FactorError) from the factor family, unchanged
pub fn eliminate_one<F: EliminableFactor>(
    graph: &mut FactorGraph<F>,
    index: &mut VariableIndex,
    variable: Key,
    config: &EliminationConfig,
) -> InferenceResult<Option<F::Conditional>> {
    if variable >= index.num_variables() {
        return Err(EliminationError::VariableOutOfRange {
            variable,
            num_variables: index.num_variables(),
        }
        .log()
        .into());
    }
    if index.is_eliminated(variable) {
        return Err(EliminationError::AlreadyEliminated { variable }.log().into());
    }

    let touching = index.factors_touching(variable).to_vec();
    if touching.is_empty() {
        return eliminate_unconstrained::<F>(index, variable, config);
    }

    let mut factors = Vec::with_capacity(touching.len());
    for &factor in &touching {
        let f = graph
            .get(factor)
            .ok_or_else(|| EliminationError::MissingFactor { variable, factor }.log())?;
        if let Some(key) = repeated_key(f.keys()) {
            return Err(CoreError::DuplicateKey { factor, key }.log().into());
        }
        factors.push(f);
    }
    let slots = VariableSlots::new(&factors);
    let (conditional, separator) = F::combine_and_eliminate(&factors, &slots, variable)?;

    for &factor in &touching {
        if let Some(f) = graph.remove(factor) {
            index.remove(factor, f.keys());
        }
    }

    let separator_keys = separator.keys().to_vec();
    if !separator_keys.is_empty() {
        let id = graph.push(separator);
        index.insert(id, &separator_keys);
    }
    index.mark_eliminated(variable);

    if config.trace_steps {
        debug!(
            "Eliminated {}: combined {} factors, separator {:?}",
            variable,
            touching.len(),
            separator_keys
        );
    }
    Ok(Some(conditional))
}

fn eliminate_unconstrained<F: EliminableFactor>(
    index: &mut VariableIndex,
    variable: Key,
    config: &EliminationConfig,
) -> InferenceResult<Option<F::Conditional>> {
    match config.empty_variable_policy {
        EmptyVariablePolicy::Reject => {
            Err(EliminationError::NoTouchingFactors { variable }.log().into())
        }
        EmptyVariablePolicy::Skip => {
            warn!("Variable {} has no touching factors, skipping", variable);
            index.mark_eliminated(variable);
            Ok(None)
        }
        EmptyVariablePolicy::Uninformative => {
            let conditional = F::uninformative_conditional(variable)
                .ok_or_else(|| EliminationError::UninformativeUnsupported { variable }.log())?;
            index.mark_eliminated(variable);
            Ok(Some(conditional))
        }
    }
}

/// Eliminate variables `0..bound` in natural order.
///
/// On return `graph` and `index` hold only the residual factors, which mention variables
/// `>= bound` exclusively, ready for further elimination. Variables the index already marks as
/// eliminated are passed over, so a second call with a larger bound resumes where the first
/// one stopped.
///
/// # Errors
/// [`EliminationError::BoundOutOfRange`] if `bound` exceeds the indexed variables, a
/// [`CoreError`](crate::core::CoreError) if `config.validate_index` is set and the index does
/// not match the graph, plus everything [`eliminate_one`] reports.
pub fn eliminate_until<F: EliminableFactor>(
    graph: &mut FactorGraph<F>,
    bound: usize,
    index: &mut VariableIndex,
    config: &EliminationConfig,
) -> InferenceResult<BayesNet<F::Conditional>> {
    let num_variables = index.num_variables();
    if bound > num_variables {
        return Err(EliminationError::BoundOutOfRange {
            bound,
            num_variables,
        }
        .log()
        .into());
    }
    if config.validate_index {
        index.validate(graph)?;
    }
    if config.trace_steps {
        config.print_configuration();
        debug!(
            "Eliminating {} of {} variables ({} factors, {} index entries)",
            bound,
            num_variables,
            graph.len(),
            index.num_entries()
        );
    }

    let mut bayes_net = BayesNet::new();
    for variable in 0..bound {
        if index.is_eliminated(variable) {
            continue;
        }
        if let Some(conditional) = eliminate_one(graph, index, variable, config)? {
            bayes_net.push(conditional);
        }
    }
    Ok(bayes_net)
}

/// Eliminate every indexed variable in natural order, reusing a caller-built index.
pub fn eliminate_with_index<F: EliminableFactor>(
    graph: &mut FactorGraph<F>,
    index: &mut VariableIndex,
    config: &EliminationConfig,
) -> InferenceResult<BayesNet<F::Conditional>> {
    let bound = index.num_variables();
    eliminate_until(graph, bound, index, config)
}

/// Eliminate all variables of `graph` in natural order with the default configuration.
///
/// The caller's graph is left untouched.
pub fn eliminate<F: EliminableFactor + Clone>(
    graph: &FactorGraph<F>,
) -> InferenceResult<BayesNet<F::Conditional>> {
    let mut working = graph.clone();
    let mut index = VariableIndex::new(&working);
    eliminate_with_index(&mut working, &mut index, &EliminationConfig::default())
}

/// Marginal factor graph over `variables`.
///
/// Every other variable is eliminated first by pushing `variables` to the back of the order;
/// the residual is returned compacted and in original labels. Its factors mention only
/// members of `variables`.
///
/// # Errors
/// [`CoreError`](crate::core::CoreError) for duplicate or out-of-range targets, plus
/// everything [`eliminate_until`] reports.
pub fn marginal<F: EliminableFactor + Clone>(
    graph: &FactorGraph<F>,
    variables: &[Key],
    config: &EliminationConfig,
) -> InferenceResult<FactorGraph<F>> {
    let num_variables = graph.num_variables();
    let permutation = Permutation::push_to_back(variables, num_variables)?;

    let mut working = graph.clone();
    working.permute_with_inverse(&permutation.inverse()?);
    let mut index = VariableIndex::with_num_variables(&working, num_variables)?;

    let bound = num_variables - variables.len();
    eliminate_until(&mut working, bound, &mut index, config)?;

    let mut residual = working.compacted();
    residual.permute_with_inverse(&permutation);
    debug!(
        "Marginal over {:?}: {} residual factors",
        variables,
        residual.len()
    );
    Ok(residual)
}

/// Eliminate in the order given by `ordering` (`ordering[i]` is eliminated `i`-th).
///
/// The returned conditionals carry original keys; conditional `i` has frontal `ordering[i]`.
///
/// # Errors
/// [`CoreError::LengthMismatch`](crate::core::CoreError::LengthMismatch) if the graph
/// mentions a variable the ordering does not cover, plus everything [`eliminate_until`]
/// reports.
pub fn eliminate_ordered<F: EliminableFactor + Clone>(
    graph: &FactorGraph<F>,
    ordering: &Permutation,
    config: &EliminationConfig,
) -> InferenceResult<BayesNet<F::Conditional>> {
    let num_variables = graph.num_variables();
    if num_variables > ordering.len() {
        return Err(CoreError::LengthMismatch {
            operation: "eliminate_ordered",
            left: ordering.len(),
            right: num_variables,
        }
        .log()
        .into());
    }

    let mut working = graph.clone();
    working.permute_with_inverse(&ordering.inverse()?);
    let mut index = VariableIndex::with_num_variables(&working, ordering.len())?;

    let mut bayes_net = eliminate_until(&mut working, ordering.len(), &mut index, config)?;
    bayes_net.permute_with_inverse(ordering);
    Ok(bayes_net)
}

/// Ask `oracle` for an ordering of `graph`, then eliminate in that order.
///
/// `constrained_last` variables are eliminated after all others.
pub fn eliminate_with_oracle<F, O>(
    graph: &FactorGraph<F>,
    oracle: &O,
    constrained_last: &[Key],
    config: &EliminationConfig,
) -> InferenceResult<(Permutation, BayesNet<F::Conditional>)>
where
    F: EliminableFactor + Clone,
    O: OrderingOracle + ?Sized,
{
    let index = VariableIndex::new(graph);
    let ordering = oracle.order(&index, constrained_last)?;
    debug!("Elimination order: {}", ordering);
    let bayes_net = eliminate_ordered(graph, &ordering, config)?;
    Ok((ordering, bayes_net))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Conditional, Factor};
    use crate::error::InferenceError;
    use crate::factors::{GaussianFactor, SymbolicFactor};
    use nalgebra::DVector;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn symbolic(scopes: &[&[Key]]) -> FactorGraph<SymbolicFactor> {
        scopes
            .iter()
            .map(|keys| SymbolicFactor::new(keys.to_vec()))
            .collect()
    }

    #[test]
    fn test_eliminate_one_updates_graph_and_index() -> TestResult {
        let mut graph = symbolic(&[&[0, 1], &[1, 2], &[0, 2]]);
        let mut index = VariableIndex::new(&graph);
        let config = EliminationConfig::default();

        let conditional = eliminate_one(&mut graph, &mut index, 0, &config)?
            .ok_or("expected a conditional")?;
        assert_eq!(conditional.frontal(), 0);
        assert_eq!(conditional.parents(), &[1, 2]);

        assert_eq!(graph.len(), 2);
        assert!(index.factors_touching(0).is_empty());
        assert_eq!(index.factors_touching(2), &[1, 3]);
        assert!(index.is_eliminated(0));
        index.validate(&graph)?;
        Ok(())
    }

    #[test]
    fn test_reelimination_is_rejected() -> TestResult {
        let mut graph = symbolic(&[&[0, 1]]);
        let mut index = VariableIndex::new(&graph);
        let config = EliminationConfig::default();

        eliminate_one(&mut graph, &mut index, 0, &config)?;
        let err = eliminate_one(&mut graph, &mut index, 0, &config);
        assert!(matches!(
            err,
            Err(InferenceError::Elimination(
                EliminationError::AlreadyEliminated { variable: 0 }
            ))
        ));
        Ok(())
    }

    #[test]
    fn test_empty_variable_policies() -> TestResult {
        // Variable 1 is mentioned by nothing.
        let graph = symbolic(&[&[0], &[2]]);

        let mut g = graph.clone();
        let mut index = VariableIndex::new(&g);
        let reject = eliminate_until(&mut g, 3, &mut index, &EliminationConfig::default());
        assert!(matches!(
            reject,
            Err(InferenceError::Elimination(
                EliminationError::NoTouchingFactors { variable: 1 }
            ))
        ));

        let skip = EliminationConfig::new().with_empty_variable_policy(EmptyVariablePolicy::Skip);
        let mut g = graph.clone();
        let mut index = VariableIndex::new(&g);
        let net = eliminate_until(&mut g, 3, &mut index, &skip)?;
        assert_eq!(net.frontals(), vec![0, 2]);
        assert!(index.is_eliminated(1));

        let uninformative =
            EliminationConfig::new().with_empty_variable_policy(EmptyVariablePolicy::Uninformative);
        let mut g = graph;
        let mut index = VariableIndex::new(&g);
        let net = eliminate_until(&mut g, 3, &mut index, &uninformative)?;
        assert_eq!(net.frontals(), vec![0, 1, 2]);
        assert!(net[1].parents().is_empty());
        Ok(())
    }

    #[test]
    fn test_uninformative_unsupported_for_gaussian() -> TestResult {
        let mut graph: FactorGraph<GaussianFactor> =
            std::iter::once(GaussianFactor::prior(1, DVector::zeros(2), 1.0)?).collect();
        let mut index = VariableIndex::new(&graph);
        let config =
            EliminationConfig::new().with_empty_variable_policy(EmptyVariablePolicy::Uninformative);

        let result = eliminate_one(&mut graph, &mut index, 0, &config);
        assert!(matches!(
            result,
            Err(InferenceError::Elimination(
                EliminationError::UninformativeUnsupported { variable: 0 }
            ))
        ));
        Ok(())
    }

    #[test]
    fn test_out_of_range_requests() {
        let mut graph = symbolic(&[&[0, 1]]);
        let mut index = VariableIndex::new(&graph);
        let config = EliminationConfig::default();

        assert!(matches!(
            eliminate_until(&mut graph, 3, &mut index, &config),
            Err(InferenceError::Elimination(EliminationError::BoundOutOfRange {
                bound: 3,
                num_variables: 2,
            }))
        ));
        assert!(matches!(
            eliminate_one(&mut graph, &mut index, 5, &config),
            Err(InferenceError::Elimination(
                EliminationError::VariableOutOfRange { variable: 5, .. }
            ))
        ));
    }

    #[test]
    fn test_index_drift_is_detected() {
        let mut graph = symbolic(&[&[0, 1], &[1]]);
        let mut index = VariableIndex::new(&graph);
        graph.remove(0);

        let validated = eliminate_until(&mut graph, 2, &mut index, &EliminationConfig::default());
        assert!(matches!(
            validated,
            Err(InferenceError::Core(CoreError::InconsistentIndex { .. }))
        ));

        let unchecked = EliminationConfig::new().with_validate_index(false);
        assert!(matches!(
            eliminate_one(&mut graph, &mut index, 0, &unchecked),
            Err(InferenceError::Elimination(EliminationError::MissingFactor {
                variable: 0,
                factor: 0,
            }))
        ));
    }

    #[test]
    fn test_eliminate_until_resumes_after_partial_run() -> TestResult {
        let mut graph = symbolic(&[&[0, 1], &[1, 2], &[2, 3]]);
        let mut index = VariableIndex::new(&graph);
        let config = EliminationConfig::default();

        let head = eliminate_until(&mut graph, 2, &mut index, &config)?;
        assert_eq!(head.frontals(), vec![0, 1]);

        let tail = eliminate_until(&mut graph, 4, &mut index, &config)?;
        assert_eq!(tail.frontals(), vec![2, 3]);
        assert_eq!(tail[0].parents(), &[3]);
        assert!(graph.is_empty());

        // Nothing left to do.
        assert!(eliminate_with_index(&mut graph, &mut index, &config)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_repeated_key_rejected_without_validation() {
        let mut graph = symbolic(&[&[0, 0, 1], &[1]]);
        let mut index = VariableIndex::new(&graph);
        let unchecked = EliminationConfig::new().with_validate_index(false);

        assert!(matches!(
            eliminate_one(&mut graph, &mut index, 0, &unchecked),
            Err(InferenceError::Core(CoreError::DuplicateKey { factor: 0, key: 0 }))
        ));
        assert_eq!(graph.len(), 2);

        assert!(matches!(
            eliminate(&graph),
            Err(InferenceError::Core(CoreError::DuplicateKey { factor: 0, key: 0 }))
        ));
    }

    #[test]
    fn test_eliminate_until_zero_is_noop() -> TestResult {
        let mut graph = symbolic(&[&[0, 1]]);
        let mut index = VariableIndex::new(&graph);
        let net = eliminate_until(&mut graph, 0, &mut index, &EliminationConfig::default())?;
        assert!(net.is_empty());
        assert_eq!(graph.len(), 1);
        Ok(())
    }

    #[test]
    fn test_eliminate_ordered_relabels_back() -> TestResult {
        let graph = symbolic(&[&[0, 1], &[1, 2]]);
        let ordering = Permutation::from_vec(vec![2, 0, 1])?;

        let net = eliminate_ordered(&graph, &ordering, &EliminationConfig::default())?;
        assert_eq!(net.frontals(), vec![2, 0, 1]);
        assert_eq!(net[0].parents(), &[1]);
        assert_eq!(net[1].parents(), &[1]);
        assert!(net[2].parents().is_empty());

        let short = Permutation::identity(2);
        assert!(eliminate_ordered(&graph, &short, &EliminationConfig::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_marginal_mentions_only_targets() -> TestResult {
        let graph = symbolic(&[&[0, 1], &[1, 2], &[2, 3], &[0, 3]]);
        let residual = marginal(&graph, &[1, 3], &EliminationConfig::default())?;

        assert!(!residual.is_empty());
        for factor in residual.factors() {
            assert!(factor.keys().iter().all(|k| [1, 3].contains(k)));
        }
        assert!(marginal(&graph, &[1, 1], &EliminationConfig::default()).is_err());
        Ok(())
    }
}
