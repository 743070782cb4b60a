//! Elimination ordering oracles.
//!
//! An [`OrderingOracle`] turns a [`VariableIndex`] into a [`Permutation`] whose entry `i` is
//! the variable to eliminate `i`-th. Callers can pin a group of variables to the end of the
//! order (`constrained_last`), which is how marginals over a subset and incremental updates
//! keep their variables of interest uneliminated for as long as possible.

use std::collections::BTreeSet;

use crate::{
    core::{Key, Permutation, VariableIndex},
    error::InferenceResult,
};

/// Source of elimination orders.
pub trait OrderingOracle {
    /// Compute an ordering of all indexed variables with `constrained_last` at the end.
    ///
    /// # Errors
    /// [`CoreError`](crate::core::CoreError) if `constrained_last` has duplicates or
    /// out-of-range variables.
    fn order(&self, index: &VariableIndex, constrained_last: &[Key]) -> InferenceResult<Permutation>;
}

/// Natural order `0, 1, ...` with the constrained variables moved to the back as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalOrdering;

impl OrderingOracle for NaturalOrdering {
    fn order(&self, index: &VariableIndex, constrained_last: &[Key]) -> InferenceResult<Permutation> {
        Ok(Permutation::push_to_back(
            constrained_last,
            index.num_variables(),
        )?)
    }
}

/// Greedy minimum-degree ordering.
///
/// Repeatedly picks the variable with the fewest neighbours in the current elimination graph
/// (ties broken by smallest id) and connects its neighbours pairwise, which is the fill the
/// elimination would create. Unconstrained variables go first; the constrained group is then
/// ordered by the same rule.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimumDegreeOrdering;

impl OrderingOracle for MinimumDegreeOrdering {
    fn order(&self, index: &VariableIndex, constrained_last: &[Key]) -> InferenceResult<Permutation> {
        let num_variables = index.num_variables();
        // Validates the constrained group (range and duplicates).
        let grouping = Permutation::push_to_back(constrained_last, num_variables)?;
        let split = num_variables - constrained_last.len();

        let mut adjacency = adjacency_from_index(index);
        let mut order = Vec::with_capacity(num_variables);
        let mut free: BTreeSet<Key> = grouping.as_slice()[..split].iter().copied().collect();
        let mut constrained: BTreeSet<Key> = constrained_last.iter().copied().collect();

        eliminate_group(&mut free, &mut adjacency, &mut order);
        eliminate_group(&mut constrained, &mut adjacency, &mut order);

        Ok(Permutation::from_vec(order)?)
    }
}

/// Variable adjacency implied by shared factors.
fn adjacency_from_index(index: &VariableIndex) -> Vec<BTreeSet<Key>> {
    let mut factor_scopes: Vec<Vec<Key>> = vec![Vec::new(); index.num_factors()];
    for variable in 0..index.num_variables() {
        for &factor in index.factors_touching(variable) {
            factor_scopes[factor].push(variable);
        }
    }

    let mut adjacency = vec![BTreeSet::new(); index.num_variables()];
    for scope in &factor_scopes {
        for &a in scope {
            for &b in scope {
                if a != b {
                    adjacency[a].insert(b);
                }
            }
        }
    }
    adjacency
}

fn eliminate_group(
    group: &mut BTreeSet<Key>,
    adjacency: &mut [BTreeSet<Key>],
    order: &mut Vec<Key>,
) {
    loop {
        let Some(variable) = group
            .iter()
            .copied()
            .min_by_key(|&v| (adjacency[v].len(), v))
        else {
            break;
        };
        let neighbours = std::mem::take(&mut adjacency[variable]);
        for &a in &neighbours {
            adjacency[a].remove(&variable);
            adjacency[a].extend(neighbours.iter().copied().filter(|&b| b != a));
        }
        group.remove(&variable);
        order.push(variable);
    }
}
