//! Factor graphs and Bayes nets.
//!
//! [`FactorGraph`] stores factors in numbered slots. Elimination removes factors by emptying
//! their slot rather than shifting the vector, so factor ids recorded in a
//! [`VariableIndex`](crate::core::VariableIndex) stay valid for the lifetime of the graph.
//! New factors (separators produced by elimination) are appended.
//!
//! [`BayesNet`] is the ordered chain of conditionals elimination produces, first-eliminated
//! first.

use std::{ops::Index, slice};

use crate::core::{Conditional, Factor, Key, Permutation};

/// A factor graph with slot-stable factor ids.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorGraph<F> {
    factors: Vec<Option<F>>,
}

impl<F> Default for FactorGraph<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FactorGraph<F> {
    pub fn new() -> Self {
        Self {
            factors: Vec::new(),
        }
    }

    /// Append a factor and return its id.
    pub fn push(&mut self, factor: F) -> usize {
        self.factors.push(Some(factor));
        self.factors.len() - 1
    }

    /// Take the factor out of slot `id`, leaving the slot empty.
    pub fn remove(&mut self, id: usize) -> Option<F> {
        self.factors.get_mut(id).and_then(Option::take)
    }

    pub fn get(&self, id: usize) -> Option<&F> {
        self.factors.get(id).and_then(Option::as_ref)
    }

    /// Number of slots, including emptied ones. Factor ids range over `0..num_slots()`.
    pub fn num_slots(&self) -> usize {
        self.factors.len()
    }

    /// Number of factors still present.
    pub fn len(&self) -> usize {
        self.factors.iter().filter(|f| f.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.iter().all(Option::is_none)
    }

    /// Present factors with their ids, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &F)> {
        self.factors
            .iter()
            .enumerate()
            .filter_map(|(id, f)| f.as_ref().map(|f| (id, f)))
    }

    pub fn factors(&self) -> impl Iterator<Item = &F> {
        self.factors.iter().flatten()
    }

    /// Drop empty slots. Factor ids change, so any index built on `self` is invalidated.
    pub fn compacted(self) -> Self {
        Self {
            factors: self.factors.into_iter().flatten().map(Some).collect(),
        }
    }
}

impl<F: Factor> FactorGraph<F> {
    /// One past the largest key mentioned by any present factor.
    pub fn num_variables(&self) -> usize {
        self.factors()
            .flat_map(|f| f.keys().iter().copied())
            .max()
            .map_or(0, |k| k + 1)
    }

    /// Relabel every present factor through `inverse` (see [`Factor::permute_with_inverse`]).
    pub fn permute_with_inverse(&mut self, inverse: &Permutation) {
        for factor in self.factors.iter_mut().flatten() {
            factor.permute_with_inverse(inverse);
        }
    }
}

impl<F> FromIterator<F> for FactorGraph<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().map(Some).collect(),
        }
    }
}

impl<F> Extend<F> for FactorGraph<F> {
    fn extend<I: IntoIterator<Item = F>>(&mut self, iter: I) {
        self.factors.extend(iter.into_iter().map(Some));
    }
}

/// Ordered sequence of conditionals, in elimination order.
#[derive(Debug, Clone, PartialEq)]
pub struct BayesNet<C> {
    conditionals: Vec<C>,
}

impl<C> Default for BayesNet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> BayesNet<C> {
    pub fn new() -> Self {
        Self {
            conditionals: Vec::new(),
        }
    }

    pub fn push(&mut self, conditional: C) {
        self.conditionals.push(conditional);
    }

    pub fn len(&self) -> usize {
        self.conditionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditionals.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, C> {
        self.conditionals.iter()
    }

    pub fn last(&self) -> Option<&C> {
        self.conditionals.last()
    }
}

impl<C: Conditional> BayesNet<C> {
    /// Frontal variables in elimination order.
    pub fn frontals(&self) -> Vec<Key> {
        self.conditionals.iter().map(Conditional::frontal).collect()
    }

    /// Total number of parent entries across all conditionals.
    ///
    /// This is the number of off-diagonal non-zeros of the resulting square-root
    /// information structure, the quantity fill-reducing orderings try to keep small.
    pub fn fill_in(&self) -> usize {
        self.conditionals.iter().map(|c| c.parents().len()).sum()
    }

    /// Relabel every conditional through `inverse`.
    pub fn permute_with_inverse(&mut self, inverse: &Permutation) {
        for conditional in &mut self.conditionals {
            conditional.permute_with_inverse(inverse);
        }
    }
}

impl<C> Index<usize> for BayesNet<C> {
    type Output = C;

    fn index(&self, position: usize) -> &C {
        &self.conditionals[position]
    }
}

impl<C> FromIterator<C> for BayesNet<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self {
            conditionals: iter.into_iter().collect(),
        }
    }
}

impl<C> IntoIterator for BayesNet<C> {
    type Item = C;
    type IntoIter = std::vec::IntoIter<C>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditionals.into_iter()
    }
}

impl<'a, C> IntoIterator for &'a BayesNet<C> {
    type Item = &'a C;
    type IntoIter = slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::symbolic::{SymbolicConditional, SymbolicFactor};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_remove_keeps_ids_stable() {
        let mut graph: FactorGraph<SymbolicFactor> = [vec![0, 1], vec![1, 2], vec![2]]
            .into_iter()
            .map(SymbolicFactor::new)
            .collect();

        assert_eq!(graph.len(), 3);
        assert!(graph.remove(1).is_some());
        assert!(graph.remove(1).is_none());
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.num_slots(), 3);
        assert_eq!(graph.get(2).map(Factor::keys), Some(&[2][..]));

        let id = graph.push(SymbolicFactor::new(vec![0]));
        assert_eq!(id, 3);
        assert_eq!(graph.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![0, 2, 3]);

        let compact = graph.compacted();
        assert_eq!(compact.num_slots(), 3);
        assert_eq!(compact.get(1).map(Factor::keys), Some(&[2][..]));
    }

    #[test]
    fn test_num_variables() {
        let graph: FactorGraph<SymbolicFactor> = [vec![0, 4], vec![2]]
            .into_iter()
            .map(SymbolicFactor::new)
            .collect();
        assert_eq!(graph.num_variables(), 5);
        assert_eq!(FactorGraph::<SymbolicFactor>::new().num_variables(), 0);
    }

    #[test]
    fn test_permute_with_inverse() -> TestResult {
        let mut graph: FactorGraph<SymbolicFactor> =
            std::iter::once(SymbolicFactor::new(vec![0, 2])).collect();
        let p = Permutation::push_to_back(&[0], 3)?;
        graph.permute_with_inverse(&p.inverse()?);
        assert_eq!(graph.get(0).map(Factor::keys), Some(&[2, 1][..]));

        graph.permute_with_inverse(&p);
        assert_eq!(graph.get(0).map(Factor::keys), Some(&[0, 2][..]));
        Ok(())
    }

    #[test]
    fn test_bayes_net_structure() {
        let net: BayesNet<SymbolicConditional> = [
            SymbolicConditional::new(0, vec![1, 2]),
            SymbolicConditional::new(1, vec![2]),
            SymbolicConditional::new(2, vec![]),
        ]
        .into_iter()
        .collect();

        assert_eq!(net.frontals(), vec![0, 1, 2]);
        assert_eq!(net.fill_in(), 3);
        assert_eq!(net[1].parents(), &[2]);
    }
}
