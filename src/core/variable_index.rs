//! Variable → factor adjacency.
//!
//! The [`VariableIndex`] answers "which factors touch variable `v`?" in constant time. It is
//! built once from a [`FactorGraph`] and then kept in lock-step with it while elimination
//! consumes factors and appends separators.
//!
//! # Invariant
//!
//! Factor id `f` appears in the list of variable `v` iff factor `f` is present in the graph and
//! has `v` among its keys. [`VariableIndex::validate`] checks this in full.
//!
//! The index also remembers which variables have been eliminated. An eliminated variable has
//! no touching factors, which is indistinguishable from a variable that was never constrained,
//! so the flag is kept explicitly.

use crate::core::{CoreError, CoreResult, Factor, FactorGraph, Key, Permutation, repeated_key};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableIndex {
    index: Vec<Vec<usize>>,
    eliminated: Vec<bool>,
    num_factors: usize,
    num_entries: usize,
}

impl VariableIndex {
    /// Index `graph`, sized to one past its largest key.
    pub fn new<F: Factor>(graph: &FactorGraph<F>) -> Self {
        let mut index = Self::empty(graph.num_variables());
        for (id, factor) in graph.iter() {
            index.insert(id, factor.keys());
        }
        index.num_factors = graph.num_slots();
        index
    }

    /// Index `graph` over an explicit number of variables.
    ///
    /// Variables that no factor mentions get an empty list.
    ///
    /// # Errors
    /// [`CoreError::KeyOutOfRange`] if some factor mentions a key `>= num_variables`, and
    /// [`CoreError::DuplicateKey`] if a factor lists a key twice.
    pub fn with_num_variables<F: Factor>(
        graph: &FactorGraph<F>,
        num_variables: usize,
    ) -> CoreResult<Self> {
        let mut index = Self::empty(num_variables);
        for (id, factor) in graph.iter() {
            if let Some(key) = repeated_key(factor.keys()) {
                return Err(CoreError::DuplicateKey { factor: id, key }.log());
            }
            if let Some(&key) = factor.keys().iter().find(|&&k| k >= num_variables) {
                return Err(CoreError::KeyOutOfRange {
                    factor: id,
                    key,
                    num_variables,
                }
                .log());
            }
            index.insert(id, factor.keys());
        }
        index.num_factors = graph.num_slots();
        Ok(index)
    }

    fn empty(num_variables: usize) -> Self {
        Self {
            index: vec![Vec::new(); num_variables],
            eliminated: vec![false; num_variables],
            num_factors: 0,
            num_entries: 0,
        }
    }

    /// Factor ids touching `variable`, in insertion order. Empty for unknown variables.
    pub fn factors_touching(&self, variable: Key) -> &[usize] {
        self.index.get(variable).map_or(&[], Vec::as_slice)
    }

    /// Register factor `factor_id` under every key in `keys`.
    ///
    /// Keys beyond the current range grow the index.
    pub fn insert(&mut self, factor_id: usize, keys: &[Key]) {
        if let Some(&max_key) = keys.iter().max()
            && max_key >= self.index.len()
        {
            self.index.resize(max_key + 1, Vec::new());
            self.eliminated.resize(max_key + 1, false);
        }
        for &key in keys {
            self.index[key].push(factor_id);
        }
        self.num_entries += keys.len();
        self.num_factors = self.num_factors.max(factor_id + 1);
    }

    /// Remove factor `factor_id` from the list of every key in `keys`.
    pub fn remove(&mut self, factor_id: usize, keys: &[Key]) {
        for &key in keys {
            if let Some(list) = self.index.get_mut(key)
                && let Some(pos) = list.iter().position(|&f| f == factor_id)
            {
                list.remove(pos);
                self.num_entries -= 1;
            }
        }
    }

    pub fn mark_eliminated(&mut self, variable: Key) {
        if let Some(flag) = self.eliminated.get_mut(variable) {
            *flag = true;
        }
    }

    pub fn is_eliminated(&self, variable: Key) -> bool {
        self.eliminated.get(variable).copied().unwrap_or(false)
    }

    /// Relabel variables: the list at new position `i` is the old list of variable `p[i]`.
    ///
    /// # Errors
    /// [`CoreError::LengthMismatch`] if `p` does not cover exactly the indexed variables.
    pub fn permute(&mut self, permutation: &Permutation) -> CoreResult<()> {
        if permutation.len() != self.index.len() {
            return Err(CoreError::LengthMismatch {
                operation: "VariableIndex::permute",
                left: permutation.len(),
                right: self.index.len(),
            }
            .log());
        }
        let mut old_index = std::mem::take(&mut self.index);
        let old_eliminated = std::mem::take(&mut self.eliminated);
        self.index = permutation
            .iter()
            .map(|&old| std::mem::take(&mut old_index[old]))
            .collect();
        self.eliminated = permutation.iter().map(|&old| old_eliminated[old]).collect();
        Ok(())
    }

    /// Check the index against `graph` in both directions.
    ///
    /// # Errors
    /// [`CoreError::InconsistentIndex`] naming the first disagreement found,
    /// [`CoreError::KeyOutOfRange`] if the graph mentions an unindexed variable, or
    /// [`CoreError::DuplicateKey`] if a factor lists a variable twice.
    pub fn validate<F: Factor>(&self, graph: &FactorGraph<F>) -> CoreResult<()> {
        for (factor, f) in graph.iter() {
            if let Some(key) = repeated_key(f.keys()) {
                return Err(CoreError::DuplicateKey { factor, key }.log());
            }
        }

        for (variable, list) in self.index.iter().enumerate() {
            for (position, &factor) in list.iter().enumerate() {
                if list[..position].contains(&factor) {
                    return Err(CoreError::InconsistentIndex {
                        variable,
                        factor,
                        message: "factor is indexed more than once under the variable".to_string(),
                    }
                    .log());
                }
                let Some(f) = graph.get(factor) else {
                    return Err(CoreError::InconsistentIndex {
                        variable,
                        factor,
                        message: "indexed factor is not present in the graph".to_string(),
                    }
                    .log());
                };
                if !f.keys().contains(&variable) {
                    return Err(CoreError::InconsistentIndex {
                        variable,
                        factor,
                        message: "indexed factor does not mention the variable".to_string(),
                    }
                    .log());
                }
            }
        }

        for (factor, f) in graph.iter() {
            for &key in f.keys() {
                if key >= self.index.len() {
                    return Err(CoreError::KeyOutOfRange {
                        factor,
                        key,
                        num_variables: self.index.len(),
                    }
                    .log());
                }
                if !self.index[key].contains(&factor) {
                    return Err(CoreError::InconsistentIndex {
                        variable: key,
                        factor,
                        message: "factor mentions the variable but is not indexed under it"
                            .to_string(),
                    }
                    .log());
                }
            }
        }
        Ok(())
    }

    /// Number of indexed variables.
    pub fn num_variables(&self) -> usize {
        self.index.len()
    }

    /// Number of factor slots seen, i.e. one past the largest factor id inserted.
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    /// Total number of (variable, factor) entries.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::symbolic::SymbolicFactor;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn chain_graph() -> FactorGraph<SymbolicFactor> {
        [vec![0], vec![0, 1], vec![1, 2]]
            .into_iter()
            .map(SymbolicFactor::new)
            .collect()
    }

    #[test]
    fn test_build_from_graph() -> TestResult {
        let graph = chain_graph();
        let index = VariableIndex::new(&graph);

        assert_eq!(index.num_variables(), 3);
        assert_eq!(index.num_factors(), 3);
        assert_eq!(index.num_entries(), 5);
        assert_eq!(index.factors_touching(0), &[0, 1]);
        assert_eq!(index.factors_touching(1), &[1, 2]);
        assert_eq!(index.factors_touching(2), &[2]);
        assert!(index.factors_touching(9).is_empty());
        index.validate(&graph)?;
        Ok(())
    }

    #[test]
    fn test_with_num_variables() -> TestResult {
        let graph = chain_graph();
        let index = VariableIndex::with_num_variables(&graph, 5)?;
        assert_eq!(index.num_variables(), 5);
        assert!(index.factors_touching(4).is_empty());

        assert_eq!(
            VariableIndex::with_num_variables(&graph, 2),
            Err(CoreError::KeyOutOfRange {
                factor: 2,
                key: 2,
                num_variables: 2,
            })
        );
        Ok(())
    }

    #[test]
    fn test_remove_and_insert_track_graph() -> TestResult {
        let mut graph = chain_graph();
        let mut index = VariableIndex::new(&graph);

        for id in [0, 1] {
            if let Some(factor) = graph.remove(id) {
                index.remove(id, factor.keys());
            }
        }
        let separator = SymbolicFactor::new(vec![1]);
        let keys = separator.keys().to_vec();
        let id = graph.push(separator);
        index.insert(id, &keys);

        assert!(index.factors_touching(0).is_empty());
        assert_eq!(index.factors_touching(1), &[2, 3]);
        assert_eq!(index.num_entries(), 3);
        assert_eq!(index.num_factors(), 4);
        index.validate(&graph)?;
        Ok(())
    }

    #[test]
    fn test_validate_detects_drift() {
        let mut graph = chain_graph();
        let index = VariableIndex::new(&graph);
        graph.remove(2);

        assert!(matches!(
            index.validate(&graph),
            Err(CoreError::InconsistentIndex { variable: 1, factor: 2, .. })
        ));
    }

    #[test]
    fn test_repeated_keys_rejected() {
        let graph: FactorGraph<SymbolicFactor> = [vec![0, 1], vec![2, 1, 2]]
            .into_iter()
            .map(SymbolicFactor::new)
            .collect();

        assert_eq!(
            VariableIndex::with_num_variables(&graph, 3),
            Err(CoreError::DuplicateKey { factor: 1, key: 2 })
        );
        assert_eq!(
            VariableIndex::new(&graph).validate(&graph),
            Err(CoreError::DuplicateKey { factor: 1, key: 2 })
        );
    }

    #[test]
    fn test_eliminated_flags() {
        let mut index = VariableIndex::new(&chain_graph());
        assert!(!index.is_eliminated(1));
        index.mark_eliminated(1);
        assert!(index.is_eliminated(1));
        assert!(!index.is_eliminated(42));
    }

    #[test]
    fn test_permute() -> TestResult {
        let graph = chain_graph();
        let mut index = VariableIndex::new(&graph);
        index.mark_eliminated(0);

        let p = Permutation::push_to_back(&[0], 3)?;
        index.permute(&p)?;
        assert_eq!(index.factors_touching(0), &[1, 2]);
        assert_eq!(index.factors_touching(2), &[0, 1]);
        assert!(index.is_eliminated(2));

        let mut relabeled = graph.clone();
        relabeled.permute_with_inverse(&p.inverse()?);
        index.validate(&relabeled)?;

        assert!(index.permute(&Permutation::identity(2)).is_err());
        Ok(())
    }
}
