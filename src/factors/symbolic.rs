//! Structure-only factors.

use crate::core::{Conditional, EliminableFactor, Factor, Key, Permutation, VariableSlots};
use crate::factors::{FactorError, FactorResult};

/// A factor that only records which variables it couples.
///
/// # Example
///
/// ```
/// use apex_inference::core::FactorGraph;
/// use apex_inference::factors::SymbolicFactor;
/// use apex_inference::inference::elimination::eliminate;
/// # use apex_inference::error::InferenceResult;
/// # fn example() -> InferenceResult<()> {
///
/// let graph: FactorGraph<SymbolicFactor> = [vec![0, 1], vec![1, 2]]
///     .into_iter()
///     .map(SymbolicFactor::new)
///     .collect();
///
/// let bayes_net = eliminate(&graph)?;
/// assert_eq!(bayes_net.frontals(), vec![0, 1, 2]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SymbolicFactor {
    keys: Vec<Key>,
}

impl SymbolicFactor {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

impl Factor for SymbolicFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn permute_with_inverse(&mut self, inverse: &Permutation) {
        for key in &mut self.keys {
            *key = inverse[*key];
        }
    }
}

/// `P(frontal | parents)` with no numeric content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicConditional {
    frontal: Key,
    parents: Vec<Key>,
}

impl SymbolicConditional {
    pub fn new(frontal: Key, parents: Vec<Key>) -> Self {
        Self { frontal, parents }
    }

    /// True when the conditional has no parents.
    pub fn is_prior(&self) -> bool {
        self.parents.is_empty()
    }
}

impl Conditional for SymbolicConditional {
    fn frontal(&self) -> Key {
        self.frontal
    }

    fn parents(&self) -> &[Key] {
        &self.parents
    }

    fn permute_with_inverse(&mut self, inverse: &Permutation) {
        self.frontal = inverse[self.frontal];
        for parent in &mut self.parents {
            *parent = inverse[*parent];
        }
    }
}

impl EliminableFactor for SymbolicFactor {
    type Conditional = SymbolicConditional;

    /// The separator is every slotted variable except `target`, in ascending order.
    fn combine_and_eliminate(
        factors: &[&Self],
        slots: &VariableSlots,
        target: Key,
    ) -> FactorResult<(SymbolicConditional, SymbolicFactor)> {
        if factors.is_empty() {
            return Err(FactorError::EmptyCombination { variable: target }.log());
        }
        if !slots.contains(target) {
            return Err(FactorError::TargetNotInScope { variable: target }.log());
        }

        let separator: Vec<Key> = slots.keys().filter(|&k| k != target).collect();
        Ok((
            SymbolicConditional::new(target, separator.clone()),
            SymbolicFactor::new(separator),
        ))
    }

    /// A variable nothing constrains is simply a parentless node.
    fn uninformative_conditional(target: Key) -> Option<SymbolicConditional> {
        Some(SymbolicConditional::new(target, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_combine_and_eliminate_unions_scopes() -> TestResult {
        let a = SymbolicFactor::new(vec![3, 1]);
        let b = SymbolicFactor::new(vec![1, 5, 0]);
        let factors = [&a, &b];
        let slots = VariableSlots::new(&factors);

        let (conditional, separator) = SymbolicFactor::combine_and_eliminate(&factors, &slots, 1)?;
        assert_eq!(conditional.frontal(), 1);
        assert_eq!(conditional.parents(), &[0, 3, 5]);
        assert_eq!(separator.keys(), &[0, 3, 5]);
        Ok(())
    }

    #[test]
    fn test_last_variable_gives_prior() -> TestResult {
        let a = SymbolicFactor::new(vec![2]);
        let factors = [&a];
        let slots = VariableSlots::new(&factors);

        let (conditional, separator) = SymbolicFactor::combine_and_eliminate(&factors, &slots, 2)?;
        assert!(conditional.is_prior());
        assert!(separator.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_missing_target() {
        let a = SymbolicFactor::new(vec![0, 1]);
        let factors = [&a];
        let slots = VariableSlots::new(&factors);

        assert_eq!(
            SymbolicFactor::combine_and_eliminate(&factors, &slots, 4),
            Err(FactorError::TargetNotInScope { variable: 4 })
        );
        assert_eq!(
            SymbolicFactor::combine_and_eliminate(&[], &VariableSlots::default(), 0),
            Err(FactorError::EmptyCombination { variable: 0 })
        );
    }

    #[test]
    fn test_permute_conditional() -> TestResult {
        let mut conditional = SymbolicConditional::new(0, vec![1, 2]);
        let p = Permutation::from_vec(vec![2, 0, 1])?;
        conditional.permute_with_inverse(&p);
        assert_eq!(conditional.frontal(), 2);
        assert_eq!(conditional.parents(), &[0, 1]);
        Ok(())
    }
}
