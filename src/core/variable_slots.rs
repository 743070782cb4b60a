//! Column alignment of factors that are about to be combined.
//!
//! When a variable is eliminated, every factor touching it is combined into one joint
//! factor. Those factors mention different variables, in different orders. [`VariableSlots`]
//! records, for every variable in the union of their scopes, where that variable sits inside
//! each input factor:
//!
//! ```text
//! A: [x0, x1]      B: [x1, x2]
//!
//!   Var   A   B
//!   0     0   x       x0 is column 0 of A, absent from B
//!   1     1   0
//!   2     x   1
//! ```
//!
//! Variables are kept in ascending id order, which becomes the column order of the combined
//! representation.

use std::{
    collections::{BTreeMap, btree_map},
    fmt,
    fmt::{Display, Formatter},
};

use crate::core::{Factor, Key};

/// Variable → per-factor column position table for one elimination step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableSlots {
    slots: BTreeMap<Key, Vec<usize>>,
    num_factors: usize,
}

impl VariableSlots {
    /// Marker for "this variable does not appear in that factor".
    pub const ABSENT: usize = usize::MAX;

    /// Build the slot table over `factors`, in the given factor order.
    pub fn new<F: Factor>(factors: &[&F]) -> Self {
        let num_factors = factors.len();
        let mut slots: BTreeMap<Key, Vec<usize>> = BTreeMap::new();

        for (factor_pos, factor) in factors.iter().enumerate() {
            for (column, &key) in factor.keys().iter().enumerate() {
                let row = slots
                    .entry(key)
                    .or_insert_with(|| vec![Self::ABSENT; num_factors]);
                row[factor_pos] = column;
            }
        }

        Self { slots, num_factors }
    }

    /// Positions of `key` in each input factor, or `None` if no input factor mentions it.
    pub fn get(&self, key: Key) -> Option<&[usize]> {
        self.slots.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.slots.contains_key(&key)
    }

    /// Variables in ascending id order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.slots.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Key, Vec<usize>> {
        self.slots.iter()
    }

    /// Number of distinct variables.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of input factors, i.e. the length of every row.
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }
}

impl<'a> IntoIterator for &'a VariableSlots {
    type Item = (&'a Key, &'a Vec<usize>);
    type IntoIter = btree_map::Iter<'a, Key, Vec<usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One row per variable, one column per factor; absent entries print as `x`.
impl Display for VariableSlots {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "empty");
        }

        write!(f, "Var")?;
        for factor_pos in 0..self.num_factors {
            write!(f, "\tf{factor_pos}")?;
        }
        writeln!(f)?;

        for (key, row) in &self.slots {
            write!(f, "{key}")?;
            for &slot in row {
                if slot == Self::ABSENT {
                    write!(f, "\tx")?;
                } else {
                    write!(f, "\t{slot}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
