//! Permutations of the variable range `[0, n)`.
//!
//! A [`Permutation`] is the algebraic object the elimination engine uses to reorder
//! variables: pulling variables to the front for priority elimination, pushing them to the
//! back for marginalization, and mapping between natural graph labels and elimination order.
//!
//! # Convention
//!
//! `p[i]` answers "which original variable now sits at position `i`". To relabel a graph into
//! the permuted order, every key `k` is replaced by `p.inverse()[k]`:
//!
//! ```text
//! p        = [2, 0, 1, 3]      position 0 holds variable 2, ...
//! inverse  = [1, 2, 0, 3]      variable 0 moves to position 1, ...
//! ```
//!
//! # Example
//!
//! ```
//! use apex_inference::core::Permutation;
//! # use apex_inference::core::CoreResult;
//! # fn example() -> CoreResult<()> {
//!
//! let front = Permutation::pull_to_front(&[2, 0], 4)?;
//! assert_eq!(front.as_slice(), &[2, 0, 1, 3]);
//!
//! let back = Permutation::push_to_back(&[2, 0], 4)?;
//! assert_eq!(back.as_slice(), &[1, 3, 2, 0]);
//!
//! let round_trip = front.compose(&front.inverse()?)?;
//! assert!(round_trip.is_identity());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::{
    fmt,
    fmt::{Display, Formatter},
    ops::Index,
    slice,
};

use crate::core::{CoreError, CoreResult};

/// A bijection over `[0, n)`.
///
/// Built once and then treated as immutable: every operation returns a new permutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Permutation {
    range_indices: Vec<usize>,
}

impl Permutation {
    /// The identity permutation of size `n`: `p[i] = i`.
    pub fn identity(n: usize) -> Self {
        Self {
            range_indices: (0..n).collect(),
        }
    }

    /// Build a permutation from explicit values, checking the bijection invariant.
    ///
    /// # Errors
    /// [`CoreError::NotABijection`] if `values` is not exactly `{0, ..., len-1}`.
    pub fn from_vec(values: Vec<usize>) -> CoreResult<Self> {
        check_bijection(&values, "Permutation::from_vec")?;
        Ok(Self {
            range_indices: values,
        })
    }

    /// Move `to_front` to positions `0..k` in the given order; every other variable keeps its
    /// ascending order in positions `k..n`.
    ///
    /// # Errors
    /// Contract violation if a target is `>= n` or appears twice.
    pub fn pull_to_front(to_front: &[usize], n: usize) -> CoreResult<Self> {
        const OPERATION: &str = "Permutation::pull_to_front";
        let pulled = target_mask(to_front, n, OPERATION)?;

        let mut range_indices = Vec::with_capacity(n);
        range_indices.extend_from_slice(to_front);
        range_indices.extend((0..n).filter(|&j| !pulled[j]));

        Ok(Self { range_indices })
    }

    /// Move `to_back` to the last `k` positions in the given order; every other variable keeps
    /// its ascending order in positions `0..n-k`.
    ///
    /// # Errors
    /// Contract violation if a target is `>= n` or appears twice.
    pub fn push_to_back(to_back: &[usize], n: usize) -> CoreResult<Self> {
        const OPERATION: &str = "Permutation::push_to_back";
        let pushed = target_mask(to_back, n, OPERATION)?;

        let mut range_indices = Vec::with_capacity(n);
        range_indices.extend((0..n).filter(|&j| !pushed[j]));
        range_indices.extend_from_slice(to_back);

        Ok(Self { range_indices })
    }

    /// Apply `self` after mapping through `other`: `result[j] = self[other[j]]`.
    ///
    /// # Errors
    /// [`CoreError::LengthMismatch`] if the two permutations differ in size.
    pub fn compose(&self, other: &Permutation) -> CoreResult<Self> {
        if other.len() != self.len() {
            return Err(CoreError::LengthMismatch {
                operation: "Permutation::compose",
                left: self.len(),
                right: other.len(),
            }
            .log());
        }
        let range_indices = other.iter().map(|&j| self.range_indices[j]).collect();
        Ok(Self { range_indices })
    }

    /// Apply `sub` only at the positions named by `selector`, leaving all others unchanged:
    /// `result[selector[j]] = self[selector[sub[j]]]`.
    ///
    /// # Errors
    /// Contract violation if `selector` and `sub` differ in length, or a selector entry is
    /// outside `[0, self.len())` or repeated. `sub` is a permutation of `[0, selector.len())`.
    pub fn partial_apply(&self, selector: &[usize], sub: &Permutation) -> CoreResult<Self> {
        const OPERATION: &str = "Permutation::partial_apply";
        if selector.len() != sub.len() {
            return Err(CoreError::LengthMismatch {
                operation: OPERATION,
                left: selector.len(),
                right: sub.len(),
            }
            .log());
        }
        target_mask(selector, self.len(), OPERATION)?;

        let mut result = self.clone();
        for (subset_pos, &target) in selector.iter().enumerate() {
            let source = selector[sub[subset_pos]];
            result.range_indices[target] = self.range_indices[source];
        }
        Ok(result)
    }

    /// The unique `q` with `q[self[i]] = i`.
    ///
    /// # Errors
    /// [`CoreError::NotABijection`] if the invariant has been broken.
    pub fn inverse(&self) -> CoreResult<Self> {
        check_bijection(&self.range_indices, "Permutation::inverse")?;
        let mut range_indices = vec![0; self.len()];
        for (i, &j) in self.range_indices.iter().enumerate() {
            range_indices[j] = i;
        }
        Ok(Self { range_indices })
    }

    pub fn len(&self) -> usize {
        self.range_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range_indices.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.range_indices.iter().enumerate().all(|(i, &j)| i == j)
    }

    pub fn iter(&self) -> slice::Iter<'_, usize> {
        self.range_indices.iter()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.range_indices
    }
}

impl Index<usize> for Permutation {
    type Output = usize;

    fn index(&self, position: usize) -> &usize {
        &self.range_indices[position]
    }
}

impl<'a> IntoIterator for &'a Permutation {
    type Item = &'a usize;
    type IntoIter = slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Permutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, value) in self.range_indices.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Mark `targets` in a mask of size `n`, rejecting out-of-range and repeated entries.
fn target_mask(targets: &[usize], n: usize, operation: &'static str) -> CoreResult<Vec<bool>> {
    let mut mask = vec![false; n];
    for &target in targets {
        if target >= n {
            return Err(CoreError::PermutationIndexOutOfRange {
                operation,
                index: target,
                size: n,
            }
            .log());
        }
        if mask[target] {
            return Err(CoreError::DuplicatePermutationEntry {
                operation,
                index: target,
            }
            .log());
        }
        mask[target] = true;
    }
    Ok(mask)
}

fn check_bijection(values: &[usize], operation: &'static str) -> CoreResult<()> {
    let size = values.len();
    let mut seen = vec![false; size];
    for (position, &value) in values.iter().enumerate() {
        if value >= size || seen[value] {
            return Err(CoreError::NotABijection {
                operation,
                size,
                position,
                value,
            }
            .log());
        }
        seen[value] = true;
    }
    Ok(())
}
