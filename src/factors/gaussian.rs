//! Gaussian factors in information form.
//!
//! A [`GaussianFactor`] over block variables `x = [x_1; ...; x_k]` represents the quadratic
//!
//! ```text
//! f(x) = ½ xᵀ Λ x - ηᵀ x
//! ```
//!
//! where `Λ` (information matrix) is laid out in the factor's own key order, each key
//! occupying `dims[i]` rows and columns.
//!
//! # Elimination
//!
//! All factors touching the frontal variable `x` are scattered into one joint system, with `x`
//! first and the separator `s` after it in ascending key order:
//!
//! ```text
//! Λ = | Λ_xx  Λ_xs |     η = | η_x |
//!     | Λ_sx  Λ_ss |         | η_s |
//! ```
//!
//! With `Λ_xx = L Lᵀ` (Cholesky), the conditional is `R x + S s = d` with `R = Lᵀ`,
//! `S = L⁻¹ Λ_xs`, `d = L⁻¹ η_x`, and the separator factor is the Schur complement
//! `Λ' = Λ_ss - Sᵀ S`, `η' = η_s - Sᵀ d`.
//!
//! A frontal block that is not positive definite means the variable is not determined by the
//! factors touching it; this surfaces as [`FactorError::NotPositiveDefinite`].

use std::collections::BTreeMap;

use nalgebra::{Cholesky, DMatrix, DVector};

use crate::core::{
    BayesNet, Conditional, EliminableFactor, Factor, Key, Permutation, VariableSlots,
    repeated_key,
};
use crate::factors::{FactorError, FactorResult};

/// Quadratic factor `½ xᵀ Λ x - ηᵀ x` over block variables.
///
/// # Example
///
/// ```
/// use apex_inference::factors::GaussianFactor;
/// use nalgebra::{DMatrix, DVector};
/// # use apex_inference::factors::FactorResult;
/// # fn example() -> FactorResult<()> {
///
/// // Between constraint x1 - x0 = 1 on two scalar variables
/// let between = GaussianFactor::from_jacobian(
///     vec![0, 1],
///     vec![DMatrix::from_element(1, 1, -1.0), DMatrix::from_element(1, 1, 1.0)],
///     DVector::from_element(1, 1.0),
/// )?;
/// assert_eq!(between.information()[(0, 1)], -1.0);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianFactor {
    keys: Vec<Key>,
    dims: Vec<usize>,
    information: DMatrix<f64>,
    information_vector: DVector<f64>,
}

impl GaussianFactor {
    /// Build a factor directly from `Λ` and `η`.
    ///
    /// # Errors
    /// [`FactorError::InvalidFactor`] if `keys` and `dims` differ in length, a key is repeated,
    /// or the matrix and vector sizes do not match the total dimension.
    pub fn new(
        keys: Vec<Key>,
        dims: Vec<usize>,
        information: DMatrix<f64>,
        information_vector: DVector<f64>,
    ) -> FactorResult<Self> {
        if keys.len() != dims.len() {
            return Err(FactorError::InvalidFactor(format!(
                "{} keys but {} block dimensions",
                keys.len(),
                dims.len()
            ))
            .log());
        }
        if let Some(key) = repeated_key(&keys) {
            return Err(
                FactorError::InvalidFactor(format!("variable {key} listed more than once")).log(),
            );
        }
        let total: usize = dims.iter().sum();
        if information.nrows() != total
            || information.ncols() != total
            || information_vector.len() != total
        {
            return Err(FactorError::InvalidFactor(format!(
                "information {}x{} and vector {} do not match total dimension {}",
                information.nrows(),
                information.ncols(),
                information_vector.len(),
                total
            ))
            .log());
        }
        Ok(Self {
            keys,
            dims,
            information,
            information_vector,
        })
    }

    /// Build the information form of the whitened least-squares term `||Σ_i A_i x_i - b||²`.
    ///
    /// # Errors
    /// [`FactorError::InvalidFactor`] if the blocks do not all have `b.len()` rows, or the
    /// number of blocks differs from the number of keys.
    pub fn from_jacobian(
        keys: Vec<Key>,
        blocks: Vec<DMatrix<f64>>,
        rhs: DVector<f64>,
    ) -> FactorResult<Self> {
        if keys.len() != blocks.len() {
            return Err(FactorError::InvalidFactor(format!(
                "{} keys but {} Jacobian blocks",
                keys.len(),
                blocks.len()
            ))
            .log());
        }
        let rows = rhs.len();
        if let Some(bad) = blocks.iter().find(|a| a.nrows() != rows) {
            return Err(FactorError::InvalidFactor(format!(
                "Jacobian block has {} rows, right-hand side has {}",
                bad.nrows(),
                rows
            ))
            .log());
        }

        let dims: Vec<usize> = blocks.iter().map(DMatrix::ncols).collect();
        let mut jacobian = DMatrix::zeros(rows, dims.iter().sum());
        let mut col = 0;
        for block in &blocks {
            jacobian
                .view_mut((0, col), (rows, block.ncols()))
                .copy_from(block);
            col += block.ncols();
        }

        let information = jacobian.transpose() * &jacobian;
        let information_vector = jacobian.transpose() * &rhs;
        Self::new(keys, dims, information, information_vector)
    }

    /// Prior `x_key ~ N(mean, σ² I)`.
    pub fn prior(key: Key, mean: DVector<f64>, sigma: f64) -> FactorResult<Self> {
        let dim = mean.len();
        let precision = 1.0 / (sigma * sigma);
        Self::new(
            vec![key],
            vec![dim],
            DMatrix::identity(dim, dim) * precision,
            mean * precision,
        )
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn information(&self) -> &DMatrix<f64> {
        &self.information
    }

    pub fn information_vector(&self) -> &DVector<f64> {
        &self.information_vector
    }

    /// Total dimension of the factor.
    pub fn dim(&self) -> usize {
        self.information_vector.len()
    }
}

impl Factor for GaussianFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn permute_with_inverse(&mut self, inverse: &Permutation) {
        for key in &mut self.keys {
            *key = inverse[*key];
        }
    }
}

/// `R x + S s = d`, the Gaussian density of one frontal block given its parents.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianConditional {
    frontal: Key,
    parents: Vec<Key>,
    parent_dims: Vec<usize>,
    r: DMatrix<f64>,
    s: DMatrix<f64>,
    d: DVector<f64>,
}

impl GaussianConditional {
    /// Upper-triangular square-root information of the frontal block.
    pub fn r(&self) -> &DMatrix<f64> {
        &self.r
    }

    /// Coupling to the parents, columns in parent order.
    pub fn s(&self) -> &DMatrix<f64> {
        &self.s
    }

    pub fn d(&self) -> &DVector<f64> {
        &self.d
    }

    pub fn parent_dims(&self) -> &[usize] {
        &self.parent_dims
    }

    /// Solve `x = R⁻¹ (d - S s)` given the parents' values in parent order.
    ///
    /// # Errors
    /// [`FactorError::DimensionMismatch`] if a parent value has the wrong size.
    pub fn solve(&self, parent_values: &[&DVector<f64>]) -> FactorResult<DVector<f64>> {
        if parent_values.len() != self.parents.len() {
            return Err(FactorError::InvalidFactor(format!(
                "conditional on {} has {} parents, got {} values",
                self.frontal,
                self.parents.len(),
                parent_values.len()
            ))
            .log());
        }

        let mut rhs = self.d.clone();
        let mut col = 0;
        for ((&parent, &dim), value) in self
            .parents
            .iter()
            .zip(&self.parent_dims)
            .zip(parent_values)
        {
            if value.len() != dim {
                return Err(FactorError::DimensionMismatch {
                    variable: parent,
                    expected: dim,
                    actual: value.len(),
                }
                .log());
            }
            rhs -= self.s.columns(col, dim) * *value;
            col += dim;
        }

        self.r
            .solve_upper_triangular(&rhs)
            .ok_or_else(|| FactorError::NotPositiveDefinite {
                variable: self.frontal,
            }
            .log())
    }
}

impl Conditional for GaussianConditional {
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

impl EliminableFactor for GaussianFactor {
    type Conditional = GaussianConditional;

    fn combine_and_eliminate(
        factors: &[&Self],
        slots: &VariableSlots,
        target: Key,
    ) -> FactorResult<(GaussianConditional, GaussianFactor)> {
        if factors.is_empty() {
            return Err(FactorError::EmptyCombination { variable: target }.log());
        }
        if !slots.contains(target) {
            return Err(FactorError::TargetNotInScope { variable: target }.log());
        }

        // Joint column order: frontal first, then the separator in ascending key order.
        let order: Vec<Key> = std::iter::once(target)
            .chain(slots.keys().filter(|&k| k != target))
            .collect();

        let mut dims = Vec::with_capacity(order.len());
        for &key in &order {
            dims.push(slot_dimension(factors, slots, key)?);
        }
        let offsets = prefix_offsets(&dims);
        let total = offsets[offsets.len() - 1];

        let mut information = DMatrix::zeros(total, total);
        let mut information_vector = DVector::zeros(total);
        for (factor_pos, factor) in factors.iter().enumerate() {
            // Joint position of each of this factor's own columns.
            let mut local_to_joint = vec![0; factor.keys.len()];
            for (joint, &key) in order.iter().enumerate() {
                if let Some(row) = slots.get(key)
                    && row[factor_pos] != VariableSlots::ABSENT
                {
                    local_to_joint[row[factor_pos]] = joint;
                }
            }
            scatter_add(
                factor,
                &local_to_joint,
                &offsets,
                &mut information,
                &mut information_vector,
            );
        }

        let dx = dims[0];
        let ns = total - dx;
        let lambda_xx = information.view((0, 0), (dx, dx)).into_owned();
        let lambda_xs = information.view((0, dx), (dx, ns)).into_owned();
        let lambda_ss = information.view((dx, dx), (ns, ns)).into_owned();
        let eta_x = information_vector.rows(0, dx).into_owned();
        let eta_s = information_vector.rows(dx, ns).into_owned();

        let not_pd = || FactorError::NotPositiveDefinite { variable: target };
        let l = Cholesky::new(lambda_xx)
            .ok_or_else(|| not_pd().log())?
            .l();
        let s = l
            .solve_lower_triangular(&lambda_xs)
            .ok_or_else(|| not_pd().log())?;
        let d = l
            .solve_lower_triangular(&eta_x)
            .ok_or_else(|| not_pd().log())?;

        let separator_information = lambda_ss - s.transpose() * &s;
        let separator_vector = eta_s - s.transpose() * &d;

        let parents = order[1..].to_vec();
        let parent_dims = dims[1..].to_vec();
        let conditional = GaussianConditional {
            frontal: target,
            parents: parents.clone(),
            parent_dims: parent_dims.clone(),
            r: l.transpose(),
            s,
            d,
        };
        let separator =
            GaussianFactor::new(parents, parent_dims, separator_information, separator_vector)?;
        Ok((conditional, separator))
    }
}

/// Back-substitute a Gaussian Bayes net, last conditional first.
///
/// # Errors
/// [`FactorError::InvalidFactor`] if a conditional's parent has not been solved yet, which
/// means the net is not in elimination order.
pub fn back_substitute(
    bayes_net: &BayesNet<GaussianConditional>,
) -> FactorResult<BTreeMap<Key, DVector<f64>>> {
    let mut solution: BTreeMap<Key, DVector<f64>> = BTreeMap::new();
    for conditional in bayes_net.iter().rev() {
        let parent_values = conditional
            .parents()
            .iter()
            .map(|parent| {
                solution.get(parent).ok_or_else(|| {
                    FactorError::InvalidFactor(format!(
                        "parent {} of {} solved out of order",
                        parent,
                        conditional.frontal()
                    ))
                    .log()
                })
            })
            .collect::<FactorResult<Vec<_>>>()?;
        let value = conditional.solve(&parent_values)?;
        solution.insert(conditional.frontal(), value);
    }
    Ok(solution)
}

/// Dimension of `key` as agreed on by every factor that mentions it.
fn slot_dimension(factors: &[&GaussianFactor], slots: &VariableSlots, key: Key) -> FactorResult<usize> {
    let mut dim = None;
    if let Some(row) = slots.get(key) {
        for (factor, &slot) in factors.iter().zip(row) {
            if slot == VariableSlots::ABSENT {
                continue;
            }
            let actual = factor.dims[slot];
            match dim {
                None => dim = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(FactorError::DimensionMismatch {
                        variable: key,
                        expected,
                        actual,
                    }
                    .log());
                }
                Some(_) => {}
            }
        }
    }
    dim.ok_or_else(|| FactorError::TargetNotInScope { variable: key }.log())
}

fn prefix_offsets(dims: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(dims.len() + 1);
    offsets.push(0);
    for &dim in dims {
        offsets.push(offsets[offsets.len() - 1] + dim);
    }
    offsets
}

/// Add `factor`'s blocks into the joint system at the positions given by `local_to_joint`.
fn scatter_add(
    factor: &GaussianFactor,
    local_to_joint: &[usize],
    joint_offsets: &[usize],
    information: &mut DMatrix<f64>,
    information_vector: &mut DVector<f64>,
) {
    let local_offsets = prefix_offsets(&factor.dims);
    for (i, &ji) in local_to_joint.iter().enumerate() {
        let (li, gi) = (local_offsets[i], joint_offsets[ji]);
        for a in 0..factor.dims[i] {
            information_vector[gi + a] += factor.information_vector[li + a];
        }
        for (j, &jj) in local_to_joint.iter().enumerate() {
            let (lj, gj) = (local_offsets[j], joint_offsets[jj]);
            for a in 0..factor.dims[i] {
                for b in 0..factor.dims[j] {
                    information[(gi + a, gj + b)] += factor.information[(li + a, lj + b)];
                }
            }
        }
    }
}
