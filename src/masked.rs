//! Masked arrays: a value array paired with a per-cell validity mask
//!
//! Every reduction in the crate goes through [`MaskedArray`], so missing data is
//! handled in one place: invalid cells contribute nothing to sums, counts or
//! means, and a reduction that sees no valid cell produces an invalid cell.

use crate::errors::{GridError, Result};
use ndarray::{Array, Array3, ArrayView1, Axis, Dimension, Ix2, Ix3, NdIndex, RemoveAxis, Zip};

/// An `f64` array with a same-shaped validity mask
///
/// Non-finite values are always invalid, whatever the mask says.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray<D: Dimension> {
    values: Array<f64, D>,
    valid: Array<bool, D>,
}

impl<D: Dimension> MaskedArray<D> {
    /// Pair `values` with an explicit validity mask
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if the two arrays differ in shape.
    pub fn new(values: Array<f64, D>, valid: Array<bool, D>) -> Result<Self> {
        if values.shape() != valid.shape() {
            return Err(GridError::ShapeMismatch {
                expected: values.shape().to_vec(),
                found: valid.shape().to_vec(),
            });
        }
        let valid = Zip::from(&values)
            .and(&valid)
            .map_collect(|v, &m| m && v.is_finite());
        Ok(Self { values, valid })
    }

    /// Treat NaN and infinite values as missing
    pub fn from_values(values: Array<f64, D>) -> Self {
        let valid = values.mapv(f64::is_finite);
        Self { values, valid }
    }

    /// Treat cells equal to `fill` (and non-finite cells) as missing
    pub fn from_fill_value(values: Array<f64, D>, fill: f64) -> Self {
        let valid = values.mapv(|v| v.is_finite() && v != fill);
        Self { values, valid }
    }

    pub fn values(&self) -> &Array<f64, D> {
        &self.values
    }

    pub fn validity(&self) -> &Array<bool, D> {
        &self.valid
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, or `None` when the cell is missing or out of bounds
    pub fn get<I: NdIndex<D> + Copy>(&self, index: I) -> Option<f64> {
        match self.valid.get(index) {
            Some(&true) => self.values.get(index).copied(),
            _ => None,
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&m| m).count()
    }

    pub fn valid_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .zip(self.valid.iter())
            .filter(|&(_, &m)| m)
            .fold(None, |acc, (&v, _)| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl<D: Dimension + RemoveAxis> MaskedArray<D> {
    /// Reduce every lane along `axis` with `f`, in parallel
    ///
    /// `f` sees the raw lane values and validity flags; returning `None` marks
    /// the output cell missing.
    pub fn reduce_lanes<F>(&self, axis: Axis, f: F) -> MaskedArray<D::Smaller>
    where
        F: Fn(ArrayView1<f64>, ArrayView1<bool>) -> Option<f64> + Sync + Send,
    {
        let reduced = Zip::from(self.values.lanes(axis))
            .and(self.valid.lanes(axis))
            .par_map_collect(|values, valid| f(values, valid));

        MaskedArray {
            values: reduced.mapv(|r| r.unwrap_or(f64::NAN)),
            valid: reduced.mapv(|r| r.is_some()),
        }
    }

    /// Mean of the valid cells along `axis`
    pub fn mean_axis(&self, axis: Axis) -> MaskedArray<D::Smaller> {
        self.reduce_lanes(axis, |values, valid| {
            mean_of(
                values
                    .iter()
                    .zip(valid.iter())
                    .filter(|&(_, &m)| m)
                    .map(|(&v, _)| v),
            )
        })
    }

    /// Number of valid cells along `axis` satisfying `predicate`
    ///
    /// Counts are always valid, even when a lane holds no valid cell.
    pub fn count_axis<P>(&self, axis: Axis, predicate: P) -> MaskedArray<D::Smaller>
    where
        P: Fn(f64) -> bool + Sync + Send,
    {
        self.reduce_lanes(axis, |values, valid| {
            let count = values
                .iter()
                .zip(valid.iter())
                .filter(|&(&v, &m)| m && predicate(v))
                .count();
            Some(count as f64)
        })
    }

    /// Copy of the cells at `indices` along `axis`, in the given order
    pub fn select_axis(&self, axis: Axis, indices: &[usize]) -> Self {
        Self {
            values: self.values.select(axis, indices),
            valid: self.valid.select(axis, indices),
        }
    }

    /// Sub-array at position `index` along `axis`
    pub fn index_axis(&self, axis: Axis, index: usize) -> MaskedArray<D::Smaller> {
        MaskedArray {
            values: self.values.index_axis(axis, index).to_owned(),
            valid: self.valid.index_axis(axis, index).to_owned(),
        }
    }
}

impl MaskedArray<Ix3> {
    /// Stack 2-D planes along a new leading axis
    ///
    /// `plane` is the expected shape of each part; it also gives the shape of
    /// the result when `planes` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if a plane has another shape.
    pub fn stack_planes(planes: &[MaskedArray<Ix2>], plane: (usize, usize)) -> Result<Self> {
        let mut values = Array3::from_elem((planes.len(), plane.0, plane.1), f64::NAN);
        let mut valid = Array3::from_elem((planes.len(), plane.0, plane.1), false);

        for (i, part) in planes.iter().enumerate() {
            if part.shape() != &[plane.0, plane.1][..] {
                return Err(GridError::ShapeMismatch {
                    expected: vec![plane.0, plane.1],
                    found: part.shape().to_vec(),
                });
            }
            values.index_axis_mut(Axis(0), i).assign(&part.values);
            valid.index_axis_mut(Axis(0), i).assign(&part.valid);
        }

        Ok(Self { values, valid })
    }
}

impl MaskedArray<Ix2> {
    /// Fold the valid cells of a 2-D array with their `(row, column)` index
    pub fn fold_valid<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, (usize, usize), f64) -> A,
    {
        let mut acc = init;
        for ((idx, &v), &m) in self.values.indexed_iter().zip(self.valid.iter()) {
            if m {
                acc = f(acc, idx, v);
            }
        }
        acc
    }
}

/// Arithmetic mean of an iterator, `None` when it is empty
pub(crate) fn mean_of<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use ndarray::array;

    #[test]
    fn non_finite_values_are_invalid() {
        let m = MaskedArray::new(array![1.0, f64::NAN, 3.0], array![true, true, false]).unwrap();
        assert_eq!(m.valid_count(), 1);
        assert_eq!(m.get(0), Some(1.0));
        assert_eq!(m.get(1), None);
        assert_eq!(m.get(2), None);
    }

    #[test]
    fn mean_skips_missing_cells() {
        let m = MaskedArray::from_values(array![[1.0, f64::NAN], [3.0, 5.0]]);
        let mean = m.mean_axis(Axis(1));
        assert_eq!(mean.get(0), Some(1.0));
        assert_eq!(mean.get(1), Some(4.0));
    }

    #[test]
    fn all_missing_lane_reduces_to_missing() {
        let m = MaskedArray::from_values(array![[f64::NAN, f64::NAN], [2.0, 2.0]]);
        let mean = m.mean_axis(Axis(1));
        assert_eq!(mean.get(0), None);
        assert!(mean.values()[0].is_nan());
    }

    #[test]
    fn fill_value_masks_cells() {
        let m = MaskedArray::from_fill_value(array![1.0, -999.0, 2.0], -999.0);
        assert_eq!(m.valid_count(), 2);
        assert_eq!(m.valid_range(), Some((1.0, 2.0)));
    }

    #[test]
    fn stack_rejects_mismatched_planes() {
        let plane = MaskedArray::from_values(Array2::<f64>::zeros((2, 3)));
        assert!(MaskedArray::stack_planes(&[plane.clone()], (2, 3)).is_ok());
        assert!(MaskedArray::stack_planes(&[plane], (3, 2)).is_err());
    }
}
