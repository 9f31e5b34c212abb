//! Dense linear algebra primitives
//!
//! The sensing matrix H maps an unknown image (length n) to projection
//! measurements (length m). Solvers only ever need H·v, Hᵗ·v, dot products
//! and Euclidean norms, so that is all this module provides.
//!
//! Every product accumulates in a fixed order (row by row, left to right), so
//! a given input always produces bit-identical output on the same build.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{ReconError, Result};
use crate::utils::simd_ops::{axpy_f64, dot_product_f64};

/// Dense m×n sensing (projection) matrix, stored row-major
#[derive(Clone, Debug, PartialEq)]
pub struct SensingMatrix {
    data: Array2<f64>,
}

impl SensingMatrix {
    /// Build a matrix from row-major data
    ///
    /// # Arguments
    /// * `rows` - Number of measurements (m)
    /// * `cols` - Number of unknowns (n)
    /// * `data` - Row-major values, length m * n
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(ReconError::EmptyMatrix { rows, cols });
        }
        let len = data.len();
        // rows * cols can overflow usize on wasm32
        let expected = rows.checked_mul(cols).ok_or(ReconError::DimensionMismatch {
            operation: "matrix construction",
            expected: usize::MAX,
            actual: len,
        })?;
        if len != expected {
            return Err(ReconError::DimensionMismatch {
                operation: "matrix construction",
                expected,
                actual: len,
            });
        }
        let data = Array2::from_shape_vec((rows, cols), data).map_err(|_| {
            ReconError::DimensionMismatch {
                operation: "matrix construction",
                expected,
                actual: len,
            }
        })?;
        Ok(Self { data })
    }

    /// Build a matrix from a list of equally long rows
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let m = rows.len();
        let n = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(m * n);
        for row in rows {
            if row.len() != n {
                return Err(ReconError::DimensionMismatch {
                    operation: "matrix construction",
                    expected: n,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_row_major(m, n, data)
    }

    /// m×m identity matrix
    pub fn identity(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ReconError::EmptyMatrix { rows: 0, cols: 0 });
        }
        Ok(Self {
            data: Array2::eye(size),
        })
    }

    /// Number of measurements (m)
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of unknowns (n)
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// (m, n)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// Dot product of two equally long vectors
pub fn dot(u: &[f64], v: &[f64]) -> Result<f64> {
    if u.len() != v.len() {
        return Err(ReconError::DimensionMismatch {
            operation: "dot",
            expected: u.len(),
            actual: v.len(),
        });
    }
    Ok(dot_product_f64(u, v))
}

/// Matrix-vector product H·v (length m)
pub fn matvec(h: &SensingMatrix, v: &[f64]) -> Result<Vec<f64>> {
    if v.len() != h.cols() {
        return Err(ReconError::DimensionMismatch {
            operation: "matvec",
            expected: h.cols(),
            actual: v.len(),
        });
    }
    Ok(h.data.outer_iter().map(|row| row_dot(row, v)).collect())
}

/// Transposed product Hᵗ·v (length n)
///
/// Accumulated as a sum of scaled rows, so each output entry is summed over
/// the rows in index order.
pub fn matvec_transpose(h: &SensingMatrix, v: &[f64]) -> Result<Vec<f64>> {
    if v.len() != h.rows() {
        return Err(ReconError::DimensionMismatch {
            operation: "matvec_transpose",
            expected: h.rows(),
            actual: v.len(),
        });
    }
    let mut out = vec![0.0; h.cols()];
    for (row, &vi) in h.data.outer_iter().zip(v.iter()) {
        match row.as_slice() {
            Some(slice) => axpy_f64(&mut out, vi, slice),
            None => {
                for (o, &hij) in out.iter_mut().zip(row.iter()) {
                    *o += vi * hij;
                }
            }
        }
    }
    Ok(out)
}

/// Euclidean norm
pub fn norm2(v: &[f64]) -> f64 {
    dot_product_f64(v, v).sqrt()
}

fn row_dot(row: ArrayView1<'_, f64>, v: &[f64]) -> f64 {
    match row.as_slice() {
        Some(slice) => dot_product_f64(slice, v),
        None => row.iter().zip(v.iter()).fold(0.0, |acc, (&a, &b)| acc + a * b),
    }
}
