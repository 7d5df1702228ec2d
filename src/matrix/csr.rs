//! Compressed Sparse Row (CSR) matrix format implementation

use std::fmt;

use ndarray::Array2;
use num_traits::Num;
use rayon::prelude::*;

use crate::accumulator::sort::sort_row_slots;
use crate::error::{Result, SpgemmError};
use crate::matrix::pattern::{validate_compressed, SparsityPattern};
use crate::utils::split_rows_mut;

/// A sparse matrix in Compressed Sparse Row (CSR) format
///
/// The CSR format stores a sparse matrix using three arrays:
/// - row_ptr: Array of size n_rows + 1 containing indices into col_idx and values arrays
/// - col_idx: Array of size nnz containing column indices of non-zero elements
/// - values: Array of size nnz containing the non-zero values
///
/// Column order within a row is whatever the producer left behind; call
/// [`SparseMatrixCSR::sort_rows`] when sorted rows are needed.
#[derive(Clone)]
pub struct SparseMatrixCSR<T> {
    /// Number of rows in the matrix
    pub n_rows: usize,

    /// Number of columns in the matrix
    pub n_cols: usize,

    /// Row pointers (size: n_rows + 1)
    /// row_ptr[i] is the index in col_idx and values where row i starts
    /// row_ptr[n_rows] is equal to nnz
    pub row_ptr: Vec<usize>,

    /// Column indices (size: nnz)
    pub col_idx: Vec<usize>,

    /// Non-zero values (size: nnz)
    pub values: Vec<T>,

    label: String,
}

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num,
{
    /// Creates a new CSR matrix, validating the compressed-row invariants
    ///
    /// Errors with [`SpgemmError::InvalidMatrix`] if:
    /// - row_ptr.len() is not n_rows + 1, row_ptr[0] is not 0, or row_ptr decreases
    /// - col_idx.len() differs from values.len()
    /// - row_ptr[n_rows] differs from col_idx.len()
    /// - a column index is not below n_cols
    pub fn try_new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        let label = String::from("CSR");
        if col_idx.len() != values.len() {
            return Err(SpgemmError::invalid_matrix(
                &label,
                "col_idx.len() must equal values.len()",
            ));
        }
        validate_compressed(&label, n_rows, n_cols, &row_ptr, &col_idx)?;

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
            label,
        })
    }

    /// Creates a new CSR matrix with the given dimensions and data
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent; see [`Self::try_new`].
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        match Self::try_new(n_rows, n_cols, row_ptr, col_idx, values) {
            Ok(matrix) => matrix,
            Err(err) => panic!("{err}"),
        }
    }

    /// Assembles a matrix from arrays the caller has already validated
    pub(crate) fn from_parts(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
        label: String,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), n_rows + 1);
        debug_assert_eq!(col_idx.len(), values.len());
        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
            label,
        }
    }

    /// Replaces the matrix label used in diagnostics
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns the number of stored entries in row i
    pub fn row_nnz(&self, i: usize) -> usize {
        self.row_ptr[i + 1] - self.row_ptr[i]
    }

    /// Borrowed structure of this matrix
    pub fn pattern(&self) -> SparsityPattern<'_> {
        SparsityPattern {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr: &self.row_ptr,
            col_idx: &self.col_idx,
        }
    }

    /// Returns an iterator over the non-zero elements in row i
    ///
    /// Each item is a tuple (col_idx, value) representing a non-zero element
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, &T)> {
        assert!(i < self.n_rows, "Row index out of bounds");

        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];

        self.col_idx[start..end]
            .iter()
            .zip(&self.values[start..end])
            .map(|(&col, val)| (col, val))
    }

    /// Creates an empty matrix with the given dimensions
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self::from_parts(
            n_rows,
            n_cols,
            vec![0; n_rows + 1],
            Vec::new(),
            Vec::new(),
            String::from("CSR"),
        )
    }

    /// Creates an identity matrix of the given size
    pub fn identity(n: usize) -> Self {
        Self::from_parts(
            n,
            n,
            (0..=n).collect(),
            (0..n).collect(),
            vec![T::one(); n],
            String::from("I"),
        )
    }

    /// Returns the transpose as a new CSR matrix
    ///
    /// Entries are bucketed by column with a counting sort, so the rows of the
    /// result are sorted whenever each row of `self` is visited in order.
    pub fn transpose(&self) -> Self {
        let (row_ptr, col_idx, positions) = self.pattern().transpose_with_positions();
        let values = positions.iter().map(|&p| self.values[p]).collect();

        Self::from_parts(
            self.n_cols,
            self.n_rows,
            row_ptr,
            col_idx,
            values,
            format!("{}^T", self.label),
        )
    }

    /// Expands the matrix into a dense array, summing duplicate entries
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros((self.n_rows, self.n_cols));
        for i in 0..self.n_rows {
            for (j, &val) in self.row_iter(i) {
                dense[[i, j]] = dense[[i, j]] + val;
            }
        }
        dense
    }

    /// Sparse matrix - dense vector product `y = self · x`
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.n_cols {
            return Err(SpgemmError::DimensionMismatch {
                left_cols: self.n_cols,
                right_rows: x.len(),
            });
        }
        Ok((0..self.n_rows)
            .map(|i| {
                self.row_iter(i)
                    .fold(T::zero(), |acc, (j, &val)| acc + val * x[j])
            })
            .collect())
    }
}

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num + Send + Sync,
{
    /// Sorts the entries of every row by column index.
    ///
    /// SpGEMM output rows are left in accumulation order; this is the
    /// explicit pass that canonicalizes them. Rows are sorted in parallel.
    pub fn sort_rows(&mut self) {
        let col_rows = split_rows_mut(&mut self.col_idx, &self.row_ptr, 1);
        let val_rows = split_rows_mut(&mut self.values, &self.row_ptr, 1);

        col_rows
            .into_par_iter()
            .zip(val_rows)
            .for_each(|(cols, vals)| sort_row_slots(cols, vals, 1));
    }
}

impl<T: fmt::Debug + Copy + Num> fmt::Debug for SparseMatrixCSR<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseMatrixCSR '{}' {{", self.label)?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  nnz: {}", self.nnz())?;

        // Print a sample of the matrix content
        let max_rows_to_print = 5.min(self.n_rows);

        if max_rows_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_rows_to_print {
                write!(f, "    row {}: ", i)?;
                let start = self.row_ptr[i];
                let end = self.row_ptr[i + 1];

                if start == end {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = 5.min(end - start);

                    for j in start..(start + max_elements) {
                        write!(f, "({}, {:?}) ", self.col_idx[j], self.values[j])?;
                    }

                    if end - start > max_elements {
                        write!(f, "... ({} more)", end - start - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.n_rows > max_rows_to_print {
                writeln!(f, "    ... ({} more rows)", self.n_rows - max_rows_to_print)?;
            }
        }

        write!(f, "}}")
    }
}
