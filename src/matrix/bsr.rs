//! Block Compressed Sparse Row (BSR) matrix format implementation
//!
//! A BSR matrix is a CSR matrix over block rows and block columns in which
//! every stored entry is a dense `block_dim × block_dim` block. Blocks are
//! stored contiguously, row-major within each block, so slot `s` owns
//! `values[s * block_dim² .. (s + 1) * block_dim²]`.

use std::fmt;

use ndarray::Array2;
use num_traits::Num;
use rayon::prelude::*;

use crate::accumulator::sort::sort_row_slots;
use crate::error::{Result, SpgemmError};
use crate::kernels::{self, Trans};
use crate::matrix::pattern::{validate_compressed, SparsityPattern};
use crate::matrix::{Scalar, SparseMatrixCSR};
use crate::utils::split_rows_mut;

/// A sparse matrix in Block Compressed Sparse Row (BSR) format
#[derive(Clone)]
pub struct BlockSparseMatrixBSR<T> {
    /// Number of block rows
    pub n_block_rows: usize,

    /// Number of block columns
    pub n_block_cols: usize,

    /// Edge length of each dense block
    pub block_dim: usize,

    /// Block row pointers (size: n_block_rows + 1)
    pub row_ptr: Vec<usize>,

    /// Block column indices (size: nnz blocks)
    pub col_idx: Vec<usize>,

    /// Block values (size: nnz * block_dim²)
    pub values: Vec<T>,

    label: String,
}

impl<T> BlockSparseMatrixBSR<T>
where
    T: Copy + Num,
{
    /// Creates a new BSR matrix, validating block and compressed-row invariants
    pub fn try_new(
        n_block_rows: usize,
        n_block_cols: usize,
        block_dim: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        let label = String::from("BSR");
        if block_dim == 0 {
            return Err(SpgemmError::invalid_matrix(&label, "block_dim must be positive"));
        }
        validate_compressed(&label, n_block_rows, n_block_cols, &row_ptr, &col_idx)?;
        if values.len() != col_idx.len() * block_dim * block_dim {
            return Err(SpgemmError::invalid_matrix(
                &label,
                format!(
                    "values.len() must be nnz * block_dim² ({} != {} * {}²)",
                    values.len(),
                    col_idx.len(),
                    block_dim
                ),
            ));
        }

        Ok(Self {
            n_block_rows,
            n_block_cols,
            block_dim,
            row_ptr,
            col_idx,
            values,
            label,
        })
    }

    /// Creates a new BSR matrix
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent; see [`Self::try_new`].
    pub fn new(
        n_block_rows: usize,
        n_block_cols: usize,
        block_dim: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        match Self::try_new(n_block_rows, n_block_cols, block_dim, row_ptr, col_idx, values) {
            Ok(matrix) => matrix,
            Err(err) => panic!("{err}"),
        }
    }

    pub(crate) fn from_parts(
        n_block_rows: usize,
        n_block_cols: usize,
        block_dim: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
        label: String,
    ) -> Self {
        debug_assert_eq!(values.len(), col_idx.len() * block_dim * block_dim);
        Self {
            n_block_rows,
            n_block_cols,
            block_dim,
            row_ptr,
            col_idx,
            values,
            label,
        }
    }

    /// Views a CSR matrix as a BSR matrix with 1×1 blocks
    pub fn from_csr(csr: &SparseMatrixCSR<T>) -> Self {
        Self::from_parts(
            csr.n_rows,
            csr.n_cols,
            1,
            csr.row_ptr.clone(),
            csr.col_idx.clone(),
            csr.values.clone(),
            csr.label().to_string(),
        )
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of stored blocks
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Number of scalar rows
    pub fn n_rows(&self) -> usize {
        self.n_block_rows * self.block_dim
    }

    /// Number of scalar columns
    pub fn n_cols(&self) -> usize {
        self.n_block_cols * self.block_dim
    }

    /// Dense row-major values of the block stored in `slot`
    pub fn block(&self, slot: usize) -> &[T] {
        let size = self.block_dim * self.block_dim;
        &self.values[slot * size..(slot + 1) * size]
    }

    /// Borrowed block structure of this matrix
    pub fn pattern(&self) -> SparsityPattern<'_> {
        SparsityPattern {
            n_rows: self.n_block_rows,
            n_cols: self.n_block_cols,
            row_ptr: &self.row_ptr,
            col_idx: &self.col_idx,
        }
    }

    /// Returns the transpose: the block pattern is transposed and every
    /// block is transposed in place of its new slot.
    pub fn transpose(&self) -> Self {
        let (row_ptr, col_idx, positions) = self.pattern().transpose_with_positions();
        let size = self.block_dim * self.block_dim;

        let mut values = vec![T::zero(); self.values.len()];
        for (dst, &src) in values.chunks_exact_mut(size).zip(&positions) {
            kernels::transpose_block(self.block(src), dst, self.block_dim);
        }

        Self::from_parts(
            self.n_block_cols,
            self.n_block_rows,
            self.block_dim,
            row_ptr,
            col_idx,
            values,
            format!("{}^T", self.label),
        )
    }

    /// Expands the matrix into a dense scalar array, summing duplicate blocks
    pub fn to_dense(&self) -> Array2<T> {
        let bd = self.block_dim;
        let mut dense = Array2::zeros((self.n_rows(), self.n_cols()));
        for bi in 0..self.n_block_rows {
            for slot in self.row_ptr[bi]..self.row_ptr[bi + 1] {
                let bj = self.col_idx[slot];
                let block = self.block(slot);
                for r in 0..bd {
                    for c in 0..bd {
                        let cell = &mut dense[[bi * bd + r, bj * bd + c]];
                        *cell = *cell + block[r * bd + c];
                    }
                }
            }
        }
        dense
    }
}

impl<T: Scalar> BlockSparseMatrixBSR<T> {
    /// Block sparse matrix - dense vector product `y = self · x`
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.n_cols() {
            return Err(SpgemmError::DimensionMismatch {
                left_cols: self.n_cols(),
                right_rows: x.len(),
            });
        }

        let bd = self.block_dim;
        let mut y = vec![T::zero(); self.n_rows()];
        for (bi, y_block) in y.chunks_exact_mut(bd).enumerate() {
            for slot in self.row_ptr[bi]..self.row_ptr[bi + 1] {
                let bj = self.col_idx[slot];
                let x_block = &x[bj * bd..(bj + 1) * bd];
                kernels::gemv(Trans::NoTranspose, T::one(), self.block(slot), x_block, T::one(), y_block, bd)?;
            }
        }
        Ok(y)
    }

    /// Sorts the blocks of every block row by block column index
    pub fn sort_rows(&mut self) {
        let width = self.block_dim * self.block_dim;
        let col_rows = split_rows_mut(&mut self.col_idx, &self.row_ptr, 1);
        let val_rows = split_rows_mut(&mut self.values, &self.row_ptr, width);

        col_rows
            .into_par_iter()
            .zip(val_rows)
            .for_each(|(cols, vals)| sort_row_slots(cols, vals, width));
    }
}

impl<T: fmt::Debug> fmt::Debug for BlockSparseMatrixBSR<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BlockSparseMatrixBSR '{}' {{", self.label)?;
        writeln!(
            f,
            "  dimensions: {} × {} blocks of {} × {}",
            self.n_block_rows, self.n_block_cols, self.block_dim, self.block_dim
        )?;
        writeln!(f, "  nnz blocks: {}", self.col_idx.len())?;
        write!(f, "}}")
    }
}
