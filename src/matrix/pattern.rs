//! Sparsity structure shared by CSR and BSR matrices
//!
//! The symbolic phase only looks at row pointers and column indices, so it
//! operates on a borrowed [`SparsityPattern`] rather than on a full matrix.
//! Its output is a [`CsrStructure`]: C's row map and total entry count.

use crate::error::{Result, SpgemmError};

/// Borrowed row-pointer / column-index view of a compressed-row matrix.
///
/// For BSR matrices the dimensions count block rows and block columns.
#[derive(Debug, Clone, Copy)]
pub struct SparsityPattern<'a> {
    /// Number of (block) rows
    pub n_rows: usize,
    /// Number of (block) columns
    pub n_cols: usize,
    /// Row pointers, length `n_rows + 1`
    pub row_ptr: &'a [usize],
    /// Column indices, length `nnz`
    pub col_idx: &'a [usize],
}

impl<'a> SparsityPattern<'a> {
    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.row_ptr[self.n_rows]
    }

    /// Column indices of row `i`
    pub fn row(&self, i: usize) -> &'a [usize] {
        &self.col_idx[self.row_ptr[i]..self.row_ptr[i + 1]]
    }

    /// Upper bound on the number of intermediate products in row `i` of
    /// `self · other`: the sum of the lengths of the rows of `other` selected
    /// by row `i` of `self`.
    pub fn row_flops(&self, i: usize, other: &SparsityPattern<'_>) -> usize {
        self.row(i)
            .iter()
            .map(|&k| other.row_ptr[k + 1] - other.row_ptr[k])
            .sum()
    }

    /// Transposed structure (values are not involved)
    pub fn transpose(&self) -> PatternBuf {
        let (row_ptr, col_idx, _) = self.transpose_with_positions();
        PatternBuf {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            row_ptr,
            col_idx,
        }
    }

    /// Counting-sort transpose.
    ///
    /// Returns the transposed row pointers and column indices, plus for every
    /// transposed entry the position of the source entry it came from.
    pub(crate) fn transpose_with_positions(&self) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
        let nnz = self.nnz();

        // Count non-zeros per column
        let mut row_ptr = vec![0; self.n_cols + 1];
        for &col in &self.col_idx[..nnz] {
            row_ptr[col + 1] += 1;
        }
        for j in 0..self.n_cols {
            row_ptr[j + 1] += row_ptr[j];
        }

        let mut next = row_ptr.clone();
        let mut col_idx = vec![0; nnz];
        let mut positions = vec![0; nnz];

        for i in 0..self.n_rows {
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                let col = self.col_idx[idx];
                let pos = next[col];
                col_idx[pos] = i;
                positions[pos] = idx;
                next[col] += 1;
            }
        }

        (row_ptr, col_idx, positions)
    }
}

/// Owned compressed-row structure, produced by transposing a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBuf {
    pub n_rows: usize,
    pub n_cols: usize,
    pub row_ptr: Vec<usize>,
    pub col_idx: Vec<usize>,
}

impl PatternBuf {
    pub fn view(&self) -> SparsityPattern<'_> {
        SparsityPattern {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr: &self.row_ptr,
            col_idx: &self.col_idx,
        }
    }
}

/// Checks the compressed-row invariants shared by every matrix in the crate
pub(crate) fn validate_compressed(
    label: &str,
    n_rows: usize,
    n_cols: usize,
    row_ptr: &[usize],
    col_idx: &[usize],
) -> Result<()> {
    if row_ptr.len() != n_rows + 1 {
        return Err(SpgemmError::invalid_matrix(
            label,
            format!(
                "row_ptr.len() must be n_rows + 1 (got {}, expected {})",
                row_ptr.len(),
                n_rows + 1
            ),
        ));
    }
    if row_ptr[0] != 0 {
        return Err(SpgemmError::invalid_matrix(label, "row_ptr[0] must be 0"));
    }
    if let Some(i) = row_ptr.windows(2).position(|w| w[0] > w[1]) {
        return Err(SpgemmError::invalid_matrix(
            label,
            format!("row_ptr must be non-decreasing (row {i})"),
        ));
    }
    if row_ptr[n_rows] != col_idx.len() {
        return Err(SpgemmError::invalid_matrix(
            label,
            format!(
                "row_ptr[n_rows] must equal col_idx.len() ({} != {})",
                row_ptr[n_rows],
                col_idx.len()
            ),
        ));
    }
    if let Some(&col) = col_idx.iter().find(|&&col| col >= n_cols) {
        return Err(SpgemmError::invalid_matrix(
            label,
            format!("Column index {col} out of bounds (n_cols = {n_cols})"),
        ));
    }
    Ok(())
}

/// Output structure computed by the symbolic phase.
///
/// `row_ptr` delimits the slot range reserved for each row of C; `nnz` is
/// the total number of slots. Numeric calls fill exactly these slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrStructure {
    /// Rows of C (block rows for BSR output)
    pub n_rows: usize,
    /// Columns of C (block columns for BSR output)
    pub n_cols: usize,
    /// Row map, length `n_rows + 1`
    pub row_ptr: Vec<usize>,
    /// Total number of slots
    pub nnz: usize,
    /// Block dimension of C; 1 for scalar CSR output
    pub block_dim: usize,
}

impl CsrStructure {
    /// Number of slots reserved for row `i`
    pub fn row_nnz(&self, i: usize) -> usize {
        self.row_ptr[i + 1] - self.row_ptr[i]
    }

    /// Largest number of slots reserved for any row
    pub fn max_row_nnz(&self) -> usize {
        self.row_ptr
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0)
    }
}
