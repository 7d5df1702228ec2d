//! Reference implementation of SpGEMM using manual multiplication
//!
//! This provides a baseline for correctness testing. Unlike the two-phase
//! pipeline it builds each output row in one pass with a hashmap.

use num_traits::Num;
use std::collections::HashMap;
use std::ops::AddAssign;

use crate::error::{Result, SpgemmError};
use crate::matrix::SparseMatrixCSR;

/// Performs sparse matrix multiplication using a simple algorithm as a reference implementation
///
/// Rows of the result are sorted by column. Entries whose products cancel to
/// zero are kept, so the structure matches the symbolic phase's count.
pub fn reference_spgemm<T>(a: &SparseMatrixCSR<T>, b: &SparseMatrixCSR<T>) -> Result<SparseMatrixCSR<T>>
where
    T: Copy + Num + AddAssign,
{
    if a.n_cols != b.n_rows {
        return Err(SpgemmError::DimensionMismatch {
            left_cols: a.n_cols,
            right_rows: b.n_rows,
        });
    }

    let n_rows = a.n_rows;
    let n_cols = b.n_cols;

    let mut row_ptr = Vec::with_capacity(n_rows + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    row_ptr.push(0);

    for i in 0..n_rows {
        let mut accum: HashMap<usize, T> = HashMap::new();

        for (k, &a_val) in a.row_iter(i) {
            for (j, &b_val) in b.row_iter(k) {
                *accum.entry(j).or_insert(T::zero()) += a_val * b_val;
            }
        }

        let mut row_entries: Vec<_> = accum.into_iter().collect();
        row_entries.sort_by_key(|&(col, _)| col);

        for (j, val) in row_entries {
            col_idx.push(j);
            values.push(val);
        }

        row_ptr.push(col_idx.len());
    }

    SparseMatrixCSR::try_new(n_rows, n_cols, row_ptr, col_idx, values)
}
