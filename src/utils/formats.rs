//! Conversions between our CSR format and the sprs crate

use crate::error::{Result, SpgemmError};
use crate::matrix::SparseMatrixCSR;
use num_traits::Num;
use sprs::CsMat;

/// Converts our CSR matrix format to sprs CsMat format
///
/// sprs requires sorted rows without repeated columns, so rows are sorted on
/// a copy first and repeated columns within a row are summed into one entry.
pub fn to_sprs_csr<T>(matrix: &SparseMatrixCSR<T>) -> Result<CsMat<T>>
where
    T: Copy + Num + Send + Sync,
{
    let mut sorted = matrix.clone();
    sorted.sort_rows();

    let mut row_ptr = Vec::with_capacity(sorted.n_rows + 1);
    let mut col_idx = Vec::with_capacity(sorted.nnz());
    let mut values = Vec::with_capacity(sorted.nnz());
    row_ptr.push(0);

    for i in 0..sorted.n_rows {
        let row_start = col_idx.len();
        for (j, &val) in sorted.row_iter(i) {
            let repeated = col_idx.len() > row_start && col_idx.last() == Some(&j);
            match values.last_mut() {
                Some(last) if repeated => *last = *last + val,
                _ => {
                    col_idx.push(j);
                    values.push(val);
                }
            }
        }
        row_ptr.push(col_idx.len());
    }

    CsMat::try_new((sorted.n_rows, sorted.n_cols), row_ptr, col_idx, values)
        .map_err(|(_, _, _, err)| SpgemmError::invalid_matrix(matrix.label(), err.to_string()))
}

/// Converts sprs CsMat to our SparseMatrixCSR format
pub fn from_sprs_csr<T>(matrix: CsMat<T>) -> Result<SparseMatrixCSR<T>>
where
    T: Copy + Num + Default,
{
    // Ensure matrix is in CSR format
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        matrix.to_csr()
    };

    let shape = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    SparseMatrixCSR::try_new(shape.0, shape.1, indptr, indices, data)
}
