//! One-shot SpGEMM drivers
//!
//! Each call builds a temporary [`KernelHandle`], runs the symbolic and
//! numeric phases once and tears the handle down again. Callers that repeat
//! a product with the same sparsity pattern should keep a handle and call
//! the numeric phase directly instead.

use tracing::{info, instrument};

use super::{
    block_spgemm_numeric, block_spgemm_symbolic, bsr_op, check_block_dims, check_inner, csr_op,
    op_dims, spgemm_numeric, spgemm_symbolic,
};
use crate::error::Result;
use crate::handle::KernelHandle;
use crate::matrix::{BlockSparseMatrixBSR, Scalar, SparseMatrixCSR, SpgemmConfig};

/// Computes `C = op(A) · op(B)` with the default configuration
///
/// # Example
///
/// ```
/// use spgemm::{spgemm, SparseMatrixCSR};
///
/// let a = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]);
/// let b = SparseMatrixCSR::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![3.0, 1.0, 4.0]);
///
/// let c = spgemm(&a, false, &b, false).unwrap();
/// assert_eq!(c.nnz(), 3);
/// ```
pub fn spgemm<T: Scalar>(
    a: &SparseMatrixCSR<T>,
    transpose_a: bool,
    b: &SparseMatrixCSR<T>,
    transpose_b: bool,
) -> Result<SparseMatrixCSR<T>> {
    spgemm_with_config(a, transpose_a, b, transpose_b, &SpgemmConfig::default())
}

/// Computes `C = op(A) · op(B)` on a temporary handle built from `config`
#[instrument(level = "info", skip_all, fields(a = a.label(), b = b.label()))]
pub fn spgemm_with_config<T: Scalar>(
    a: &SparseMatrixCSR<T>,
    transpose_a: bool,
    b: &SparseMatrixCSR<T>,
    transpose_b: bool,
    config: &SpgemmConfig,
) -> Result<SparseMatrixCSR<T>> {
    let (m, k, n) = check_inner(
        op_dims(a.n_rows, a.n_cols, transpose_a),
        op_dims(b.n_rows, b.n_cols, transpose_b),
    )?;

    // Materialize op(A) and op(B) once for both phases
    let a_op = csr_op(a, transpose_a);
    let b_op = csr_op(b, transpose_b);

    let mut handle = KernelHandle::new(config.clone());
    handle.create_spgemm_handle(config.algorithm)?;

    let structure = spgemm_symbolic(&mut handle, &a_op, false, &b_op, false)?;
    let c = spgemm_numeric(&mut handle, &a_op, false, &b_op, false, &structure)?;
    handle.destroy_spgemm_handle()?;

    info!(m, k, n, nnz = c.nnz(), "spgemm complete");
    Ok(c)
}

/// Computes the block product `C = op(A) · op(B)` with the default configuration
pub fn block_spgemm<T: Scalar>(
    a: &BlockSparseMatrixBSR<T>,
    transpose_a: bool,
    b: &BlockSparseMatrixBSR<T>,
    transpose_b: bool,
) -> Result<BlockSparseMatrixBSR<T>> {
    block_spgemm_with_config(a, transpose_a, b, transpose_b, &SpgemmConfig::default())
}

/// Computes the block product `C = op(A) · op(B)` on a temporary handle
/// built from `config`
#[instrument(level = "info", skip_all, fields(a = a.label(), b = b.label(), block_dim = a.block_dim))]
pub fn block_spgemm_with_config<T: Scalar>(
    a: &BlockSparseMatrixBSR<T>,
    transpose_a: bool,
    b: &BlockSparseMatrixBSR<T>,
    transpose_b: bool,
    config: &SpgemmConfig,
) -> Result<BlockSparseMatrixBSR<T>> {
    check_block_dims(a.block_dim, b.block_dim, None)?;
    let (m, k, n) = check_inner(
        op_dims(a.n_block_rows, a.n_block_cols, transpose_a),
        op_dims(b.n_block_rows, b.n_block_cols, transpose_b),
    )?;

    let a_op = bsr_op(a, transpose_a);
    let b_op = bsr_op(b, transpose_b);

    let mut handle = KernelHandle::new(config.clone());
    handle.create_spgemm_handle(config.algorithm)?;

    let structure = block_spgemm_symbolic(&mut handle, &a_op, false, &b_op, false)?;
    let c = block_spgemm_numeric(&mut handle, &a_op, false, &b_op, false, &structure)?;
    handle.destroy_spgemm_handle()?;

    info!(m, k, n, nnz_blocks = c.nnz(), "block spgemm complete");
    Ok(c)
}
