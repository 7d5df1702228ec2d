//! Two-phase sparse matrix-matrix multiplication
//!
//! `C = op(A) · op(B)` is computed in two passes over the rows of op(A):
//!
//! 1. **Symbolic** ([`spgemm_symbolic`]): counts the distinct columns of
//!    every output row and returns C's row map as a [`CsrStructure`].
//! 2. **Numeric** ([`spgemm_numeric`]): fills the reserved slots with column
//!    indices and accumulated values.
//!
//! Both phases run against a [`KernelHandle`] holding a live SpGEMM
//! sub-handle. After one symbolic call, numeric may be repeated any number of
//! times for operands with the same structure and changing values, e.g.
//! through [`spgemm_numeric_into`]. The block variants work the same way on
//! [`BlockSparseMatrixBSR`] operands, with one dense block per slot.
//!
//! The one-shot drivers [`spgemm`] and [`block_spgemm`] create a temporary
//! handle and run both phases.

mod driver;
mod numeric;
mod symbolic;

use std::borrow::Cow;

use num_traits::Num;
use tracing::instrument;

pub use driver::{block_spgemm, block_spgemm_with_config, spgemm, spgemm_with_config};

use crate::accumulator::sort::sort_row_slots;
use crate::error::{Result, SpgemmError};
use crate::handle::{KernelHandle, ProblemShape};
use crate::matrix::config::RowOrdering;
use crate::matrix::{BlockSparseMatrixBSR, CsrStructure, Scalar, SparseMatrixCSR, SparsityPattern};
use crate::utils::split_rows_mut;

use numeric::{NumericOutput, Operand};

/// op(X) for a CSR operand: `m` itself, or its transpose
fn csr_op<T: Copy + Num>(m: &SparseMatrixCSR<T>, transpose: bool) -> Cow<'_, SparseMatrixCSR<T>> {
    if transpose {
        Cow::Owned(m.transpose())
    } else {
        Cow::Borrowed(m)
    }
}

/// op(X) for a BSR operand
fn bsr_op<T: Copy + Num>(m: &BlockSparseMatrixBSR<T>, transpose: bool) -> Cow<'_, BlockSparseMatrixBSR<T>> {
    if transpose {
        Cow::Owned(m.transpose())
    } else {
        Cow::Borrowed(m)
    }
}

/// Dimensions of op(X) for an `n_rows × n_cols` matrix X
fn op_dims(n_rows: usize, n_cols: usize, transpose: bool) -> (usize, usize) {
    if transpose {
        (n_cols, n_rows)
    } else {
        (n_rows, n_cols)
    }
}

/// Checks that op(A) · op(B) is defined; returns `(m, k, n)`
fn check_inner(a: (usize, usize), b: (usize, usize)) -> Result<(usize, usize, usize)> {
    if a.1 != b.0 {
        return Err(SpgemmError::DimensionMismatch {
            left_cols: a.1,
            right_rows: b.0,
        });
    }
    Ok((a.0, a.1, b.1))
}

fn check_block_dims(a: usize, b: usize, c: Option<usize>) -> Result<()> {
    if a != b || c.is_some_and(|c| c != a) {
        return Err(SpgemmError::BlockSizeMismatch { a, b, c });
    }
    Ok(())
}

fn check_output_dims(label: &str, found: (usize, usize), expected: (usize, usize)) -> Result<()> {
    if found != expected {
        return Err(SpgemmError::invalid_matrix(
            label,
            format!(
                "expected a {} × {} output, got {} × {}",
                expected.0, expected.1, found.0, found.1
            ),
        ));
    }
    Ok(())
}

/// Checks a caller-supplied structure for C against op(A) · op(B)
fn check_structure(
    shape: (usize, usize),
    row_ptr: &[usize],
    nnz: usize,
    c_nnz: usize,
) -> Result<()> {
    let (m, _) = shape;
    if row_ptr.len() != m + 1 {
        return Err(SpgemmError::invalid_matrix(
            "C",
            format!("row_ptr.len() must be {} for this product (got {})", m + 1, row_ptr.len()),
        ));
    }
    if row_ptr[0] != 0 || row_ptr.windows(2).any(|w| w[0] > w[1]) || row_ptr[m] != nnz {
        return Err(SpgemmError::invalid_matrix(
            "C",
            "row_ptr must be non-decreasing from 0 to nnz",
        ));
    }
    if nnz != c_nnz {
        return Err(SpgemmError::handle_state(
            "numeric",
            format!("C holds {nnz} slots but the symbolic phase computed {c_nnz}"),
        ));
    }
    Ok(())
}

fn symbolic_core(
    handle: &mut KernelHandle,
    operation: &'static str,
    a: SparsityPattern<'_>,
    transpose_a: bool,
    b: SparsityPattern<'_>,
    transpose_b: bool,
    block_dim: usize,
) -> Result<CsrStructure> {
    let (_, executor, sub) = handle.phase_parts(operation)?;
    let (m, _, n) = check_inner(
        op_dims(a.n_rows, a.n_cols, transpose_a),
        op_dims(b.n_rows, b.n_cols, transpose_b),
    )?;

    let a_t;
    let a_op = if transpose_a {
        a_t = a.transpose();
        a_t.view()
    } else {
        a
    };
    let b_t;
    let b_op = if transpose_b {
        b_t = b.transpose();
        b_t.view()
    } else {
        b
    };

    let out = symbolic::symbolic_rows(executor, sub.kernel(), &a_op, &b_op, block_dim)?;
    let structure = CsrStructure {
        n_rows: m,
        n_cols: n,
        row_ptr: out.row_ptr,
        nnz: out.nnz,
        block_dim,
    };
    sub.finish_symbolic(out.nnz, out.workspace);
    Ok(structure)
}

/// Runs the numeric phase on already transposed operands
fn numeric_core<T: Scalar>(
    handle: &mut KernelHandle,
    operation: &'static str,
    a: Operand<'_, T>,
    b: Operand<'_, T>,
    block_dim: usize,
    row_ptr: &[usize],
    nnz: usize,
) -> Result<NumericOutput<T>> {
    let (config, executor, sub) = handle.phase_parts(operation)?;
    let shape = ProblemShape {
        n_rows: a.pattern.n_rows,
        inner: a.pattern.n_cols,
        n_cols: b.pattern.n_cols,
        block_dim,
    };
    let max_row_nnz = sub.check_numeric(shape)?.max_row_nnz;
    check_structure((shape.n_rows, shape.n_cols), row_ptr, nnz, sub.c_nnz()?)?;

    let mut out = numeric::numeric_rows(
        executor,
        sub.kernel(),
        a,
        b,
        row_ptr,
        nnz,
        block_dim,
        max_row_nnz,
        config.allocation,
    )?;

    if config.row_ordering == RowOrdering::Sorted {
        let width = block_dim * block_dim;
        let rows: Vec<_> = split_rows_mut(&mut out.col_idx, row_ptr, 1)
            .into_iter()
            .zip(split_rows_mut(&mut out.values, row_ptr, width))
            .collect();
        executor.try_for_each_row(rows, || (), |_, _, (cols, vals)| {
            sort_row_slots(cols, vals, width);
            Ok(())
        })?;
    }

    sub.finish_numeric();
    Ok(out)
}

fn csr_operand<T>(m: &SparseMatrixCSR<T>) -> Operand<'_, T> {
    Operand {
        pattern: SparsityPattern {
            n_rows: m.n_rows,
            n_cols: m.n_cols,
            row_ptr: &m.row_ptr,
            col_idx: &m.col_idx,
        },
        values: &m.values,
    }
}

fn bsr_operand<T>(m: &BlockSparseMatrixBSR<T>) -> Operand<'_, T> {
    Operand {
        pattern: SparsityPattern {
            n_rows: m.n_block_rows,
            n_cols: m.n_block_cols,
            row_ptr: &m.row_ptr,
            col_idx: &m.col_idx,
        },
        values: &m.values,
    }
}

/// Computes the structure of `C = op(A) · op(B)`.
///
/// Requires a live SpGEMM sub-handle in any phase; on success the sub-handle
/// moves to [`SpgemmPhase::SymbolicDone`](crate::SpgemmPhase::SymbolicDone)
/// and records `nnz(C)`, readable through [`KernelHandle::output_nnz`].
#[instrument(level = "debug", skip_all, fields(a = a.label(), b = b.label(), transpose_a = transpose_a, transpose_b = transpose_b))]
pub fn spgemm_symbolic<T>(
    handle: &mut KernelHandle,
    a: &SparseMatrixCSR<T>,
    transpose_a: bool,
    b: &SparseMatrixCSR<T>,
    transpose_b: bool,
) -> Result<CsrStructure>
where
    T: Copy + Num,
{
    symbolic_core(handle, "spgemm_symbolic", a.pattern(), transpose_a, b.pattern(), transpose_b, 1)
}

/// Computes the values of `C = op(A) · op(B)` into a new matrix with the
/// given structure.
///
/// `structure` must come from [`spgemm_symbolic`] on operands of the same
/// shape and sparsity pattern. Rows are left in accumulation order unless
/// the handle's configuration asks for [`RowOrdering::Sorted`].
#[instrument(level = "debug", skip_all, fields(a = a.label(), b = b.label(), transpose_a = transpose_a, transpose_b = transpose_b))]
pub fn spgemm_numeric<T: Scalar>(
    handle: &mut KernelHandle,
    a: &SparseMatrixCSR<T>,
    transpose_a: bool,
    b: &SparseMatrixCSR<T>,
    transpose_b: bool,
    structure: &CsrStructure,
) -> Result<SparseMatrixCSR<T>> {
    let (m, _, n) = check_inner(
        op_dims(a.n_rows, a.n_cols, transpose_a),
        op_dims(b.n_rows, b.n_cols, transpose_b),
    )?;
    check_block_dims(1, 1, Some(structure.block_dim))?;
    check_output_dims("C", (structure.n_rows, structure.n_cols), (m, n))?;

    let a_op = csr_op(a, transpose_a);
    let b_op = csr_op(b, transpose_b);

    let out = numeric_core(
        handle,
        "spgemm_numeric",
        csr_operand(&a_op),
        csr_operand(&b_op),
        1,
        &structure.row_ptr,
        structure.nnz,
    )?;

    Ok(SparseMatrixCSR::from_parts(
        structure.n_rows,
        structure.n_cols,
        structure.row_ptr.clone(),
        out.col_idx,
        out.values,
        String::from("C"),
    ))
}

/// Recomputes the entries and values of an existing `c` whose row map came
/// from [`spgemm_symbolic`].
///
/// Reuses `c.row_ptr` as the structure. `c` is only modified on success.
#[instrument(level = "debug", skip_all, fields(a = a.label(), b = b.label(), c = c.label()))]
pub fn spgemm_numeric_into<T: Scalar>(
    handle: &mut KernelHandle,
    a: &SparseMatrixCSR<T>,
    transpose_a: bool,
    b: &SparseMatrixCSR<T>,
    transpose_b: bool,
    c: &mut SparseMatrixCSR<T>,
) -> Result<()> {
    let (m, _, n) = check_inner(
        op_dims(a.n_rows, a.n_cols, transpose_a),
        op_dims(b.n_rows, b.n_cols, transpose_b),
    )?;
    check_output_dims(c.label(), (c.n_rows, c.n_cols), (m, n))?;

    let a_op = csr_op(a, transpose_a);
    let b_op = csr_op(b, transpose_b);

    let out = numeric_core(
        handle,
        "spgemm_numeric_into",
        csr_operand(&a_op),
        csr_operand(&b_op),
        1,
        &c.row_ptr,
        c.row_ptr.last().copied().unwrap_or(0),
    )?;

    c.col_idx = out.col_idx;
    c.values = out.values;
    Ok(())
}

/// Block counterpart of [`spgemm_symbolic`]: computes the block structure of
/// `C = op(A) · op(B)` for BSR operands of equal block dimension.
#[instrument(level = "debug", skip_all, fields(a = a.label(), b = b.label(), block_dim = a.block_dim))]
pub fn block_spgemm_symbolic<T>(
    handle: &mut KernelHandle,
    a: &BlockSparseMatrixBSR<T>,
    transpose_a: bool,
    b: &BlockSparseMatrixBSR<T>,
    transpose_b: bool,
) -> Result<CsrStructure>
where
    T: Copy + Num,
{
    check_block_dims(a.block_dim, b.block_dim, None)?;
    symbolic_core(
        handle,
        "block_spgemm_symbolic",
        a.pattern(),
        transpose_a,
        b.pattern(),
        transpose_b,
        a.block_dim,
    )
}

/// Block counterpart of [`spgemm_numeric`]: every output slot holds the sum
/// of dense block products `op(A)(i,k) · op(B)(k,j)`.
#[instrument(level = "debug", skip_all, fields(a = a.label(), b = b.label(), block_dim = a.block_dim))]
pub fn block_spgemm_numeric<T: Scalar>(
    handle: &mut KernelHandle,
    a: &BlockSparseMatrixBSR<T>,
    transpose_a: bool,
    b: &BlockSparseMatrixBSR<T>,
    transpose_b: bool,
    structure: &CsrStructure,
) -> Result<BlockSparseMatrixBSR<T>> {
    check_block_dims(a.block_dim, b.block_dim, Some(structure.block_dim))?;
    let (m, _, n) = check_inner(
        op_dims(a.n_block_rows, a.n_block_cols, transpose_a),
        op_dims(b.n_block_rows, b.n_block_cols, transpose_b),
    )?;
    check_output_dims("C", (structure.n_rows, structure.n_cols), (m, n))?;

    let a_op = bsr_op(a, transpose_a);
    let b_op = bsr_op(b, transpose_b);

    let out = numeric_core(
        handle,
        "block_spgemm_numeric",
        bsr_operand(&a_op),
        bsr_operand(&b_op),
        a.block_dim,
        &structure.row_ptr,
        structure.nnz,
    )?;

    Ok(BlockSparseMatrixBSR::from_parts(
        structure.n_rows,
        structure.n_cols,
        a.block_dim,
        structure.row_ptr.clone(),
        out.col_idx,
        out.values,
        String::from("C"),
    ))
}

/// Block counterpart of [`spgemm_numeric_into`]. `c` must share the block
/// dimension of `a` and `b`.
#[instrument(level = "debug", skip_all, fields(a = a.label(), b = b.label(), c = c.label()))]
pub fn block_spgemm_numeric_into<T: Scalar>(
    handle: &mut KernelHandle,
    a: &BlockSparseMatrixBSR<T>,
    transpose_a: bool,
    b: &BlockSparseMatrixBSR<T>,
    transpose_b: bool,
    c: &mut BlockSparseMatrixBSR<T>,
) -> Result<()> {
    check_block_dims(a.block_dim, b.block_dim, Some(c.block_dim))?;
    let (m, _, n) = check_inner(
        op_dims(a.n_block_rows, a.n_block_cols, transpose_a),
        op_dims(b.n_block_rows, b.n_block_cols, transpose_b),
    )?;
    check_output_dims(c.label(), (c.n_block_rows, c.n_block_cols), (m, n))?;

    let a_op = bsr_op(a, transpose_a);
    let b_op = bsr_op(b, transpose_b);

    let out = numeric_core(
        handle,
        "block_spgemm_numeric_into",
        bsr_operand(&a_op),
        bsr_operand(&b_op),
        c.block_dim,
        &c.row_ptr,
        c.row_ptr.last().copied().unwrap_or(0),
    )?;

    c.col_idx = out.col_idx;
    c.values = out.values;
    Ok(())
}
