//! Numeric phase: values for a precomputed structure
//!
//! Every row of C owns the slot range reserved by the symbolic phase. The
//! row is rebuilt with the same traversal: each product `A(i,k) · B(k,j)` is
//! inserted-or-accumulated under column `j` in an accumulator limited to the
//! row's reserved slot count, then the row's columns and values are written
//! into its range. Scalar CSR uses one value per slot; BSR uses a dense
//! `block_dim × block_dim` block per slot.

use std::mem::MaybeUninit;

use tracing::{debug, instrument};

use crate::accumulator::{ColumnAccumulator, RowWorkspace};
use crate::error::{Result, SpgemmError};
use crate::execution::Executor;
use crate::handle::Kernel;
use crate::kernels;
use crate::matrix::{Scalar, SparsityPattern};
use crate::storage::{AllocationMode, SlotBuffer};
use crate::utils::split_rows_mut;

/// Structure and values of one operand; `values` holds `block_dim²` entries per slot
#[derive(Clone, Copy)]
pub(crate) struct Operand<'a, T> {
    pub pattern: SparsityPattern<'a>,
    pub values: &'a [T],
}

/// Per-worker scratch: accumulators plus the row's value staging area
struct NumericScratch<T> {
    workspace: RowWorkspace,
    values: Vec<T>,
}

/// Filled entries and values of C
#[derive(Debug)]
pub(crate) struct NumericOutput<T> {
    pub col_idx: Vec<usize>,
    pub values: Vec<T>,
}

/// Computes C's entries and values for the row map `row_ptr`.
///
/// Fails with [`SpgemmError::StructureMismatch`] if any row produces more or
/// fewer distinct columns than were reserved for it.
#[instrument(level = "debug", skip_all, fields(m = a.pattern.n_rows, n = b.pattern.n_cols, nnz = nnz, block_dim = block_dim))]
#[allow(clippy::too_many_arguments)]
pub(crate) fn numeric_rows<T: Scalar>(
    executor: &Executor,
    kernel: Kernel,
    a: Operand<'_, T>,
    b: Operand<'_, T>,
    row_ptr: &[usize],
    nnz: usize,
    block_dim: usize,
    max_row_nnz: usize,
    allocation: AllocationMode,
) -> Result<NumericOutput<T>> {
    let width = block_dim * block_dim;
    let n_cols = b.pattern.n_cols;
    let dense = kernel.uses_dense(n_cols);

    let mut entries = SlotBuffer::<usize>::allocate("entries", nnz, allocation)?;
    let mut values = SlotBuffer::<T>::allocate("values", nnz * width, allocation)?;

    let rows: Vec<_> = split_rows_mut(entries.as_mut_slice(), row_ptr, 1)
        .into_iter()
        .zip(split_rows_mut(values.as_mut_slice(), row_ptr, width))
        .collect();

    executor.try_for_each_row(
        rows,
        || NumericScratch {
            workspace: RowWorkspace::new(n_cols, max_row_nnz),
            values: Vec::with_capacity(max_row_nnz * width),
        },
        |scratch, i, (cols_out, vals_out)| {
            let NumericScratch { workspace, values } = scratch;
            let reserved = cols_out.len();
            let acc = workspace.accumulator(dense, reserved);
            values.clear();
            values.resize(reserved * width, T::zero());

            accumulate_row(acc, values, &a, &b, i, block_dim)?;

            if acc.len() != reserved {
                return Err(SpgemmError::StructureMismatch {
                    row: i,
                    reserved,
                    found: acc.len(),
                });
            }

            write_row(cols_out, acc.columns());
            write_row(vals_out, values);
            Ok(())
        },
    )?;

    // SAFETY: every row wrote exactly its reserved number of slots, and the
    // row ranges partition both buffers.
    let (col_idx, values) = unsafe { (entries.assume_init(), values.assume_init()) };

    debug!(dense, "numeric phase complete");

    Ok(NumericOutput { col_idx, values })
}

/// Inserts every product of row `i` into `acc`, summing into `values`
fn accumulate_row<T: Scalar>(
    acc: &mut dyn ColumnAccumulator,
    values: &mut [T],
    a: &Operand<'_, T>,
    b: &Operand<'_, T>,
    i: usize,
    block_dim: usize,
) -> Result<()> {
    let width = block_dim * block_dim;
    let reserved = values.len() / width;

    for a_slot in a.pattern.row_ptr[i]..a.pattern.row_ptr[i + 1] {
        let k = a.pattern.col_idx[a_slot];
        let a_block = &a.values[a_slot * width..(a_slot + 1) * width];

        for b_slot in b.pattern.row_ptr[k]..b.pattern.row_ptr[k + 1] {
            let j = b.pattern.col_idx[b_slot];
            let slot = acc.insert(j).ok_or(SpgemmError::StructureMismatch {
                row: i,
                reserved,
                found: reserved + 1,
            })?;
            let target = &mut values[slot.index * width..(slot.index + 1) * width];

            if width == 1 {
                let product = a_block[0] * b.values[b_slot];
                if slot.fresh {
                    target[0] = product;
                } else {
                    target[0] += product;
                }
            } else {
                if slot.fresh {
                    target.fill(T::zero());
                }
                let b_block = &b.values[b_slot * width..(b_slot + 1) * width];
                kernels::gemm_acc(T::one(), a_block, b_block, T::one(), target, block_dim)?;
            }
        }
    }
    Ok(())
}

fn write_row<T: Copy>(out: &mut [MaybeUninit<T>], src: &[T]) {
    for (slot, &value) in out.iter_mut().zip(src) {
        slot.write(value);
    }
}
