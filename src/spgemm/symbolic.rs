//! Symbolic phase: output structure without values
//!
//! Row `i` of C has one slot per distinct column reachable through row `i`
//! of op(A): the union over `k ∈ row_i(op(A))` of the columns of row `k` of
//! op(B). Each row is counted independently with an accumulator sized from
//! the row's intermediate-product bound; the counts are then prefix-summed
//! into C's row map.

use tracing::{debug, instrument};

use crate::accumulator::RowWorkspace;
use crate::error::Result;
use crate::execution::Executor;
use crate::handle::{Kernel, ProblemShape, Workspace};
use crate::matrix::SparsityPattern;
use crate::utils::exclusive_scan;

/// Row map of C plus the workspace cached for the numeric phase
pub(crate) struct SymbolicOutput {
    pub row_ptr: Vec<usize>,
    pub nnz: usize,
    pub workspace: Workspace,
}

/// Counts the distinct output columns of every row of `a · b`.
///
/// `a` and `b` are the already transposed operands op(A) and op(B); their
/// inner dimensions have been checked by the caller.
#[instrument(level = "debug", skip_all, fields(m = a.n_rows, k = a.n_cols, n = b.n_cols))]
pub(crate) fn symbolic_rows(
    executor: &Executor,
    kernel: Kernel,
    a: &SparsityPattern<'_>,
    b: &SparsityPattern<'_>,
    block_dim: usize,
) -> Result<SymbolicOutput> {
    let n_cols = b.n_cols;
    let dense = kernel.uses_dense(n_cols);

    let row_flops = executor.map_rows(a.n_rows, || (), |_, i| a.row_flops(i, b));

    let row_counts = executor.map_rows(
        a.n_rows,
        || RowWorkspace::new(n_cols, 0),
        |workspace, i| {
            // Distinct columns can exceed neither the products nor the column domain
            let bound = row_flops[i].min(n_cols);
            if bound == 0 {
                return 0;
            }

            let acc = workspace.accumulator(dense, bound);
            for &k in a.row(i) {
                for &j in b.row(k) {
                    let inserted = acc.insert(j);
                    debug_assert!(inserted.is_some());
                }
            }
            acc.len()
        },
    );

    let row_ptr = exclusive_scan(&row_counts)?;
    let nnz = row_ptr[a.n_rows];
    let total_flops: usize = row_flops.iter().sum();
    let max_row_nnz = row_counts.iter().copied().max().unwrap_or(0);

    debug!(nnz, total_flops, max_row_nnz, dense, "symbolic phase complete");

    Ok(SymbolicOutput {
        row_ptr,
        nnz,
        workspace: Workspace {
            shape: Some(ProblemShape {
                n_rows: a.n_rows,
                inner: a.n_cols,
                n_cols,
                block_dim,
            }),
            max_row_nnz,
        },
    })
}
