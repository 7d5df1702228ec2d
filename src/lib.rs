//! # spgemm: two-phase sparse matrix-matrix multiplication
//!
//! Computes `C = op(A) · op(B)` for sparse matrices in compressed-row form,
//! where `op` optionally transposes its operand.
//!
//! ## Overview
//!
//! The product is split into two phases:
//!
//! 1. **Symbolic**: discovers the nonzero structure of C. Each output row is
//!    the union of the rows of op(B) selected by the row of op(A); its size
//!    is counted with a per-row accumulator and the counts are prefix-summed
//!    into C's row map.
//! 2. **Numeric**: fills the reserved slots. Every row is rebuilt with the
//!    same traversal, accumulating `A(i,k) · B(k,j)` under column `j`.
//!
//! Splitting the work this way lets the numeric phase write into exact-size
//! buffers and process rows in parallel without synchronization. When the
//! same product is needed again with new values but the same sparsity
//! pattern, only the numeric phase has to be repeated.
//!
//! ## Components
//!
//! - [`SparseMatrixCSR`] and [`BlockSparseMatrixBSR`]: the matrix formats
//! - [`KernelHandle`]: caller-owned context holding the configuration, the
//!   execution service and the SpGEMM sub-handle with its phase state
//! - Accumulators: a dense marker array for narrow outputs and an
//!   open-addressing hash table otherwise, selected by [`SpgemmAlgorithm`]
//!
//! ## Usage
//!
//! One-shot multiplication:
//!
//! ```
//! use spgemm::{spgemm, SparseMatrixCSR};
//!
//! let a = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]);
//! let b = SparseMatrixCSR::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![3.0, 1.0, 4.0]);
//!
//! let c = spgemm(&a, false, &b, false).unwrap();
//! assert_eq!(c.to_dense(), ndarray::arr2(&[[3.0, 0.0], [2.0, 8.0]]));
//! ```
//!
//! Reusing the symbolic phase across value changes:
//!
//! ```
//! use spgemm::{
//!     spgemm_numeric, spgemm_numeric_into, spgemm_symbolic, KernelHandle, SparseMatrixCSR,
//!     SpgemmAlgorithm, SpgemmConfig,
//! };
//!
//! let mut a = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]);
//! let b = SparseMatrixCSR::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![3.0, 1.0, 4.0]);
//!
//! let mut handle = KernelHandle::new(SpgemmConfig::default());
//! handle.create_spgemm_handle(SpgemmAlgorithm::Default)?;
//!
//! let structure = spgemm_symbolic(&mut handle, &a, false, &b, false)?;
//! let mut c = spgemm_numeric(&mut handle, &a, false, &b, false, &structure)?;
//!
//! a.values = vec![10.0, 20.0];
//! spgemm_numeric_into(&mut handle, &a, false, &b, false, &mut c)?;
//! assert_eq!(c.to_dense()[[1, 1]], 80.0);
//!
//! handle.destroy_spgemm_handle()?;
//! # Ok::<(), spgemm::SpgemmError>(())
//! ```

pub mod accumulator;
pub mod error;
mod execution;
pub mod handle;
pub mod kernels;
pub mod matrix;
mod spgemm;
mod storage;
pub mod utils;

// Re-export primary components
pub use error::{Result, SpgemmError};
pub use handle::{KernelHandle, SpgemmHandle, SpgemmPhase};
pub use matrix::config::{ExecutionSpace, RowOrdering, SpgemmAlgorithm, SpgemmConfig, SystemParameters};
pub use matrix::{
    reference_spgemm, BlockSparseMatrixBSR, CsrStructure, PatternBuf, Scalar, SparseMatrixCSR,
    SparsityPattern,
};
pub use spgemm::{
    block_spgemm, block_spgemm_numeric, block_spgemm_numeric_into, block_spgemm_symbolic,
    block_spgemm_with_config, spgemm, spgemm_numeric, spgemm_numeric_into, spgemm_symbolic,
    spgemm_with_config,
};
pub use storage::AllocationMode;
pub use utils::{from_sprs_csr, to_sprs_csr};

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
