// Matrix data structures and operations

pub mod bsr;
pub mod config;
pub mod csr;
pub mod pattern;
pub mod reference;

use std::fmt;
use std::ops::AddAssign;

use ndarray::LinalgScalar;
use num_traits::Num;

pub use bsr::BlockSparseMatrixBSR;
pub use config::{ExecutionSpace, RowOrdering, SpgemmAlgorithm, SpgemmConfig, SystemParameters};
pub use csr::SparseMatrixCSR;
pub use pattern::{CsrStructure, PatternBuf, SparsityPattern};
pub use reference::reference_spgemm;

/// Scalar types the SpGEMM kernels operate on
pub trait Scalar: LinalgScalar + Num + AddAssign + Send + Sync + fmt::Debug {}

impl<T> Scalar for T where T: LinalgScalar + Num + AddAssign + Send + Sync + fmt::Debug {}
