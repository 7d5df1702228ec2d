//! Computation handle and SpGEMM sub-handle
//!
//! A [`KernelHandle`] is the caller-owned context threaded through the
//! symbolic and numeric phases. It carries the configuration, the execution
//! service and, once created, a [`SpgemmHandle`] that records the phase
//! state, the output nnz and the workspace cached between phases.
//!
//! ```text
//! Uninitialized --symbolic--> SymbolicDone --numeric--> NumericDone
//!                                  ^                        |
//!                                  +-------symbolic---------+
//! any state --destroy--> Destroyed
//! ```

use std::fmt;

use tracing::trace;

use crate::error::{Result, SpgemmError};
use crate::execution::Executor;
use crate::matrix::config::{SpgemmAlgorithm, SpgemmConfig};

/// Phase of a SpGEMM sub-handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpgemmPhase {
    Uninitialized,
    SymbolicDone,
    NumericDone,
    Destroyed,
}

impl fmt::Display for SpgemmPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpgemmPhase::Uninitialized => "uninitialized",
            SpgemmPhase::SymbolicDone => "symbolic done",
            SpgemmPhase::NumericDone => "numeric done",
            SpgemmPhase::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Accumulator choice resolved from [`SpgemmAlgorithm`] when the sub-handle
/// is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kernel {
    Hash,
    Dense,
    Adaptive { dense_column_limit: usize },
}

impl Kernel {
    fn resolve(algorithm: SpgemmAlgorithm, config: &SpgemmConfig) -> Self {
        match algorithm {
            SpgemmAlgorithm::Default => Kernel::Adaptive {
                dense_column_limit: config.dense_column_limit,
            },
            SpgemmAlgorithm::Hash => Kernel::Hash,
            SpgemmAlgorithm::Dense => Kernel::Dense,
        }
    }

    /// Whether rows over `n_cols` output columns use the dense marker array
    pub fn uses_dense(&self, n_cols: usize) -> bool {
        match *self {
            Kernel::Hash => false,
            Kernel::Dense => true,
            Kernel::Adaptive { dense_column_limit } => n_cols <= dense_column_limit,
        }
    }
}

/// Shape of op(A) · op(B) recorded by the symbolic phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProblemShape {
    pub n_rows: usize,
    pub inner: usize,
    pub n_cols: usize,
    pub block_dim: usize,
}

/// State cached between the symbolic and numeric phases
#[derive(Debug, Default)]
pub(crate) struct Workspace {
    pub shape: Option<ProblemShape>,
    /// Widest output row, used to size numeric accumulators up front
    pub max_row_nnz: usize,
}

/// SpGEMM sub-handle owned by a [`KernelHandle`]
#[derive(Debug)]
pub struct SpgemmHandle {
    algorithm: SpgemmAlgorithm,
    kernel: Kernel,
    phase: SpgemmPhase,
    c_nnz: Option<usize>,
    workspace: Workspace,
}

impl SpgemmHandle {
    fn new(algorithm: SpgemmAlgorithm, config: &SpgemmConfig) -> Self {
        Self {
            algorithm,
            kernel: Kernel::resolve(algorithm, config),
            phase: SpgemmPhase::Uninitialized,
            c_nnz: None,
            workspace: Workspace::default(),
        }
    }

    pub fn algorithm(&self) -> SpgemmAlgorithm {
        self.algorithm
    }

    pub fn phase(&self) -> SpgemmPhase {
        self.phase
    }

    /// Number of nonzeros in C's structure; valid once symbolic has run
    pub fn c_nnz(&self) -> Result<usize> {
        match self.c_nnz {
            Some(nnz) if self.phase >= SpgemmPhase::SymbolicDone => Ok(nnz),
            _ => Err(SpgemmError::handle_state(
                "output_nnz",
                format!("symbolic phase has not run (phase: {})", self.phase),
            )),
        }
    }

    pub(crate) fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub(crate) fn finish_symbolic(&mut self, c_nnz: usize, workspace: Workspace) {
        self.c_nnz = Some(c_nnz);
        self.workspace = workspace;
        trace!(from = %self.phase, to = %SpgemmPhase::SymbolicDone, "spgemm phase transition");
        self.phase = SpgemmPhase::SymbolicDone;
    }

    /// Checks that numeric may run for operands of shape `shape`
    pub(crate) fn check_numeric(&self, shape: ProblemShape) -> Result<&Workspace> {
        if self.phase < SpgemmPhase::SymbolicDone {
            return Err(SpgemmError::handle_state(
                "numeric",
                format!("symbolic phase must run first (phase: {})", self.phase),
            ));
        }
        match self.workspace.shape {
            Some(recorded) if recorded == shape => Ok(&self.workspace),
            recorded => Err(SpgemmError::handle_state(
                "numeric",
                format!("operands {shape:?} differ from the symbolic phase's {recorded:?}"),
            )),
        }
    }

    pub(crate) fn finish_numeric(&mut self) {
        trace!(from = %self.phase, to = %SpgemmPhase::NumericDone, "spgemm phase transition");
        self.phase = SpgemmPhase::NumericDone;
    }
}

enum SubHandleSlot {
    Empty,
    Active(SpgemmHandle),
    Destroyed,
}

/// Caller-owned context for SpGEMM computations
pub struct KernelHandle {
    config: SpgemmConfig,
    executor: Executor,
    spgemm: SubHandleSlot,
}

impl KernelHandle {
    pub fn new(config: SpgemmConfig) -> Self {
        Self {
            executor: Executor::new(&config),
            config,
            spgemm: SubHandleSlot::Empty,
        }
    }

    pub fn config(&self) -> &SpgemmConfig {
        &self.config
    }

    /// Creates the SpGEMM sub-handle in the `Uninitialized` phase.
    ///
    /// Fails if a live sub-handle already exists. A destroyed sub-handle may
    /// be replaced by a fresh one.
    pub fn create_spgemm_handle(&mut self, algorithm: SpgemmAlgorithm) -> Result<()> {
        if let SubHandleSlot::Active(existing) = &self.spgemm {
            return Err(SpgemmError::handle_state(
                "create_spgemm_handle",
                format!("a SpGEMM sub-handle already exists (phase: {})", existing.phase),
            ));
        }
        let handle = SpgemmHandle::new(algorithm, &self.config);
        trace!(?algorithm, kernel = ?handle.kernel, "created spgemm sub-handle");
        self.spgemm = SubHandleSlot::Active(handle);
        Ok(())
    }

    /// Returns the live sub-handle
    pub fn get_spgemm_handle(&self) -> Result<&SpgemmHandle> {
        match &self.spgemm {
            SubHandleSlot::Active(handle) => Ok(handle),
            other => Err(missing("get_spgemm_handle", other)),
        }
    }

    pub fn get_spgemm_handle_mut(&mut self) -> Result<&mut SpgemmHandle> {
        match &mut self.spgemm {
            SubHandleSlot::Active(handle) => Ok(handle),
            other => Err(missing("get_spgemm_handle", other)),
        }
    }

    /// Number of nonzeros computed for C by the last symbolic phase
    pub fn output_nnz(&self) -> Result<usize> {
        self.get_spgemm_handle()?.c_nnz()
    }

    /// Phase of the sub-handle; `None` if none was ever created
    pub fn spgemm_phase(&self) -> Option<SpgemmPhase> {
        match &self.spgemm {
            SubHandleSlot::Empty => None,
            SubHandleSlot::Active(handle) => Some(handle.phase),
            SubHandleSlot::Destroyed => Some(SpgemmPhase::Destroyed),
        }
    }

    /// Releases the sub-handle and its workspace
    pub fn destroy_spgemm_handle(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.spgemm, SubHandleSlot::Destroyed) {
            SubHandleSlot::Active(handle) => {
                trace!(from = %handle.phase, to = %SpgemmPhase::Destroyed, "spgemm phase transition");
                Ok(())
            }
            previous => {
                let err = missing("destroy_spgemm_handle", &previous);
                self.spgemm = previous;
                Err(err)
            }
        }
    }

    /// Splits the handle into the parts a phase needs at the same time
    pub(crate) fn phase_parts(
        &mut self,
        operation: &'static str,
    ) -> Result<(&SpgemmConfig, &Executor, &mut SpgemmHandle)> {
        match &mut self.spgemm {
            SubHandleSlot::Active(handle) => Ok((&self.config, &self.executor, handle)),
            other => Err(missing(operation, other)),
        }
    }
}

impl Default for KernelHandle {
    fn default() -> Self {
        Self::new(SpgemmConfig::default())
    }
}

fn missing(operation: &'static str, slot: &SubHandleSlot) -> SpgemmError {
    let state = match slot {
        SubHandleSlot::Empty => "no SpGEMM sub-handle has been created",
        SubHandleSlot::Destroyed => "the SpGEMM sub-handle was destroyed",
        SubHandleSlot::Active(_) => "sub-handle is live",
    };
    SpgemmError::handle_state(operation, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_twice_fails() {
        let mut kh = KernelHandle::new(SpgemmConfig::serial());
        kh.create_spgemm_handle(SpgemmAlgorithm::Default).unwrap();
        assert!(matches!(
            kh.create_spgemm_handle(SpgemmAlgorithm::Hash),
            Err(SpgemmError::HandleState { operation: "create_spgemm_handle", .. })
        ));
        assert_eq!(kh.spgemm_phase(), Some(SpgemmPhase::Uninitialized));
    }

    #[test]
    fn test_get_without_create_fails() {
        let kh = KernelHandle::new(SpgemmConfig::serial());
        assert!(kh.get_spgemm_handle().is_err());
        assert_eq!(kh.spgemm_phase(), None);
    }

    #[test]
    fn test_output_nnz_requires_symbolic() {
        let mut kh = KernelHandle::new(SpgemmConfig::serial());
        kh.create_spgemm_handle(SpgemmAlgorithm::Default).unwrap();
        assert!(kh.output_nnz().is_err());

        kh.get_spgemm_handle_mut()
            .unwrap()
            .finish_symbolic(7, Workspace::default());
        assert_eq!(kh.output_nnz().unwrap(), 7);
    }

    #[test]
    fn test_destroy_is_terminal_for_the_sub_handle() {
        let mut kh = KernelHandle::new(SpgemmConfig::serial());
        kh.create_spgemm_handle(SpgemmAlgorithm::Default).unwrap();
        kh.destroy_spgemm_handle().unwrap();

        assert_eq!(kh.spgemm_phase(), Some(SpgemmPhase::Destroyed));
        assert!(kh.get_spgemm_handle().is_err());
        assert!(kh.output_nnz().is_err());
        assert!(kh.destroy_spgemm_handle().is_err());
        assert_eq!(kh.spgemm_phase(), Some(SpgemmPhase::Destroyed));

        // A new sub-handle starts from scratch
        kh.create_spgemm_handle(SpgemmAlgorithm::Hash).unwrap();
        assert_eq!(kh.spgemm_phase(), Some(SpgemmPhase::Uninitialized));
    }

    #[test]
    fn test_numeric_checks_phase_and_shape() {
        let mut kh = KernelHandle::new(SpgemmConfig::serial());
        kh.create_spgemm_handle(SpgemmAlgorithm::Default).unwrap();
        let shape = ProblemShape { n_rows: 2, inner: 3, n_cols: 4, block_dim: 1 };

        let sub = kh.get_spgemm_handle_mut().unwrap();
        assert!(sub.check_numeric(shape).is_err());

        sub.finish_symbolic(0, Workspace { shape: Some(shape), ..Workspace::default() });
        assert!(sub.check_numeric(shape).is_ok());
        assert!(sub
            .check_numeric(ProblemShape { n_cols: 5, ..shape })
            .is_err());
    }

    #[test]
    fn test_kernel_resolution() {
        let config = SpgemmConfig {
            dense_column_limit: 10,
            ..SpgemmConfig::serial()
        };
        let adaptive = Kernel::resolve(SpgemmAlgorithm::Default, &config);
        assert!(adaptive.uses_dense(10));
        assert!(!adaptive.uses_dense(11));
        assert!(!Kernel::resolve(SpgemmAlgorithm::Hash, &config).uses_dense(1));
        assert!(Kernel::resolve(SpgemmAlgorithm::Dense, &config).uses_dense(1_000_000));
    }
}
