//! Configuration and system parameters for SpGEMM

use crate::storage::AllocationMode;

/// Accumulation strategy requested for a SpGEMM sub-handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpgemmAlgorithm {
    /// Choose per row: dense marker array when the output column domain is
    /// at most `dense_column_limit`, open-addressing hash otherwise
    #[default]
    Default,
    /// Always use the open-addressing hash accumulator
    Hash,
    /// Always use the dense marker-array accumulator
    Dense,
}

/// Where row tasks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionSpace {
    /// Rows are processed one after another on the calling thread
    Serial,
    /// Rows are processed on a rayon pool with `SystemParameters::n_threads` workers
    #[default]
    Parallel,
}

/// Column order of the entries inside each output row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrdering {
    /// Entries stay in accumulation order
    #[default]
    Unsorted,
    /// Each row is sorted by column after the numeric phase
    Sorted,
}

/// System parameters for performance tuning
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Size of L2 cache in bytes
    pub l2_cache_size: usize,
    /// Number of threads to use
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            l2_cache_size: 256_000,     // 256KB L2 cache (conservative default)
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// Configuration for a computation handle
#[derive(Debug, Clone)]
pub struct SpgemmConfig {
    /// System parameters for performance tuning
    pub system_params: SystemParameters,

    /// Accumulation strategy
    pub algorithm: SpgemmAlgorithm,

    /// Largest output column count for which the adaptive strategy uses a
    /// dense marker array
    pub dense_column_limit: usize,

    /// Serial or parallel row processing
    pub execution: ExecutionSpace,

    /// Whether numeric output rows are sorted by column
    pub row_ordering: RowOrdering,

    /// How C's entry and value buffers are prepared
    pub allocation: AllocationMode,
}

impl Default for SpgemmConfig {
    fn default() -> Self {
        let system_params = SystemParameters::default();
        Self {
            dense_column_limit: dense_column_limit(&system_params),
            system_params,
            algorithm: SpgemmAlgorithm::Default,
            execution: ExecutionSpace::Parallel,
            row_ordering: RowOrdering::Unsorted,
            allocation: AllocationMode::WithoutInitializing,
        }
    }
}

impl SpgemmConfig {
    /// Single-threaded configuration, useful for reproducible summation order
    pub fn serial() -> Self {
        Self {
            execution: ExecutionSpace::Serial,
            ..Self::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: SpgemmAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_row_ordering(mut self, row_ordering: RowOrdering) -> Self {
        self.row_ordering = row_ordering;
        self
    }

    pub fn with_allocation(mut self, allocation: AllocationMode) -> Self {
        self.allocation = allocation;
        self
    }
}

/// Number of marker entries that fit in half the L2 cache
fn dense_column_limit(params: &SystemParameters) -> usize {
    params.l2_cache_size / (2 * std::mem::size_of::<usize>())
}
