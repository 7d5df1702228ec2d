//! Row accumulators for two-phase sparse matrix multiplication
//!
//! An accumulator maps the output columns of one row to compact slot
//! positions `0, 1, 2, ...` in first-seen order. The symbolic phase only
//! counts the slots; the numeric phase uses the slot positions to address
//! the row's reserved range in C. Two implementations exist:
//!
//! - [`DenseAccumulator`]: a marker array over the whole column domain
//! - [`HashAccumulator`]: open addressing sized from the row's bound

pub mod dense;
pub mod hash;
pub mod sort;

pub use dense::DenseAccumulator;
pub use hash::HashAccumulator;

/// Result of inserting a column into an accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Position of the column within the row
    pub index: usize,
    /// True the first time the column is seen in the current row
    pub fresh: bool,
}

/// Trait for column-to-slot maps used by both SpGEMM phases
pub trait ColumnAccumulator {
    /// Prepare for a new row holding at most `limit` distinct columns
    fn reset(&mut self, limit: usize);

    /// Look up `col`, assigning the next slot if it is new.
    ///
    /// Returns `None` when a new column would exceed the row's limit.
    fn insert(&mut self, col: usize) -> Option<Slot>;

    /// Number of distinct columns seen in the current row
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct columns of the current row in slot order
    fn columns(&self) -> &[usize];
}

/// Per-worker scratch space: one accumulator of each kind, created lazily
/// and reused across the rows a worker processes.
pub struct RowWorkspace {
    n_cols: usize,
    dense: Option<DenseAccumulator>,
    hash: HashAccumulator,
}

impl RowWorkspace {
    /// Creates scratch space for rows over `n_cols` output columns.
    /// `hash_capacity` pre-sizes the hash table for the widest expected row.
    pub fn new(n_cols: usize, hash_capacity: usize) -> Self {
        Self {
            n_cols,
            dense: None,
            hash: HashAccumulator::with_capacity(hash_capacity),
        }
    }

    /// Returns the requested accumulator, reset for a row of at most `limit` columns
    pub fn accumulator(&mut self, dense: bool, limit: usize) -> &mut dyn ColumnAccumulator {
        if dense {
            let n_cols = self.n_cols;
            let acc = self.dense.get_or_insert_with(|| DenseAccumulator::new(n_cols));
            acc.reset(limit);
            acc
        } else {
            self.hash.reset(limit);
            &mut self.hash
        }
    }
}
