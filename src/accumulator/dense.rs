//! Dense marker-array accumulator
//!
//! Used when the output column domain is small enough that an array indexed
//! by column is cheaper than hashing.

use crate::accumulator::{ColumnAccumulator, Slot};

const UNMARKED: usize = usize::MAX;

/// Dense accumulator for a single row of sparse matrix multiplication
///
/// `marker[col]` holds the slot assigned to `col` in the current row, or
/// `UNMARKED`. Only the touched entries are cleared between rows.
pub struct DenseAccumulator {
    /// Slot of each column, indexed by column
    marker: Vec<usize>,

    /// Columns of the current row in slot order
    col_indices: Vec<usize>,

    /// Maximum number of distinct columns in the current row
    limit: usize,
}

impl DenseAccumulator {
    /// Create a new dense accumulator with specified column capacity
    ///
    /// # Arguments
    ///
    /// * `n_cols` - The number of columns in the output matrix (C)
    pub fn new(n_cols: usize) -> Self {
        Self {
            marker: vec![UNMARKED; n_cols],
            col_indices: Vec::new(),
            limit: n_cols,
        }
    }
}

impl ColumnAccumulator for DenseAccumulator {
    fn reset(&mut self, limit: usize) {
        for &col in &self.col_indices {
            self.marker[col] = UNMARKED;
        }
        self.col_indices.clear();
        self.limit = limit;
    }

    fn insert(&mut self, col: usize) -> Option<Slot> {
        match self.marker[col] {
            UNMARKED => {
                if self.col_indices.len() == self.limit {
                    return None;
                }
                let index = self.col_indices.len();
                self.marker[col] = index;
                self.col_indices.push(col);
                Some(Slot { index, fresh: true })
            }
            index => Some(Slot { index, fresh: false }),
        }
    }

    fn len(&self) -> usize {
        self.col_indices.len()
    }

    fn columns(&self) -> &[usize] {
        &self.col_indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_accumulator_empty() {
        let accumulator = DenseAccumulator::new(5);
        assert_eq!(accumulator.len(), 0);
        assert!(accumulator.columns().is_empty());
    }

    #[test]
    fn test_dense_accumulator_duplicate_columns() {
        let mut accumulator = DenseAccumulator::new(5);
        accumulator.reset(5);

        accumulator.insert(2);
        accumulator.insert(2);
        accumulator.insert(2);

        assert_eq!(accumulator.columns(), &[2]);
    }

    #[test]
    fn test_dense_accumulator_reset() {
        let mut accumulator = DenseAccumulator::new(5);
        accumulator.reset(5);

        accumulator.insert(1);
        accumulator.insert(3);

        accumulator.reset(5);

        // Previously marked columns are fresh again
        assert_eq!(accumulator.insert(3), Some(Slot { index: 0, fresh: true }));
        assert_eq!(accumulator.insert(4), Some(Slot { index: 1, fresh: true }));
        assert_eq!(accumulator.columns(), &[3, 4]);
    }

    #[test]
    fn test_dense_accumulator_limit() {
        let mut accumulator = DenseAccumulator::new(5);
        accumulator.reset(0);
        assert_eq!(accumulator.insert(0), None);
    }
}
