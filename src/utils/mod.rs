//! Utility functions and helpers

pub mod formats;

pub use formats::{from_sprs_csr, to_sprs_csr};

use crate::error::Result;
use crate::storage::try_filled;

/// Computes an exclusive prefix sum (scan) for a vector
///
/// The output has one more element than `input` and starts at 0. Fails with
/// [`SpgemmError::AllocationFailure`](crate::SpgemmError::AllocationFailure)
/// if the output cannot be allocated.
pub fn exclusive_scan(input: &[usize]) -> Result<Vec<usize>> {
    let mut result = try_filled("row_ptr", input.len() + 1, 0)?;
    let mut sum = 0;

    for (out, &val) in result[1..].iter_mut().zip(input) {
        sum += val;
        *out = sum;
    }

    Ok(result)
}

/// Splits a slot buffer into one mutable slice per row.
///
/// Row `i` owns slots `row_ptr[i]..row_ptr[i + 1]`, each `width` elements
/// wide. The slices are disjoint, so they can be handed to parallel tasks.
pub fn split_rows_mut<'a, T>(
    mut buffer: &'a mut [T],
    row_ptr: &[usize],
    width: usize,
) -> Vec<&'a mut [T]> {
    let mut rows = Vec::with_capacity(row_ptr.len().saturating_sub(1));
    for w in row_ptr.windows(2) {
        let (row, rest) = std::mem::take(&mut buffer).split_at_mut((w[1] - w[0]) * width);
        rows.push(row);
        buffer = rest;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_scan() {
        let input = vec![1, 2, 3, 4];
        let expected = vec![0, 1, 3, 6, 10];
        assert_eq!(exclusive_scan(&input).unwrap(), expected);

        let input = vec![0, 0, 5, 0];
        let expected = vec![0, 0, 0, 5, 5];
        assert_eq!(exclusive_scan(&input).unwrap(), expected);

        assert_eq!(exclusive_scan(&[]).unwrap(), vec![0]);
    }

    #[test]
    fn test_split_rows_mut() {
        let mut buffer = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let rows = split_rows_mut(&mut buffer, &[0, 1, 1, 4], 2);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], &[0, 1]);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], &[2, 3, 4, 5, 6, 7]);
    }
}
