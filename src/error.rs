//! Error types for the SpGEMM pipeline

use thiserror::Error;

/// Result type alias using the crate's error
pub type Result<T> = std::result::Result<T, SpgemmError>;

/// Errors reported by matrix construction, the computation handle and the
/// symbolic/numeric phases.
///
/// None of these are retried internally: each one is either a precondition
/// violation by the caller or resource exhaustion.
#[derive(Error, Debug)]
pub enum SpgemmError {
    /// The inner dimensions of op(A) and op(B) disagree
    #[error("Dimension mismatch: op(A) has {left_cols} columns but op(B) has {right_rows} rows")]
    DimensionMismatch {
        /// Number of columns of op(A)
        left_cols: usize,
        /// Number of rows of op(B)
        right_rows: usize,
    },

    /// Block SpGEMM called with matrices of different block sizes
    #[error("Block size mismatch: A has block dimension {a}, B has {b}{}", .c.map(|c| format!(", C has {c}")).unwrap_or_default())]
    BlockSizeMismatch {
        /// Block dimension of A
        a: usize,
        /// Block dimension of B
        b: usize,
        /// Block dimension of C, when C takes part in the check
        c: Option<usize>,
    },

    /// An entry point was invoked in the wrong phase or without a live sub-handle
    #[error("Invalid handle state for '{operation}': {state}")]
    HandleState {
        /// The operation being attempted
        operation: &'static str,
        /// Description of the offending state
        state: String,
    },

    /// Storage for an output buffer could not be reserved
    #[error("Allocation failure: could not allocate {len} elements for '{buffer}'")]
    AllocationFailure {
        /// Label of the buffer
        buffer: &'static str,
        /// Requested number of elements
        len: usize,
    },

    /// Matrix arrays are inconsistent
    #[error("Invalid matrix '{label}': {reason}")]
    InvalidMatrix {
        /// Matrix label
        label: String,
        /// What is wrong with it
        reason: String,
    },

    /// The numeric phase found a row whose column structure differs from
    /// the one reserved by the symbolic phase
    #[error("Structure mismatch in row {row}: symbolic phase reserved {reserved} slots, numeric phase found {found}")]
    StructureMismatch {
        /// Output row
        row: usize,
        /// Slots reserved by the symbolic phase
        reserved: usize,
        /// Distinct columns found so far by the numeric phase
        found: usize,
    },

    /// A dense block kernel was handed a slice of the wrong shape
    #[error("Dense kernel error: {0}")]
    Kernel(#[from] ndarray::ShapeError),
}

impl SpgemmError {
    pub(crate) fn handle_state(operation: &'static str, state: impl Into<String>) -> Self {
        SpgemmError::HandleState {
            operation,
            state: state.into(),
        }
    }

    pub(crate) fn invalid_matrix(label: &str, reason: impl Into<String>) -> Self {
        SpgemmError::InvalidMatrix {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_message() {
        let err = SpgemmError::BlockSizeMismatch { a: 2, b: 3, c: None };
        assert_eq!(
            err.to_string(),
            "Block size mismatch: A has block dimension 2, B has 3"
        );

        let err = SpgemmError::BlockSizeMismatch { a: 2, b: 2, c: Some(4) };
        assert_eq!(
            err.to_string(),
            "Block size mismatch: A has block dimension 2, B has 2, C has 4"
        );
    }

    #[test]
    fn test_dimension_message() {
        let err = SpgemmError::DimensionMismatch {
            left_cols: 3,
            right_rows: 4,
        };
        assert!(err.to_string().contains("3 columns"));
        assert!(err.to_string().contains("4 rows"));
    }
}
