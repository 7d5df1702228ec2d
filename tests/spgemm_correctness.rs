//! Tests for SpGEMM correctness against reference implementations

use ndarray::arr2;
use spgemm::{
    reference_spgemm, spgemm, spgemm_with_config, to_sprs_csr, ExecutionSpace, RowOrdering,
    SparseMatrixCSR, SpgemmAlgorithm, SpgemmConfig,
};

/// Create a diagonal matrix
fn create_diagonal_matrix(n: usize, value: f64) -> SparseMatrixCSR<f64> {
    let row_ptr: Vec<usize> = (0..=n).collect();
    let col_idx: Vec<usize> = (0..n).collect();
    let values = vec![value; n];

    SparseMatrixCSR::new(n, n, row_ptr, col_idx, values)
}

/// Create a tridiagonal matrix
fn create_tridiagonal_matrix(n: usize) -> SparseMatrixCSR<f64> {
    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    row_ptr.push(0);

    for i in 0..n {
        // Lower diagonal
        if i > 0 {
            col_idx.push(i - 1);
            values.push(1.0);
        }

        // Diagonal
        col_idx.push(i);
        values.push(2.0);

        // Upper diagonal
        if i < n - 1 {
            col_idx.push(i + 1);
            values.push(1.0);
        }

        row_ptr.push(col_idx.len());
    }

    SparseMatrixCSR::new(n, n, row_ptr, col_idx, values)
}

/// Pseudo-random rectangular matrix with a few entries per row, columns
/// deliberately out of order
fn create_scattered_matrix(n_rows: usize, n_cols: usize, seed: usize) -> SparseMatrixCSR<f64> {
    let mut row_ptr = vec![0];
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    for i in 0..n_rows {
        let mut cols: Vec<usize> = (0..(i + seed) % 5)
            .map(|k| (i * 7 + k * 13 + seed * 3) % n_cols)
            .collect();
        cols.sort_unstable();
        cols.dedup();
        cols.reverse();
        for &j in &cols {
            col_idx.push(j);
            values.push(((i + 2 * j + seed) % 9) as f64 - 4.0);
        }
        row_ptr.push(col_idx.len());
    }

    SparseMatrixCSR::new(n_rows, n_cols, row_ptr, col_idx, values)
}

/// Every configuration the engine supports
fn all_configs() -> Vec<SpgemmConfig> {
    let mut configs = Vec::new();
    for algorithm in [SpgemmAlgorithm::Default, SpgemmAlgorithm::Hash, SpgemmAlgorithm::Dense] {
        for execution in [ExecutionSpace::Serial, ExecutionSpace::Parallel] {
            configs.push(SpgemmConfig {
                execution,
                ..SpgemmConfig::default().with_algorithm(algorithm)
            });
        }
    }
    configs
}

/// Asserts that `actual` has the same entries as `expected`, in any order
/// within each row
fn assert_same_entries(actual: &SparseMatrixCSR<f64>, expected: &SparseMatrixCSR<f64>) {
    assert_eq!(actual.n_rows, expected.n_rows);
    assert_eq!(actual.n_cols, expected.n_cols);
    assert_eq!(actual.row_ptr, expected.row_ptr);

    let mut actual = actual.clone();
    actual.sort_rows();
    assert_eq!(actual.col_idx, expected.col_idx);
    for (a, e) in actual.values.iter().zip(&expected.values) {
        assert!((a - e).abs() < 1e-10, "value mismatch: {a} vs {e}");
    }
}

#[test]
fn test_concrete_scenario() {
    // A = [1 0]   B = [3 0]   C = [3 0]
    //     [0 2]       [1 4]       [2 8]
    let a = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]);
    let b = SparseMatrixCSR::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![3.0, 1.0, 4.0]);

    for config in all_configs() {
        let c = spgemm_with_config(&a, false, &b, false, &config).unwrap();
        assert_eq!(c.nnz(), 3);
        assert_eq!(c.row_ptr, vec![0, 1, 3]);
        assert_eq!(c.to_dense(), arr2(&[[3.0, 0.0], [2.0, 8.0]]));
    }
}

#[test]
fn test_identity_multiplication() {
    let a = SparseMatrixCSR::identity(10);
    let b = create_diagonal_matrix(10, 2.0);

    let result = spgemm(&a, false, &b, false).unwrap();

    assert_eq!(result.n_rows, 10);
    assert_eq!(result.n_cols, 10);
    assert_eq!(result.nnz(), 10);

    for i in 0..10 {
        let row: Vec<_> = result.row_iter(i).collect();
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].0, i);
        assert_eq!(*row[0].1, 2.0);
    }
}

#[test]
fn test_tridiagonal_multiplication() {
    let a = create_tridiagonal_matrix(5);

    // Tridiagonal * Tridiagonal is pentadiagonal
    let result = spgemm(&a, false, &a, false).unwrap();
    assert_eq!(result.row_ptr, vec![0, 3, 7, 12, 16, 19]);

    let expected = reference_spgemm(&a, &a).unwrap();
    assert_same_entries(&result, &expected);
}

#[test]
fn test_against_reference_all_configs() {
    let a = create_scattered_matrix(40, 30, 1);
    let b = create_scattered_matrix(30, 50, 2);
    let expected = reference_spgemm(&a, &b).unwrap();

    for config in all_configs() {
        let c = spgemm_with_config(&a, false, &b, false, &config).unwrap();
        assert_same_entries(&c, &expected);
    }
}

#[test]
fn test_against_dense_product() {
    let a = create_scattered_matrix(25, 18, 3);
    let b = create_scattered_matrix(18, 22, 4);

    let c = spgemm(&a, false, &b, false).unwrap();
    assert_eq!(c.to_dense(), a.to_dense().dot(&b.to_dense()));
}

#[test]
fn test_against_sprs() {
    let a = create_tridiagonal_matrix(12);
    let b = create_diagonal_matrix(12, 3.0);

    let ours = spgemm_with_config(
        &a,
        false,
        &b,
        false,
        &SpgemmConfig::default().with_row_ordering(RowOrdering::Sorted),
    )
    .unwrap();
    let theirs = &to_sprs_csr(&a).unwrap() * &to_sprs_csr(&b).unwrap();

    assert_eq!(ours.n_rows, theirs.rows());
    assert_eq!(ours.n_cols, theirs.cols());
    assert_eq!(ours.nnz(), theirs.nnz());
    assert_eq!(ours.col_idx, theirs.indices().to_vec());
    for (a, b) in ours.values.iter().zip(theirs.data()) {
        assert!((a - b).abs() < 1e-10);
    }
}

#[test]
fn test_transpose_flags() {
    let a = create_scattered_matrix(12, 7, 5);
    let b = create_scattered_matrix(12, 9, 6);
    let d = create_scattered_matrix(9, 7, 7);

    // Aᵀ · B is 7 × 9
    let c = spgemm(&a, true, &b, false).unwrap();
    assert_eq!((c.n_rows, c.n_cols), (7, 9));
    assert_eq!(c.to_dense(), a.to_dense().t().dot(&b.to_dense()));

    // Bᵀ · A is 9 × 7
    let c = spgemm(&b, true, &a, false).unwrap();
    assert_eq!(c.to_dense(), b.to_dense().t().dot(&a.to_dense()));

    // A · Dᵀ is 12 × 9
    let c = spgemm(&a, false, &d, true).unwrap();
    assert_eq!(c.to_dense(), a.to_dense().dot(&d.to_dense().t()));

    // Dᵀ · Bᵀ is 7 × 12
    let c = spgemm(&d, true, &b, true).unwrap();
    assert_eq!(c.to_dense(), d.to_dense().t().dot(&b.to_dense().t()));
}

#[test]
fn test_empty_and_degenerate_shapes() {
    // Zero inner dimension: every row of C is empty
    let a = SparseMatrixCSR::<f64>::zeros(3, 0);
    let b = SparseMatrixCSR::<f64>::zeros(0, 4);
    let c = spgemm(&a, false, &b, false).unwrap();
    assert_eq!((c.n_rows, c.n_cols, c.nnz()), (3, 4, 0));
    assert_eq!(c.row_ptr, vec![0; 4]);

    // Zero rows
    let a = SparseMatrixCSR::<f64>::zeros(0, 5);
    let b = create_scattered_matrix(5, 5, 1);
    let c = spgemm(&a, false, &b, false).unwrap();
    assert_eq!(c.row_ptr, vec![0]);

    // Structurally empty operand
    let a = create_scattered_matrix(6, 6, 2);
    let b = SparseMatrixCSR::<f64>::zeros(6, 6);
    let c = spgemm(&a, false, &b, false).unwrap();
    assert_eq!(c.nnz(), 0);
    assert_eq!(c.row_ptr, vec![0; 7]);
}

#[test]
fn test_cancellation_keeps_structural_entries() {
    // Row 0 of A·B is 1·1 + 1·(-1) = 0, but column 0 is still reachable
    let a = SparseMatrixCSR::new(1, 2, vec![0, 2], vec![0, 1], vec![1.0, 1.0]);
    let b = SparseMatrixCSR::new(2, 1, vec![0, 1, 2], vec![0, 0], vec![1.0, -1.0]);

    let c = spgemm(&a, false, &b, false).unwrap();
    assert_eq!(c.nnz(), 1);
    assert_eq!(c.col_idx, vec![0]);
    assert_eq!(c.values, vec![0.0]);
}

#[test]
fn test_sorted_row_ordering() {
    let a = create_scattered_matrix(30, 30, 3);
    let b = create_scattered_matrix(30, 30, 8);
    let config = SpgemmConfig::default().with_row_ordering(RowOrdering::Sorted);

    let c = spgemm_with_config(&a, false, &b, false, &config).unwrap();
    for i in 0..c.n_rows {
        let cols: Vec<usize> = c.row_iter(i).map(|(j, _)| j).collect();
        assert!(cols.windows(2).all(|w| w[0] < w[1]), "row {i} not sorted: {cols:?}");
    }
    assert_same_entries(&c, &reference_spgemm(&a, &b).unwrap());
}

#[test]
fn test_unsorted_rows_have_distinct_columns() {
    let a = create_scattered_matrix(30, 30, 4);
    let c = spgemm(&a, false, &a, false).unwrap();
    for i in 0..c.n_rows {
        let mut cols: Vec<usize> = c.row_iter(i).map(|(j, _)| j).collect();
        let len = cols.len();
        cols.sort_unstable();
        cols.dedup();
        assert_eq!(cols.len(), len);
    }
}

#[test]
fn test_integer_values() {
    let a = SparseMatrixCSR::new(2, 3, vec![0, 2, 3], vec![0, 2, 1], vec![1i64, 2, 3]);
    let b = SparseMatrixCSR::new(3, 2, vec![0, 1, 2, 4], vec![1, 0, 0, 1], vec![4i64, 5, 6, 7]);

    let c = spgemm(&a, false, &b, false).unwrap();
    assert_eq!(c.to_dense(), arr2(&[[12, 18], [15, 0]]));
}

#[test]
fn test_associativity_through_mul_vec() {
    let a = create_scattered_matrix(20, 15, 1);
    let b = create_scattered_matrix(15, 10, 2);
    let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5 - 2.0).collect();

    let c = spgemm(&a, false, &b, false).unwrap();
    let left = c.mul_vec(&x).unwrap();
    let right = a.mul_vec(&b.mul_vec(&x).unwrap()).unwrap();

    for (l, r) in left.iter().zip(&right) {
        assert!((l - r).abs() < 1e-9);
    }
}
