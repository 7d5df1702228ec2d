//! Property tests over random small matrices

use proptest::prelude::*;
use spgemm::{
    block_spgemm_with_config, reference_spgemm, spgemm_numeric, spgemm_symbolic,
    spgemm_with_config, BlockSparseMatrixBSR, KernelHandle, RowOrdering, SparseMatrixCSR,
    SpgemmAlgorithm, SpgemmConfig,
};

/// Random CSR matrix of the given shape with small integer values
fn csr_matrix(n_rows: usize, n_cols: usize) -> impl Strategy<Value = SparseMatrixCSR<f64>> {
    let cell = prop::option::weighted(0.3, -4i32..=4);
    prop::collection::vec(cell, n_rows * n_cols).prop_map(move |cells| {
        let mut row_ptr = vec![0];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for i in 0..n_rows {
            // Store each row back to front
            for j in (0..n_cols).rev() {
                if let Some(v) = cells[i * n_cols + j] {
                    col_idx.push(j);
                    values.push(v as f64);
                }
            }
            row_ptr.push(col_idx.len());
        }
        SparseMatrixCSR::new(n_rows, n_cols, row_ptr, col_idx, values)
    })
}

/// A pair of multipliable matrices
fn product_operands() -> impl Strategy<Value = (SparseMatrixCSR<f64>, SparseMatrixCSR<f64>)> {
    (0usize..8, 0usize..8, 0usize..8)
        .prop_flat_map(|(m, k, n)| (csr_matrix(m, k), csr_matrix(k, n)))
}

fn config_strategy() -> impl Strategy<Value = SpgemmConfig> {
    (
        prop_oneof![
            Just(SpgemmAlgorithm::Default),
            Just(SpgemmAlgorithm::Hash),
            Just(SpgemmAlgorithm::Dense),
        ],
        any::<bool>(),
    )
        .prop_map(|(algorithm, serial)| {
            let config = if serial { SpgemmConfig::serial() } else { SpgemmConfig::default() };
            config.with_algorithm(algorithm)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn product_matches_dense((a, b) in product_operands(), config in config_strategy()) {
        let c = spgemm_with_config(&a, false, &b, false, &config).unwrap();

        prop_assert_eq!(c.n_rows, a.n_rows);
        prop_assert_eq!(c.n_cols, b.n_cols);
        prop_assert_eq!(c.row_ptr.len(), a.n_rows + 1);
        prop_assert_eq!(c.row_ptr[0], 0);
        prop_assert!(c.row_ptr.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(c.row_ptr[c.n_rows], c.nnz());
        prop_assert!(c.col_idx.iter().all(|&j| j < c.n_cols));
        prop_assert_eq!(c.to_dense(), a.to_dense().dot(&b.to_dense()));
    }

    #[test]
    fn structure_matches_reference((a, b) in product_operands()) {
        let config = SpgemmConfig::default().with_row_ordering(RowOrdering::Sorted);
        let c = spgemm_with_config(&a, false, &b, false, &config).unwrap();
        let expected = reference_spgemm(&a, &b).unwrap();

        prop_assert_eq!(&c.row_ptr, &expected.row_ptr);
        prop_assert_eq!(&c.col_idx, &expected.col_idx);
        prop_assert_eq!(&c.values, &expected.values);
    }

    #[test]
    fn symbolic_reserves_exactly_what_numeric_fills((a, b) in product_operands()) {
        let mut handle = KernelHandle::new(SpgemmConfig::serial());
        handle.create_spgemm_handle(SpgemmAlgorithm::Default).unwrap();

        let structure = spgemm_symbolic(&mut handle, &a, false, &b, false).unwrap();
        prop_assert_eq!(handle.output_nnz().unwrap(), structure.nnz);

        let c = spgemm_numeric(&mut handle, &a, false, &b, false, &structure).unwrap();
        prop_assert_eq!(&c.row_ptr, &structure.row_ptr);
        prop_assert_eq!(c.nnz(), structure.nnz);

        // Each row holds distinct columns
        for i in 0..c.n_rows {
            let mut cols: Vec<usize> = c.row_iter(i).map(|(j, _)| j).collect();
            let len = cols.len();
            cols.sort_unstable();
            cols.dedup();
            prop_assert_eq!(cols.len(), len);
        }
    }

    #[test]
    fn numeric_is_idempotent((a, b) in product_operands()) {
        let mut handle = KernelHandle::new(SpgemmConfig::serial());
        handle.create_spgemm_handle(SpgemmAlgorithm::Hash).unwrap();

        let structure = spgemm_symbolic(&mut handle, &a, false, &b, false).unwrap();
        let first = spgemm_numeric(&mut handle, &a, false, &b, false, &structure).unwrap();
        let second = spgemm_numeric(&mut handle, &a, false, &b, false, &structure).unwrap();

        prop_assert_eq!(first.col_idx, second.col_idx);
        prop_assert_eq!(first.values, second.values);
    }

    #[test]
    fn transposed_product_matches_dense((a, b) in product_operands()) {
        // (A·B)ᵀ = Bᵀ·Aᵀ
        let config = SpgemmConfig::serial();
        let c = spgemm_with_config(&b, true, &a, true, &config).unwrap();
        prop_assert_eq!(c.to_dense(), a.to_dense().dot(&b.to_dense()).reversed_axes());
    }

    #[test]
    fn block_dim_one_matches_scalar((a, b) in product_operands()) {
        let config = SpgemmConfig::serial();
        let scalar = spgemm_with_config(&a, false, &b, false, &config).unwrap();
        let block = block_spgemm_with_config(
            &BlockSparseMatrixBSR::from_csr(&a),
            false,
            &BlockSparseMatrixBSR::from_csr(&b),
            false,
            &config,
        )
        .unwrap();

        prop_assert_eq!(&block.row_ptr, &scalar.row_ptr);
        prop_assert_eq!(&block.col_idx, &scalar.col_idx);
        prop_assert_eq!(&block.values, &scalar.values);
    }
}
