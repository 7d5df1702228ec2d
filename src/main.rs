use spgemm::{
    reference_spgemm, spgemm_numeric, spgemm_numeric_into, spgemm_symbolic, KernelHandle,
    SparseMatrixCSR, SpgemmAlgorithm, SpgemmConfig,
};

fn main() -> spgemm::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    println!("spgemm {}: two-phase sparse matrix-matrix multiplication", spgemm::VERSION);

    // A = [1 0]    B = [3 0]
    //     [0 2]        [1 4]
    let mut a = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]).with_label("A");
    let b = SparseMatrixCSR::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![3.0, 1.0, 4.0]).with_label("B");

    println!("\nMatrix A:\n{:?}", a);
    println!("\nMatrix B:\n{:?}", b);

    let config = SpgemmConfig::default();
    println!("\nConfiguration:");
    println!("  Algorithm: {:?}", config.algorithm);
    println!("  Execution: {:?}", config.execution);
    println!("  Threads: {}", config.system_params.n_threads);
    println!("  Dense column limit: {}", config.dense_column_limit);

    let mut handle = KernelHandle::new(config);
    handle.create_spgemm_handle(SpgemmAlgorithm::Default)?;

    let structure = spgemm_symbolic(&mut handle, &a, false, &b, false)?;
    println!("\nSymbolic phase:");
    println!("  nnz(C) = {}", handle.output_nnz()?);
    println!("  row_ptr = {:?}", structure.row_ptr);

    let mut c = spgemm_numeric(&mut handle, &a, false, &b, false, &structure)?;
    c.sort_rows();
    println!("\nNumeric phase:\n{}", c.to_dense());

    let expected = reference_spgemm(&a, &b)?;
    println!("\nReference:\n{}", expected.to_dense());

    // Same pattern, new values: only the numeric phase runs again
    a.values = vec![10.0, 20.0];
    spgemm_numeric_into(&mut handle, &a, false, &b, false, &mut c)?;
    println!("\nAfter scaling A by 10:\n{}", c.to_dense());

    handle.destroy_spgemm_handle()?;
    println!("\nSub-handle phase: {:?}", handle.spgemm_phase());

    Ok(())
}
