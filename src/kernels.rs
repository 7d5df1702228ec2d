//! Dense leaf kernels on row-major square blocks
//!
//! Block SpGEMM and block matrix-vector products treat every stored block as
//! a dense `dim × dim` row-major slice. The arithmetic is delegated to
//! ndarray's general matrix products.

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::Result;
use crate::matrix::Scalar;

/// Whether a block is used as stored or transposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trans {
    NoTranspose,
    Transpose,
}

/// `c ← alpha · a · b + beta · c` on `dim × dim` row-major blocks
pub fn gemm_acc<T: Scalar>(
    alpha: T,
    a: &[T],
    b: &[T],
    beta: T,
    c: &mut [T],
    dim: usize,
) -> Result<()> {
    let a = ArrayView2::from_shape((dim, dim), a)?;
    let b = ArrayView2::from_shape((dim, dim), b)?;
    let mut c = ArrayViewMut2::from_shape((dim, dim), c)?;
    general_mat_mul(alpha, &a, &b, beta, &mut c);
    Ok(())
}

/// `y ← alpha · op(a) · x + beta · y` for a `dim × dim` row-major block
pub fn gemv<T: Scalar>(
    trans: Trans,
    alpha: T,
    a: &[T],
    x: &[T],
    beta: T,
    y: &mut [T],
    dim: usize,
) -> Result<()> {
    let a = ArrayView2::from_shape((dim, dim), a)?;
    let x = ArrayView1::from_shape(dim, x)?;
    let mut y = ArrayViewMut1::from_shape(dim, y)?;
    match trans {
        Trans::NoTranspose => general_mat_vec_mul(alpha, &a, &x, beta, &mut y),
        Trans::Transpose => general_mat_vec_mul(alpha, &a.t(), &x, beta, &mut y),
    }
    Ok(())
}

/// Writes the transpose of the row-major block `src` into `dst`
pub fn transpose_block<T: Copy>(src: &[T], dst: &mut [T], dim: usize) {
    for r in 0..dim {
        for c in 0..dim {
            dst[c * dim + r] = src[r * dim + c];
        }
    }
}
