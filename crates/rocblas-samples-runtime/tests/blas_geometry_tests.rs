//! Operand-size rules the rocBLAS wrappers enforce before dispatch.

use proptest::prelude::*;
use rocblas_samples_runtime::Operation;
use rocblas_samples_runtime::blas::{matrix_min_len, stored_shape, vector_min_len};

// ── vectors ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_touched_index_is_inside_the_minimum_length(n in 1i32..200, inc in -9i32..10) {
        let len = vector_min_len(n, inc);
        let step = inc.unsigned_abs() as usize;
        for i in 0..n as usize {
            // Negative increments walk the same span backwards.
            let idx = if inc < 0 { (n as usize - 1 - i) * step } else { i * step };
            prop_assert!(idx < len);
        }
        prop_assert_eq!(vector_min_len(n, inc), vector_min_len(n, -inc));
    }

    #[test]
    fn matrix_length_covers_last_element(rows in 1i32..64, cols in 1i32..64, pad in 0i32..8) {
        let ld = rows + pad;
        let len = matrix_min_len(rows, cols, ld).unwrap();
        let last = (rows - 1) as usize + (cols - 1) as usize * ld as usize;
        prop_assert_eq!(len, last + 1);
    }
}

// ── matrices ────────────────────────────────────────────────────

#[test]
fn packed_matrix_length_is_rows_times_cols() {
    assert_eq!(matrix_min_len(200, 60, 200).unwrap(), 12_000);
}

#[test]
fn leading_dimension_must_cover_a_column() {
    assert!(matrix_min_len(5, 5, 4).is_err());
    assert!(matrix_min_len(0, 5, 0).is_err());
    assert_eq!(matrix_min_len(0, 5, 1).unwrap(), 0);
}

#[test]
fn gemm_ex_f32_operand_a_is_stored_transposed() {
    // op(A) is M x K = 200 x 60 -> stored K x M
    let (rows, cols) = stored_shape(Operation::Transpose, 200, 60);
    assert_eq!((rows, cols), (60, 200));
    assert_eq!(matrix_min_len(rows, cols, rows).unwrap(), 12_000);
}
