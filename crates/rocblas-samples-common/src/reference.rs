//! Brute-force CPU reference routines used as test oracles.
//!
//! Matrices are column-major with explicit leading dimensions. Vector
//! increments follow BLAS: logical element `i` of an `n`-vector with
//! increment `inc < 0` lives at `(n - 1 - i) * |inc|`.
//!
//! # Panics
//!
//! Every routine indexes its slices directly and panics when a buffer is
//! shorter than the geometry it is given.

use num_complex::Complex;
use num_traits::{AsPrimitive, Float, Num, One, ToPrimitive, Zero};
use rocblas_samples_runtime::{Diagonal, Fill, Operation};

/// Storage index of logical element `i` of an `n`-vector with increment `inc`.
pub fn strided_index(i: usize, n: usize, inc: i32) -> usize {
    let step = inc.unsigned_abs() as usize;
    if inc >= 0 { i * step } else { (n - 1 - i) * step }
}

/// Host buffer length for an `n`-vector at increment `inc`: `max(n * |inc|, 1)`.
pub fn vector_extent(n: usize, inc: i32) -> usize {
    (n * inc.unsigned_abs() as usize).max(1)
}

/// Distance between consecutive rows and columns of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strides {
    pub row: usize,
    pub col: usize,
}

impl Strides {
    /// Plain column-major storage with leading dimension `ld`.
    pub fn column_major(ld: usize) -> Self {
        Self { row: 1, col: ld }
    }
}

/// Storage of a GEMM operand whose logical shape after `op` is `rows × cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandLayout {
    pub ld: usize,
    pub size: usize,
    pub strides: Strides,
}

impl OperandLayout {
    pub fn new(op: Operation, rows: usize, cols: usize) -> Self {
        match op {
            Operation::None => {
                let ld = rows.max(1);
                Self { ld, size: cols * ld, strides: Strides { row: 1, col: ld } }
            }
            Operation::Transpose | Operation::ConjugateTranspose => {
                let ld = cols.max(1);
                Self { ld, size: rows * ld, strides: Strides { row: ld, col: 1 } }
            }
        }
    }
}

// ── matrix setup ─────────────────────────────────────────────────────

/// Write the `m × n` identity into `a`.
pub fn mat_identity<T: Zero + One>(a: &mut [T], m: usize, n: usize, lda: usize) {
    for j in 0..n {
        for i in 0..m {
            a[i + j * lda] = if i == j { T::one() } else { T::zero() };
        }
    }
}

/// Zero the triangle of an `n × n` matrix that `uplo` does not reference.
pub fn make_matrix_upper_or_lower<T: Zero>(uplo: Fill, a: &mut [T], n: usize, lda: usize) {
    for j in 0..n {
        for i in 0..n {
            let outside = match uplo {
                Fill::Upper => i > j,
                Fill::Lower => i < j,
                Fill::Full => false,
            };
            if outside {
                a[i + j * lda] = T::zero();
            }
        }
    }
}

// ── Level 3 ──────────────────────────────────────────────────────────

/// `C = alpha * A * B + beta * C` with `A` `m × k` and `B` `k × n`,
/// both addressed through arbitrary row/column strides.
#[allow(clippy::too_many_arguments)]
pub fn mat_mat_mult<T: Num + Copy>(
    alpha: T,
    beta: T,
    m: usize,
    n: usize,
    k: usize,
    a: &[T],
    sa: Strides,
    b: &[T],
    sb: Strides,
    c: &mut [T],
    sc: Strides,
) {
    for i in 0..m {
        for j in 0..n {
            let mut t = T::zero();
            for l in 0..k {
                t = t + a[i * sa.row + l * sa.col] * b[l * sb.row + j * sb.col];
            }
            let idx = i * sc.row + j * sc.col;
            c[idx] = beta * c[idx] + alpha * t;
        }
    }
}

/// `D = alpha * A * B + beta * C` computed in `T`, with inputs `U`
/// widened to `T` and the result narrowed to `V`.
#[allow(clippy::too_many_arguments)]
pub fn mat_mat_mult_mixed<T, U, V>(
    alpha: T,
    beta: T,
    m: usize,
    n: usize,
    k: usize,
    a: &[U],
    sa: Strides,
    b: &[U],
    sb: Strides,
    c: &[V],
    sc: Strides,
    d: &mut [V],
    sd: Strides,
) where
    T: Num + Copy + AsPrimitive<V>,
    U: AsPrimitive<T>,
    V: AsPrimitive<T>,
{
    for i in 0..m {
        for j in 0..n {
            let mut t = T::zero();
            for l in 0..k {
                t = t + a[i * sa.row + l * sa.col].as_() * b[l * sb.row + j * sb.col].as_();
            }
            let ci: T = c[i * sc.row + j * sc.col].as_();
            d[i * sd.row + j * sd.col] = (beta * ci + alpha * t).as_();
        }
    }
}

/// `C = alpha * op(A) + beta * op(B)`, all `m × n` after the operation.
#[allow(clippy::too_many_arguments)]
pub fn geam<T: Num + Copy>(
    trans_a: Operation,
    trans_b: Operation,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    beta: T,
    b: &[T],
    ldb: usize,
    c: &mut [T],
    ldc: usize,
) {
    let at = |op: Operation, buf: &[T], ld: usize, i: usize, j: usize| match op {
        Operation::None => buf[i + j * ld],
        _ => buf[j + i * ld],
    };
    for j in 0..n {
        for i in 0..m {
            c[i + j * ldc] = alpha * at(trans_a, a, lda, i, j) + beta * at(trans_b, b, ldb, i, j);
        }
    }
}

// ── Level 1 ──────────────────────────────────────────────────────────

/// `y = alpha * x + y`.
pub fn axpy<T: Num + Copy>(n: usize, alpha: T, x: &[T], incx: i32, y: &mut [T], incy: i32) {
    for i in 0..n {
        let yi = strided_index(i, n, incy);
        y[yi] = alpha * x[strided_index(i, n, incx)] + y[yi];
    }
}

/// `Σ x_i * y_i`, accumulated in `f64`.
pub fn dot<T: ToPrimitive + Copy>(n: usize, x: &[T], incx: i32, y: &[T], incy: i32) -> f64 {
    (0..n)
        .map(|i| {
            let xi = x[strided_index(i, n, incx)].to_f64().unwrap_or(f64::NAN);
            let yi = y[strided_index(i, n, incy)].to_f64().unwrap_or(f64::NAN);
            xi * yi
        })
        .sum()
}

/// Euclidean norm, accumulated in `f64`. Zero when `n == 0` or `inc <= 0`.
pub fn nrm2<T: ToPrimitive + Copy>(n: usize, x: &[T], inc: i32) -> f64 {
    if inc <= 0 {
        return 0.0;
    }
    (0..n)
        .map(|i| x[strided_index(i, n, inc)].to_f64().unwrap_or(f64::NAN).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// `x = alpha * x`. A no-op when `inc <= 0`.
pub fn scal<T: Num + Copy>(n: usize, alpha: T, x: &mut [T], inc: i32) {
    if inc <= 0 {
        return;
    }
    for i in 0..n {
        let xi = strided_index(i, n, inc);
        x[xi] = alpha * x[xi];
    }
}

/// Exchange the logical elements of `x` and `y`.
pub fn swap<T>(n: usize, x: &mut [T], incx: i32, y: &mut [T], incy: i32) {
    for i in 0..n {
        std::mem::swap(&mut x[strided_index(i, n, incx)], &mut y[strided_index(i, n, incy)]);
    }
}

// ── Level 2 ──────────────────────────────────────────────────────────

/// `y = alpha * op(A) * x + beta * y` with `A` stored `m × n`.
#[allow(clippy::too_many_arguments)]
pub fn gemv<T: Num + Copy>(
    trans: Operation,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    x: &[T],
    incx: i32,
    beta: T,
    y: &mut [T],
    incy: i32,
) {
    let (rows, cols) = match trans {
        Operation::None => (m, n),
        _ => (n, m),
    };
    for r in 0..rows {
        let mut t = T::zero();
        for c in 0..cols {
            let aij = match trans {
                Operation::None => a[r + c * lda],
                _ => a[c + r * lda],
            };
            t = t + aij * x[strided_index(c, cols, incx)];
        }
        let yi = strided_index(r, rows, incy);
        y[yi] = alpha * t + beta * y[yi];
    }
}

/// Symmetric `y = alpha * A * x + beta * y`, reading only the `uplo` triangle.
#[allow(clippy::too_many_arguments)]
pub fn symv<T: Num + Copy>(
    uplo: Fill,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    x: &[T],
    incx: i32,
    beta: T,
    y: &mut [T],
    incy: i32,
) {
    for i in 0..n {
        let mut t = T::zero();
        for j in 0..n {
            let stored = match uplo {
                Fill::Upper => i <= j,
                Fill::Lower => i >= j,
                Fill::Full => true,
            };
            let aij = if stored { a[i + j * lda] } else { a[j + i * lda] };
            t = t + aij * x[strided_index(j, n, incx)];
        }
        let yi = strided_index(i, n, incy);
        y[yi] = alpha * t + beta * y[yi];
    }
}

/// Hermitian rank-1 update `A = alpha * x * x^H + A` on the `uplo` triangle.
/// Diagonal imaginary parts are set to zero.
#[allow(clippy::too_many_arguments)]
pub fn her<F: Float>(
    uplo: Fill,
    n: usize,
    alpha: F,
    x: &[Complex<F>],
    incx: i32,
    a: &mut [Complex<F>],
    lda: usize,
) {
    for j in 0..n {
        let xj = x[strided_index(j, n, incx)].conj();
        for i in 0..n {
            let in_triangle = match uplo {
                Fill::Upper => i <= j,
                Fill::Lower => i >= j,
                Fill::Full => true,
            };
            if !in_triangle {
                continue;
            }
            let idx = i + j * lda;
            a[idx] = a[idx] + x[strided_index(i, n, incx)] * xj * alpha;
            if i == j {
                a[idx].im = F::zero();
            }
        }
    }
}

/// Triangular `x = op(A) * x` for an `n × n` matrix referenced through `uplo`.
#[allow(clippy::too_many_arguments)]
pub fn trmv<F: Float>(
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: usize,
    a: &[Complex<F>],
    lda: usize,
    x: &mut [Complex<F>],
    incx: i32,
) {
    let element = |i: usize, j: usize| -> Complex<F> {
        if i == j && diag == Diagonal::Unit {
            return Complex::one();
        }
        let stored = match uplo {
            Fill::Upper => i <= j,
            Fill::Lower => i >= j,
            Fill::Full => true,
        };
        if stored { a[i + j * lda] } else { Complex::zero() }
    };
    let input: Vec<Complex<F>> = (0..n).map(|i| x[strided_index(i, n, incx)]).collect();
    for i in 0..n {
        let mut t = Complex::zero();
        for (j, &xj) in input.iter().enumerate() {
            let aij = match trans {
                Operation::None => element(i, j),
                Operation::Transpose => element(j, i),
                Operation::ConjugateTranspose => element(j, i).conj(),
            };
            t = t + aij * xj;
        }
        x[strided_index(i, n, incx)] = t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_increment_walks_backwards() {
        assert_eq!(strided_index(0, 4, -2), 6);
        assert_eq!(strided_index(3, 4, -2), 0);
        assert_eq!(strided_index(3, 4, 2), 6);
        assert_eq!(vector_extent(0, 1), 1);
        assert_eq!(vector_extent(5, -3), 15);
    }

    #[test]
    fn operand_layout_matches_operation() {
        let a = OperandLayout::new(Operation::Transpose, 200, 60);
        assert_eq!((a.ld, a.size), (60, 12_000));
        assert_eq!(a.strides, Strides { row: 60, col: 1 });
        let b = OperandLayout::new(Operation::None, 60, 200);
        assert_eq!((b.ld, b.size), (60, 12_000));
        assert_eq!(b.strides, Strides::column_major(60));
    }

    #[test]
    fn gemm_with_identity_b_scales_a() {
        let (m, n, k) = (2, 2, 2);
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let mut b = [0.0f32; 4];
        mat_identity(&mut b, k, n, k);
        let mut c = [1.0f32; 4];
        let s = Strides::column_major(2);
        mat_mat_mult(2.0, 1.0, m, n, k, &a, s, &b, s, &mut c, s);
        assert_eq!(c, [3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn mixed_gemm_widens_i8_into_i32() {
        let a = [100i8, 100];
        let b = [100i8, 100];
        let c = [1i32];
        let mut d = [0i32];
        // 1x1 result, k = 2: 2 * (100*100 + 100*100) + 3 * 1
        mat_mat_mult_mixed(
            2i32,
            3i32,
            1,
            1,
            2,
            &a,
            Strides { row: 1, col: 1 },
            &b,
            Strides { row: 1, col: 1 },
            &c,
            Strides::column_major(1),
            &mut d,
            Strides::column_major(1),
        );
        assert_eq!(d, [40_003]);
    }

    #[test]
    fn level1_routines_follow_increments() {
        let x = [1.0f32, 0.0, 2.0, 0.0, 3.0];
        let mut y = [1.0f32, 1.0, 1.0];
        axpy(3, 2.0, &x, 2, &mut y, 1);
        assert_eq!(y, [3.0, 5.0, 7.0]);

        // y reversed: logical y = [7, 5, 3]
        assert_eq!(dot(3, &x, 2, &y, -1), 1.0 * 7.0 + 2.0 * 5.0 + 3.0 * 3.0);
        assert_eq!(nrm2(2, &[3.0f64, 4.0], 1), 5.0);
        assert_eq!(nrm2(2, &[3.0f64, 4.0], 0), 0.0);

        let mut s = [1.0f64, 2.0, 3.0];
        scal(3, 2.0, &mut s, 1);
        assert_eq!(s, [2.0, 4.0, 6.0]);
        scal(3, 2.0, &mut s, -1);
        assert_eq!(s, [2.0, 4.0, 6.0]);

        let mut p = [1, 2, 3];
        let mut q = [4, 5, 6];
        swap(3, &mut p, 1, &mut q, -1);
        assert_eq!(p, [6, 5, 4]);
        assert_eq!(q, [3, 2, 1]);
    }

    #[test]
    fn gemv_transpose_uses_columns() {
        // A = [[1, 3], [2, 4]] column-major
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let x = [1.0f32, 1.0];
        let mut y = [0.0f32; 2];
        gemv(Operation::None, 2, 2, 1.0, &a, 2, &x, 1, 0.0, &mut y, 1);
        assert_eq!(y, [4.0, 6.0]);
        gemv(Operation::Transpose, 2, 2, 1.0, &a, 2, &x, 1, 0.0, &mut y, 1);
        assert_eq!(y, [3.0, 7.0]);
    }

    #[test]
    fn symv_mirrors_the_stored_triangle() {
        // upper holds 1 2 / . 3; lower garbage ignored
        let a = [1.0f32, 99.0, 2.0, 3.0];
        let x = [1.0f32, 1.0];
        let mut y = [1.0f32, 1.0];
        symv(Fill::Upper, 2, 1.0, &a, 2, &x, 1, 1.0, &mut y, 1);
        assert_eq!(y, [4.0, 6.0]);
    }

    #[test]
    fn her_updates_only_the_requested_triangle() {
        let x = [Complex::new(1.0f32, 1.0), Complex::new(2.0, 0.0)];
        let mut a = [Complex::new(0.0f32, 0.0); 4];
        mat_identity(&mut a, 2, 2, 2);
        her(Fill::Upper, 2, 1.0, &x, 1, &mut a, 2);
        assert_eq!(a[0], Complex::new(3.0, 0.0));
        // row 0, col 1: x0 * conj(x1)
        assert_eq!(a[2], Complex::new(2.0, 2.0));
        assert_eq!(a[1], Complex::new(0.0, 0.0));
        assert_eq!(a[3], Complex::new(5.0, 0.0));
    }

    #[test]
    fn trmv_lower_matches_dense_product() {
        let mut a = [
            Complex::new(1.0f64, 0.0),
            Complex::new(2.0, 1.0),
            Complex::new(50.0, 50.0),
            Complex::new(3.0, 0.0),
        ];
        make_matrix_upper_or_lower(Fill::Lower, &mut a, 2, 2);
        assert_eq!(a[2], Complex::zero());
        let mut x = [Complex::new(1.0, 0.0), Complex::new(0.0, 1.0)];
        trmv(Fill::Lower, Operation::None, Diagonal::NonUnit, 2, &a, 2, &mut x, 1);
        assert_eq!(x[0], Complex::new(1.0, 0.0));
        assert_eq!(x[1], Complex::new(2.0, 4.0));

        let mut u = [Complex::new(1.0, 0.0), Complex::new(0.0, 1.0)];
        trmv(Fill::Lower, Operation::None, Diagonal::Unit, 2, &a, 2, &mut u, 1);
        assert_eq!(u[1], Complex::new(2.0, 2.0));
    }

    #[test]
    fn geam_combines_with_transpose() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [1.0f64, 1.0, 1.0, 1.0];
        let mut c = [0.0f64; 4];
        geam(Operation::Transpose, Operation::None, 2, 2, 1.0, &a, 2, 2.0, &b, 2, &mut c, 2);
        assert_eq!(c, [3.0, 5.0, 4.0, 6.0]);
    }
}
