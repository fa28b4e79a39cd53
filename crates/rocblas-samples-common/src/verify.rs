//! Error metrics and pass/fail verdicts.

use crate::reference::strided_index;
use console::style;
use num_complex::Complex;
use num_traits::{Float, ToPrimitive};
use std::fmt;

/// Multiple of machine epsilon a result may deviate by.
pub const DEFAULT_TOLERANCE: f64 = 10.0;

fn relative(actual: f64, gold: f64) -> f64 {
    if gold != 0.0 { ((gold - actual) / gold).abs() } else { actual.abs() }
}

/// Running maximum that keeps a NaN once one is seen; `f64::max` would drop it.
fn worst(acc: f64, err: f64) -> f64 {
    if acc.is_nan() || err.is_nan() { f64::NAN } else { acc.max(err) }
}

/// Largest `|gold - actual| / |gold|` over paired elements, using `|actual|`
/// where `gold` is zero. Zero for empty input.
pub fn max_relative_error<T: ToPrimitive + Copy>(actual: &[T], gold: &[T]) -> f64 {
    actual
        .iter()
        .zip(gold)
        .map(|(a, g)| relative(a.to_f64().unwrap_or(f64::NAN), g.to_f64().unwrap_or(f64::NAN)))
        .fold(0.0, worst)
}

/// Largest `|gold - actual|` over paired elements.
pub fn max_error<T: ToPrimitive + Copy>(actual: &[T], gold: &[T]) -> f64 {
    actual
        .iter()
        .zip(gold)
        .map(|(a, g)| {
            (g.to_f64().unwrap_or(f64::NAN) - a.to_f64().unwrap_or(f64::NAN)).abs()
        })
        .fold(0.0, worst)
}

/// Number of paired elements that differ.
pub fn count_mismatches<T: PartialEq>(actual: &[T], gold: &[T]) -> usize {
    actual.iter().zip(gold).filter(|(a, g)| a != g).count()
}

/// Relative error over the logical elements of two strided complex vectors,
/// measured with the complex modulus.
pub fn max_relative_error_complex<F: Float>(
    actual: &[Complex<F>],
    gold: &[Complex<F>],
    n: usize,
    inc: i32,
) -> f64 {
    (0..n)
        .map(|i| {
            let idx = strided_index(i, n, inc);
            let a = actual[idx];
            let g = gold[idx];
            let denom = g.norm().to_f64().unwrap_or(f64::NAN);
            let a_norm = a.norm().to_f64().unwrap_or(f64::NAN);
            let diff = (g - a).norm().to_f64().unwrap_or(f64::NAN);
            if denom != 0.0 { diff / denom } else { a_norm }
        })
        .fold(0.0, worst)
}

/// Relative error over `batch_count` column-major `m × n` matrices
/// `stride` elements apart.
#[allow(clippy::too_many_arguments)]
pub fn mat_max_relative_error<T: ToPrimitive + Copy>(
    actual: &[T],
    gold: &[T],
    m: usize,
    n: usize,
    lda: usize,
    stride: usize,
    batch_count: usize,
) -> f64 {
    let mut err = 0.0f64;
    for batch in 0..batch_count {
        for j in 0..n {
            for i in 0..m {
                let idx = i + j * lda + batch * stride;
                let a = actual[idx].to_f64().unwrap_or(f64::NAN);
                let g = gold[idx].to_f64().unwrap_or(f64::NAN);
                err = worst(err, relative(a, g));
            }
        }
    }
    err
}

/// How a [`Verdict`]'s error was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Relative,
    Absolute,
    /// Element-wise equality; the error is the mismatch count.
    Exact,
}

/// Outcome of comparing a device result against the CPU reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub error: f64,
    pub threshold: f64,
    pub metric: Metric,
}

impl Verdict {
    /// Pass when `error <= tolerance * epsilon`.
    pub fn relative(error: f64, epsilon: f64, tolerance: f64) -> Self {
        Self { error, threshold: epsilon * tolerance, metric: Metric::Relative }
    }

    /// Pass when `error <= threshold`.
    pub fn absolute(error: f64, threshold: f64) -> Self {
        Self { error, threshold, metric: Metric::Absolute }
    }

    /// Pass when nothing mismatched.
    pub fn exact(mismatches: usize) -> Self {
        Self { error: mismatches as f64, threshold: 0.0, metric: Metric::Exact }
    }

    pub fn passed(&self) -> bool {
        // NaN never passes
        self.error <= self.threshold
    }

    pub fn label(&self) -> &'static str {
        if self.passed() { "PASS" } else { "FAIL" }
    }

    /// The verdict line with a coloured label, for terminals.
    pub fn styled(&self) -> String {
        let label = if self.passed() {
            style(self.label()).green().bold()
        } else {
            style(self.label()).red().bold()
        };
        self.render(&label.to_string())
    }

    fn render(&self, label: &str) -> String {
        match self.metric {
            Metric::Relative => format!("{label}: max. relative err. = {}", self.error),
            Metric::Absolute => {
                format!("{label}: max. err. = {} (threshold {})", self.error, self.threshold)
            }
            Metric::Exact => format!("{label}: mismatched elements = {}", self.error),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_error_uses_absolute_value_at_zero_gold() {
        let gold = [2.0f32, 0.0, -4.0];
        let actual = [2.2f32, 0.05, -4.0];
        let err = max_relative_error(&actual, &gold);
        assert!((err - 0.1).abs() < 1e-6, "err = {err}");
        assert_eq!(max_relative_error::<f32>(&[], &[]), 0.0);
    }

    #[test]
    fn identical_integer_buffers_have_zero_error() {
        let a = [1i32, -7, 300];
        assert_eq!(max_relative_error(&a, &a), 0.0);
        assert_eq!(max_error(&a, &a), 0.0);
        assert_eq!(max_error(&[1i32, 5], &[1, 2]), 3.0);
        assert_eq!(count_mismatches(&[1i32, 5, 7], &[1, 2, 8]), 2);
    }

    #[test]
    fn complex_error_walks_the_stride() {
        let gold = [Complex::new(3.0f32, 4.0), Complex::new(99.0, 0.0), Complex::new(1.0, 0.0)];
        let actual = [Complex::new(3.0f32, 4.5), Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)];
        let err = max_relative_error_complex(&actual, &gold, 2, 2);
        assert!((err - 0.1).abs() < 1e-6, "err = {err}");
    }

    #[test]
    fn batched_matrix_error_skips_padding() {
        // 1x1 matrices with lda 2: index 1 is padding
        let gold = [1.0f64, 5.0, 2.0];
        let actual = [1.0f64, -5.0, 2.0];
        assert_eq!(mat_max_relative_error(&actual, &gold, 1, 1, 2, 2, 2), 0.0);
    }

    #[test]
    fn nan_in_the_result_fails_every_metric() {
        let gold = [1.0f32, 2.0, 3.0];
        let actual = [1.0f32, f32::NAN, 3.0];

        let rel = max_relative_error(&actual, &gold);
        assert!(rel.is_nan(), "relative err = {rel}");
        let verdict = Verdict::relative(rel, f32::EPSILON as f64, DEFAULT_TOLERANCE);
        assert_eq!(verdict.label(), "FAIL");
        assert_eq!(verdict.to_string(), "FAIL: max. relative err. = NaN");

        let abs = max_error(&actual, &gold);
        assert!(abs.is_nan(), "abs err = {abs}");
        assert_eq!(Verdict::absolute(abs, 1e-3).label(), "FAIL");

        let mat = mat_max_relative_error(&actual, &gold, 3, 1, 3, 3, 1);
        assert!(mat.is_nan(), "mat err = {mat}");
        assert_eq!(Verdict::relative(mat, f32::EPSILON as f64, DEFAULT_TOLERANCE).label(), "FAIL");

        let cgold = [Complex::new(1.0f32, 0.0), Complex::new(2.0, 1.0)];
        let cactual = [Complex::new(1.0f32, 0.0), Complex::new(f32::NAN, 1.0)];
        let complex = max_relative_error_complex(&cactual, &cgold, 2, 1);
        assert!(complex.is_nan(), "complex err = {complex}");
        assert_eq!(Verdict::relative(complex, f32::EPSILON as f64, 10.0).label(), "FAIL");
    }

    #[test]
    fn nan_before_a_finite_error_is_kept() {
        let gold = [1.0f64, 1.0, 1.0];
        let actual = [f64::NAN, 5.0, 1.0];
        assert!(max_relative_error(&actual, &gold).is_nan());
        assert!(max_error(&actual, &gold).is_nan());
    }

    #[test]
    fn infinite_result_fails() {
        let gold = [1.0f32, 2.0];
        let actual = [1.0f32, f32::INFINITY];
        let rel = max_relative_error(&actual, &gold);
        assert_eq!(rel, f64::INFINITY);
        assert_eq!(Verdict::relative(rel, f32::EPSILON as f64, DEFAULT_TOLERANCE).label(), "FAIL");
        let abs = max_error(&[f32::NEG_INFINITY], &[0.0]);
        assert_eq!(Verdict::absolute(abs, 1e6).label(), "FAIL");
    }

    #[test]
    fn out_of_tolerance_results_fail() {
        let eps = f32::EPSILON as f64;
        let gold = [1.0f32, 4.0];
        let actual = [1.0f32, 4.0 + 1e-3];
        let rel = max_relative_error(&actual, &gold);
        let verdict = Verdict::relative(rel, eps, DEFAULT_TOLERANCE);
        assert!(rel > eps * DEFAULT_TOLERANCE);
        assert_eq!(verdict.label(), "FAIL");

        // within tolerance on the boundary
        assert_eq!(Verdict::relative(eps * DEFAULT_TOLERANCE, eps, DEFAULT_TOLERANCE).label(), "PASS");

        let abs = max_error(&[0.0f64, 2.5], &[0.0, 2.0]);
        assert_eq!(Verdict::absolute(abs, 0.25).label(), "FAIL");
        assert_eq!(Verdict::absolute(abs, 0.5).label(), "PASS");

        let mismatches = count_mismatches(&[1i32, 2, 3], &[1, 2, 4]);
        let exact = Verdict::exact(mismatches);
        assert_eq!(exact.label(), "FAIL");
        assert_eq!(exact.to_string(), "FAIL: mismatched elements = 1");
    }

    #[test]
    fn verdict_formats_like_the_samples() {
        let pass = Verdict::relative(0.0, f32::EPSILON as f64, DEFAULT_TOLERANCE);
        assert!(pass.passed());
        assert_eq!(pass.to_string(), "PASS: max. relative err. = 0");

        let fail = Verdict::relative(1.0, f32::EPSILON as f64, DEFAULT_TOLERANCE);
        assert_eq!(fail.to_string(), "FAIL: max. relative err. = 1");

        assert!(!Verdict::relative(f64::NAN, 1.0, 10.0).passed());
        assert!(Verdict::exact(0).passed());
        assert!(!Verdict::exact(2).passed());
        assert!(Verdict::absolute(0.5, 0.5).passed());
    }
}
