//! Level-2 matrix-vector samples.

use anyhow::Result;
use num_complex::Complex32;
use rocblas_samples_common::fill::{fill_normal, fill_uniform_int_complex, fill_uniform_real_complex};
use rocblas_samples_common::reference::{self, make_matrix_upper_or_lower, mat_identity, vector_extent};
use rocblas_samples_common::verify::{max_relative_error, max_relative_error_complex};
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{
    DeviceVector, Diagonal, Fill, GpuTimer, Handle, Operation, PointerMode,
};

use super::{Outcome, Sample, blas_int};
use crate::context::SampleContext;

// ── gemv ─────────────────────────────────────────────────────────────

pub struct Gemv;

impl Sample for Gemv {
    fn name(&self) -> &'static str {
        "gemv"
    }

    fn about(&self) -> &'static str {
        "y = alpha * A * x + beta * y with identity A (rocblas_sgemv)"
    }

    fn letters(&self) -> &'static str {
        "MNabxy"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let trans = Operation::None;
        let (m, n) = (args.m as usize, args.n as usize);
        let (incx, incy, alpha, beta) = (args.incx, args.incy, args.alpha, args.beta);
        let (dim_x, dim_y) = match trans {
            Operation::None => (n, m),
            _ => (m, n),
        };
        let lda = m.max(1);

        let mut ha = vec![0.0f32; lda * n];
        let mut hx = vec![0.0f32; vector_extent(dim_x, incx)];
        let mut hy = vec![1.0f32; vector_extent(dim_y, incy)];
        mat_identity(&mut ha, m, n, lda);
        fill_normal(ctx.rng(), &mut hx, 1);
        ctx.show_vector("Input Vectors (X)", &hx, 0, 1);

        let mut gold = hy.clone();
        reference::gemv(trans, m, n, alpha, &ha, lda, &hx, incx, beta, &mut gold, incy);

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut da: DeviceVector<f32> = DeviceVector::new(&runtime, ha.len())?;
        let mut dx: DeviceVector<f32> = DeviceVector::new(&runtime, hx.len())?;
        let mut dy: DeviceVector<f32> = DeviceVector::new(&runtime, hy.len())?;

        let mut timer = GpuTimer::new(&runtime)?;
        timer.start()?;
        da.copy_from_host(&ha)?;
        dx.copy_from_host(&hx)?;
        dy.copy_from_host(&hy)?;
        handle.sgemv(
            trans,
            args.m,
            args.n,
            alpha,
            &da.as_slice(),
            blas_int(lda)?,
            &dx.as_slice(),
            incx,
            beta,
            &mut dy.as_slice_mut(),
            incy,
        )?;
        dy.copy_to_host(&mut hy)?;
        timer.stop("gemv round trip")?;
        for buffer in [da, dx, dy] {
            buffer.release()?;
        }

        ctx.say(format!("M, N, lda = {m}, {n}, {lda}"));
        ctx.show_vector("Output Vector Y = alpha*Identity*X(random,...) + beta*Y(1,1,...)", &hy, 0, 1);

        let error = max_relative_error(&hy, &gold);
        Ok(Outcome::Verdict(Verdict::relative(error, f32::EPSILON as f64, ctx.tolerance())))
    }
}

// ── her ──────────────────────────────────────────────────────────────

pub struct Her;

impl Sample for Her {
    fn name(&self) -> &'static str {
        "her"
    }

    fn about(&self) -> &'static str {
        "Hermitian rank-1 update A = alpha * x * x^H + A (rocblas_cher)"
    }

    fn letters(&self) -> &'static str {
        "Nax"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let uplo = Fill::Upper;
        let (n, incx, alpha) = (args.n as usize, args.incx, args.alpha);
        let lda = n.max(1);

        let mut ha = vec![Complex32::new(0.0, 0.0); lda * n];
        let mut hx = vec![Complex32::new(0.0, 0.0); vector_extent(n, incx)];
        mat_identity(&mut ha, n, n, lda);
        // small integers keep every product exact in single precision
        fill_uniform_int_complex(ctx.rng(), &mut hx, 1, 3);
        ctx.show_vector("Input Vector (X)", &hx, 0, 1);

        let mut gold = ha.clone();
        reference::her(uplo, n, alpha, &hx, incx, &mut gold, lda);

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut da: DeviceVector<Complex32> = DeviceVector::new(&runtime, ha.len())?;
        let mut dx: DeviceVector<Complex32> = DeviceVector::new(&runtime, hx.len())?;
        da.copy_from_host(&ha)?;
        dx.copy_from_host(&hx)?;

        let mut timer = GpuTimer::new(&runtime)?;
        timer.start()?;
        handle.cher(uplo, args.n, alpha, &dx.as_slice(), incx, &mut da.as_slice_mut(), blas_int(lda)?)?;
        timer.stop("rocblas_cher")?;

        da.copy_to_host(&mut ha)?;
        da.release()?;
        dx.release()?;

        ctx.say(format!("alpha, N, lda = {alpha}, {n}, {lda}"));
        ctx.show_matrix("A", &ha, n, n, lda);

        let mut mismatches = 0;
        for j in 0..n {
            for i in 0..n {
                let in_triangle = match uplo {
                    Fill::Upper => i <= j,
                    _ => i >= j,
                };
                if in_triangle && ha[i + j * lda] != gold[i + j * lda] {
                    mismatches += 1;
                }
            }
        }
        Ok(Outcome::Verdict(Verdict::exact(mismatches)))
    }
}

// ── trmv ─────────────────────────────────────────────────────────────

pub struct Trmv;

impl Sample for Trmv {
    fn name(&self) -> &'static str {
        "trmv"
    }

    fn about(&self) -> &'static str {
        "Triangular x = A * x with lower, non-unit A (rocblas_ctrmv)"
    }

    fn letters(&self) -> &'static str {
        "Nx"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (uplo, trans, diag) = (Fill::Lower, Operation::None, Diagonal::NonUnit);
        let (n, incx) = (args.n as usize, args.incx);
        let lda = n.max(1);

        let mut ha = vec![Complex32::new(0.0, 0.0); lda * n];
        let mut hx = vec![Complex32::new(0.0, 0.0); vector_extent(n, incx)];
        fill_uniform_real_complex(ctx.rng(), &mut ha, 1, 100.0, 300.0)?;
        fill_uniform_real_complex(ctx.rng(), &mut hx, 1, 100.0, 300.0)?;
        make_matrix_upper_or_lower(uplo, &mut ha, n, lda);
        ctx.show_matrix("A", &ha, n, n, lda);

        let mut gold = hx.clone();
        reference::trmv(uplo, trans, diag, n, &ha, lda, &mut gold, incx);

        let runtime = ctx.runtime()?;
        let handle = Handle::new(&runtime)?;

        let mut da: DeviceVector<Complex32> = DeviceVector::new(&runtime, ha.len())?;
        let mut dx: DeviceVector<Complex32> = DeviceVector::new(&runtime, hx.len())?;
        da.copy_from_host(&ha)?;
        dx.copy_from_host(&hx)?;

        let mut timer = GpuTimer::new(&runtime)?;
        timer.start()?;
        handle.ctrmv(uplo, trans, diag, args.n, &da.as_slice(), blas_int(lda)?, &mut dx.as_slice_mut(), incx)?;
        timer.stop("rocblas_ctrmv")?;

        dx.copy_to_host(&mut hx)?;
        da.release()?;
        dx.release()?;

        ctx.say(format!("N, lda, incx = {n}, {lda}, {incx}"));
        ctx.show_vector("Output Vector (X)", &hx, 0, 1);

        // each output element sums up to n products
        let error = max_relative_error_complex(&hx, &gold, n, incx);
        let epsilon = f32::EPSILON as f64 * n.max(1) as f64;
        Ok(Outcome::Verdict(Verdict::relative(error, epsilon, ctx.tolerance())))
    }
}
