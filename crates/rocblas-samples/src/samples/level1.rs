//! Level-1 vector samples.

use anyhow::Result;
use rocblas_samples_common::fill::fill_normal;
use rocblas_samples_common::reference::{self, strided_index, vector_extent};
use rocblas_samples_common::verify::{count_mismatches, max_relative_error};
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{DeviceVector, Handle, PointerMode, get_vector, set_vector};

use super::{NON_POSITIVE_N, Outcome, Sample};
use crate::context::SampleContext;

fn stride(inc: i32) -> usize {
    inc.unsigned_abs() as usize
}

// ── axpy ─────────────────────────────────────────────────────────────

pub struct Axpy;

impl Sample for Axpy {
    fn name(&self) -> &'static str {
        "axpy"
    }

    fn about(&self) -> &'static str {
        "y = alpha * x + y in single precision (rocblas_saxpy)"
    }

    fn letters(&self) -> &'static str {
        "axyn"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (n, incx, incy, alpha) = (args.vector_len, args.incx, args.incy, args.alpha);
        if n <= 0 {
            return Ok(Outcome::Skipped(NON_POSITIVE_N));
        }
        let len = n as usize;

        let mut hx = vec![0.0f32; vector_extent(len, incx)];
        let mut hy = vec![0.0f32; vector_extent(len, incy)];
        fill_normal(ctx.rng(), &mut hx, 1);
        fill_normal(ctx.rng(), &mut hy, 1);
        ctx.show_vector("Input Vectors (X)", &hx, 0, 1);
        ctx.show_vector("Input Vectors (Y)", &hy, 0, 1);

        let mut gold = hy.clone();
        reference::axpy(len, alpha, &hx, incx, &mut gold, incy);

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut dx: DeviceVector<f32> = DeviceVector::new(&runtime, hx.len())?;
        let mut dy: DeviceVector<f32> = DeviceVector::new(&runtime, hy.len())?;
        dx.copy_from_host(&hx)?;
        dy.copy_from_host(&hy)?;
        handle.saxpy(n, alpha, &dx.as_slice(), incx, &mut dy.as_slice_mut(), incy)?;
        dy.copy_to_host(&mut hy)?;
        dx.release()?;
        dy.release()?;

        ctx.show_vector("Output Vector Y", &hy, 0, 1);
        ctx.show_vector("Output Vector YGold", &gold, 0, 1);

        let error = max_relative_error(&hy, &gold);
        Ok(Outcome::Verdict(Verdict::relative(error, f32::EPSILON as f64, ctx.tolerance())))
    }
}

// ── dot ──────────────────────────────────────────────────────────────

pub struct Dot;

impl Sample for Dot {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn about(&self) -> &'static str {
        "Single-precision dot product (rocblas_sdot)"
    }

    fn letters(&self) -> &'static str {
        "xyn"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (n, incx, incy) = (args.vector_len, args.incx, args.incy);
        if n <= 0 {
            return Ok(Outcome::Skipped(NON_POSITIVE_N));
        }
        let len = n as usize;

        let mut hx = vec![0.0f32; vector_extent(len, incx)];
        let mut hy = vec![0.0f32; vector_extent(len, incy)];
        fill_normal(ctx.rng(), &mut hx, 1);
        fill_normal(ctx.rng(), &mut hy, 1);
        ctx.show_vector("Input Vectors (X)", &hx, 0, 1);
        ctx.show_vector("Input Vectors (Y)", &hy, 0, 1);

        let gold = reference::dot(len, &hx, incx, &hy, incy);
        // error bound: n * eps * tol * sum(|x_i * y_i|)
        let magnitude: f64 = (0..len)
            .map(|i| {
                let xi = hx[strided_index(i, len, incx)] as f64;
                let yi = hy[strided_index(i, len, incy)] as f64;
                (xi * yi).abs()
            })
            .sum();

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut dx: DeviceVector<f32> = DeviceVector::new(&runtime, hx.len())?;
        let mut dy: DeviceVector<f32> = DeviceVector::new(&runtime, hy.len())?;
        dx.copy_from_host(&hx)?;
        dy.copy_from_host(&hy)?;
        let result = handle.sdot(n, &dx.as_slice(), incx, &dy.as_slice(), incy)?;
        runtime.device_synchronize()?;
        dx.release()?;
        dy.release()?;

        ctx.say(format!("Output result\n{result}"));
        ctx.say(format!("Output Goldstandard result\n{gold}"));

        let threshold = f32::EPSILON as f64 * ctx.tolerance() * len as f64 * magnitude;
        Ok(Outcome::Verdict(Verdict::absolute((gold - result as f64).abs(), threshold)))
    }
}

// ── nrm2 ─────────────────────────────────────────────────────────────

pub struct Nrm2;

impl Sample for Nrm2 {
    fn name(&self) -> &'static str {
        "nrm2"
    }

    fn about(&self) -> &'static str {
        "Single-precision Euclidean norm (rocblas_snrm2)"
    }

    fn letters(&self) -> &'static str {
        "xn"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (n, incx) = (args.vector_len, args.incx);
        if n <= 0 {
            return Ok(Outcome::Skipped(NON_POSITIVE_N));
        }
        let len = n as usize;

        let mut hx = vec![0.0f32; vector_extent(len, incx)];
        fill_normal(ctx.rng(), &mut hx, 1);
        ctx.show_vector("Input Vectors (X)", &hx, 0, 1);

        let gold = reference::nrm2(len, &hx, incx);

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut dx: DeviceVector<f32> = DeviceVector::new(&runtime, hx.len())?;
        dx.copy_from_host(&hx)?;
        let result = handle.snrm2(n, &dx.as_slice(), incx)?;
        runtime.device_synchronize()?;
        dx.release()?;

        ctx.say(format!("Output result\n{result}"));
        ctx.say(format!("Output Goldstandard result\n{gold}"));

        // The sum of squares picks up one rounding per element.
        let error = max_relative_error(&[result as f64], &[gold]);
        let epsilon = f32::EPSILON as f64 * len as f64;
        Ok(Outcome::Verdict(Verdict::relative(error, epsilon, ctx.tolerance())))
    }
}

// ── scal ─────────────────────────────────────────────────────────────

pub struct Scal;

impl Sample for Scal {
    fn name(&self) -> &'static str {
        "scal"
    }

    fn about(&self) -> &'static str {
        "x = alpha * x in double precision (rocblas_dscal)"
    }

    fn letters(&self) -> &'static str {
        "nax"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (n, incx) = (args.vector_len, args.incx);
        if n <= 0 {
            return Ok(Outcome::Skipped(NON_POSITIVE_N));
        }
        let len = n as usize;
        let alpha = f64::from(args.alpha);

        let mut hx = vec![0.0f64; vector_extent(len, incx)];
        fill_normal(ctx.rng(), &mut hx, 1);
        ctx.show_vector("Input Vector", &hx, 0, 1);

        let mut gold = hx.clone();
        reference::scal(len, alpha, &mut gold, incx);

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut dx: DeviceVector<f64> = DeviceVector::new(&runtime, hx.len())?;
        dx.copy_from_host(&hx)?;
        handle.dscal(n, alpha, &mut dx.as_slice_mut(), incx)?;
        dx.copy_to_host(&mut hx)?;
        dx.release()?;

        ctx.show_vector(&format!("Output Vector, alpha = {alpha}"), &hx, 0, 1);

        let error = max_relative_error(&hx, &gold);
        Ok(Outcome::Verdict(Verdict::relative(error, f64::EPSILON, ctx.tolerance())))
    }
}

// ── swap ─────────────────────────────────────────────────────────────

pub struct Swap;

impl Sample for Swap {
    fn name(&self) -> &'static str {
        "swap"
    }

    fn about(&self) -> &'static str {
        "Exchange two single-precision vectors (rocblas_sswap) with strided set/get"
    }

    fn letters(&self) -> &'static str {
        "nxy"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (n, incx, incy) = (args.vector_len, args.incx, args.incy);
        if n <= 0 {
            return Ok(Outcome::Skipped(NON_POSITIVE_N));
        }
        let len = n as usize;
        // set/get_vector need positive increments; they touch the same
        // storage slots as a negative increment does.
        let (copy_x, copy_y) = (incx.abs().max(1), incy.abs().max(1));

        let mut hx = vec![0.0f32; vector_extent(len, incx)];
        let mut hy = vec![0.0f32; vector_extent(len, incy)];
        fill_normal(ctx.rng(), &mut hx, stride(incx));
        fill_normal(ctx.rng(), &mut hy, stride(incy));
        ctx.show_vector("Input Vector (X)", &hx, len * stride(incx), stride(incx));
        ctx.show_vector("Input Vector (Y)", &hy, len * stride(incy), stride(incy));

        let (mut gold_x, mut gold_y) = (hx.clone(), hy.clone());
        reference::swap(len, &mut gold_x, incx, &mut gold_y, incy);

        let runtime = ctx.runtime()?;
        let handle = Handle::new(&runtime)?;

        let mut dx: DeviceVector<f32> = DeviceVector::new(&runtime, hx.len())?;
        let mut dy: DeviceVector<f32> = DeviceVector::new(&runtime, hy.len())?;
        set_vector(&runtime, n, &hx, copy_x, &mut dx.as_slice_mut(), copy_x)?;
        set_vector(&runtime, n, &hy, copy_y, &mut dy.as_slice_mut(), copy_y)?;
        handle.sswap(n, &mut dx.as_slice_mut(), incx, &mut dy.as_slice_mut(), incy)?;
        get_vector(&runtime, n, &dx.as_slice(), copy_x, &mut hx, copy_x)?;
        get_vector(&runtime, n, &dy.as_slice(), copy_y, &mut hy, copy_y)?;
        dx.release()?;
        dy.release()?;

        ctx.show_vector("Output Vector (X)", &hx, len * stride(incx), stride(incx));
        ctx.show_vector("Output Vector (Y)", &hy, len * stride(incy), stride(incy));

        let mismatches = count_mismatches(&hx, &gold_x) + count_mismatches(&hy, &gold_y);
        Ok(Outcome::Verdict(Verdict::exact(mismatches)))
    }
}
