//! `rocblas_gemm_ex` samples: separate C and D outputs, mixed element types.

use anyhow::Result;
use rocblas_samples_common::fill::fill_uniform_int;
use rocblas_samples_common::reference::{Strides, mat_mat_mult_mixed};
use rocblas_samples_common::verify::mat_max_relative_error;
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{DeviceVector, GemmAlgo, GemmFlags, Handle, Operation, PointerMode};

use super::level3::GemmShape;
use super::{Outcome, Sample, blas_int};
use crate::context::SampleContext;

/// Integer draws from `[-3, 3]` keep every product exact.
const FILL_RANGE: i32 = 3;

// ── gemm-ex-f32 ──────────────────────────────────────────────────────

pub struct GemmExF32;

impl Sample for GemmExF32 {
    fn name(&self) -> &'static str {
        "gemm-ex-f32"
    }

    fn about(&self) -> &'static str {
        "D = alpha * A^T * B + beta * C in single precision (rocblas_gemm_ex)"
    }

    fn letters(&self) -> &'static str {
        "MNKab"
    }

    fn defaults(&self) -> SampleArgs {
        SampleArgs { m: 200, n: 60, k: 200, ..SampleArgs::default() }
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (trans_a, trans_b) = (Operation::Transpose, Operation::None);
        let shape = GemmShape::new(trans_a, trans_b, args.m as usize, args.n as usize, args.k as usize);
        let ldd = shape.ldc;
        let (alpha, beta) = (args.alpha, args.beta);

        let mut ha = vec![0.0f32; shape.a.size];
        let mut hb = vec![0.0f32; shape.b.size];
        let mut hc = vec![0.0f32; shape.size_c()];
        let mut hd = vec![0.0f32; shape.n * ldd];
        fill_uniform_int(ctx.rng(), &mut ha, 1, FILL_RANGE);
        fill_uniform_int(ctx.rng(), &mut hb, 1, FILL_RANGE);
        fill_uniform_int(ctx.rng(), &mut hc, 1, FILL_RANGE);
        fill_uniform_int(ctx.rng(), &mut hd, 1, FILL_RANGE);

        let mut gold = hd.clone();
        mat_mat_mult_mixed::<f32, f32, f32>(
            alpha,
            beta,
            shape.m,
            shape.n,
            shape.k,
            &ha,
            shape.a.strides,
            &hb,
            shape.b.strides,
            &hc,
            Strides::column_major(shape.ldc),
            &mut gold,
            Strides::column_major(ldd),
        );

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut da: DeviceVector<f32> = DeviceVector::new(&runtime, ha.len())?;
        let mut db: DeviceVector<f32> = DeviceVector::new(&runtime, hb.len())?;
        let mut dc: DeviceVector<f32> = DeviceVector::new(&runtime, hc.len())?;
        let mut dd: DeviceVector<f32> = DeviceVector::new(&runtime, hd.len())?;
        da.copy_from_host(&ha)?;
        db.copy_from_host(&hb)?;
        dc.copy_from_host(&hc)?;
        dd.copy_from_host(&hd)?;

        handle.gemm_ex::<f32, f32, f32>(
            trans_a,
            trans_b,
            args.m,
            args.n,
            args.k,
            alpha,
            &da.as_slice(),
            blas_int(shape.a.ld)?,
            &db.as_slice(),
            blas_int(shape.b.ld)?,
            beta,
            &dc.as_slice(),
            blas_int(shape.ldc)?,
            &mut dd.as_slice_mut(),
            blas_int(ldd)?,
            GemmAlgo::Standard,
            0,
            GemmFlags::NONE,
        )?;
        dd.copy_to_host(&mut hd)?;
        for buffer in [da, db, dc, dd] {
            buffer.release()?;
        }

        ctx.say(format!(
            "M, N, K, lda, ldb, ldc, ldd = {}, {}, {}, {}, {}, {}, {ldd}",
            shape.m, shape.n, shape.k, shape.a.ld, shape.b.ld, shape.ldc
        ));
        ctx.show_matrix("D", &hd, shape.m, shape.n, ldd);

        let error = mat_max_relative_error(&hd, &gold, shape.m, shape.n, ldd, 0, 1);
        Ok(Outcome::Verdict(Verdict::relative(error, f32::EPSILON as f64, ctx.tolerance())))
    }
}

// ── gemm-ex-i8-i32 ───────────────────────────────────────────────────

pub struct GemmExI8I32;

impl Sample for GemmExI8I32 {
    fn name(&self) -> &'static str {
        "gemm-ex-i8-i32"
    }

    fn about(&self) -> &'static str {
        "D = alpha * A * B^T + beta * C with int8 inputs and int32 accumulation (rocblas_gemm_ex)"
    }

    fn letters(&self) -> &'static str {
        "MNKab"
    }

    fn defaults(&self) -> SampleArgs {
        SampleArgs { m: 128, n: 128, k: 128, alpha: 2.0, beta: 3.0, ..SampleArgs::default() }
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (trans_a, trans_b) = (Operation::None, Operation::Transpose);
        let shape = GemmShape::new(trans_a, trans_b, args.m as usize, args.n as usize, args.k as usize);
        let ldd = shape.ldc;
        // integer compute type: fractional scalars truncate
        let (alpha, beta) = (args.alpha as i32, args.beta as i32);
        let flags = GemmFlags::NONE;

        let mut ha = vec![0i8; shape.a.size];
        let mut hb = vec![0i8; shape.b.size];
        let mut hc = vec![0i32; shape.size_c()];
        let mut hd = vec![0i32; shape.n * ldd];
        fill_uniform_int(ctx.rng(), &mut ha, 1, FILL_RANGE);
        fill_uniform_int(ctx.rng(), &mut hb, 1, FILL_RANGE);
        fill_uniform_int(ctx.rng(), &mut hc, 1, FILL_RANGE);
        fill_uniform_int(ctx.rng(), &mut hd, 1, FILL_RANGE);

        let mut gold = hd.clone();
        mat_mat_mult_mixed::<i32, i8, i32>(
            alpha,
            beta,
            shape.m,
            shape.n,
            shape.k,
            &ha,
            shape.a.strides,
            &hb,
            shape.b.strides,
            &hc,
            Strides::column_major(shape.ldc),
            &mut gold,
            Strides::column_major(ldd),
        );

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut da: DeviceVector<i8> = DeviceVector::new(&runtime, ha.len())?;
        let mut db: DeviceVector<i8> = DeviceVector::new(&runtime, hb.len())?;
        let mut dc: DeviceVector<i32> = DeviceVector::new(&runtime, hc.len())?;
        let mut dd: DeviceVector<i32> = DeviceVector::new(&runtime, hd.len())?;
        da.copy_from_host(&ha)?;
        db.copy_from_host(&hb)?;
        dc.copy_from_host(&hc)?;
        dd.copy_from_host(&hd)?;

        handle.gemm_ex::<i8, i32, i32>(
            trans_a,
            trans_b,
            args.m,
            args.n,
            args.k,
            alpha,
            &da.as_slice(),
            blas_int(shape.a.ld)?,
            &db.as_slice(),
            blas_int(shape.b.ld)?,
            beta,
            &dc.as_slice(),
            blas_int(shape.ldc)?,
            &mut dd.as_slice_mut(),
            blas_int(ldd)?,
            GemmAlgo::Standard,
            0,
            flags,
        )?;
        dd.copy_to_host(&mut hd)?;
        da.release()?;
        db.release()?;
        dc.release()?;
        dd.release()?;

        ctx.say(format!(
            "M, N, K, lda, ldb, ldc, ldd, flags = {}, {}, {}, {}, {}, {}, {ldd}, {}",
            shape.m, shape.n, shape.k, shape.a.ld, shape.b.ld, shape.ldc, flags.0
        ));
        ctx.show_matrix("D", &hd, shape.m, shape.n, ldd);

        let error = mat_max_relative_error(&hd, &gold, shape.m, shape.n, ldd, 0, 1);
        Ok(Outcome::Verdict(Verdict::relative(error, f64::EPSILON, ctx.tolerance())))
    }
}
