//! Level-3 matrix-matrix samples.

use anyhow::Result;
use rocblas_samples_common::reference::{OperandLayout, Strides, mat_identity, mat_mat_mult};
use rocblas_samples_common::verify::mat_max_relative_error;
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{DeviceVector, Handle, Operation, PointerMode};

use super::{Outcome, Sample, blas_int};
use crate::context::SampleContext;

/// Operand geometry shared by the GEMM samples: `C = alpha * op(A) * op(B) + beta * C`.
#[derive(Debug, Clone, Copy)]
pub(super) struct GemmShape {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub a: OperandLayout,
    pub b: OperandLayout,
    pub ldc: usize,
}

impl GemmShape {
    pub fn new(trans_a: Operation, trans_b: Operation, m: usize, n: usize, k: usize) -> Self {
        Self {
            m,
            n,
            k,
            a: OperandLayout::new(trans_a, m, k),
            b: OperandLayout::new(trans_b, k, n),
            ldc: m.max(1),
        }
    }

    pub fn size_c(&self) -> usize {
        self.n * self.ldc
    }

    pub fn describe(&self) -> String {
        format!(
            "M, N, K, lda, ldb, ldc = {}, {}, {}, {}, {}, {}",
            self.m, self.n, self.k, self.a.ld, self.b.ld, self.ldc
        )
    }
}

// ── gemm ─────────────────────────────────────────────────────────────

pub struct Gemm;

impl Sample for Gemm {
    fn name(&self) -> &'static str {
        "gemm"
    }

    fn about(&self) -> &'static str {
        "C = alpha * A * B + beta * C with A = 1, B = I, C = 1 (rocblas_sgemm)"
    }

    fn letters(&self) -> &'static str {
        "MNKab"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (trans_a, trans_b) = (Operation::None, Operation::None);
        let shape = GemmShape::new(trans_a, trans_b, args.m as usize, args.n as usize, args.k as usize);
        let (alpha, beta) = (args.alpha, args.beta);

        let ha = vec![1.0f32; shape.a.size];
        let mut hb = vec![0.0f32; shape.b.size];
        let mut hc = vec![1.0f32; shape.size_c()];
        mat_identity(&mut hb, shape.k, shape.n, shape.b.ld);

        let mut gold = hc.clone();
        mat_mat_mult(
            alpha,
            beta,
            shape.m,
            shape.n,
            shape.k,
            &ha,
            shape.a.strides,
            &hb,
            shape.b.strides,
            &mut gold,
            Strides::column_major(shape.ldc),
        );

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut da: DeviceVector<f32> = DeviceVector::new(&runtime, ha.len())?;
        let mut db: DeviceVector<f32> = DeviceVector::new(&runtime, hb.len())?;
        let mut dc: DeviceVector<f32> = DeviceVector::new(&runtime, hc.len())?;
        da.copy_from_host(&ha)?;
        db.copy_from_host(&hb)?;
        dc.copy_from_host(&hc)?;

        handle.sgemm(
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
            &mut dc.as_slice_mut(),
            blas_int(shape.ldc)?,
        )?;
        dc.copy_to_host(&mut hc)?;
        for buffer in [da, db, dc] {
            buffer.release()?;
        }

        ctx.say(shape.describe());
        ctx.show_matrix("C", &hc, shape.m, shape.n, shape.ldc);

        let error = mat_max_relative_error(&hc, &gold, shape.m, shape.n, shape.ldc, 0, 1);
        Ok(Outcome::Verdict(Verdict::relative(error, f32::EPSILON as f64, ctx.tolerance())))
    }
}

// ── gemm-strided-batched ─────────────────────────────────────────────

pub struct GemmStridedBatched;

impl Sample for GemmStridedBatched {
    fn name(&self) -> &'static str {
        "gemm-strided-batched"
    }

    fn about(&self) -> &'static str {
        "A batch of GEMMs laid out at fixed strides (rocblas_sgemm_strided_batched)"
    }

    fn letters(&self) -> &'static str {
        "MNKabc"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (trans_a, trans_b) = (Operation::None, Operation::None);
        let shape = GemmShape::new(trans_a, trans_b, args.m as usize, args.n as usize, args.k as usize);
        let (alpha, beta) = (args.alpha, args.beta);
        let batch_count = args.batch_count as usize;

        let (stride_a, stride_b, stride_c) = (shape.a.size, shape.b.size, shape.size_c());
        // one matrix's worth of storage even for an empty batch
        let count = batch_count.max(1);

        let ha = vec![1.0f32; stride_a * count];
        let mut hb = vec![0.0f32; stride_b * count];
        let mut hc = vec![1.0f32; stride_c * count];
        for batch in 0..batch_count {
            mat_identity(&mut hb[batch * stride_b..], shape.k, shape.n, shape.b.ld);
        }

        let mut gold = hc.clone();
        for batch in 0..batch_count {
            mat_mat_mult(
                alpha,
                beta,
                shape.m,
                shape.n,
                shape.k,
                &ha[batch * stride_a..],
                shape.a.strides,
                &hb[batch * stride_b..],
                shape.b.strides,
                &mut gold[batch * stride_c..],
                Strides::column_major(shape.ldc),
            );
        }

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        handle.set_pointer_mode(PointerMode::Host)?;

        let mut da: DeviceVector<f32> = DeviceVector::new(&runtime, ha.len())?;
        let mut db: DeviceVector<f32> = DeviceVector::new(&runtime, hb.len())?;
        let mut dc: DeviceVector<f32> = DeviceVector::new(&runtime, hc.len())?;
        da.copy_from_host(&ha)?;
        db.copy_from_host(&hb)?;
        dc.copy_from_host(&hc)?;

        handle.sgemm_strided_batched(
            trans_a,
            trans_b,
            args.m,
            args.n,
            args.k,
            alpha,
            &da.as_slice(),
            blas_int(shape.a.ld)?,
            stride_a as i64,
            &db.as_slice(),
            blas_int(shape.b.ld)?,
            stride_b as i64,
            beta,
            &mut dc.as_slice_mut(),
            blas_int(shape.ldc)?,
            stride_c as i64,
            args.batch_count,
        )?;
        dc.copy_to_host(&mut hc)?;
        for buffer in [da, db, dc] {
            buffer.release()?;
        }

        ctx.say(format!("{}, batch_count = {batch_count}", shape.describe()));

        let error =
            mat_max_relative_error(&hc, &gold, shape.m, shape.n, shape.ldc, stride_c, batch_count);
        Ok(Outcome::Verdict(Verdict::relative(error, f32::EPSILON as f64, ctx.tolerance())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemm_shape_follows_the_operations() {
        let shape = GemmShape::new(Operation::Transpose, Operation::None, 200, 60, 200);
        assert_eq!((shape.a.ld, shape.a.size), (200, 40_000));
        assert_eq!((shape.b.ld, shape.b.size), (200, 12_000));
        assert_eq!((shape.ldc, shape.size_c()), (200, 12_000));

        let shape = GemmShape::new(Operation::None, Operation::Transpose, 128, 128, 64);
        assert_eq!(shape.a.ld, 128);
        assert_eq!(shape.b.ld, 128);
        assert_eq!(shape.b.size, 64 * 128);
    }

    #[test]
    fn describe_lists_the_leading_dimensions() {
        let shape = GemmShape::new(Operation::None, Operation::None, 5, 4, 3);
        assert_eq!(shape.describe(), "M, N, K, lda, ldb, ldc = 5, 4, 3, 5, 3, 5");
    }
}
