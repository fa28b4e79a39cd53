//! A run-time compiled HIP kernel sharing a stream with rocBLAS.
//!
//! `B = A ∘ A` comes from the kernel, then `C = 2 * A + B` from
//! `rocblas_dgeam`; both are ordered on the handle's stream.

use anyhow::Result;
use rocblas_samples_common::reference::geam;
use rocblas_samples_common::verify::count_mismatches;
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::kernel::kernel_arg;
use rocblas_samples_runtime::{
    DeviceVector, Handle, HipKernelSource, LaunchConfig, Module, Operation, PinnedHostBuffer,
    PointerMode, get_matrix_async, set_matrix_async,
};
use tracing::debug;

use super::{Outcome, Sample, blas_int};
use crate::context::SampleContext;

const BLOCK: u32 = 32;

pub struct HipKernel;

impl Sample for HipKernel {
    fn name(&self) -> &'static str {
        "hip-kernel"
    }

    fn about(&self) -> &'static str {
        "Square a matrix with a HIP-RTC kernel, then C = 2 * A + A^2 (rocblas_dgeam)"
    }

    fn letters(&self) -> &'static str {
        "MN"
    }

    fn defaults(&self) -> SampleArgs {
        SampleArgs { m: 255, n: 512, ..SampleArgs::default() }
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (rows, cols) = (args.m as usize, args.n as usize);
        let lda = rows.max(1);
        let ld = blas_int(lda)?;
        let (alpha, beta) = (2.0f64, 1.0f64);

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        let stream = handle.stream()?;

        let mut ha: PinnedHostBuffer<f64> = PinnedHostBuffer::new(&runtime, lda * cols, true)?;
        let mut hb: PinnedHostBuffer<f64> = PinnedHostBuffer::new(&runtime, lda * cols, true)?;
        for j in 0..cols {
            for i in 0..rows {
                ha[i + j * lda] = i as f64;
            }
        }

        let squared: Vec<f64> = ha.iter().map(|v| v * v).collect();
        let mut gold = vec![0.0f64; lda * cols];
        geam(
            Operation::None,
            Operation::None,
            rows,
            cols,
            alpha,
            &ha,
            lda,
            beta,
            &squared,
            lda,
            &mut gold,
            lda,
        );

        let module = Module::compile(&runtime, HipKernelSource::SquareElements)?;
        let square = module.function()?;

        let mut da: DeviceVector<f64> = DeviceVector::new(&runtime, lda * cols)?;
        let mut db: DeviceVector<f64> = DeviceVector::new(&runtime, lda * cols)?;
        let mut dc: DeviceVector<f64> = DeviceVector::new(&runtime, lda * cols)?;

        let queued = (|| -> Result<()> {
            // SAFETY: the pinned buffers are neither touched nor freed until
            // `stream.synchronize()` below.
            unsafe {
                set_matrix_async(
                    &runtime,
                    args.m,
                    args.n,
                    &ha,
                    ld,
                    &mut da.as_slice_mut(),
                    ld,
                    &stream,
                )?;
                set_matrix_async(
                    &runtime,
                    args.m,
                    args.n,
                    &ha,
                    ld,
                    &mut dc.as_slice_mut(),
                    ld,
                    &stream,
                )?;
            }

            if rows > 0 && cols > 0 {
                let config =
                    LaunchConfig::grid_2d(rows as u32, cols as u32, BLOCK, BLOCK).on(&stream);
                let (m, n) = (args.m, args.n);
                let src = dc.as_ptr();
                let dst = db.as_mut_ptr();
                let mut params = [
                    kernel_arg(&m),
                    kernel_arg(&n),
                    kernel_arg(&src),
                    kernel_arg(&ld),
                    kernel_arg(&dst),
                    kernel_arg(&ld),
                ];
                debug!(grid = ?config.grid, "queuing element-wise square");
                // SAFETY: the parameters match `matrix_square_elements(int, int,
                // const double*, int, double*, int)` and both device buffers hold
                // `ld * cols` elements and outlive the synchronize.
                unsafe { square.launch(&config, &mut params)? };
            }

            handle.set_pointer_mode(PointerMode::Host)?;
            handle.dgeam(
                Operation::None,
                Operation::None,
                args.m,
                args.n,
                alpha,
                &da.as_slice(),
                ld,
                beta,
                &db.as_slice(),
                ld,
                &mut dc.as_slice_mut(),
                ld,
            )?;
            // SAFETY: as above.
            unsafe {
                get_matrix_async(&runtime, args.m, args.n, &dc.as_slice(), ld, &mut hb, ld, &stream)?
            };
            Ok(())
        })();
        let synced = stream.synchronize();
        queued?;
        synced?;

        for buffer in [da, db, dc] {
            buffer.release()?;
        }

        ctx.say(format!("M, N, lda = {rows}, {cols}, {lda}"));
        ctx.show_matrix("C", &hb, rows, cols, lda);

        let mismatches: usize = (0..cols)
            .map(|j| {
                let column = j * lda..j * lda + rows;
                count_mismatches(&hb[column.clone()], &gold[column])
            })
            .sum();
        Ok(Outcome::Verdict(Verdict::exact(mismatches)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_grid_covers_the_default_matrix() {
        let args = HipKernel.defaults();
        let config = LaunchConfig::grid_2d(args.m as u32, args.n as u32, BLOCK, BLOCK);
        assert_eq!(config.grid, (16, 8, 1));
        assert_eq!(config.block, (BLOCK, BLOCK, 1));
    }

    #[test]
    fn kernel_entry_point_matches_the_launch_arguments() {
        let source = HipKernelSource::SquareElements.source();
        assert!(source.contains(
            "matrix_square_elements(int rows, int cols, const double* a, int lda, double* b, int ldb)"
        ));
    }
}
