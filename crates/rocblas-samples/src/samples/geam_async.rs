//! Asynchronous matrix transfers from pinned memory around `rocblas_dgeam`.

use anyhow::Result;
use rocblas_samples_common::reference::geam;
use rocblas_samples_common::verify::count_mismatches;
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{
    DeviceVector, Handle, Operation, PinnedHostBuffer, PointerMode, get_matrix_async,
    set_matrix_async,
};

use super::{Outcome, Sample, blas_int};
use crate::context::SampleContext;

pub struct GeamAsync;

impl Sample for GeamAsync {
    fn name(&self) -> &'static str {
        "geam-async"
    }

    fn about(&self) -> &'static str {
        "C = A + 2 * A in double precision with pinned, stream-ordered copies (rocblas_dgeam)"
    }

    fn letters(&self) -> &'static str {
        "MN"
    }

    fn defaults(&self) -> SampleArgs {
        SampleArgs { m: 26700, n: 12162, ..SampleArgs::default() }
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (rows, cols) = (args.m as usize, args.n as usize);
        let lda = rows.max(1);
        let (alpha, beta) = (1.0f64, 2.0f64);
        let ld = blas_int(lda)?;

        let runtime = ctx.runtime()?;
        let mut handle = Handle::new(&runtime)?;
        let stream = handle.stream()?;

        let mut ha: PinnedHostBuffer<f64> = PinnedHostBuffer::new(&runtime, lda * cols, false)?;
        let mut hb: PinnedHostBuffer<f64> = PinnedHostBuffer::new(&runtime, lda * cols, false)?;
        for j in 0..cols {
            ha[j * lda..j * lda + rows].fill(1.0);
        }

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
            &ha,
            lda,
            &mut gold,
            lda,
        );

        let mut da: DeviceVector<f64> = DeviceVector::new(&runtime, lda * cols)?;
        let mut db: DeviceVector<f64> = DeviceVector::new(&runtime, lda * cols)?;
        let mut dc: DeviceVector<f64> = DeviceVector::new(&runtime, lda * cols)?;

        let queued = (|| -> Result<()> {
            // SAFETY: `ha` and `hb` are pinned and stay alive, untouched by the
            // host, until `stream.synchronize()` below.
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
                    &mut db.as_slice_mut(),
                    ld,
                    &stream,
                )?;
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
