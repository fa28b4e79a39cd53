//! Independent `ssymv` calls spread over several streams.
//!
//! Each stream owns one slice of the host buffers: it queues its uploads, the
//! routine and the download, and the host waits on that stream before moving
//! to the next region.

use anyhow::Result;
use rocblas_samples_common::fill::fill_normal;
use rocblas_samples_common::reference::mat_identity;
use rocblas_samples_common::verify::max_relative_error;
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{DeviceVector, Fill, GpuTimer, Handle, PointerMode, Stream};

use super::{Outcome, Sample};
use crate::context::SampleContext;

pub const NUM_STREAMS: usize = 4;

const NON_POSITIVE_N: &str = "The value of 'n' should be greater than zero";

/// Per-stream element counts of the three operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Regions {
    a: usize,
    x: usize,
    y: usize,
}

impl Regions {
    fn new(n: usize, incx: usize, incy: usize) -> Self {
        Self { a: n * n, x: n * incx, y: n * incy }
    }
}

pub struct MultiStream;

impl Sample for MultiStream {
    fn name(&self) -> &'static str {
        "multi-stream"
    }

    fn about(&self) -> &'static str {
        "One rocblas_ssymv per stream over disjoint regions, queued asynchronously"
    }

    fn letters(&self) -> &'static str {
        "Nabxy"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let (n, alpha, beta) = (args.n, args.alpha, args.beta);
        if n <= 0 {
            return Ok(Outcome::Skipped(NON_POSITIVE_N));
        }
        let len = n as usize;
        let lda = n;
        // every region is walked forwards; a zero increment still gets its own slot
        let incx = args.incx.abs().max(1);
        let incy = args.incy.abs().max(1);
        let region = Regions::new(len, incx as usize, incy as usize);

        let mut ha = vec![0.0f32; region.a * NUM_STREAMS];
        let mut hx = vec![0.0f32; region.x * NUM_STREAMS];
        let mut hy = vec![0.0f32; region.y * NUM_STREAMS];
        for block in ha.chunks_mut(region.a) {
            mat_identity(block, len, len, len);
        }
        fill_normal(ctx.rng(), &mut hx, 1);
        fill_normal(ctx.rng(), &mut hy, 1);
        ctx.show_vector("Input host Vector (X)", &hx, 0, 1);
        ctx.show_vector("Input host Vector (Y)", &hy, 0, 1);

        // A is the identity in every region: y = alpha * x + beta * y
        let mut gold = hy.clone();
        for i in 0..len * NUM_STREAMS {
            let (ix, iy) = (i * incx as usize, i * incy as usize);
            gold[iy] = alpha * hx[ix] + beta * gold[iy];
        }

        let runtime = ctx.runtime()?;
        let streams = (0..NUM_STREAMS)
            .map(|_| Stream::new(&runtime))
            .collect::<Result<Vec<_>, _>>()?;
        let mut handles = (0..NUM_STREAMS)
            .map(|_| Handle::new(&runtime))
            .collect::<Result<Vec<_>, _>>()?;

        let mut da: DeviceVector<f32> = DeviceVector::new(&runtime, ha.len())?;
        let mut dx: DeviceVector<f32> = DeviceVector::new(&runtime, hx.len())?;
        let mut dy: DeviceVector<f32> = DeviceVector::new(&runtime, hy.len())?;

        let mut timer = GpuTimer::new(&runtime)?;
        timer.start()?;
        for (i, (stream, handle)) in streams.iter().zip(handles.iter_mut()).enumerate() {
            let a = i * region.a..(i + 1) * region.a;
            let x = i * region.x..(i + 1) * region.x;
            let y = i * region.y..(i + 1) * region.y;

            let queued = (|| -> Result<()> {
                handle.set_stream(stream)?;
                handle.set_pointer_mode(PointerMode::Host)?;

                // SAFETY: the host buffers outlive the `stream.synchronize()`
                // that follows, whether or not queuing succeeded.
                unsafe {
                    da.copy_from_host_async_at(a.start, &ha[a.clone()], stream)?;
                    dx.copy_from_host_async_at(x.start, &hx[x.clone()], stream)?;
                    dy.copy_from_host_async_at(y.start, &hy[y.clone()], stream)?;
                }

                handle.ssymv(
                    Fill::Upper,
                    n,
                    alpha,
                    &da.slice(a)?,
                    lda,
                    &dx.slice(x)?,
                    incx,
                    beta,
                    &mut dy.slice_mut(y.clone())?,
                    incy,
                )?;

                // SAFETY: as above; `hy[y]` is only read after the synchronize.
                unsafe { dy.copy_to_host_async_at(y.start, &mut hy[y], stream)? };
                Ok(())
            })();
            let synced = stream.synchronize();
            queued?;
            synced?;
        }
        timer.stop("multi-stream ssymv")?;

        for buffer in [da, dx, dy] {
            buffer.release()?;
        }
        // handles dispatch to the streams, so they go first
        drop(handles);
        drop(streams);

        ctx.show_vector("Output Vector (Y)", &hy, 0, 1);

        let error = max_relative_error(&hy, &gold);
        Ok(Outcome::Verdict(Verdict::relative(error, f32::EPSILON as f64, ctx.tolerance())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_scale_with_the_increments() {
        assert_eq!(Regions::new(5, 1, 1), Regions { a: 25, x: 5, y: 5 });
        assert_eq!(Regions::new(3, 2, 4), Regions { a: 9, x: 6, y: 12 });
    }

    #[test]
    fn every_region_fits_one_strided_vector() {
        use rocblas_samples_common::reference::vector_extent;
        for (n, inc) in [(1usize, 1i32), (5, 3), (7, 2)] {
            let region = Regions::new(n, inc as usize, inc as usize);
            assert!(vector_extent(n, inc) <= region.x);
        }
    }
}
