//! `sgemm` across every visible device, two streams per device.
//!
//! One scoped host thread per device binds that device, allocates its share
//! of the operands and drives its streams. Host buffers are cut into disjoint
//! per-device slices up front, so the threads never share mutable data.

use anyhow::{Result, anyhow, bail};
use rocblas_samples_common::fill::fill_normal;
use rocblas_samples_common::reference::{Strides, mat_mat_mult};
use rocblas_samples_common::verify::max_error;
use rocblas_samples_common::{SampleArgs, Verdict};
use rocblas_samples_runtime::{
    CpuTimer, DeviceVector, Handle, Operation, PointerMode, Runtime, Stream,
};
use tracing::debug;

use super::level3::GemmShape;
use super::{Outcome, Sample, blas_int};
use crate::context::SampleContext;

pub const NUM_STREAMS: usize = 2;

/// Host operands owned by one device worker.
struct DeviceShare<'a> {
    device: usize,
    a: &'a [f32],
    b: &'a [f32],
    c: &'a mut [f32],
}

pub struct MultiDevice;

impl Sample for MultiDevice {
    fn name(&self) -> &'static str {
        "multi-device"
    }

    fn about(&self) -> &'static str {
        "rocblas_sgemm on every device, two streams each, one host thread per device"
    }

    fn letters(&self) -> &'static str {
        "MNKab"
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome> {
        let runtime = ctx.runtime()?;
        let devices = runtime.device_count()?;
        ctx.say(format!("The total number of available GPU devices are {devices}"));
        if devices == 0 {
            bail!("No HIP devices available for the multi-device sample");
        }

        let shape = GemmShape::new(
            Operation::None,
            Operation::None,
            args.m as usize,
            args.n as usize,
            args.k as usize,
        );
        let (alpha, beta) = (args.alpha, args.beta);
        let (region_a, region_b, region_c) = (shape.a.size, shape.b.size, shape.size_c());
        let regions = devices * NUM_STREAMS;

        let mut ha = vec![0.0f32; region_a * regions];
        let mut hb = vec![0.0f32; region_b * regions];
        let mut hc = vec![0.0f32; region_c * regions];
        fill_normal(ctx.rng(), &mut ha, 1);
        fill_normal(ctx.rng(), &mut hb, 1);
        fill_normal(ctx.rng(), &mut hc, 1);

        let mut gold = hc.clone();
        for r in 0..regions {
            mat_mat_mult(
                alpha,
                beta,
                shape.m,
                shape.n,
                shape.k,
                &ha[r * region_a..],
                shape.a.strides,
                &hb[r * region_b..],
                shape.b.strides,
                &mut gold[r * region_c..],
                Strides::column_major(shape.ldc),
            );
        }

        // HIP events only time one device; the workers span all of them
        let mut timer = CpuTimer::new();
        timer.start();
        let shares = split_shares(&ha, &hb, &mut hc, devices);
        std::thread::scope(|scope| -> Result<()> {
            let workers: Vec<_> = shares
                .into_iter()
                .map(|share| {
                    let runtime = &runtime;
                    scope.spawn(move || run_on_device(runtime, share, &shape, alpha, beta))
                })
                .collect();
            for worker in workers {
                worker.join().map_err(|_| anyhow!("device worker panicked"))??;
            }
            Ok(())
        })?;
        timer.stop("multi-device sgemm");

        ctx.say(format!(
            "M, N, K, lda, ldb, ldc, NUM_STREAMS, NUM_DEVICES = {}, {}, {}, {}, {}, {}, {NUM_STREAMS}, {devices}",
            shape.m, shape.n, shape.k, shape.a.ld, shape.b.ld, shape.ldc
        ));

        let error = max_error(&hc, &gold);
        let k = shape.k as f64;
        let allowed = f32::EPSILON as f64 * ctx.tolerance() * k * k.sqrt();
        Ok(Outcome::Verdict(Verdict::absolute(error, allowed)))
    }
}

/// Cut the host operands into one contiguous share per device.
fn split_shares<'a>(
    a: &'a [f32],
    b: &'a [f32],
    c: &'a mut [f32],
    devices: usize,
) -> Vec<DeviceShare<'a>> {
    let (per_a, per_b, per_c) = (a.len() / devices, b.len() / devices, c.len() / devices);
    let mut rest = c;
    (0..devices)
        .map(|device| {
            let (mine, tail) = std::mem::take(&mut rest).split_at_mut(per_c);
            rest = tail;
            DeviceShare {
                device,
                a: &a[device * per_a..(device + 1) * per_a],
                b: &b[device * per_b..(device + 1) * per_b],
                c: mine,
            }
        })
        .collect()
}

fn run_on_device(
    runtime: &Runtime,
    share: DeviceShare<'_>,
    shape: &GemmShape,
    alpha: f32,
    beta: f32,
) -> Result<()> {
    let DeviceShare { device, a: ha, b: hb, c: hc } = share;
    runtime.set_device(device)?;
    let bound = runtime.current_device()?;
    if bound != device {
        bail!("worker for device {device} is bound to device {bound}");
    }
    debug!(device, "device worker started");

    let (region_a, region_b, region_c) = (shape.a.size, shape.b.size, shape.size_c());
    let (m, n, k) = (blas_int(shape.m)?, blas_int(shape.n)?, blas_int(shape.k)?);
    let (lda, ldb, ldc) = (blas_int(shape.a.ld)?, blas_int(shape.b.ld)?, blas_int(shape.ldc)?);

    let mut da: DeviceVector<f32> = DeviceVector::new(runtime, ha.len())?;
    let mut db: DeviceVector<f32> = DeviceVector::new(runtime, hb.len())?;
    let mut dc: DeviceVector<f32> = DeviceVector::new(runtime, hc.len())?;
    let streams = (0..NUM_STREAMS).map(|_| Stream::new(runtime)).collect::<Result<Vec<_>, _>>()?;
    let mut handles =
        (0..NUM_STREAMS).map(|_| Handle::new(runtime)).collect::<Result<Vec<_>, _>>()?;

    let queued = (|| -> Result<()> {
        for (s, (stream, handle)) in streams.iter().zip(handles.iter_mut()).enumerate() {
            handle.set_stream(stream)?;
            handle.set_pointer_mode(PointerMode::Host)?;

            let a = s * region_a..(s + 1) * region_a;
            let b = s * region_b..(s + 1) * region_b;
            let c = s * region_c..(s + 1) * region_c;

            // SAFETY: the host shares outlive the device synchronize below.
            unsafe {
                da.copy_from_host_async_at(a.start, &ha[a.clone()], stream)?;
                db.copy_from_host_async_at(b.start, &hb[b.clone()], stream)?;
                dc.copy_from_host_async_at(c.start, &hc[c.clone()], stream)?;
            }

            handle.sgemm(
                Operation::None,
                Operation::None,
                m,
                n,
                k,
                alpha,
                &da.slice(a)?,
                lda,
                &db.slice(b)?,
                ldb,
                beta,
                &mut dc.slice_mut(c.clone())?,
                ldc,
            )?;

            // SAFETY: as above.
            unsafe { dc.copy_to_host_async_at(c.start, &mut hc[c], stream)? };
        }
        Ok(())
    })();
    let synced = runtime.device_synchronize();
    queued?;
    synced?;

    drop(handles);
    drop(streams);
    for buffer in [da, db, dc] {
        buffer.release()?;
    }
    debug!(device, "device worker finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_can_be_shared_across_worker_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Runtime>();
    }

    #[test]
    fn shares_are_disjoint_and_cover_the_buffers() {
        let a: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let b = vec![0.0f32; 6];
        let mut c = vec![0.0f32; 9];
        let shares = split_shares(&a, &b, &mut c, 3);
        assert_eq!(shares.len(), 3);
        assert_eq!(shares[1].device, 1);
        assert_eq!(shares[1].a, &[4.0, 5.0, 6.0, 7.0]);
        assert!(shares.iter().all(|s| s.b.len() == 2 && s.c.len() == 3));
    }

    #[test]
    fn empty_operands_still_give_every_device_a_share() {
        let mut c: Vec<f32> = Vec::new();
        let shares = split_shares(&[], &[], &mut c, 2);
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|s| s.a.is_empty() && s.c.is_empty()));
    }
}
