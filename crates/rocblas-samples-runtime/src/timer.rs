//! Wall-clock and HIP-event timers.

use crate::error::{Result, check_hip};
use crate::ffi::{HIP_STREAM_DEFAULT, HipEvent};
use crate::runtime::Runtime;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Times device work with a pair of events recorded on the null stream.
pub struct GpuTimer {
    runtime: Runtime,
    start: HipEvent,
    stop: HipEvent,
}

impl GpuTimer {
    pub fn new(runtime: &Runtime) -> Result<Self> {
        let hip = runtime.hip();
        let mut start: HipEvent = std::ptr::null_mut();
        let mut stop: HipEvent = std::ptr::null_mut();
        check_hip(unsafe { (hip.event_create)(&mut start) }, "hipEventCreate")?;
        if let Err(e) = check_hip(unsafe { (hip.event_create)(&mut stop) }, "hipEventCreate") {
            unsafe { (hip.event_destroy)(start) };
            return Err(e);
        }
        Ok(Self { runtime: runtime.clone(), start, stop })
    }

    pub fn start(&mut self) -> Result<()> {
        check_hip(
            unsafe { (self.runtime.hip().event_record)(self.start, HIP_STREAM_DEFAULT) },
            "hipEventRecord",
        )
    }

    /// Record the stop event, wait for it, and return the elapsed milliseconds.
    pub fn stop(&mut self, label: &str) -> Result<f32> {
        let hip = self.runtime.hip();
        check_hip(unsafe { (hip.event_record)(self.stop, HIP_STREAM_DEFAULT) }, "hipEventRecord")?;
        check_hip(unsafe { (hip.event_synchronize)(self.stop) }, "hipEventSynchronize")?;
        let mut elapsed_ms = 0.0f32;
        check_hip(
            unsafe { (hip.event_elapsed_time)(&mut elapsed_ms, self.start, self.stop) },
            "hipEventElapsedTime",
        )?;
        info!(elapsed_ms, "{label}");
        Ok(elapsed_ms)
    }
}

impl Drop for GpuTimer {
    fn drop(&mut self) {
        let hip = self.runtime.hip();
        for event in [self.start, self.stop] {
            if let Err(e) = check_hip(unsafe { (hip.event_destroy)(event) }, "hipEventDestroy") {
                warn!(error = %e, "failed to destroy HIP event");
            }
        }
    }
}

/// Host wall-clock timer.
#[derive(Debug, Clone, Copy)]
pub struct CpuTimer {
    start: Instant,
}

impl Default for CpuTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTimer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn start(&mut self) {
        self.start = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed milliseconds since `start`.
    pub fn stop(&self, label: &str) -> f64 {
        let elapsed_ms = self.elapsed().as_secs_f64() * 1e3;
        info!(elapsed_ms, "{label}");
        elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_timer_is_monotonic() {
        let mut timer = CpuTimer::new();
        timer.start();
        std::thread::sleep(Duration::from_millis(2));
        let first = timer.stop("first");
        let second = timer.stop("second");
        assert!(first >= 2.0);
        assert!(second >= first);
    }
}
