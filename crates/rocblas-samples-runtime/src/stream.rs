//! HIP stream management.

use crate::error::{Result, check_hip};
use crate::ffi::{HIP_STREAM_DEFAULT, HipStream};
use crate::runtime::Runtime;
use tracing::{debug, warn};

/// A managed HIP stream, destroyed on drop.
pub struct Stream {
    runtime: Runtime,
    handle: HipStream,
    /// Created by us and destroyed on drop; default and borrowed streams are not.
    owned: bool,
}

impl Stream {
    /// Create a new stream on the current device.
    pub fn new(runtime: &Runtime) -> Result<Self> {
        let mut handle: HipStream = std::ptr::null_mut();
        check_hip(unsafe { (runtime.hip().stream_create)(&mut handle) }, "hipStreamCreate")?;
        debug!(stream = ?handle, "created HIP stream");
        Ok(Self { runtime: runtime.clone(), handle, owned: true })
    }

    /// Wrap the default (null) stream.
    pub fn default_stream(runtime: &Runtime) -> Self {
        Self { runtime: runtime.clone(), handle: HIP_STREAM_DEFAULT, owned: false }
    }

    /// Wrap a stream owned by someone else (e.g. the one a rocBLAS handle uses).
    pub(crate) fn borrowed(runtime: &Runtime, handle: HipStream) -> Self {
        Self { runtime: runtime.clone(), handle, owned: false }
    }

    /// Synchronise the stream (wait for all queued work).
    pub fn synchronize(&self) -> Result<()> {
        check_hip(
            unsafe { (self.runtime.hip().stream_synchronize)(self.handle) },
            "hipStreamSynchronize",
        )
    }

    /// Raw handle for library calls.
    pub fn raw(&self) -> HipStream {
        self.handle
    }

    /// Whether this is the null stream.
    pub fn is_default(&self) -> bool {
        self.handle == HIP_STREAM_DEFAULT
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if destroys_on_drop(self.owned, self.handle) {
            let status = unsafe { (self.runtime.hip().stream_destroy)(self.handle) };
            if let Err(e) = check_hip(status, "hipStreamDestroy") {
                warn!(error = %e, "failed to destroy HIP stream");
            } else {
                debug!(stream = ?self.handle, "destroyed HIP stream");
            }
        }
    }
}

fn destroys_on_drop(owned: bool, handle: HipStream) -> bool {
    owned && handle != HIP_STREAM_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owned_non_null_streams_are_destroyed() {
        let created = 0x10usize as HipStream;
        assert!(destroys_on_drop(true, created));
        // a handle's stream is borrowed
        assert!(!destroys_on_drop(false, created));
        assert!(!destroys_on_drop(false, HIP_STREAM_DEFAULT));
        assert!(!destroys_on_drop(true, HIP_STREAM_DEFAULT));
    }
}
