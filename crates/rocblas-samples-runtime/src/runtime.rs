//! Shared owner of the loaded HIP / rocBLAS / HIP-RTC libraries.

use crate::error::{Result, RuntimeError, check_hip};
use crate::ffi::{BlasApi, HipApi, LibraryPaths, RtcApi};
use std::ffi::{CStr, c_char, c_int};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

struct Inner {
    hip: HipApi,
    blas: BlasApi,
    rtc: Mutex<Option<Arc<RtcApi>>>,
    paths: LibraryPaths,
}

/// Loaded HIP runtime and rocBLAS library.
///
/// Cloning is cheap; every clone shares the same library handles, which stay
/// open until the last clone (and every buffer, stream and handle created
/// from it) is dropped.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("hip", &self.inner.hip.library)
            .field("rocblas", &self.inner.blas.library)
            .finish()
    }
}

impl Runtime {
    /// Open the HIP runtime and rocBLAS. HIP-RTC is opened on first use.
    pub fn load(paths: &LibraryPaths) -> Result<Self> {
        let hip = HipApi::load(paths.hip.as_deref())?;
        let blas = BlasApi::load(paths.rocblas.as_deref())?;
        info!(hip = %hip.library, rocblas = %blas.library, "ROCm runtime ready");
        Ok(Self {
            inner: Arc::new(Inner { hip, blas, rtc: Mutex::new(None), paths: paths.clone() }),
        })
    }

    pub fn hip(&self) -> &HipApi {
        &self.inner.hip
    }

    pub fn blas(&self) -> &BlasApi {
        &self.inner.blas
    }

    /// HIP-RTC entry points, loading the compiler library on first call.
    pub fn rtc(&self) -> Result<Arc<RtcApi>> {
        let mut slot = self
            .inner
            .rtc
            .lock()
            .map_err(|_| RuntimeError::KernelCompile("HIP-RTC loader lock poisoned".into()))?;
        if let Some(rtc) = slot.as_ref() {
            return Ok(Arc::clone(rtc));
        }
        let rtc = Arc::new(RtcApi::load(self.inner.paths.hiprtc.as_deref())?);
        debug!(library = %rtc.library, "HIP-RTC loaded");
        *slot = Some(Arc::clone(&rtc));
        Ok(rtc)
    }

    /// Number of visible HIP devices.
    pub fn device_count(&self) -> Result<usize> {
        let mut count: c_int = 0;
        check_hip(unsafe { (self.hip().get_device_count)(&mut count) }, "hipGetDeviceCount")?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Bind the calling thread to device `index`.
    pub fn set_device(&self, index: usize) -> Result<()> {
        let id = to_device_id(index)?;
        check_hip(unsafe { (self.hip().set_device)(id) }, "hipSetDevice")
    }

    /// Device the calling thread is bound to.
    pub fn current_device(&self) -> Result<usize> {
        let mut id: c_int = 0;
        check_hip(unsafe { (self.hip().get_device)(&mut id) }, "hipGetDevice")?;
        usize::try_from(id).map_err(|_| RuntimeError::NoDevice)
    }

    /// Block until all work on the current device has completed.
    pub fn device_synchronize(&self) -> Result<()> {
        check_hip(unsafe { (self.hip().device_synchronize)() }, "hipDeviceSynchronize")
    }

    /// Marketing name of device `index`.
    pub fn device_name(&self, index: usize) -> Result<String> {
        let id = to_device_id(index)?;
        let mut buf = [0 as c_char; 256];
        check_hip(
            unsafe { (self.hip().device_get_name)(buf.as_mut_ptr(), buf.len() as c_int, id) },
            "hipDeviceGetName",
        )?;
        // SAFETY: HIP writes a NUL-terminated string into the buffer; the last
        // byte stays zero because the buffer was zero-initialised.
        buf[buf.len() - 1] = 0;
        let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Ok(name.to_string_lossy().into_owned())
    }

    /// Total global memory of device `index`, in bytes.
    pub fn device_total_memory(&self, index: usize) -> Result<usize> {
        let id = to_device_id(index)?;
        let mut bytes = 0usize;
        check_hip(unsafe { (self.hip().device_total_mem)(&mut bytes, id) }, "hipDeviceTotalMem")?;
        Ok(bytes)
    }
}

fn to_device_id(index: usize) -> Result<c_int> {
    c_int::try_from(index)
        .map_err(|_| RuntimeError::InvalidArgument(format!("device index {index} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn load_fails_cleanly_without_rocm() {
        let paths = LibraryPaths {
            hip: Some(PathBuf::from("/nonexistent/libamdhip64.so")),
            ..LibraryPaths::default()
        };
        let err = Runtime::load(&paths).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/libamdhip64.so"));
    }

    #[test]
    fn oversized_device_index_is_rejected() {
        assert!(to_device_id(usize::MAX).is_err());
        assert_eq!(to_device_id(3).unwrap(), 3);
    }
}
