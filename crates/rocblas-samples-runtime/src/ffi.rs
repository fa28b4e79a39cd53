//! Run-time loaded HIP, rocBLAS and HIP-RTC entry points.
//!
//! Nothing here links against ROCm at build time: each table is filled by
//! resolving symbols from a shared library opened with `libloading`, so the
//! workspace builds anywhere and fails at run time with a clear error when
//! the libraries are absent.

use crate::error::{Result, RuntimeError};
use libloading::Library;
use num_complex::Complex32;
use std::ffi::{c_char, c_int, c_uint, c_void};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Opaque HIP stream handle.
pub type HipStream = *mut c_void;
/// Opaque HIP event handle.
pub type HipEvent = *mut c_void;
/// Opaque HIP module handle.
pub type HipModule = *mut c_void;
/// Opaque HIP kernel function handle.
pub type HipFunction = *mut c_void;
/// Opaque rocBLAS handle.
pub type BlasHandle = *mut c_void;
/// Opaque HIP-RTC program handle.
pub type RtcProgram = *mut c_void;

/// The null stream.
pub const HIP_STREAM_DEFAULT: HipStream = std::ptr::null_mut();

/// `hipMemcpyKind` values.
pub const HIP_MEMCPY_HOST_TO_DEVICE: c_int = 1;
pub const HIP_MEMCPY_DEVICE_TO_HOST: c_int = 2;

/// `hipHostMalloc` flags.
pub const HIP_HOST_MALLOC_DEFAULT: c_uint = 0x0;
pub const HIP_HOST_MALLOC_MAPPED: c_uint = 0x2;

#[cfg(target_os = "windows")]
const HIP_CANDIDATES: &[&str] = &["amdhip64.dll", "amdhip64_6.dll"];
#[cfg(not(target_os = "windows"))]
const HIP_CANDIDATES: &[&str] = &["libamdhip64.so", "libamdhip64.so.6", "libamdhip64.so.5"];

#[cfg(target_os = "windows")]
const ROCBLAS_CANDIDATES: &[&str] = &["rocblas.dll"];
#[cfg(not(target_os = "windows"))]
const ROCBLAS_CANDIDATES: &[&str] = &["librocblas.so", "librocblas.so.4", "librocblas.so.3"];

// HIP-RTC moved out of libamdhip64 in ROCm 6; older installs still export it there.
#[cfg(target_os = "windows")]
const HIPRTC_CANDIDATES: &[&str] = &["hiprtc.dll", "hiprtc0601.dll", "amdhip64.dll"];
#[cfg(not(target_os = "windows"))]
const HIPRTC_CANDIDATES: &[&str] = &["libhiprtc.so", "libhiprtc.so.6", "libamdhip64.so"];

/// Explicit locations for the shared libraries. `None` searches the
/// platform default names through the dynamic loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPaths {
    pub hip: Option<PathBuf>,
    pub rocblas: Option<PathBuf>,
    pub hiprtc: Option<PathBuf>,
}

fn open_library(explicit: Option<&Path>, candidates: &[&str]) -> Result<(Library, String)> {
    if let Some(path) = explicit {
        let name = path.display().to_string();
        // SAFETY: loading a vendor runtime runs its initialisers; nothing else can be checked here.
        let lib = unsafe { Library::new(path) }
            .map_err(|source| RuntimeError::LibraryLoad { library: name.clone(), source })?;
        info!(library = %name, "loaded shared library");
        return Ok((lib, name));
    }

    let mut last_error = None;
    for &candidate in candidates {
        // SAFETY: as above.
        match unsafe { Library::new(candidate) } {
            Ok(lib) => {
                info!(library = candidate, "loaded shared library");
                return Ok((lib, candidate.to_string()));
            }
            Err(source) => {
                debug!(library = candidate, error = %source, "candidate library not loadable");
                last_error = Some((candidate, source));
            }
        }
    }

    match last_error {
        Some((candidate, source)) => {
            Err(RuntimeError::LibraryLoad { library: candidate.to_string(), source })
        }
        None => Err(RuntimeError::InvalidArgument("no library candidates given".into())),
    }
}

fn symbol<T: Copy>(lib: &Library, library: &str, name: &'static str) -> Result<T> {
    // SAFETY: every call site declares `T` as the exact C prototype from the
    // HIP / rocBLAS / HIP-RTC headers.
    let sym = unsafe { lib.get::<T>(name.as_bytes()) }.map_err(|source| {
        RuntimeError::MissingSymbol { symbol: name, library: library.to_string(), source }
    })?;
    Ok(*sym)
}

// ── HIP runtime ──────────────────────────────────────────────────────

/// HIP runtime entry points.
pub struct HipApi {
    pub get_device_count: unsafe extern "C" fn(*mut c_int) -> c_int,
    pub set_device: unsafe extern "C" fn(c_int) -> c_int,
    pub get_device: unsafe extern "C" fn(*mut c_int) -> c_int,
    pub device_get_name: unsafe extern "C" fn(*mut c_char, c_int, c_int) -> c_int,
    pub device_total_mem: unsafe extern "C" fn(*mut usize, c_int) -> c_int,
    pub device_synchronize: unsafe extern "C" fn() -> c_int,
    pub malloc: unsafe extern "C" fn(*mut *mut c_void, usize) -> c_int,
    pub free: unsafe extern "C" fn(*mut c_void) -> c_int,
    pub host_malloc: unsafe extern "C" fn(*mut *mut c_void, usize, c_uint) -> c_int,
    pub host_free: unsafe extern "C" fn(*mut c_void) -> c_int,
    pub memcpy: unsafe extern "C" fn(*mut c_void, *const c_void, usize, c_int) -> c_int,
    pub memcpy_async:
        unsafe extern "C" fn(*mut c_void, *const c_void, usize, c_int, HipStream) -> c_int,
    pub stream_create: unsafe extern "C" fn(*mut HipStream) -> c_int,
    pub stream_destroy: unsafe extern "C" fn(HipStream) -> c_int,
    pub stream_synchronize: unsafe extern "C" fn(HipStream) -> c_int,
    pub event_create: unsafe extern "C" fn(*mut HipEvent) -> c_int,
    pub event_record: unsafe extern "C" fn(HipEvent, HipStream) -> c_int,
    pub event_synchronize: unsafe extern "C" fn(HipEvent) -> c_int,
    pub event_elapsed_time: unsafe extern "C" fn(*mut f32, HipEvent, HipEvent) -> c_int,
    pub event_destroy: unsafe extern "C" fn(HipEvent) -> c_int,
    pub module_load_data: unsafe extern "C" fn(*mut HipModule, *const c_void) -> c_int,
    pub module_get_function:
        unsafe extern "C" fn(*mut HipFunction, HipModule, *const c_char) -> c_int,
    #[allow(clippy::type_complexity)]
    pub module_launch_kernel: unsafe extern "C" fn(
        HipFunction,
        c_uint,
        c_uint,
        c_uint,
        c_uint,
        c_uint,
        c_uint,
        c_uint,
        HipStream,
        *mut *mut c_void,
        *mut *mut c_void,
    ) -> c_int,
    pub module_unload: unsafe extern "C" fn(HipModule) -> c_int,
    pub library: String,
    _lib: Library,
}

impl HipApi {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (lib, name) = open_library(path, HIP_CANDIDATES)?;
        let n = name.as_str();
        Ok(Self {
            get_device_count: symbol(&lib, n, "hipGetDeviceCount")?,
            set_device: symbol(&lib, n, "hipSetDevice")?,
            get_device: symbol(&lib, n, "hipGetDevice")?,
            device_get_name: symbol(&lib, n, "hipDeviceGetName")?,
            device_total_mem: symbol(&lib, n, "hipDeviceTotalMem")?,
            device_synchronize: symbol(&lib, n, "hipDeviceSynchronize")?,
            malloc: symbol(&lib, n, "hipMalloc")?,
            free: symbol(&lib, n, "hipFree")?,
            host_malloc: symbol(&lib, n, "hipHostMalloc")?,
            host_free: symbol(&lib, n, "hipHostFree")?,
            memcpy: symbol(&lib, n, "hipMemcpy")?,
            memcpy_async: symbol(&lib, n, "hipMemcpyAsync")?,
            stream_create: symbol(&lib, n, "hipStreamCreate")?,
            stream_destroy: symbol(&lib, n, "hipStreamDestroy")?,
            stream_synchronize: symbol(&lib, n, "hipStreamSynchronize")?,
            event_create: symbol(&lib, n, "hipEventCreate")?,
            event_record: symbol(&lib, n, "hipEventRecord")?,
            event_synchronize: symbol(&lib, n, "hipEventSynchronize")?,
            event_elapsed_time: symbol(&lib, n, "hipEventElapsedTime")?,
            event_destroy: symbol(&lib, n, "hipEventDestroy")?,
            module_load_data: symbol(&lib, n, "hipModuleLoadData")?,
            module_get_function: symbol(&lib, n, "hipModuleGetFunction")?,
            module_launch_kernel: symbol(&lib, n, "hipModuleLaunchKernel")?,
            module_unload: symbol(&lib, n, "hipModuleUnload")?,
            library: name.clone(),
            _lib: lib,
        })
    }
}

// ── rocBLAS ──────────────────────────────────────────────────────────

/// rocBLAS entry points used by the samples. Integer arguments are
/// `rocblas_int` (32-bit), strides are `rocblas_stride` (64-bit).
#[allow(clippy::type_complexity)]
pub struct BlasApi {
    pub create_handle: unsafe extern "C" fn(*mut BlasHandle) -> c_int,
    pub destroy_handle: unsafe extern "C" fn(BlasHandle) -> c_int,
    pub set_stream: unsafe extern "C" fn(BlasHandle, HipStream) -> c_int,
    pub get_stream: unsafe extern "C" fn(BlasHandle, *mut HipStream) -> c_int,
    pub set_pointer_mode: unsafe extern "C" fn(BlasHandle, c_int) -> c_int,
    pub set_vector:
        unsafe extern "C" fn(c_int, c_int, *const c_void, c_int, *mut c_void, c_int) -> c_int,
    pub get_vector:
        unsafe extern "C" fn(c_int, c_int, *const c_void, c_int, *mut c_void, c_int) -> c_int,
    pub set_matrix_async: unsafe extern "C" fn(
        c_int,
        c_int,
        c_int,
        *const c_void,
        c_int,
        *mut c_void,
        c_int,
        HipStream,
    ) -> c_int,
    pub get_matrix_async: unsafe extern "C" fn(
        c_int,
        c_int,
        c_int,
        *const c_void,
        c_int,
        *mut c_void,
        c_int,
        HipStream,
    ) -> c_int,
    pub saxpy:
        unsafe extern "C" fn(BlasHandle, c_int, *const f32, *const f32, c_int, *mut f32, c_int)
            -> c_int,
    pub sdot: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        *const f32,
        c_int,
        *const f32,
        c_int,
        *mut f32,
    ) -> c_int,
    pub snrm2: unsafe extern "C" fn(BlasHandle, c_int, *const f32, c_int, *mut f32) -> c_int,
    pub dscal: unsafe extern "C" fn(BlasHandle, c_int, *const f64, *mut f64, c_int) -> c_int,
    pub sswap: unsafe extern "C" fn(BlasHandle, c_int, *mut f32, c_int, *mut f32, c_int) -> c_int,
    pub sgemv: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        c_int,
        *const f32,
        *const f32,
        c_int,
        *const f32,
        c_int,
        *const f32,
        *mut f32,
        c_int,
    ) -> c_int,
    pub ssymv: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        *const f32,
        *const f32,
        c_int,
        *const f32,
        c_int,
        *const f32,
        *mut f32,
        c_int,
    ) -> c_int,
    pub cher: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        *const f32,
        *const Complex32,
        c_int,
        *mut Complex32,
        c_int,
    ) -> c_int,
    pub ctrmv: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        c_int,
        c_int,
        *const Complex32,
        c_int,
        *mut Complex32,
        c_int,
    ) -> c_int,
    pub sgemm: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        c_int,
        c_int,
        c_int,
        *const f32,
        *const f32,
        c_int,
        *const f32,
        c_int,
        *const f32,
        *mut f32,
        c_int,
    ) -> c_int,
    pub sgemm_strided_batched: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        c_int,
        c_int,
        c_int,
        *const f32,
        *const f32,
        c_int,
        i64,
        *const f32,
        c_int,
        i64,
        *const f32,
        *mut f32,
        c_int,
        i64,
        c_int,
    ) -> c_int,
    pub gemm_ex: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        c_int,
        c_int,
        c_int,
        *const c_void,
        *const c_void,
        c_int,
        c_int,
        *const c_void,
        c_int,
        c_int,
        *const c_void,
        *const c_void,
        c_int,
        c_int,
        *mut c_void,
        c_int,
        c_int,
        c_int,
        c_int,
        i32,
        u32,
    ) -> c_int,
    pub dgeam: unsafe extern "C" fn(
        BlasHandle,
        c_int,
        c_int,
        c_int,
        c_int,
        *const f64,
        *const f64,
        c_int,
        *const f64,
        *const f64,
        c_int,
        *mut f64,
        c_int,
    ) -> c_int,
    pub library: String,
    _lib: Library,
}

impl BlasApi {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (lib, name) = open_library(path, ROCBLAS_CANDIDATES)?;
        let n = name.as_str();
        Ok(Self {
            create_handle: symbol(&lib, n, "rocblas_create_handle")?,
            destroy_handle: symbol(&lib, n, "rocblas_destroy_handle")?,
            set_stream: symbol(&lib, n, "rocblas_set_stream")?,
            get_stream: symbol(&lib, n, "rocblas_get_stream")?,
            set_pointer_mode: symbol(&lib, n, "rocblas_set_pointer_mode")?,
            set_vector: symbol(&lib, n, "rocblas_set_vector")?,
            get_vector: symbol(&lib, n, "rocblas_get_vector")?,
            set_matrix_async: symbol(&lib, n, "rocblas_set_matrix_async")?,
            get_matrix_async: symbol(&lib, n, "rocblas_get_matrix_async")?,
            saxpy: symbol(&lib, n, "rocblas_saxpy")?,
            sdot: symbol(&lib, n, "rocblas_sdot")?,
            snrm2: symbol(&lib, n, "rocblas_snrm2")?,
            dscal: symbol(&lib, n, "rocblas_dscal")?,
            sswap: symbol(&lib, n, "rocblas_sswap")?,
            sgemv: symbol(&lib, n, "rocblas_sgemv")?,
            ssymv: symbol(&lib, n, "rocblas_ssymv")?,
            cher: symbol(&lib, n, "rocblas_cher")?,
            ctrmv: symbol(&lib, n, "rocblas_ctrmv")?,
            sgemm: symbol(&lib, n, "rocblas_sgemm")?,
            sgemm_strided_batched: symbol(&lib, n, "rocblas_sgemm_strided_batched")?,
            gemm_ex: symbol(&lib, n, "rocblas_gemm_ex")?,
            dgeam: symbol(&lib, n, "rocblas_dgeam")?,
            library: name.clone(),
            _lib: lib,
        })
    }
}

// ── HIP-RTC ──────────────────────────────────────────────────────────

/// HIP run-time compiler entry points.
#[allow(clippy::type_complexity)]
pub struct RtcApi {
    pub create_program: unsafe extern "C" fn(
        *mut RtcProgram,
        *const c_char,
        *const c_char,
        c_int,
        *const *const c_char,
        *const *const c_char,
    ) -> c_int,
    pub compile_program: unsafe extern "C" fn(RtcProgram, c_int, *const *const c_char) -> c_int,
    pub get_program_log_size: unsafe extern "C" fn(RtcProgram, *mut usize) -> c_int,
    pub get_program_log: unsafe extern "C" fn(RtcProgram, *mut c_char) -> c_int,
    pub get_code_size: unsafe extern "C" fn(RtcProgram, *mut usize) -> c_int,
    pub get_code: unsafe extern "C" fn(RtcProgram, *mut c_char) -> c_int,
    pub destroy_program: unsafe extern "C" fn(*mut RtcProgram) -> c_int,
    pub get_error_string: unsafe extern "C" fn(c_int) -> *const c_char,
    pub library: String,
    _lib: Library,
}

impl RtcApi {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (lib, name) = open_library(path, HIPRTC_CANDIDATES)?;
        let n = name.as_str();
        Ok(Self {
            create_program: symbol(&lib, n, "hiprtcCreateProgram")?,
            compile_program: symbol(&lib, n, "hiprtcCompileProgram")?,
            get_program_log_size: symbol(&lib, n, "hiprtcGetProgramLogSize")?,
            get_program_log: symbol(&lib, n, "hiprtcGetProgramLog")?,
            get_code_size: symbol(&lib, n, "hiprtcGetCodeSize")?,
            get_code: symbol(&lib, n, "hiprtcGetCode")?,
            destroy_program: symbol(&lib, n, "hiprtcDestroyProgram")?,
            get_error_string: symbol(&lib, n, "hiprtcGetErrorString")?,
            library: name.clone(),
            _lib: lib,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_path_reports_library_name() {
        let path = Path::new("/nonexistent/rocm/libamdhip64.so");
        let err = HipApi::load(Some(path)).err().expect("load must fail");
        match err {
            RuntimeError::LibraryLoad { library, .. } => {
                assert_eq!(library, "/nonexistent/rocm/libamdhip64.so");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_candidate_list_is_rejected() {
        assert!(matches!(open_library(None, &[]), Err(RuntimeError::InvalidArgument(_))));
    }
}
