//! `rocblas-samples-runtime` — the HIP / rocBLAS boundary used by the samples.
//!
//! Everything is resolved at run time from the vendor shared libraries, so
//! the crate builds without ROCm installed:
//!
//! | Module    | Covers                                                     |
//! |-----------|------------------------------------------------------------|
//! | `ffi`     | Symbol tables for HIP, rocBLAS and HIP-RTC                 |
//! | `runtime` | Shared, clonable owner of the loaded libraries             |
//! | `device`  | Device enumeration                                         |
//! | `memory`  | Guard-banded device buffers, device views, pinned memory   |
//! | `blas`    | rocBLAS handle and typed Level 1/2/3 routines              |
//! | `stream`  | HIP streams                                                |
//! | `timer`   | HIP event and wall-clock timers                            |
//! | `kernel`  | HIP-RTC compilation and kernel launch                      |
//! | `kernels` | Embedded `.hip` sources                                    |
//!
//! # Usage
//!
//! ```rust,no_run
//! use rocblas_samples_runtime::{DeviceVector, Handle, LibraryPaths, Runtime};
//!
//! # fn main() -> rocblas_samples_runtime::Result<()> {
//! let rt = Runtime::load(&LibraryPaths::default())?;
//! let handle = Handle::new(&rt)?;
//! let mut x = DeviceVector::<f32>::new(&rt, 4)?;
//! let mut y = DeviceVector::<f32>::new(&rt, 4)?;
//! x.copy_from_host(&[1.0, 2.0, 3.0, 4.0])?;
//! y.copy_from_host(&[1.0; 4])?;
//! handle.saxpy(4, 2.0, &x.as_slice(), 1, &mut y.as_slice_mut(), 1)?;
//! let mut out = [0.0f32; 4];
//! y.copy_to_host(&mut out)?;
//! # Ok(())
//! # }
//! ```

pub mod blas;
pub mod device;
pub mod error;
pub mod ffi;
pub mod kernel;
pub mod kernels;
pub mod memory;
pub mod runtime;
pub mod stream;
pub mod timer;

pub use blas::{
    BlasDatatype, Datatype, Diagonal, Fill, GemmAlgo, GemmFlags, Handle, Operation, PointerMode,
    get_matrix_async, get_vector, set_matrix_async, set_vector,
};
pub use device::{RocmDeviceInfo, enumerate_devices};
pub use error::{BlasStatus, HipErrorCode, Result, RuntimeError};
pub use ffi::LibraryPaths;
pub use kernel::{LaunchConfig, Module};
pub use kernels::HipKernelSource;
pub use memory::{DeviceMemory, DeviceSlice, DeviceSliceMut, DeviceVector, PinnedHostBuffer};
pub use runtime::Runtime;
pub use stream::Stream;
pub use timer::{CpuTimer, GpuTimer};
