//! Guard-band behaviour of `DeviceVector`, exercised through a host-memory
//! implementation of `DeviceMemory`. No GPU or ROCm install required.

use rocblas_samples_runtime::error::GuardSide;
use rocblas_samples_runtime::ffi::HipStream;
use rocblas_samples_runtime::memory::{DEFAULT_GUARD_ELEMENTS, GUARD_BYTE};
use rocblas_samples_runtime::{DeviceMemory, DeviceVector, Result, RuntimeError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;

/// "Device" memory backed by `u64` host allocations (8-byte aligned).
#[derive(Clone, Default)]
struct HostMemory {
    live: Rc<RefCell<HashMap<usize, usize>>>,
}

impl HostMemory {
    fn live_allocations(&self) -> usize {
        self.live.borrow().len()
    }
}

impl DeviceMemory for HostMemory {
    fn allocate(&self, bytes: usize) -> Result<*mut c_void> {
        let words = bytes.div_ceil(8);
        let boxed = vec![0u64; words].into_boxed_slice();
        let ptr = Box::into_raw(boxed) as *mut u64;
        self.live.borrow_mut().insert(ptr as usize, words);
        Ok(ptr.cast())
    }

    unsafe fn free(&self, ptr: *mut c_void) -> Result<()> {
        let words = self
            .live
            .borrow_mut()
            .remove(&(ptr as usize))
            .ok_or_else(|| RuntimeError::InvalidArgument("double free".into()))?;
        let slice = std::ptr::slice_from_raw_parts_mut(ptr.cast::<u64>(), words);
        drop(unsafe { Box::from_raw(slice) });
        Ok(())
    }

    unsafe fn copy_to_device(&self, dst: *mut c_void, src: *const c_void, bytes: usize) -> Result<()> {
        unsafe { std::ptr::copy_nonoverlapping(src.cast::<u8>(), dst.cast::<u8>(), bytes) };
        Ok(())
    }

    unsafe fn copy_to_host(&self, dst: *mut c_void, src: *const c_void, bytes: usize) -> Result<()> {
        unsafe { std::ptr::copy_nonoverlapping(src.cast::<u8>(), dst.cast::<u8>(), bytes) };
        Ok(())
    }

    unsafe fn copy_to_device_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        _stream: HipStream,
    ) -> Result<()> {
        unsafe { self.copy_to_device(dst, src, bytes) }
    }

    unsafe fn copy_to_host_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        _stream: HipStream,
    ) -> Result<()> {
        unsafe { self.copy_to_host(dst, src, bytes) }
    }
}

// ── allocation lifecycle ────────────────────────────────────────

#[test]
fn untouched_buffer_releases_cleanly() {
    let mem = HostMemory::default();
    let v = DeviceVector::<f32, _>::new(&mem, 16).unwrap();
    assert_eq!(v.len(), 16);
    assert_eq!(v.guard_elements(), DEFAULT_GUARD_ELEMENTS);
    assert_eq!(mem.live_allocations(), 1);
    v.release().unwrap();
    assert_eq!(mem.live_allocations(), 0);
}

#[test]
fn drop_without_release_still_frees() {
    let mem = HostMemory::default();
    {
        let _v = DeviceVector::<f64, _>::with_guard(&mem, 8, 4).unwrap();
        assert_eq!(mem.live_allocations(), 1);
    }
    assert_eq!(mem.live_allocations(), 0);
}

#[test]
fn empty_unguarded_buffer_allocates_nothing() {
    let mem = HostMemory::default();
    let v = DeviceVector::<f32, _>::with_guard(&mem, 0, 0).unwrap();
    assert!(v.is_empty());
    assert_eq!(mem.live_allocations(), 0);
    v.release().unwrap();
}

#[test]
fn guard_bands_hold_sentinel_byte() {
    let mem = HostMemory::default();
    let v = DeviceVector::<i32, _>::with_guard(&mem, 3, 2).unwrap();
    let front = v.as_ptr().wrapping_sub(2).cast::<u8>();
    let bytes = unsafe { std::slice::from_raw_parts(front, 2 * 4) };
    assert!(bytes.iter().all(|&b| b == GUARD_BYTE));
    v.release().unwrap();
}

// ── data movement ───────────────────────────────────────────────

#[test]
fn host_data_round_trips() {
    let mem = HostMemory::default();
    let mut v = DeviceVector::<f32, _>::with_guard(&mem, 4, 16).unwrap();
    v.copy_from_host(&[1.0, -2.0, 3.5, 4.0]).unwrap();
    let mut out = [0.0f32; 4];
    v.copy_to_host(&mut out).unwrap();
    assert_eq!(out, [1.0, -2.0, 3.5, 4.0]);
    v.release().unwrap();
}

#[test]
fn oversized_copy_is_rejected_before_touching_memory() {
    let mem = HostMemory::default();
    let mut v = DeviceVector::<f32, _>::with_guard(&mem, 2, 4).unwrap();
    let err = v.copy_from_host(&[0.0; 3]).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    v.release().unwrap();
}

#[test]
fn slices_address_the_requested_range() {
    let mem = HostMemory::default();
    let mut v = DeviceVector::<i32, _>::with_guard(&mem, 6, 4).unwrap();
    v.copy_from_host(&[0, 1, 2, 3, 4, 5]).unwrap();

    v.slice_mut(2..4).unwrap().copy_from_host(&[20, 30]).unwrap();
    let mut out = [0i32; 3];
    v.slice(3..6).unwrap().copy_to_host(&mut out).unwrap();
    assert_eq!(out, [30, 4, 5]);

    assert!(v.slice(4..7).is_err());
    v.release().unwrap();
}

#[test]
fn write_past_the_end_is_reported() {
    let mem = HostMemory::default();
    let mut v = DeviceVector::<f32, _>::with_guard(&mem, 8, 4).unwrap();
    // Simulate a kernel writing one element too many.
    unsafe { v.as_mut_ptr().add(8).write(1.0) };
    let err = v.release().unwrap_err();
    assert!(
        matches!(err, RuntimeError::GuardCorrupted { side: GuardSide::Back, len: 8 }),
        "unexpected error: {err}"
    );
    assert_eq!(mem.live_allocations(), 0, "corrupted buffer must still be freed");
}

#[test]
fn write_before_the_start_is_reported() {
    let mem = HostMemory::default();
    let mut v = DeviceVector::<f64, _>::with_guard(&mem, 8, 4).unwrap();
    unsafe { v.as_mut_ptr().sub(1).write(0.0) };
    let err = v.verify_guards().unwrap_err();
    assert!(matches!(err, RuntimeError::GuardCorrupted { side: GuardSide::Front, .. }));
    assert!(v.release().is_err());
}

#[test]
fn writes_inside_the_region_leave_guards_intact() {
    let mem = HostMemory::default();
    let mut v = DeviceVector::<f32, _>::with_guard(&mem, 8, 4).unwrap();
    for i in 0..8 {
        unsafe { v.as_mut_ptr().add(i).write(f32::from_bits(0xfefe_fefe)) };
    }
    unsafe { v.as_mut_ptr().add(7).write(-1.0) };
    v.verify_guards().unwrap();
    v.release().unwrap();
}
