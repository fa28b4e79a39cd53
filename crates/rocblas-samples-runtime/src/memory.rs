//! Device allocations with guard bands, borrowed device views, and pinned
//! host buffers.
//!
//! [`DeviceVector`] pads every allocation with `pad` elements on both sides,
//! fills the padding with [`GUARD_BYTE`], and reads it back at release time.
//! Any library call that wrote outside its operand shows up as
//! [`RuntimeError::GuardCorrupted`].

use crate::error::{GuardSide, Result, RuntimeError, check_hip};
use crate::ffi::{
    HIP_HOST_MALLOC_DEFAULT, HIP_HOST_MALLOC_MAPPED, HIP_MEMCPY_DEVICE_TO_HOST,
    HIP_MEMCPY_HOST_TO_DEVICE, HipStream,
};
use crate::runtime::Runtime;
use crate::stream::Stream;
use bytemuck::Pod;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Range};
use tracing::{debug, error};

/// Sentinel written into the guard bands.
pub const GUARD_BYTE: u8 = 0xfe;

/// Guard elements on each side of a [`DeviceVector`] unless overridden.
pub const DEFAULT_GUARD_ELEMENTS: usize = 4096;

/// Allocation and transfer primitives for device memory.
///
/// [`Runtime`] implements this with `hipMalloc` / `hipMemcpy`; any other
/// implementation only has to provide byte-addressed storage.
pub trait DeviceMemory {
    fn allocate(&self, bytes: usize) -> Result<*mut c_void>;

    /// # Safety
    /// `ptr` must come from [`DeviceMemory::allocate`] on `self` and not be freed yet.
    unsafe fn free(&self, ptr: *mut c_void) -> Result<()>;

    /// # Safety
    /// `dst` must be valid device memory for `bytes`, `src` valid host memory for `bytes`.
    unsafe fn copy_to_device(&self, dst: *mut c_void, src: *const c_void, bytes: usize)
    -> Result<()>;

    /// # Safety
    /// `dst` must be valid host memory for `bytes`, `src` valid device memory for `bytes`.
    unsafe fn copy_to_host(&self, dst: *mut c_void, src: *const c_void, bytes: usize) -> Result<()>;

    /// # Safety
    /// As [`DeviceMemory::copy_to_device`], and `src` must stay valid until
    /// `stream` has been synchronised.
    unsafe fn copy_to_device_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        stream: HipStream,
    ) -> Result<()>;

    /// # Safety
    /// As [`DeviceMemory::copy_to_host`], and `dst` must stay valid and
    /// unaliased until `stream` has been synchronised.
    unsafe fn copy_to_host_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        stream: HipStream,
    ) -> Result<()>;
}

impl DeviceMemory for Runtime {
    fn allocate(&self, bytes: usize) -> Result<*mut c_void> {
        let mut ptr: *mut c_void = std::ptr::null_mut();
        let status = unsafe { (self.hip().malloc)(&mut ptr, bytes) };
        if status != 0 || ptr.is_null() {
            error!(bytes, gib = bytes >> 30, "hipMalloc failed");
            return Err(RuntimeError::Allocation { size: bytes });
        }
        Ok(ptr)
    }

    unsafe fn free(&self, ptr: *mut c_void) -> Result<()> {
        check_hip(unsafe { (self.hip().free)(ptr) }, "hipFree")
    }

    unsafe fn copy_to_device(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
    ) -> Result<()> {
        check_hip(
            unsafe { (self.hip().memcpy)(dst, src, bytes, HIP_MEMCPY_HOST_TO_DEVICE) },
            "hipMemcpy(H2D)",
        )
    }

    unsafe fn copy_to_host(&self, dst: *mut c_void, src: *const c_void, bytes: usize) -> Result<()> {
        check_hip(
            unsafe { (self.hip().memcpy)(dst, src, bytes, HIP_MEMCPY_DEVICE_TO_HOST) },
            "hipMemcpy(D2H)",
        )
    }

    unsafe fn copy_to_device_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        stream: HipStream,
    ) -> Result<()> {
        check_hip(
            unsafe { (self.hip().memcpy_async)(dst, src, bytes, HIP_MEMCPY_HOST_TO_DEVICE, stream) },
            "hipMemcpyAsync(H2D)",
        )
    }

    unsafe fn copy_to_host_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        stream: HipStream,
    ) -> Result<()> {
        check_hip(
            unsafe { (self.hip().memcpy_async)(dst, src, bytes, HIP_MEMCPY_DEVICE_TO_HOST, stream) },
            "hipMemcpyAsync(D2H)",
        )
    }
}

fn check_fits(what: &str, needed: usize, available: usize) -> Result<()> {
    if needed > available {
        return Err(RuntimeError::InvalidArgument(format!(
            "{what}: {needed} elements do not fit in a {available}-element device region"
        )));
    }
    Ok(())
}

// ── borrowed views ───────────────────────────────────────────────────

/// Read-only view of a device region.
#[derive(Clone, Copy)]
pub struct DeviceSlice<'a, T> {
    ptr: *const T,
    len: usize,
    memory: &'a dyn DeviceMemory,
}

impl<'a, T: Pod> DeviceSlice<'a, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Blocking copy of the first `dst.len()` elements to the host.
    pub fn copy_to_host(&self, dst: &mut [T]) -> Result<()> {
        check_fits("copy_to_host", dst.len(), self.len)?;
        if dst.is_empty() {
            return Ok(());
        }
        unsafe {
            self.memory.copy_to_host(
                dst.as_mut_ptr().cast(),
                self.ptr.cast(),
                std::mem::size_of_val(dst),
            )
        }
    }

    /// Queue a copy of the first `dst.len()` elements to the host on `stream`.
    ///
    /// # Safety
    /// `dst` must not be read, written or dropped until `stream` is synchronised.
    pub unsafe fn copy_to_host_async(&self, dst: &mut [T], stream: &Stream) -> Result<()> {
        check_fits("copy_to_host_async", dst.len(), self.len)?;
        if dst.is_empty() {
            return Ok(());
        }
        unsafe {
            self.memory.copy_to_host_async(
                dst.as_mut_ptr().cast(),
                self.ptr.cast(),
                std::mem::size_of_val(dst),
                stream.raw(),
            )
        }
    }
}

/// Mutable view of a device region.
pub struct DeviceSliceMut<'a, T> {
    ptr: *mut T,
    len: usize,
    memory: &'a dyn DeviceMemory,
}

impl<'a, T: Pod> DeviceSliceMut<'a, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Read-only reborrow.
    pub fn as_slice(&self) -> DeviceSlice<'_, T> {
        DeviceSlice { ptr: self.ptr, len: self.len, memory: self.memory }
    }

    /// Blocking copy of `src` into the start of the region.
    pub fn copy_from_host(&mut self, src: &[T]) -> Result<()> {
        check_fits("copy_from_host", src.len(), self.len)?;
        if src.is_empty() {
            return Ok(());
        }
        unsafe {
            self.memory.copy_to_device(
                self.ptr.cast(),
                src.as_ptr().cast(),
                std::mem::size_of_val(src),
            )
        }
    }

    /// Queue a copy of `src` into the start of the region on `stream`.
    ///
    /// # Safety
    /// `src` must stay alive and unmodified until `stream` is synchronised.
    pub unsafe fn copy_from_host_async(&mut self, src: &[T], stream: &Stream) -> Result<()> {
        check_fits("copy_from_host_async", src.len(), self.len)?;
        if src.is_empty() {
            return Ok(());
        }
        unsafe {
            self.memory.copy_to_device_async(
                self.ptr.cast(),
                src.as_ptr().cast(),
                std::mem::size_of_val(src),
                stream.raw(),
            )
        }
    }

    pub fn copy_to_host(&self, dst: &mut [T]) -> Result<()> {
        self.as_slice().copy_to_host(dst)
    }

    /// # Safety
    /// See [`DeviceSlice::copy_to_host_async`].
    pub unsafe fn copy_to_host_async(&self, dst: &mut [T], stream: &Stream) -> Result<()> {
        unsafe { self.as_slice().copy_to_host_async(dst, stream) }
    }
}

// ── guard-banded allocation ──────────────────────────────────────────

/// Device buffer of `len` elements surrounded by guard bands.
pub struct DeviceVector<T: Pod, M: DeviceMemory = Runtime> {
    memory: M,
    base: *mut c_void,
    len: usize,
    pad: usize,
    released: bool,
    _marker: PhantomData<T>,
}

impl<T: Pod, M: DeviceMemory + Clone> DeviceVector<T, M> {
    /// Allocate `len` elements with [`DEFAULT_GUARD_ELEMENTS`] of padding on each side.
    pub fn new(memory: &M, len: usize) -> Result<Self> {
        Self::with_guard(memory, len, DEFAULT_GUARD_ELEMENTS)
    }

    /// Allocate `len` elements with `pad` guard elements on each side. A
    /// `pad` of zero gives a plain allocation.
    pub fn with_guard(memory: &M, len: usize, pad: usize) -> Result<Self> {
        let elem = std::mem::size_of::<T>();
        let bytes = len
            .checked_add(pad.checked_mul(2).ok_or(RuntimeError::Allocation { size: usize::MAX })?)
            .and_then(|n| n.checked_mul(elem))
            .ok_or(RuntimeError::Allocation { size: usize::MAX })?;

        let mut vector = Self {
            memory: memory.clone(),
            base: std::ptr::null_mut(),
            len,
            pad,
            released: false,
            _marker: PhantomData,
        };
        if bytes == 0 {
            return Ok(vector);
        }

        vector.base = memory.allocate(bytes)?;
        debug!(len, pad, bytes, "allocated guarded device buffer");

        if pad > 0 {
            let guard = vec![GUARD_BYTE; pad * elem];
            for side in [GuardSide::Front, GuardSide::Back] {
                let dst = vector.guard_ptr(side);
                // On failure the partially initialised vector is dropped, which frees it.
                unsafe { memory.copy_to_device(dst, guard.as_ptr().cast(), guard.len())? };
            }
        }
        Ok(vector)
    }
}

impl<T: Pod, M: DeviceMemory> DeviceVector<T, M> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Guard elements on each side.
    pub fn guard_elements(&self) -> usize {
        self.pad
    }

    fn data_ptr(&self) -> *mut T {
        if self.base.is_null() {
            return std::ptr::null_mut();
        }
        self.base.cast::<T>().wrapping_add(self.pad)
    }

    fn guard_ptr(&self, side: GuardSide) -> *mut c_void {
        let offset = match side {
            GuardSide::Front => 0,
            GuardSide::Back => self.pad + self.len,
        };
        self.base.cast::<T>().wrapping_add(offset).cast()
    }

    pub fn as_ptr(&self) -> *const T {
        self.data_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data_ptr()
    }

    pub fn as_slice(&self) -> DeviceSlice<'_, T> {
        DeviceSlice { ptr: self.data_ptr(), len: self.len, memory: &self.memory }
    }

    pub fn as_slice_mut(&mut self) -> DeviceSliceMut<'_, T> {
        DeviceSliceMut { ptr: self.data_ptr(), len: self.len, memory: &self.memory }
    }

    /// View of `range` within the user region.
    pub fn slice(&self, range: Range<usize>) -> Result<DeviceSlice<'_, T>> {
        self.check_range(&range)?;
        Ok(DeviceSlice {
            ptr: self.data_ptr().wrapping_add(range.start),
            len: range.len(),
            memory: &self.memory,
        })
    }

    /// Mutable view of `range` within the user region.
    pub fn slice_mut(&mut self, range: Range<usize>) -> Result<DeviceSliceMut<'_, T>> {
        self.check_range(&range)?;
        Ok(DeviceSliceMut {
            ptr: self.data_ptr().wrapping_add(range.start),
            len: range.len(),
            memory: &self.memory,
        })
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.len {
            return Err(RuntimeError::InvalidArgument(format!(
                "range {}..{} outside {}-element device buffer",
                range.start, range.end, self.len
            )));
        }
        Ok(())
    }

    /// Blocking copy of `src` into the start of the buffer.
    pub fn copy_from_host(&mut self, src: &[T]) -> Result<()> {
        self.as_slice_mut().copy_from_host(src)
    }

    /// Blocking copy of the start of the buffer into `dst`.
    pub fn copy_to_host(&self, dst: &mut [T]) -> Result<()> {
        self.as_slice().copy_to_host(dst)
    }

    /// Queue a copy of `src` to element `offset` on `stream`.
    ///
    /// # Safety
    /// `src` must stay alive and unmodified until `stream` is synchronised.
    pub unsafe fn copy_from_host_async_at(
        &mut self,
        offset: usize,
        src: &[T],
        stream: &Stream,
    ) -> Result<()> {
        let end = offset.saturating_add(src.len());
        let mut view = self.slice_mut(offset..end)?;
        unsafe { view.copy_from_host_async(src, stream) }
    }

    /// Queue a copy from element `offset` into `dst` on `stream`.
    ///
    /// # Safety
    /// `dst` must not be accessed until `stream` is synchronised.
    pub unsafe fn copy_to_host_async_at(
        &self,
        offset: usize,
        dst: &mut [T],
        stream: &Stream,
    ) -> Result<()> {
        let end = offset.saturating_add(dst.len());
        let view = self.slice(offset..end)?;
        unsafe { view.copy_to_host_async(dst, stream) }
    }

    /// Read both guard bands back and check they still hold [`GUARD_BYTE`].
    pub fn verify_guards(&self) -> Result<()> {
        if self.base.is_null() || self.pad == 0 {
            return Ok(());
        }
        let mut host = vec![0u8; self.pad * std::mem::size_of::<T>()];
        for side in [GuardSide::Front, GuardSide::Back] {
            unsafe {
                self.memory.copy_to_host(host.as_mut_ptr().cast(), self.guard_ptr(side), host.len())?
            };
            if host.iter().any(|&b| b != GUARD_BYTE) {
                return Err(RuntimeError::GuardCorrupted { side, len: self.len });
            }
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        if self.released || self.base.is_null() {
            self.released = true;
            return Ok(());
        }
        self.released = true;
        let guards = self.verify_guards();
        let freed = unsafe { self.memory.free(self.base) };
        self.base = std::ptr::null_mut();
        guards.and(freed)
    }

    /// Verify the guard bands and free the allocation.
    pub fn release(mut self) -> Result<()> {
        self.teardown()
    }
}

impl<T: Pod, M: DeviceMemory> Drop for DeviceVector<T, M> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            error!(error = %e, len = self.len, "device buffer teardown failed");
        }
    }
}

// ── pinned host memory ───────────────────────────────────────────────

/// Page-locked host allocation, required for truly asynchronous transfers.
pub struct PinnedHostBuffer<T: Pod> {
    runtime: Runtime,
    ptr: *mut T,
    len: usize,
}

impl<T: Pod> PinnedHostBuffer<T> {
    /// Allocate `len` zeroed elements. `mapped` also maps the buffer into
    /// the device address space.
    pub fn new(runtime: &Runtime, len: usize, mapped: bool) -> Result<Self> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(RuntimeError::Allocation { size: usize::MAX })?;
        if bytes == 0 {
            return Ok(Self { runtime: runtime.clone(), ptr: std::ptr::NonNull::dangling().as_ptr(), len: 0 });
        }
        let flags = if mapped { HIP_HOST_MALLOC_MAPPED } else { HIP_HOST_MALLOC_DEFAULT };
        let mut raw: *mut c_void = std::ptr::null_mut();
        let status = unsafe { (runtime.hip().host_malloc)(&mut raw, bytes, flags) };
        if status != 0 || raw.is_null() {
            return Err(RuntimeError::Allocation { size: bytes });
        }
        // SAFETY: freshly allocated, `bytes` long; all-zero is a valid `T: Pod`.
        unsafe { std::ptr::write_bytes(raw.cast::<u8>(), 0, bytes) };
        debug!(bytes, mapped, "allocated pinned host buffer");
        Ok(Self { runtime: runtime.clone(), ptr: raw.cast(), len })
    }
}

impl<T: Pod> Deref for PinnedHostBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl<T: Pod> DerefMut for PinnedHostBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl<T: Pod> Drop for PinnedHostBuffer<T> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        let status = unsafe { (self.runtime.hip().host_free)(self.ptr.cast()) };
        if let Err(e) = check_hip(status, "hipHostFree") {
            error!(error = %e, "failed to free pinned host buffer");
        }
    }
}
