//! Typed rocBLAS handle and routine wrappers.
//!
//! Every routine checks operand lengths against BLAS geometry before the
//! call reaches the library, so a mis-sized buffer is reported as
//! [`RuntimeError::InvalidArgument`] rather than as a guard-band failure.

use crate::error::{Result, RuntimeError, check_blas};
use crate::ffi::{BlasHandle, HipStream};
use crate::memory::{DeviceSlice, DeviceSliceMut};
use crate::runtime::Runtime;
use crate::stream::Stream;
use bytemuck::Pod;
use num_complex::Complex32;
use std::ffi::{c_int, c_void};
use tracing::{debug, warn};

// ── enums ────────────────────────────────────────────────────────────

/// `rocblas_operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Operation {
    None = 111,
    Transpose = 112,
    ConjugateTranspose = 113,
}

/// `rocblas_fill`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Fill {
    Upper = 121,
    Lower = 122,
    Full = 123,
}

/// `rocblas_diagonal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Diagonal {
    NonUnit = 131,
    Unit = 132,
}

/// `rocblas_pointer_mode`: where scalar arguments and results live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum PointerMode {
    #[default]
    Host = 0,
    Device = 1,
}

/// `rocblas_datatype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Datatype {
    F16R = 150,
    F32R = 151,
    F64R = 152,
    F16C = 153,
    F32C = 154,
    F64C = 155,
    I8R = 160,
    U8R = 161,
    I32R = 162,
    U32R = 163,
    Bf16R = 168,
}

/// `rocblas_gemm_algo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum GemmAlgo {
    #[default]
    Standard = 0,
}

/// `rocblas_gemm_flags` bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GemmFlags(pub u32);

impl GemmFlags {
    pub const NONE: Self = Self(0);
}

macro_rules! raw_enum {
    ($($ty:ty),*) => {$(
        impl $ty {
            pub fn raw(self) -> c_int {
                self as c_int
            }
        }
    )*};
}

raw_enum!(Operation, Fill, Diagonal, PointerMode, Datatype, GemmAlgo);

/// Rust element types with a rocBLAS datatype code.
pub trait BlasDatatype: Pod {
    const DATATYPE: Datatype;
}

impl BlasDatatype for f32 {
    const DATATYPE: Datatype = Datatype::F32R;
}

impl BlasDatatype for f64 {
    const DATATYPE: Datatype = Datatype::F64R;
}

impl BlasDatatype for i8 {
    const DATATYPE: Datatype = Datatype::I8R;
}

impl BlasDatatype for i32 {
    const DATATYPE: Datatype = Datatype::I32R;
}

impl BlasDatatype for Complex32 {
    const DATATYPE: Datatype = Datatype::F32C;
}

// ── operand geometry ─────────────────────────────────────────────────

/// Shortest buffer a routine touches for `n` elements at increment `inc`.
pub fn vector_min_len(n: i32, inc: i32) -> usize {
    if n <= 0 {
        return 0;
    }
    1 + (n as usize - 1) * inc.unsigned_abs() as usize
}

/// Shortest column-major buffer holding a `rows × cols` operand with
/// leading dimension `ld`.
pub fn matrix_min_len(rows: i32, cols: i32, ld: i32) -> Result<usize> {
    if rows < 0 || cols < 0 {
        return Err(RuntimeError::InvalidArgument(format!(
            "negative matrix dimensions {rows}x{cols}"
        )));
    }
    if ld < rows.max(1) {
        return Err(RuntimeError::InvalidArgument(format!(
            "leading dimension {ld} smaller than max(1, {rows})"
        )));
    }
    if rows == 0 || cols == 0 {
        return Ok(0);
    }
    Ok(ld as usize * (cols as usize - 1) + rows as usize)
}

/// Stored `(rows, cols)` of an operand whose logical shape after `op` is
/// `rows × cols`.
pub fn stored_shape(op: Operation, rows: i32, cols: i32) -> (i32, i32) {
    match op {
        Operation::None => (rows, cols),
        Operation::Transpose | Operation::ConjugateTranspose => (cols, rows),
    }
}

fn check_len(routine: &'static str, operand: &str, needed: usize, len: usize) -> Result<()> {
    if needed > len {
        return Err(RuntimeError::InvalidArgument(format!(
            "{routine}: operand {operand} needs {needed} elements, buffer has {len}"
        )));
    }
    Ok(())
}

fn check_vector(routine: &'static str, operand: &str, n: i32, inc: i32, len: usize) -> Result<()> {
    check_len(routine, operand, vector_min_len(n, inc), len)
}

fn check_matrix(
    routine: &'static str,
    operand: &str,
    rows: i32,
    cols: i32,
    ld: i32,
    len: usize,
) -> Result<()> {
    check_len(routine, operand, matrix_min_len(rows, cols, ld)?, len)
}

fn check_batched(
    routine: &'static str,
    operand: &str,
    single: usize,
    stride: i64,
    count: i32,
    len: usize,
) -> Result<()> {
    if stride < 0 || count < 0 {
        return Err(RuntimeError::InvalidArgument(format!(
            "{routine}: negative stride or batch count for {operand}"
        )));
    }
    let needed = match count {
        0 => Some(0),
        c => usize::try_from(stride)
            .ok()
            .and_then(|stride| stride.checked_mul(c as usize - 1))
            .and_then(|span| span.checked_add(single)),
    };
    let Some(needed) = needed else {
        return Err(RuntimeError::InvalidArgument(format!(
            "{routine}: stride {stride} x batch count {count} for {operand} overflows"
        )));
    };
    check_len(routine, operand, needed, len)
}

// ── handle ───────────────────────────────────────────────────────────

/// A rocBLAS handle, destroyed on drop.
///
/// Not `Send`: each host thread creates its own, after binding its device.
pub struct Handle {
    runtime: Runtime,
    raw: BlasHandle,
    pointer_mode: PointerMode,
}

impl Handle {
    pub fn new(runtime: &Runtime) -> Result<Self> {
        let mut raw: BlasHandle = std::ptr::null_mut();
        check_blas(unsafe { (runtime.blas().create_handle)(&mut raw) }, "rocblas_create_handle")?;
        debug!(handle = ?raw, "created rocBLAS handle");
        Ok(Self { runtime: runtime.clone(), raw, pointer_mode: PointerMode::Host })
    }

    pub fn raw(&self) -> BlasHandle {
        self.raw
    }

    pub fn set_pointer_mode(&mut self, mode: PointerMode) -> Result<()> {
        check_blas(
            unsafe { (self.runtime.blas().set_pointer_mode)(self.raw, mode.raw()) },
            "rocblas_set_pointer_mode",
        )?;
        self.pointer_mode = mode;
        Ok(())
    }

    pub fn pointer_mode(&self) -> PointerMode {
        self.pointer_mode
    }

    /// Route subsequent calls on this handle through `stream`.
    pub fn set_stream(&mut self, stream: &Stream) -> Result<()> {
        check_blas(
            unsafe { (self.runtime.blas().set_stream)(self.raw, stream.raw()) },
            "rocblas_set_stream",
        )
    }

    /// The stream this handle currently dispatches to, not owned.
    pub fn stream(&self) -> Result<Stream> {
        let mut raw: HipStream = std::ptr::null_mut();
        check_blas(
            unsafe { (self.runtime.blas().get_stream)(self.raw, &mut raw) },
            "rocblas_get_stream",
        )?;
        Ok(Stream::borrowed(&self.runtime, raw))
    }

    fn require_host_scalars(&self, routine: &'static str) -> Result<()> {
        if self.pointer_mode != PointerMode::Host {
            return Err(RuntimeError::InvalidArgument(format!(
                "{routine}: host scalars need host pointer mode"
            )));
        }
        Ok(())
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        let status = unsafe { (self.runtime.blas().destroy_handle)(self.raw) };
        if let Err(e) = check_blas(status, "rocblas_destroy_handle") {
            warn!(error = %e, "failed to destroy rocBLAS handle");
        }
    }
}

// ── Level 1 ──────────────────────────────────────────────────────────

impl Handle {
    /// `y = alpha * x + y`.
    pub fn saxpy(
        &self,
        n: i32,
        alpha: f32,
        x: &DeviceSlice<'_, f32>,
        incx: i32,
        y: &mut DeviceSliceMut<'_, f32>,
        incy: i32,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_saxpy")?;
        check_vector("rocblas_saxpy", "x", n, incx, x.len())?;
        check_vector("rocblas_saxpy", "y", n, incy, y.len())?;
        debug!(n, alpha, incx, incy, "rocblas_saxpy");
        check_blas(
            unsafe {
                (self.runtime.blas().saxpy)(self.raw, n, &alpha, x.as_ptr(), incx, y.as_mut_ptr(), incy)
            },
            "rocblas_saxpy",
        )
    }

    /// Dot product written to a host scalar. Blocks until the result is ready.
    pub fn sdot(
        &self,
        n: i32,
        x: &DeviceSlice<'_, f32>,
        incx: i32,
        y: &DeviceSlice<'_, f32>,
        incy: i32,
    ) -> Result<f32> {
        self.require_host_scalars("rocblas_sdot")?;
        check_vector("rocblas_sdot", "x", n, incx, x.len())?;
        check_vector("rocblas_sdot", "y", n, incy, y.len())?;
        debug!(n, incx, incy, "rocblas_sdot");
        let mut result = 0.0f32;
        check_blas(
            unsafe {
                (self.runtime.blas().sdot)(self.raw, n, x.as_ptr(), incx, y.as_ptr(), incy, &mut result)
            },
            "rocblas_sdot",
        )?;
        Ok(result)
    }

    /// Euclidean norm written to a host scalar.
    pub fn snrm2(&self, n: i32, x: &DeviceSlice<'_, f32>, incx: i32) -> Result<f32> {
        self.require_host_scalars("rocblas_snrm2")?;
        check_vector("rocblas_snrm2", "x", n, incx, x.len())?;
        debug!(n, incx, "rocblas_snrm2");
        let mut result = 0.0f32;
        check_blas(
            unsafe { (self.runtime.blas().snrm2)(self.raw, n, x.as_ptr(), incx, &mut result) },
            "rocblas_snrm2",
        )?;
        Ok(result)
    }

    /// `x = alpha * x`.
    pub fn dscal(&self, n: i32, alpha: f64, x: &mut DeviceSliceMut<'_, f64>, incx: i32) -> Result<()> {
        self.require_host_scalars("rocblas_dscal")?;
        check_vector("rocblas_dscal", "x", n, incx, x.len())?;
        debug!(n, alpha, incx, "rocblas_dscal");
        check_blas(
            unsafe { (self.runtime.blas().dscal)(self.raw, n, &alpha, x.as_mut_ptr(), incx) },
            "rocblas_dscal",
        )
    }

    /// Exchange `x` and `y`.
    pub fn sswap(
        &self,
        n: i32,
        x: &mut DeviceSliceMut<'_, f32>,
        incx: i32,
        y: &mut DeviceSliceMut<'_, f32>,
        incy: i32,
    ) -> Result<()> {
        check_vector("rocblas_sswap", "x", n, incx, x.len())?;
        check_vector("rocblas_sswap", "y", n, incy, y.len())?;
        debug!(n, incx, incy, "rocblas_sswap");
        check_blas(
            unsafe {
                (self.runtime.blas().sswap)(self.raw, n, x.as_mut_ptr(), incx, y.as_mut_ptr(), incy)
            },
            "rocblas_sswap",
        )
    }
}

// ── Level 2 ──────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
impl Handle {
    /// `y = alpha * op(A) * x + beta * y` with `A` stored `m × n`.
    pub fn sgemv(
        &self,
        trans: Operation,
        m: i32,
        n: i32,
        alpha: f32,
        a: &DeviceSlice<'_, f32>,
        lda: i32,
        x: &DeviceSlice<'_, f32>,
        incx: i32,
        beta: f32,
        y: &mut DeviceSliceMut<'_, f32>,
        incy: i32,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_sgemv")?;
        let (x_len, y_len) = match trans {
            Operation::None => (n, m),
            _ => (m, n),
        };
        check_matrix("rocblas_sgemv", "A", m, n, lda, a.len())?;
        check_vector("rocblas_sgemv", "x", x_len, incx, x.len())?;
        check_vector("rocblas_sgemv", "y", y_len, incy, y.len())?;
        debug!(?trans, m, n, lda, incx, incy, "rocblas_sgemv");
        check_blas(
            unsafe {
                (self.runtime.blas().sgemv)(
                    self.raw,
                    trans.raw(),
                    m,
                    n,
                    &alpha,
                    a.as_ptr(),
                    lda,
                    x.as_ptr(),
                    incx,
                    &beta,
                    y.as_mut_ptr(),
                    incy,
                )
            },
            "rocblas_sgemv",
        )
    }

    /// Symmetric `y = alpha * A * x + beta * y`, reading the `uplo` triangle of `A`.
    pub fn ssymv(
        &self,
        uplo: Fill,
        n: i32,
        alpha: f32,
        a: &DeviceSlice<'_, f32>,
        lda: i32,
        x: &DeviceSlice<'_, f32>,
        incx: i32,
        beta: f32,
        y: &mut DeviceSliceMut<'_, f32>,
        incy: i32,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_ssymv")?;
        check_matrix("rocblas_ssymv", "A", n, n, lda, a.len())?;
        check_vector("rocblas_ssymv", "x", n, incx, x.len())?;
        check_vector("rocblas_ssymv", "y", n, incy, y.len())?;
        debug!(?uplo, n, lda, incx, incy, "rocblas_ssymv");
        check_blas(
            unsafe {
                (self.runtime.blas().ssymv)(
                    self.raw,
                    uplo.raw(),
                    n,
                    &alpha,
                    a.as_ptr(),
                    lda,
                    x.as_ptr(),
                    incx,
                    &beta,
                    y.as_mut_ptr(),
                    incy,
                )
            },
            "rocblas_ssymv",
        )
    }

    /// Hermitian rank-1 update `A = alpha * x * x^H + A` on the `uplo` triangle.
    pub fn cher(
        &self,
        uplo: Fill,
        n: i32,
        alpha: f32,
        x: &DeviceSlice<'_, Complex32>,
        incx: i32,
        a: &mut DeviceSliceMut<'_, Complex32>,
        lda: i32,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_cher")?;
        check_vector("rocblas_cher", "x", n, incx, x.len())?;
        check_matrix("rocblas_cher", "A", n, n, lda, a.len())?;
        debug!(?uplo, n, alpha, incx, lda, "rocblas_cher");
        check_blas(
            unsafe {
                (self.runtime.blas().cher)(
                    self.raw,
                    uplo.raw(),
                    n,
                    &alpha,
                    x.as_ptr(),
                    incx,
                    a.as_mut_ptr(),
                    lda,
                )
            },
            "rocblas_cher",
        )
    }

    /// Triangular `x = op(A) * x`.
    pub fn ctrmv(
        &self,
        uplo: Fill,
        trans: Operation,
        diag: Diagonal,
        n: i32,
        a: &DeviceSlice<'_, Complex32>,
        lda: i32,
        x: &mut DeviceSliceMut<'_, Complex32>,
        incx: i32,
    ) -> Result<()> {
        check_matrix("rocblas_ctrmv", "A", n, n, lda, a.len())?;
        check_vector("rocblas_ctrmv", "x", n, incx, x.len())?;
        debug!(?uplo, ?trans, ?diag, n, lda, incx, "rocblas_ctrmv");
        check_blas(
            unsafe {
                (self.runtime.blas().ctrmv)(
                    self.raw,
                    uplo.raw(),
                    trans.raw(),
                    diag.raw(),
                    n,
                    a.as_ptr(),
                    lda,
                    x.as_mut_ptr(),
                    incx,
                )
            },
            "rocblas_ctrmv",
        )
    }
}

// ── Level 3 ──────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
impl Handle {
    /// `C = alpha * op(A) * op(B) + beta * C` with `op(A)` of shape `m × k`.
    pub fn sgemm(
        &self,
        trans_a: Operation,
        trans_b: Operation,
        m: i32,
        n: i32,
        k: i32,
        alpha: f32,
        a: &DeviceSlice<'_, f32>,
        lda: i32,
        b: &DeviceSlice<'_, f32>,
        ldb: i32,
        beta: f32,
        c: &mut DeviceSliceMut<'_, f32>,
        ldc: i32,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_sgemm")?;
        let (ar, ac) = stored_shape(trans_a, m, k);
        let (br, bc) = stored_shape(trans_b, k, n);
        check_matrix("rocblas_sgemm", "A", ar, ac, lda, a.len())?;
        check_matrix("rocblas_sgemm", "B", br, bc, ldb, b.len())?;
        check_matrix("rocblas_sgemm", "C", m, n, ldc, c.len())?;
        debug!(?trans_a, ?trans_b, m, n, k, lda, ldb, ldc, "rocblas_sgemm");
        check_blas(
            unsafe {
                (self.runtime.blas().sgemm)(
                    self.raw,
                    trans_a.raw(),
                    trans_b.raw(),
                    m,
                    n,
                    k,
                    &alpha,
                    a.as_ptr(),
                    lda,
                    b.as_ptr(),
                    ldb,
                    &beta,
                    c.as_mut_ptr(),
                    ldc,
                )
            },
            "rocblas_sgemm",
        )
    }

    /// `batch_count` independent GEMMs whose operands sit `stride_*`
    /// elements apart in the same buffers.
    pub fn sgemm_strided_batched(
        &self,
        trans_a: Operation,
        trans_b: Operation,
        m: i32,
        n: i32,
        k: i32,
        alpha: f32,
        a: &DeviceSlice<'_, f32>,
        lda: i32,
        stride_a: i64,
        b: &DeviceSlice<'_, f32>,
        ldb: i32,
        stride_b: i64,
        beta: f32,
        c: &mut DeviceSliceMut<'_, f32>,
        ldc: i32,
        stride_c: i64,
        batch_count: i32,
    ) -> Result<()> {
        const ROUTINE: &str = "rocblas_sgemm_strided_batched";
        self.require_host_scalars(ROUTINE)?;
        let (ar, ac) = stored_shape(trans_a, m, k);
        let (br, bc) = stored_shape(trans_b, k, n);
        let single_a = matrix_min_len(ar, ac, lda)?;
        let single_b = matrix_min_len(br, bc, ldb)?;
        let single_c = matrix_min_len(m, n, ldc)?;
        check_batched(ROUTINE, "A", single_a, stride_a, batch_count, a.len())?;
        check_batched(ROUTINE, "B", single_b, stride_b, batch_count, b.len())?;
        check_batched(ROUTINE, "C", single_c, stride_c, batch_count, c.len())?;
        debug!(?trans_a, ?trans_b, m, n, k, stride_a, stride_b, stride_c, batch_count, "rocblas_sgemm_strided_batched");
        check_blas(
            unsafe {
                (self.runtime.blas().sgemm_strided_batched)(
                    self.raw,
                    trans_a.raw(),
                    trans_b.raw(),
                    m,
                    n,
                    k,
                    &alpha,
                    a.as_ptr(),
                    lda,
                    stride_a,
                    b.as_ptr(),
                    ldb,
                    stride_b,
                    &beta,
                    c.as_mut_ptr(),
                    ldc,
                    stride_c,
                    batch_count,
                )
            },
            ROUTINE,
        )
    }

    /// Mixed-precision `D = alpha * op(A) * op(B) + beta * C`.
    ///
    /// `A`/`B` share element type `AB`, `C`/`D` share `CD`, and the scalar
    /// type `S` doubles as the compute type.
    pub fn gemm_ex<AB: BlasDatatype, CD: BlasDatatype, S: BlasDatatype>(
        &self,
        trans_a: Operation,
        trans_b: Operation,
        m: i32,
        n: i32,
        k: i32,
        alpha: S,
        a: &DeviceSlice<'_, AB>,
        lda: i32,
        b: &DeviceSlice<'_, AB>,
        ldb: i32,
        beta: S,
        c: &DeviceSlice<'_, CD>,
        ldc: i32,
        d: &mut DeviceSliceMut<'_, CD>,
        ldd: i32,
        algo: GemmAlgo,
        solution_index: i32,
        flags: GemmFlags,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_gemm_ex")?;
        let (ar, ac) = stored_shape(trans_a, m, k);
        let (br, bc) = stored_shape(trans_b, k, n);
        check_matrix("rocblas_gemm_ex", "A", ar, ac, lda, a.len())?;
        check_matrix("rocblas_gemm_ex", "B", br, bc, ldb, b.len())?;
        check_matrix("rocblas_gemm_ex", "C", m, n, ldc, c.len())?;
        check_matrix("rocblas_gemm_ex", "D", m, n, ldd, d.len())?;
        debug!(
            ?trans_a,
            ?trans_b,
            m,
            n,
            k,
            ab = ?AB::DATATYPE,
            cd = ?CD::DATATYPE,
            compute = ?S::DATATYPE,
            "rocblas_gemm_ex"
        );
        check_blas(
            unsafe {
                (self.runtime.blas().gemm_ex)(
                    self.raw,
                    trans_a.raw(),
                    trans_b.raw(),
                    m,
                    n,
                    k,
                    (&alpha as *const S).cast::<c_void>(),
                    a.as_ptr().cast(),
                    AB::DATATYPE.raw(),
                    lda,
                    b.as_ptr().cast(),
                    AB::DATATYPE.raw(),
                    ldb,
                    (&beta as *const S).cast::<c_void>(),
                    c.as_ptr().cast(),
                    CD::DATATYPE.raw(),
                    ldc,
                    d.as_mut_ptr().cast(),
                    CD::DATATYPE.raw(),
                    ldd,
                    S::DATATYPE.raw(),
                    algo.raw(),
                    solution_index,
                    flags.0,
                )
            },
            "rocblas_gemm_ex",
        )
    }

    /// `C = alpha * op(A) + beta * op(B)`, all `m × n` after the operation.
    pub fn dgeam(
        &self,
        trans_a: Operation,
        trans_b: Operation,
        m: i32,
        n: i32,
        alpha: f64,
        a: &DeviceSlice<'_, f64>,
        lda: i32,
        beta: f64,
        b: &DeviceSlice<'_, f64>,
        ldb: i32,
        c: &mut DeviceSliceMut<'_, f64>,
        ldc: i32,
    ) -> Result<()> {
        self.require_host_scalars("rocblas_dgeam")?;
        let (ar, ac) = stored_shape(trans_a, m, n);
        let (br, bc) = stored_shape(trans_b, m, n);
        check_matrix("rocblas_dgeam", "A", ar, ac, lda, a.len())?;
        check_matrix("rocblas_dgeam", "B", br, bc, ldb, b.len())?;
        check_matrix("rocblas_dgeam", "C", m, n, ldc, c.len())?;
        debug!(?trans_a, ?trans_b, m, n, alpha, beta, "rocblas_dgeam");
        check_blas(
            unsafe {
                (self.runtime.blas().dgeam)(
                    self.raw,
                    trans_a.raw(),
                    trans_b.raw(),
                    m,
                    n,
                    &alpha,
                    a.as_ptr(),
                    lda,
                    &beta,
                    b.as_ptr(),
                    ldb,
                    c.as_mut_ptr(),
                    ldc,
                )
            },
            "rocblas_dgeam",
        )
    }
}

// ── host <-> device helpers ──────────────────────────────────────────

fn elem_size<T>() -> Result<c_int> {
    c_int::try_from(std::mem::size_of::<T>())
        .map_err(|_| RuntimeError::InvalidArgument("element type too large".into()))
}

/// Strided copy of `n` elements from host to device (`rocblas_set_vector`).
pub fn set_vector<T: Pod>(
    runtime: &Runtime,
    n: i32,
    host: &[T],
    incx: i32,
    device: &mut DeviceSliceMut<'_, T>,
    incy: i32,
) -> Result<()> {
    check_vector("rocblas_set_vector", "host", n, incx, host.len())?;
    check_vector("rocblas_set_vector", "device", n, incy, device.len())?;
    check_blas(
        unsafe {
            (runtime.blas().set_vector)(
                n,
                elem_size::<T>()?,
                host.as_ptr().cast(),
                incx,
                device.as_mut_ptr().cast(),
                incy,
            )
        },
        "rocblas_set_vector",
    )
}

/// Strided copy of `n` elements from device to host (`rocblas_get_vector`).
pub fn get_vector<T: Pod>(
    runtime: &Runtime,
    n: i32,
    device: &DeviceSlice<'_, T>,
    incx: i32,
    host: &mut [T],
    incy: i32,
) -> Result<()> {
    check_vector("rocblas_get_vector", "device", n, incx, device.len())?;
    check_vector("rocblas_get_vector", "host", n, incy, host.len())?;
    check_blas(
        unsafe {
            (runtime.blas().get_vector)(
                n,
                elem_size::<T>()?,
                device.as_ptr().cast(),
                incx,
                host.as_mut_ptr().cast(),
                incy,
            )
        },
        "rocblas_get_vector",
    )
}

/// Queue a `rows × cols` host-to-device matrix copy on `stream`.
///
/// # Safety
/// `host` must stay alive and unmodified until `stream` is synchronised;
/// the copy only overlaps other work when `host` is pinned.
#[allow(clippy::too_many_arguments)]
pub unsafe fn set_matrix_async<T: Pod>(
    runtime: &Runtime,
    rows: i32,
    cols: i32,
    host: &[T],
    lda: i32,
    device: &mut DeviceSliceMut<'_, T>,
    ldb: i32,
    stream: &Stream,
) -> Result<()> {
    check_matrix("rocblas_set_matrix_async", "host", rows, cols, lda, host.len())?;
    check_matrix("rocblas_set_matrix_async", "device", rows, cols, ldb, device.len())?;
    check_blas(
        unsafe {
            (runtime.blas().set_matrix_async)(
                rows,
                cols,
                elem_size::<T>()?,
                host.as_ptr().cast(),
                lda,
                device.as_mut_ptr().cast(),
                ldb,
                stream.raw(),
            )
        },
        "rocblas_set_matrix_async",
    )
}

/// Queue a `rows × cols` device-to-host matrix copy on `stream`.
///
/// # Safety
/// `host` must not be accessed until `stream` is synchronised.
#[allow(clippy::too_many_arguments)]
pub unsafe fn get_matrix_async<T: Pod>(
    runtime: &Runtime,
    rows: i32,
    cols: i32,
    device: &DeviceSlice<'_, T>,
    lda: i32,
    host: &mut [T],
    ldb: i32,
    stream: &Stream,
) -> Result<()> {
    check_matrix("rocblas_get_matrix_async", "device", rows, cols, lda, device.len())?;
    check_matrix("rocblas_get_matrix_async", "host", rows, cols, ldb, host.len())?;
    check_blas(
        unsafe {
            (runtime.blas().get_matrix_async)(
                rows,
                cols,
                elem_size::<T>()?,
                device.as_ptr().cast(),
                lda,
                host.as_mut_ptr().cast(),
                ldb,
                stream.raw(),
            )
        },
        "rocblas_get_matrix_async",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_codes_match_rocblas_headers() {
        assert_eq!(Operation::None.raw(), 111);
        assert_eq!(Operation::ConjugateTranspose.raw(), 113);
        assert_eq!(Fill::Lower.raw(), 122);
        assert_eq!(Diagonal::Unit.raw(), 132);
        assert_eq!(PointerMode::Device.raw(), 1);
        assert_eq!(<i8 as BlasDatatype>::DATATYPE.raw(), 160);
        assert_eq!(<i32 as BlasDatatype>::DATATYPE.raw(), 162);
        assert_eq!(<Complex32 as BlasDatatype>::DATATYPE.raw(), 154);
        assert_eq!(GemmAlgo::Standard.raw(), 0);
        assert_eq!(GemmFlags::default(), GemmFlags::NONE);
    }

    #[test]
    fn vector_length_follows_increment() {
        assert_eq!(vector_min_len(0, 1), 0);
        assert_eq!(vector_min_len(-3, 1), 0);
        assert_eq!(vector_min_len(5, 1), 5);
        assert_eq!(vector_min_len(5, 2), 9);
        assert_eq!(vector_min_len(5, -2), 9);
        assert_eq!(vector_min_len(5, 0), 1);
    }

    #[test]
    fn matrix_length_uses_leading_dimension() {
        assert_eq!(matrix_min_len(5, 5, 5).unwrap(), 25);
        assert_eq!(matrix_min_len(3, 4, 10).unwrap(), 33);
        assert_eq!(matrix_min_len(0, 4, 1).unwrap(), 0);
        assert!(matrix_min_len(4, 4, 3).is_err());
        assert!(matrix_min_len(-1, 4, 3).is_err());
    }

    #[test]
    fn transposed_operands_swap_stored_shape() {
        assert_eq!(stored_shape(Operation::None, 200, 60), (200, 60));
        assert_eq!(stored_shape(Operation::Transpose, 200, 60), (60, 200));
    }

    #[test]
    fn short_operand_is_rejected_with_routine_name() {
        let err = check_vector("rocblas_saxpy", "y", 5, 2, 8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: rocblas_saxpy: operand y needs 9 elements, buffer has 8"
        );
    }

    #[test]
    fn batched_operand_accounts_for_stride() {
        // three 5x5 matrices, 25 apart
        assert!(check_batched("gemm", "C", 25, 25, 3, 75).is_ok());
        assert!(check_batched("gemm", "C", 25, 25, 3, 74).is_err());
        assert!(check_batched("gemm", "C", 25, 25, 0, 0).is_ok());
        assert!(check_batched("gemm", "C", 25, -1, 3, 100).is_err());
    }

    #[test]
    fn batched_extent_overflow_is_an_error() {
        let err = check_batched("gemm", "C", 25, i64::MAX, 3, usize::MAX).unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
        assert!(check_batched("gemm", "C", usize::MAX, 1, 2, usize::MAX).is_err());
        // a single batch never multiplies the stride
        assert!(check_batched("gemm", "C", 25, i64::MAX, 1, 25).is_ok());
    }
}
