//! HIP runtime and rocBLAS error types.

use std::fmt;
use thiserror::Error;

/// HIP runtime error codes (subset the samples can encounter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HipErrorCode {
    Success,
    InvalidValue,
    OutOfMemory,
    NotInitialized,
    Deinitialized,
    NoDevice,
    InvalidDevice,
    InvalidImage,
    FileNotFound,
    InvalidHandle,
    NotFound,
    NotReady,
    LaunchFailure,
    Unknown(i32),
}

impl HipErrorCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::InvalidValue,
            2 => Self::OutOfMemory,
            3 => Self::NotInitialized,
            4 => Self::Deinitialized,
            100 => Self::NoDevice,
            101 => Self::InvalidDevice,
            200 => Self::InvalidImage,
            301 => Self::FileNotFound,
            400 => Self::InvalidHandle,
            500 => Self::NotFound,
            600 => Self::NotReady,
            719 => Self::LaunchFailure,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InvalidValue => 1,
            Self::OutOfMemory => 2,
            Self::NotInitialized => 3,
            Self::Deinitialized => 4,
            Self::NoDevice => 100,
            Self::InvalidDevice => 101,
            Self::InvalidImage => 200,
            Self::FileNotFound => 301,
            Self::InvalidHandle => 400,
            Self::NotFound => 500,
            Self::NotReady => 600,
            Self::LaunchFailure => 719,
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for HipErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "hipSuccess",
            Self::InvalidValue => "hipErrorInvalidValue",
            Self::OutOfMemory => "hipErrorOutOfMemory",
            Self::NotInitialized => "hipErrorNotInitialized",
            Self::Deinitialized => "hipErrorDeinitialized",
            Self::NoDevice => "hipErrorNoDevice",
            Self::InvalidDevice => "hipErrorInvalidDevice",
            Self::InvalidImage => "hipErrorInvalidImage",
            Self::FileNotFound => "hipErrorFileNotFound",
            Self::InvalidHandle => "hipErrorInvalidHandle",
            Self::NotFound => "hipErrorNotFound",
            Self::NotReady => "hipErrorNotReady",
            Self::LaunchFailure => "hipErrorLaunchFailure",
            Self::Unknown(raw) => return write!(f, "hipError({raw})"),
        };
        f.write_str(name)
    }
}

/// rocBLAS status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlasStatus {
    Success,
    InvalidHandle,
    NotImplemented,
    InvalidPointer,
    InvalidSize,
    MemoryError,
    InternalError,
    PerfDegraded,
    SizeQueryMismatch,
    SizeIncreased,
    SizeUnchanged,
    InvalidValue,
    Continue,
    CheckNumericsFail,
    ExcludedFromBuild,
    ArchMismatch,
    Unknown(i32),
}

impl BlasStatus {
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => Self::Success,
            1 => Self::InvalidHandle,
            2 => Self::NotImplemented,
            3 => Self::InvalidPointer,
            4 => Self::InvalidSize,
            5 => Self::MemoryError,
            6 => Self::InternalError,
            7 => Self::PerfDegraded,
            8 => Self::SizeQueryMismatch,
            9 => Self::SizeIncreased,
            10 => Self::SizeUnchanged,
            11 => Self::InvalidValue,
            12 => Self::Continue,
            13 => Self::CheckNumericsFail,
            14 => Self::ExcludedFromBuild,
            15 => Self::ArchMismatch,
            other => Self::Unknown(other),
        }
    }

    /// The C enumerator name, as rocBLAS spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "rocblas_status_success",
            Self::InvalidHandle => "rocblas_status_invalid_handle",
            Self::NotImplemented => "rocblas_status_not_implemented",
            Self::InvalidPointer => "rocblas_status_invalid_pointer",
            Self::InvalidSize => "rocblas_status_invalid_size",
            Self::MemoryError => "rocblas_status_memory_error",
            Self::InternalError => "rocblas_status_internal_error",
            Self::PerfDegraded => "rocblas_status_perf_degraded",
            Self::SizeQueryMismatch => "rocblas_status_size_query_mismatch",
            Self::SizeIncreased => "rocblas_status_size_increased",
            Self::SizeUnchanged => "rocblas_status_size_unchanged",
            Self::InvalidValue => "rocblas_status_invalid_value",
            Self::Continue => "rocblas_status_continue",
            Self::CheckNumericsFail => "rocblas_status_check_numerics_fail",
            Self::ExcludedFromBuild => "rocblas_status_excluded_from_build",
            Self::ArchMismatch => "rocblas_status_arch_mismatch",
            Self::Unknown(_) => "<undefined rocblas_status value>",
        }
    }
}

impl fmt::Display for BlasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which guard band of a device allocation was overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardSide {
    Front,
    Back,
}

impl fmt::Display for GuardSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => f.write_str("front"),
            Self::Back => f.write_str("back"),
        }
    }
}

/// Errors produced at the HIP / rocBLAS boundary.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("HIP runtime error: {code} in {context}")]
    Hip { code: HipErrorCode, context: &'static str },

    #[error("rocBLAS error: {status} in {context}")]
    Blas { status: BlasStatus, context: &'static str },

    #[error("failed to load library {library}: {source}")]
    LibraryLoad {
        library: String,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol `{symbol}` not found in {library}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        library: String,
        #[source]
        source: libloading::Error,
    },

    #[error("no AMD GPU device found")]
    NoDevice,

    #[error("memory allocation failed: size={size} bytes")]
    Allocation { size: usize },

    #[error("{side} guard band corrupted after {len}-element device buffer")]
    GuardCorrupted { side: GuardSide, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("kernel compilation failed: {0}")]
    KernelCompile(String),

    #[error("kernel launch failed: {0}")]
    KernelLaunch(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Check a HIP status code and return an error if non-zero.
pub fn check_hip(status: i32, context: &'static str) -> Result<()> {
    match HipErrorCode::from_raw(status) {
        HipErrorCode::Success => Ok(()),
        code => Err(RuntimeError::Hip { code, context }),
    }
}

/// Check a rocBLAS status code and return an error if it is not `rocblas_status_success`.
pub fn check_blas(status: i32, context: &'static str) -> Result<()> {
    match BlasStatus::from_raw(status) {
        BlasStatus::Success => Ok(()),
        status => Err(RuntimeError::Blas { status, context }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hip_codes_round_trip_through_raw() {
        for raw in [0, 1, 2, 3, 4, 100, 101, 200, 301, 400, 500, 600, 719, 42] {
            assert_eq!(HipErrorCode::from_raw(raw).raw(), raw);
        }
    }

    #[test]
    fn unknown_blas_status_has_placeholder_name() {
        assert_eq!(BlasStatus::from_raw(99).to_string(), "<undefined rocblas_status value>");
        assert_eq!(BlasStatus::from_raw(4).to_string(), "rocblas_status_invalid_size");
    }

    #[test]
    fn check_helpers_accept_success_only() {
        assert!(check_hip(0, "hipMalloc").is_ok());
        assert!(check_blas(0, "rocblas_saxpy").is_ok());

        let err = check_blas(1, "rocblas_saxpy").unwrap_err();
        assert_eq!(
            err.to_string(),
            "rocBLAS error: rocblas_status_invalid_handle in rocblas_saxpy"
        );

        let err = check_hip(2, "hipMalloc").unwrap_err();
        assert!(matches!(err, RuntimeError::Hip { code: HipErrorCode::OutOfMemory, .. }));
    }
}
