//! Embedded HIP kernel sources.
//!
//! Each variant of [`HipKernelSource`] maps to a `.hip` file compiled at
//! run time by HIP-RTC on the target machine (see [`crate::kernel::Module`]).

/// Static kernel source strings, embedded at compile time.
pub const SQUARE_SRC: &str = include_str!("square.hip");

/// Enumeration of available HIP kernel sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HipKernelSource {
    /// Element-wise square of a column-major `f64` matrix.
    SquareElements,
}

impl HipKernelSource {
    /// Returns the embedded HIP source code for the kernel.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::SquareElements => SQUARE_SRC,
        }
    }

    /// Name of the `extern "C"` entry point.
    #[must_use]
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::SquareElements => "matrix_square_elements",
        }
    }

    /// File name handed to the compiler for diagnostics.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::SquareElements => "square.hip",
        }
    }

    /// All kernel source variants.
    pub const ALL: &[HipKernelSource] = &[Self::SquareElements];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_return_non_empty_source() {
        for &k in HipKernelSource::ALL {
            assert!(!k.source().is_empty(), "{k:?} returned empty source");
        }
    }

    #[test]
    fn entry_points_are_exported_unmangled() {
        for &k in HipKernelSource::ALL {
            let src = k.source();
            assert!(src.contains("extern \"C\" __global__"), "{k:?} is not extern \"C\"");
            assert!(src.contains(k.entry_point()), "{k:?} does not define its entry point");
        }
    }
}
