//! Structure checks on the embedded HIP kernel sources. They operate purely
//! on the source text and need no GPU.

use rocblas_samples_runtime::kernels::{HipKernelSource, SQUARE_SRC};

#[test]
fn all_kernels_contain_global_attribute() {
    for &k in HipKernelSource::ALL {
        assert!(k.source().contains("__global__"), "{k:?} missing __global__");
    }
}

#[test]
fn sources_do_not_include_runtime_headers() {
    // HIP-RTC supplies the runtime declarations itself.
    for &k in HipKernelSource::ALL {
        assert!(!k.source().contains("#include"), "{k:?} includes a header");
    }
}

#[test]
fn square_kernel_signature_matches_launch_arguments() {
    assert!(SQUARE_SRC.contains(
        "matrix_square_elements(int rows, int cols, const double* a, int lda, double* b, int ldb)"
    ));
    assert!(SQUARE_SRC.contains("v * v"));
}

#[test]
fn file_names_end_in_hip() {
    for &k in HipKernelSource::ALL {
        assert!(k.file_name().ends_with(".hip"));
    }
}
