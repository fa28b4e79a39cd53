use assert_cmd::Command;

fn samples_bin() -> Command {
    let mut cmd = Command::cargo_bin("rocblas-samples").unwrap();
    for var in [
        "ROCBLAS_SAMPLES_HIP_LIBRARY",
        "ROCBLAS_SAMPLES_ROCBLAS_LIBRARY",
        "ROCBLAS_SAMPLES_HIPRTC_LIBRARY",
        "ROCBLAS_SAMPLES_LOG_LEVEL",
        "ROCBLAS_SAMPLES_LOG_FORMAT",
        "ROCBLAS_SAMPLES_TOLERANCE",
        "ROCBLAS_SAMPLES_SEED",
        "ROCBLAS_SAMPLES_PRINT_BUFFERS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_works() {
    samples_bin().arg("--help").assert().success();
}

#[test]
fn version_works() {
    samples_bin().arg("--version").assert().success();
}

#[test]
fn help_mentions_every_sample() {
    let out = samples_bin().arg("--help").assert().success().get_output().stdout.clone();
    let s = String::from_utf8(out).unwrap();

    for needle in [
        "axpy",
        "dot",
        "nrm2",
        "scal",
        "swap",
        "gemv",
        "her",
        "trmv",
        "gemm-strided-batched",
        "gemm-ex-f32",
        "gemm-ex-i8-i32",
        "multi-stream",
        "multi-device",
        "geam-async",
        "hip-kernel",
        "devices",
        "--config",
    ] {
        assert!(s.contains(needle), "help missing `{needle}`");
    }
}

#[test]
fn sample_help_lists_its_letters() {
    let out =
        samples_bin().args(["gemv", "--help"]).assert().success().get_output().stdout.clone();
    let s = String::from_utf8(out).unwrap();
    for needle in ["--M", "--N", "--alpha", "--beta", "--incx", "--incy"] {
        assert!(s.contains(needle), "gemv help missing `{needle}`");
    }
    assert!(!s.contains("--count"));
}

#[test]
fn invalid_command_fails() {
    samples_bin().arg("nonexistent-command").assert().failure().code(2);
}

#[test]
fn no_command_prints_help_and_fails() {
    samples_bin().assert().failure().code(2);
}
