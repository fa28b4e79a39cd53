//! Behaviour that is decided before any ROCm library is opened.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

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

// ── early exits ──────────────────────────────────────────────────────

#[test]
fn vector_samples_skip_non_positive_n() {
    for sample in ["axpy", "dot", "nrm2", "scal", "swap"] {
        samples_bin()
            .args([sample, "-n", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Value of 'n' should be greater than 0"));
    }
}

#[test]
fn negative_n_is_accepted_and_skipped() {
    samples_bin()
        .args(["axpy", "--n", "-4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("should be greater than 0"));
}

#[test]
fn multi_stream_has_its_own_message() {
    samples_bin()
        .args(["multi-stream", "-N", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The value of 'n' should be greater than zero"));
}

// ── usage errors ─────────────────────────────────────────────────────

#[test]
fn negative_dimension_is_rejected() {
    samples_bin().args(["gemm", "-M", "-3"]).assert().failure().code(2);
}

#[test]
fn letters_outside_the_sample_are_rejected() {
    // nrm2 reads only `xn`
    samples_bin().args(["nrm2", "-y", "2"]).assert().failure().code(2);
}

#[test]
fn malformed_scalar_is_rejected() {
    samples_bin().args(["axpy", "--alpha", "two"]).assert().failure().code(2);
}

// ── configuration errors ─────────────────────────────────────────────

#[test]
fn unparsable_config_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[verification\ntolerance = ").unwrap();

    samples_bin()
        .arg("--config")
        .arg(file.path())
        .args(["axpy", "-n", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn missing_config_file_fails() {
    samples_bin()
        .args(["--config", "/nonexistent/rocblas-samples.toml", "axpy"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn non_positive_tolerance_fails() {
    samples_bin()
        .args(["--tolerance", "0", "axpy", "-n", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Tolerance must be a positive finite number"));
}

#[test]
fn malformed_seed_in_environment_fails() {
    samples_bin()
        .env("ROCBLAS_SAMPLES_SEED", "not-a-number")
        .args(["axpy", "-n", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ROCBLAS_SAMPLES_SEED"));
}

#[test]
fn valid_config_file_is_applied() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[output]\nquiet = true\n\n[random]\nseed = 11").unwrap();

    samples_bin()
        .arg("--config")
        .arg(file.path())
        .args(["dot", "-n", "0"])
        .assert()
        .success();
}

// ── runtime errors ───────────────────────────────────────────────────

#[test]
fn input_buffers_are_printed_before_the_runtime_loads() {
    samples_bin()
        .env("ROCBLAS_SAMPLES_HIP_LIBRARY", "/nonexistent/libamdhip64.so")
        .args(["--print-buffers", "--seed", "1", "axpy", "-n", "3"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Input Vectors (X)"))
        .stdout(predicate::str::contains("Input Vectors (Y)"));
}

#[test]
fn quiet_suppresses_buffer_dumps() {
    samples_bin()
        .env("ROCBLAS_SAMPLES_HIP_LIBRARY", "/nonexistent/libamdhip64.so")
        .args(["--print-buffers", "--quiet", "axpy", "-n", "3"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn unloadable_hip_library_reports_the_path() {
    samples_bin()
        .env("ROCBLAS_SAMPLES_HIP_LIBRARY", "/nonexistent/libamdhip64.so")
        .args(["axpy", "-n", "8"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("/nonexistent/libamdhip64.so"));
}

#[test]
fn devices_without_runtime_fails_cleanly() {
    samples_bin()
        .args(["devices"])
        .env("ROCBLAS_SAMPLES_HIP_LIBRARY", "/nonexistent/libamdhip64.so")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load the ROCm runtime"));
}
