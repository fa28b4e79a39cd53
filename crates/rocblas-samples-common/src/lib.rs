//! Host-side helpers shared by the rocBLAS samples.
//!
//! - [`args`]: letter-keyed command-line options
//! - [`config`]: layered configuration (defaults, TOML, environment, flags)
//! - [`fill`]: seeded random input data
//! - [`reference`]: CPU reference BLAS used to check device results
//! - [`verify`]: error metrics and PASS/FAIL verdicts
//! - [`print`]: buffer dumps
//! - [`logging`]: `tracing` subscriber setup

pub mod args;
pub mod config;
pub mod fill;
pub mod logging;
pub mod print;
pub mod reference;
pub mod verify;

pub use args::{ARG_TABLE, ArgKind, ArgSpec, SampleArgs, command_args, lookup, validate_letters};
pub use config::{
    ConfigBuilder, LibraryConfig, LogFormat, LoggingConfig, OutputConfig, RandomConfig,
    SamplesConfig, VerificationConfig,
};
pub use fill::{HostRng, host_rng};
pub use logging::setup_logging;
pub use verify::{DEFAULT_TOLERANCE, Metric, Verdict};
