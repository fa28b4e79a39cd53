//! Runner for the rocBLAS sample programs.
//!
//! The library half exists so the command tree and the samples can be tested
//! without spawning the binary.

pub mod cli;
pub mod context;
pub mod exit;
pub mod samples;

pub use cli::{GlobalArgs, build_cli, execute};
