//! The sample programs, one subcommand each.
//!
//! A sample declares the option letters it reads (see
//! [`rocblas_samples_common::args`]), optional defaults, and a `run` body
//! that goes host buffers → device → one library call → host → reference
//! check.

use anyhow::Result;
use clap::Command;
use rocblas_samples_common::{SampleArgs, Verdict, command_args};

use crate::context::SampleContext;

mod extensions;
mod geam_async;
mod hip_kernel;
mod level1;
mod level2;
mod level3;
mod multi_device;
mod multi_stream;

/// What a sample finished with.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Device result compared against the CPU reference.
    Verdict(Verdict),
    /// Inputs describe no work; the message says why.
    Skipped(&'static str),
}

/// Message printed by the vector samples for `n <= 0`.
pub const NON_POSITIVE_N: &str = "Value of 'n' should be greater than 0";

pub trait Sample: Sync {
    /// Subcommand name.
    fn name(&self) -> &'static str;

    /// One-line help text.
    fn about(&self) -> &'static str;

    /// Option letters the sample understands, e.g. `"axyn"`.
    fn letters(&self) -> &'static str;

    fn defaults(&self) -> SampleArgs {
        SampleArgs::default()
    }

    fn run(&self, args: &SampleArgs, ctx: &mut SampleContext) -> Result<Outcome>;
}

/// Every sample, in help order.
pub static SAMPLES: &[&dyn Sample] = &[
    &level1::Axpy,
    &level1::Dot,
    &level1::Nrm2,
    &level1::Scal,
    &level1::Swap,
    &level2::Gemv,
    &level2::Her,
    &level2::Trmv,
    &level3::Gemm,
    &level3::GemmStridedBatched,
    &extensions::GemmExF32,
    &extensions::GemmExI8I32,
    &multi_stream::MultiStream,
    &multi_device::MultiDevice,
    &geam_async::GeamAsync,
    &hip_kernel::HipKernel,
];

pub fn find(name: &str) -> Option<&'static dyn Sample> {
    SAMPLES.iter().copied().find(|sample| sample.name() == name)
}

/// The clap subcommand for `sample`, with its letter options and defaults.
pub fn command(sample: &dyn Sample) -> Result<Command> {
    let args = command_args(sample.letters(), &sample.defaults())?;
    Ok(Command::new(sample.name()).about(sample.about()).args(args))
}

/// Element count as the `i32` rocBLAS takes.
fn blas_int(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| anyhow::anyhow!("dimension {value} exceeds the rocBLAS integer range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocblas_samples_common::validate_letters;

    #[test]
    fn sample_names_are_unique() {
        for (i, a) in SAMPLES.iter().enumerate() {
            for b in &SAMPLES[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
        assert_eq!(SAMPLES.len(), 16);
    }

    #[test]
    fn every_sample_declares_valid_letters() {
        for sample in SAMPLES {
            validate_letters(sample.letters())
                .unwrap_or_else(|e| panic!("{}: {e}", sample.name()));
            command(*sample).unwrap();
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(find("gemm-ex-i8-i32").map(|s| s.letters()), Some("MNKab"));
        assert!(find("gemm_ex").is_none());
    }

    #[test]
    fn overridden_defaults_reach_the_parser() {
        let sample = find("gemm-ex-f32").unwrap();
        let matches = command(sample).unwrap().try_get_matches_from(["gemm-ex-f32"]).unwrap();
        let args = SampleArgs::from_matches(sample.letters(), &matches, &sample.defaults()).unwrap();
        assert_eq!((args.m, args.n, args.k), (200, 60, 200));
    }
}
