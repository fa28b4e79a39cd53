//! Per-invocation state handed to every sample.

use anyhow::{Context, Result};
use rocblas_samples_common::print::{print_matrix, print_vector};
use rocblas_samples_common::{HostRng, SamplesConfig, Verdict, host_rng};
use rocblas_samples_runtime::Runtime;
use std::fmt::Display;
use tracing::debug;

/// Configuration, the input RNG and a lazily loaded ROCm runtime.
///
/// The runtime is only loaded when a sample first asks for it, so argument
/// handling and early exits work on machines without ROCm.
pub struct SampleContext {
    config: SamplesConfig,
    rng: HostRng,
    runtime: Option<Runtime>,
}

impl SampleContext {
    pub fn new(config: SamplesConfig) -> Self {
        let rng = host_rng(config.random.seed);
        Self { config, rng, runtime: None }
    }

    pub fn config(&self) -> &SamplesConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut HostRng {
        &mut self.rng
    }

    /// The shared runtime, loading the HIP and rocBLAS libraries on first use.
    pub fn runtime(&mut self) -> Result<Runtime> {
        if let Some(runtime) = &self.runtime {
            return Ok(runtime.clone());
        }
        let paths = self.config.library_paths();
        debug!(?paths, "loading ROCm libraries");
        let runtime = Runtime::load(&paths).context("Failed to load the ROCm runtime")?;
        self.runtime = Some(runtime.clone());
        Ok(runtime)
    }

    /// Verification tolerance as a multiple of machine epsilon.
    pub fn tolerance(&self) -> f64 {
        self.config.verification.tolerance
    }

    /// Print an informational line unless `--quiet` is set.
    pub fn say(&self, line: impl Display) {
        if !self.config.output.quiet {
            println!("{line}");
        }
    }

    /// Dump a strided vector when buffer printing is enabled.
    pub fn show_vector<T: Display>(&self, title: &str, v: &[T], n: usize, inc: usize) {
        if self.printing() {
            println!("{title}");
            print_vector(v, n, inc, self.config.output.print_limit);
        }
    }

    /// Dump a column-major matrix when buffer printing is enabled.
    pub fn show_matrix<T: Display>(&self, name: &str, a: &[T], m: usize, n: usize, lda: usize) {
        if self.printing() {
            print_matrix(name, a, m, n, lda, self.config.output.print_limit);
        }
    }

    /// The final verdict line, coloured on terminals.
    pub fn report(&self, verdict: &Verdict) {
        println!("{}", verdict.styled());
    }

    fn printing(&self) -> bool {
        self.config.output.print_buffers && !self.config.output.quiet
    }
}
