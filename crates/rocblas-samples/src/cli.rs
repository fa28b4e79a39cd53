//! Command-line surface: global flags, the `devices` command, and one
//! subcommand per sample.

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use console::style;
use rocblas_samples_common::{ConfigBuilder, LogFormat, SampleArgs, SamplesConfig};
use rocblas_samples_runtime::{Runtime, enumerate_devices};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::context::SampleContext;
use crate::samples::{self, Outcome, SAMPLES};

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Seed for the input data generator
    #[arg(long, value_name = "SEED", global = true)]
    pub seed: Option<u64>,

    /// Allowed error as a multiple of machine epsilon
    #[arg(long, value_name = "FACTOR", global = true)]
    pub tolerance: Option<f64>,

    /// Print host buffers before and after the library call
    #[arg(long, global = true)]
    pub print_buffers: bool,

    /// Print only the verdict line
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Self::from_arg_matches(matches).map_err(|e| anyhow!("{e}"))
    }

    /// Layer the configuration: defaults, `--config` file, environment, flags.
    pub fn load_config(&self) -> Result<SamplesConfig> {
        let builder = match &self.config {
            Some(path) => ConfigBuilder::new().from_file(path)?,
            None => ConfigBuilder::new(),
        };
        let config = builder
            .from_env()?
            .log_level(self.log_level.clone())
            .log_format(self.log_format)
            .seed(self.seed)
            .tolerance(self.tolerance)
            .print_buffers(self.print_buffers)
            .quiet(self.quiet)
            .validate()
            .context("Invalid configuration")?
            .build();
        Ok(config)
    }
}

/// The full command tree.
pub fn build_cli() -> Result<Command> {
    let root = Command::new("rocblas-samples")
        .version(env!("CARGO_PKG_VERSION"))
        .about("rocBLAS sample programs")
        .long_about(
            "Runs one rocBLAS routine on the GPU and checks the result against a CPU \
             reference.\n\nExamples:\n  rocblas-samples axpy -n 1000 -a 2.5\n  \
             rocblas-samples gemm -M 128 -N 64 -K 32 --seed 7\n  rocblas-samples devices",
        )
        .subcommand_required(true)
        .arg_required_else_help(true);

    let mut cli = GlobalArgs::augment_args(root)
        .subcommand(Command::new("devices").about("List the AMD GPUs visible to HIP"));
    for sample in SAMPLES {
        cli = cli.subcommand(samples::command(*sample)?);
    }
    Ok(cli)
}

/// Run the selected subcommand.
pub fn execute(matches: &ArgMatches, config: SamplesConfig) -> Result<()> {
    let Some((name, sub_matches)) = matches.subcommand() else {
        bail!("No command given");
    };
    if name == "devices" {
        return list_devices(&config);
    }

    let sample = samples::find(name).ok_or_else(|| anyhow!("Unknown sample '{name}'"))?;
    let args = SampleArgs::from_matches(sample.letters(), sub_matches, &sample.defaults())?;
    info!(sample = name, ?args, "running sample");

    let mut ctx = SampleContext::new(config);
    let outcome = sample.run(&args, &mut ctx).with_context(|| format!("Sample '{name}' failed"))?;
    match outcome {
        Outcome::Skipped(message) => println!("{message}"),
        Outcome::Verdict(verdict) => {
            if !verdict.passed() {
                warn!(
                    sample = name,
                    error = verdict.error,
                    threshold = verdict.threshold,
                    "verification failed"
                );
            }
            ctx.report(&verdict);
        }
    }
    Ok(())
}

fn list_devices(config: &SamplesConfig) -> Result<()> {
    let runtime =
        Runtime::load(&config.library_paths()).context("Failed to load the ROCm runtime")?;
    let devices = enumerate_devices(&runtime)?;

    println!("{}", style("AMD GPU devices").bold().cyan());
    if devices.is_empty() {
        println!("  {}", style("none found").yellow());
    }
    for device in &devices {
        println!(
            "  [{}] {} ({} MiB)",
            device.index,
            style(&device.name).green(),
            device.total_memory_mib
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::EXIT_USAGE;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().unwrap().debug_assert();
    }

    #[test]
    fn global_flags_are_accepted_after_the_sample() {
        let matches = build_cli()
            .unwrap()
            .try_get_matches_from(["rocblas-samples", "axpy", "-n", "10", "--seed", "3", "-q"])
            .unwrap();
        let global = GlobalArgs::from_matches(&matches).unwrap();
        assert_eq!(global.seed, Some(3));
        assert!(global.quiet);
        assert_eq!(matches.subcommand_name(), Some("axpy"));
    }

    #[test]
    fn log_format_flag_is_parsed() {
        let matches = build_cli()
            .unwrap()
            .try_get_matches_from(["rocblas-samples", "--log-format", "json", "devices"])
            .unwrap();
        let global = GlobalArgs::from_matches(&matches).unwrap();
        assert_eq!(global.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn negative_dimension_is_a_usage_error() {
        let err = build_cli()
            .unwrap()
            .try_get_matches_from(["rocblas-samples", "gemm", "-M", "-3"])
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
}
