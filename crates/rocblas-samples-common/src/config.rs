//! Configuration management with environment variable support.
//!
//! Precedence, lowest first: built-in defaults, a TOML file, `ROCBLAS_SAMPLES_*`
//! environment variables, then command-line flags applied by the binary.

use anyhow::{Context, Result, bail};
use rocblas_samples_runtime::LibraryPaths;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::verify::DEFAULT_TOLERANCE;

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => bail!("Unknown log format: {s} (expected pretty, compact or json)"),
        }
    }
}

/// Complete sample configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SamplesConfig {
    pub libraries: LibraryConfig,
    pub logging: LoggingConfig,
    pub verification: VerificationConfig,
    pub random: RandomConfig,
    pub output: OutputConfig,
}

/// Shared library locations; unset entries use the loader's search path.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LibraryConfig {
    pub hip: Option<PathBuf>,
    pub rocblas: Option<PathBuf>,
    pub hiprtc: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Pretty }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VerificationConfig {
    /// Multiple of machine epsilon a result may deviate by.
    pub tolerance: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RandomConfig {
    /// Fixed seed for input data; `None` draws one from the OS.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Dump host buffers before and after each call.
    pub print_buffers: bool,
    /// Maximum rows, columns or vector elements shown per dump.
    pub print_limit: usize,
    /// Suppress everything but the verdict line.
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { print_buffers: false, print_limit: 16, quiet: false }
    }
}

impl SamplesConfig {
    pub fn library_paths(&self) -> LibraryPaths {
        LibraryPaths {
            hip: self.libraries.hip.clone(),
            rocblas: self.libraries.rocblas.clone(),
            hiprtc: self.libraries.hiprtc.clone(),
        }
    }
}

/// Configuration builder with environment variable support.
pub struct ConfigBuilder {
    config: SamplesConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self { config: SamplesConfig::default() }
    }

    /// Load configuration from a TOML file. Keys missing from the file keep
    /// their defaults.
    pub fn from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        self.config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(self)
    }

    /// Apply `ROCBLAS_SAMPLES_*` environment variables.
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(path) = env::var("ROCBLAS_SAMPLES_HIP_LIBRARY") {
            self.config.libraries.hip = Some(PathBuf::from(path));
        }

        if let Ok(path) = env::var("ROCBLAS_SAMPLES_ROCBLAS_LIBRARY") {
            self.config.libraries.rocblas = Some(PathBuf::from(path));
        }

        if let Ok(path) = env::var("ROCBLAS_SAMPLES_HIPRTC_LIBRARY") {
            self.config.libraries.hiprtc = Some(PathBuf::from(path));
        }

        if let Ok(level) = env::var("ROCBLAS_SAMPLES_LOG_LEVEL") {
            self.config.logging.level = level;
        }

        if let Ok(format) = env::var("ROCBLAS_SAMPLES_LOG_FORMAT") {
            self.config.logging.format = format.parse()?;
        }

        if let Ok(tolerance) = env::var("ROCBLAS_SAMPLES_TOLERANCE") {
            self.config.verification.tolerance = tolerance
                .parse()
                .with_context(|| format!("Invalid ROCBLAS_SAMPLES_TOLERANCE value '{tolerance}'"))?;
        }

        if let Ok(seed) = env::var("ROCBLAS_SAMPLES_SEED") {
            self.config.random.seed = Some(
                seed.parse().with_context(|| format!("Invalid ROCBLAS_SAMPLES_SEED value '{seed}'"))?,
            );
        }

        if let Ok(print) = env::var("ROCBLAS_SAMPLES_PRINT_BUFFERS") {
            self.config.output.print_buffers = print
                .parse()
                .with_context(|| format!("Invalid ROCBLAS_SAMPLES_PRINT_BUFFERS value '{print}'"))?;
        }

        Ok(self)
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        if let Some(level) = level {
            self.config.logging.level = level;
        }
        self
    }

    pub fn log_format(mut self, format: Option<LogFormat>) -> Self {
        if let Some(format) = format {
            self.config.logging.format = format;
        }
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.config.random.seed = seed;
        }
        self
    }

    pub fn tolerance(mut self, tolerance: Option<f64>) -> Self {
        if let Some(tolerance) = tolerance {
            self.config.verification.tolerance = tolerance;
        }
        self
    }

    pub fn print_buffers(mut self, print: bool) -> Self {
        self.config.output.print_buffers |= print;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.config.output.quiet |= quiet;
        self
    }

    /// Validate configuration.
    pub fn validate(self) -> Result<Self> {
        let config = &self.config;

        if !(config.verification.tolerance.is_finite() && config.verification.tolerance > 0.0) {
            bail!("Tolerance must be a positive finite number");
        }

        if config.logging.level.trim().is_empty() {
            bail!("Log level cannot be empty");
        }

        if config.output.print_limit == 0 {
            bail!("Print limit must be at least 1");
        }

        for (name, path) in [
            ("hip", &config.libraries.hip),
            ("rocblas", &config.libraries.rocblas),
            ("hiprtc", &config.libraries.hiprtc),
        ] {
            if let Some(path) = path
                && path.as_os_str().is_empty()
            {
                bail!("Library path for {name} cannot be empty");
            }
        }

        Ok(self)
    }

    pub fn build(self) -> SamplesConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConfigBuilder::new().validate().unwrap().build();
        assert_eq!(config.verification.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.library_paths(), LibraryPaths::default());
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn cli_overrides_win_and_none_keeps_value() {
        let config = ConfigBuilder::new()
            .seed(Some(42))
            .seed(None)
            .tolerance(Some(100.0))
            .log_level(Some("debug".into()))
            .quiet(true)
            .build();
        assert_eq!(config.random.seed, Some(42));
        assert_eq!(config.verification.tolerance, 100.0);
        assert_eq!(config.logging.level, "debug");
        assert!(config.output.quiet);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        assert!(ConfigBuilder::new().tolerance(Some(0.0)).validate().is_err());
        assert!(ConfigBuilder::new().tolerance(Some(f64::NAN)).validate().is_err());
    }
}
