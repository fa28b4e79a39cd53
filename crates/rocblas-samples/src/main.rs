//! `rocblas-samples` binary.

use rocblas_samples::exit::{EXIT_GENERIC_FAIL, EXIT_SUCCESS};
use rocblas_samples::{GlobalArgs, build_cli, execute};
use rocblas_samples_common::setup_logging;
use tracing::error;

fn main() {
    let cli = match build_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_GENERIC_FAIL);
        }
    };
    let matches = cli.try_get_matches().unwrap_or_else(|e| e.exit());

    // Logging is not up yet, so configuration errors go straight to stderr.
    let config = match GlobalArgs::from_matches(&matches).and_then(|global| global.load_config()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_GENERIC_FAIL);
        }
    };
    if let Err(e) = setup_logging(&config.logging) {
        eprintln!("Error: {e:#}");
        std::process::exit(EXIT_GENERIC_FAIL);
    }

    if let Err(e) = execute(&matches, config) {
        error!("Command failed: {}", e);

        let mut source = e.source();
        while let Some(err) = source {
            error!("  Caused by: {}", err);
            source = err.source();
        }

        std::process::exit(EXIT_GENERIC_FAIL);
    }

    std::process::exit(EXIT_SUCCESS);
}
