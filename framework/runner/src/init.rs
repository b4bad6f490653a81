use crate::cli::PerfTunnelScenarioCli;
use clap::Parser;

/// Initialise the CLI and logging for the runner.
pub fn init() -> PerfTunnelScenarioCli {
    env_logger::init();

    PerfTunnelScenarioCli::parse()
}
