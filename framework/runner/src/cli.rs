use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReporterOpt {
    /// Print the summary tables to the console at the end of the run
    #[default]
    InMemory,
    /// Do not print anything at the end of the run
    Noop,
}

#[derive(Debug, Clone, Parser)]
#[command(about, long_about = None)]
pub struct PerfTunnelScenarioCli {
    /// How long to run each scenario for, such as `60`, `90s`, `2m` or `1h`.
    ///
    /// Overrides the duration the scenario was built with.
    #[clap(long, env = "DURATION", value_parser = parse_duration_secs)]
    pub duration: Option<Duration>,

    /// Directory to publish `latest.json` and `history.json` to. Nothing is published if unset.
    #[clap(long, env = "PERF_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Identifier for this run. A random one is generated if unset.
    #[clap(long)]
    pub run_id: Option<String>,

    /// How long in-flight requests may keep running after a scenario's schedule ends.
    #[clap(long, default_value = "30s", value_parser = parse_duration_secs)]
    pub grace_period: Duration,

    /// Exit with an error when any scenario breaches its thresholds.
    #[clap(long, default_value = "false")]
    pub fail_on_threshold: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    #[clap(long, value_enum, default_value_t = ReporterOpt::InMemory)]
    pub reporter: ReporterOpt,
}

/// Parse a duration given as whole seconds with an optional `s`, `m` or `h` unit.
pub fn parse_duration_secs(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let (value, multiplier) = match s.char_indices().last() {
        Some((i, 's')) => (&s[..i], 1),
        Some((i, 'm')) => (&s[..i], 60),
        Some((i, 'h')) => (&s[..i], 60 * 60),
        _ => (s, 1),
    };

    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|e| anyhow::anyhow!("Invalid duration [{s}]: {e}"))?;
    if value == 0 {
        anyhow::bail!("Duration must be greater than zero");
    }

    Ok(Duration::from_secs(value * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_duration_units() {
        assert_eq!(Duration::from_secs(60), parse_duration_secs("60").unwrap());
        assert_eq!(Duration::from_secs(90), parse_duration_secs("90s").unwrap());
        assert_eq!(Duration::from_secs(120), parse_duration_secs("2m").unwrap());
        assert_eq!(Duration::from_secs(3600), parse_duration_secs(" 1h ").unwrap());
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration_secs("").is_err());
        assert!(parse_duration_secs("0s").is_err());
        assert!(parse_duration_secs("1.5m").is_err());
        assert!(parse_duration_secs("ten").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = PerfTunnelScenarioCli::try_parse_from(["scenario", "--no-progress"]).unwrap();

        assert_eq!(Duration::from_secs(30), cli.grace_period);
        assert_eq!(ReporterOpt::InMemory, cli.reporter);
        assert!(cli.no_progress);
        assert!(!cli.fail_on_threshold);
    }
}
