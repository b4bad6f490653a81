use anyhow::Context;
use clap::Parser;
use perf_summariser::{Dashboard, HealthThresholds, ResultSource};
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct SummariserCli {
    /// Where `latest.json` and `history.json` are published, either an http(s) URL or a directory.
    #[clap(long, env = "PERF_RESULTS_BASE_URL", default_value = "perf/results")]
    results: String,

    /// File to write the dashboard JSON to.
    #[clap(long, env = "SUMMARY_OUTPUT_PATH", default_value = "perf-summary.json")]
    output: PathBuf,

    /// Scenario to include in the dashboard. May be given more than once.
    #[clap(long = "scenario", default_values = ["redirect", "shorten"])]
    scenarios: Vec<String>,

    /// A scenario is unhealthy at or above this error rate.
    #[clap(long, default_value_t = 0.01)]
    error_rate_ceiling: f64,

    /// A scenario is unhealthy at or above this p95 latency.
    #[clap(long, default_value_t = 150.0)]
    p95_ceiling_ms: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = SummariserCli::parse();
    let thresholds = HealthThresholds {
        error_rate_ceiling: cli.error_rate_ceiling,
        p95_ceiling_ms: cli.p95_ceiling_ms,
    };

    let source = ResultSource::parse(&cli.results)?;
    log::debug!("Reading results from {}", source.location());

    let ingested = source.ingest().await;
    if let Some(history) = &ingested.history {
        log::info!("Loaded {} historical runs", history.len());
    }

    let dashboard = Dashboard::build(source.location(), &ingested, &cli.scenarios, &thresholds);
    dashboard.print();

    let output = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    serde_json::to_writer_pretty(output, &dashboard)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    log::info!("Wrote dashboard to {}", cli.output.display());

    if !dashboard.errors.is_empty() {
        log::warn!(
            "{} of 2 result documents could not be loaded, the dashboard is partial",
            dashboard.errors.len()
        );
    }

    Ok(())
}
