use crate::cli::ReporterOpt;
use crate::definition::ScenarioDefinitionBuilder;
use crate::monitor::start_monitor;
use crate::pool::WorkerPool;
use crate::progress::start_progress;
use crate::sequential::SequentialDriver;
use crate::shutdown::start_shutdown_listener;
use anyhow::Context;
use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use perf_tunnel_instruments::{ReportConfig, ScenarioReport};
use perf_tunnel_summary_model::{ResultStore, RunResult};

/// Run every scenario in the definition to completion and produce the run's result.
///
/// All scenarios start together. When a results directory is configured the result is appended
/// to the history there and becomes the latest result. Threshold breaches are logged, and turned
/// into an error when `--fail-on-threshold` is set.
pub fn run(definition: ScenarioDefinitionBuilder) -> anyhow::Result<RunResult> {
    let definition = definition.build()?;

    log::info!("Running scenario: {}", definition.name);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);

    let run_id = definition
        .run_id
        .clone()
        .unwrap_or_else(|| nanoid::nanoid!());
    let started_at = Utc::now();

    if !definition.no_progress {
        start_progress(definition.planned_runtime(), shutdown_handle.new_listener())
            .context("Failed to start progress bar")?;
    }

    // A load generator starved of CPU reports saturation the target did not cause
    start_monitor(shutdown_handle.new_listener()).context("Failed to start resource monitor")?;

    let mut scenarios: Vec<BoxFuture<'static, ScenarioReport>> = Vec::new();
    for (config, scenario) in definition.arrival_rate {
        let pool = WorkerPool::new(config, scenario, definition.grace_period);
        scenarios.push(pool.run(shutdown_handle.clone()).boxed());
    }
    for (config, behaviour) in definition.sequential {
        let driver = SequentialDriver::new(config, behaviour, definition.grace_period);
        scenarios.push(driver.run(shutdown_handle.clone()).boxed());
    }

    let reports = runtime.block_on(futures::future::join_all(scenarios));

    // Stop the progress bar and monitor threads
    shutdown_handle.shutdown();

    let report_config = match definition.reporter {
        ReporterOpt::InMemory => ReportConfig::default().enable_summary(),
        ReporterOpt::Noop => ReportConfig::default(),
    };
    let reporter = report_config.init();

    let mut runs = Vec::with_capacity(reports.len());
    for report in reports {
        let metrics = report.to_metrics(&run_id, started_at);
        reporter.add_scenario(&metrics, report.fold.failures());
        runs.push(metrics);
    }
    reporter.finalize();

    let result = RunResult::new(run_id, Utc::now(), runs);

    let breaches = result
        .runs
        .iter()
        .flat_map(|metrics| definition.thresholds.evaluate(metrics))
        .collect::<Vec<_>>();
    for breach in &breaches {
        log::warn!("Threshold breached: {breach}");
    }

    if let Some(results_dir) = &definition.results_dir {
        ResultStore::open(results_dir)
            .and_then(|store| store.publish(&result))
            .with_context(|| format!("Failed to publish run [{}]", result.run_id))?;
    }

    if definition.fail_on_threshold && !breaches.is_empty() {
        anyhow::bail!(
            "Run [{}] breached {} threshold(s)",
            result.run_id,
            breaches.len()
        );
    }

    Ok(result)
}
