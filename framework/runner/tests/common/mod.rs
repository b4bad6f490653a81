#![allow(dead_code)]

use chrono::Utc;
use perf_tunnel_runner::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Answers every invocation with the same status after a fixed delay.
pub struct FixedResponse {
    pub status: u16,
    pub latency: Duration,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl FixedResponse {
    pub fn ok(latency: Duration) -> Self {
        Self {
            status: 200,
            latency,
            headers: Vec::new(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            latency: Duration::from_millis(1),
            headers: Vec::new(),
        }
    }
}

impl TrafficScenario for FixedResponse {
    fn invoke(&self, _invocation: Invocation) -> BoxFuture<'_, RequestOutcome> {
        async move {
            let start = Instant::now();
            tokio::time::sleep(self.latency).await;
            RequestOutcome::response(
                self.status,
                start.elapsed(),
                self.headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<HashMap<_, _>>(),
            )
        }
        .boxed()
    }
}

impl OutcomeCheck for FixedResponse {
    fn is_success(&self, outcome: &RequestOutcome) -> bool {
        outcome.is_status(200)
    }
}

pub fn metrics_of(report: &ScenarioReport) -> RunMetrics {
    report.to_metrics("test-run", Utc::now())
}

pub fn test_cli(duration: Duration, results_dir: Option<PathBuf>) -> PerfTunnelScenarioCli {
    PerfTunnelScenarioCli {
        duration: Some(duration),
        results_dir,
        run_id: None,
        grace_period: Duration::from_secs(5),
        fail_on_threshold: false,
        no_progress: true,
        reporter: ReporterOpt::Noop,
    }
}
