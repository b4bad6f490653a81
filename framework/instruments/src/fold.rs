use crate::outcome::Verdict;
use crate::percentile::summarise_latencies;
use chrono::{DateTime, Utc};
use perf_tunnel_core::prelude::FailureKind;
use perf_tunnel_summary_model::{RunMetrics, SaturationStats};
use std::collections::BTreeMap;
use std::time::Duration;

/// Accumulates the outcomes of one scenario into a [RunMetrics].
///
/// Each worker owns its own fold and the pool merges them once every worker has stopped, so counts
/// are exact without any locking on the request path. Completion order does not matter: all
/// figures are sums or order statistics over the whole sample.
#[derive(Debug, Clone)]
pub struct MetricsFold {
    late_after: Duration,
    http_reqs: u64,
    iterations: u64,
    rate_limited: u64,
    failures: BTreeMap<FailureKind, u64>,
    latencies_ms: Vec<f64>,
    late_admissions: u64,
    max_admission_lag: Duration,
    dropped_iterations: u64,
    max_backlog: usize,
    max_workers_used: usize,
}

impl MetricsFold {
    /// `late_after` is the admission lag beyond which an invocation counts as admitted late.
    pub fn new(late_after: Duration) -> Self {
        Self {
            late_after,
            http_reqs: 0,
            iterations: 0,
            rate_limited: 0,
            failures: BTreeMap::new(),
            latencies_ms: Vec::new(),
            late_admissions: 0,
            max_admission_lag: Duration::ZERO,
            dropped_iterations: 0,
            max_backlog: 0,
            max_workers_used: 0,
        }
    }

    /// Record one completed request. Its elapsed time joins the latency sample whatever the
    /// verdict.
    pub fn record_request(&mut self, elapsed: Duration, verdict: Verdict) {
        self.http_reqs += 1;
        self.latencies_ms.push(elapsed.as_secs_f64() * 1000.0);

        match verdict {
            Verdict::Success => {}
            Verdict::RateLimited => self.rate_limited += 1,
            Verdict::Failed(kind) => *self.failures.entry(kind).or_default() += 1,
        }
    }

    /// Record one completed invocation and how long after its scheduled instant it started.
    pub fn record_iteration(&mut self, admission_lag: Duration) {
        self.iterations += 1;
        if admission_lag > self.late_after {
            self.late_admissions += 1;
        }
        self.max_admission_lag = self.max_admission_lag.max(admission_lag);
    }

    /// A request that was still in flight when the run was cut off. It counts as an issued,
    /// failed request but contributes nothing to latency.
    pub fn record_abandoned(&mut self) {
        self.http_reqs += 1;
        *self.failures.entry(FailureKind::Abandoned).or_default() += 1;
    }

    /// A scheduled instant that never reached a worker.
    pub fn record_dropped(&mut self) {
        self.dropped_iterations += 1;
    }

    pub fn record_pool_usage(&mut self, max_workers_used: usize, max_backlog: usize) {
        self.max_workers_used = self.max_workers_used.max(max_workers_used);
        self.max_backlog = self.max_backlog.max(max_backlog);
    }

    pub fn merge(&mut self, other: MetricsFold) {
        self.http_reqs += other.http_reqs;
        self.iterations += other.iterations;
        self.rate_limited += other.rate_limited;
        for (kind, count) in other.failures {
            *self.failures.entry(kind).or_default() += count;
        }
        self.latencies_ms.extend(other.latencies_ms);
        self.late_admissions += other.late_admissions;
        self.max_admission_lag = self.max_admission_lag.max(other.max_admission_lag);
        self.dropped_iterations += other.dropped_iterations;
        self.record_pool_usage(other.max_workers_used, other.max_backlog);
    }

    pub fn http_reqs(&self) -> u64 {
        self.http_reqs
    }

    pub fn failed(&self) -> u64 {
        self.failures.values().sum()
    }

    pub fn failures(&self) -> &BTreeMap<FailureKind, u64> {
        &self.failures
    }

    pub fn finish(
        mut self,
        name: &str,
        run_id: Option<String>,
        created_at: Option<DateTime<Utc>>,
    ) -> RunMetrics {
        let latency = summarise_latencies(&mut self.latencies_ms);
        if !latency.is_rank_ordered() {
            log::error!("Latency statistics for {name} are out of order: {latency:?}");
        }

        RunMetrics {
            name: name.to_string(),
            run_id,
            created_at,
            http_reqs: self.http_reqs,
            iterations: self.iterations,
            error_rate: ratio(self.failed(), self.http_reqs),
            latency,
            rate_limited: self.rate_limited,
            rate_limited_rate: ratio(self.rate_limited, self.http_reqs),
            saturation: SaturationStats {
                late_admissions: self.late_admissions,
                max_admission_lag_ms: self.max_admission_lag.as_secs_f64() * 1000.0,
                max_backlog: self.max_backlog,
                max_workers_used: self.max_workers_used,
                dropped_iterations: self.dropped_iterations,
            },
        }
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
