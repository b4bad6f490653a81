//! Cross-scenario figures and per-scenario trends derived from published runs.
//!
//! Everything here is a pure function of its inputs, so the same history always produces the
//! same output.

use itertools::Itertools;
use perf_tunnel_summary_model::{ResultHistory, RunMetrics};
use serde::{Deserialize, Serialize};

/// A per-scenario figure that can be compared across scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    P95,
    P99,
    ErrorRate,
}

impl MetricField {
    pub fn of(self, metrics: &RunMetrics) -> f64 {
        match self {
            Self::P95 => metrics.latency.p95_ms,
            Self::P99 => metrics.latency.p99_ms,
            Self::ErrorRate => metrics.error_rate,
        }
    }
}

/// One historical run's figures for a single scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Short date of the run, such as `Oct 02`
    pub timestamp_label: String,
    /// Milliseconds since the Unix epoch
    pub timestamp_value: i64,
    pub p95: f64,
    pub p99: f64,
    pub error_rate: f64,
}

/// Find the metrics for `name`. When a run mistakenly holds the same scenario twice the first
/// one wins.
pub fn extract_scenario<'a>(runs: &'a [RunMetrics], name: &str) -> Option<&'a RunMetrics> {
    let mut matches = runs.iter().filter(|metrics| metrics.name == name);
    let first = matches.next();
    if matches.next().is_some() {
        log::warn!("Scenario [{name}] appears more than once in a run, using the first entry");
    }

    first
}

/// The largest value of `field` among the named scenarios that have data.
///
/// Scenarios missing from `runs`, and non-finite values, are ignored. Returns `None` when no
/// scenario contributes a value.
pub fn worst_across_scenarios<S: AsRef<str>>(
    runs: &[RunMetrics],
    field: MetricField,
    scenario_names: &[S],
) -> Option<f64> {
    scenario_names
        .iter()
        .map(AsRef::as_ref)
        .unique()
        .filter_map(|name| extract_scenario(runs, name))
        .map(|metrics| field.of(metrics))
        .filter(|value| value.is_finite())
        .reduce(f64::max)
}

/// Requests issued across the named scenarios. Missing scenarios count as zero.
pub fn total_requests<S: AsRef<str>>(runs: &[RunMetrics], scenario_names: &[S]) -> u64 {
    scenario_names
        .iter()
        .map(AsRef::as_ref)
        .unique()
        .filter_map(|name| extract_scenario(runs, name))
        .map(|metrics| metrics.http_reqs)
        .sum()
}

/// Build the time series for one scenario, oldest run first.
///
/// Runs without the scenario are skipped rather than filled with zeros. History is sorted by
/// `generatedAt` here because the stored order is insertion order.
pub fn build_trend(history: &ResultHistory, scenario_name: &str) -> Vec<TrendPoint> {
    history
        .iter()
        .sorted_by_key(|result| result.generated_at)
        .filter_map(|result| {
            extract_scenario(&result.runs, scenario_name).map(|metrics| TrendPoint {
                timestamp_label: result.generated_at.format("%b %d").to_string(),
                timestamp_value: result.generated_at.timestamp_millis(),
                p95: metrics.latency.p95_ms,
                p99: metrics.latency.p99_ms,
                error_rate: metrics.error_rate,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use perf_tunnel_summary_model::{LatencyStats, RunResult, SaturationStats};
    use pretty_assertions::assert_eq;

    fn metrics(name: &str, p95_ms: f64, error_rate: f64, http_reqs: u64) -> RunMetrics {
        RunMetrics {
            name: name.to_string(),
            run_id: None,
            created_at: None,
            http_reqs,
            iterations: http_reqs,
            error_rate,
            latency: LatencyStats {
                avg_ms: p95_ms / 2.0,
                p95_ms,
                p99_ms: p95_ms * 1.5,
                max_ms: p95_ms * 2.0,
                ..LatencyStats::default()
            },
            rate_limited: 0,
            rate_limited_rate: 0.0,
            saturation: SaturationStats::default(),
        }
    }

    fn result(run_id: &str, day: u32, runs: Vec<RunMetrics>) -> RunResult {
        RunResult::new(
            run_id.to_string(),
            Utc.with_ymd_and_hms(2026, 10, day, 6, 0, 0).unwrap(),
            runs,
        )
    }

    #[test]
    fn worst_is_the_maximum_of_present_scenarios() {
        let both = vec![metrics("a", 120.0, 0.0, 10), metrics("b", 180.0, 0.0, 10)];
        assert_eq!(
            Some(180.0),
            worst_across_scenarios(&both, MetricField::P95, &["a", "b"])
        );

        let only_a = vec![metrics("a", 120.0, 0.0, 10)];
        assert_eq!(
            Some(120.0),
            worst_across_scenarios(&only_a, MetricField::P95, &["a", "b"])
        );

        assert_eq!(
            None,
            worst_across_scenarios(&[], MetricField::P95, &["a", "b"])
        );
    }

    #[test]
    fn worst_applies_to_any_field() {
        let runs = vec![metrics("a", 120.0, 0.02, 10), metrics("b", 180.0, 0.01, 10)];

        assert_eq!(
            Some(270.0),
            worst_across_scenarios(&runs, MetricField::P99, &["a", "b"])
        );
        assert_eq!(
            Some(0.02),
            worst_across_scenarios(&runs, MetricField::ErrorRate, &["a", "b"])
        );
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let runs = vec![metrics("a", f64::NAN, 0.0, 10), metrics("b", 90.0, 0.0, 10)];
        assert_eq!(
            Some(90.0),
            worst_across_scenarios(&runs, MetricField::P95, &["a", "b"])
        );
    }

    #[test]
    fn first_duplicate_wins() {
        let runs = vec![metrics("a", 10.0, 0.0, 5), metrics("a", 500.0, 0.5, 7)];

        assert_eq!(5, extract_scenario(&runs, "a").unwrap().http_reqs);
        assert_eq!(5, total_requests(&runs, &["a", "a"]));
        assert!(extract_scenario(&runs, "missing").is_none());
    }

    #[test]
    fn total_requests_sums_present_scenarios() {
        let runs = vec![metrics("a", 10.0, 0.0, 1200), metrics("b", 10.0, 0.0, 300)];
        assert_eq!(1500, total_requests(&runs, &["a", "b", "c"]));
    }

    #[test]
    fn trend_skips_missing_runs_and_sorts_by_time() {
        let history = ResultHistory::from(vec![
            result("third", 3, vec![metrics("redirect", 30.0, 0.03, 10)]),
            result("first", 1, vec![metrics("redirect", 10.0, 0.01, 10)]),
            result("second", 2, vec![metrics("shorten", 99.0, 0.0, 10)]),
        ]);

        let trend = build_trend(&history, "redirect");

        assert_eq!(
            vec![
                TrendPoint {
                    timestamp_label: "Oct 01".to_string(),
                    timestamp_value: Utc
                        .with_ymd_and_hms(2026, 10, 1, 6, 0, 0)
                        .unwrap()
                        .timestamp_millis(),
                    p95: 10.0,
                    p99: 15.0,
                    error_rate: 0.01,
                },
                TrendPoint {
                    timestamp_label: "Oct 03".to_string(),
                    timestamp_value: Utc
                        .with_ymd_and_hms(2026, 10, 3, 6, 0, 0)
                        .unwrap()
                        .timestamp_millis(),
                    p95: 30.0,
                    p99: 45.0,
                    error_rate: 0.03,
                },
            ],
            trend
        );
    }

    #[test]
    fn trend_is_repeatable() {
        let history = ResultHistory::from(vec![
            result("b", 5, vec![metrics("redirect", 50.0, 0.0, 10)]),
            result("a", 4, vec![metrics("redirect", 40.0, 0.0, 10)]),
        ]);

        assert_eq!(
            build_trend(&history, "redirect"),
            build_trend(&history, "redirect")
        );
        assert!(build_trend(&history, "shorten").is_empty());
    }
}
