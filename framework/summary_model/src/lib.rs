use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

mod store;

pub use store::{ResultStore, HISTORY_FILE_NAME, LATEST_FILE_NAME};

/// Latency statistics for one scenario of one run, in milliseconds.
///
/// All percentiles are nearest-rank over the full sample of completed requests, so figures from
/// different runs can be compared directly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LatencyStats {
    pub avg_ms: f64,
    #[serde(default)]
    pub min_ms: f64,
    #[serde(default)]
    pub med_ms: f64,
    #[serde(default)]
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    /// Whether the rank statistics are ordered `min <= med <= p90 <= p95 <= p99 <= max`.
    ///
    /// This holds for any sample summarised with a rank-based percentile. The mean is not part of
    /// the check because a heavy tail can pull it above p95.
    pub fn is_rank_ordered(&self) -> bool {
        self.min_ms <= self.med_ms
            && self.med_ms <= self.p90_ms
            && self.p90_ms <= self.p95_ms
            && self.p95_ms <= self.p99_ms
            && self.p99_ms <= self.max_ms
    }
}

/// Figures that show whether the load generator itself kept up with the arrival schedule.
///
/// Late admissions are kept apart from latency so that a slow backend and a saturated worker pool
/// can be told apart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaturationStats {
    /// Invocations that started noticeably later than their scheduled instant
    pub late_admissions: u64,
    /// The largest gap between a scheduled instant and the invocation actually starting
    pub max_admission_lag_ms: f64,
    /// The deepest the queue of scheduled but undispatched instants got
    pub max_backlog: usize,
    /// The number of workers the pool grew to
    pub max_workers_used: usize,
    /// Instants that were still queued when the grace period ran out
    pub dropped_iterations: u64,
}

/// Aggregate figures for one scenario of one completed run.
///
/// Created once when the scenario finishes and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    /// The scenario name, unique within a run
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Requests issued, including ones abandoned at the end of the run
    pub http_reqs: u64,
    /// Invocations that ran to completion
    pub iterations: u64,
    /// Failed requests divided by [RunMetrics::http_reqs], in `0.0..=1.0`
    pub error_rate: f64,
    pub latency: LatencyStats,
    /// Responses with status 429 when the scenario treats throttling as expected
    #[serde(default)]
    pub rate_limited: u64,
    #[serde(default)]
    pub rate_limited_rate: f64,
    #[serde(default)]
    pub saturation: SaturationStats,
}

/// The record a completed run produces, one [RunMetrics] per scenario that was executed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Chosen by the runner, unique for each run
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub runs: Vec<RunMetrics>,
}

impl RunResult {
    pub fn new(run_id: String, generated_at: DateTime<Utc>, runs: Vec<RunMetrics>) -> Self {
        Self {
            run_id,
            generated_at,
            runs,
        }
    }
}

/// Every published [RunResult], in the order it was appended.
///
/// Insertion order is not guaranteed to match `generated_at` order, so consumers that need a time
/// series must sort. Entries are never edited or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResultHistory(Vec<RunResult>);

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result, refusing a `run_id` that is already present.
    pub fn append(&mut self, result: RunResult) -> anyhow::Result<()> {
        if self.0.iter().any(|r| r.run_id == result.run_id) {
            anyhow::bail!("Run [{}] is already in the history", result.run_id);
        }

        self.0.push(result);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunResult> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<RunResult>> for ResultHistory {
    fn from(value: Vec<RunResult>) -> Self {
        Self(value)
    }
}

/// Serialize a run result to a writer
pub fn store_run_result<W: Write>(run_result: &RunResult, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, run_result)?;
    Ok(())
}

/// Load a run result from a reader
pub fn load_run_result<R: Read>(reader: R) -> anyhow::Result<RunResult> {
    let reader = std::io::BufReader::new(reader);
    let run_result: RunResult = serde_json::from_reader(reader)?;
    Ok(run_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_metrics(name: &str) -> RunMetrics {
        RunMetrics {
            name: name.to_string(),
            run_id: None,
            created_at: None,
            http_reqs: 40,
            iterations: 40,
            error_rate: 0.075,
            latency: LatencyStats {
                avg_ms: 12.5,
                min_ms: 3.0,
                med_ms: 11.0,
                p90_ms: 20.0,
                p95_ms: 24.0,
                p99_ms: 31.0,
                max_ms: 33.0,
            },
            rate_limited: 0,
            rate_limited_rate: 0.0,
            saturation: SaturationStats::default(),
        }
    }

    #[test]
    fn serialises_with_dashboard_field_names() {
        let result = RunResult::new(
            "run-1".to_string(),
            Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
            vec![sample_metrics("redirect")],
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["runId"], "run-1");
        assert_eq!(value["generatedAt"], "2026-10-01T12:00:00Z");
        assert_eq!(value["runs"][0]["httpReqs"], 40);
        assert_eq!(value["runs"][0]["errorRate"], 0.075);
        assert_eq!(value["runs"][0]["latency"]["p95_ms"], 24.0);
        assert_eq!(value["runs"][0]["saturation"]["lateAdmissions"], 0);
    }

    #[test]
    fn parses_minimal_document() {
        let json = r#"{
            "runId": "abc",
            "generatedAt": "2026-09-30T08:15:00Z",
            "runs": [{
                "name": "redirect_domain_safe",
                "runId": "abc",
                "createdAt": "2026-09-30T08:14:00Z",
                "httpReqs": 1200,
                "iterations": 1200,
                "errorRate": 0.0,
                "latency": { "avg_ms": 21.4, "p95_ms": 48.2, "p99_ms": 80.1, "max_ms": 310.9 }
            }]
        }"#;

        let result = load_run_result(json.as_bytes()).unwrap();
        assert_eq!(result.runs.len(), 1);
        let run = &result.runs[0];
        assert_eq!(run.rate_limited, 0);
        assert_eq!(run.saturation, SaturationStats::default());
        assert_eq!(run.latency.min_ms, 0.0);
        assert_eq!(run.run_id.as_deref(), Some("abc"));
    }

    #[test]
    fn history_rejects_duplicate_run_ids() {
        let mut history = ResultHistory::new();
        let generated_at = Utc::now();
        history
            .append(RunResult::new("a".to_string(), generated_at, vec![]))
            .unwrap();

        let err = history
            .append(RunResult::new("a".to_string(), generated_at, vec![]))
            .unwrap_err();
        assert!(err.to_string().contains("already in the history"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn rank_ordering_check() {
        assert!(sample_metrics("a").latency.is_rank_ordered());

        let mut broken = sample_metrics("a").latency;
        broken.p99_ms = broken.max_ms + 1.0;
        assert!(!broken.is_rank_ordered());
    }

    #[test]
    fn store_then_load_keeps_result() {
        let result = RunResult::new(
            "run-2".to_string(),
            Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap(),
            vec![sample_metrics("shorten"), sample_metrics("redirect")],
        );

        let mut buf = Vec::new();
        store_run_result(&result, &mut buf).unwrap();
        assert_eq!(result, load_run_result(buf.as_slice()).unwrap());
    }
}
