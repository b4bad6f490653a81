use perf_tunnel_summary_model::RunMetrics;

/// Pass/fail limits applied to every scenario of a run once it completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_error_rate: f64,
    pub max_p95_ms: f64,
    pub max_p99_ms: f64,
    pub max_rate_limited_rate: f64,
    /// Limit on the number of rate-limited responses, unchecked when `None`
    pub max_rate_limited: Option<u64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_error_rate: 0.01,
            max_p95_ms: 150.0,
            max_p99_ms: 300.0,
            max_rate_limited_rate: 0.01,
            max_rate_limited: None,
        }
    }
}

#[derive(derive_more::Display, Debug, Clone, PartialEq)]
#[display("[{scenario}] {metric} was {actual:.4}, limit {limit:.4}")]
pub struct ThresholdBreach {
    pub scenario: String,
    pub metric: &'static str,
    pub limit: f64,
    pub actual: f64,
}

impl Thresholds {
    /// Every limit that `metrics` is at or over. A scenario that made no requests breaches nothing.
    pub fn evaluate(&self, metrics: &RunMetrics) -> Vec<ThresholdBreach> {
        if metrics.http_reqs == 0 {
            return Vec::new();
        }

        let rate_limited = self
            .max_rate_limited
            .map(|limit| ("rate_limited", limit as f64, metrics.rate_limited as f64));

        [
            ("error_rate", self.max_error_rate, metrics.error_rate),
            ("p95_ms", self.max_p95_ms, metrics.latency.p95_ms),
            ("p99_ms", self.max_p99_ms, metrics.latency.p99_ms),
            (
                "rate_limited_rate",
                self.max_rate_limited_rate,
                metrics.rate_limited_rate,
            ),
        ]
        .into_iter()
        .chain(rate_limited)
        .filter(|(_, limit, actual)| actual >= limit)
        .map(|(metric, limit, actual)| ThresholdBreach {
            scenario: metrics.name.clone(),
            metric,
            limit,
            actual,
        })
        .collect()
    }
}
