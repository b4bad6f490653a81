use perf_tunnel_summary_model::RunMetrics;
use tabled::Tabled;

#[derive(Tabled)]
pub struct ScenarioRow {
    pub scenario: String,
    pub http_reqs: u64,
    pub iterations: u64,
    #[tabled(display = "pct2")]
    pub error_rate: f64,
    pub rate_limited: u64,
    #[tabled(display = "float2")]
    pub avg_ms: f64,
    #[tabled(display = "float2")]
    pub med_ms: f64,
    #[tabled(display = "float2")]
    pub p95_ms: f64,
    #[tabled(display = "float2")]
    pub p99_ms: f64,
    #[tabled(display = "float2")]
    pub max_ms: f64,
}

impl From<&RunMetrics> for ScenarioRow {
    fn from(metrics: &RunMetrics) -> Self {
        Self {
            scenario: metrics.name.clone(),
            http_reqs: metrics.http_reqs,
            iterations: metrics.iterations,
            error_rate: metrics.error_rate,
            rate_limited: metrics.rate_limited,
            avg_ms: metrics.latency.avg_ms,
            med_ms: metrics.latency.med_ms,
            p95_ms: metrics.latency.p95_ms,
            p99_ms: metrics.latency.p99_ms,
            max_ms: metrics.latency.max_ms,
        }
    }
}

#[derive(Tabled)]
pub struct SaturationRow {
    pub scenario: String,
    pub max_workers_used: usize,
    pub max_backlog: usize,
    pub late_admissions: u64,
    #[tabled(display = "float2")]
    pub max_admission_lag_ms: f64,
    pub dropped_iterations: u64,
}

impl From<&RunMetrics> for SaturationRow {
    fn from(metrics: &RunMetrics) -> Self {
        let saturation = &metrics.saturation;
        Self {
            scenario: metrics.name.clone(),
            max_workers_used: saturation.max_workers_used,
            max_backlog: saturation.max_backlog,
            late_admissions: saturation.late_admissions,
            max_admission_lag_ms: saturation.max_admission_lag_ms,
            dropped_iterations: saturation.dropped_iterations,
        }
    }
}

#[derive(Tabled)]
pub struct FailureRow {
    pub scenario: String,
    pub kind: String,
    pub count: u64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

fn pct2(n: &f64) -> String {
    format!("{:.2}%", n * 100.0)
}
