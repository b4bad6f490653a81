use crate::aggregator::{
    build_trend, extract_scenario, total_requests, worst_across_scenarios, MetricField, TrendPoint,
};
use crate::format::{fmt_ms, fmt_num, fmt_opt_ms, fmt_opt_pct, fmt_pct};
use crate::health::{HealthThresholds, HealthVerdict, ScenarioVerdict};
use crate::ingest::Ingested;
use chrono::{DateTime, Utc};
use perf_tunnel_summary_model::RunMetrics;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// A trend needs at least this many points before it is worth drawing.
pub const MIN_CHARTABLE_POINTS: usize = 2;

/// Everything the performance dashboard shows, derived fresh from one ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub source: String,
    pub run_id: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub verdict: HealthVerdict,
    pub worst_p95_ms: Option<f64>,
    pub worst_p99_ms: Option<f64>,
    pub worst_error_rate: Option<f64>,
    pub total_requests: u64,
    pub scenarios: Vec<ScenarioPanel>,
    /// Documents that could not be loaded. The rest of the dashboard is built from what could.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPanel {
    pub name: String,
    pub verdict: ScenarioVerdict,
    pub latest: Option<RunMetrics>,
    pub trend: Vec<TrendPoint>,
    pub chartable: bool,
}

impl Dashboard {
    pub fn build<S: AsRef<str>>(
        source: impl Into<String>,
        ingested: &Ingested,
        scenario_names: &[S],
        thresholds: &HealthThresholds,
    ) -> Self {
        let runs: &[RunMetrics] = ingested
            .latest
            .as_ref()
            .map(|latest| latest.runs.as_slice())
            .unwrap_or_default();

        let worst_p95_ms = worst_across_scenarios(runs, MetricField::P95, scenario_names);
        let worst_p99_ms = worst_across_scenarios(runs, MetricField::P99, scenario_names);
        let worst_error_rate = worst_across_scenarios(runs, MetricField::ErrorRate, scenario_names);

        let scenarios = scenario_names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let latest = extract_scenario(runs, name);
                let trend = ingested
                    .history
                    .as_ref()
                    .map(|history| build_trend(history, name))
                    .unwrap_or_default();

                ScenarioPanel {
                    name: name.to_string(),
                    verdict: thresholds.scenario_verdict(latest),
                    latest: latest.cloned(),
                    chartable: trend.len() >= MIN_CHARTABLE_POINTS,
                    trend,
                }
            })
            .collect();

        Self {
            source: source.into(),
            run_id: ingested.latest.as_ref().map(|latest| latest.run_id.clone()),
            generated_at: ingested.latest.as_ref().map(|latest| latest.generated_at),
            verdict: thresholds.verdict(worst_error_rate, worst_p95_ms),
            worst_p95_ms,
            worst_p99_ms,
            worst_error_rate,
            total_requests: total_requests(runs, scenario_names),
            scenarios,
            errors: ingested.errors.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn print(&self) {
        println!(
            "\n{} · p95 {} · err {} · source {} · run {}",
            self.verdict,
            fmt_opt_ms(self.worst_p95_ms),
            fmt_opt_pct(self.worst_error_rate),
            self.source,
            self.run_id.as_deref().unwrap_or("-"),
        );

        let mut table = Table::new(self.scenarios.iter().map(ScenarioRow::from));
        table.with(Style::modern());
        println!("{table}");

        let trends = self
            .scenarios
            .iter()
            .filter(|panel| panel.chartable)
            .flat_map(|panel| {
                panel.trend.iter().map(|point| TrendRow {
                    scenario: panel.name.clone(),
                    date: point.timestamp_label.clone(),
                    p95: fmt_ms(point.p95),
                    p99: fmt_ms(point.p99),
                    errors: fmt_pct(point.error_rate),
                })
            })
            .collect::<Vec<_>>();
        if !trends.is_empty() {
            println!("\nTrends");
            let mut table = Table::new(trends);
            table.with(Style::modern());
            println!("{table}");
        }

        for error in &self.errors {
            println!("Could not load results: {error}");
        }
    }
}

#[derive(Tabled)]
struct ScenarioRow {
    scenario: String,
    verdict: ScenarioVerdict,
    avg: String,
    p95: String,
    p99: String,
    max: String,
    errors: String,
    reqs: String,
    trend_points: usize,
}

impl From<&ScenarioPanel> for ScenarioRow {
    fn from(panel: &ScenarioPanel) -> Self {
        let latest = panel.latest.as_ref();
        let ms = |f: fn(&RunMetrics) -> f64| fmt_opt_ms(latest.map(f));

        Self {
            scenario: panel.name.clone(),
            verdict: panel.verdict,
            avg: ms(|m| m.latency.avg_ms),
            p95: ms(|m| m.latency.p95_ms),
            p99: ms(|m| m.latency.p99_ms),
            max: ms(|m| m.latency.max_ms),
            errors: fmt_opt_pct(latest.map(|m| m.error_rate)),
            reqs: latest
                .map(|m| fmt_num(m.http_reqs as f64))
                .unwrap_or_else(|| "-".to_string()),
            trend_points: panel.trend.len(),
        }
    }
}

#[derive(Tabled)]
struct TrendRow {
    scenario: String,
    date: String,
    p95: String,
    p99: String,
    errors: String,
}
