mod summary_report;

use crate::MetricsFold;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use perf_tunnel_core::prelude::FailureKind;
use perf_tunnel_summary_model::RunMetrics;
use std::collections::BTreeMap;

pub use summary_report::SummaryReportCollector;

/// Everything a finished scenario hands back to the runner.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub fold: MetricsFold,
}

impl ScenarioReport {
    pub fn new(name: impl Into<String>, fold: MetricsFold) -> Self {
        Self {
            name: name.into(),
            fold,
        }
    }

    pub fn to_metrics(&self, run_id: &str, created_at: DateTime<Utc>) -> RunMetrics {
        self.fold
            .clone()
            .finish(&self.name, Some(run_id.to_string()), Some(created_at))
    }
}

pub trait ReportCollector: Send {
    fn add_scenario(&mut self, metrics: &RunMetrics, failures: &BTreeMap<FailureKind, u64>);

    fn finalize(&self);
}

/// Choose which collectors a [Reporter] fans out to.
#[derive(Debug, Default)]
pub struct ReportConfig {
    summary: bool,
}

impl ReportConfig {
    /// Print a table of per-scenario figures when the run finishes.
    pub fn enable_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors: Vec<Box<dyn ReportCollector>> = Vec::new();
        if self.summary {
            collectors.push(Box::new(SummaryReportCollector::new()));
        }

        Reporter {
            collectors: Mutex::new(collectors),
        }
    }
}

pub struct Reporter {
    collectors: Mutex<Vec<Box<dyn ReportCollector>>>,
}

impl Reporter {
    pub fn add_scenario(&self, metrics: &RunMetrics, failures: &BTreeMap<FailureKind, u64>) {
        for collector in self.collectors.lock().iter_mut() {
            collector.add_scenario(metrics, failures);
        }
    }

    pub fn finalize(&self) {
        for collector in self.collectors.lock().iter() {
            collector.finalize();
        }
    }
}
