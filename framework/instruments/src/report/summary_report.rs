mod scenario_table;

use crate::report::ReportCollector;
use perf_tunnel_core::prelude::FailureKind;
use perf_tunnel_summary_model::RunMetrics;
use scenario_table::{FailureRow, ScenarioRow, SaturationRow};
use std::collections::BTreeMap;
use tabled::settings::Style;
use tabled::Table;

/// Keeps one row per scenario in memory and prints them as tables when the run is finalized.
pub struct SummaryReportCollector {
    scenarios: Vec<ScenarioRow>,
    saturation: Vec<SaturationRow>,
    failures: Vec<FailureRow>,
}

impl SummaryReportCollector {
    pub fn new() -> Self {
        Self {
            scenarios: Vec::new(),
            saturation: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn print_summary_of_scenarios(&self) {
        println!("\nSummary of scenarios");
        let mut table = Table::new(&self.scenarios);
        table.with(Style::modern());
        println!("{table}");

        println!("\nLoad generator saturation");
        let mut table = Table::new(&self.saturation);
        table.with(Style::modern());
        println!("{table}");

        if !self.failures.is_empty() {
            println!("\nFailures by kind");
            let mut table = Table::new(&self.failures);
            table.with(Style::modern());
            println!("{table}");
        }
    }
}

impl Default for SummaryReportCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCollector for SummaryReportCollector {
    fn add_scenario(&mut self, metrics: &RunMetrics, failures: &BTreeMap<FailureKind, u64>) {
        self.scenarios.push(ScenarioRow::from(metrics));
        self.saturation.push(SaturationRow::from(metrics));
        self.failures
            .extend(failures.iter().map(|(kind, count)| FailureRow {
                scenario: metrics.name.clone(),
                kind: kind.to_string(),
                count: *count,
            }));
    }

    fn finalize(&self) {
        self.print_summary_of_scenarios();
    }
}
