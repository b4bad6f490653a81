mod fold;
mod outcome;
mod percentile;
mod report;

pub use fold::MetricsFold;
pub use outcome::{RequestOutcome, Verdict};
pub use percentile::{nearest_rank, summarise_latencies};
pub use report::{ReportCollector, ReportConfig, Reporter, ScenarioReport};
