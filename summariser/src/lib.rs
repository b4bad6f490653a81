pub mod aggregator;
pub mod dashboard;
pub mod format;
pub mod health;
pub mod ingest;

pub use aggregator::{
    build_trend, extract_scenario, total_requests, worst_across_scenarios, MetricField, TrendPoint,
};
pub use dashboard::{Dashboard, ScenarioPanel};
pub use health::{HealthThresholds, HealthVerdict, ScenarioVerdict};
pub use ingest::{Ingested, IngestionError, ResultSource};
