use perf_tunnel_summary_model::RunMetrics;
use serde::{Deserialize, Serialize};

/// Ceilings a run must stay strictly below to count as healthy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthThresholds {
    pub error_rate_ceiling: f64,
    pub p95_ceiling_ms: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            error_rate_ceiling: 0.01,
            p95_ceiling_ms: 150.0,
        }
    }
}

#[derive(derive_more::Display, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthVerdict {
    Healthy,
    Degraded,
}

#[derive(derive_more::Display, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioVerdict {
    #[serde(rename = "OK")]
    #[display("OK")]
    Ok,
    Watch,
}

impl HealthThresholds {
    /// Healthy when both the worst error rate and the worst p95 are below their ceilings.
    /// A figure with no data counts as zero.
    pub fn is_healthy(&self, worst_error_rate: Option<f64>, worst_p95_ms: Option<f64>) -> bool {
        worst_error_rate.unwrap_or(0.0) < self.error_rate_ceiling
            && worst_p95_ms.unwrap_or(0.0) < self.p95_ceiling_ms
    }

    pub fn verdict(&self, worst_error_rate: Option<f64>, worst_p95_ms: Option<f64>) -> HealthVerdict {
        if self.is_healthy(worst_error_rate, worst_p95_ms) {
            HealthVerdict::Healthy
        } else {
            HealthVerdict::Degraded
        }
    }

    /// The same check applied to a single scenario's latest figures.
    pub fn scenario_verdict(&self, metrics: Option<&RunMetrics>) -> ScenarioVerdict {
        let ok = self.is_healthy(
            metrics.map(|m| m.error_rate),
            metrics.map(|m| m.latency.p95_ms),
        );
        if ok {
            ScenarioVerdict::Ok
        } else {
            ScenarioVerdict::Watch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn healthy_below_both_ceilings() {
        let thresholds = HealthThresholds::default();

        assert!(thresholds.is_healthy(Some(0.005), Some(140.0)));
        assert!(!thresholds.is_healthy(Some(0.02), Some(100.0)));
        assert!(!thresholds.is_healthy(Some(0.0), Some(150.0)));
        assert!(!thresholds.is_healthy(Some(0.01), Some(1.0)));
    }

    #[test]
    fn missing_figures_count_as_zero() {
        let thresholds = HealthThresholds::default();

        assert_eq!(HealthVerdict::Healthy, thresholds.verdict(None, None));
        assert_eq!(HealthVerdict::Degraded, thresholds.verdict(None, Some(200.0)));
        assert_eq!(ScenarioVerdict::Ok, thresholds.scenario_verdict(None));
    }

    #[test]
    fn ceilings_are_configurable() {
        let strict = HealthThresholds {
            error_rate_ceiling: 0.001,
            p95_ceiling_ms: 50.0,
        };
        assert!(!strict.is_healthy(Some(0.005), Some(40.0)));
        assert!(!strict.is_healthy(Some(0.0), Some(60.0)));
        assert!(strict.is_healthy(Some(0.0), Some(40.0)));
    }

    #[test]
    fn verdicts_serialise_as_shown() {
        assert_eq!("\"OK\"", serde_json::to_string(&ScenarioVerdict::Ok).unwrap());
        assert_eq!(
            "\"Degraded\"",
            serde_json::to_string(&HealthVerdict::Degraded).unwrap()
        );
    }

    #[test]
    fn verdicts_display_as_serialised() {
        assert_eq!("OK", ScenarioVerdict::Ok.to_string());
        assert_eq!("Watch", ScenarioVerdict::Watch.to_string());
        assert_eq!("Healthy", HealthVerdict::Healthy.to_string());
        assert_eq!("Degraded", HealthVerdict::Degraded.to_string());
    }
}
