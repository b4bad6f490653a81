use perf_tunnel_core::prelude::FailureKind;
use std::collections::HashMap;
use std::time::Duration;

/// The raw result of one HTTP call. Discarded once it has been folded into the run's metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// `None` when the request failed before a response arrived
    pub status: Option<u16>,
    /// Time from sending the request until the response body was read
    pub elapsed: Duration,
    /// Response headers with lower-cased names
    pub headers: Option<HashMap<String, String>>,
    /// Connection level error, if any
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn response(status: u16, elapsed: Duration, headers: HashMap<String, String>) -> Self {
        Self {
            status: Some(status),
            elapsed,
            headers: Some(
                headers
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect(),
            ),
            error: None,
        }
    }

    pub fn network_failure(elapsed: Duration, error: impl ToString) -> Self {
        Self {
            status: None,
            elapsed,
            headers: None,
            error: Some(error.to_string()),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// The `Retry-After` header as whole seconds, when it is present and numeric.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn is_status(&self, status: u16) -> bool {
        self.status == Some(status)
    }
}

/// How one outcome counts towards the run's figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    /// A 429 that the scenario treats as expected. Not an error, but tallied separately.
    RateLimited,
    Failed(FailureKind),
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }
}
