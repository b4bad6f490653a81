use futures::future::BoxFuture;
use perf_tunnel_core::prelude::FailureKind;
use perf_tunnel_instruments::{RequestOutcome, Verdict};
use std::time::Duration;

/// Used when a scenario does not set its own duration and the CLI does not override it.
pub const DEFAULT_SCENARIO_DURATION: Duration = Duration::from_secs(60);

pub const MIN_THROTTLE_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_THROTTLE_BACKOFF: Duration = Duration::from_secs(10);

/// Identifies a single invocation of a [TrafficScenario].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Index of the worker performing the invocation, unique within the scenario.
    pub worker_id: usize,
    /// How many invocations this worker has performed before this one.
    pub iteration: u64,
    /// Position of the invocation on the scenario's arrival schedule.
    pub seq: u64,
}

/// Decides whether a response counts as a success.
pub trait OutcomeCheck: Send + Sync {
    /// Only consulted for outcomes that have a status and are not a 429 handled by the
    /// rate-limit policy.
    fn is_success(&self, outcome: &RequestOutcome) -> bool;

    /// The failure reported for a response that [OutcomeCheck::is_success] rejected.
    fn failure_kind(&self, _outcome: &RequestOutcome) -> FailureKind {
        FailureKind::UnexpectedStatus
    }
}

/// The unit of work driven by an arrival-rate scenario.
///
/// Each invocation must perform exactly one HTTP call. Network errors are returned as an outcome
/// with no status rather than as an error, so every invocation produces a measurement.
pub trait TrafficScenario: OutcomeCheck + 'static {
    fn invoke(&self, invocation: Invocation) -> BoxFuture<'_, RequestOutcome>;
}

/// Decide how an outcome counts towards the run's figures.
///
/// A network failure is always a failure. A 429 is tallied as rate limited when the scenario is
/// rate-limit aware and as a throttle failure otherwise. Anything else is judged by `check`.
pub fn classify<C: OutcomeCheck + ?Sized>(
    check: &C,
    rate_limit_aware: bool,
    outcome: &RequestOutcome,
) -> Verdict {
    match outcome.status {
        None => Verdict::Failed(FailureKind::NetworkFailure),
        Some(429) if rate_limit_aware => Verdict::RateLimited,
        Some(429) => Verdict::Failed(FailureKind::ThrottleResponse),
        Some(_) if check.is_success(outcome) => Verdict::Success,
        Some(_) => Verdict::Failed(check.failure_kind(outcome)),
    }
}

/// How long a worker should pause after being rate limited.
///
/// Honours a numeric `Retry-After` header, clamped to between one and ten seconds. A missing or
/// non-numeric header gives the minimum.
pub fn throttle_backoff(outcome: &RequestOutcome) -> Duration {
    outcome
        .retry_after_secs()
        .map(Duration::from_secs)
        .unwrap_or(MIN_THROTTLE_BACKOFF)
        .clamp(MIN_THROTTLE_BACKOFF, MAX_THROTTLE_BACKOFF)
}

/// Configuration for one constant-arrival-rate scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    name: String,
    target_rate: f64,
    duration: Duration,
    preallocated_workers: usize,
    max_workers: usize,
    rate_limit_aware: bool,
    throttle_backoff: bool,
}

impl ScenarioConfig {
    /// Create a config for a scenario that starts `target_rate` invocations per second, beginning
    /// with `preallocated_workers` and growing to at most `max_workers` under backlog.
    ///
    /// The duration starts at [DEFAULT_SCENARIO_DURATION].
    pub fn new(
        name: impl Into<String>,
        target_rate: f64,
        preallocated_workers: usize,
        max_workers: usize,
    ) -> anyhow::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("Scenario name must not be empty");
        }
        if !target_rate.is_finite() || target_rate <= 0.0 {
            anyhow::bail!("Scenario [{name}] needs a positive target rate, got {target_rate}");
        }
        if preallocated_workers < 1 {
            anyhow::bail!("Scenario [{name}] needs at least one preallocated worker");
        }
        if preallocated_workers > max_workers {
            anyhow::bail!(
                "Scenario [{name}] preallocates {preallocated_workers} workers but allows at most {max_workers}"
            );
        }

        Ok(Self {
            name,
            target_rate,
            duration: DEFAULT_SCENARIO_DURATION,
            preallocated_workers,
            max_workers,
            rate_limit_aware: false,
            throttle_backoff: false,
        })
    }

    pub fn with_duration(mut self, duration: Duration) -> anyhow::Result<Self> {
        if duration.is_zero() {
            anyhow::bail!("Scenario [{}] needs a non-zero duration", self.name);
        }
        self.duration = duration;
        Ok(self)
    }

    /// Treat 429 responses as expected, see [classify].
    pub fn with_rate_limit_aware(mut self, rate_limit_aware: bool) -> Self {
        self.rate_limit_aware = rate_limit_aware;
        self
    }

    /// Pause a worker for [throttle_backoff] after it is rate limited. Only has an effect on a
    /// rate-limit aware scenario.
    pub fn with_throttle_backoff(mut self, throttle_backoff: bool) -> Self {
        self.throttle_backoff = throttle_backoff;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn preallocated_workers(&self) -> usize {
        self.preallocated_workers
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn rate_limit_aware(&self) -> bool {
        self.rate_limit_aware
    }

    pub fn throttle_backoff(&self) -> bool {
        self.rate_limit_aware && self.throttle_backoff
    }
}
