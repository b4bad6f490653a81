use crate::pool::LATE_ADMISSION_FLOOR;
use crate::scenario::{classify, throttle_backoff, OutcomeCheck, DEFAULT_SCENARIO_DURATION};
use futures::future::BoxFuture;
use perf_tunnel_core::prelude::ShutdownHandle;
use perf_tunnel_instruments::{MetricsFold, RequestOutcome, ScenarioReport, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A closed-loop behaviour. Each worker runs iterations back to back for the scenario's duration.
///
/// An iteration may make any number of requests, recording each one through the
/// [IterationContext], and returns how long to pause before the next iteration.
pub trait SequentialBehaviour: Send + Sync + 'static {
    fn iterate<'a>(&'a self, ctx: &'a mut IterationContext) -> BoxFuture<'a, Duration>;
}

/// Per-worker state handed to each iteration of a [SequentialBehaviour].
pub struct IterationContext {
    worker_id: usize,
    iteration: u64,
    rate_limit_aware: bool,
    fold: MetricsFold,
    throttle_pause: Option<Duration>,
}

impl IterationContext {
    fn new(worker_id: usize, rate_limit_aware: bool) -> Self {
        Self {
            worker_id,
            iteration: 0,
            rate_limit_aware,
            fold: MetricsFold::new(LATE_ADMISSION_FLOOR),
            throttle_pause: None,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Judge `outcome` against `check` and add it to this worker's figures.
    ///
    /// When the outcome is rate limited the next pause is replaced by [throttle_backoff].
    pub fn record<C: OutcomeCheck + ?Sized>(
        &mut self,
        check: &C,
        outcome: &RequestOutcome,
    ) -> Verdict {
        let verdict = classify(check, self.rate_limit_aware, outcome);
        self.fold.record_request(outcome.elapsed, verdict);
        if verdict == Verdict::RateLimited {
            self.throttle_pause = Some(throttle_backoff(outcome));
        }

        verdict
    }
}

/// Ramp the number of active workers linearly to `target` over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStage {
    pub duration: Duration,
    pub target: usize,
}

impl WorkerStage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// How often an idle staged worker checks whether it has become active.
pub const STAGE_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub struct SequentialConfig {
    name: String,
    duration: Duration,
    workers: usize,
    stages: Vec<WorkerStage>,
    rate_limit_aware: bool,
}

impl SequentialConfig {
    pub fn new(name: impl Into<String>, workers: usize) -> anyhow::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("Scenario name must not be empty");
        }
        if workers < 1 {
            anyhow::bail!("Scenario [{name}] needs at least one worker");
        }

        Ok(Self {
            name,
            duration: DEFAULT_SCENARIO_DURATION,
            workers,
            stages: Vec::new(),
            rate_limit_aware: false,
        })
    }

    /// Start with the configured worker count and move through `stages` in order. The duration
    /// becomes the sum of the stage durations. After the last stage its target is held.
    pub fn with_stages(mut self, stages: Vec<WorkerStage>) -> anyhow::Result<Self> {
        if stages.is_empty() {
            anyhow::bail!("Scenario [{}] needs at least one stage", self.name);
        }
        if stages.iter().any(|stage| stage.duration.is_zero()) {
            anyhow::bail!("Scenario [{}] has a stage with no duration", self.name);
        }

        self.duration = stages.iter().map(|stage| stage.duration).sum();
        self.stages = stages;
        Ok(self)
    }

    /// Replaces the duration. Stages are kept, so a shorter duration cuts the ramp short.
    pub fn with_duration(mut self, duration: Duration) -> anyhow::Result<Self> {
        if duration.is_zero() {
            anyhow::bail!("Scenario [{}] needs a non-zero duration", self.name);
        }
        self.duration = duration;
        Ok(self)
    }

    pub fn with_rate_limit_aware(mut self, rate_limit_aware: bool) -> Self {
        self.rate_limit_aware = rate_limit_aware;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The number of workers the scenario starts with.
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stages(&self) -> &[WorkerStage] {
        &self.stages
    }

    /// The most workers that are ever active at once.
    pub fn max_workers(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .fold(self.workers, usize::max)
    }

    /// How many workers should be running `elapsed` after the scenario started, rounded to the
    /// nearest whole worker.
    pub fn active_workers_at(&self, elapsed: Duration) -> usize {
        let mut from = self.workers;
        let mut stage_start = Duration::ZERO;
        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                let count = from as f64 + (stage.target as f64 - from as f64) * progress;
                return count.round() as usize;
            }
            from = stage.target;
            stage_start = stage_end;
        }

        from
    }
}

pub struct SequentialDriver {
    config: SequentialConfig,
    behaviour: Arc<dyn SequentialBehaviour>,
    grace_period: Duration,
}

impl SequentialDriver {
    pub fn new(
        config: SequentialConfig,
        behaviour: Arc<dyn SequentialBehaviour>,
        grace_period: Duration,
    ) -> Self {
        Self {
            config,
            behaviour,
            grace_period,
        }
    }

    /// Run every worker until the duration elapses or `run_shutdown` fires. An iteration still
    /// running when the grace period ends is cut short and its in-flight request is abandoned.
    ///
    /// Worker `n` only starts an iteration while more than `n` workers should be active, so a
    /// staged scenario grows and shrinks between iterations without cutting any short.
    pub async fn run(self, run_shutdown: ShutdownHandle) -> ScenarioReport {
        let name = self.config.name().to_string();
        let started = Instant::now();
        let deadline = started + self.config.duration();
        let hard_deadline = deadline + self.grace_period;
        let max_workers = self.config.max_workers();
        let config = Arc::new(self.config);

        log::info!(
            "Starting sequential scenario [{}] with {} workers (max {}) for {:?}",
            name,
            config.workers(),
            max_workers,
            config.duration()
        );

        let workers = (0..max_workers)
            .map(|worker_id| {
                let behaviour = self.behaviour.clone();
                let config = config.clone();
                let mut listener = run_shutdown.new_listener();
                let mut ctx = IterationContext::new(worker_id, config.rate_limit_aware);
                let name = name.clone();

                tokio::spawn(async move {
                    while Instant::now() < deadline && !listener.should_shutdown() {
                        if worker_id >= config.active_workers_at(started.elapsed()) {
                            let recheck_at = (Instant::now() + STAGE_POLL_INTERVAL).min(deadline);
                            tokio::select! {
                                _ = tokio::time::sleep_until(recheck_at) => continue,
                                _ = listener.wait_for_shutdown() => break,
                            }
                        }

                        let iterated =
                            tokio::time::timeout_at(hard_deadline, behaviour.iterate(&mut ctx))
                                .await;
                        let pause = match iterated {
                            Ok(pause) => pause,
                            Err(_) => {
                                log::warn!("Worker {worker_id} of [{name}] abandoned an iteration after the grace period");
                                ctx.fold.record_abandoned();
                                break;
                            }
                        };
                        ctx.fold.record_iteration(Duration::ZERO);
                        ctx.iteration += 1;

                        let pause = ctx.throttle_pause.take().unwrap_or(pause);
                        let resume_at = (Instant::now() + pause).min(deadline);
                        tokio::select! {
                            _ = tokio::time::sleep_until(resume_at) => {}
                            _ = listener.wait_for_shutdown() => break,
                        }
                    }

                    ctx.fold
                })
            })
            .collect::<Vec<_>>();

        let mut fold = MetricsFold::new(LATE_ADMISSION_FLOOR);
        for result in futures::future::join_all(workers).await {
            match result {
                Ok(worker_fold) => fold.merge(worker_fold),
                Err(e) => log::error!("Worker for scenario [{name}] failed: {e:?}"),
            }
        }
        fold.record_pool_usage(max_workers, 0);

        ScenarioReport::new(name, fold)
    }
}
