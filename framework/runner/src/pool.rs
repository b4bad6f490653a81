use crate::clock::{InvocationInstant, ScenarioClock};
use crate::scenario::{classify, throttle_backoff, Invocation, ScenarioConfig, TrafficScenario};
use perf_tunnel_core::prelude::{DelegatedShutdownListener, ShutdownHandle};
use perf_tunnel_instruments::{MetricsFold, ScenarioReport, Verdict};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Admission lag below this is scheduling jitter rather than saturation.
pub const LATE_ADMISSION_FLOOR: Duration = Duration::from_millis(10);

/// How long to wait for in-flight invocations once the schedule is exhausted.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

struct Dispatch {
    instant: InvocationInstant,
    due: Instant,
}

#[derive(Default)]
struct PoolGauges {
    backlog: AtomicUsize,
    idle: AtomicUsize,
    max_backlog: AtomicUsize,
}

type SharedQueue = Arc<Mutex<UnboundedReceiver<Dispatch>>>;

/// Drives one [TrafficScenario] at a constant arrival rate.
///
/// Instants from the [ScenarioClock] are released on time into a queue whatever the state of the
/// workers, so a slow target shows up as admission lag and queue depth rather than as a lower
/// request rate. The pool starts with the preallocated number of workers and adds one whenever
/// the queue holds more invocations than there are idle workers, up to the configured maximum.
pub struct WorkerPool {
    config: ScenarioConfig,
    scenario: Arc<dyn TrafficScenario>,
    grace_period: Duration,
}

impl WorkerPool {
    pub fn new(
        config: ScenarioConfig,
        scenario: Arc<dyn TrafficScenario>,
        grace_period: Duration,
    ) -> Self {
        Self {
            config,
            scenario,
            grace_period,
        }
    }

    /// Run the scenario to completion, or until `run_shutdown` fires.
    ///
    /// Once the schedule is exhausted workers get the grace period to finish. Anything still in
    /// flight after that is abandoned and anything still queued is dropped.
    pub async fn run(self, run_shutdown: ShutdownHandle) -> ScenarioReport {
        let name = self.config.name().to_string();
        let clock = ScenarioClock::new(self.config.target_rate(), self.config.duration());
        let late_after = clock.interval().max(LATE_ADMISSION_FLOOR);

        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));
        let gauges = Arc::new(PoolGauges::default());
        let stop = ShutdownHandle::new();

        let new_worker = |worker_id: usize| {
            spawn_worker(
                worker_id,
                self.config.clone(),
                self.scenario.clone(),
                queue.clone(),
                gauges.clone(),
                stop.new_listener(),
                late_after,
            )
        };

        let mut workers = (0..self.config.preallocated_workers())
            .map(new_worker)
            .collect::<Vec<_>>();

        log::info!(
            "Starting scenario [{}] at {}/s for {:?} with {} workers (max {})",
            name,
            self.config.target_rate(),
            self.config.duration(),
            workers.len(),
            self.config.max_workers()
        );

        let start = Instant::now();
        let mut run_listener = run_shutdown.new_listener();
        let mut warned_saturated = false;
        for instant in clock {
            let due = start + instant.offset;
            tokio::select! {
                _ = tokio::time::sleep_until(due) => {}
                _ = run_listener.wait_for_shutdown() => {
                    log::info!("Scenario [{name}] stopped before its schedule completed");
                    break;
                }
            }

            let depth = gauges.backlog.fetch_add(1, Ordering::SeqCst) + 1;
            gauges.max_backlog.fetch_max(depth, Ordering::SeqCst);
            if sender.send(Dispatch { instant, due }).is_err() {
                gauges.backlog.fetch_sub(1, Ordering::SeqCst);
                log::error!("Every worker for scenario [{name}] has exited, stopping the schedule");
                break;
            }

            if depth > gauges.idle.load(Ordering::SeqCst) {
                if workers.len() < self.config.max_workers() {
                    workers.push(new_worker(workers.len()));
                    log::debug!("Scenario [{name}] grew to {} workers", workers.len());
                } else if !warned_saturated {
                    warned_saturated = true;
                    log::warn!(
                        "Scenario [{}] is using all {} workers, invocations are now queueing",
                        name,
                        workers.len()
                    );
                }
            }
        }
        drop(sender);

        let workers_used = workers.len();
        let folds = drain_workers(&name, workers, self.grace_period, &stop).await;

        let mut fold = MetricsFold::new(late_after);
        for worker_fold in folds {
            fold.merge(worker_fold);
        }
        fold.record_pool_usage(workers_used, gauges.max_backlog.load(Ordering::SeqCst));

        log::info!(
            "Scenario [{}] finished with {} requests from {} workers",
            name,
            fold.http_reqs(),
            workers_used
        );

        ScenarioReport::new(name, fold)
    }
}

async fn drain_workers(
    name: &str,
    workers: Vec<JoinHandle<MetricsFold>>,
    grace_period: Duration,
    stop: &ShutdownHandle,
) -> Vec<MetricsFold> {
    let mut joined = Box::pin(futures::future::join_all(workers));
    let results = tokio::select! {
        results = &mut joined => results,
        _ = tokio::time::sleep(grace_period) => {
            log::warn!(
                "Scenario [{name}] did not finish within the {grace_period:?} grace period, abandoning in-flight requests"
            );
            stop.shutdown();
            joined.await
        }
    };

    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(fold) => Some(fold),
            Err(e) => {
                log::error!("Worker for scenario [{name}] failed: {e:?}");
                None
            }
        })
        .collect()
}

fn spawn_worker(
    worker_id: usize,
    config: ScenarioConfig,
    scenario: Arc<dyn TrafficScenario>,
    queue: SharedQueue,
    gauges: Arc<PoolGauges>,
    mut stop: DelegatedShutdownListener,
    late_after: Duration,
) -> JoinHandle<MetricsFold> {
    tokio::spawn(async move {
        let mut fold = MetricsFold::new(late_after);
        let mut iteration = 0;
        let mut stopped = false;

        loop {
            gauges.idle.fetch_add(1, Ordering::SeqCst);
            let next = tokio::select! {
                next = async { queue.lock().await.recv().await } => next,
                _ = stop.wait_for_shutdown() => {
                    stopped = true;
                    None
                }
            };
            gauges.idle.fetch_sub(1, Ordering::SeqCst);

            let Some(dispatch) = next else {
                break;
            };
            gauges.backlog.fetch_sub(1, Ordering::SeqCst);

            let admission_lag = Instant::now().saturating_duration_since(dispatch.due);
            let invocation = Invocation {
                worker_id,
                iteration,
                seq: dispatch.instant.seq,
            };

            let outcome = tokio::select! {
                outcome = scenario.invoke(invocation) => outcome,
                _ = stop.wait_for_shutdown() => {
                    log::debug!("Worker {worker_id} of [{}] abandoned invocation {}", config.name(), invocation.seq);
                    fold.record_abandoned();
                    stopped = true;
                    break;
                }
            };

            let verdict = classify(scenario.as_ref(), config.rate_limit_aware(), &outcome);
            fold.record_request(outcome.elapsed, verdict);
            fold.record_iteration(admission_lag);
            iteration += 1;

            if verdict == Verdict::RateLimited && config.throttle_backoff() {
                let pause = throttle_backoff(&outcome);
                log::debug!("Worker {worker_id} of [{}] backing off for {pause:?}", config.name());
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = stop.wait_for_shutdown() => {
                        stopped = true;
                        break;
                    }
                }
            }
        }

        if stopped {
            let mut queue = queue.lock().await;
            while queue.try_recv().is_ok() {
                gauges.backlog.fetch_sub(1, Ordering::SeqCst);
                fold.record_dropped();
            }
        }

        fold
    })
}
