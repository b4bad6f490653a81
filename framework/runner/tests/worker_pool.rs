mod common;

use common::{metrics_of, FixedResponse};
use perf_tunnel_runner::prelude::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn config(rate: f64, duration_ms: u64, pre: usize, max: usize) -> ScenarioConfig {
    ScenarioConfig::new("pool-test", rate, pre, max)
        .unwrap()
        .with_duration(Duration::from_millis(duration_ms))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn issues_exactly_the_scheduled_invocations() {
    let pool = WorkerPool::new(
        config(50.0, 1000, 2, 10),
        Arc::new(FixedResponse::ok(Duration::from_millis(5))),
        Duration::from_secs(5),
    );

    let metrics = metrics_of(&pool.run(ShutdownHandle::new()).await);

    assert_eq!(50, metrics.http_reqs);
    assert_eq!(50, metrics.iterations);
    assert_eq!(0.0, metrics.error_rate);
    assert!(metrics.saturation.max_workers_used <= 10);
    assert_eq!(0, metrics.saturation.dropped_iterations);
}

#[tokio::test(flavor = "multi_thread")]
async fn vanishingly_small_rate_issues_the_first_instant() {
    let pool = WorkerPool::new(
        config(1e-20, 200, 1, 1),
        Arc::new(FixedResponse::ok(Duration::from_millis(1))),
        Duration::from_secs(5),
    );

    let metrics = metrics_of(&pool.run(ShutdownHandle::new()).await);

    assert_eq!(1, metrics.http_reqs);
    assert_eq!(0.0, metrics.error_rate);
}

#[tokio::test(flavor = "multi_thread")]
async fn saturation_shows_as_admission_lag_not_latency() {
    let pool = WorkerPool::new(
        config(100.0, 1000, 1, 4),
        Arc::new(FixedResponse::ok(Duration::from_millis(200))),
        Duration::from_secs(15),
    );

    let metrics = metrics_of(&pool.run(ShutdownHandle::new()).await);

    assert_eq!(100, metrics.http_reqs);
    assert_eq!(4, metrics.saturation.max_workers_used);
    assert!(metrics.saturation.max_backlog > 4);
    assert!(metrics.saturation.late_admissions > 0);
    assert!(metrics.saturation.max_admission_lag_ms > 1000.0);
    // The target itself stayed at ~200ms throughout
    assert!(metrics.latency.max_ms < 1000.0, "{:?}", metrics.latency);
}

#[tokio::test(flavor = "multi_thread")]
async fn grace_period_abandons_in_flight_and_drops_queued() {
    let pool = WorkerPool::new(
        config(10.0, 500, 1, 1),
        Arc::new(FixedResponse::ok(Duration::from_secs(30))),
        Duration::from_millis(200),
    );

    let report = pool.run(ShutdownHandle::new()).await;
    let metrics = metrics_of(&report);

    assert_eq!(1, metrics.http_reqs);
    assert_eq!(0, metrics.iterations);
    assert_eq!(1.0, metrics.error_rate);
    assert_eq!(4, metrics.saturation.dropped_iterations);
    assert_eq!(
        Some(&1),
        report.fold.failures().get(&FailureKind::Abandoned)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn rate_limited_responses_are_not_errors_when_expected() {
    let aware = WorkerPool::new(
        config(20.0, 500, 2, 4).with_rate_limit_aware(true),
        Arc::new(FixedResponse::status(429)),
        Duration::from_secs(5),
    );
    let metrics = metrics_of(&aware.run(ShutdownHandle::new()).await);
    assert_eq!(10, metrics.rate_limited);
    assert_eq!(1.0, metrics.rate_limited_rate);
    assert_eq!(0.0, metrics.error_rate);

    let unaware = WorkerPool::new(
        config(20.0, 500, 2, 4),
        Arc::new(FixedResponse::status(429)),
        Duration::from_secs(5),
    );
    let report = unaware.run(ShutdownHandle::new()).await;
    assert_eq!(1.0, metrics_of(&report).error_rate);
    assert_eq!(
        Some(&10),
        report.fold.failures().get(&FailureKind::ThrottleResponse)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn throttled_workers_back_off() {
    let scenario = FixedResponse {
        status: 429,
        latency: Duration::from_millis(1),
        headers: vec![("Retry-After", "2")],
    };
    let pool = WorkerPool::new(
        config(20.0, 500, 1, 1)
            .with_rate_limit_aware(true)
            .with_throttle_backoff(true),
        Arc::new(scenario),
        Duration::from_millis(500),
    );

    let metrics = metrics_of(&pool.run(ShutdownHandle::new()).await);

    // The only worker is paused for 2s after its first request, so the rest are dropped
    assert_eq!(1, metrics.http_reqs);
    assert_eq!(9, metrics.saturation.dropped_iterations);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_shutdown_stops_the_schedule() {
    let shutdown = ShutdownHandle::new();
    let pool = WorkerPool::new(
        config(20.0, 10_000, 2, 4),
        Arc::new(FixedResponse::ok(Duration::from_millis(1))),
        Duration::from_secs(5),
    );

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.shutdown();
    });

    let started = tokio::time::Instant::now();
    let metrics = metrics_of(&pool.run(shutdown).await);

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(metrics.http_reqs > 0);
    assert!(metrics.http_reqs < 200);
    assert_eq!(0.0, metrics.error_rate);
}
