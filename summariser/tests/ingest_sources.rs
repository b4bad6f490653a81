use chrono::{TimeZone, Utc};
use perf_summariser::{
    build_trend, Dashboard, HealthThresholds, HealthVerdict, IngestionError, ResultSource,
};
use perf_tunnel_summary_model::{LatencyStats, ResultStore, RunMetrics, RunResult, SaturationStats};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn metrics(name: &str, p95_ms: f64) -> RunMetrics {
    RunMetrics {
        name: name.to_string(),
        run_id: None,
        created_at: None,
        http_reqs: 600,
        iterations: 600,
        error_rate: 0.0,
        latency: LatencyStats {
            avg_ms: p95_ms / 2.0,
            p95_ms,
            p99_ms: p95_ms,
            max_ms: p95_ms,
            ..LatencyStats::default()
        },
        rate_limited: 0,
        rate_limited_rate: 0.0,
        saturation: SaturationStats::default(),
    }
}

fn result(run_id: &str, day: u32, runs: Vec<RunMetrics>) -> RunResult {
    RunResult::new(
        run_id.to_string(),
        Utc.with_ymd_and_hms(2026, 9, day, 12, 0, 0).unwrap(),
        runs,
    )
}

#[tokio::test]
async fn http_source_sends_no_store_and_keeps_partial_data() {
    let server = MockServer::start().await;
    let latest = result("run-9", 9, vec![metrics("redirect", 42.0)]);

    Mock::given(method("GET"))
        .and(path("/perf/results/latest.json"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&latest))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/perf/results/history.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = ResultSource::parse(&format!("{}/perf/results/", server.uri())).unwrap();
    let ingested = source.ingest().await;

    assert_eq!(Some(latest), ingested.latest);
    assert!(ingested.history.is_none());
    assert_eq!(1, ingested.errors.len());
    assert!(matches!(
        ingested.errors[0],
        IngestionError::Status { status: 503, .. }
    ));

    let dashboard = Dashboard::build(
        source.location(),
        &ingested,
        &["redirect", "shorten"],
        &HealthThresholds::default(),
    );
    assert_eq!(HealthVerdict::Healthy, dashboard.verdict);
    assert_eq!(Some(42.0), dashboard.worst_p95_ms);
    assert_eq!(600, dashboard.total_requests);
    assert!(dashboard.scenarios.iter().all(|panel| panel.trend.is_empty()));
    assert_eq!(1, dashboard.errors.len());
}

#[tokio::test]
async fn invalid_history_entries_are_skipped() {
    let server = MockServer::start().await;
    let history = serde_json::json!([
        result("run-2", 2, vec![metrics("redirect", 30.0)]),
        { "runId": "broken" },
        result("run-1", 1, vec![metrics("redirect", 20.0)]),
    ]);

    Mock::given(method("GET"))
        .and(path("/history.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history))
        .mount(&server)
        .await;

    let source = ResultSource::parse(&server.uri()).unwrap();
    let history = source.history().await.unwrap();

    assert_eq!(2, history.len());
    let trend = build_trend(&history, "redirect");
    assert_eq!(
        vec![20.0, 30.0],
        trend.iter().map(|point| point.p95).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn malformed_latest_is_an_ingestion_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let source = ResultSource::parse(&server.uri()).unwrap();
    let err = source.latest().await.unwrap_err();

    assert!(matches!(err, IngestionError::Parse { .. }), "{err}");
}

#[tokio::test]
async fn directory_source_reads_published_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::open(dir.path()).unwrap();
    store
        .publish(&result("run-1", 1, vec![metrics("redirect", 20.0)]))
        .unwrap();
    store
        .publish(&result(
            "run-2",
            2,
            vec![metrics("redirect", 25.0), metrics("shorten", 90.0)],
        ))
        .unwrap();

    let source = ResultSource::parse(dir.path().to_str().unwrap()).unwrap();
    let ingested = source.ingest().await;
    assert!(ingested.errors.is_empty());

    let dashboard = Dashboard::build(
        source.location(),
        &ingested,
        &["redirect", "shorten"],
        &HealthThresholds::default(),
    );

    assert_eq!(Some("run-2"), dashboard.run_id.as_deref());
    assert_eq!(Some(90.0), dashboard.worst_p95_ms);
    assert_eq!(1200, dashboard.total_requests);
    assert_eq!(2, dashboard.scenarios[0].trend.len());
    assert!(dashboard.scenarios[0].chartable);
    assert_eq!(1, dashboard.scenarios[1].trend.len());
    assert!(!dashboard.scenarios[1].chartable);
}

#[tokio::test]
async fn empty_directory_reports_both_documents_missing() {
    let dir = tempfile::tempdir().unwrap();
    let source = ResultSource::parse(dir.path().to_str().unwrap()).unwrap();

    let ingested = source.ingest().await;

    assert!(ingested.latest.is_none());
    assert!(ingested.history.is_none());
    assert_eq!(2, ingested.errors.len());
    assert!(ingested
        .errors
        .iter()
        .all(|e| matches!(e, IngestionError::Read { .. })));
}
