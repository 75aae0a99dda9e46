// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Engine Tests
 * Wave-bounded concurrency, per-domain failure isolation, and the full
 * fetch -> detect -> verify pipeline
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use nuotta_scanner::correlator::VulnCorrelator;
use nuotta_scanner::database::{Database, DatabaseConfig};
use nuotta_scanner::engine::ScanEngine;
use nuotta_scanner::http_client::HttpClient;
use nuotta_scanner::nvd::NvdClient;
use nuotta_scanner::signatures::SignatureStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_signatures_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "nuotta-engine-test-{}-{}",
        std::process::id(),
        DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

async fn build_engine(signatures_dir: &std::path::Path, timeout_secs: u64) -> ScanEngine {
    let http_client = Arc::new(HttpClient::new(timeout_secs, 1).unwrap());
    let signatures = Arc::new(SignatureStore::new(signatures_dir));
    let correlator = VulnCorrelator::new(
        NvdClient::new(None)
            .unwrap()
            .with_base_url("http://127.0.0.1:9"),
    );
    let database = Arc::new(
        Database::connect(DatabaseConfig {
            enabled: false,
            ..Default::default()
        })
        .await
        .unwrap(),
    );
    ScanEngine::new(http_client, signatures, correlator, database)
}

/// Records the arrival instant of every request before responding with a
/// fixed delay, so tests can reconstruct the wave schedule.
struct RecordingResponder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for RecordingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200)
            .set_body_string("<html><body>ok</body></html>")
            .set_delay(self.delay)
    }
}

#[tokio::test]
async fn wave_concurrency_bounds_in_flight_pipelines() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .respond_with(RecordingResponder {
            arrivals: Arc::clone(&arrivals),
            delay: Duration::from_millis(500),
        })
        .mount(&mock_server)
        .await;

    let engine = build_engine(&temp_signatures_dir(), 10).await;
    let domains: Vec<String> = (0..7)
        .map(|i| format!("{}/domain{}", mock_server.uri(), i))
        .collect();

    let reports = engine.scan(&domains, 3).await;
    assert_eq!(reports.len(), 7);
    assert!(reports.iter().all(|r| r.error.is_none()));

    let mut times = arrivals.lock().unwrap().clone();
    assert_eq!(times.len(), 7);
    times.sort();

    // Wave 1 fetches start together...
    assert!(times[2].duration_since(times[0]) < Duration::from_millis(400));
    // ...and the 4th fetch cannot start until wave 1 fully completes.
    assert!(times[3].duration_since(times[0]) >= Duration::from_millis(400));
    // Three waves in total: the last fetch starts after two full delays.
    assert!(times[6].duration_since(times[0]) >= Duration::from_millis(800));
}

#[tokio::test]
async fn failed_domain_does_not_abort_siblings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let engine = build_engine(&temp_signatures_dir(), 2).await;
    let domains = vec![
        format!("{}/alive1", mock_server.uri()),
        // Nothing listens here; the fetch exhausts its retries.
        "http://127.0.0.1:9".to_string(),
        format!("{}/alive2", mock_server.uri()),
    ];

    let reports = engine.scan(&domains, 2).await;

    assert_eq!(reports.len(), 3);
    assert!(reports[0].error.is_none());
    assert_eq!(
        reports[1].error.as_deref(),
        Some("Failed to fetch site data")
    );
    assert_eq!(reports[1].status_code, 0);
    assert!(reports[2].error.is_none());

    let stats = engine.stats();
    assert_eq!(stats.attempted, 3);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn stats_reset_between_scan_invocations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let engine = build_engine(&temp_signatures_dir(), 5).await;
    let domains = vec![format!("{}/a", mock_server.uri())];

    engine.scan(&domains, 1).await;
    engine.scan(&domains, 1).await;

    let stats = engine.stats();
    assert_eq!(stats.attempted, 1);
    assert_eq!(stats.succeeded, 1);
}

#[tokio::test]
async fn full_pipeline_detects_and_verifies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("DB_PASSWORD=hunter2"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Server", "nginx/1.18.0")
                .set_body_string(
                    r#"<html><head>
                       <link href="/wp-content/plugins/akismet/akismet.css">
                       </head><body></body></html>"#,
                ),
        )
        .mount(&mock_server)
        .await;

    let dir = temp_signatures_dir();
    std::fs::write(
        dir.join("server.json"),
        r#"{"nginx": {"headers": ["server:.*nginx"]}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("sensitive_files.json"),
        r#"{"env": {"paths": ["/.env"], "verification": {"method": "content", "patterns": ["DB_PASSWORD"]}}}"#,
    )
    .unwrap();

    let engine = build_engine(&dir, 5).await;
    let report = engine.scan_one(&mock_server.uri()).await;

    assert!(report.error.is_none());
    assert_eq!(report.status_code, 200);
    assert_eq!(
        report.technologies.get("server"),
        Some(&vec!["nginx".to_string()])
    );
    assert_eq!(report.plugins(), ["akismet".to_string()]);
    assert_eq!(report.sensitive_files.len(), 1);
    assert_eq!(report.sensitive_files[0].file_type, "env");
    // nginx carries no version here, so no correlation was possible.
    assert!(report.vulnerabilities.is_empty());

    let stats = engine.stats();
    assert_eq!(stats.with_technologies, 1);
    assert_eq!(stats.with_files, 1);
    assert_eq!(stats.with_cameras, 0);
}

#[tokio::test]
async fn empty_signature_directory_degrades_not_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Server", "nginx/1.18.0")
                .set_body_string("<html>ok</html>"),
        )
        .mount(&mock_server)
        .await;

    let engine = build_engine(&temp_signatures_dir(), 5).await;
    let report = engine.scan_one(&mock_server.uri()).await;

    assert!(report.error.is_none());
    assert!(report.technologies.is_empty());
    assert!(report.sensitive_files.is_empty());
}

#[tokio::test]
async fn malformed_domain_is_reported_not_panicked() {
    let engine = build_engine(&temp_signatures_dir(), 2).await;

    let report = engine.scan_one("http://[invalid").await;

    assert!(report.error.is_some());
    assert!(report.error.as_deref().unwrap().contains("Invalid target URL"));
}
