// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Sensitive File Verifier Tests
 * Probe fan-out, content verification, and failure swallowing
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use nuotta_scanner::http_client::HttpClient;
use nuotta_scanner::signatures::SignatureStore;
use nuotta_scanner::verifier::SensitiveFileVerifier;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Writes a sensitive_files.json document into a unique temp directory and
/// returns a store rooted there.
fn store_with(document: &str) -> Arc<SignatureStore> {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    let dir = std::env::temp_dir().join(format!(
        "nuotta-verifier-test-{}-{}",
        std::process::id(),
        DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("sensitive_files.json"), document).unwrap();
    Arc::new(SignatureStore::new(dir))
}

fn verifier(store: Arc<SignatureStore>, timeout_secs: u64) -> SensitiveFileVerifier {
    let http_client = Arc::new(HttpClient::new(timeout_secs, 1).unwrap());
    SensitiveFileVerifier::new(http_client, store)
}

#[tokio::test]
async fn confirms_env_file_with_content_verification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("DB_PASSWORD=secret123"))
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{"env": {"paths": ["/.env"], "verification": {"method": "content", "patterns": ["DB_PASSWORD"]}}}"#,
    );
    let findings = verifier(store, 5).verify(&mock_server.uri()).await;

    assert_eq!(findings.len(), 1);
    let finding = &findings[0];
    assert_eq!(finding.file_type, "env");
    assert_eq!(finding.verification_result, "verified");
    assert_eq!(finding.content_sample, "DB_PASSWORD=secret123");
    assert_eq!(finding.status_code, 200);
    assert!(finding.url.ends_with("/.env"));
}

#[tokio::test]
async fn truncates_content_sample_to_500_chars() {
    let mock_server = MockServer::start().await;

    let long_body = format!("DB_PASSWORD=x\n{}", "A".repeat(2000));
    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string(long_body))
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{"env": {"paths": ["/.env"], "verification": {"method": "content", "patterns": ["DB_PASSWORD"]}}}"#,
    );
    let findings = verifier(store, 5).verify(&mock_server.uri()).await;

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].content_sample.chars().count(), 500);
}

#[tokio::test]
async fn status_200_without_matching_content_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Not Found</html>"))
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{"env": {"paths": ["/.env"], "verification": {"method": "content", "patterns": ["DB_PASSWORD"]}}}"#,
    );
    let findings = verifier(store, 5).verify(&mock_server.uri()).await;

    assert!(findings.is_empty());
}

#[tokio::test]
async fn non_200_status_is_never_a_finding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/backup.sql"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{"backup": {"paths": ["/backup.sql"], "verification": {"method": "extension", "patterns": []}}}"#,
    );
    let findings = verifier(store, 5).verify(&mock_server.uri()).await;

    assert!(findings.is_empty());
}

#[tokio::test]
async fn extension_method_accepts_any_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/backup.sql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("-- sql dump"))
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{"backup": {"paths": ["/backup.sql"], "verification": {"method": "extension", "patterns": []}}}"#,
    );
    let findings = verifier(store, 5).verify(&mock_server.uri()).await;

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].file_type, "backup");
}

#[tokio::test]
async fn probes_every_path_and_collects_all_hits() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("APP_KEY=base64:xyz"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/.git/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[core]\n\trepositoryformatversion = 0"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/.env.local"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{
            "env": {"paths": ["/.env", "/.env.local"], "verification": {"method": "content", "patterns": ["APP_KEY"]}},
            "git_config": {"paths": ["/.git/config"], "verification": {"method": "content", "patterns": ["\\[core\\]"]}}
        }"#,
    );
    let mut findings = verifier(store, 5).verify(&mock_server.uri()).await;
    findings.sort_by(|a, b| a.file_type.cmp(&b.file_type));

    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].file_type, "env");
    assert_eq!(findings[1].file_type, "git_config");
}

#[tokio::test]
async fn transport_errors_are_swallowed_per_path() {
    // Connection refused: nothing is listening on this port.
    let store = store_with(
        r#"{"env": {"paths": ["/.env"], "verification": {"method": "content", "patterns": ["DB_PASSWORD"]}}}"#,
    );
    let findings = verifier(store, 1).verify("http://127.0.0.1:9").await;

    assert!(findings.is_empty());
}

#[tokio::test]
async fn slow_responses_time_out_as_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("DB_PASSWORD=slow")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let store = store_with(
        r#"{"env": {"paths": ["/.env"], "verification": {"method": "content", "patterns": ["DB_PASSWORD"]}}}"#,
    );
    let findings = verifier(store, 1).verify(&mock_server.uri()).await;

    assert!(findings.is_empty());
}

#[tokio::test]
async fn empty_signature_document_probes_nothing() {
    let store = store_with("{}");
    let findings = verifier(store, 5).verify("http://127.0.0.1:9").await;

    assert!(findings.is_empty());
}
