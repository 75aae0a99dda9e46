// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Engine
 * Per-domain pipeline and wave-based multi-domain orchestration
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

use crate::correlator::VulnCorrelator;
use crate::database::Database;
use crate::detectors::DetectorSet;
use crate::errors::ScannerError;
use crate::http_client::HttpClient;
use crate::signatures::SignatureStore;
use crate::types::{ScanReport, ScanStats};
use crate::verifier::SensitiveFileVerifier;

/// Drives domains through fetch -> detect -> correlate -> verify -> persist,
/// fanning out across domains in waves bounded by the configured
/// concurrency. Per-domain failures are isolated at this boundary: they
/// populate that domain's report error and never abort siblings.
pub struct ScanEngine {
    http_client: Arc<HttpClient>,
    detectors: DetectorSet,
    verifier: SensitiveFileVerifier,
    correlator: VulnCorrelator,
    database: Arc<Database>,
    stats: Mutex<ScanStats>,
}

impl ScanEngine {
    pub fn new(
        http_client: Arc<HttpClient>,
        signatures: Arc<SignatureStore>,
        correlator: VulnCorrelator,
        database: Arc<Database>,
    ) -> Self {
        Self {
            detectors: DetectorSet::new(Arc::clone(&signatures)),
            verifier: SensitiveFileVerifier::new(Arc::clone(&http_client), signatures),
            http_client,
            correlator,
            database,
            stats: Mutex::new(ScanStats::default()),
        }
    }

    /// Scans many domains in waves: consecutive groups of `max_concurrent`
    /// pipelines run concurrently, and a wave must fully finish -- slowest
    /// straggler included -- before the next wave starts. This bounds peak
    /// concurrency at exactly `max_concurrent` pipelines, accepting
    /// head-of-line blocking from slow domains.
    pub async fn scan(&self, domains: &[String], max_concurrent: usize) -> Vec<ScanReport> {
        *self.stats.lock() = ScanStats::default();

        let wave_size = max_concurrent.max(1);
        info!(
            "Starting scan of {} domains with {} concurrent requests",
            domains.len(),
            wave_size
        );

        let mut reports = Vec::with_capacity(domains.len());
        let mut processed = 0;

        for wave in domains.chunks(wave_size) {
            let wave_reports = join_all(wave.iter().map(|domain| self.scan_domain(domain))).await;
            reports.extend(wave_reports);

            processed += wave.len();
            info!("Progress: {}/{} domains processed", processed, domains.len());
        }

        self.log_stats();
        reports
    }

    /// Single-domain convenience entry point: the same pipeline without
    /// batching overhead.
    pub async fn scan_one(&self, domain: &str) -> ScanReport {
        self.scan_domain(domain).await
    }

    pub fn stats(&self) -> ScanStats {
        *self.stats.lock()
    }

    async fn scan_domain(&self, domain: &str) -> ScanReport {
        self.stats.lock().attempted += 1;

        let mut report = ScanReport::new(domain);
        let url = normalize_url(domain);

        if let Err(e) = self.run_pipeline(&url, &mut report).await {
            error!("Error scanning {}: {:#}", domain, e);
            report.error = Some(format!("{e:#}"));
            self.stats.lock().failed += 1;
        }

        report
    }

    /// The fallible span of the pipeline. Any error returned here is caught
    /// at the `scan_domain` boundary and attached to the report; a fetch
    /// failure is handled inline because it is an expected outcome, not an
    /// error.
    async fn run_pipeline(&self, url: &str, report: &mut ScanReport) -> anyhow::Result<()> {
        Url::parse(url).map_err(|_| ScannerError::InvalidUrl {
            url: url.to_string(),
        })?;

        let response = self.http_client.fetch(url).await;
        report.status_code = response.status_code;

        if response.is_failure() {
            report.error = Some("Failed to fetch site data".to_string());
            self.stats.lock().failed += 1;
            return Ok(());
        }
        self.stats.lock().succeeded += 1;

        report.technologies = self.detectors.detect_all(url, &response);

        {
            let mut stats = self.stats.lock();
            if report.has_technologies() {
                stats.with_technologies += 1;
            }
            if !report.cameras().is_empty() {
                stats.with_cameras += 1;
            }
        }

        let versioned = report.versioned_technologies();
        if !versioned.is_empty() {
            report.vulnerabilities = self.correlator.check_batch(&versioned).await;
            if !report.vulnerabilities.is_empty() {
                self.stats.lock().with_vulnerabilities += 1;
                info!(
                    "Found CVEs for {}: {} technology(s) affected",
                    report.domain,
                    report.vulnerabilities.len()
                );
            }
        }

        report.sensitive_files = self.verifier.verify(url).await;
        if !report.sensitive_files.is_empty() {
            self.stats.lock().with_files += 1;
        }

        // Persistence failure is logged, never propagated; the in-memory
        // report is still returned to the caller.
        if let Err(e) = self.database.store_report(report).await {
            error!("Failed to save results for {}: {:#}", report.domain, e);
        }

        info!(
            "Scanned {} - Tech: {} categories, CVEs: {}, Files: {}",
            report.domain,
            report.technologies.len(),
            report.vulnerabilities.len(),
            report.sensitive_files.len()
        );

        Ok(())
    }

    fn log_stats(&self) {
        let stats = self.stats.lock();
        info!("==================================================");
        info!("SCAN STATISTICS:");
        info!("Total domains: {}", stats.attempted);
        info!("Successful: {}", stats.succeeded);
        info!("Failed: {}", stats.failed);
        info!("With technologies: {}", stats.with_technologies);
        info!("With sensitive files: {}", stats.with_files);
        info!("With cameras: {}", stats.with_cameras);
        info!("With vulnerabilities: {}", stats.with_vulnerabilities);
        info!("==================================================");
    }
}

/// Prefixes `http://` unless the domain is already schemed.
pub fn normalize_url(domain: &str) -> String {
    if domain.starts_with("http") {
        domain.to_string()
    } else {
        format!("http://{domain}")
    }
}
