// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Sensitive File Verifier
 * Probes known-sensitive paths and confirms hits via content verification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

use crate::http_client::HttpClient;
use crate::matcher::compile;
use crate::signatures::{SignatureStore, Verification, VerificationMethod};
use crate::types::SensitiveFileFinding;

/// Body excerpt length captured for confirmed findings.
const CONTENT_SAMPLE_CHARS: usize = 500;

/// Probes every candidate sensitive-file path for a domain. All probes for
/// one domain are launched together and awaited as a group -- fan-out within
/// a domain is deliberately unbounded and stacks on top of the engine's
/// domain concurrency bound.
pub struct SensitiveFileVerifier {
    http_client: Arc<HttpClient>,
    store: Arc<SignatureStore>,
}

impl SensitiveFileVerifier {
    pub fn new(http_client: Arc<HttpClient>, store: Arc<SignatureStore>) -> Self {
        Self { http_client, store }
    }

    /// Returns confirmed findings only. A probe counts as found when the
    /// response is 200 AND the verification method passes; timeouts and
    /// transport errors on one path are swallowed as "not found" for that
    /// path, never propagated and never retried.
    pub async fn verify(&self, base_url: &str) -> Vec<SensitiveFileFinding> {
        let signatures = self.store.sensitive_files();
        if signatures.is_empty() {
            return Vec::new();
        }

        let base = base_url.trim_end_matches('/');
        let mut probes = Vec::new();
        for (file_type, config) in signatures.iter() {
            for path in &config.paths {
                probes.push(self.check_file(
                    base,
                    file_type.clone(),
                    path.clone(),
                    config.verification.clone(),
                ));
            }
        }

        join_all(probes).await.into_iter().flatten().collect()
    }

    async fn check_file(
        &self,
        base_url: &str,
        file_type: String,
        path: String,
        verification: Verification,
    ) -> Option<SensitiveFileFinding> {
        let file_url = format!("{base_url}{path}");

        let response = match self.http_client.probe(&file_url).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Error checking {}: {}", file_url, e);
                return None;
            }
        };

        if response.status_code != 200 {
            return None;
        }

        let content = response.body.unwrap_or_default();
        if !verify_content(&content, &verification) {
            return None;
        }

        info!("Found sensitive file: {}", file_url);
        Some(SensitiveFileFinding {
            file_type,
            url: file_url,
            verification_result: "verified".to_string(),
            content_sample: content.chars().take(CONTENT_SAMPLE_CHARS).collect(),
            status_code: response.status_code,
        })
    }
}

/// Applies the verification method to a 200-response body. The `redirect`
/// method currently performs the same content-regex check as `content`;
/// that literal behavior is preserved on purpose.
fn verify_content(content: &str, verification: &Verification) -> bool {
    match verification.method {
        VerificationMethod::Content | VerificationMethod::Redirect => verification
            .patterns
            .iter()
            .filter_map(|p| compile(p))
            .any(|re| re.is_match(content)),
        VerificationMethod::Extension => true,
    }
}
