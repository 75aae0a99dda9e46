// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scored Signature Detector
 * Common weighted-evidence algorithm for signature-driven categories
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::Detector;
use crate::matcher::Evidence;
use crate::signatures::{Signature, SignatureSet};
use crate::types::{Detection, TechCategory};

/// Channel weights are fixed, not configurable: header and cookie evidence
/// outweigh body and URL evidence.
const WEIGHT_HEADERS: u32 = 2;
const WEIGHT_COOKIES: u32 = 2;
const WEIGHT_HTML: u32 = 1;
const WEIGHT_URLS: u32 = 1;

/// The shared detector for CMS, server, framework, router, JS framework,
/// database, and language signatures:
///
/// 1. any `must_not_have` match rejects outright, regardless of score;
/// 2. every `must_have` pattern must appear in the HTML or headers;
/// 3. matched channels accumulate their fixed weights;
/// 4. the match is accepted at score >= 1 when a satisfied `must_have`
///    clause is present, otherwise at score >= 2;
/// 5. accepted matches extract a version via the matcher's precedence.
pub struct ScoredDetector {
    category: TechCategory,
}

impl ScoredDetector {
    pub fn new(category: TechCategory) -> Self {
        Self { category }
    }

    fn matches(&self, evidence: &Evidence<'_>, signature: &Signature) -> bool {
        if signature.must_not_have.iter().any(|pattern| {
            let single = std::slice::from_ref(pattern);
            evidence.html_match(single) || evidence.headers_match(single)
        }) {
            return false;
        }

        let must_have_satisfied = if signature.must_have.is_empty() {
            false
        } else {
            let all_present = signature.must_have.iter().all(|pattern| {
                let single = std::slice::from_ref(pattern);
                evidence.html_match(single) || evidence.headers_match(single)
            });
            if !all_present {
                return false;
            }
            true
        };

        let mut score = 0;
        if !signature.headers.is_empty() && evidence.headers_match(&signature.headers) {
            score += WEIGHT_HEADERS;
        }
        if !signature.html.is_empty() && evidence.html_match(&signature.html) {
            score += WEIGHT_HTML;
        }
        if !signature.urls.is_empty() && evidence.url_match(&signature.urls) {
            score += WEIGHT_URLS;
        }
        if !signature.cookies.is_empty() && evidence.cookies_match(&signature.cookies) {
            score += WEIGHT_COOKIES;
        }

        let required = if must_have_satisfied { 1 } else { 2 };
        score >= required
    }

    fn extract_version(&self, evidence: &Evidence<'_>, signature: &Signature) -> String {
        signature
            .version_pattern
            .as_deref()
            .map(|pattern| evidence.extract_version(pattern))
            .unwrap_or_default()
    }
}

impl Detector for ScoredDetector {
    fn category(&self) -> TechCategory {
        self.category
    }

    fn evaluate(&self, evidence: &Evidence<'_>, signatures: &SignatureSet) -> Vec<Detection> {
        signatures
            .iter()
            .filter(|(_, signature)| self.matches(evidence, signature))
            .map(|(name, signature)| Detection {
                category: self.category,
                name: name.clone(),
                version: self.extract_version(evidence, signature),
            })
            .collect()
    }
}
