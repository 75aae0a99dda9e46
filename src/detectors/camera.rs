// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Camera Detector
 * Signature detector specialized for IP-camera web interfaces
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::Detector;
use crate::matcher::{compile, Evidence};
use crate::signatures::{Signature, SignatureSet};
use crate::types::{Detection, TechCategory};

/// Camera interfaces rarely expose version strings but do expose distinctive
/// page titles and vendor favicons, so this detector scores two extra
/// channels on top of headers and HTML:
///
/// - each matching header pattern scores +2, each HTML pattern +1;
/// - each title pattern matching the `<title>` content scores +2;
/// - each favicon filename, dot-escaped into a `<link ... href=...>` regex,
///   scores +2 on a match;
/// - any `must_not_have` pattern in the HTML rejects immediately;
/// - the required score is the signature's own `confidence` (default 2).
///
/// Matches carry no version.
pub struct CameraDetector;

impl CameraDetector {
    fn score(&self, evidence: &Evidence<'_>, signature: &Signature) -> u32 {
        let html = evidence.html();
        let mut score = 0;

        for pattern in &signature.headers {
            if evidence.headers_match(std::slice::from_ref(pattern)) {
                score += 2;
            }
        }

        if !html.is_empty() {
            for pattern in &signature.html {
                if let Some(re) = compile(pattern) {
                    if re.is_match(html) {
                        score += 1;
                    }
                }
            }

            if let Some(title) = evidence.title() {
                for pattern in &signature.titles {
                    if let Some(re) = compile(pattern) {
                        if re.is_match(title) {
                            score += 2;
                        }
                    }
                }
            }

            for favicon in &signature.favicon {
                let favicon_regex = format!(
                    r#"<link[^>]*href=["'][^"']*{}["'][^>]*>"#,
                    favicon.replace('.', r"\.")
                );
                if let Some(re) = compile(&favicon_regex) {
                    if re.is_match(html) {
                        score += 2;
                    }
                }
            }
        }

        score
    }

    fn excluded(&self, evidence: &Evidence<'_>, signature: &Signature) -> bool {
        let html = evidence.html();
        if html.is_empty() {
            return false;
        }
        signature.must_not_have.iter().any(|pattern| {
            compile(pattern)
                .map(|re| re.is_match(html))
                .unwrap_or(false)
        })
    }
}

impl Detector for CameraDetector {
    fn category(&self) -> TechCategory {
        TechCategory::Camera
    }

    fn evaluate(&self, evidence: &Evidence<'_>, signatures: &SignatureSet) -> Vec<Detection> {
        signatures
            .iter()
            .filter(|(_, signature)| {
                !self.excluded(evidence, signature)
                    && self.score(evidence, signature) >= signature.confidence
            })
            .map(|(name, _)| Detection {
                category: TechCategory::Camera,
                name: name.clone(),
                version: String::new(),
            })
            .collect()
    }
}
