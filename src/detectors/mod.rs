// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Technology Detector Set
 * One detector per category over shared evidence-matching primitives
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod camera;
pub mod plugin_miner;
pub mod scored;

pub use camera::CameraDetector;
pub use plugin_miner::{mine_extensions, MinedExtensions};
pub use scored::ScoredDetector;

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::matcher::Evidence;
use crate::signatures::{SignatureSet, SignatureStore};
use crate::types::{Detection, FetchResult, TechCategory};

/// A category detector: pure function over fetched evidence and that
/// category's signature set. No I/O, no suspension.
pub trait Detector {
    fn category(&self) -> TechCategory;

    fn evaluate(&self, evidence: &Evidence<'_>, signatures: &SignatureSet) -> Vec<Detection>;
}

fn detector_for(category: TechCategory) -> Box<dyn Detector + Send + Sync> {
    match category {
        TechCategory::Camera => Box::new(CameraDetector),
        other => Box::new(ScoredDetector::new(other)),
    }
}

/// Runs every category detector plus the structural plugin/theme miner and
/// assembles the technologies map for one domain's report.
pub struct DetectorSet {
    store: Arc<SignatureStore>,
}

impl DetectorSet {
    pub fn new(store: Arc<SignatureStore>) -> Self {
        Self { store }
    }

    /// Category report key -> formatted `"name (version)"` labels. Empty
    /// categories are omitted, matching the report shape consumers expect.
    pub fn detect_all(
        &self,
        url: &str,
        response: &FetchResult,
    ) -> BTreeMap<String, Vec<String>> {
        let evidence = Evidence::new(url, response);
        let mut results = BTreeMap::new();

        for category in TechCategory::ALL {
            let signatures = self.store.load(category.signature_file());
            if signatures.is_empty() {
                continue;
            }

            let detector = detector_for(category);
            let detections = detector.evaluate(&evidence, &signatures);
            if detections.is_empty() {
                continue;
            }

            debug!(
                "Detected {} {} technology(s) for {}",
                detections.len(),
                category,
                url
            );
            results.insert(
                category.report_key().to_string(),
                detections.iter().map(Detection::label).collect(),
            );
        }

        let mined = mine_extensions(evidence.html());
        if !mined.plugins.is_empty() {
            results.insert("plugins".to_string(), mined.plugin_labels());
        }
        if !mined.themes.is_empty() {
            results.insert("themes".to_string(), mined.theme_labels());
        }

        results
    }
}
