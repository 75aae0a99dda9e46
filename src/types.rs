// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Raw evidence produced by one page fetch. Read-only input to detection.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// Response body, `None` when the fetch failed after all retries.
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
    /// Cookie name -> value, parsed from `Set-Cookie` response headers.
    pub cookies: HashMap<String, String>,
    pub status_code: u16,
}

impl FetchResult {
    /// The terminal "could not fetch" outcome: no body, empty maps, status 0.
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn is_failure(&self) -> bool {
        self.body.is_none()
    }
}

/// Technology categories the detector set covers. Closed set: one detector
/// variant per category plus the structural plugin/theme miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Cms,
    Server,
    Framework,
    Camera,
    Router,
    JsFramework,
    Database,
    Language,
}

impl TechCategory {
    pub const ALL: [TechCategory; 8] = [
        TechCategory::Cms,
        TechCategory::Server,
        TechCategory::Framework,
        TechCategory::Camera,
        TechCategory::Router,
        TechCategory::JsFramework,
        TechCategory::Database,
        TechCategory::Language,
    ];

    /// Stem of the signature document that feeds this category.
    pub fn signature_file(&self) -> &'static str {
        match self {
            TechCategory::Cms => "cms",
            TechCategory::Server => "server",
            TechCategory::Framework => "framework",
            TechCategory::Camera => "camera",
            TechCategory::Router => "router",
            TechCategory::JsFramework => "js_framework",
            TechCategory::Database => "database",
            TechCategory::Language => "language",
        }
    }

    /// Key under which this category's results appear in a scan report.
    /// The JS framework category reports under "javascript".
    pub fn report_key(&self) -> &'static str {
        match self {
            TechCategory::JsFramework => "javascript",
            other => other.signature_file(),
        }
    }
}

impl std::fmt::Display for TechCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.report_key())
    }
}

/// One accepted technology match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub category: TechCategory,
    pub name: String,
    /// Empty when no version evidence was found.
    pub version: String,
}

impl Detection {
    /// Report label: `"name (version)"`, or the bare name without a version.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.version)
        }
    }
}

/// Splits a `"name (version)"` label back into its parts. Returns `None` for
/// labels without a non-empty parenthesized version.
pub fn parse_label(label: &str) -> Option<(String, String)> {
    let stripped = label.strip_suffix(')')?;
    let (name, version) = stripped.rsplit_once(" (")?;
    if version.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

/// A confirmed sensitive-file exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveFileFinding {
    pub file_type: String,
    pub url: String,
    pub verification_result: String,
    /// Body excerpt, truncated to 500 characters.
    pub content_sample: String,
    pub status_code: u16,
}

/// CVSS metrics normalized across schema versions (v3.1 preferred, then
/// v3.0, then v2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvssMetrics {
    pub version: String,
    pub score: Option<f64>,
    pub severity: Option<String>,
    pub vector: Option<String>,
}

/// One vulnerability record returned by the correlator for a
/// (technology, version) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub description: String,
    pub cvss: Option<CvssMetrics>,
    pub published: Option<String>,
    pub last_modified: Option<String>,
    pub references: Vec<String>,
}

/// Terminal per-domain artifact. Every field is populated exactly once by the
/// scan pipeline; the camera/router/JS views are read-only accessors over the
/// technologies map, never extra keys injected after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub domain: String,
    pub status_code: u16,
    /// Category report key -> formatted `"name (version)"` labels. Mined
    /// plugins and themes live under the "plugins" and "themes" keys.
    pub technologies: BTreeMap<String, Vec<String>>,
    /// `"name (version)"` label -> vulnerability records.
    pub vulnerabilities: BTreeMap<String, Vec<VulnerabilityRecord>>,
    pub sensitive_files: Vec<SensitiveFileFinding>,
    pub error: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            status_code: 0,
            technologies: BTreeMap::new(),
            vulnerabilities: BTreeMap::new(),
            sensitive_files: Vec::new(),
            error: None,
            scanned_at: Utc::now(),
        }
    }

    fn category_view(&self, key: &str) -> &[String] {
        self.technologies.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cameras(&self) -> &[String] {
        self.category_view("camera")
    }

    pub fn routers(&self) -> &[String] {
        self.category_view("router")
    }

    pub fn js_libraries(&self) -> &[String] {
        self.category_view("javascript")
    }

    pub fn plugins(&self) -> &[String] {
        self.category_view("plugins")
    }

    pub fn themes(&self) -> &[String] {
        self.category_view("themes")
    }

    pub fn has_technologies(&self) -> bool {
        self.technologies.values().any(|list| !list.is_empty())
    }

    /// Flattens every versioned entry across technologies, plugins, and
    /// themes into (name, version) pairs. Entries without a parenthesized
    /// version are skipped; each entry is taken exactly once.
    pub fn versioned_technologies(&self) -> Vec<(String, String)> {
        self.technologies
            .values()
            .flatten()
            .filter_map(|label| parse_label(label))
            .collect()
    }
}

/// Process-lifetime scan counters. Owned by the engine, reset per `scan`
/// invocation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScanStats {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub with_technologies: u64,
    pub with_files: u64,
    pub with_cameras: u64,
    pub with_vulnerabilities: u64,
}
