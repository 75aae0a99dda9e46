// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - NVD API Client
 * Queries the National Vulnerability Database by CPE match string
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::types::{CvssMetrics, VulnerabilityRecord};

const NVD_BASE_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
const NVD_TIMEOUT_SECS: u64 = 30;
/// Maximum the API allows per page.
const RESULTS_PER_PAGE: u32 = 2000;

#[derive(Debug, Deserialize)]
struct NvdResponse {
    #[serde(default)]
    vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Debug, Deserialize)]
struct NvdVulnerability {
    cve: NvdCve,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdCve {
    id: String,
    #[serde(default)]
    descriptions: Vec<NvdDescription>,
    #[serde(default)]
    metrics: NvdMetrics,
    published: Option<String>,
    last_modified: Option<String>,
    #[serde(default)]
    references: Vec<NvdReference>,
}

#[derive(Debug, Deserialize)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdMetrics {
    #[serde(default)]
    cvss_metric_v31: Vec<NvdMetricV3>,
    #[serde(default)]
    cvss_metric_v30: Vec<NvdMetricV3>,
    #[serde(default)]
    cvss_metric_v2: Vec<NvdMetricV2>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdMetricV3 {
    cvss_data: NvdCvssData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdMetricV2 {
    cvss_data: NvdCvssData,
    base_severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NvdCvssData {
    base_score: Option<f64>,
    base_severity: Option<String>,
    vector_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NvdReference {
    url: Option<String>,
}

/// Thin client over the NVD 2.0 REST API. All failure modes -- non-200
/// responses, timeouts, malformed payloads -- yield an empty record list,
/// indistinguishable from a genuine absence of CVEs; callers cannot and do
/// not need to tell the two apart.
pub struct NvdClient {
    client: Client,
    base_url: String,
}

impl NvdClient {
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = api_key {
            let value = reqwest::header::HeaderValue::from_str(key)
                .context("Invalid NVD API key value")?;
            headers.insert("apiKey", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(NVD_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .context("Failed to create NVD client")?;

        Ok(Self {
            client,
            base_url: NVD_BASE_URL.to_string(),
        })
    }

    /// Points the client at an alternate endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Queries CVEs for an exact (vendor, product, version) CPE triple.
    pub async fn query(&self, vendor: &str, product: &str, version: &str) -> Vec<VulnerabilityRecord> {
        let cpe_match = format!("cpe:2.3:a:{vendor}:{product}:{version}:*:*:*:*:*:*:*");
        let per_page = RESULTS_PER_PAGE.to_string();

        let response = match self
            .client
            .get(&self.base_url)
            .query(&[
                ("virtualMatchString", cpe_match.as_str()),
                ("resultsPerPage", per_page.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Error querying NVD API: {}", e);
                return Vec::new();
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("No CVEs found for {} (status 404)", cpe_match);
            return Vec::new();
        }
        if !status.is_success() {
            error!("NVD API request failed with status {}", status);
            return Vec::new();
        }

        let payload: NvdResponse = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Malformed NVD API response: {}", e);
                return Vec::new();
            }
        };

        payload
            .vulnerabilities
            .into_iter()
            .map(|item| into_record(item.cve))
            .collect()
    }
}

fn into_record(cve: NvdCve) -> VulnerabilityRecord {
    let description = cve
        .descriptions
        .iter()
        .find(|d| d.lang == "en")
        .map(|d| d.value.clone())
        .unwrap_or_default();

    let references = cve
        .references
        .into_iter()
        .filter_map(|r| r.url)
        .collect();

    VulnerabilityRecord {
        id: cve.id,
        description,
        cvss: extract_cvss(&cve.metrics),
        published: cve.published,
        last_modified: cve.last_modified,
        references,
    }
}

/// Normalizes the CVSS block, preferring v3.1 metrics, then v3.0, then v2,
/// so {score, severity, vector} are extracted consistently regardless of
/// which schema versions the source included.
fn extract_cvss(metrics: &NvdMetrics) -> Option<CvssMetrics> {
    if let Some(metric) = metrics.cvss_metric_v31.first() {
        return Some(CvssMetrics {
            version: "3.1".to_string(),
            score: metric.cvss_data.base_score,
            severity: metric.cvss_data.base_severity.clone(),
            vector: metric.cvss_data.vector_string.clone(),
        });
    }

    if let Some(metric) = metrics.cvss_metric_v30.first() {
        return Some(CvssMetrics {
            version: "3.0".to_string(),
            score: metric.cvss_data.base_score,
            severity: metric.cvss_data.base_severity.clone(),
            vector: metric.cvss_data.vector_string.clone(),
        });
    }

    if let Some(metric) = metrics.cvss_metric_v2.first() {
        return Some(CvssMetrics {
            version: "2.0".to_string(),
            score: metric.cvss_data.base_score,
            severity: metric.base_severity.clone(),
            vector: metric.cvss_data.vector_string.clone(),
        });
    }

    None
}
