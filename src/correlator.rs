// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Vulnerability Correlator
 * Maps detected technologies to vendor CPEs and correlates against the NVD
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

use crate::nvd::NvdClient;
use crate::types::VulnerabilityRecord;

/// Technologies are correlated in fixed groups of this size, with a pause
/// between groups. This is client-side rate limiting against the NVD, not a
/// local resource control.
const BATCH_SIZE: usize = 5;
const BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Normalized technology name -> canonical NVD vendor identifier. Keys are
/// pre-normalized (lowercase, separators folded to underscore).
static VENDOR_MAPPING: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // CMS
        ("wordpress", "wordpress"),
        ("joomla", "joomla"),
        ("drupal", "drupal"),
        ("magento", "magento"),
        ("shopify", "shopify"),
        ("prestashop", "prestashop"),
        ("opencart", "opencart"),
        ("woocommerce", "woocommerce"),
        ("vbulletin", "vbulletin"),
        ("phpbb", "phpbb"),
        // Frameworks
        ("laravel", "laravel"),
        ("django", "djangoproject"),
        ("ruby_on_rails", "ruby-on-rails"),
        ("express_js", "expressjs"),
        ("spring_boot", "spring-framework"),
        ("symfony", "symfony"),
        ("yii", "yiiframework"),
        ("codeigniter", "codeigniter"),
        ("flask", "pallets"),
        // Web servers
        ("apache", "apache"),
        ("nginx", "nginx"),
        ("microsoft_iis", "microsoft"),
        ("litespeed", "litespeed-technologies"),
        ("openresty", "openresty"),
        ("caddy", "caddy"),
        ("gunicorn", "gunicorn"),
        ("tomcat", "apache"),
        ("jetty", "eclipse-foundation"),
        // Routers
        ("cisco", "cisco"),
        ("mikrotik", "mikrotik"),
        ("ubiquiti", "ubiquiti-networks"),
        ("tp_link", "tp-link"),
        ("d_link", "d-link"),
        ("netgear", "netgear"),
        ("linksys", "linksys"),
        ("asus", "asus"),
        ("huawei", "huawei"),
        ("tenda", "tenda-technology"),
        ("zyxel", "zyxel"),
        ("synology", "synology"),
        // Cameras
        ("axis", "axis-communications"),
        ("hikvision", "hikvision"),
        ("dahua", "dahuatech"),
        ("vivotek", "vivotek"),
        ("bosch", "robert-bosch-gmbh"),
        ("samsung", "samsung"),
        ("sony", "sony"),
        ("panasonic", "panasonic"),
        ("grandstream", "grandstream"),
        ("avigilon", "avigilon"),
        ("flir", "flir-systems"),
        // JS libraries
        ("jquery", "jquery"),
        ("react", "facebook"),
        ("vue_js", "vuejs"),
        ("angular", "google"),
        ("bootstrap", "getbootstrap"),
        ("lodash", "lodash"),
        ("moment_js", "moment"),
        ("axios", "axios"),
        ("webpack", "webpack"),
        ("d3_js", "d3"),
        // Databases
        ("mysql", "mysql"),
        ("postgresql", "postgresql"),
        ("mongodb", "mongodb"),
        ("redis", "redis"),
        ("sqlite", "sqlite"),
        ("oracle", "oracle"),
        ("microsoft_sql_server", "microsoft"),
        // Languages
        ("php", "php"),
        ("python", "python"),
        ("java", "oracle"),
        ("node_js", "nodejs"),
        ("ruby", "ruby-lang"),
        ("go", "golang"),
        ("perl", "perl"),
        // WordPress plugins
        ("akismet", "akismet"),
        ("wordfence", "wordfence"),
        ("yoast_seo", "yoast"),
        ("jetpack", "automattic"),
        ("contact_form_7", "contact-form-7"),
        ("wpforms", "wpforms"),
        ("gravity_forms", "rocketgenius"),
        ("updraftplus", "updraftplus"),
        ("sucuri_security", "sucuri"),
        ("really_simple_ssl", "really-simple-plugins"),
        ("google_analytics", "google"),
        ("advanced_custom_fields", "elliot-condon"),
        ("elementor", "elementor"),
        ("wp_mail_smtp", "wp-mail-smtp"),
        ("gutenberg", "wordpress"),
        ("classic_editor", "wordpress"),
        ("wp_super_cache", "automattic"),
        ("w3_total_cache", "fredrik-soderqvist"),
        ("wp_rocket", "wp-rocket"),
        ("redirection", "john-garfunkel"),
        ("rank_math", "meowapps"),
        ("seopress", "seopress"),
        ("aioseo", "aioseo"),
        ("cloudflare", "cloudflare"),
        ("nginx_helper", "rtcamp"),
        ("autoptimize", "futtta"),
        ("wp_fastest_cache", "wpfastestcache"),
        ("onesignal", "onesignal"),
        ("addtoany", "addtoany"),
        ("sharethis", "sharethis"),
    ])
});

/// Folds a display name to the vendor-table key form: lowercase with
/// spaces, dots, and dashes collapsed to underscores.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if matches!(c, ' ' | '.' | '-') { '_' } else { c })
        .collect()
}

/// Resolves a technology display name to its canonical vendor: exact match
/// first, then substring match in either direction.
pub fn map_vendor(name: &str) -> Option<&'static str> {
    let normalized = normalize_name(name);

    if let Some(vendor) = VENDOR_MAPPING.get(normalized.as_str()) {
        return Some(vendor);
    }

    VENDOR_MAPPING
        .iter()
        .find(|(key, _)| normalized.contains(*key) || key.contains(normalized.as_str()))
        .map(|(_, vendor)| *vendor)
}

/// Correlates detected (technology, version) pairs against the NVD with a
/// version-degradation retry strategy.
pub struct VulnCorrelator {
    nvd: NvdClient,
}

impl VulnCorrelator {
    pub fn new(nvd: NvdClient) -> Self {
        Self { nvd }
    }

    /// CVEs for one technology. No version or no vendor mapping yields an
    /// empty list without touching the network. Otherwise queries the exact
    /// version, then degrades it one dotted segment at a time
    /// (`6.8.3 -> 6.8 -> 6`), stopping at the first non-empty result.
    pub async fn check_technology(&self, name: &str, version: &str) -> Vec<VulnerabilityRecord> {
        if version.is_empty() {
            return Vec::new();
        }

        let Some(vendor) = map_vendor(name) else {
            debug!("No vendor mapping found for {}", name);
            return Vec::new();
        };
        let product = normalize_name(name);

        let mut records = self.nvd.query(vendor, &product, version).await;

        if records.is_empty() {
            if let Some(truncated) = truncate_version(version) {
                debug!("Trying broader search for {}:{}", name, truncated);
                records = self.nvd.query(vendor, &product, &truncated).await;

                if records.is_empty() {
                    if let Some(major) = truncate_version(&truncated) {
                        debug!("Trying broader search for {}:{}", name, major);
                        records = self.nvd.query(vendor, &product, &major).await;
                    }
                }
            }
        }

        records
    }

    /// Batch correlation for one domain: processes the list in fixed groups
    /// of five with a one-second pause between groups, sequentially.
    /// Technologies with no findings are omitted from the result map.
    pub async fn check_batch(
        &self,
        technologies: &[(String, String)],
    ) -> BTreeMap<String, Vec<VulnerabilityRecord>> {
        let mut results = BTreeMap::new();

        for (index, group) in technologies.chunks(BATCH_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(BATCH_PAUSE).await;
            }

            for (name, version) in group {
                let records = self.check_technology(name, version).await;
                if !records.is_empty() {
                    results.insert(format!("{name} ({version})"), records);
                }
            }
        }

        results
    }
}

/// Drops the last dot-separated segment, returning `None` when fewer than
/// two segments remain to truncate.
fn truncate_version(version: &str) -> Option<String> {
    let segments: Vec<&str> = version.split('.').collect();
    if segments.len() < 2 {
        return None;
    }
    let truncated = segments[..segments.len() - 1].join(".");
    if truncated.is_empty() {
        return None;
    }
    Some(truncated)
}
