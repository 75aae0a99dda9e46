// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Plugin & Theme Miner
 * Structural extraction of CMS extensions from resource paths
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::matcher::compile;

fn pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .expect("miner pattern")
}

static WP_PLUGIN_PATH: Lazy<Regex> =
    Lazy::new(|| pattern(r#"/wp-content/plugins/([^/"'>]+)/"#));
static WP_PLUGIN_PATH_ALT: Lazy<Regex> =
    Lazy::new(|| pattern(r#"wp-content[/\\]plugins[/\\]([^/\\"'>\s]+)/"#));
static WP_PLUGIN_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"(?:href|src)=["'][^"']*wp-content[/\\]plugins[/\\]([^/\\"'>\s]+)[/\\][^"']*["']"#)
});
static WP_PLUGIN_JSON: Lazy<Regex> =
    Lazy::new(|| pattern(r#"["']wp[-_]?(?:plugin|extension)["']\s*:\s*["']([^"']+)["']"#));
static WP_PLUGIN_COMMENT: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"<!--.*?(?:powered by|developed by|by|plugin).*?([^,\s'"<>]+).*?-->"#)
});

static WP_THEME_PATH: Lazy<Regex> =
    Lazy::new(|| pattern(r#"/wp-content/themes/([^/"'>]+)/"#));
static WP_THEME_PATH_ALT: Lazy<Regex> =
    Lazy::new(|| pattern(r#"wp-content[/\\]themes[/\\]([^/\\"'>\s]+)/"#));
static WP_THEME_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"(?:href|src)=["'][^"']*wp-content[/\\]themes[/\\]([^/\\"'>\s]+)[/\\][^"']*["']"#)
});

static JOOMLA_COMPONENT: Lazy<Regex> =
    Lazy::new(|| pattern(r#"/components/com_([^/"'>]+)/"#));
static JOOMLA_MODULE: Lazy<Regex> = Lazy::new(|| pattern(r#"/modules/mod_([^/"'>]+)/"#));
static JOOMLA_PLUGIN: Lazy<Regex> = Lazy::new(|| pattern(r#"/plugins/([^/"'>]+)/"#));

static DRUPAL_MODULE: Lazy<Regex> = Lazy::new(|| pattern(r#"/modules/([^/"'>\s]+)/"#));
static DRUPAL_CONTRIB: Lazy<Regex> =
    Lazy::new(|| pattern(r#"/sites/(?:all/)?modules/contrib/([^/"'>\s]+)/"#));

static VERSION_SHAPE: Lazy<Regex> = Lazy::new(|| pattern(r"^[0-9]+(\.[0-9]+)*$"));

/// Drupal core module names that appear on effectively every site and carry
/// no fingerprinting value.
const DRUPAL_CORE_MODULES: &[&str] = &["system", "user", "node", "views"];

/// Substrings that mark a token as plausibly a plugin name when mined from
/// loosely-structured sources (comments, inline JSON).
const PLUGIN_INDICATORS: &[&str] = &[
    "wp_", "wc_", "woocom", "contact", "social", "seo", "cache", "backup", "security", "gallery",
    "slider", "form", "captcha",
];

/// Deduplicated miner output: sets keyed by (name, version) so repeated
/// resource paths collapse to one entry.
#[derive(Debug, Default)]
pub struct MinedExtensions {
    pub plugins: BTreeSet<(String, String)>,
    pub themes: BTreeSet<(String, String)>,
}

impl MinedExtensions {
    pub fn plugin_labels(&self) -> Vec<String> {
        Self::labels(&self.plugins)
    }

    pub fn theme_labels(&self) -> Vec<String> {
        Self::labels(&self.themes)
    }

    fn labels(entries: &BTreeSet<(String, String)>) -> Vec<String> {
        entries
            .iter()
            .map(|(name, version)| {
                if version.is_empty() {
                    name.clone()
                } else {
                    format!("{name} ({version})")
                }
            })
            .collect()
    }
}

/// Mines plugin and theme names from resource paths in the HTML body,
/// recognizing WordPress, Joomla, and Drupal conventions, plus best-effort
/// comment and inline-JSON heuristics that trade precision for coverage.
pub fn mine_extensions(html: &str) -> MinedExtensions {
    let mut mined = MinedExtensions::default();
    if html.is_empty() {
        return mined;
    }

    mine_wordpress_plugins(html, &mut mined.plugins);
    mine_wordpress_themes(html, &mut mined.themes);
    mine_joomla_extensions(html, &mut mined.plugins);
    mine_drupal_modules(html, &mut mined.plugins);

    mined
}

fn mine_wordpress_plugins(html: &str, plugins: &mut BTreeSet<(String, String)>) {
    for re in [&*WP_PLUGIN_PATH, &*WP_PLUGIN_PATH_ALT, &*WP_PLUGIN_RESOURCE] {
        for caps in re.captures_iter(html) {
            let name = caps[1].to_string();
            let version = version_from_path(html, &format!("wp-content/plugins/{name}/"));
            plugins.insert((name, version));
        }
    }

    for caps in WP_PLUGIN_JSON.captures_iter(html) {
        let name = clean_token(&caps[1]);
        if name.len() > 2 {
            let version = version_near_name(html, &name);
            plugins.insert((name, version));
        }
    }

    for caps in WP_PLUGIN_COMMENT.captures_iter(html) {
        let name = clean_token(&caps[1]);
        if name.len() > 2 && is_likely_plugin(&name) {
            let version = version_near_name(html, &name);
            plugins.insert((name, version));
        }
    }
}

fn mine_wordpress_themes(html: &str, themes: &mut BTreeSet<(String, String)>) {
    for re in [&*WP_THEME_PATH, &*WP_THEME_PATH_ALT, &*WP_THEME_RESOURCE] {
        for caps in re.captures_iter(html) {
            let name = caps[1].to_string();
            let version = version_from_path(html, &format!("wp-content/themes/{name}/"));
            themes.insert((name, version));
        }
    }
}

fn mine_joomla_extensions(html: &str, plugins: &mut BTreeSet<(String, String)>) {
    for caps in JOOMLA_COMPONENT.captures_iter(html) {
        let name = format!("com_{}", &caps[1]);
        let version = version_from_path(html, &format!("/components/{name}/"));
        plugins.insert((name, version));
    }

    for caps in JOOMLA_MODULE.captures_iter(html) {
        let name = format!("mod_{}", &caps[1]);
        let version = version_from_path(html, &format!("/modules/{name}/"));
        plugins.insert((name, version));
    }

    for caps in JOOMLA_PLUGIN.captures_iter(html) {
        let name = caps[1].to_string();
        let version = version_from_path(html, &format!("/plugins/{name}/"));
        plugins.insert((name, version));
    }
}

fn mine_drupal_modules(html: &str, plugins: &mut BTreeSet<(String, String)>) {
    for caps in DRUPAL_MODULE.captures_iter(html) {
        let name = caps[1].to_string();
        if DRUPAL_CORE_MODULES.contains(&name.as_str()) {
            continue;
        }
        let version = version_from_path(html, &format!("/modules/{name}/"));
        plugins.insert((name, version));
    }

    for caps in DRUPAL_CONTRIB.captures_iter(html) {
        let name = caps[1].to_string();
        let version = version_from_path(html, &format!("/sites/all/modules/contrib/{name}/"));
        plugins.insert((name, version));
    }
}

/// Looks for a version number adjacent to a resource-path fragment:
/// a dotted number, a `v`-prefixed dotted number, or an
/// underscore-separated number.
fn version_from_path(html: &str, fragment: &str) -> String {
    let escaped = regex::escape(fragment);
    let candidates = [
        format!(r#"{escaped}[^"']*?([0-9]+\.[0-9]+(?:\.[0-9]+)?)"#),
        format!(r#"{escaped}[^"']*?v([0-9]+\.[0-9]+(?:\.[0-9]+)?)"#),
        format!(r#"{escaped}[^"']*?([0-9]+_[0-9]+(?:_[0-9]+)?)"#),
    ];

    for candidate in &candidates {
        if let Some(re) = compile(candidate) {
            if let Some(caps) = re.captures(html) {
                if let Some(version) = caps.get(1) {
                    return version.as_str().to_string();
                }
            }
        }
    }

    String::new()
}

/// Textual-proximity fallback: the item name followed by a dotted number
/// anywhere in the same document.
fn version_near_name(html: &str, name: &str) -> String {
    let escaped = regex::escape(name);
    let candidates = [
        format!(r"{escaped}[^a-zA-Z0-9]*v?([0-9]+\.[0-9]+(?:\.[0-9]+)?)"),
        format!(r"{escaped}[^a-zA-Z0-9]*([0-9]+\.[0-9]+(?:\.[0-9]+)?)"),
    ];

    for candidate in &candidates {
        if let Some(re) = compile(candidate) {
            if let Some(caps) = re.captures(html) {
                if let Some(version) = caps.get(1) {
                    if VERSION_SHAPE.is_match(version.as_str()) {
                        return version.as_str().to_string();
                    }
                }
            }
        }
    }

    String::new()
}

fn clean_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn is_likely_plugin(name: &str) -> bool {
    let lower = name.to_lowercase();
    PLUGIN_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
        || name.len() <= 50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_plugin_paths_dedup_to_one_entry() {
        let html = r#"
            <link href="/wp-content/plugins/akismet/readme.txt">
            <script src="/wp-content/plugins/akismet/akismet.js"></script>
        "#;
        let mined = mine_extensions(html);

        let akismet: Vec<_> = mined
            .plugins
            .iter()
            .filter(|(name, _)| name == "akismet")
            .collect();
        assert_eq!(akismet.len(), 1);
    }

    #[test]
    fn extracts_version_adjacent_to_path() {
        let html = r#"<script src="/wp-content/plugins/contact-form-7/includes/js/index.js?ver=5.9.8"></script>"#;
        let mined = mine_extensions(html);

        assert!(mined
            .plugins
            .contains(&("contact-form-7".to_string(), "5.9.8".to_string())));
    }

    #[test]
    fn mines_themes_separately_from_plugins() {
        let html = r#"<link rel="stylesheet" href="/wp-content/themes/twentytwenty/style.css">"#;
        let mined = mine_extensions(html);

        assert!(mined
            .themes
            .iter()
            .any(|(name, _)| name == "twentytwenty"));
        assert!(mined.plugins.is_empty());
    }

    #[test]
    fn mines_joomla_components_with_prefix() {
        let html = r#"<script src="/components/com_content/assets/main.js"></script>
                      <link href="/modules/mod_menu/menu.css">"#;
        let mined = mine_extensions(html);

        assert!(mined.plugins.iter().any(|(name, _)| name == "com_content"));
        assert!(mined.plugins.iter().any(|(name, _)| name == "mod_menu"));
    }

    #[test]
    fn skips_drupal_core_modules() {
        let html = r#"<script src="/modules/system/system.js"></script>
                      <script src="/modules/webform/webform.js"></script>
                      <link href="/sites/all/modules/contrib/pathauto/pathauto.css">"#;
        let mined = mine_extensions(html);

        assert!(!mined.plugins.iter().any(|(name, _)| name == "system"));
        assert!(mined.plugins.iter().any(|(name, _)| name == "webform"));
        assert!(mined.plugins.iter().any(|(name, _)| name == "pathauto"));
    }

    #[test]
    fn empty_html_mines_nothing() {
        let mined = mine_extensions("");
        assert!(mined.plugins.is_empty());
        assert!(mined.themes.is_empty());
    }

    #[test]
    fn plugin_labels_format_versions() {
        let html = r#"<link href="/wp-content/plugins/akismet/readme.txt">"#;
        let mined = mine_extensions(html);

        assert_eq!(mined.plugin_labels(), vec!["akismet".to_string()]);
    }
}
