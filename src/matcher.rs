// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Evidence Matcher
 * Shared channel-search and version-extraction primitives for all detectors
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::types::FetchResult;

static SCRIPT_SRC: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"<script[^>]*?src=["']([^"']*)["']"#)
        .case_insensitive(true)
        .build()
        .expect("script src regex")
});

static TITLE_TAG: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"<title>(.*?)</title>")
        .case_insensitive(true)
        .build()
        .expect("title regex")
});

/// Compiles a signature pattern case-insensitively. Broken patterns in a
/// signature document are skipped, not fatal.
pub fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Skipping invalid signature pattern {:?}: {}", pattern, e);
            None
        }
    }
}

/// One domain's fetched evidence, viewed through the channels the detectors
/// search: header lines, HTML body, cookie names, the URL itself, and the
/// script-src URLs extracted from the body.
pub struct Evidence<'a> {
    pub url: &'a str,
    pub response: &'a FetchResult,
}

impl<'a> Evidence<'a> {
    pub fn new(url: &'a str, response: &'a FetchResult) -> Self {
        Self { url, response }
    }

    pub fn html(&self) -> &str {
        self.response.body.as_deref().unwrap_or("")
    }

    /// Matches patterns against `"Name: Value"` header lines.
    pub fn headers_match(&self, patterns: &[String]) -> bool {
        self.response.headers.iter().any(|(name, value)| {
            let line = format!("{name}: {value}");
            patterns
                .iter()
                .filter_map(|p| compile(p))
                .any(|re| re.is_match(&line))
        })
    }

    pub fn html_match(&self, patterns: &[String]) -> bool {
        let html = self.html();
        if html.is_empty() {
            return false;
        }
        patterns
            .iter()
            .filter_map(|p| compile(p))
            .any(|re| re.is_match(html))
    }

    /// Matches patterns against cookie names.
    pub fn cookies_match(&self, patterns: &[String]) -> bool {
        self.response.cookies.keys().any(|name| {
            patterns
                .iter()
                .filter_map(|p| compile(p))
                .any(|re| re.is_match(name))
        })
    }

    pub fn url_match(&self, patterns: &[String]) -> bool {
        patterns
            .iter()
            .filter_map(|p| compile(p))
            .any(|re| re.is_match(self.url))
    }

    /// JS-channel variant: extracts `<script src=...>` URLs first, then
    /// matches patterns against those URLs.
    pub fn js_match(&self, patterns: &[String]) -> bool {
        let html = self.html();
        if html.is_empty() {
            return false;
        }
        let sources: Vec<&str> = SCRIPT_SRC
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        patterns
            .iter()
            .filter_map(|p| compile(p))
            .any(|re| sources.iter().any(|src| re.is_match(src)))
    }

    /// Content of the first `<title>` tag, if any.
    pub fn title(&self) -> Option<&str> {
        TITLE_TAG
            .captures(self.html())
            .and_then(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Applies a one-capture-group version pattern across the channels in
    /// fixed precedence: headers, then HTML, then URL, then cookies. The
    /// first non-empty capture wins.
    pub fn extract_version(&self, pattern: &str) -> String {
        let Some(re) = compile(pattern) else {
            return String::new();
        };

        for (name, value) in &self.response.headers {
            let line = format!("{name}: {value}");
            if let Some(version) = first_capture(&re, &line) {
                return version;
            }
        }

        if let Some(version) = first_capture(&re, self.html()) {
            return version;
        }

        if let Some(version) = first_capture(&re, self.url) {
            return version;
        }

        for name in self.response.cookies.keys() {
            if let Some(version) = first_capture(&re, name) {
                return version;
            }
        }

        String::new()
    }
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(
        body: &str,
        headers: &[(&str, &str)],
        cookies: &[(&str, &str)],
    ) -> FetchResult {
        FetchResult {
            body: Some(body.to_string()),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cookies: cookies
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            status_code: 200,
        }
    }

    #[test]
    fn header_matching_uses_name_value_lines() {
        let resp = response("", &[("Server", "nginx/1.18.0")], &[]);
        let evidence = Evidence::new("http://example.com", &resp);

        assert!(evidence.headers_match(&["server: nginx".to_string()]));
        assert!(!evidence.headers_match(&["apache".to_string()]));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let resp = response("<div>Powered by WORDPRESS</div>", &[], &[]);
        let evidence = Evidence::new("http://example.com", &resp);

        assert!(evidence.html_match(&["wordpress".to_string()]));
    }

    #[test]
    fn js_channel_matches_script_srcs_only() {
        let body = r#"<html><script src="/static/jquery-3.6.0.min.js"></script>
            <p>jquery mentioned in text elsewhere: react</p></html>"#;
        let resp = response(body, &[], &[]);
        let evidence = Evidence::new("http://example.com", &resp);

        assert!(evidence.js_match(&["jquery".to_string()]));
        assert!(!evidence.js_match(&["react".to_string()]));
    }

    #[test]
    fn cookie_matching_uses_names() {
        let resp = response("", &[], &[("PHPSESSID", "abc")]);
        let evidence = Evidence::new("http://example.com", &resp);

        assert!(evidence.cookies_match(&["phpsessid".to_string()]));
        assert!(!evidence.cookies_match(&["abc".to_string()]));
    }

    #[test]
    fn version_precedence_prefers_headers_over_html() {
        let resp = response(
            "Tech v1.1",
            &[("X-Powered-By", "Tech/9.9")],
            &[],
        );
        let evidence = Evidence::new("http://example.com", &resp);

        assert_eq!(evidence.extract_version(r"Tech[ /v]+([0-9.]+)"), "9.9");
    }

    #[test]
    fn version_falls_back_through_channels() {
        let resp = response("Generator: Acme 4.2", &[], &[]);
        let evidence = Evidence::new("http://example.com", &resp);

        assert_eq!(evidence.extract_version(r"Acme ([0-9.]+)"), "4.2");
        assert_eq!(evidence.extract_version(r"Missing ([0-9.]+)"), "");
    }

    #[test]
    fn empty_body_matches_nothing() {
        let resp = FetchResult {
            body: None,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            status_code: 0,
        };
        let evidence = Evidence::new("http://example.com", &resp);

        assert!(!evidence.html_match(&[".*".to_string()]));
        assert!(!evidence.js_match(&[".*".to_string()]));
        assert!(evidence.title().is_none());
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let resp = response("content", &[], &[]);
        let evidence = Evidence::new("http://example.com", &resp);

        assert!(!evidence.html_match(&["[unclosed".to_string()]));
        assert!(evidence.html_match(&["[unclosed".to_string(), "content".to_string()]));
    }
}
