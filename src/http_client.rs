// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Fetch Layer
 * Retrying page fetcher and single-shot probe client
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, SET_COOKIE};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::FetchResult;

/// Realistic browser User-Agents, rotated per request to avoid trivial blocks
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
];

fn next_user_agent() -> &'static str {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// HTTP collaborator for the scan pipeline.
///
/// `fetch` owns retry-with-backoff and never fails for ordinary network
/// errors: exhaustion yields the terminal `FetchResult::failed()` shape.
/// `probe` is the verifier's single-attempt variant with no retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        default_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .default_headers(default_headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_retries,
        })
    }

    /// Fetch one page, retrying transport failures with linear backoff.
    ///
    /// Returns the evidence tuple for detection. On retry exhaustion the
    /// result has no body, empty header/cookie maps, and status 0 -- the
    /// pipeline treats that as "site unreachable", not as an error.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut attempts = 0;

        loop {
            match self.request(url).await {
                Ok(result) => return result,
                Err(e) => {
                    attempts += 1;
                    warn!(
                        "Error fetching {}: {}. Retry {}/{}",
                        url, e, attempts, self.max_retries
                    );
                    if attempts >= self.max_retries {
                        warn!("Failed to fetch {} after {} retries", url, self.max_retries);
                        return FetchResult::failed();
                    }
                    tokio::time::sleep(Duration::from_millis(100 * attempts as u64)).await;
                }
            }
        }
    }

    /// Single-attempt GET for sensitive-file probes. Transport errors and
    /// timeouts surface as `Err` so the verifier can count the path as
    /// "not found"; probes are never retried.
    pub async fn probe(&self, url: &str) -> Result<FetchResult> {
        self.request(url).await
    }

    async fn request(&self, url: &str) -> Result<FetchResult> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, next_user_agent())
            .send()
            .await?;

        let status_code = response.status().as_u16();

        let mut headers = HashMap::with_capacity(response.headers().len());
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_string(), value_str.to_string());
            }
        }

        let cookies = parse_cookies(response.headers());

        let body_bytes = response.bytes().await.unwrap_or_default();
        let body = if body_bytes.len() > MAX_BODY_SIZE {
            String::from_utf8_lossy(&body_bytes[..MAX_BODY_SIZE]).to_string()
        } else {
            String::from_utf8_lossy(&body_bytes).to_string()
        };

        debug!("Fetched {} ({} bytes, status {})", url, body.len(), status_code);

        Ok(FetchResult {
            body: Some(body),
            headers,
            cookies,
            status_code,
        })
    }
}

/// Folds `Set-Cookie` response headers into a name -> value map. Cookie
/// attributes after the first `;` are dropped; detection matches on names.
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        let pair = raw.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    cookies
}
