//
//  bitbucket-mcp
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # HTTP Request Client for the Bitbucket API
//!
//! This module provides the core request client shared by every tool
//! operation. It owns the transport configuration (base URL, bearer token,
//! timeout, retry policy) and exposes two verbs: a single-resource fetch
//! and a paginated-collection fetch.
//!
//! ## Features
//!
//! - Dialect detection at construction, immutable for the client lifetime
//! - Bearer-token authorization on every request
//! - Retry with exponential backoff for transient failures only
//! - Error classification into the [`ApiError`] taxonomy
//! - Pagination normalization across both dialects
//!
//! ## Retry Policy
//!
//! Only transport-level failures and HTTP 5xx responses are retried; any
//! 4xx response indicates a request that will not succeed on replay and is
//! surfaced immediately. The backoff schedule is `base_delay * 2^attempt`
//! (attempt 0-based), computed by the pure [`backoff_delay`] function so
//! the policy is testable without I/O. The configured timeout applies per
//! individual attempt, not to the cumulative retry sequence.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bitbucket_mcp::api::{BitbucketClient, ClientConfig};
//!
//! # async fn example() -> Result<(), bitbucket_mcp::api::ApiError> {
//! let client = BitbucketClient::new(ClientConfig {
//!     base_url: "https://api.bitbucket.org/2.0".to_string(),
//!     token: "app-password-or-token".to_string(),
//!     timeout: Duration::from_secs(30),
//!     max_retries: 3,
//!     retry_delay: Duration::from_millis(500),
//! })?;
//!
//! let paths = client.paths();
//! let repo = client.fetch_one(&paths.repository("acme", "website"), &[]).await?;
//! println!("{}", repo["full_name"]);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::common::{normalize_page, ApiError, PageRequest, PageResult, MAX_FETCH_ALL_ITEMS};
use super::{Dialect, PathBuilder};

/// Immutable transport configuration for a [`BitbucketClient`].
///
/// Constructed and validated by the configuration loader before the client
/// exists; the client itself does not re-validate these fields.
///
/// # Fields
///
/// | Field | Constraint |
/// |-------|-----------|
/// | `base_url` | normalized: scheme validated, no trailing slash |
/// | `token` | opaque bearer token, never logged |
/// | `timeout` | positive, applies per HTTP attempt |
/// | `max_retries` | total attempt budget; 0 behaves as 1 |
/// | `retry_delay` | positive base for exponential backoff |
#[derive(Clone)]
pub struct ClientConfig {
    /// Normalized API base URL (no trailing slash).
    pub base_url: String,

    /// Bearer token presented in the Authorization header.
    ///
    /// Treated as an opaque secret; it never appears in logs, error
    /// messages, or `Debug` output.
    pub token: String,

    /// Timeout for each individual HTTP attempt.
    pub timeout: Duration,

    /// Total attempt budget for transient failures.
    pub max_retries: u32,

    /// Base delay for the exponential backoff schedule.
    pub retry_delay: Duration,
}

// Manual Debug so the token cannot leak through derived formatting.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

/// The request client for Bitbucket Cloud and Server/Data Center.
///
/// Stateless beyond its immutable configuration and detected dialect, so a
/// single instance is safe for concurrent use: every call is an
/// independent request/response cycle with no shared mutable state.
///
/// # Creating a Client
///
/// ```rust,no_run
/// use std::time::Duration;
/// use bitbucket_mcp::api::{BitbucketClient, ClientConfig};
///
/// let client = BitbucketClient::new(ClientConfig {
///     base_url: "https://bitbucket.mycompany.com/rest/api/1.0".to_string(),
///     token: "personal-access-token".to_string(),
///     timeout: Duration::from_secs(30),
///     max_retries: 3,
///     retry_delay: Duration::from_millis(500),
/// })?;
/// assert!(!client.is_cloud());
/// # Ok::<(), bitbucket_mcp::api::ApiError>(())
/// ```
pub struct BitbucketClient {
    /// The underlying HTTP client.
    http: Client,
    /// Transport configuration, immutable after construction.
    config: ClientConfig,
    /// The detected dialect, fixed for the client lifetime.
    dialect: Dialect,
}

impl BitbucketClient {
    /// Creates a client, detecting the dialect from the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let dialect = Dialect::detect(&config.base_url);
        Self::with_dialect(config, dialect)
    }

    /// Creates a client with an explicitly pinned dialect.
    ///
    /// Used when the dialect is already known (a stored configuration, or
    /// tests pointing a Cloud-dialect client at a local server).
    pub fn with_dialect(config: ClientConfig, dialect: Dialect) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::transport)?;

        Ok(Self {
            http,
            config,
            dialect,
        })
    }

    /// The dialect this client speaks.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns `true` if this client targets Bitbucket Cloud.
    pub fn is_cloud(&self) -> bool {
        self.dialect.is_cloud()
    }

    /// A path builder pinned to this client's dialect.
    pub fn paths(&self) -> PathBuilder {
        PathBuilder::new(self.dialect)
    }

    /// Fetches a single resource as a structured JSON value.
    ///
    /// Issues one HTTP GET (plus retries per the policy) against
    /// `base_url + path` with the supplied query parameters, and returns
    /// the decoded response body unchanged.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ApiError`]; see the module docs for the
    /// retry and classification rules.
    pub async fn fetch_one(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ApiError> {
        self.get_json(path, query).await
    }

    /// Fetches a single resource as plain text.
    ///
    /// Some endpoints (notably pull request diffs) return raw text rather
    /// than JSON; this verb shares the retry and classification machinery
    /// with [`fetch_one`](Self::fetch_one) but skips decoding.
    pub async fn fetch_raw(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<String, ApiError> {
        self.get_with_retry(path, query).await
    }

    /// Fetches a collection page, or accumulates all pages.
    ///
    /// With `page.all` unset, issues exactly one request honoring the
    /// supplied page number and page size and reports whether further
    /// pages exist. With `page.all` set, transparently issues successive
    /// page requests (strictly sequentially, since each continuation
    /// token depends on the previous response) until the upstream API
    /// reports no more pages, yields an empty page, or
    /// [`MAX_FETCH_ALL_ITEMS`] items have been accumulated. Hitting the
    /// cap truncates the result; it is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] for an explicit out-of-range
    /// page size, or any classified error from the underlying requests.
    pub async fn fetch_page(
        &self,
        path: &str,
        page: &PageRequest,
        extra_query: &[(String, String)],
    ) -> Result<PageResult, ApiError> {
        let pagelen = page.effective_pagelen()?;

        if page.all {
            return self.fetch_all_pages(path, pagelen, extra_query).await;
        }

        let query = self.page_query(pagelen, page.effective_page(), None, extra_query);
        let body = self.get_json(path, &query).await?;
        let normalized = normalize_page(self.dialect, body)?;

        Ok(PageResult {
            items: normalized.items,
            has_more: normalized.has_more,
        })
    }

    /// Accumulates pages until exhaustion or the fetch-all cap.
    async fn fetch_all_pages(
        &self,
        path: &str,
        pagelen: u32,
        extra_query: &[(String, String)],
    ) -> Result<PageResult, ApiError> {
        let mut items: Vec<Value> = Vec::new();
        let mut page_no = 1u32;
        let mut start: Option<u64> = None;

        loop {
            let query = self.page_query(pagelen, page_no, start, extra_query);
            let body = self.get_json(path, &query).await?;
            let page = normalize_page(self.dialect, body)?;

            let remaining = MAX_FETCH_ALL_ITEMS - items.len();
            let fetched = page.items.len();
            let truncated = fetched > remaining;
            items.extend(page.items.into_iter().take(remaining));

            if items.len() >= MAX_FETCH_ALL_ITEMS {
                let has_more = truncated || page.has_more;
                if has_more {
                    tracing::debug!(
                        cap = MAX_FETCH_ALL_ITEMS,
                        "Fetch-all accumulation reached the item cap, truncating"
                    );
                }
                return Ok(PageResult { items, has_more });
            }

            if !page.has_more {
                return Ok(PageResult {
                    items,
                    has_more: false,
                });
            }

            // An upstream that claims continuation without yielding items
            // would keep the loop requesting forever; stop at the first
            // empty page and surface its continuation claim as-is.
            if fetched == 0 {
                tracing::debug!("Empty page with a continuation signal, stopping accumulation");
                return Ok(PageResult {
                    items,
                    has_more: true,
                });
            }

            page_no += 1;
            // Server dialect continues from the reported start index; the
            // fallback covers servers that omit nextPageStart.
            start = Some(
                page.next_start
                    .unwrap_or_else(|| start.unwrap_or(0) + u64::from(pagelen)),
            );
        }
    }

    /// Builds the dialect-specific pagination query parameters.
    ///
    /// Cloud paginates with `pagelen`/`page` (1-based); Server/DC with
    /// `limit`/`start` (0-based item offset).
    fn page_query(
        &self,
        pagelen: u32,
        page: u32,
        start: Option<u64>,
        extra: &[(String, String)],
    ) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(extra.len() + 2);

        match self.dialect {
            Dialect::Cloud => {
                query.push(("pagelen".to_string(), pagelen.to_string()));
                query.push(("page".to_string(), page.to_string()));
            }
            Dialect::DataCenter => {
                let start =
                    start.unwrap_or_else(|| u64::from(page.saturating_sub(1)) * u64::from(pagelen));
                query.push(("limit".to_string(), pagelen.to_string()));
                query.push(("start".to_string(), start.to_string()));
            }
        }

        query.extend(extra.iter().cloned());
        query
    }

    /// GET returning a decoded JSON body.
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let body = self.get_with_retry(path, query).await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Transport(format!("Malformed JSON response: {e}")))
    }

    /// GET with the retry policy applied.
    ///
    /// Retries transient failures with exponential backoff up to the
    /// configured budget; after exhaustion the last observed error is
    /// surfaced.
    async fn get_with_retry(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            match self.attempt_get(&url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let delay = backoff_delay(self.config.retry_delay, attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One HTTP attempt: send, read, classify.
    async fn attempt_get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<String, ApiError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(ApiError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::transport)?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        Ok(body)
    }
}

/// Computes the backoff delay for a 0-based attempt number.
///
/// The schedule doubles per attempt: `base`, `2*base`, `4*base`, …
/// Isolated from the transport call so retry-policy tests need no real or
/// simulated HTTP latency. Saturates instead of overflowing for large
/// attempt numbers.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use bitbucket_mcp::api::backoff_delay;
///
/// let base = Duration::from_millis(500);
/// assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
/// assert_eq!(backoff_delay(base, 2), Duration::from_millis(2000));
/// ```
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}
