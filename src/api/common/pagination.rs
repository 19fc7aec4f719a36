//
//  bitbucket-mcp
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! Pagination Normalization for Bitbucket API Responses
//!
//! This module converts the two native Bitbucket pagination shapes into one
//! cursor-agnostic contract. Each platform paginates differently, and these
//! types abstract those differences for the request client.
//!
//! # Cloud vs Server Pagination
//!
//! | Type | Platform | Strategy |
//! |------|----------|----------|
//! | [`CloudPage`] | Cloud | URL-based (`next` link) |
//! | [`ServerPage`] | Server/DC | Offset-based (`isLastPage` + `nextPageStart`) |
//!
//! **Bitbucket Cloud** requests pages with `page`/`pagelen` and signals a
//! following page with a `next` URL.
//!
//! **Bitbucket Server** requests pages with `start`/`limit` and signals the
//! end with an explicit `isLastPage` flag plus the start index of the next
//! page.
//!
//! Both normalize to [`PageResult`]: the accumulated items in response
//! order, plus whether further pages remain upstream.
//!
//! # Fetch-All Cap
//!
//! Transparent multi-page accumulation stops eagerly once
//! [`MAX_FETCH_ALL_ITEMS`] items have been collected, even if more pages
//! remain upstream. This is a documented truncation, not a failure.

use serde::Deserialize;
use serde_json::Value;

use super::ApiError;
use crate::api::Dialect;

/// Maximum number of items accumulated by a fetch-all request.
///
/// Bounds memory and latency when iterating large collections; accumulation
/// truncates at this count rather than continuing indefinitely.
pub const MAX_FETCH_ALL_ITEMS: usize = 1000;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGELEN: u32 = 25;

/// Smallest page size accepted from callers.
pub const MIN_PAGELEN: u32 = 1;

/// Largest page size accepted from callers (the upstream APIs cap here).
pub const MAX_PAGELEN: u32 = 100;

/// Caller-supplied pagination parameters for one collection fetch.
///
/// A `PageRequest` exists only for the duration of one logical collection
/// fetch. It either selects exactly one page (`page`/`pagelen`) or, with
/// `all` set, asks the client to accumulate successive pages until
/// upstream exhaustion or the [`MAX_FETCH_ALL_ITEMS`] cap.
///
/// # Example
///
/// ```rust
/// use bitbucket_mcp::api::PageRequest;
///
/// // Second page, 50 items per page
/// let single = PageRequest::single(Some(50), Some(2));
///
/// // Everything, up to the fetch-all cap
/// let all = PageRequest::fetch_all(None);
/// assert!(all.all);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Requested page size. `None` means [`DEFAULT_PAGELEN`]. An explicit
    /// value outside 1-100 is rejected, not clamped.
    pub pagelen: Option<u32>,

    /// Requested page number, 1-based. `None` means the first page.
    /// Ignored when `all` is set.
    pub page: Option<u32>,

    /// When set, accumulate pages until exhaustion or the item cap.
    pub all: bool,
}

impl PageRequest {
    /// Builds a request for exactly one page.
    pub fn single(pagelen: Option<u32>, page: Option<u32>) -> Self {
        Self {
            pagelen,
            page,
            all: false,
        }
    }

    /// Builds a fetch-all request with an optional per-page size.
    pub fn fetch_all(pagelen: Option<u32>) -> Self {
        Self {
            pagelen,
            page: None,
            all: true,
        }
    }

    /// Resolves the page size to use for upstream requests.
    ///
    /// Defaults to [`DEFAULT_PAGELEN`] when unset. An explicit value
    /// outside the 1-100 range is a protocol-correctness violation owned
    /// by this layer and is rejected with a caller-visible error rather
    /// than silently clamped.
    pub fn effective_pagelen(&self) -> Result<u32, ApiError> {
        match self.pagelen {
            None => Ok(DEFAULT_PAGELEN),
            Some(n) if (MIN_PAGELEN..=MAX_PAGELEN).contains(&n) => Ok(n),
            Some(n) => Err(ApiError::InvalidRequest(format!(
                "page size {n} is out of range ({MIN_PAGELEN}-{MAX_PAGELEN})"
            ))),
        }
    }

    /// Resolves the 1-based page number, defaulting to the first page.
    pub fn effective_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Normalized result of one collection fetch.
///
/// Items appear in the order the upstream API returned them; this layer
/// performs no reordering and no deduplication. `has_more` indicates
/// whether further pages remained upstream when the fetch stopped (because
/// a single page was requested, or because the fetch-all cap was hit).
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Accumulated items, insertion order preserved.
    pub items: Vec<Value>,

    /// Whether more pages exist upstream.
    pub has_more: bool,
}

/// One page as returned by the Bitbucket Cloud API (v2.0).
///
/// Cloud signals continuation with a `next` URL; when it is absent this
/// is the last page.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudPage<T> {
    /// Items in the current page. Always present, possibly empty.
    #[serde(default)]
    pub values: Vec<T>,

    /// URL of the next page, absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> CloudPage<T> {
    /// Returns `true` if a subsequent page exists.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// One page as returned by the Bitbucket Server/Data Center API (v1.0).
///
/// Server signals continuation with an explicit `isLastPage` flag and the
/// start index to request next.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerPage<T> {
    /// Items in the current page. Always present, possibly empty.
    #[serde(default)]
    pub values: Vec<T>,

    /// Whether this is the final page. Missing fields read as `true` so a
    /// malformed body can never drive an endless fetch-all loop.
    #[serde(default = "default_last_page", rename = "isLastPage")]
    pub is_last_page: bool,

    /// Start index for the next page; `None` on the last page.
    #[serde(default, rename = "nextPageStart")]
    pub next_page_start: Option<u64>,
}

fn default_last_page() -> bool {
    true
}

impl<T> ServerPage<T> {
    /// Returns `true` if a subsequent page exists.
    pub fn has_next(&self) -> bool {
        !self.is_last_page
    }

    /// Start index to use for the next request, if any.
    pub fn next_start(&self) -> Option<u64> {
        self.next_page_start
    }
}

/// One upstream page reduced to the dialect-agnostic signals the request
/// client's accumulation loop needs.
#[derive(Debug)]
pub(crate) struct NormalizedPage {
    pub items: Vec<Value>,
    pub has_more: bool,
    /// Server-dialect start index for the following request. Always `None`
    /// on Cloud, where continuation is by page number.
    pub next_start: Option<u64>,
}

/// Parses a raw response body into a [`NormalizedPage`] using the
/// dialect-specific pagination signals.
pub(crate) fn normalize_page(dialect: Dialect, body: Value) -> Result<NormalizedPage, ApiError> {
    match dialect {
        Dialect::Cloud => {
            let page: CloudPage<Value> = serde_json::from_value(body)
                .map_err(|e| ApiError::Transport(format!("Malformed page response: {e}")))?;
            let has_more = page.has_next();
            Ok(NormalizedPage {
                items: page.values,
                has_more,
                next_start: None,
            })
        }
        Dialect::DataCenter => {
            let page: ServerPage<Value> = serde_json::from_value(body)
                .map_err(|e| ApiError::Transport(format!("Malformed page response: {e}")))?;
            let has_more = page.has_next();
            let next_start = page.next_start();
            Ok(NormalizedPage {
                items: page.values,
                has_more,
                next_start,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effective_pagelen_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.effective_pagelen().unwrap(), DEFAULT_PAGELEN);
    }

    #[test]
    fn test_effective_pagelen_accepts_bounds() {
        assert_eq!(
            PageRequest::single(Some(1), None).effective_pagelen().unwrap(),
            1
        );
        assert_eq!(
            PageRequest::single(Some(100), None)
                .effective_pagelen()
                .unwrap(),
            100
        );
    }

    #[test]
    fn test_effective_pagelen_rejects_out_of_range() {
        for bad in [0u32, 101, 5000] {
            let err = PageRequest::single(Some(bad), None)
                .effective_pagelen()
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_effective_page_is_one_based() {
        assert_eq!(PageRequest::default().effective_page(), 1);
        assert_eq!(PageRequest::single(None, Some(0)).effective_page(), 1);
        assert_eq!(PageRequest::single(None, Some(3)).effective_page(), 3);
    }

    #[test]
    fn test_cloud_page_continuation() {
        let body = json!({
            "values": [{"name": "main"}, {"name": "develop"}],
            "page": 1,
            "next": "https://api.bitbucket.org/2.0/x?page=2"
        });
        let page = normalize_page(Dialect::Cloud, body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.next_start, None);
    }

    #[test]
    fn test_cloud_last_page() {
        let body = json!({"values": [{"name": "main"}]});
        let page = normalize_page(Dialect::Cloud, body).unwrap();
        assert!(!page.has_more);
    }

    #[test]
    fn test_server_page_continuation() {
        let body = json!({
            "values": [{"displayId": "main"}],
            "size": 1,
            "isLastPage": false,
            "nextPageStart": 25,
            "start": 0
        });
        let page = normalize_page(Dialect::DataCenter, body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.has_more);
        assert_eq!(page.next_start, Some(25));
    }

    #[test]
    fn test_server_last_page() {
        let body = json!({"values": [], "isLastPage": true});
        let page = normalize_page(Dialect::DataCenter, body).unwrap();
        assert!(!page.has_more);
        assert_eq!(page.next_start, None);
    }

    #[test]
    fn test_server_missing_flag_reads_as_last_page() {
        let body = json!({"values": [{"id": 1}]});
        let page = normalize_page(Dialect::DataCenter, body).unwrap();
        assert!(!page.has_more);
    }

    #[test]
    fn test_item_order_is_preserved() {
        let body = json!({"values": [3, 1, 2, 1], "isLastPage": true});
        let page = normalize_page(Dialect::DataCenter, body).unwrap();
        let nums: Vec<i64> = page.items.iter().map(|v| v.as_i64().unwrap()).collect();
        // No reordering, no deduplication.
        assert_eq!(nums, vec![3, 1, 2, 1]);
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        let err = normalize_page(Dialect::Cloud, json!("nope")).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
