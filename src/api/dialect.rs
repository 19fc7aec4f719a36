//
//  bitbucket-mcp
//  api/dialect.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # API Dialect Detection
//!
//! This module decides which of the two incompatible Bitbucket REST dialects
//! a configured base URL speaks. The decision is made exactly once, when the
//! client is constructed, and the result is threaded by value through the
//! path builder and request client.
//!
//! ## Detection Rule
//!
//! Bitbucket Cloud is the only variant with a known, fixed hostname, so it
//! is the only reliable positive signal:
//!
//! | Base URL host | Dialect |
//! |---------------|---------|
//! | `bitbucket.org` | Cloud |
//! | `api.bitbucket.org` (any `*.bitbucket.org`) | Cloud |
//! | Anything else (or unparseable input) | Data Center |
//!
//! Self-hosted Server/Data Center installations use arbitrary hostnames,
//! so everything that is not recognizably Cloud defaults to
//! [`Dialect::DataCenter`].
//!
//! ## Example
//!
//! ```rust
//! use bitbucket_mcp::api::Dialect;
//!
//! assert_eq!(Dialect::detect("https://api.bitbucket.org/2.0"), Dialect::Cloud);
//! assert_eq!(
//!     Dialect::detect("https://bitbucket.mycompany.com"),
//!     Dialect::DataCenter
//! );
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

/// The two mutually incompatible variants of the Bitbucket REST API.
///
/// The dialect determines request paths, pagination query parameters, and
/// pagination response shapes. It is immutable for the lifetime of a client:
/// once detected for a base URL it never changes.
///
/// # Variants
///
/// * `Cloud` - Bitbucket Cloud (multi-tenant, API v2.0 at `api.bitbucket.org`)
/// * `DataCenter` - Bitbucket Server/Data Center (self-hosted, API v1.0)
///
/// # Example
///
/// ```rust
/// use bitbucket_mcp::api::Dialect;
///
/// let dialect = Dialect::detect("https://git.example.com/rest/api/1.0");
/// assert!(!dialect.is_cloud());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// Bitbucket Cloud (bitbucket.org), REST API v2.0.
    Cloud,

    /// Bitbucket Server/Data Center at a custom host, REST API v1.0.
    DataCenter,
}

impl Dialect {
    /// Detects the dialect spoken by `base_url`.
    ///
    /// This function is pure and total: it never fails. Input that cannot
    /// be parsed as a URL, or that carries no recognizable Cloud marker,
    /// resolves to [`Dialect::DataCenter`] as the safe default.
    ///
    /// # Parameters
    ///
    /// * `base_url` - The configured API base URL
    ///
    /// # Example
    ///
    /// ```rust
    /// use bitbucket_mcp::api::Dialect;
    ///
    /// assert_eq!(Dialect::detect("https://BITBUCKET.ORG"), Dialect::Cloud);
    /// assert_eq!(Dialect::detect("not a url"), Dialect::DataCenter);
    /// ```
    pub fn detect(base_url: &str) -> Self {
        match Url::parse(base_url) {
            Ok(url) => match url.host_str() {
                Some(host) if is_cloud_host(host) => Self::Cloud,
                _ => Self::DataCenter,
            },
            Err(_) => Self::DataCenter,
        }
    }

    /// Returns `true` if this dialect is Bitbucket Cloud.
    ///
    /// Callers use this capability flag to pick dialect-specific query
    /// syntax that cannot be expressed as a path difference.
    pub fn is_cloud(&self) -> bool {
        matches!(self, Self::Cloud)
    }
}

/// Checks whether a hostname belongs to Bitbucket Cloud.
///
/// Matches `bitbucket.org` itself and any subdomain of it
/// (`api.bitbucket.org`, regional endpoints). Comparison is
/// case-insensitive.
fn is_cloud_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "bitbucket.org" || host.ends_with(".bitbucket.org")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_cloud_api_host() {
        assert_eq!(Dialect::detect("https://api.bitbucket.org/2.0"), Dialect::Cloud);
        assert!(Dialect::detect("https://api.bitbucket.org/2.0").is_cloud());
    }

    #[test]
    fn test_detects_cloud_bare_host() {
        assert_eq!(Dialect::detect("https://bitbucket.org"), Dialect::Cloud);
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        assert_eq!(Dialect::detect("https://API.BITBUCKET.ORG/2.0"), Dialect::Cloud);
    }

    #[test]
    fn test_custom_host_is_data_center() {
        let dialect = Dialect::detect("https://bitbucket.mycompany.com");
        assert_eq!(dialect, Dialect::DataCenter);
        assert!(!dialect.is_cloud());
    }

    #[test]
    fn test_lookalike_host_is_data_center() {
        // Suffix match must respect the label boundary.
        assert_eq!(
            Dialect::detect("https://evilbitbucket.org"),
            Dialect::DataCenter
        );
    }

    #[test]
    fn test_unparseable_input_is_total() {
        assert_eq!(Dialect::detect(""), Dialect::DataCenter);
        assert_eq!(Dialect::detect("not a url"), Dialect::DataCenter);
        assert_eq!(Dialect::detect("://missing-scheme"), Dialect::DataCenter);
    }
}
