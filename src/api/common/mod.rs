//
//  bitbucket-mcp
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! Common API Types for Bitbucket Cloud and Server
//!
//! This module provides the error taxonomy shared by both Bitbucket Cloud
//! and Bitbucket Server/Data Center, plus the pagination types re-exported
//! from the [`pagination`] submodule.
//!
//! # Error Classification
//!
//! Every failed request is classified at the point of failure and never
//! re-inspected afterwards:
//!
//! | Variant | Source | Retried |
//! |---------|--------|---------|
//! | `NotFound` | HTTP 404 | never |
//! | `Unauthorized` | HTTP 401/403 | never |
//! | `Conflict` | HTTP 409 | never |
//! | `RequestFailed` | other non-2xx | 5xx only |
//! | `InvalidRequest` | local validation | never |
//! | `Transport` | no HTTP response | always |
//!
//! # Example
//!
//! ```rust
//! use bitbucket_mcp::api::ApiError;
//!
//! fn describe<T>(result: Result<T, ApiError>) {
//!     match result {
//!         Ok(_) => println!("Success!"),
//!         Err(ApiError::NotFound(resource)) => println!("Not found: {}", resource),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Notes
//!
//! - Error messages never contain the bearer token
//! - Use [`ApiError::is_transient`] to test retry eligibility

use thiserror::Error;

mod pagination;

pub use pagination::*;
pub(crate) use pagination::{normalize_page, NormalizedPage};

/// Unified error type for all Bitbucket API operations.
///
/// `ApiError` carries the failure classification, an optional HTTP status
/// code (absent for network-level failures), and a human-readable message.
/// Errors are constructed once at the point a request fails and propagated
/// verbatim to the caller; the request client recovers locally only from
/// transient variants, via retry with backoff up to the configured budget.
///
/// # Example
///
/// ```rust
/// use bitbucket_mcp::api::ApiError;
///
/// let err = ApiError::NotFound("Repository does not exist".to_string());
/// assert_eq!(err.status(), Some(404));
/// assert!(!err.is_transient());
/// ```
///
/// # Notes
///
/// - `status()` returns `None` for `Transport` and `InvalidRequest`
/// - Callers map `NotFound` into domain-specific "resource not found"
///   responses without re-inspecting raw HTTP details
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested resource was not found (HTTP 404).
    ///
    /// The repository, workspace, pull request, or other resource does
    /// not exist or is not visible to the authenticated user.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Authorization failed (HTTP 401 or 403).
    ///
    /// The bearer token is missing required scopes, expired, or the
    /// authenticated user lacks permission for the resource.
    #[error("Authorization failed (HTTP {status}): {message}")]
    Unauthorized {
        /// The HTTP status code (401 or 403).
        status: u16,
        /// Detail extracted from the error response body.
        message: String,
    },

    /// The request conflicts with the current resource state (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request failed with a non-2xx status not covered above.
    ///
    /// 5xx responses in this variant are transient and eligible for
    /// retry; remaining 4xx responses are not.
    #[error("Request failed (HTTP {status}): {message}")]
    RequestFailed {
        /// The HTTP status code of the failed response.
        status: u16,
        /// Detail extracted from the error response body.
        message: String,
    },

    /// The request was rejected locally before any HTTP call was made.
    ///
    /// Raised for protocol-correctness violations owned by this layer,
    /// such as an explicit page size outside the allowed 1-100 range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No HTTP response was obtained.
    ///
    /// Covers timeouts, DNS failures, connection resets, and response
    /// bodies that could not be read or decoded. Always transient.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Classifies a non-success HTTP response into an [`ApiError`].
    ///
    /// The human-readable message is extracted from the response body
    /// using both dialects' error document shapes (see
    /// [`extract_api_message`]).
    ///
    /// # Parameters
    ///
    /// * `status` - The HTTP status code of the response
    /// * `body` - The raw error response body
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message =
            extract_api_message(body).unwrap_or_else(|| truncate_body(body).to_string());
        let code = status.as_u16();

        match code {
            404 => Self::NotFound(message),
            401 | 403 => Self::Unauthorized {
                status: code,
                message,
            },
            409 => Self::Conflict(message),
            _ => Self::RequestFailed {
                status: code,
                message,
            },
        }
    }

    /// Wraps a network-level failure with no HTTP response.
    ///
    /// The source error's URL is stripped so query strings never leak
    /// into logs or caller-visible messages.
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url().to_string())
    }

    /// Returns the HTTP status code attached to this error, if any.
    ///
    /// `Transport` and `InvalidRequest` carry no status code.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Unauthorized { status, .. } => Some(*status),
            Self::Conflict(_) => Some(409),
            Self::RequestFailed { status, .. } => Some(*status),
            Self::InvalidRequest(_) | Self::Transport(_) => None,
        }
    }

    /// Returns `true` if this failure is eligible for retry.
    ///
    /// Transient failures are transport-level errors and HTTP 5xx
    /// responses. 4xx responses indicate a request that will not succeed
    /// on replay and are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::RequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Extracts a user-friendly message from a Bitbucket error response body.
///
/// Bitbucket Cloud returns errors in the format:
/// ```json
/// {"type": "error", "error": {"message": "Human readable message"}}
/// ```
///
/// Bitbucket Server returns errors in the format:
/// ```json
/// {"errors": [{"message": "Human readable message"}]}
/// ```
///
/// This function attempts the Cloud shape, the Server shape, and two
/// simpler fallbacks (`{"error": {"detail": …}}`, `{"message": …}`) in
/// order. Returns `None` if the body is not JSON or matches none of them.
fn extract_api_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;

    // Cloud format: {"type": "error", "error": {"message": "..."}}
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    // Server format: {"errors": [{"message": "..."}]}
    if let Some(message) = json
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|arr| arr.first())
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    // Alternative Cloud format: {"error": {"detail": "..."}}
    if let Some(detail) = json
        .get("error")
        .and_then(|e| e.get("detail"))
        .and_then(|m| m.as_str())
    {
        return Some(detail.to_string());
    }

    // Simple message format: {"message": "..."}
    json.get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

/// Caps the raw-body fallback so huge HTML error pages stay readable.
fn truncate_body(body: &str) -> &str {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_not_found() {
        let err = ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "{}");
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_classifies_authorization_failures() {
        for code in [401u16, 403] {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            let err = ApiError::from_status(status, "{}");
            assert!(matches!(err, ApiError::Unauthorized { .. }));
            assert_eq!(err.status(), Some(code));
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn test_classifies_conflict() {
        let err = ApiError::from_status(reqwest::StatusCode::CONFLICT, "{}");
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = ApiError::from_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "{}");
        assert_eq!(err.status(), Some(503));
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_client_errors_are_not_transient() {
        let err = ApiError::from_status(reqwest::StatusCode::BAD_REQUEST, "{}");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transport_errors_carry_no_status() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert!(err.is_transient());
    }

    #[test]
    fn test_extracts_cloud_error_message() {
        let body = r#"{"type": "error", "error": {"message": "Repository not found"}}"#;
        assert_eq!(
            extract_api_message(body).as_deref(),
            Some("Repository not found")
        );
    }

    #[test]
    fn test_extracts_server_error_message() {
        let body = r#"{"errors": [{"message": "Project key is invalid"}]}"#;
        assert_eq!(
            extract_api_message(body).as_deref(),
            Some("Project key is invalid")
        );
    }

    #[test]
    fn test_extracts_simple_message() {
        assert_eq!(
            extract_api_message(r#"{"message": "oops"}"#).as_deref(),
            Some("oops")
        );
    }

    #[test]
    fn test_non_json_body_falls_back_to_raw() {
        assert_eq!(extract_api_message("<html>502</html>"), None);
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "<html>502</html>");
        assert!(err.to_string().contains("<html>502</html>"));
    }
}
