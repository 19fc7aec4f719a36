//
//  bitbucket-mcp
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the request client for interacting with Bitbucket's
//! REST APIs across both dialects.
//!
//! ## Supported Platforms
//!
//! - **Bitbucket Cloud**: API v2.0 at `api.bitbucket.org`
//! - **Bitbucket Server/Data Center**: API v1.0 at your custom host
//!
//! ## Architecture
//!
//! - [`dialect`]: decides which dialect a base URL speaks (once, at startup)
//! - [`paths`]: translates logical resources into dialect-specific paths
//! - [`client`]: HTTP transport with auth, retry/backoff, and pagination
//! - [`common`]: the error taxonomy and pagination normalization types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bitbucket_mcp::api::{BitbucketClient, ClientConfig};
//!
//! let client = BitbucketClient::new(ClientConfig {
//!     base_url: "https://api.bitbucket.org/2.0".to_string(),
//!     token: "your-token".to_string(),
//!     timeout: Duration::from_secs(30),
//!     max_retries: 3,
//!     retry_delay: Duration::from_millis(500),
//! })?;
//! assert!(client.is_cloud());
//! # Ok::<(), bitbucket_mcp::api::ApiError>(())
//! ```

/// Core HTTP client with retry, backoff, and pagination normalization.
pub mod client;

/// Common types: the error taxonomy and pagination contracts.
pub mod common;

/// Dialect detection for the two Bitbucket API variants.
pub mod dialect;

/// Dialect-specific request path construction.
pub mod paths;

pub use client::{backoff_delay, BitbucketClient, ClientConfig};
pub use common::{
    ApiError, CloudPage, PageRequest, PageResult, ServerPage, DEFAULT_PAGELEN,
    MAX_FETCH_ALL_ITEMS, MAX_PAGELEN, MIN_PAGELEN,
};
pub use dialect::Dialect;
pub use paths::PathBuilder;
