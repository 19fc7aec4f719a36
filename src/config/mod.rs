//
//  bitbucket-mcp
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Server Configuration
//!
//! This module owns process configuration: the clap argument surface with
//! environment-variable fallbacks, and validation into the immutable
//! [`ClientConfig`] the request client consumes. The client trusts the
//! output of this module and performs no re-validation.
//!
//! ## Inputs
//!
//! | Flag | Environment variable | Default |
//! |------|---------------------|---------|
//! | `--base-url` | `BITBUCKET_BASE_URL` | required |
//! | `--token` | `BITBUCKET_TOKEN` | required |
//! | `--timeout-secs` | `BITBUCKET_TIMEOUT_SECS` | 30 |
//! | `--max-retries` | `BITBUCKET_MAX_RETRIES` | 3 |
//! | `--retry-delay-ms` | `BITBUCKET_RETRY_DELAY_MS` | 500 |
//!
//! ## Validation
//!
//! - The base URL must parse and use an `http` or `https` scheme; trailing
//!   slashes are stripped so path concatenation stays predictable
//! - The token must be non-empty (its value is never echoed back)
//! - Timeout and retry delay must be positive
//!
//! ## Example
//!
//! ```rust
//! use bitbucket_mcp::config::Args;
//!
//! let args = Args {
//!     base_url: "https://bitbucket.mycompany.com/rest/api/1.0/".to_string(),
//!     token: "personal-access-token".to_string(),
//!     timeout_secs: 30,
//!     max_retries: 3,
//!     retry_delay_ms: 500,
//! };
//!
//! let config = args.into_client_config().unwrap();
//! assert_eq!(config.base_url, "https://bitbucket.mycompany.com/rest/api/1.0");
//! ```

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use url::Url;

use crate::api::ClientConfig;

/// Command-line arguments for the MCP server.
///
/// Every flag falls back to an environment variable so the server can be
/// configured entirely from an MCP client's `env` block.
#[derive(Debug, Parser)]
#[command(
    name = "bb-mcp",
    version,
    about = "MCP server for Bitbucket Cloud and Server/Data Center"
)]
pub struct Args {
    /// Base URL of the Bitbucket REST API, e.g.
    /// `https://api.bitbucket.org/2.0` or
    /// `https://bitbucket.mycompany.com/rest/api/1.0`.
    #[arg(long, env = "BITBUCKET_BASE_URL")]
    pub base_url: String,

    /// Bearer token (Cloud access token or Server/DC personal access
    /// token). Never logged.
    #[arg(long, env = "BITBUCKET_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Timeout per HTTP attempt, in seconds.
    #[arg(long, env = "BITBUCKET_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Total attempt budget for transient failures.
    #[arg(long, env = "BITBUCKET_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff, in milliseconds.
    #[arg(long, env = "BITBUCKET_RETRY_DELAY_MS", default_value_t = 500)]
    pub retry_delay_ms: u64,
}

impl Args {
    /// Validates the arguments into an immutable [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Fails on an unparseable base URL, a non-http(s) scheme, an empty
    /// token, or a non-positive timeout or retry delay. Error messages
    /// never contain the token value.
    pub fn into_client_config(self) -> Result<ClientConfig> {
        let base_url = normalize_base_url(&self.base_url)?;

        if self.token.trim().is_empty() {
            bail!("A Bitbucket token is required (set BITBUCKET_TOKEN or --token)");
        }
        if self.timeout_secs == 0 {
            bail!("Request timeout must be positive");
        }
        if self.retry_delay_ms == 0 {
            bail!("Retry delay must be positive");
        }

        Ok(ClientConfig {
            base_url,
            token: self.token,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        })
    }
}

/// Normalizes a base URL: validates the scheme and strips trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .with_context(|| format!("Invalid base URL: {trimmed}"))?;

    match url.scheme() {
        "http" | "https" => {}
        other => bail!("Unsupported URL scheme '{other}' (expected http or https)"),
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
