//
//  bitbucket-mcp
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Bitbucket MCP Server Library
//!
//! An MCP (Model Context Protocol) server that exposes Bitbucket Cloud and
//! Bitbucket Server/Data Center to tool-calling clients through one uniform
//! set of operations.
//!
//! ## Overview
//!
//! The two Bitbucket editions speak incompatible REST dialects: different
//! paths, different query parameters, and different pagination shapes. This
//! library detects the dialect from the configured base URL once at startup
//! and translates every logical operation (fetch a workspace, list
//! branches, read a pull request diff) into the dialect-specific request,
//! with retry/backoff for transient failures and a normalized pagination
//! contract.
//!
//! ## Module Structure
//!
//! - [`api`]: dialect detection, path building, and the HTTP request client
//! - [`config`]: CLI/environment configuration and validation
//! - [`tools`]: MCP tool definitions and dispatch
//! - [`server`]: the JSON-RPC 2.0 stdio transport
//!
//! ## Platform Differences
//!
//! | Concern | Cloud | Server/DC |
//! |---------|-------|-----------|
//! | API version | v2.0 | v1.0 |
//! | Container | Workspace | Project |
//! | Pagination | `page`/`pagelen` + `next` link | `start`/`limit` + `isLastPage` |
//! | Branch filter | `q=name ~ "…"` | `filterText=…` |

/// API client layer: dialect detection, paths, transport, errors.
pub mod api;

/// Process configuration: clap arguments, env fallbacks, validation.
pub mod config;

/// MCP stdio transport (JSON-RPC 2.0 over stdin/stdout).
pub mod server;

/// MCP tool definitions and dispatch onto the API client.
pub mod tools;

/// Application name constant, used in the User-Agent header and the MCP
/// server info.
pub const APP_NAME: &str = "bb-mcp";

/// Application version, derived from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
