//
//  bitbucket-mcp
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bitbucket_mcp::api::BitbucketClient;
use bitbucket_mcp::config::Args;
use bitbucket_mcp::server::McpServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    // Parse and validate configuration
    let args = Args::parse();
    let config = args.into_client_config()?;

    // Detect the dialect and start serving
    let client = BitbucketClient::new(config)?;
    tracing::info!(
        dialect = ?client.dialect(),
        "Configured Bitbucket client"
    );

    McpServer::new(client).run().await
}

/// Initialize logging based on environment.
///
/// Stdout carries the MCP protocol, so all log output goes to stderr.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("BITBUCKET_MCP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
