//
//  bitbucket-mcp
//  server/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # MCP Stdio Transport
//!
//! Line-delimited JSON-RPC 2.0 over standard input/output, the framing MCP
//! clients speak. Each request line produces at most one response line;
//! notifications produce none. Logging goes to stderr, since stdout is the
//! protocol channel.
//!
//! ## Methods
//!
//! | Method | Behavior |
//! |--------|----------|
//! | `initialize` | Protocol handshake with server info |
//! | `tools/list` | Advertises the tool definitions |
//! | `tools/call` | Dispatches to [`crate::tools::handle_tool_call`] |
//! | `ping` | Empty result |
//! | `notifications/*` | Ignored |
//! | anything else | `-32601 Method not found` |
//!
//! Message dispatch is factored out of the I/O loop so protocol behavior
//! is testable without a live stdin.

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::api::BitbucketClient;
use crate::tools;

/// MCP protocol revision this server implements.
const PROTOCOL_VERSION: &str = "2025-06-18";

/// The MCP server: one request client, one stdio session.
pub struct McpServer {
    client: BitbucketClient,
}

impl McpServer {
    /// Creates a server around a configured request client.
    pub fn new(client: BitbucketClient) -> Self {
        Self { client }
    }

    /// Runs the stdio loop until stdin closes.
    ///
    /// Tool calls run inline: the calling protocol issues one logical
    /// operation at a time per invocation, so there is no internal work
    /// queue and no response reordering.
    pub async fn run(self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!(
            dialect = ?self.client.dialect(),
            "MCP server ready"
        );

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            stdout.write_all(response.to_string().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        Ok(())
    }

    /// Parses one input line and dispatches it.
    async fn handle_line(&self, line: &str) -> Option<Value> {
        let message: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(_) => {
                return Some(json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": { "code": -32700, "message": "Parse error" }
                }));
            }
        };

        self.handle_message(message).await
    }

    /// Dispatches one JSON-RPC message. Returns `None` for notifications.
    pub(crate) async fn handle_message(&self, message: Value) -> Option<Value> {
        let method = message["method"].as_str().unwrap_or("");
        let id = message.get("id").cloned();

        if method.starts_with("notifications/") {
            return None;
        }

        let response = match method {
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": crate::APP_NAME,
                        "version": crate::VERSION
                    },
                    "instructions": "Bitbucket MCP server. Works against both \
                        Bitbucket Cloud and Server/Data Center; the dialect is \
                        detected from the configured base URL. Use the bb_* tools \
                        to look up workspaces, repositories, branches, tags, and \
                        pull requests."
                }
            }),
            "tools/list" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "tools": tools::tool_definitions() }
            }),
            "tools/call" => {
                let name = message["params"]["name"].as_str().unwrap_or("");
                let arguments = message["params"]
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| json!({}));

                tracing::debug!(tool = name, "Dispatching tool call");
                let (text, is_error) =
                    tools::handle_tool_call(&self.client, name, &arguments).await;

                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "content": [{ "type": "text", "text": text }],
                        "isError": is_error
                    }
                })
            }
            "ping" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {}
            }),
            _ => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "Method not found" }
            }),
        };

        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientConfig;
    use std::time::Duration;

    fn test_server() -> McpServer {
        let client = BitbucketClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            token: "tok".to_string(),
            timeout: Duration::from_secs(1),
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
        })
        .unwrap();
        McpServer::new(client)
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let server = test_server();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .await
            .unwrap();

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], crate::APP_NAME);
    }

    #[tokio::test]
    async fn test_tools_list_advertises_definitions() {
        let server = test_server();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await
            .unwrap();

        let tools = response["result"]["tools"].as_array().unwrap();
        assert!(tools.iter().any(|t| t["name"] == "bb_list_branches"));
    }

    #[tokio::test]
    async fn test_ping_returns_empty_result() {
        let server = test_server();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}))
            .await
            .unwrap();

        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_notifications_are_ignored() {
        let server = test_server();
        let response = server
            .handle_message(json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let server = test_server();
        let response = server
            .handle_message(json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"}))
            .await
            .unwrap();

        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_malformed_line_is_a_parse_error() {
        let server = test_server();
        let response = server.handle_line("{not json").await.unwrap();

        assert_eq!(response["error"]["code"], -32700);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_tool_call_failure_is_a_result_not_an_error() {
        // Tool failures travel as isError results per MCP, not JSON-RPC errors.
        let server = test_server();
        let response = server
            .handle_message(json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": "bb_no_such_tool", "arguments": {} }
            }))
            .await
            .unwrap();

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
    }
}
