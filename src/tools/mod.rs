//
//  bitbucket-mcp
//  tools/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # MCP Tool Surface
//!
//! This module declares the tools exposed to MCP clients and dispatches
//! `tools/call` invocations onto the request client. Each tool maps one
//! logical Bitbucket operation: the path builder supplies the
//! dialect-specific path, the client performs the fetch, and the raw
//! upstream document is passed through to the caller as formatted JSON.
//!
//! ## Tools
//!
//! | Tool | Operation |
//! |------|-----------|
//! | `bb_get_workspace` | Workspace (Cloud) or project (Server/DC) lookup |
//! | `bb_get_repository` | Single repository lookup |
//! | `bb_list_repositories` | Repositories of a workspace/project |
//! | `bb_list_branches` | Branches, with optional name filter |
//! | `bb_list_tags` | Tags |
//! | `bb_list_pull_requests` | Pull requests |
//! | `bb_get_pull_request` | Single pull request |
//! | `bb_list_pull_request_comments` | PR comments (activities on Server/DC) |
//! | `bb_get_pull_request_diff` | PR diff as plain text |
//! | `bb_list_pull_request_tasks` | PR tasks (blocker comments on Server/DC) |
//!
//! List tools accept `pagelen` (1-100), `page` (1-based), and `all`
//! (accumulate up to the fetch-all cap).

use serde_json::{json, Value};

use crate::api::{ApiError, BitbucketClient, PageRequest, PageResult};

/// JSON tool definitions advertised through `tools/list`.
pub fn tool_definitions() -> Value {
    let page_props = json!({
        "pagelen": { "type": "integer", "description": "Items per page (1-100). Default: 25" },
        "page": { "type": "integer", "description": "Page number, 1-based. Ignored when all=true" },
        "all": { "type": "boolean", "description": "Fetch all pages (capped at 1000 items). Default: false" }
    });

    json!([
        {
            "name": "bb_get_workspace",
            "description": "Get a Bitbucket workspace (Cloud) or project (Server/Data Center) by its slug or key.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" }
                },
                "required": ["workspace"]
            }
        },
        {
            "name": "bb_get_repository",
            "description": "Get a single repository by workspace/project and slug.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" }
                },
                "required": ["workspace", "repository"]
            }
        },
        {
            "name": "bb_list_repositories",
            "description": "List the repositories of a workspace (Cloud) or project (Server/Data Center).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "pagelen": page_props["pagelen"],
                    "page": page_props["page"],
                    "all": page_props["all"]
                },
                "required": ["workspace"]
            }
        },
        {
            "name": "bb_list_branches",
            "description": "List the branches of a repository, optionally filtered by name.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "filter": { "type": "string", "description": "Substring to match against branch names" },
                    "pagelen": page_props["pagelen"],
                    "page": page_props["page"],
                    "all": page_props["all"]
                },
                "required": ["workspace", "repository"]
            }
        },
        {
            "name": "bb_list_tags",
            "description": "List the tags of a repository.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "pagelen": page_props["pagelen"],
                    "page": page_props["page"],
                    "all": page_props["all"]
                },
                "required": ["workspace", "repository"]
            }
        },
        {
            "name": "bb_list_pull_requests",
            "description": "List the pull requests of a repository.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "pagelen": page_props["pagelen"],
                    "page": page_props["page"],
                    "all": page_props["all"]
                },
                "required": ["workspace", "repository"]
            }
        },
        {
            "name": "bb_get_pull_request",
            "description": "Get a single pull request by its numeric id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "id": { "type": "integer", "description": "Pull request id" }
                },
                "required": ["workspace", "repository", "id"]
            }
        },
        {
            "name": "bb_list_pull_request_comments",
            "description": "List the comments of a pull request (the activities feed on Server/Data Center).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "id": { "type": "integer", "description": "Pull request id" },
                    "pagelen": page_props["pagelen"],
                    "page": page_props["page"],
                    "all": page_props["all"]
                },
                "required": ["workspace", "repository", "id"]
            }
        },
        {
            "name": "bb_get_pull_request_diff",
            "description": "Get the diff of a pull request as plain text.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "id": { "type": "integer", "description": "Pull request id" }
                },
                "required": ["workspace", "repository", "id"]
            }
        },
        {
            "name": "bb_list_pull_request_tasks",
            "description": "List the tasks of a pull request (blocker comments on Server/Data Center).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace": { "type": "string", "description": "Workspace slug (Cloud) or project key (Server/DC)" },
                    "repository": { "type": "string", "description": "Repository slug" },
                    "id": { "type": "integer", "description": "Pull request id" },
                    "pagelen": page_props["pagelen"],
                    "page": page_props["page"],
                    "all": page_props["all"]
                },
                "required": ["workspace", "repository", "id"]
            }
        }
    ])
}

/// Executes a tool call, returning the response text and an error flag.
///
/// `ApiError::NotFound` is translated into a domain-specific "not found"
/// message here; every other failure surfaces its classified message.
pub async fn handle_tool_call(
    client: &BitbucketClient,
    name: &str,
    args: &Value,
) -> (String, bool) {
    match run_tool(client, name, args).await {
        Ok(text) => (text, false),
        Err(ApiError::NotFound(detail)) => (
            format!("The requested Bitbucket resource was not found: {detail}"),
            true,
        ),
        Err(e) => (format!("Bitbucket request failed: {e}"), true),
    }
}

async fn run_tool(client: &BitbucketClient, name: &str, args: &Value) -> Result<String, ApiError> {
    let paths = client.paths();

    match name {
        "bb_get_workspace" => {
            let workspace = required_str(args, "workspace")?;
            let value = client.fetch_one(&paths.workspace(workspace), &[]).await?;
            Ok(pretty(&value))
        }
        "bb_get_repository" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let value = client
                .fetch_one(&paths.repository(workspace, repo), &[])
                .await?;
            Ok(pretty(&value))
        }
        "bb_list_repositories" => {
            let workspace = required_str(args, "workspace")?;
            let result = client
                .fetch_page(&paths.repositories(workspace), &page_request(args)?, &[])
                .await?;
            Ok(render_page(&result))
        }
        "bb_list_branches" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let mut query = Vec::new();
            if let Some(filter) = args.get("filter").and_then(|f| f.as_str()) {
                query.push(paths.branch_filter(filter));
            }
            let result = client
                .fetch_page(&paths.branches(workspace, repo), &page_request(args)?, &query)
                .await?;
            Ok(render_page(&result))
        }
        "bb_list_tags" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let result = client
                .fetch_page(&paths.tags(workspace, repo), &page_request(args)?, &[])
                .await?;
            Ok(render_page(&result))
        }
        "bb_list_pull_requests" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let result = client
                .fetch_page(
                    &paths.pull_requests(workspace, repo),
                    &page_request(args)?,
                    &[],
                )
                .await?;
            Ok(render_page(&result))
        }
        "bb_get_pull_request" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let id = required_id(args)?;
            let value = client
                .fetch_one(&paths.pull_request(workspace, repo, id), &[])
                .await?;
            Ok(pretty(&value))
        }
        "bb_list_pull_request_comments" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let id = required_id(args)?;
            let result = client
                .fetch_page(
                    &paths.pull_request_comments(workspace, repo, id),
                    &page_request(args)?,
                    &[],
                )
                .await?;
            Ok(render_page(&result))
        }
        "bb_get_pull_request_diff" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let id = required_id(args)?;
            client
                .fetch_raw(&paths.pull_request_diff(workspace, repo, id), &[])
                .await
        }
        "bb_list_pull_request_tasks" => {
            let workspace = required_str(args, "workspace")?;
            let repo = required_str(args, "repository")?;
            let id = required_id(args)?;
            let result = client
                .fetch_page(
                    &paths.pull_request_tasks(workspace, repo, id),
                    &page_request(args)?,
                    &[],
                )
                .await?;
            Ok(render_page(&result))
        }
        _ => Err(ApiError::InvalidRequest(format!("Unknown tool: {name}"))),
    }
}

/// Reads a required string argument.
fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ApiError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("Missing required argument: {key}")))
}

/// Reads the required numeric `id` argument.
fn required_id(args: &Value) -> Result<u64, ApiError> {
    args.get("id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ApiError::InvalidRequest("Missing required argument: id".to_string()))
}

/// Extracts the pagination arguments shared by all list tools.
fn page_request(args: &Value) -> Result<PageRequest, ApiError> {
    Ok(PageRequest {
        pagelen: page_arg(args, "pagelen")?,
        page: page_arg(args, "page")?,
        all: args.get("all").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}

/// Reads an optional numeric pagination argument.
///
/// Values that are not non-negative integers, or that exceed `u32`, are
/// rejected here rather than silently wrapped into the accepted range.
fn page_arg(args: &Value, key: &str) -> Result<Option<u32>, ApiError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "Argument {key} must be a non-negative integer no larger than {}",
                    u32::MAX
                ))
            }),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Renders a normalized page as a JSON document with count and
/// continuation metadata.
fn render_page(result: &PageResult) -> String {
    pretty(&json!({
        "count": result.items.len(),
        "has_more": result.has_more,
        "items": result.items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BitbucketClient, ClientConfig};
    use serde_json::json;
    use std::time::Duration;

    fn offline_client() -> BitbucketClient {
        BitbucketClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            token: "tok".to_string(),
            timeout: Duration::from_secs(1),
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
        })
        .unwrap()
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();

        assert_eq!(names.len(), 10);
        assert!(names.contains(&"bb_get_workspace"));
        assert!(names.contains(&"bb_list_branches"));
        assert!(names.contains(&"bb_get_pull_request_diff"));

        for tool in defs.as_array().unwrap() {
            assert!(tool["description"].as_str().is_some());
            assert_eq!(tool["inputSchema"]["type"], "object");
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let client = offline_client();
        let (text, is_error) = handle_tool_call(&client, "bb_launch_rockets", &json!({})).await;
        assert!(is_error);
        assert!(text.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_an_error_without_io() {
        // Port 9 is unreachable; argument validation must fail first.
        let client = offline_client();
        let (text, is_error) = handle_tool_call(&client, "bb_get_repository", &json!({})).await;
        assert!(is_error);
        assert!(text.contains("workspace"));
    }

    #[tokio::test]
    async fn test_get_repository_round_trip() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/ACME/repos/website")
            .with_status(200)
            .with_body(r#"{"slug": "website", "name": "Website"}"#)
            .create_async()
            .await;

        let client = BitbucketClient::new(ClientConfig {
            base_url: server.url(),
            token: "tok".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
        })
        .unwrap();

        let args = json!({"workspace": "ACME", "repository": "website"});
        let (text, is_error) = handle_tool_call(&client, "bb_get_repository", &args).await;

        assert!(!is_error);
        assert!(text.contains("\"slug\": \"website\""));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_domain_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/NOPE")
            .with_status(404)
            .with_body(r#"{"errors": [{"message": "Project NOPE does not exist"}]}"#)
            .create_async()
            .await;

        let client = BitbucketClient::new(ClientConfig {
            base_url: server.url(),
            token: "tok".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
        })
        .unwrap();

        let args = json!({"workspace": "NOPE"});
        let (text, is_error) = handle_tool_call(&client, "bb_get_workspace", &args).await;

        assert!(is_error);
        assert!(text.contains("was not found"));
        assert!(text.contains("Project NOPE does not exist"));
    }

    #[test]
    fn test_page_request_extraction() {
        let req = page_request(&json!({"pagelen": 50, "page": 2})).unwrap();
        assert_eq!(req.pagelen, Some(50));
        assert_eq!(req.page, Some(2));
        assert!(!req.all);

        let req = page_request(&json!({"all": true})).unwrap();
        assert!(req.all);
        assert_eq!(req.pagelen, None);
    }

    #[test]
    fn test_page_request_rejects_oversized_integers() {
        // 2^32 + 50 must not wrap into the accepted 1-100 range.
        let err = page_request(&json!({"pagelen": 4_294_967_346u64})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        let err = page_request(&json!({"page": u64::MAX})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        // Negative and non-integer values are rejected too.
        let err = page_request(&json!({"pagelen": -1})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_oversized_pagelen_argument_fails_without_io() {
        // Port 9 is unreachable; the wrapped value must be caught first.
        let client = offline_client();
        let args = json!({"workspace": "ACME", "pagelen": 4_294_967_346u64});
        let (text, is_error) = handle_tool_call(&client, "bb_list_repositories", &args).await;

        assert!(is_error);
        assert!(text.contains("pagelen"));
    }
}
