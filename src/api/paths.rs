//
//  bitbucket-mcp
//  api/paths.rs
//
//  Created by Ngonidzashe Mangudya on 2026/02/14.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # Dialect-Specific Request Paths
//!
//! This module translates logical resource identifiers (workspace or
//! project key, repository slug, pull request id) into the relative request
//! paths each Bitbucket dialect expects. Paths never include the base URL;
//! the request client owns that.
//!
//! ## Endpoint Shapes
//!
//! ```text
//! Cloud (v2.0)                                 Server/DC (v1.0)
//! /workspaces/{workspace}                      /projects/{key}
//! /repositories/{workspace}/{slug}             /projects/{key}/repos/{slug}
//! /repositories/{workspace}/{slug}/refs/…      /projects/{key}/repos/{slug}/…
//! /repositories/{workspace}/{slug}/pullrequests  …/pull-requests
//! ```
//!
//! Every method is a pure function of the dialect and the supplied
//! identifiers: the same inputs always produce the same path, with no
//! dependence on request state. Dialect differences are dispatched through
//! explicit `match` arms so the per-resource rules stay auditable in one
//! place.
//!
//! ## Example
//!
//! ```rust
//! use bitbucket_mcp::api::{Dialect, PathBuilder};
//!
//! let cloud = PathBuilder::new(Dialect::Cloud);
//! assert_eq!(cloud.branches("acme", "website"), "/repositories/acme/website/refs/branches");
//!
//! let dc = PathBuilder::new(Dialect::DataCenter);
//! assert_eq!(dc.branches("ACME", "website"), "/projects/ACME/repos/website/branches");
//! ```

use super::Dialect;

/// Builds dialect-specific relative request paths for logical resources.
///
/// Constructed once with a fixed [`Dialect`]; holds no mutable state. The
/// `workspace` parameter is the Cloud workspace slug or the Server/DC
/// project key, whichever the configured instance uses.
///
/// # Example
///
/// ```rust
/// use bitbucket_mcp::api::{Dialect, PathBuilder};
///
/// let paths = PathBuilder::new(Dialect::Cloud);
/// assert!(paths.is_cloud());
/// assert_eq!(paths.repository("acme", "website"), "/repositories/acme/website");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathBuilder {
    dialect: Dialect,
}

impl PathBuilder {
    /// Creates a path builder pinned to one dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Returns `true` when building Cloud (v2.0) paths.
    ///
    /// Callers use this to pick query-parameter syntax that is not a path
    /// difference; see [`branch_filter`](Self::branch_filter).
    pub fn is_cloud(&self) -> bool {
        self.dialect.is_cloud()
    }

    /// Path for a workspace (Cloud) or project (Server/DC) lookup.
    pub fn workspace(&self, workspace: &str) -> String {
        match self.dialect {
            Dialect::Cloud => format!("/workspaces/{workspace}"),
            Dialect::DataCenter => format!("/projects/{workspace}"),
        }
    }

    /// Path for a single repository lookup.
    pub fn repository(&self, workspace: &str, repo: &str) -> String {
        match self.dialect {
            Dialect::Cloud => format!("/repositories/{workspace}/{repo}"),
            Dialect::DataCenter => format!("/projects/{workspace}/repos/{repo}"),
        }
    }

    /// Path for the repository collection of a workspace/project.
    pub fn repositories(&self, workspace: &str) -> String {
        match self.dialect {
            Dialect::Cloud => format!("/repositories/{workspace}"),
            Dialect::DataCenter => format!("/projects/{workspace}/repos"),
        }
    }

    /// Path for a repository's branch collection.
    pub fn branches(&self, workspace: &str, repo: &str) -> String {
        match self.dialect {
            Dialect::Cloud => format!("/repositories/{workspace}/{repo}/refs/branches"),
            Dialect::DataCenter => format!("/projects/{workspace}/repos/{repo}/branches"),
        }
    }

    /// Path for a repository's tag collection.
    pub fn tags(&self, workspace: &str, repo: &str) -> String {
        match self.dialect {
            Dialect::Cloud => format!("/repositories/{workspace}/{repo}/refs/tags"),
            Dialect::DataCenter => format!("/projects/{workspace}/repos/{repo}/tags"),
        }
    }

    /// Path for a repository's pull request collection.
    pub fn pull_requests(&self, workspace: &str, repo: &str) -> String {
        match self.dialect {
            Dialect::Cloud => format!("/repositories/{workspace}/{repo}/pullrequests"),
            Dialect::DataCenter => format!("/projects/{workspace}/repos/{repo}/pull-requests"),
        }
    }

    /// Path for a single pull request.
    pub fn pull_request(&self, workspace: &str, repo: &str, id: u64) -> String {
        format!("{}/{id}", self.pull_requests(workspace, repo))
    }

    /// Path for a pull request's comments.
    ///
    /// Server/DC has no flat comment collection for a pull request; the
    /// activities feed is the closest v1.0 equivalent and includes all
    /// comment events.
    pub fn pull_request_comments(&self, workspace: &str, repo: &str, id: u64) -> String {
        match self.dialect {
            Dialect::Cloud => format!("{}/comments", self.pull_request(workspace, repo, id)),
            Dialect::DataCenter => {
                format!("{}/activities", self.pull_request(workspace, repo, id))
            }
        }
    }

    /// Path for a pull request's diff.
    pub fn pull_request_diff(&self, workspace: &str, repo: &str, id: u64) -> String {
        format!("{}/diff", self.pull_request(workspace, repo, id))
    }

    /// Path for a pull request's tasks.
    ///
    /// Cloud models these as tasks; Server/DC models them as blocker
    /// comments.
    pub fn pull_request_tasks(&self, workspace: &str, repo: &str, id: u64) -> String {
        match self.dialect {
            Dialect::Cloud => format!("{}/tasks", self.pull_request(workspace, repo, id)),
            Dialect::DataCenter => {
                format!("{}/blocker-comments", self.pull_request(workspace, repo, id))
            }
        }
    }

    /// Branch-name filter as a dialect-specific query parameter.
    ///
    /// Cloud uses its structured search syntax (`q=name ~ "text"`); Server
    /// uses a plain substring parameter (`filterText=text`). The filter
    /// text is treated as opaque beyond standard URL query encoding, which
    /// the request client applies when serializing the pair.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bitbucket_mcp::api::{Dialect, PathBuilder};
    ///
    /// let (key, value) = PathBuilder::new(Dialect::Cloud).branch_filter("release");
    /// assert_eq!(key, "q");
    /// assert_eq!(value, "name ~ \"release\"");
    ///
    /// let (key, value) = PathBuilder::new(Dialect::DataCenter).branch_filter("release");
    /// assert_eq!((key.as_str(), value.as_str()), ("filterText", "release"));
    /// ```
    pub fn branch_filter(&self, text: &str) -> (String, String) {
        match self.dialect {
            Dialect::Cloud => ("q".to_string(), format!("name ~ \"{text}\"")),
            Dialect::DataCenter => ("filterText".to_string(), text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> PathBuilder {
        PathBuilder::new(Dialect::Cloud)
    }

    fn dc() -> PathBuilder {
        PathBuilder::new(Dialect::DataCenter)
    }

    #[test]
    fn test_workspace_paths() {
        assert_eq!(cloud().workspace("acme"), "/workspaces/acme");
        assert_eq!(dc().workspace("ACME"), "/projects/ACME");
    }

    #[test]
    fn test_repository_paths() {
        assert_eq!(cloud().repository("acme", "website"), "/repositories/acme/website");
        assert_eq!(dc().repository("ACME", "website"), "/projects/ACME/repos/website");
        assert_eq!(cloud().repositories("acme"), "/repositories/acme");
        assert_eq!(dc().repositories("ACME"), "/projects/ACME/repos");
    }

    #[test]
    fn test_ref_collection_paths() {
        assert_eq!(
            cloud().branches("acme", "website"),
            "/repositories/acme/website/refs/branches"
        );
        assert_eq!(
            dc().branches("ACME", "website"),
            "/projects/ACME/repos/website/branches"
        );
        assert_eq!(
            cloud().tags("acme", "website"),
            "/repositories/acme/website/refs/tags"
        );
        assert_eq!(dc().tags("ACME", "website"), "/projects/ACME/repos/website/tags");
    }

    #[test]
    fn test_pull_request_paths() {
        assert_eq!(
            cloud().pull_request("acme", "website", 7),
            "/repositories/acme/website/pullrequests/7"
        );
        assert_eq!(
            dc().pull_request("ACME", "website", 7),
            "/projects/ACME/repos/website/pull-requests/7"
        );
        assert_eq!(
            cloud().pull_request_comments("acme", "website", 7),
            "/repositories/acme/website/pullrequests/7/comments"
        );
        assert_eq!(
            dc().pull_request_comments("ACME", "website", 7),
            "/projects/ACME/repos/website/pull-requests/7/activities"
        );
        assert_eq!(
            cloud().pull_request_diff("acme", "website", 7),
            "/repositories/acme/website/pullrequests/7/diff"
        );
        assert_eq!(
            cloud().pull_request_tasks("acme", "website", 7),
            "/repositories/acme/website/pullrequests/7/tasks"
        );
        assert_eq!(
            dc().pull_request_tasks("ACME", "website", 7),
            "/projects/ACME/repos/website/pull-requests/7/blocker-comments"
        );
    }

    #[test]
    fn test_paths_are_deterministic() {
        let first = cloud().branches("acme", "website");
        let second = cloud().branches("acme", "website");
        assert_eq!(first, second);
    }

    #[test]
    fn test_branch_filter_syntax() {
        let (key, value) = cloud().branch_filter("feature/login");
        assert_eq!(key, "q");
        assert_eq!(value, "name ~ \"feature/login\"");

        let (key, value) = dc().branch_filter("feature/login");
        assert_eq!(key, "filterText");
        assert_eq!(value, "feature/login");
    }

    #[test]
    fn test_capability_flag() {
        assert!(cloud().is_cloud());
        assert!(!dc().is_cloud());
    }
}
