use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IssuedeckError, Result};
use crate::source::IssueSource;
use crate::types::{
    FetchOutcome, IssueConnection, IssueEdge, Organization, PageInfo, QueryVariables,
    ReactionContent, ReactionSummary, Repository,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

pub const ISSUES_OF_REPOSITORY: &str = r#"
  query ($organization: String!, $repository: String!, $cursor: String) {
    organization(login: $organization) {
      name
      url
      repository(name: $repository) {
        name
        url
        issues(first: 5, after: $cursor, states: [OPEN]) {
          edges {
            node {
              id
              title
              url
              reactions(last: 50) {
                edges {
                  node {
                    content
                  }
                }
              }
            }
          }
          totalCount
          pageInfo {
            endCursor
            hasNextPage
          }
        }
      }
    }
  }
"#;

const ORGANIZATION_NOT_FOUND: &str = "Organization not found";

pub struct GitHub {
    client: Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GitHub {
    pub fn new(endpoint: String, token: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent("issuedeck")
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

#[derive(Debug, Serialize)]
struct IssuesRequest {
    query: &'static str,
    variables: QueryVariables,
}

fn request_body(path: &str, cursor: Option<&str>) -> IssuesRequest {
    IssuesRequest {
        query: ISSUES_OF_REPOSITORY,
        variables: QueryVariables::from_path(path, cursor),
    }
}

// GitHub GraphQL response types

#[derive(Deserialize)]
struct GhResponse {
    data: Option<GhData>,
    errors: Option<Vec<GhError>>,
}

#[derive(Deserialize)]
struct GhError {
    message: String,
}

#[derive(Deserialize)]
struct GhData {
    organization: Option<GhOrganization>,
}

#[derive(Deserialize)]
struct GhOrganization {
    name: Option<String>,
    url: String,
    repository: Option<GhRepository>,
}

#[derive(Deserialize)]
struct GhRepository {
    name: String,
    url: String,
    issues: Option<GhIssues>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhIssues {
    edges: Option<Vec<GhIssueEdge>>,
    total_count: u64,
    page_info: GhPageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Deserialize)]
struct GhIssueEdge {
    node: Option<GhIssue>,
}

#[derive(Deserialize)]
struct GhIssue {
    id: String,
    title: String,
    url: String,
    reactions: Option<GhReactions>,
}

#[derive(Deserialize)]
struct GhReactions {
    edges: Option<Vec<GhReactionEdge>>,
}

#[derive(Deserialize)]
struct GhReactionEdge {
    node: Option<GhReaction>,
}

#[derive(Deserialize)]
struct GhReaction {
    content: ReactionContent,
}

impl From<GhOrganization> for Organization {
    fn from(org: GhOrganization) -> Self {
        Organization {
            name: org.name,
            url: org.url,
            repository: org.repository.map(Repository::from),
        }
    }
}

impl From<GhRepository> for Repository {
    fn from(repo: GhRepository) -> Self {
        Repository {
            name: repo.name,
            url: repo.url,
            issues: repo.issues.map(IssueConnection::from),
        }
    }
}

impl From<GhIssues> for IssueConnection {
    fn from(issues: GhIssues) -> Self {
        let edges = issues
            .edges
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edge| edge.node)
            .map(|issue| IssueEdge {
                id: issue.id,
                title: issue.title,
                url: issue.url,
                reactions: ReactionSummary {
                    contents: issue
                        .reactions
                        .and_then(|r| r.edges)
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(|edge| edge.node.map(|n| n.content))
                        .collect(),
                },
            })
            .collect();

        IssueConnection {
            edges,
            total_count: issues.total_count,
            page_info: PageInfo {
                end_cursor: issues.page_info.end_cursor,
                has_next_page: issues.page_info.has_next_page,
            },
        }
    }
}

/// Map a decoded response envelope onto a fetch outcome.
/// A top-level error list wins over any partial data.
fn decode_response(response: GhResponse) -> FetchOutcome {
    if let Some(errors) = response.errors {
        return FetchOutcome::Errors(errors.into_iter().map(|e| e.message).collect());
    }

    match response.data.and_then(|d| d.organization) {
        Some(org) => FetchOutcome::Page(org.into()),
        None => FetchOutcome::Errors(vec![ORGANIZATION_NOT_FOUND.to_string()]),
    }
}

#[async_trait]
impl IssueSource for GitHub {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn fetch_issue_page(&self, path: &str, cursor: Option<&str>) -> Result<FetchOutcome> {
        let body = request_body(path, cursor);
        debug!(
            organization = %body.variables.organization,
            repository = %body.variables.repository,
            cursor = ?body.variables.cursor,
            "Fetching issue page"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(IssuedeckError::Api(format!("GitHub API {}: {}", status, text)));
        }

        let outcome = decode_response(serde_json::from_str(&text)?);
        match &outcome {
            FetchOutcome::Page(org) => {
                let fetched = org
                    .repository
                    .as_ref()
                    .and_then(|r| r.issues.as_ref())
                    .map(|i| i.edges.len())
                    .unwrap_or(0);
                info!(path, fetched, "Issue page fetched");
            }
            FetchOutcome::Errors(errors) => {
                info!(path, errors = errors.len(), "Issue query returned errors");
            }
        }

        Ok(outcome)
    }
}
