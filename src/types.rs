use serde::{Deserialize, Serialize};
use std::fmt;

/// Variables sent alongside the issues query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryVariables {
    pub organization: String,
    pub repository: String,
    pub cursor: Option<String>,
}

impl QueryVariables {
    /// Split an "owner/repo" path on its first `/`.
    /// A path without a separator yields an empty repository name.
    pub fn from_path(path: &str, cursor: Option<&str>) -> Self {
        let path = path.trim();
        let (organization, repository) = path.split_once('/').unwrap_or((path, ""));

        Self {
            organization: organization.to_string(),
            repository: repository.to_string(),
            cursor: cursor.map(str::to_string),
        }
    }
}

/// Organization as returned by the issues query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub name: Option<String>,
    pub url: String,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub url: String,
    pub issues: Option<IssueConnection>,
}

/// One page (or an accumulation of pages) of open issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueConnection {
    pub edges: Vec<IssueEdge>,
    pub total_count: u64,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEdge {
    pub id: String,
    pub title: String,
    pub url: String,
    pub reactions: ReactionSummary,
}

/// The reactions fetched for an issue, newest last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionSummary {
    pub contents: Vec<ReactionContent>,
}

impl ReactionSummary {
    pub fn count(&self) -> usize {
        self.contents.len()
    }
}

impl fmt::Display for ReactionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reactions", self.count())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionContent {
    ThumbsUp,
    ThumbsDown,
    Laugh,
    Hooray,
    Confused,
    Heart,
    Rocket,
    Eyes,
    #[serde(other)]
    Other,
}

impl fmt::Display for ReactionContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionContent::ThumbsUp => write!(f, "👍"),
            ReactionContent::ThumbsDown => write!(f, "👎"),
            ReactionContent::Laugh => write!(f, "😄"),
            ReactionContent::Hooray => write!(f, "🎉"),
            ReactionContent::Confused => write!(f, "😕"),
            ReactionContent::Heart => write!(f, "❤"),
            ReactionContent::Rocket => write!(f, "🚀"),
            ReactionContent::Eyes => write!(f, "👀"),
            ReactionContent::Other => write!(f, "?"),
        }
    }
}

/// Result of a single issues query that reached the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Page(Organization),
    Errors(Vec<String>),
}
