use async_trait::async_trait;

use crate::error::Result;
use crate::types::FetchOutcome;

/// Anything that can answer the open-issues query for an "owner/repo" path.
#[async_trait]
pub trait IssueSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Fetch one page of open issues. `cursor` is the end cursor of the
    /// previous page, or `None` for the first page.
    ///
    /// API-level errors come back as `Ok(FetchOutcome::Errors(..))`;
    /// `Err` is reserved for transport failures.
    async fn fetch_issue_page(&self, path: &str, cursor: Option<&str>) -> Result<FetchOutcome>;
}
