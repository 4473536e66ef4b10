use crate::merge::merge;
use crate::types::{FetchOutcome, IssueConnection, Organization};

/// The one result tree the application holds.
///
/// Errors take precedence in display, but a failed fetch never discards the
/// organization that was accumulated before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedState {
    pub organization: Option<Organization>,
    pub errors: Vec<String>,
}

impl AccumulatedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a completed fetch into the state.
    pub fn apply(self, outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Page(incoming) => Self {
                organization: Some(merge(self.organization.as_ref(), incoming)),
                errors: Vec::new(),
            },
            FetchOutcome::Errors(errors) => Self {
                organization: self.organization,
                errors,
            },
        }
    }

    /// Like `apply`, but a page replaces the accumulated issues instead of
    /// extending them. Used for an explicit search, which is always a first page.
    pub fn restart(self, outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Page(incoming) => Self {
                organization: Some(incoming),
                errors: Vec::new(),
            },
            errors => self.apply(errors),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn issues(&self) -> Option<&IssueConnection> {
        self.organization
            .as_ref()
            .and_then(|o| o.repository.as_ref())
            .and_then(|r| r.issues.as_ref())
    }

    /// Cursor for the next "fetch more", if the server reported another page.
    pub fn next_cursor(&self) -> Option<&str> {
        let issues = self.issues()?;
        if !issues.page_info.has_next_page {
            return None;
        }
        issues.page_info.end_cursor.as_deref()
    }
}
