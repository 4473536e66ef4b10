use crate::types::{IssueEdge, Organization, Repository};

/// True when both results point at the same organization and repository.
/// Identity is the (name, url) pair of each.
pub fn same_target(a: &Organization, b: &Organization) -> bool {
    if a.name != b.name || a.url != b.url {
        return false;
    }

    match (&a.repository, &b.repository) {
        (Some(ra), Some(rb)) => ra.name == rb.name && ra.url == rb.url,
        (None, None) => true,
        _ => false,
    }
}

/// Combine the accumulated result with a freshly fetched page.
///
/// Everything except the issue edges is taken from `incoming`, since the
/// server reports the current total and next-page cursor on every response.
/// Edges are appended behind the previous ones only when the page belongs to
/// the same organization and repository; otherwise `incoming` starts over.
pub fn merge(previous: Option<&Organization>, incoming: Organization) -> Organization {
    let Some(previous) = previous else {
        return incoming;
    };

    if !same_target(previous, &incoming) {
        return incoming;
    }

    let older = previous
        .repository
        .as_ref()
        .and_then(|r| r.issues.as_ref())
        .map(|i| i.edges.as_slice())
        .unwrap_or_default();

    let Organization {
        name,
        url,
        repository,
    } = incoming;

    Organization {
        name,
        url,
        repository: repository.map(|repo| prepend_edges(older, repo)),
    }
}

fn prepend_edges(older: &[IssueEdge], mut repo: Repository) -> Repository {
    if let Some(issues) = repo.issues.as_mut() {
        let newer = std::mem::take(&mut issues.edges);
        issues.edges = older.iter().cloned().chain(newer).collect();
    }
    repo
}
