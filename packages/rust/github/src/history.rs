//! Oldest-first replay of a repository's commits as change events.

use std::collections::VecDeque;

use tracing::{debug, info, instrument};

use wishlist_shared::{ChangeEvent, RepoRef, Result};

use crate::client::{CommitSummary, GitHubClient};

/// Commits of a repository, replayed in ascending author-timestamp order.
///
/// Commit summaries are listed once up front; the paths each commit touched
/// are only fetched when that commit is reached, so a consumer that stops
/// early never pays for the remaining detail requests.
pub struct CommitHistory<'a> {
    client: &'a GitHubClient,
    repo: RepoRef,
    pending: VecDeque<CommitSummary>,
}

impl<'a> CommitHistory<'a> {
    /// List the commits of `repo` touching `scope` (or the whole repository).
    #[instrument(skip_all, fields(repo = %repo, scope = ?scope))]
    pub async fn load(
        client: &'a GitHubClient,
        repo: &RepoRef,
        scope: Option<&str>,
    ) -> Result<Self> {
        let mut commits = client.list_commits(repo, scope).await?;

        // API order is newest first; reverse so equal timestamps stay oldest-first
        // through the stable sort.
        commits.reverse();
        commits.sort_by_key(|c| c.timestamp);

        info!(commits = commits.len(), "loaded change history");

        Ok(Self {
            client,
            repo: repo.clone(),
            pending: commits.into(),
        })
    }

    /// The next-oldest change event, or `None` once history is exhausted.
    pub async fn next_event(&mut self) -> Result<Option<ChangeEvent>> {
        let Some(summary) = self.pending.pop_front() else {
            return Ok(None);
        };

        let mut event = self.client.commit_detail(&self.repo, &summary.sha).await?;
        // Keep the listing's timestamp so replay order and reported keys agree.
        event.timestamp = summary.timestamp;

        debug!(sha = %event.id, paths = event.paths.len(), "replayed commit");
        Ok(Some(event))
    }
}
