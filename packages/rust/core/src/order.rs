//! File ordering: by last-modified attribute or by first appearance in history.
//!
//! Every file must end up with an ordering key. A file that cannot be given
//! one fails the run with [`WishlistError::Ordering`] instead of being placed
//! at a guessed position.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use wishlist_github::{CommitHistory, GitHubClient};
use wishlist_shared::{
    ChangeEvent, OrderedSource, OrderingStrategy, RepoRef, Result, SourceFile, WishlistError,
};

// ---------------------------------------------------------------------------
// Change-event source
// ---------------------------------------------------------------------------

/// A single-pass supply of change events in ascending timestamp order.
#[allow(async_fn_in_trait)]
pub trait ChangeEventSource {
    /// The next-oldest event, or `None` when history is exhausted.
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>>;
}

impl ChangeEventSource for CommitHistory<'_> {
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>> {
        CommitHistory::next_event(self).await
    }
}

// ---------------------------------------------------------------------------
// Strategy dispatch
// ---------------------------------------------------------------------------

/// Order `files` with the configured strategy, fetching whatever remote data
/// that strategy needs.
#[instrument(skip_all, fields(strategy = %strategy, files = files.len()))]
pub async fn order_sources(
    client: &GitHubClient,
    repo: &RepoRef,
    source_dir: &str,
    strategy: OrderingStrategy,
    files: Vec<SourceFile>,
) -> Result<Vec<OrderedSource>> {
    match strategy {
        OrderingStrategy::LastModified => {
            let files = hydrate_last_modified(client, repo, files).await?;
            order_by_timestamp(files)
        }
        OrderingStrategy::History => {
            let mut history = CommitHistory::load(client, repo, Some(source_dir)).await?;
            order_by_history(files, &mut history).await
        }
    }
}

/// Fill in `last_modified` for files whose listing record lacks it.
async fn hydrate_last_modified(
    client: &GitHubClient,
    repo: &RepoRef,
    files: Vec<SourceFile>,
) -> Result<Vec<SourceFile>> {
    let mut hydrated = Vec::with_capacity(files.len());
    for file in files {
        if file.last_modified.is_some() {
            hydrated.push(file);
            continue;
        }
        debug!(path = %file.path, "fetching last-modified attribute");
        hydrated.push(client.fetch_file(repo, &file.path).await?);
    }
    Ok(hydrated)
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Stable sort by `last_modified`; ties keep listing order.
pub fn order_by_timestamp(files: Vec<SourceFile>) -> Result<Vec<OrderedSource>> {
    let missing: Vec<String> = files
        .iter()
        .filter(|f| f.last_modified.is_none())
        .map(|f| f.path.clone())
        .collect();
    if !missing.is_empty() {
        return Err(WishlistError::Ordering { unmatched: missing });
    }

    let mut ordered: Vec<OrderedSource> = files
        .into_iter()
        .filter_map(|file| {
            file.last_modified
                .map(|resolved_at| OrderedSource { resolved_at, file })
        })
        .collect();
    ordered.sort_by_key(|o| o.resolved_at);

    info!(files = ordered.len(), "ordered by last-modified");
    Ok(ordered)
}

/// Order files by the timestamp of the earliest change event touching them.
///
/// Events are consumed oldest-first and consumption stops as soon as every
/// file is matched. Files sharing a timestamp are ordered by path.
pub async fn order_by_history<H: ChangeEventSource>(
    files: Vec<SourceFile>,
    history: &mut H,
) -> Result<Vec<OrderedSource>> {
    let mut unmatched: BTreeSet<String> = files.iter().map(|f| f.path.clone()).collect();
    let mut first_seen: HashMap<String, DateTime<Utc>> = HashMap::with_capacity(files.len());
    let mut events_seen = 0usize;

    while !unmatched.is_empty() {
        let Some(event) = history.next_event().await? else {
            break;
        };
        events_seen += 1;

        for path in &event.paths {
            if unmatched.remove(path) {
                debug!(%path, commit = %event.id, at = %event.timestamp, "matched file to change event");
                first_seen.insert(path.clone(), event.timestamp);
            }
        }
    }

    if !unmatched.is_empty() {
        return Err(WishlistError::Ordering {
            unmatched: unmatched.into_iter().collect(),
        });
    }

    let mut ordered: Vec<OrderedSource> = files
        .into_iter()
        .filter_map(|file| {
            first_seen
                .get(&file.path)
                .map(|&resolved_at| OrderedSource { resolved_at, file })
        })
        .collect();
    ordered.sort_by(|a, b| {
        a.resolved_at
            .cmp(&b.resolved_at)
            .then_with(|| a.file.path.cmp(&b.file.path))
    });

    info!(files = ordered.len(), events_seen, "ordered by change history");
    Ok(ordered)
}
