//! Source listing: enumerate candidate files and drop excluded ones.

use tracing::{info, instrument};

use wishlist_github::GitHubClient;
use wishlist_shared::{RepoRef, Result, SourceFile};

/// List the files under `dir` in `repo`, minus those whose name contains `exclude`.
///
/// A listing failure is returned as-is (`RemoteAccess`) and never retried.
#[instrument(skip_all, fields(repo = %repo, dir = %dir, exclude = %exclude))]
pub async fn list_sources(
    client: &GitHubClient,
    repo: &RepoRef,
    dir: &str,
    exclude: &str,
) -> Result<Vec<SourceFile>> {
    let files = client.list_directory(repo, dir).await?;
    let listed = files.len();
    let kept = filter_excluded(files, exclude);

    info!(listed, kept = kept.len(), "listed source files");
    Ok(kept)
}

/// Drop every file whose name contains `tag` (case-sensitive), preserving order.
///
/// An empty tag excludes nothing.
pub fn filter_excluded(files: Vec<SourceFile>, tag: &str) -> Vec<SourceFile> {
    if tag.is_empty() {
        return files;
    }

    files
        .into_iter()
        .filter(|file| {
            let excluded = file.name.contains(tag);
            if excluded {
                info!(name = %file.name, tag, "skipping excluded file");
            }
            !excluded
        })
        .collect()
}
