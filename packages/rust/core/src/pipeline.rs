//! End-to-end `compile` pipeline: list → order → aggregate → write.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use wishlist_github::GitHubClient;
use wishlist_shared::{CompileConfig, Result};

use crate::aggregate::Aggregator;
use crate::lister;
use crate::order;
use crate::writer;

/// Result of the `compile` pipeline.
#[derive(Debug)]
pub struct CompileResult {
    /// Where the wishlist was written.
    pub output_path: PathBuf,
    /// Number of source files aggregated.
    pub file_count: usize,
    /// Distinct dedup-eligible rolls in the output.
    pub unique_rolls: usize,
    /// Total roll lines in the output (including non-deduplicated lines).
    pub roll_lines: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each file has been aggregated.
    fn file_aggregated(&self, name: &str, current: usize, total: usize, new_rolls: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &CompileResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_aggregated(&self, _name: &str, _current: usize, _total: usize, _new_rolls: usize) {}
    fn done(&self, _result: &CompileResult) {}
}

/// Run the full `compile` pipeline.
///
/// 1. List the source directory and drop excluded files
/// 2. Order the files with the configured strategy
/// 3. Stream each file's lines through the aggregator
/// 4. Write the merged wishlist
///
/// Everything is buffered in memory until step 4, so any failure before the
/// write leaves the destination untouched.
#[instrument(skip_all, fields(repo = %config.repo, dir = %config.source_dir, ordering = %config.ordering))]
pub async fn compile_wishlist(
    client: &GitHubClient,
    config: &CompileConfig,
    progress: &dyn ProgressReporter,
) -> Result<CompileResult> {
    let start = Instant::now();

    info!(output = %config.output_path.display(), "starting compile pipeline");

    // --- Phase 1: Listing ---
    progress.phase("Listing source files");
    let files =
        lister::list_sources(client, &config.repo, &config.source_dir, &config.exclude).await?;

    // --- Phase 2: Ordering ---
    progress.phase("Ordering source files");
    let ordered = order::order_sources(
        client,
        &config.repo,
        &config.source_dir,
        config.ordering,
        files,
    )
    .await?;

    // --- Phase 3: Aggregation ---
    progress.phase("Aggregating rolls");
    let mut aggregator = Aggregator::new();
    let total = ordered.len();

    for (i, source) in ordered.iter().enumerate() {
        let mut lines = client.open_lines(&source.file).await?;
        let mut ingest = aggregator.begin_file(&source.file.name);
        while let Some(line) = lines.next_line().await? {
            ingest.push(&line);
        }
        let new_rolls = ingest.finish();
        progress.file_aggregated(&source.file.name, i + 1, total, new_rolls);
    }

    let file_count = aggregator.file_count();
    let wishlist = aggregator.into_wishlist();

    // --- Phase 4: Write ---
    progress.phase("Writing wishlist");
    writer::write_wishlist(&config.output_path, &wishlist)?;

    let result = CompileResult {
        output_path: config.output_path.clone(),
        file_count,
        unique_rolls: wishlist.unique_rolls,
        roll_lines: wishlist.rolls.len(),
        elapsed: start.elapsed(),
    };

    info!(
        files = result.file_count,
        unique_rolls = result.unique_rolls,
        roll_lines = result.roll_lines,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "compile pipeline complete"
    );

    progress.done(&result);
    Ok(result)
}
