//! GitHub REST access for wishlist sources.
//!
//! This crate provides:
//! - [`GitHubClient`] — authenticated content listing, single-file fetch,
//!   commit listing/detail, and raw downloads
//! - [`CommitHistory`] — commits of a repository replayed oldest-first as
//!   change events, with affected paths fetched on demand
//! - [`LineSource`] — a lazy, single-pass line reader over inline bytes or a
//!   streamed HTTP body

mod client;
mod history;
mod lines;

pub use client::{CommitSummary, GitHubClient};
pub use history::CommitHistory;
pub use lines::LineSource;
