//! Shared types, error model, and configuration for the wishlist compiler.
//!
//! This crate is the foundation depended on by all other wishlist crates.
//! It provides:
//! - [`WishlistError`] — the unified error type
//! - Domain types ([`SourceFile`], [`ChangeEvent`], [`OrderingStrategy`], [`RepoRef`])
//! - Configuration ([`AppConfig`], [`CompileConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompileConfig, Credentials, GitHubConfig, OutputConfig, SourceConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, WishlistError};
pub use types::{ChangeEvent, OrderedSource, OrderingStrategy, RepoRef, SourceFile};
