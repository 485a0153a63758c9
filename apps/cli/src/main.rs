//! wishlist-compiler — merge community wishlist fragments into one file.
//!
//! Fetches a directory of wishlist sources from GitHub, orders them,
//! deduplicates their rolls, and writes a single wishlist for DIM.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
