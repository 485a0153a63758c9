//! Text sanitation for wishlist fragment lines.
//!
//! Wishlist source files are loosely formatted: lines may be wrapped in
//! quotes, carry escaped newline tokens, or trail a stray apostrophe left
//! over from copy-pasting string literals. This crate normalizes them.
//!
//! - [`clean`] — sanitize a single line (roll entries)
//! - [`clean_leading`] — drop a `label:` prefix, then sanitize (header lines)

mod clean;

pub use clean::{clean, clean_leading};
