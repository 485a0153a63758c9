//! Wishlist file writer.
//!
//! Output layout:
//! ```text
//! title:<fragment1>|<fragment2>|...
//! description:<fragment1>|<fragment2>|...
//! <roll line 1>
//! <roll line 2>
//! ...
//! ```

use std::path::Path;

use tracing::{debug, info, instrument};

use wishlist_shared::{Result, WishlistError};

use crate::aggregate::Wishlist;

/// Separator between per-file header fragments.
const FRAGMENT_SEPARATOR: &str = "|";

impl Wishlist {
    /// Render the complete, newline-terminated output text.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("title:");
        out.push_str(&self.titles.join(FRAGMENT_SEPARATOR));
        out.push('\n');

        out.push_str("description:");
        out.push_str(&self.descriptions.join(FRAGMENT_SEPARATOR));
        out.push('\n');

        for roll in &self.rolls {
            out.push_str(roll);
            out.push('\n');
        }

        out
    }
}

/// Write `wishlist` to `path`, replacing any existing file.
///
/// The text is written to a sibling temp file and renamed into place, so the
/// destination either keeps its old content or holds the complete new one.
#[instrument(skip_all, fields(path = %path.display(), rolls = wishlist.rolls.len()))]
pub fn write_wishlist(path: &Path, wishlist: &Wishlist) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            WishlistError::validation(format!("output path has no file name: {}", path.display()))
        })?
        .to_string_lossy()
        .into_owned();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    std::fs::create_dir_all(&dir).map_err(|e| WishlistError::io(&dir, e))?;

    let content = wishlist.render();
    let temp = dir.join(format!(".{file_name}.tmp"));

    // Write to temp file first, then rename into place
    let written = std::fs::write(&temp, &content)
        .map_err(|e| WishlistError::io(&temp, e))
        .and_then(|()| std::fs::rename(&temp, path).map_err(|e| WishlistError::io(path, e)));

    if let Err(err) = written {
        if let Err(cleanup) = std::fs::remove_file(&temp) {
            debug!(temp = %temp.display(), error = %cleanup, "temp file not removed");
        }
        return Err(err);
    }

    debug!(bytes = content.len(), "wrote wishlist");
    info!(path = %path.display(), "wishlist written");

    Ok(())
}
