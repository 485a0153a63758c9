//! Per-file parsing and cross-file accumulation of wishlist content.
//!
//! Line 1 of each file is its title, line 2 its description, and every later
//! line is a roll entry. Rolls starting with [`ROLL_PREFIX`] are kept once
//! across the whole run; any other line is kept every time it appears.

use std::collections::HashSet;

use tracing::info;

use wishlist_text::{clean, clean_leading};

/// Prefix marking a roll as eligible for deduplication.
pub const ROLL_PREFIX: &str = "dimwishlist:";

/// Accumulated wishlist content, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    /// One title fragment per processed file.
    pub titles: Vec<String>,
    /// One description fragment per processed file.
    pub descriptions: Vec<String>,
    /// Roll lines to emit.
    pub rolls: Vec<String>,
    /// Distinct dedup-eligible rolls.
    pub unique_rolls: usize,
}

/// Owns the title/description accumulators, the dedup set, and the roll sequence.
#[derive(Debug, Default)]
pub struct Aggregator {
    titles: Vec<String>,
    descriptions: Vec<String>,
    seen: HashSet<String>,
    rolls: Vec<String>,
    files: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ingesting one file; feed it lines with [`FileIngest::push`] and
    /// close it with [`FileIngest::finish`].
    pub fn begin_file(&mut self, name: impl Into<String>) -> FileIngest<'_> {
        FileIngest {
            aggregator: self,
            name: name.into(),
            position: 0,
            new_rolls: 0,
        }
    }

    /// Ingest a whole file from an iterator of lines. Returns the number of
    /// new unique rolls it contributed.
    pub fn ingest_lines<I, L>(&mut self, name: impl Into<String>, lines: I) -> usize
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut ingest = self.begin_file(name);
        for line in lines {
            ingest.push(&line);
        }
        ingest.finish()
    }

    /// Number of files ingested so far.
    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn into_wishlist(self) -> Wishlist {
        Wishlist {
            unique_rolls: self.seen.len(),
            titles: self.titles,
            descriptions: self.descriptions,
            rolls: self.rolls,
        }
    }

    /// Append a cleaned roll unless it is a dedup-eligible repeat.
    /// Returns `true` when the roll was new and dedup-eligible.
    fn accept_roll(&mut self, roll: String) -> bool {
        if !roll.starts_with(ROLL_PREFIX) {
            self.rolls.push(roll);
            return false;
        }

        if self.seen.contains(&roll) {
            return false;
        }
        self.seen.insert(roll.clone());
        self.rolls.push(roll);
        true
    }
}

/// Ingestion state for a single file.
#[must_use = "call finish() to record the file's header fragments"]
pub struct FileIngest<'a> {
    aggregator: &'a mut Aggregator,
    name: String,
    position: usize,
    new_rolls: usize,
}

impl FileIngest<'_> {
    /// Feed the next raw line of the file.
    pub fn push<L: AsRef<[u8]> + ?Sized>(&mut self, line: &L) {
        match self.position {
            0 => self.aggregator.titles.push(clean_leading(line)),
            1 => self.aggregator.descriptions.push(clean_leading(line)),
            _ => {
                if self.aggregator.accept_roll(clean(line)) {
                    self.new_rolls += 1;
                }
            }
        }
        self.position += 1;
    }

    /// Close the file. Missing title/description lines count as empty
    /// fragments. Returns the number of new unique rolls from this file.
    pub fn finish(self) -> usize {
        if self.position < 1 {
            self.aggregator.titles.push(String::new());
        }
        if self.position < 2 {
            self.aggregator.descriptions.push(String::new());
        }
        self.aggregator.files += 1;

        info!(
            file = %self.name,
            lines = self.position,
            new_rolls = self.new_rolls,
            "aggregated file"
        );

        self.new_rolls
    }
}
