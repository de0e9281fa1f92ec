//! Bounded seen-state sets with FIFO eviction, persisted as flat text files.
//!
//! The files are small (hundreds to a couple thousand lines), so the whole
//! set is read into memory at startup and rewritten on every update.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Insertion-ordered collection of strings with a hard capacity.
/// Once the cap is exceeded the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct SeenSet {
    entries: VecDeque<String>,
    capacity: usize,
}

impl SeenSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild from persisted entries, oldest first. Entries past the cap
    /// evict from the front, so a file longer than the cap keeps its tail.
    pub fn from_entries<I, S>(capacity: usize, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::with_capacity(capacity);
        for it in items {
            set.insert(it.as_ref());
        }
        set
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.iter().any(|e| e == value)
    }

    /// Append a trimmed value, evicting the oldest entry once over capacity.
    /// Empty values and exact re-inserts are no-ops.
    pub fn insert(&mut self, value: &str) {
        let v = value.trim();
        if v.is_empty() || self.contains(v) {
            return;
        }
        self.entries.push_back(v.to_string());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first; this is the order the file is written in.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    /// Newest first; scan order for duplicate checks, since recent
    /// duplicates are by far the most likely hits.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(|s| s.as_str())
    }
}

/// One link file per source plus one global content-fingerprint file,
/// all under a single state directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load_links(&self, source_key: &str, capacity: usize) -> Result<SeenSet> {
        load_set(&self.link_path(source_key), capacity)
    }

    pub fn load_content(&self, capacity: usize) -> Result<SeenSet> {
        load_set(&self.content_path(), capacity)
    }

    pub fn save_links(&self, source_key: &str, set: &SeenSet) -> Result<()> {
        self.save(&self.link_path(source_key), set)
    }

    pub fn save_content(&self, set: &SeenSet) -> Result<()> {
        self.save(&self.content_path(), set)
    }

    fn link_path(&self, source_key: &str) -> PathBuf {
        self.dir.join(format!("seen_links_{source_key}.txt"))
    }

    fn content_path(&self) -> PathBuf {
        self.dir.join("seen_content.txt")
    }

    fn save(&self, path: &Path, set: &SeenSet) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating state dir {}", self.dir.display()))?;
        let tmp = path.with_extension("txt.tmp");
        let mut body = String::new();
        for entry in set.iter() {
            body.push_str(entry);
            body.push('\n');
        }
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(body.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

/// A missing file means an empty set, not an error.
fn load_set(path: &Path, capacity: usize) -> Result<SeenSet> {
    if !path.exists() {
        return Ok(SeenSet::with_capacity(capacity));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading seen state from {}", path.display()))?;
    Ok(SeenSet::from_entries(
        capacity,
        text.lines().map(str::trim).filter(|l| !l.is_empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_past_capacity_evicts_oldest_first() {
        let mut set = SeenSet::with_capacity(3);
        for v in ["a", "b", "c"] {
            set.insert(v);
        }
        set.insert("d");
        let entries: Vec<&str> = set.iter().collect();
        assert_eq!(entries, vec!["b", "c", "d"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn insert_trims_and_skips_blanks_and_repeats() {
        let mut set = SeenSet::with_capacity(10);
        set.insert("  https://example.test/a  ");
        set.insert("https://example.test/a");
        set.insert("   ");
        assert_eq!(set.len(), 1);
        assert!(set.contains("https://example.test/a"));
    }

    #[test]
    fn newest_first_iteration_reverses_insertion_order() {
        let set = SeenSet::from_entries(5, ["one", "two", "three"]);
        let newest: Vec<&str> = set.iter_newest_first().collect();
        assert_eq!(newest, vec!["three", "two", "one"]);
    }

    #[test]
    fn from_entries_truncates_long_input_keeping_tail() {
        let set = SeenSet::from_entries(2, ["a", "b", "c", "d"]);
        let entries: Vec<&str> = set.iter().collect();
        assert_eq!(entries, vec!["c", "d"]);
    }
}
