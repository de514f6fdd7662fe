//! Cross-reference indexes built while the export is streamed.
//!
//! The [`IndexBuilder`] is the accumulator owned by one decoding pass. When
//! the pass completes it is frozen into an [`ExportIndex`], an immutable
//! snapshot that can be saved next to the records and loaded again later.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// File name of the saved index inside a store root.
pub const INDEX_FILE: &str = "index.json";

/// Counters collected during one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    /// Objects read from the stream, by declared class.
    pub objects_by_class: BTreeMap<String, u64>,
    /// Records written to the store (merges included).
    pub records_written: u64,
    /// Content ids rejected by the id range list.
    pub rejected_by_range: u64,
    /// Entities dropped because an owning entity could not be resolved.
    pub dropped: u64,
}

impl ImportStats {
    /// Total number of objects read.
    pub fn objects(&self) -> u64 {
        self.objects_by_class.values().sum()
    }

    /// Count one object of `class`.
    pub fn count_object(&mut self, class: &str) {
        *self.objects_by_class.entry(class.to_string()).or_default() += 1;
    }
}

/// Mutable index state accumulated during a pass.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    pages_by_space: BTreeMap<i64, Vec<i64>>,
    blog_posts_by_space: BTreeMap<i64, Vec<i64>>,
    spaces_by_key: BTreeMap<String, i64>,
    excluded_spaces: BTreeSet<i64>,
    indexed: HashSet<i64>,
    stats: ImportStats,
    cancelled: bool,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a current page to its space, in first-seen order.
    pub fn add_page(&mut self, space: i64, page: i64) {
        if self.indexed.insert(page) {
            self.pages_by_space.entry(space).or_default().push(page);
        }
    }

    /// Append a current blog post to its space, in first-seen order.
    pub fn add_blog_post(&mut self, space: i64, blog_post: i64) {
        if self.indexed.insert(blog_post) {
            self.blog_posts_by_space.entry(space).or_default().push(blog_post);
        }
    }

    /// Register a space, optionally under its key, and make sure it has
    /// (possibly empty) page and blog post entries.
    pub fn register_space(&mut self, space: i64, key: Option<&str>) {
        if let Some(key) = key {
            self.spaces_by_key.insert(key.to_string(), space);
        }
        self.pages_by_space.entry(space).or_default();
        self.blog_posts_by_space.entry(space).or_default();
    }

    /// Mark a space as excluded by the caller.
    pub fn exclude_space(&mut self, space: i64) {
        self.excluded_spaces.insert(space);
    }

    /// Record that the caller asked to cancel during the pass.
    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn stats_mut(&mut self) -> &mut ImportStats {
        &mut self.stats
    }

    /// Freeze the accumulated state.
    pub fn finish(self) -> ExportIndex {
        ExportIndex {
            pages_by_space: self.pages_by_space,
            blog_posts_by_space: self.blog_posts_by_space,
            spaces_by_key: self.spaces_by_key,
            excluded_spaces: self.excluded_spaces,
            stats: self.stats,
            cancelled: self.cancelled,
        }
    }
}

/// Immutable snapshot of the indexes produced by one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportIndex {
    pages_by_space: BTreeMap<i64, Vec<i64>>,
    blog_posts_by_space: BTreeMap<i64, Vec<i64>>,
    spaces_by_key: BTreeMap<String, i64>,
    excluded_spaces: BTreeSet<i64>,
    stats: ImportStats,
    cancelled: bool,
}

impl ExportIndex {
    /// Current page ids of a space, in first-seen order.
    pub fn pages(&self, space: i64) -> &[i64] {
        self.pages_by_space.get(&space).map_or(&[], Vec::as_slice)
    }

    /// Current blog post ids of a space, in first-seen order.
    pub fn blog_posts(&self, space: i64) -> &[i64] {
        self.blog_posts_by_space.get(&space).map_or(&[], Vec::as_slice)
    }

    /// Space id registered under `key`.
    pub fn space_id(&self, key: &str) -> Option<i64> {
        self.spaces_by_key.get(key).copied()
    }

    /// All space keys with their ids, ordered by key.
    pub fn spaces_by_key(&self) -> impl Iterator<Item = (&str, i64)> {
        self.spaces_by_key.iter().map(|(k, id)| (k.as_str(), *id))
    }

    /// Every space id that has a page or blog post entry.
    pub fn space_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.pages_by_space
            .keys()
            .chain(self.blog_posts_by_space.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    /// Returns `true` if the caller excluded this space during the pass.
    pub fn is_excluded(&self, space: i64) -> bool {
        self.excluded_spaces.contains(&space)
    }

    pub fn excluded_spaces(&self) -> impl Iterator<Item = i64> + '_ {
        self.excluded_spaces.iter().copied()
    }

    pub fn stats(&self) -> &ImportStats {
        &self.stats
    }

    /// Returns `true` if the caller asked to cancel during the pass.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Write the snapshot into a store root.
    pub fn save(&self, root: &Path) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(root.join(INDEX_FILE), data)?;
        Ok(())
    }

    /// Load a snapshot saved by [`save`](Self::save).
    pub fn load(root: &Path) -> StoreResult<Self> {
        let path = root.join(INDEX_FILE);
        if !path.is_file() {
            return Err(StoreError::MissingStore(root.to_path_buf()));
        }
        let data = fs::read(path)?;
        serde_json::from_slice(&data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_keep_first_seen_order_without_duplicates() {
        let mut builder = IndexBuilder::new();
        builder.add_page(1, 30);
        builder.add_page(1, 10);
        builder.add_page(1, 30);
        builder.add_blog_post(1, 50);
        let index = builder.finish();
        assert_eq!(index.pages(1), &[30, 10]);
        assert_eq!(index.blog_posts(1), &[50]);
        assert!(index.pages(2).is_empty());
    }

    #[test]
    fn register_space_creates_empty_entries() {
        let mut builder = IndexBuilder::new();
        builder.register_space(7, Some("DOC"));
        builder.register_space(8, None);
        let index = builder.finish();
        assert_eq!(index.space_id("DOC"), Some(7));
        assert_eq!(index.space_id("NOPE"), None);
        assert!(index.pages(7).is_empty());
        assert_eq!(index.space_ids().collect::<Vec<_>>(), vec![7, 8]);
        assert_eq!(index.spaces_by_key().collect::<Vec<_>>(), vec![("DOC", 7)]);
    }

    #[test]
    fn exclusion_and_cancellation_are_recorded() {
        let mut builder = IndexBuilder::new();
        builder.exclude_space(3);
        builder.mark_cancelled();
        builder.stats_mut().count_object("Page");
        builder.stats_mut().count_object("Page");
        builder.stats_mut().count_object("Space");
        let index = builder.finish();
        assert!(index.is_excluded(3));
        assert!(!index.is_excluded(4));
        assert!(index.was_cancelled());
        assert_eq!(index.stats().objects(), 3);
        assert_eq!(index.stats().objects_by_class["Page"], 2);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = IndexBuilder::new();
        builder.register_space(1, Some("KEY"));
        builder.add_page(1, 2);
        let index = builder.finish();
        index.save(dir.path()).unwrap();
        assert_eq!(ExportIndex::load(dir.path()).unwrap(), index);
    }

    #[test]
    fn load_without_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ExportIndex::load(dir.path()),
            Err(StoreError::MissingStore(_))
        ));
    }
}
