use crate::index::{InvertedIndex, SearchResult};
use crate::Position;
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::Path;

/// `InvertedIndex` behind a reader/writer lock: any number of concurrent
/// readers, or a single writer. Mutations take the write guard, every
/// observer and search takes the read guard, and serialisation holds the
/// read guard for its whole duration so consumers see one consistent
/// snapshot. Guards are RAII, so the lock is released on every exit path.
#[derive(Debug, Default)]
pub struct ThreadSafeIndex {
    inner: RwLock<InvertedIndex>,
}

impl ThreadSafeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, stem: &str, location: &str, position: Position) {
        self.inner.write().add(stem, location, position);
    }

    pub fn add_all(&self, other: InvertedIndex) {
        self.inner.write().add_all(other);
    }

    pub fn has_stem(&self, stem: &str) -> bool {
        self.inner.read().has_stem(stem)
    }

    pub fn has_location(&self, location: &str) -> bool {
        self.inner.read().has_location(location)
    }

    pub fn stem_has_location(&self, stem: &str, location: &str) -> bool {
        self.inner.read().stem_has_location(stem, location)
    }

    pub fn stem_at_position(&self, stem: &str, location: &str, position: Position) -> bool {
        self.inner.read().stem_at_position(stem, location, position)
    }

    pub fn count_of(&self, location: &str) -> u64 {
        self.inner.read().count_of(location)
    }

    pub fn counts_size(&self) -> usize {
        self.inner.read().counts_size()
    }

    pub fn index_size(&self) -> usize {
        self.inner.read().index_size()
    }

    pub fn num_locations_at_stem(&self, stem: &str) -> usize {
        self.inner.read().num_locations_at_stem(stem)
    }

    pub fn num_stems_at_location(&self, stem: &str, location: &str) -> usize {
        self.inner.read().num_stems_at_location(stem, location)
    }

    pub fn num_positions_at_location_for_stem(&self, stem: &str, location: &str) -> usize {
        self.inner
            .read()
            .num_positions_at_location_for_stem(stem, location)
    }

    // The borrowed views of the plain index cannot outlive a lock guard, so
    // the shared variant hands out owned copies instead.

    pub fn get_locations(&self) -> Vec<String> {
        self.inner.read().get_locations().map(str::to_string).collect()
    }

    pub fn get_stems(&self) -> Vec<String> {
        self.inner.read().get_stems().map(str::to_string).collect()
    }

    pub fn get_stem_locations(&self, stem: &str) -> Vec<String> {
        self.inner
            .read()
            .get_stem_locations(stem)
            .map(str::to_string)
            .collect()
    }

    pub fn get_stem_positions_in(&self, stem: &str, location: &str) -> Vec<Position> {
        self.inner
            .read()
            .get_stem_positions_in(stem, location)
            .collect()
    }

    pub fn search(&self, query: &BTreeSet<String>, partial: bool) -> Vec<SearchResult> {
        self.inner.read().search(query, partial)
    }

    pub fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().exact_search(query)
    }

    pub fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().partial_search(query)
    }

    pub fn write_counts(&self, path: &Path) -> Result<()> {
        self.inner.read().write_counts(path)
    }

    pub fn write_index(&self, path: &Path) -> Result<()> {
        self.inner.read().write_index(path)
    }

    /// A consistent owned copy of the current index state.
    pub fn snapshot(&self) -> InvertedIndex {
        self.inner.read().clone()
    }
}
