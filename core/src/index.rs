use crate::json;
use crate::Position;
use anyhow::Result;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Inverted index over stemmed tokens: each stem maps to the locations it was
/// seen at, and each location to the sorted set of positions it occupied
/// there. `counts` tracks the total number of stems accepted per location and
/// is what search scores are computed against.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InvertedIndex {
    index: BTreeMap<String, BTreeMap<String, BTreeSet<Position>>>,
    counts: BTreeMap<String, u64>,
}

/// A single ranked search hit: where the query matched, how many stem
/// occurrences matched, and the matched share of that location's stems.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub location: String,
    pub match_count: u64,
    pub score: f64,
}

impl SearchResult {
    fn new(location: String) -> Self {
        Self {
            location,
            match_count: 0,
            score: 0.0,
        }
    }
}

/// Case-insensitive lexicographic comparison, used as the final ranking
/// tie-break.
fn case_insensitive_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `stem` at `location` and `position`. The
    /// location's count is bumped only when the position set actually grew,
    /// so replaying the same triple never inflates counts.
    pub fn add(&mut self, stem: &str, location: &str, position: Position) {
        let modified = self
            .index
            .entry(stem.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(position);

        if modified {
            *self.counts.entry(location.to_string()).or_insert(0) += 1;
        }
    }

    /// Merge another index into this one, consuming it. Absent stems and
    /// locations are transplanted wholesale; overlapping position sets are
    /// unioned. Counts are merged as plain sums, which is only correct when
    /// the two indexes never recorded distinct positions for the same
    /// location. The build pipeline guarantees that by giving every file
    /// and page its own local index.
    pub fn add_all(&mut self, other: InvertedIndex) {
        for (stem, other_locations) in other.index {
            match self.index.entry(stem) {
                Entry::Vacant(entry) => {
                    entry.insert(other_locations);
                }
                Entry::Occupied(mut entry) => {
                    let locations = entry.get_mut();
                    for (location, positions) in other_locations {
                        match locations.entry(location) {
                            Entry::Vacant(entry) => {
                                entry.insert(positions);
                            }
                            Entry::Occupied(mut entry) => {
                                entry.get_mut().extend(positions);
                            }
                        }
                    }
                }
            }
        }

        for (location, count) in other.counts {
            *self.counts.entry(location).or_insert(0) += count;
        }
    }

    pub fn has_stem(&self, stem: &str) -> bool {
        self.index.contains_key(stem)
    }

    pub fn has_location(&self, location: &str) -> bool {
        self.counts.contains_key(location)
    }

    pub fn stem_has_location(&self, stem: &str, location: &str) -> bool {
        self.index
            .get(stem)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn stem_at_position(&self, stem: &str, location: &str, position: Position) -> bool {
        self.index
            .get(stem)
            .and_then(|locations| locations.get(location))
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Total stems accepted at a location, zero if unknown.
    pub fn count_of(&self, location: &str) -> u64 {
        self.counts.get(location).copied().unwrap_or(0)
    }

    /// Number of locations with at least one accepted stem.
    pub fn counts_size(&self) -> usize {
        self.counts.len()
    }

    /// Number of distinct stems in the index.
    pub fn index_size(&self) -> usize {
        self.index.len()
    }

    pub fn num_locations_at_stem(&self, stem: &str) -> usize {
        self.index.get(stem).map_or(0, BTreeMap::len)
    }

    /// How many times a stem occurs at a location.
    pub fn num_stems_at_location(&self, stem: &str, location: &str) -> usize {
        self.index
            .get(stem)
            .and_then(|locations| locations.get(location))
            .map_or(0, BTreeSet::len)
    }

    pub fn num_positions_at_location_for_stem(&self, stem: &str, location: &str) -> usize {
        self.num_stems_at_location(stem, location)
    }

    /// Locations known to the index, ascending.
    pub fn get_locations(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Stems known to the index, ascending.
    pub fn get_stems(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Locations a stem occurs at, ascending; empty if the stem is unknown.
    pub fn get_stem_locations<'a>(&'a self, stem: &str) -> impl Iterator<Item = &'a str> {
        self.index
            .get(stem)
            .into_iter()
            .flat_map(|locations| locations.keys().map(String::as_str))
    }

    /// Positions of a stem at a location, ascending; empty if either key is
    /// unknown.
    pub fn get_stem_positions_in<'a>(
        &'a self,
        stem: &str,
        location: &str,
    ) -> impl Iterator<Item = Position> + 'a {
        self.index
            .get(stem)
            .and_then(|locations| locations.get(location))
            .into_iter()
            .flat_map(|positions| positions.iter().copied())
    }

    /// Run one query, exact or partial, and return the ranked results.
    pub fn search(&self, query: &BTreeSet<String>, partial: bool) -> Vec<SearchResult> {
        if partial {
            self.partial_search(query)
        } else {
            self.exact_search(query)
        }
    }

    /// Rank results for the stems that literally occur in the index.
    pub fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut slots = HashMap::new();
        let mut results = Vec::new();

        for stem in query {
            if let Some(locations) = self.index.get(stem.as_str()) {
                Self::accumulate(locations, &self.counts, &mut slots, &mut results);
            }
        }

        results.sort_by(|a, b| Self::rank(a, b, &self.counts));
        results
    }

    /// Rank results for every indexed stem that a query stem is a prefix of.
    /// The sorted stem order makes this a range scan: start at the query stem
    /// and walk forward until the prefix no longer matches.
    pub fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut slots = HashMap::new();
        let mut results = Vec::new();

        for stem in query {
            for (indexed, locations) in self.index.range(stem.clone()..) {
                if !indexed.starts_with(stem.as_str()) {
                    break;
                }
                Self::accumulate(locations, &self.counts, &mut slots, &mut results);
            }
        }

        results.sort_by(|a, b| Self::rank(a, b, &self.counts));
        results
    }

    /// Fold one stem's postings into the running result list. Locations keep
    /// the slot they were first discovered at; scores are updated against the
    /// location's total stem count.
    fn accumulate<'a>(
        locations: &'a BTreeMap<String, BTreeSet<Position>>,
        counts: &BTreeMap<String, u64>,
        slots: &mut HashMap<&'a str, usize>,
        results: &mut Vec<SearchResult>,
    ) {
        for (location, positions) in locations {
            let slot = *slots.entry(location.as_str()).or_insert_with(|| {
                results.push(SearchResult::new(location.clone()));
                results.len() - 1
            });

            let hit = &mut results[slot];
            hit.match_count += positions.len() as u64;
            let total = counts.get(location.as_str()).copied().unwrap_or(0);
            if total > 0 {
                hit.score = hit.match_count as f64 / total as f64;
            }
        }
    }

    /// The ranking order: score descending, then location word count
    /// descending, then location ascending ignoring case. Counts are passed
    /// in rather than captured so the ordering is explicit about what it
    /// reads.
    fn rank(a: &SearchResult, b: &SearchResult, counts: &BTreeMap<String, u64>) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| counts.get(b.location.as_str()).cmp(&counts.get(a.location.as_str())))
            .then_with(|| case_insensitive_cmp(&a.location, &b.location))
    }

    /// Write the per-location counts as pretty JSON.
    pub fn write_counts(&self, path: &Path) -> Result<()> {
        json::write_pretty(&self.counts, path)
    }

    /// Write the full inverted index as pretty JSON.
    pub fn write_index(&self, path: &Path) -> Result<()> {
        json::write_pretty(&self.index, path)
    }
}
