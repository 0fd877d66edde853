use crate::index::{InvertedIndex, SearchResult};
use crate::json::{self, ResultRecord};
use crate::locked::ThreadSafeIndex;
use crate::queue::WorkQueue;
use crate::tokenizer;
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Common surface of the serial and threaded query searchers. A query line
/// is reduced to its canonical stem form before anything else; lines whose
/// canonical form is empty are ignored everywhere.
pub trait SearchInterface {
    /// Evaluate (or schedule) one query line.
    fn search_line(&mut self, line: &str, partial: bool);

    /// Evaluate every line of a query file.
    fn search_file(&mut self, path: &Path, partial: bool) -> Result<()> {
        feed_queries(self, path, partial)
    }

    /// Serialise all accumulated results as pretty JSON.
    fn write_results(&self, path: &Path) -> Result<()>;

    /// Whether this query line has been searched already.
    fn has_query(&self, line: &str) -> bool;

    /// The ranked results for a query line, empty if it was never searched.
    fn get_results(&self, line: &str) -> Vec<SearchResult>;

    /// Number of distinct canonical queries recorded.
    fn size(&self) -> usize;
}

fn feed_queries<S: SearchInterface + ?Sized>(
    searcher: &mut S,
    path: &Path,
    partial: bool,
) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        searcher.search_line(&line?, partial);
    }
    Ok(())
}

fn records_for(hits: &[SearchResult]) -> Vec<ResultRecord> {
    hits.iter().map(ResultRecord::from).collect()
}

/// Single-threaded searcher: memoises each canonical query against a
/// borrowed index.
pub struct FileSearcher<'a> {
    results: BTreeMap<String, Vec<SearchResult>>,
    index: &'a InvertedIndex,
}

impl<'a> FileSearcher<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        tracing::debug!("file searcher initialized");
        Self {
            results: BTreeMap::new(),
            index,
        }
    }
}

impl SearchInterface for FileSearcher<'_> {
    fn search_line(&mut self, line: &str, partial: bool) {
        let queries = tokenizer::unique_stems(line);
        if queries.is_empty() {
            return;
        }

        let joined = tokenizer::canonical(&queries);
        if self.results.contains_key(&joined) {
            return;
        }

        let found = self.index.search(&queries, partial);
        self.results.insert(joined, found);
    }

    fn write_results(&self, path: &Path) -> Result<()> {
        let records: BTreeMap<&str, Vec<ResultRecord>> = self
            .results
            .iter()
            .map(|(query, hits)| (query.as_str(), records_for(hits)))
            .collect();
        json::write_pretty(&records, path)
    }

    fn has_query(&self, line: &str) -> bool {
        let queries = tokenizer::unique_stems(line);
        !queries.is_empty() && self.results.contains_key(&tokenizer::canonical(&queries))
    }

    fn get_results(&self, line: &str) -> Vec<SearchResult> {
        let queries = tokenizer::unique_stems(line);
        if queries.is_empty() {
            return Vec::new();
        }
        self.results
            .get(&tokenizer::canonical(&queries))
            .cloned()
            .unwrap_or_default()
    }

    fn size(&self) -> usize {
        self.results.len()
    }
}

/// A query's slot in the shared results map. `None` marks a claimed query
/// whose search is still running; it is replaced by the real list once the
/// search completes.
type ResultsMap = BTreeMap<String, Option<Vec<SearchResult>>>;

/// Searcher that schedules each query line on the work queue. Duplicate
/// lines collapse to one search: the first task to claim a canonical key
/// wins, and the search itself runs outside the results lock.
pub struct ThreadedFileSearcher {
    results: Arc<Mutex<ResultsMap>>,
    index: Arc<ThreadSafeIndex>,
    queue: WorkQueue,
}

impl ThreadedFileSearcher {
    pub fn new(index: Arc<ThreadSafeIndex>, queue: WorkQueue) -> Self {
        tracing::debug!("threaded file searcher initialized");
        Self {
            results: Arc::new(Mutex::new(BTreeMap::new())),
            index,
            queue,
        }
    }
}

impl SearchInterface for ThreadedFileSearcher {
    fn search_line(&mut self, line: &str, partial: bool) {
        let results = Arc::clone(&self.results);
        let index = Arc::clone(&self.index);
        let line = line.to_string();

        self.queue.execute(move || {
            let queries = tokenizer::unique_stems(&line);
            if queries.is_empty() {
                return;
            }
            let joined = tokenizer::canonical(&queries);

            {
                let mut map = results.lock();
                if map.contains_key(&joined) {
                    return;
                }
                map.insert(joined.clone(), None);
            }

            let found = index.search(&queries, partial);
            results.lock().insert(joined, Some(found));
        });
    }

    fn search_file(&mut self, path: &Path, partial: bool) -> Result<()> {
        let outcome = feed_queries(self, path, partial);
        self.queue.finish();
        outcome
    }

    fn write_results(&self, path: &Path) -> Result<()> {
        let records: BTreeMap<String, Vec<ResultRecord>> = {
            let map = self.results.lock();
            map.iter()
                .map(|(query, hits)| {
                    (query.clone(), records_for(hits.as_deref().unwrap_or_default()))
                })
                .collect()
        };
        json::write_pretty(&records, path)
    }

    fn has_query(&self, line: &str) -> bool {
        let queries = tokenizer::unique_stems(line);
        !queries.is_empty()
            && self
                .results
                .lock()
                .contains_key(&tokenizer::canonical(&queries))
    }

    fn get_results(&self, line: &str) -> Vec<SearchResult> {
        let queries = tokenizer::unique_stems(line);
        if queries.is_empty() {
            return Vec::new();
        }
        self.results
            .lock()
            .get(&tokenizer::canonical(&queries))
            .and_then(Clone::clone)
            .unwrap_or_default()
    }

    fn size(&self) -> usize {
        self.results.lock().len()
    }
}
