use crate::builder;
use crate::html::{self, Fetcher};
use crate::index::InvertedIndex;
use crate::locked::ThreadSafeIndex;
use crate::queue::WorkQueue;
use crate::Position;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Bounded breadth-first crawler. Every fetched page is tokenized into a
/// fresh local index keyed by its fragment-stripped URL and merged into the
/// shared index; discovered links compete for the remaining admission
/// budget.
pub struct WebCrawler {
    seed: Url,
    shared: Arc<CrawlShared>,
}

struct CrawlShared {
    index: Arc<ThreadSafeIndex>,
    queue: WorkQueue,
    fetcher: Box<dyn Fetcher>,
    // One lock covers both the processed set and the budget: admission has
    // to check and update them together or concurrent discoveries could
    // admit past the cap.
    state: Mutex<CrawlState>,
}

#[derive(Default)]
struct CrawlState {
    processed: HashSet<String>,
    remaining: usize,
}

impl WebCrawler {
    pub fn new(
        seed: Url,
        index: Arc<ThreadSafeIndex>,
        queue: WorkQueue,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        Self {
            seed,
            shared: Arc::new(CrawlShared {
                index,
                queue,
                fetcher,
                state: Mutex::new(CrawlState::default()),
            }),
        }
    }

    /// Crawl from the seed. `crawls` is a hard cap on the number of distinct
    /// URLs admitted over the whole crawl, the seed included. Returns once
    /// every admitted page has been processed.
    pub fn crawl(&self, crawls: usize) {
        let mut seed = self.seed.clone();
        seed.set_fragment(None);

        {
            let mut state = self.shared.state.lock();
            state.remaining = crawls.saturating_sub(1);
            state.processed.insert(seed.to_string());
        }

        tracing::info!(seed = %seed, crawls, "starting crawl");
        let shared = Arc::clone(&self.shared);
        self.shared.queue.execute(move || process_page(seed, &shared));
        self.shared.queue.finish();
    }

    /// The URLs admitted so far.
    pub fn processed_urls(&self) -> Vec<String> {
        self.shared.state.lock().processed.iter().cloned().collect()
    }
}

fn process_page(url: Url, shared: &Arc<CrawlShared>) {
    let Some(page) = shared.fetcher.fetch(&url) else {
        tracing::debug!(%url, "fetch failed, skipping");
        return;
    };

    for link in html::extract_links(&url, &page) {
        // Admission: not yet processed and budget left, checked and applied
        // atomically per link, enqueue included.
        let mut state = shared.state.lock();
        if state.remaining > 0 && !state.processed.contains(link.as_str()) {
            state.processed.insert(link.to_string());
            state.remaining -= 1;
            let next = Arc::clone(shared);
            shared.queue.execute(move || process_page(link, &next));
        }
    }

    let location = url.to_string();
    let text = html::extract_text(&page);
    let mut local = InvertedIndex::new();
    let mut next_position: Position = 1;
    for line in text.lines() {
        builder::index_line(line, &location, &mut local, &mut next_position);
    }
    shared.index.add_all(local);
}
