use clap::Parser;
use quarry_core::builder;
use quarry_core::crawler::WebCrawler;
use quarry_core::html::HttpFetcher;
use quarry_core::queue::DEFAULT_THREADS;
use quarry_core::searcher::{FileSearcher, SearchInterface, ThreadedFileSearcher};
use quarry_core::{InvertedIndex, ThreadSafeIndex, WorkQueue};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Ranked inverted-index search over text trees or crawled sites", long_about = None)]
struct Args {
    /// Build the index from a text file or directory tree
    #[arg(long)]
    text: Option<PathBuf>,

    /// Crawl into the index starting from this seed URL
    #[arg(long)]
    html: Option<String>,

    /// Maximum number of pages to admit during a crawl
    #[arg(long, default_value_t = 1)]
    crawl: usize,

    /// File with one search query per line
    #[arg(long)]
    query: Option<PathBuf>,

    /// Match indexed stems by prefix instead of exactly
    #[arg(long, default_value_t = false)]
    partial: bool,

    /// Worker thread count; selects the threaded pipeline even when crawling
    /// is off
    #[arg(long, num_args = 0..=1, default_missing_value = "5")]
    threads: Option<usize>,

    /// Write per-location stem counts to this file
    #[arg(long, num_args = 0..=1, default_missing_value = "counts.json")]
    counts: Option<PathBuf>,

    /// Write the inverted index to this file
    #[arg(long, num_args = 0..=1, default_missing_value = "index.json")]
    index: Option<PathBuf>,

    /// Write ranked search results to this file
    #[arg(long, num_args = 0..=1, default_missing_value = "results.json")]
    results: Option<PathBuf>,
}

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let start = Instant::now();

    // A requested thread count or a crawl selects the shared-index pipeline;
    // otherwise everything runs on this thread.
    if args.threads.is_some() || args.html.is_some() {
        run_threaded(&args);
    } else {
        run_serial(&args);
    }

    println!("Elapsed: {:.6} seconds", start.elapsed().as_secs_f64());
}

fn run_serial(args: &Args) {
    let mut index = InvertedIndex::new();

    if let Some(path) = &args.text {
        if let Err(error) = builder::build(path, &mut index) {
            tracing::debug!(%error, "build failed");
            eprintln!("Error: invalid file");
        }
    }

    let mut searcher = FileSearcher::new(&index);
    if let Some(path) = &args.query {
        if let Err(error) = searcher.search_file(path, args.partial) {
            tracing::debug!(%error, "query stage failed");
            eprintln!("Error: invalid query file");
        }
    }

    if let Some(path) = &args.counts {
        if index.write_counts(path).is_err() {
            eprintln!("Error: unable to write counts");
        }
    }

    if let Some(path) = &args.index {
        if index.write_index(path).is_err() {
            eprintln!("Error: unable to write index");
        }
    }

    if let Some(path) = &args.results {
        if searcher.write_results(path).is_err() {
            eprintln!("Error: unable to write results");
        }
    }
}

fn run_threaded(args: &Args) {
    let threads = match args.threads {
        Some(threads) if threads >= 1 => threads,
        _ => DEFAULT_THREADS,
    };
    let queue = WorkQueue::new(threads);
    let index = Arc::new(ThreadSafeIndex::new());

    if let Some(path) = &args.text {
        if let Err(error) = builder::build_threaded(path, &index, &queue) {
            tracing::debug!(%error, "build failed");
            eprintln!("Error: invalid file");
        }
    }

    if let Some(seed) = &args.html {
        match Url::parse(seed) {
            Ok(seed) => match HttpFetcher::new() {
                Ok(fetcher) => {
                    let crawler = WebCrawler::new(
                        seed,
                        Arc::clone(&index),
                        queue.clone(),
                        Box::new(fetcher),
                    );
                    crawler.crawl(args.crawl);
                }
                Err(error) => eprintln!("Error: unable to start fetcher: {error}"),
            },
            Err(_) => eprintln!("Error: invalid seed URL"),
        }
    }

    let mut searcher = ThreadedFileSearcher::new(Arc::clone(&index), queue.clone());
    if let Some(path) = &args.query {
        if let Err(error) = searcher.search_file(path, args.partial) {
            tracing::debug!(%error, "query stage failed");
            eprintln!("Error: invalid query file");
        }
    }

    queue.shutdown();

    if let Some(path) = &args.counts {
        if index.write_counts(path).is_err() {
            eprintln!("Error: unable to write counts");
        }
    }

    if let Some(path) = &args.index {
        if index.write_index(path).is_err() {
            eprintln!("Error: unable to write index");
        }
    }

    if let Some(path) = &args.results {
        if searcher.write_results(path).is_err() {
            eprintln!("Error: unable to write results");
        }
    }

    queue.join();
}
