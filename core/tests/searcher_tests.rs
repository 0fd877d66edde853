use quarry_core::searcher::{FileSearcher, SearchInterface, ThreadedFileSearcher};
use quarry_core::{InvertedIndex, ThreadSafeIndex, WorkQueue};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

/// `Red fish, red fish.` at a.txt.
fn red_fish_index() -> InvertedIndex {
    let mut index = InvertedIndex::new();
    for (offset, stem) in ["red", "fish", "red", "fish"].iter().enumerate() {
        index.add(stem, "a.txt", offset as u32 + 1);
    }
    index
}

#[test]
fn serial_search_memoises_by_canonical_form() {
    let index = red_fish_index();
    let mut searcher = FileSearcher::new(&index);

    searcher.search_line("red fish", false);
    searcher.search_line("fish red RED", false);
    searcher.search_line("Fish! red?", false);

    assert_eq!(searcher.size(), 1);
    assert!(searcher.has_query("FISH red"));

    let hits = searcher.get_results("red fish");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].location, "a.txt");
    assert_eq!(hits[0].match_count, 4);
}

#[test]
fn empty_query_lines_leave_no_record() {
    let index = red_fish_index();
    let mut searcher = FileSearcher::new(&index);

    searcher.search_line("", false);
    searcher.search_line("... 42 !!!", false);

    assert_eq!(searcher.size(), 0);
    assert!(!searcher.has_query(""));
    assert!(searcher.get_results("").is_empty());
}

#[test]
fn unmatched_queries_record_empty_results() {
    let index = red_fish_index();
    let mut searcher = FileSearcher::new(&index);

    searcher.search_line("heron", false);
    assert_eq!(searcher.size(), 1);
    assert!(searcher.get_results("heron").is_empty());
}

#[test]
fn threaded_duplicates_collapse_to_one_entry() {
    let shared = Arc::new(ThreadSafeIndex::new());
    shared.add_all(red_fish_index());
    let queue = WorkQueue::new(8);
    let mut searcher = ThreadedFileSearcher::new(Arc::clone(&shared), queue.clone());

    for _ in 0..100 {
        searcher.search_line("red fish", false);
    }
    queue.finish();

    assert_eq!(searcher.size(), 1);
    let hits = searcher.get_results("fish red");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].match_count, 4);
    queue.join();
}

#[test]
fn threaded_search_file_drains_the_queue() {
    let dir = tempdir().expect("tempdir");
    let queries = dir.path().join("queries.txt");
    fs::write(&queries, "red fish\nheron\n\nfish red\n").expect("write fixture");

    let shared = Arc::new(ThreadSafeIndex::new());
    shared.add_all(red_fish_index());
    let queue = WorkQueue::new(4);
    let mut searcher = ThreadedFileSearcher::new(Arc::clone(&shared), queue.clone());

    searcher.search_file(&queries, false).expect("search file");

    // no explicit finish: search_file drains before returning
    assert_eq!(searcher.size(), 2);
    assert!(searcher.has_query("red fish"));
    assert!(searcher.has_query("heron"));
    queue.join();
}

#[test]
fn missing_query_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let index = red_fish_index();
    let mut searcher = FileSearcher::new(&index);
    assert!(searcher
        .search_file(&dir.path().join("absent.txt"), false)
        .is_err());
}

#[test]
fn write_results_emits_sorted_pretty_json() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("results.json");

    let index = red_fish_index();
    let mut searcher = FileSearcher::new(&index);
    searcher.search_line("red fish", false);
    searcher.search_line("heron", false);
    searcher.write_results(&out).expect("write results");

    let written = fs::read_to_string(&out).expect("read results");
    let expected = concat!(
        "{\n",
        "  \"fish red\": [\n",
        "    {\n",
        "      \"count\": 4,\n",
        "      \"score\": \"1.00000000\",\n",
        "      \"where\": \"a.txt\"\n",
        "    }\n",
        "  ],\n",
        "  \"heron\": []\n",
        "}\n",
    );
    assert_eq!(written, expected);
}

#[test]
fn write_counts_and_index_shapes() {
    let dir = tempdir().expect("tempdir");
    let index = red_fish_index();

    let counts_path = dir.path().join("counts.json");
    index.write_counts(&counts_path).expect("write counts");
    assert_eq!(
        fs::read_to_string(&counts_path).expect("read counts"),
        "{\n  \"a.txt\": 4\n}\n"
    );

    let index_path = dir.path().join("index.json");
    index.write_index(&index_path).expect("write index");
    let expected = concat!(
        "{\n",
        "  \"fish\": {\n",
        "    \"a.txt\": [\n",
        "      2,\n",
        "      4\n",
        "    ]\n",
        "  },\n",
        "  \"red\": {\n",
        "    \"a.txt\": [\n",
        "      1,\n",
        "      3\n",
        "    ]\n",
        "  }\n",
        "}\n",
    );
    assert_eq!(fs::read_to_string(&index_path).expect("read index"), expected);
}
