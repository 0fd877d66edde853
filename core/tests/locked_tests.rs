use quarry_core::{InvertedIndex, ThreadSafeIndex, WorkQueue};
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn shared_index_observers_mirror_the_plain_index() {
    let shared = ThreadSafeIndex::new();
    shared.add("red", "a.txt", 1);
    shared.add("fish", "a.txt", 2);
    shared.add("fish", "b.txt", 1);

    assert!(shared.has_stem("fish"));
    assert!(shared.has_location("b.txt"));
    assert!(shared.stem_has_location("fish", "a.txt"));
    assert!(shared.stem_at_position("red", "a.txt", 1));
    assert_eq!(shared.count_of("a.txt"), 2);
    assert_eq!(shared.counts_size(), 2);
    assert_eq!(shared.index_size(), 2);
    assert_eq!(shared.num_locations_at_stem("fish"), 2);
    assert_eq!(shared.num_stems_at_location("fish", "a.txt"), 1);
    assert_eq!(shared.num_positions_at_location_for_stem("fish", "b.txt"), 1);
    assert_eq!(shared.get_locations(), vec!["a.txt", "b.txt"]);
    assert_eq!(shared.get_stems(), vec!["fish", "red"]);
    assert_eq!(shared.get_stem_locations("fish"), vec!["a.txt", "b.txt"]);
    assert_eq!(shared.get_stem_positions_in("fish", "a.txt"), vec![2]);
}

#[test]
fn concurrent_adds_to_distinct_locations_all_land() {
    let shared = Arc::new(ThreadSafeIndex::new());
    let queue = WorkQueue::new(8);

    for worker in 0..20 {
        let shared = Arc::clone(&shared);
        queue.execute(move || {
            let location = format!("doc-{worker}.txt");
            for position in 1..=10u32 {
                shared.add("fish", &location, position);
            }
        });
    }
    queue.finish();

    assert_eq!(shared.counts_size(), 20);
    assert_eq!(shared.num_locations_at_stem("fish"), 20);
    for worker in 0..20 {
        assert_eq!(shared.count_of(&format!("doc-{worker}.txt")), 10);
    }
    queue.join();
}

#[test]
fn concurrent_merges_preserve_per_location_totals() {
    let shared = Arc::new(ThreadSafeIndex::new());
    let queue = WorkQueue::new(4);

    for worker in 0..10 {
        let shared = Arc::clone(&shared);
        queue.execute(move || {
            let mut local = InvertedIndex::new();
            let location = format!("page-{worker}");
            local.add("alpha", &location, 1);
            local.add("beta", &location, 2);
            shared.add_all(local);
        });
    }
    queue.finish();

    for worker in 0..10 {
        let location = format!("page-{worker}");
        assert_eq!(shared.count_of(&location), 2);
        assert!(shared.stem_has_location("alpha", &location));
    }
    queue.join();
}

#[test]
fn searches_observe_merged_state() {
    let shared = Arc::new(ThreadSafeIndex::new());
    let mut local = InvertedIndex::new();
    local.add("red", "a.txt", 1);
    local.add("fish", "a.txt", 2);
    shared.add_all(local);

    let query: BTreeSet<String> = ["red".to_string(), "fish".to_string()].into();
    let results = shared.search(&query, false);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].match_count, 2);
    assert_eq!(results[0].score, 1.0);

    let snapshot = shared.snapshot();
    assert_eq!(snapshot.exact_search(&query), results);
}
