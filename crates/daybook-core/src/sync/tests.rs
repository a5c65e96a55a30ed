use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;
use crate::cache::{Clock, ManualClock, PageCursor};
use crate::models::{EntryDraft, LogEntry};
use crate::remote::{MemorySource, Pagination};

type EntrySync = ListSync<LogEntry, MemorySource<LogEntry>>;

struct Harness {
    sync: Arc<EntrySync>,
    source: Arc<MemorySource<LogEntry>>,
    clock: ManualClock,
}

fn harness(source: MemorySource<LogEntry>, options: ListOptions) -> Harness {
    let clock = ManualClock::new(1_700_000_000_000);
    let store = CacheStore::new(Arc::new(clock.clone()));
    let source = Arc::new(source);
    let sync = ListSync::new(
        store,
        Arc::clone(&source),
        CollectionKey::entries(),
        options,
    );
    Harness {
        sync: Arc::new(sync),
        source,
        clock,
    }
}

fn entry(id: &str) -> LogEntry {
    LogEntry::from_draft(ItemId::from(id), &EntryDraft::new(format!("entry {id}")), 0)
}

fn entries(count: usize) -> Vec<LogEntry> {
    (1..=count).map(|n| entry(&format!("i{n}"))).collect()
}

fn page(items: Vec<LogEntry>, has_more: bool) -> Page<LogEntry> {
    Page::paged(
        items,
        Pagination {
            page: 1,
            limit: 20,
            total: None,
            has_more,
        },
    )
}

fn ids(items: &[LogEntry]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

fn requested_pages(source: &MemorySource<LogEntry>) -> Vec<u32> {
    source.requests().iter().map(|query| query.page).collect()
}

async fn wait_for_requests(source: &MemorySource<LogEntry>, count: usize) {
    while source.fetch_count() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn initial_load_sets_cursor_past_first_page() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.source
        .script_fetch(Ok(page(vec![entry("i1"), entry("i2")], true)));

    let outcome = h.sync.load_initial().await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Fetched {
            received: 2,
            added: 2
        }
    );

    let cached = h.sync.entry();
    assert_eq!(ids(&cached.items), vec!["i1", "i2"]);
    assert_eq!(cached.loaded_page, 2);
    assert!(cached.has_more);
    assert!(!cached.loading);
    assert_eq!(cached.last_fetch, Some(h.clock.now_millis()));
}

#[tokio::test]
async fn load_more_appends_only_unseen_items() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.store().set(
        &CollectionKey::entries(),
        vec![entry("i1"), entry("i2")],
        false,
        Some(PageCursor {
            loaded_page: 2,
            has_more: true,
        }),
    );
    h.source
        .script_fetch(Ok(page(vec![entry("i2"), entry("i3")], false)));

    let outcome = h.sync.load_more().await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Fetched {
            received: 2,
            added: 1
        }
    );
    assert_eq!(requested_pages(&h.source), vec![2]);

    let cached = h.sync.entry();
    assert_eq!(ids(&cached.items), vec!["i1", "i2", "i3"]);
    assert!(!cached.has_more);
}

#[tokio::test]
async fn fresh_cache_is_served_without_a_request() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.store().set(
        &CollectionKey::entries(),
        vec![entry("i1"), entry("i2")],
        false,
        Some(PageCursor {
            loaded_page: 2,
            has_more: true,
        }),
    );

    assert_eq!(h.sync.load_initial().await.unwrap(), SyncOutcome::FromCache);
    assert_eq!(h.source.fetch_count(), 0);

    let view = h.sync.view();
    assert_eq!(ids(&view.items), vec!["i1", "i2"]);
    assert_eq!(h.sync.entry().loaded_page, 2);
}

#[tokio::test]
async fn stale_cache_is_refetched() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(3)),
        ListOptions::default(),
    );
    h.sync.load_initial().await.unwrap();
    assert_eq!(h.source.fetch_count(), 1);

    h.clock.advance(LIST_MAX_AGE);
    assert_eq!(h.sync.load_initial().await.unwrap(), SyncOutcome::FromCache);

    h.clock.advance(Duration::from_millis(1));
    assert!(matches!(
        h.sync.load_initial().await.unwrap(),
        SyncOutcome::Fetched { .. }
    ));
    assert_eq!(h.source.fetch_count(), 2);
}

#[tokio::test]
async fn empty_cache_is_never_served_even_when_fresh() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.load_initial().await.unwrap();
    h.sync.load_initial().await.unwrap();
    assert_eq!(h.source.fetch_count(), 2);
}

#[tokio::test]
async fn refresh_bypasses_freshness() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(2)),
        ListOptions::default(),
    );
    h.sync.load_initial().await.unwrap();
    h.source.push_front(&key, entry("new"));

    h.sync.refresh().await.unwrap();
    assert_eq!(ids(&h.sync.view().items), vec!["new", "i1", "i2"]);
    assert_eq!(h.source.fetch_count(), 2);
}

#[test]
fn optimistic_insert_is_idempotent_by_id() {
    let h = harness(MemorySource::new(), ListOptions::default());
    let mut first = entry("x");
    first.content = "a".to_string();
    let mut second = entry("x");
    second.content = "b".to_string();

    h.sync.insert_optimistic(first);
    h.sync.insert_optimistic(second);

    let items = h.sync.view().items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "b");
}

#[test]
fn optimistic_update_and_remove() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.insert_optimistic(entry("a"));
    h.sync.insert_optimistic(entry("b"));

    let mut edited = entry("a");
    edited.content = "edited".to_string();
    h.sync.update_optimistic(edited);
    h.sync.update_optimistic(entry("ghost"));
    h.sync.remove_optimistic(&ItemId::from("b"));
    h.sync.remove_optimistic(&ItemId::from("ghost"));

    let items = h.sync.view().items;
    assert_eq!(ids(&items), vec!["a"]);
    assert_eq!(items[0].content, "edited");
}

#[tokio::test]
async fn pages_are_requested_in_strictly_increasing_order() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(5)),
        ListOptions::default().with_page_size(2),
    );

    h.sync.load_initial().await.unwrap();
    h.sync.load_more().await.unwrap();
    h.sync.load_more().await.unwrap();
    assert_eq!(
        h.sync.load_more().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::Exhausted)
    );

    assert_eq!(requested_pages(&h.source), vec![1, 2, 3]);
    let cached = h.sync.entry();
    assert_eq!(ids(&cached.items), vec!["i1", "i2", "i3", "i4", "i5"]);
    assert!(!cached.has_more);
}

#[tokio::test]
async fn single_page_result_exhausts_immediately() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.source
        .script_fetch(Ok(Page::complete(vec![entry("i1"), entry("i2")])));

    h.sync.load_initial().await.unwrap();
    let cached = h.sync.entry();
    assert_eq!(cached.loaded_page, 1);
    assert!(!cached.has_more);
    assert_eq!(
        h.sync.on_near_end().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::Exhausted)
    );
}

#[tokio::test]
async fn duplicate_ids_within_a_page_are_dropped() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.source.script_fetch(Ok(page(
        vec![entry("a"), entry("b"), entry("a")],
        false,
    )));

    let outcome = h.sync.load_initial().await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Fetched {
            received: 3,
            added: 2
        }
    );
    assert_eq!(ids(&h.sync.view().items), vec!["a", "b"]);
}

#[tokio::test]
async fn failed_fetch_leaves_cache_untouched() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(5)),
        ListOptions::default().with_page_size(2),
    );
    h.sync.load_initial().await.unwrap();
    let before = h.sync.entry();

    h.source.fail_next(SyncError::Network("connection reset".into()));
    let error = h.sync.load_more().await.unwrap_err();
    assert!(error.is_retryable());

    let after = h.sync.entry();
    assert_eq!(after, before);
    assert_eq!(h.sync.phase(), SyncPhase::Idle);

    // The same page is requested again once the network is back.
    h.sync.load_more().await.unwrap();
    assert_eq!(requested_pages(&h.source), vec![1, 2, 2]);
    assert_eq!(h.sync.entry().items.len(), 4);
}

#[tokio::test]
async fn auth_failure_is_reported_distinctly() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.source
        .fail_next(SyncError::Auth("session expired (401)".into()));

    let error = h.sync.refresh().await.unwrap_err();
    assert!(error.is_auth());
    assert!(!error.is_retryable());
    assert!(!h.sync.view().is_loading);
}

#[tokio::test]
async fn empty_page_with_more_pages_moves_the_cursor_on() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(2)),
        ListOptions::default().with_page_size(1),
    );
    h.sync.load_initial().await.unwrap();
    h.source.script_fetch(Ok(page(Vec::new(), true)));

    assert_eq!(
        h.sync.load_more().await.unwrap(),
        SyncOutcome::Fetched {
            received: 0,
            added: 0
        }
    );
    assert_eq!(h.sync.entry().loaded_page, 3);

    h.sync.load_more().await.unwrap();
    assert_eq!(requested_pages(&h.source), vec![1, 2, 3]);
}

#[tokio::test]
async fn empty_last_page_ends_paging_without_moving_the_cursor() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(2)),
        ListOptions::default().with_page_size(1),
    );
    h.sync.load_initial().await.unwrap();
    h.source.script_fetch(Ok(page(Vec::new(), false)));

    assert_eq!(
        h.sync.load_more().await.unwrap(),
        SyncOutcome::Fetched {
            received: 0,
            added: 0
        }
    );
    let entry = h.sync.entry();
    assert_eq!(entry.loaded_page, 2);
    assert!(!entry.has_more);
    assert_eq!(ids(&entry.items), vec!["i1"]);

    assert_eq!(
        h.sync.load_more().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::Exhausted)
    );
    assert_eq!(requested_pages(&h.source), vec![1, 2]);
}

fn assert_unique(sync: &EntrySync) {
    let items = sync.entry().items;
    let unique: HashSet<&ItemId> = items.iter().map(|item| &item.id).collect();
    assert_eq!(unique.len(), items.len(), "duplicate ids in {:?}", ids(&items));
}

#[tokio::test]
async fn ids_stay_unique_across_mixed_operations() {
    let h = harness(MemorySource::new(), ListOptions::default());

    h.sync.insert_optimistic(entry("a"));
    assert_unique(&h.sync);

    h.source.script_fetch(Ok(page(
        vec![entry("a"), entry("b"), entry("b"), entry("c")],
        true,
    )));
    h.sync.load_initial().await.unwrap();
    assert_unique(&h.sync);
    assert_eq!(ids(&h.sync.entry().items), vec!["a", "b", "c"]);

    h.sync.insert_optimistic(entry("d"));
    h.sync.insert_optimistic(entry("b"));
    assert_unique(&h.sync);

    h.source
        .script_fetch(Ok(page(vec![entry("c"), entry("d"), entry("e")], true)));
    h.sync.load_more().await.unwrap();
    assert_unique(&h.sync);
    assert_eq!(ids(&h.sync.entry().items), vec!["d", "a", "b", "c", "e"]);

    h.sync.insert_optimistic(entry("f"));
    h.source.script_fetch(Ok(page(
        vec![entry("f"), entry("e"), entry("g"), entry("g")],
        false,
    )));
    h.sync.load_more().await.unwrap();
    assert_unique(&h.sync);
    assert_eq!(
        ids(&h.sync.entry().items),
        vec!["f", "d", "a", "b", "c", "e", "g"]
    );

    h.source.script_fetch(Ok(page(
        vec![entry("g"), entry("a"), entry("a"), entry("h")],
        true,
    )));
    h.sync.refresh().await.unwrap();
    assert_unique(&h.sync);
    assert_eq!(ids(&h.sync.entry().items), vec!["g", "a", "h"]);

    h.sync.insert_optimistic(entry("h"));
    assert_unique(&h.sync);
}

#[tokio::test]
async fn load_more_before_initial_load_is_skipped() {
    let h = harness(MemorySource::new(), ListOptions::default());
    assert_eq!(
        h.sync.load_more().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::NotLoaded)
    );
    assert_eq!(h.source.fetch_count(), 0);
}

#[tokio::test]
async fn triggers_while_fetching_are_dropped() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(3)),
        ListOptions::default(),
    );
    h.source.pause();

    let task = tokio::spawn({
        let sync = Arc::clone(&h.sync);
        async move { sync.load_initial().await }
    });
    wait_for_requests(&h.source, 1).await;

    let view = h.sync.view();
    assert!(view.is_loading);
    assert!(!view.is_loading_more);
    assert_eq!(h.sync.phase(), SyncPhase::Loading);

    assert_eq!(
        h.sync.refresh().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::InFlight)
    );
    assert_eq!(
        h.sync.load_more().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::InFlight)
    );
    assert_eq!(
        h.sync.on_pull_past_threshold(false).await.unwrap(),
        SyncOutcome::Skipped(SkipReason::InFlight)
    );

    h.source.resume();
    let outcome = task.await.unwrap().unwrap();
    assert!(matches!(outcome, SyncOutcome::Fetched { added: 3, .. }));
    assert_eq!(h.source.fetch_count(), 1);
    assert_eq!(h.sync.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn view_reports_loading_more_separately() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(4)),
        ListOptions::default().with_page_size(2),
    );
    h.sync.load_initial().await.unwrap();
    h.source.pause();

    let task = tokio::spawn({
        let sync = Arc::clone(&h.sync);
        async move { sync.on_near_end().await }
    });
    wait_for_requests(&h.source, 2).await;

    let view = h.sync.view();
    assert!(view.is_loading_more);
    assert!(!view.is_loading);
    assert!(!view.is_refreshing);
    assert_eq!(view.items.len(), 2);

    h.source.resume();
    task.await.unwrap().unwrap();
    let view = h.sync.view();
    assert!(!view.is_loading_more);
    assert_eq!(view.items.len(), 4);
}

#[tokio::test]
async fn search_change_discards_older_response() {
    let key = CollectionKey::entries();
    let mut park = entry("park");
    park.content = "Walk in the park".to_string();
    let h = harness(
        MemorySource::new().with_items(&key, vec![park, entry("a"), entry("b")]),
        ListOptions::default(),
    );
    h.source.pause();

    let unfiltered = tokio::spawn({
        let sync = Arc::clone(&h.sync);
        async move { sync.load_initial().await }
    });
    wait_for_requests(&h.source, 1).await;

    let filtered = tokio::spawn({
        let sync = Arc::clone(&h.sync);
        async move { sync.set_search_query(Some("PARK".to_string())).await }
    });
    wait_for_requests(&h.source, 2).await;

    h.source.resume();
    assert_eq!(unfiltered.await.unwrap().unwrap(), SyncOutcome::Superseded);
    assert!(matches!(
        filtered.await.unwrap().unwrap(),
        SyncOutcome::Fetched { added: 1, .. }
    ));

    let cached = h.sync.entry();
    assert_eq!(ids(&cached.items), vec!["park"]);
    assert_eq!(cached.query.as_deref(), Some("PARK"));
    assert!(!cached.loading);
    assert_eq!(h.source.requests()[1].search.as_deref(), Some("PARK"));
}

#[tokio::test]
async fn filtered_results_are_never_reused_as_unfiltered() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(3)),
        ListOptions::default().with_search("i1"),
    );
    assert_eq!(h.sync.search_query().as_deref(), Some("i1"));

    h.sync.load_initial().await.unwrap();
    h.sync.load_initial().await.unwrap();
    assert_eq!(h.source.fetch_count(), 2);
    assert_eq!(ids(&h.sync.view().items), vec!["i1"]);

    h.sync.set_search_query(Some("   ".to_string())).await.unwrap();
    assert_eq!(h.sync.search_query(), None);
    assert_eq!(h.sync.entry().items.len(), 3);
    assert_eq!(h.sync.load_initial().await.unwrap(), SyncOutcome::FromCache);
    assert_eq!(h.source.fetch_count(), 3);
}

#[tokio::test]
async fn clear_during_fetch_discards_the_response() {
    let key = CollectionKey::entries();
    let h = harness(
        MemorySource::new().with_items(&key, entries(3)),
        ListOptions::default(),
    );
    h.source.pause();

    let task = tokio::spawn({
        let sync = Arc::clone(&h.sync);
        async move { sync.load_initial().await }
    });
    wait_for_requests(&h.source, 1).await;
    h.sync.store().clear(None);
    h.source.resume();

    assert_eq!(task.await.unwrap().unwrap(), SyncOutcome::Superseded);
    assert_eq!(h.sync.entry(), CacheEntry::default());
}

#[tokio::test]
async fn gesture_entry_points_apply_suppression() {
    let h = harness(MemorySource::new(), ListOptions::default());
    assert_eq!(
        h.sync.on_pull_past_threshold(true).await.unwrap(),
        SyncOutcome::Skipped(SkipReason::InputFocused)
    );
    assert_eq!(
        h.sync.on_near_end().await.unwrap(),
        SyncOutcome::Skipped(SkipReason::Empty)
    );
    assert_eq!(h.source.fetch_count(), 0);

    assert!(matches!(
        h.sync.on_pull_past_threshold(false).await.unwrap(),
        SyncOutcome::Fetched { .. }
    ));
}

#[tokio::test]
async fn confirmed_mutations_follow_the_server() {
    let h = harness(MemorySource::new(), ListOptions::default());
    let key = CollectionKey::entries();

    let created = h.sync.create(&EntryDraft::new("first")).await.unwrap();
    assert_eq!(ids(&h.sync.view().items), vec![created.id.as_str()]);

    let updated = h
        .sync
        .update(&created.id, &EntryDraft::new("second"))
        .await
        .unwrap();
    assert_eq!(h.sync.view().items, vec![updated.clone()]);
    assert_eq!(h.source.items(&key), vec![updated]);

    h.sync.delete(&created.id).await.unwrap();
    assert!(h.sync.view().items.is_empty());
    assert!(h.source.items(&key).is_empty());
}

#[tokio::test]
async fn failed_mutation_leaves_cache_untouched() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.insert_optimistic(entry("a"));

    h.source.fail_next(SyncError::Network("offline".into()));
    assert!(h.sync.delete(&ItemId::from("a")).await.is_err());
    assert_eq!(ids(&h.sync.view().items), vec!["a"]);

    assert!(h
        .sync
        .update(&ItemId::from("a"), &EntryDraft::new("nope"))
        .await
        .is_err());
    assert_eq!(h.sync.view().items[0].content, "entry a");
}

#[tokio::test]
async fn optimistic_create_swaps_placeholder_for_server_record() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.insert_optimistic(entry("old"));

    let created = h
        .sync
        .create_optimistic(&EntryDraft::new("hello"))
        .await
        .unwrap();
    let items = h.sync.view().items;
    assert_eq!(ids(&items), vec![created.id.as_str(), "old"]);
    assert_eq!(items[0], created);
}

#[tokio::test]
async fn optimistic_create_is_withdrawn_on_failure() {
    let h = harness(MemorySource::new(), ListOptions::default());
    h.sync.insert_optimistic(entry("old"));
    h.source.fail_next(SyncError::Api("content is required (400)".into()));

    assert!(h
        .sync
        .create_optimistic(&EntryDraft::new("hello"))
        .await
        .is_err());
    assert_eq!(ids(&h.sync.view().items), vec!["old"]);
}

#[test]
fn recent_options_use_short_window() {
    let options = ListOptions::recent();
    assert_eq!(options.page_size, RECENT_LIMIT);
    assert_eq!(options.max_age, RECENT_MAX_AGE);

    let config = ClientConfig {
        page_size: 50,
        recent_max_age_secs: 30,
        ..ClientConfig::default()
    };
    assert_eq!(ListOptions::from_config(&config).page_size, 50);
    let recent = ListOptions::recent_from_config(&config);
    assert_eq!(recent.page_size, RECENT_LIMIT);
    assert_eq!(recent.max_age, Duration::from_secs(30));
}
