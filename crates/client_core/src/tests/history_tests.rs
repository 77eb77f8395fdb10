use super::*;
use crate::{error::ClientError, test_support::direct};
use shared::{domain::ConversationId, error::ApiError};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

struct CountingSource {
    calls: AtomicUsize,
    fail_first: usize,
    delay: Duration,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            delay: Duration::ZERO,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for CountingSource {
    async fn fetch_history(&self, room: &RoomId) -> ClientResult<Vec<ChatMessage>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if call < self.fail_first {
            return Err(ClientError::Api(ApiError::new(503, "unavailable")));
        }
        Ok(vec![direct(room.as_str(), "m-1", 10, None)])
    }
}

fn room() -> RoomId {
    RoomId::Conversation(ConversationId::from("c-1"))
}

#[tokio::test]
async fn second_load_is_served_from_cache() {
    let source = Arc::new(CountingSource::new());
    let cache = HistoryCache::new(source.clone());

    let first = cache.load(&room()).await.expect("first");
    let second = cache.load(&room()).await.expect("second");

    assert_eq!(first, second);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_loads_share_one_fetch() {
    let mut source = CountingSource::new();
    source.delay = Duration::from_millis(200);
    let source = Arc::new(source);
    let cache = Arc::new(HistoryCache::new(source.clone()));

    let a = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.load(&room()).await }
    });
    let b = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.load(&room()).await }
    });

    assert_eq!(a.await.expect("join a").expect("load a").len(), 1);
    assert_eq!(b.await.expect("join b").expect("load b").len(), 1);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let mut source = CountingSource::new();
    source.fail_first = 1;
    let source = Arc::new(source);
    let cache = HistoryCache::new(source.clone());

    let err = cache.load(&room()).await.expect_err("first load fails");
    assert!(matches!(err, ClientError::Api(_)));
    assert!(cache.cached(&room()).await.is_none());

    cache.load(&room()).await.expect("retry succeeds");
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn invalidate_forces_a_refetch() {
    let source = Arc::new(CountingSource::new());
    let cache = HistoryCache::new(source.clone());

    cache.load(&room()).await.expect("load");
    cache.invalidate(&room()).await;
    cache.load(&room()).await.expect("reload");

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn upsert_updates_loaded_entries_only() {
    let source = Arc::new(CountingSource::new());
    let cache = HistoryCache::new(source.clone());

    cache.upsert(&room(), direct("c-1", "m-2", 20, None)).await;
    assert!(cache.cached(&room()).await.is_none());

    cache.load(&room()).await.expect("load");
    cache.upsert(&room(), direct("c-1", "m-2", 20, None)).await;
    cache.upsert(&room(), direct("c-1", "m-2", 20, None)).await;

    let cached = cache.cached(&room()).await.expect("cached");
    let ids: Vec<_> = cached.iter().map(|m| m.id().as_str()).collect();
    assert_eq!(ids, vec!["m-1", "m-2"]);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn write_back_after_invalidate_does_not_repopulate() {
    let source = Arc::new(CountingSource::new());
    let cache = HistoryCache::new(source.clone());

    let loaded = cache.load_entry(&room()).await.expect("load");
    cache.invalidate(&room()).await;
    loaded
        .write_back(vec![
            direct("c-1", "m-1", 10, None),
            direct("c-1", "m-9", 90, None),
        ])
        .await;
    assert!(cache.cached(&room()).await.is_none());

    let reloaded = cache.load(&room()).await.expect("reload");
    let ids: Vec<_> = reloaded.iter().map(|m| m.id().as_str()).collect();
    assert_eq!(ids, vec!["m-1"]);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn write_back_replaces_the_live_entry() {
    let source = Arc::new(CountingSource::new());
    let cache = HistoryCache::new(source.clone());

    let loaded = cache.load_entry(&room()).await.expect("load");
    loaded
        .write_back(vec![
            direct("c-1", "m-1", 10, None),
            direct("c-1", "m-2", 20, None),
        ])
        .await;

    let cached = cache.cached(&room()).await.expect("cached");
    assert_eq!(cached.len(), 2);
    assert_eq!(source.calls(), 1);
}
