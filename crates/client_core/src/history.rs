use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use shared::domain::{ChatMessage, RoomId};
use tokio::sync::Mutex;
use tracing::info;

use crate::{api::ChatApi, error::ClientResult};

#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(&self, room: &RoomId) -> ClientResult<Vec<ChatMessage>>;
}

#[async_trait]
impl HistorySource for ChatApi {
    async fn fetch_history(&self, room: &RoomId) -> ClientResult<Vec<ChatMessage>> {
        Ok(match room {
            RoomId::Conversation(id) => self
                .conversation_messages(id)
                .await?
                .into_iter()
                .map(ChatMessage::Direct)
                .collect(),
            RoomId::Group(id) => self
                .group_messages(id)
                .await?
                .into_iter()
                .map(ChatMessage::Group)
                .collect(),
        })
    }
}

type Entry = Arc<Mutex<Option<Vec<ChatMessage>>>>;

/// A successful load, tied to the cache entry that served it.
pub struct LoadedHistory {
    pub messages: Vec<ChatMessage>,
    entry: Entry,
}

impl LoadedHistory {
    /// Replaces the entry this load came from. Once the room has been
    /// invalidated that entry is detached, so the write never reaches the
    /// cache.
    pub async fn write_back(&self, messages: Vec<ChatMessage>) {
        *self.entry.lock().await = Some(messages);
    }
}

/// Per-room history that never goes stale: fetched once, kept until
/// [`HistoryCache::invalidate`]. Concurrent loads of one room share a single
/// fetch; failures are not cached.
pub struct HistoryCache {
    source: Arc<dyn HistorySource>,
    entries: Mutex<HashMap<RoomId, Entry>>,
}

impl HistoryCache {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn entry(&self, room: &RoomId) -> Entry {
        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry(room.clone()).or_default())
    }

    pub async fn load(&self, room: &RoomId) -> ClientResult<Vec<ChatMessage>> {
        Ok(self.load_entry(room).await?.messages)
    }

    pub async fn load_entry(&self, room: &RoomId) -> ClientResult<LoadedHistory> {
        let entry = self.entry(room).await;
        let messages = {
            let mut slot = entry.lock().await;
            match slot.as_ref() {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.source.fetch_history(room).await?;
                    info!(room = %room, count = fetched.len(), "history: fetched");
                    *slot = Some(fetched.clone());
                    fetched
                }
            }
        };
        Ok(LoadedHistory { messages, entry })
    }

    pub async fn cached(&self, room: &RoomId) -> Option<Vec<ChatMessage>> {
        let entry = self.entries.lock().await.get(room).cloned()?;
        let slot = entry.lock().await;
        slot.clone()
    }

    /// Writes a live message into an already-loaded entry, replacing any
    /// record with the same id. No-op when the room was never loaded.
    pub async fn upsert(&self, room: &RoomId, message: ChatMessage) {
        let Some(entry) = self.entries.lock().await.get(room).cloned() else {
            return;
        };
        let mut slot = entry.lock().await;
        if let Some(messages) = slot.as_mut() {
            match messages.iter_mut().find(|existing| existing.id() == message.id()) {
                Some(existing) => *existing = message,
                None => messages.push(message),
            }
        }
    }

    pub async fn invalidate(&self, room: &RoomId) {
        if self.entries.lock().await.remove(room).is_some() {
            info!(room = %room, "history: invalidated");
        }
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
