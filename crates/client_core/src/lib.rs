use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{Conversation, ConversationId, Group, GroupId, RoomId, User};
use tokio::sync::Mutex;
use tracing::info;

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod history;
pub mod membership;
pub mod roster;
pub mod timeline;
pub mod transport;
pub mod types;
pub mod typing;
pub mod view;

#[cfg(test)]
mod test_support;

pub use api::ChatApi;
pub use config::ClientConfig;
pub use draft::DraftState;
pub use error::{ClientError, ClientResult};
pub use history::{HistoryCache, HistorySource, LoadedHistory};
pub use transport::{Transport, WsTransport};
pub use types::{DisplayMessage, LoadState, PresenceChange, ReplyPreview, RoomSnapshot, ViewEvent};
pub use view::{RoomView, ViewContext};

/// Conversation/group list fetch used by [`ChatClient`]; [`ChatApi`] in
/// production.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn conversations(&self) -> ClientResult<Vec<Conversation>>;
    async fn groups(&self) -> ClientResult<Vec<Group>>;
}

#[async_trait]
impl DirectorySource for ChatApi {
    async fn conversations(&self) -> ClientResult<Vec<Conversation>> {
        ChatApi::conversations(self).await
    }

    async fn groups(&self) -> ClientResult<Vec<Group>> {
        ChatApi::groups(self).await
    }
}

/// One signed-in client session. Owns the realtime transport and the
/// never-stale caches; every room view is mounted from here.
pub struct ChatClient {
    ctx: ViewContext,
    directory: Arc<dyn DirectorySource>,
    conversations: Mutex<Option<Vec<Conversation>>>,
    groups: Mutex<Option<Vec<Group>>>,
}

impl ChatClient {
    /// Connects the realtime transport described by `config` for an
    /// already-authenticated `api`.
    pub async fn connect(config: &ClientConfig, api: ChatApi, user: User) -> ClientResult<Self> {
        let cookie = api.session_cookie(&config.socket_url);
        let transport = WsTransport::connect(
            &config.socket_url,
            &config.socket_path,
            config.event_buffer,
            cookie.as_deref(),
        )
        .await?;
        let api = Arc::new(api);
        info!(user = %user.id, "client: session started");
        Ok(Self::with_parts(config, transport, api.clone(), api, user))
    }

    pub fn with_parts(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        history: Arc<dyn HistorySource>,
        directory: Arc<dyn DirectorySource>,
        user: User,
    ) -> Self {
        Self {
            ctx: ViewContext {
                transport,
                history: Arc::new(HistoryCache::new(history)),
                user,
                typing_stop_delay: config.typing_stop_delay(),
                event_buffer: config.event_buffer,
            },
            directory,
            conversations: Mutex::new(None),
            groups: Mutex::new(None),
        }
    }

    pub fn user(&self) -> &User {
        &self.ctx.user
    }

    pub fn open_room(&self, room: RoomId) -> RoomView {
        RoomView::mount(&self.ctx, room)
    }

    pub fn open_conversation(&self, id: ConversationId) -> RoomView {
        self.open_room(RoomId::Conversation(id))
    }

    pub fn open_group(&self, id: GroupId) -> RoomView {
        self.open_room(RoomId::Group(id))
    }

    pub async fn conversations(&self) -> ClientResult<Vec<Conversation>> {
        let mut cached = self.conversations.lock().await;
        if let Some(list) = cached.as_ref() {
            return Ok(list.clone());
        }
        let list = self.directory.conversations().await?;
        *cached = Some(list.clone());
        Ok(list)
    }

    pub async fn groups(&self) -> ClientResult<Vec<Group>> {
        let mut cached = self.groups.lock().await;
        if let Some(list) = cached.as_ref() {
            return Ok(list.clone());
        }
        let list = self.directory.groups().await?;
        *cached = Some(list.clone());
        Ok(list)
    }

    pub async fn find_conversation(&self, id: &ConversationId) -> ClientResult<Conversation> {
        self.conversations()
            .await?
            .into_iter()
            .find(|conversation| &conversation.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("conversation {id}")))
    }

    pub async fn find_group(&self, id: &GroupId) -> ClientResult<Group> {
        self.groups()
            .await?
            .into_iter()
            .find(|group| &group.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("group {id}")))
    }

    pub async fn invalidate_history(&self, room: &RoomId) {
        self.ctx.history.invalidate(room).await;
    }

    pub async fn invalidate_directory(&self) {
        *self.conversations.lock().await = None;
        *self.groups.lock().await = None;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
