//! One mounted room screen: membership, typing, roster, history and drafts.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{ChatMessage, MessageId, RoomId, User},
    protocol::{RoomPayload, ServerEvent},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    draft::DraftState,
    history::HistoryCache,
    membership::RoomMembership,
    roster::TypingRoster,
    timeline::MessageTimeline,
    transport::Transport,
    types::{LoadState, PresenceChange, RoomSnapshot, ViewEvent},
    typing::TypingNotifier,
};

/// Session-wide collaborators handed to every view at mount.
#[derive(Clone)]
pub struct ViewContext {
    pub transport: Arc<dyn Transport>,
    pub history: Arc<HistoryCache>,
    pub user: User,
    pub typing_stop_delay: Duration,
    pub event_buffer: usize,
}

struct ViewState {
    load_state: LoadState,
    timeline: MessageTimeline,
    roster: TypingRoster,
}

pub struct RoomView {
    room: RoomId,
    state: Arc<Mutex<ViewState>>,
    events: broadcast::Sender<ViewEvent>,
    history: Arc<HistoryCache>,
    draft: DraftState,
    event_task: JoinHandle<()>,
    load_task: Option<JoinHandle<()>>,
    // Dropped in this order after the tasks are aborted: pending typing stop
    // is cancelled, then the room is left.
    typing: TypingNotifier,
    membership: RoomMembership,
}

impl RoomView {
    /// Joins `room`, starts listening for room events and starts the cached
    /// history load. Must be called from within a tokio runtime.
    pub fn mount(ctx: &ViewContext, room: RoomId) -> Self {
        let (events, _) = broadcast::channel(ctx.event_buffer.max(1));
        let state = Arc::new(Mutex::new(ViewState {
            load_state: LoadState::Loading,
            timeline: MessageTimeline::new(room.clone()),
            roster: TypingRoster::new(ctx.user.id.clone()),
        }));

        let transport_rx = ctx.transport.subscribe();
        let mut membership = RoomMembership::new(Arc::clone(&ctx.transport), ctx.user.clone());
        membership.activate(room.clone());

        let event_task = tokio::spawn(run_event_loop(
            room.clone(),
            transport_rx,
            Arc::clone(&state),
            events.clone(),
            Arc::clone(&ctx.history),
        ));
        let load_task = spawn_history_load(
            room.clone(),
            Arc::clone(&state),
            events.clone(),
            Arc::clone(&ctx.history),
        );
        let typing = TypingNotifier::new(
            Arc::clone(&ctx.transport),
            room.clone(),
            ctx.user.clone(),
            ctx.typing_stop_delay,
        );
        info!(room = %room, "view: mounted");

        Self {
            room,
            state,
            events,
            history: Arc::clone(&ctx.history),
            draft: DraftState::default(),
            event_task,
            load_task: Some(load_task),
            typing,
            membership,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock().await;
        let messages = match state.load_state {
            LoadState::Ready => state.timeline.display(),
            LoadState::Loading | LoadState::Failed(_) => Vec::new(),
        };
        RoomSnapshot {
            room: self.room.clone(),
            load_state: state.load_state.clone(),
            messages,
            typing_users: state.roster.members().to_vec(),
        }
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.lock().await.load_state.clone()
    }

    pub async fn message(&self, id: &MessageId) -> Option<ChatMessage> {
        self.state.lock().await.timeline.get(id).cloned()
    }

    /// Re-runs a failed history load. Returns `false` when the view is not
    /// in the failed state.
    pub async fn retry_history(&mut self) -> bool {
        {
            let mut state = self.state.lock().await;
            if !matches!(state.load_state, LoadState::Failed(_)) {
                return false;
            }
            state.load_state = LoadState::Loading;
        }
        info!(room = %self.room, "view: retrying history load");
        if let Some(previous) = self.load_task.take() {
            previous.abort();
        }
        self.load_task = Some(spawn_history_load(
            self.room.clone(),
            Arc::clone(&self.state),
            self.events.clone(),
            Arc::clone(&self.history),
        ));
        true
    }

    pub fn notify_typing(&mut self) {
        self.typing.notify_typing();
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn start_reply(&mut self, message: ChatMessage) {
        self.draft.start_reply(message);
    }

    pub fn start_edit(&mut self, message: ChatMessage) {
        self.draft.start_edit(message);
    }

    pub fn cancel_reply(&mut self) {
        self.draft.cancel_reply();
    }

    pub fn cancel_edit(&mut self) {
        self.draft.cancel_edit();
    }

    pub fn unmount(self) {}
}

impl Drop for RoomView {
    fn drop(&mut self) {
        self.event_task.abort();
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        info!(room = %self.room, "view: unmounted");
    }
}

fn spawn_history_load(
    room: RoomId,
    state: Arc<Mutex<ViewState>>,
    events: broadcast::Sender<ViewEvent>,
    history: Arc<HistoryCache>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match history.load_entry(&room).await {
            Ok(loaded) => {
                {
                    let mut state = state.lock().await;
                    state.timeline.merge_history(&loaded.messages);
                    if state.timeline.messages() != loaded.messages.as_slice() {
                        // Includes live messages received while loading.
                        // Held under the state lock so a later live upsert
                        // cannot be overwritten.
                        loaded
                            .write_back(state.timeline.messages().to_vec())
                            .await;
                    }
                    state.load_state = LoadState::Ready;
                }
                let _ = events.send(ViewEvent::HistoryLoaded);
            }
            Err(err) => {
                warn!(room = %room, "view: history load failed: {err}");
                let reason = err.to_string();
                state.lock().await.load_state = LoadState::Failed(reason.clone());
                let _ = events.send(ViewEvent::HistoryFailed(reason));
            }
        }
    })
}

/// Typing events naming another room are not ours; events without a room
/// are accepted.
fn targets_room(payload: &RoomPayload, room: &RoomId) -> bool {
    payload.room().map_or(true, |target| &target == room)
}

async fn run_event_loop(
    room: RoomId,
    mut transport_rx: broadcast::Receiver<ServerEvent>,
    state: Arc<Mutex<ViewState>>,
    events: broadcast::Sender<ViewEvent>,
    history: Arc<HistoryCache>,
) {
    loop {
        let event = match transport_rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(room = %room, skipped, "view: transport events lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            ServerEvent::TypingStart(payload) => {
                let Some(user) = payload.user.clone() else {
                    continue;
                };
                if !targets_room(&payload, &room) {
                    continue;
                }
                let mut state = state.lock().await;
                if state.roster.add(user) {
                    let _ = events.send(ViewEvent::TypingChanged(state.roster.members().to_vec()));
                }
            }
            ServerEvent::TypingStop(payload) => {
                let Some(user) = payload.user.as_ref() else {
                    continue;
                };
                if !targets_room(&payload, &room) {
                    continue;
                }
                let mut state = state.lock().await;
                if state.roster.remove(&user.id) {
                    let _ = events.send(ViewEvent::TypingChanged(state.roster.members().to_vec()));
                }
            }
            ServerEvent::UserJoin(data) => {
                debug!(room = %room, "view: user joined");
                let data = data.unwrap_or_default();
                let _ = events.send(ViewEvent::Presence(PresenceChange::Joined(data)));
            }
            ServerEvent::UserLeave(data) => {
                debug!(room = %room, "view: user left");
                let data = data.unwrap_or_default();
                let _ = events.send(ViewEvent::Presence(PresenceChange::Left(data)));
            }
            ServerEvent::MessageCreated(message) | ServerEvent::MessageUpdated(message) => {
                if message.room() != room {
                    continue;
                }
                let loaded = {
                    let mut state = state.lock().await;
                    if !state.timeline.upsert(message.clone()) {
                        continue;
                    }
                    state.load_state == LoadState::Ready
                };
                // Before the load completes the load task writes the merged
                // set; writing here would wait on the pending fetch.
                if loaded {
                    history.upsert(&room, message).await;
                }
                let _ = events.send(ViewEvent::MessagesChanged);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
