//! In-memory collaborators shared by the unit tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use shared::{
    domain::{
        ChatMessage, ConversationId, GroupId, GroupMessage, Message, MessageBody, MessageId,
        User, UserId,
    },
    protocol::{ClientRequest, ServerEvent},
};
use tokio::{sync::broadcast, time::Instant};

use crate::transport::Transport;

pub(crate) struct RecordingTransport {
    emitted: Mutex<Vec<(Instant, ClientRequest)>>,
    events: broadcast::Sender<ServerEvent>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            emitted: Mutex::new(Vec::new()),
            events,
        })
    }

    pub(crate) fn emitted(&self) -> Vec<ClientRequest> {
        self.emitted
            .lock()
            .expect("emitted lock")
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub(crate) fn emitted_at(&self) -> Vec<(Instant, ClientRequest)> {
        self.emitted.lock().expect("emitted lock").clone()
    }

    pub(crate) fn event_names(&self) -> Vec<&'static str> {
        self.emitted()
            .iter()
            .map(ClientRequest::event_name)
            .collect()
    }

    pub(crate) fn push(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}

impl Transport for RecordingTransport {
    fn emit(&self, request: ClientRequest) {
        self.emitted
            .lock()
            .expect("emitted lock")
            .push((Instant::now(), request));
    }

    fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

pub(crate) fn user(id: &str) -> User {
    User {
        id: UserId::from(id),
        username: id.trim_start_matches("u-").to_string(),
        avatar: None,
    }
}

pub(crate) fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0)
        .single()
        .expect("timestamp")
}

fn body(id: &str, seconds: i64, reply_to: Option<&str>) -> MessageBody {
    MessageBody {
        id: MessageId::from(id),
        content: format!("message {id}"),
        author: user("u-bob"),
        created_at: at(seconds),
        updated_at: None,
        reply_to_id: reply_to.map(MessageId::from),
    }
}

pub(crate) fn direct(conversation: &str, id: &str, seconds: i64, reply_to: Option<&str>) -> ChatMessage {
    ChatMessage::Direct(Message {
        conversation_id: ConversationId::from(conversation),
        body: body(id, seconds, reply_to),
    })
}

pub(crate) fn grouped(group: &str, id: &str, seconds: i64, reply_to: Option<&str>) -> ChatMessage {
    ChatMessage::Group(GroupMessage {
        group_id: GroupId::from(group),
        body: body(id, seconds, reply_to),
    })
}
