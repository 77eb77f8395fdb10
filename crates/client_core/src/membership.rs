use std::sync::Arc;

use shared::{
    domain::{RoomId, User},
    protocol::ClientRequest,
};
use tracing::info;

use crate::transport::Transport;

/// Announces join/leave for the room a view currently shows. Leaves on drop.
pub struct RoomMembership {
    transport: Arc<dyn Transport>,
    user: User,
    active: Option<RoomId>,
}

impl RoomMembership {
    pub fn new(transport: Arc<dyn Transport>, user: User) -> Self {
        Self {
            transport,
            user,
            active: None,
        }
    }

    /// Leaves the previous room (if different) before joining `room`.
    pub fn activate(&mut self, room: RoomId) {
        if self.active.as_ref() == Some(&room) {
            return;
        }
        self.deactivate();
        info!(room = %room, "membership: join");
        self.transport.emit(ClientRequest::join(&room));
        self.active = Some(room);
    }

    pub fn deactivate(&mut self) {
        if let Some(room) = self.active.take() {
            info!(room = %room, "membership: leave");
            self.transport.emit(ClientRequest::leave(&room, &self.user));
        }
    }

    pub fn active(&self) -> Option<&RoomId> {
        self.active.as_ref()
    }
}

impl Drop for RoomMembership {
    fn drop(&mut self) {
        self.deactivate();
    }
}
