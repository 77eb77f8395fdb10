use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::{
    domain::{RoomId, User},
    protocol::ClientRequest,
};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::transport::Transport;

struct StopTimer {
    task: JoinHandle<()>,
    /// Cleared by whoever gets there first: the timer when it emits, or
    /// `cancel`. Held across the emit so teardown waits for an in-flight stop.
    armed: Arc<Mutex<bool>>,
}

fn lock(armed: &Mutex<bool>) -> MutexGuard<'_, bool> {
    armed.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Local typing signal: start on every keystroke, one stop after the
/// keystrokes go quiet for `stop_delay`.
pub struct TypingNotifier {
    transport: Arc<dyn Transport>,
    room: RoomId,
    user: User,
    stop_delay: Duration,
    stop_timer: Option<StopTimer>,
}

impl TypingNotifier {
    pub fn new(transport: Arc<dyn Transport>, room: RoomId, user: User, stop_delay: Duration) -> Self {
        Self {
            transport,
            room,
            user,
            stop_delay,
            stop_timer: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn notify_typing(&mut self) {
        self.cancel();
        self.transport
            .emit(ClientRequest::typing_start(&self.room, &self.user));

        let transport = Arc::clone(&self.transport);
        let stop = ClientRequest::typing_stop(&self.room, &self.user);
        let delay = self.stop_delay;
        let armed = Arc::new(Mutex::new(true));
        let timer_armed = Arc::clone(&armed);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut armed = lock(&timer_armed);
            if *armed {
                *armed = false;
                debug!("typing: stop timer fired");
                transport.emit(stop);
            }
        });
        self.stop_timer = Some(StopTimer { task, armed });
    }

    /// Cancels a pending stop without emitting it. A stop already being
    /// emitted completes before this returns.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.stop_timer.take() {
            *lock(&timer.armed) = false;
            timer.task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.stop_timer
            .as_ref()
            .is_some_and(|timer| *lock(&timer.armed))
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }
}

impl Drop for TypingNotifier {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/typing_tests.rs"]
mod tests;
