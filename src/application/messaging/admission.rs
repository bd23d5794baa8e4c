//! Admission control - global slow-mode queue and per-sender spam guard

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::entities::UserRecord;
use crate::infrastructure::config::AntispamConfig;

type Queue = Arc<Mutex<VecDeque<String>>>;

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<String>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Membership in the admission queue; leaving scope removes the id
pub struct QueueTicket {
    queue: Queue,
    id: String,
}

impl QueueTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for QueueTicket {
    fn drop(&mut self) {
        let mut queue = lock(&self.queue);
        if let Some(pos) = queue.iter().position(|id| id == &self.id) {
            queue.remove(pos);
        }
    }
}

/// FIFO of in-flight message ids
#[derive(Clone)]
pub struct AdmissionQueue {
    queue: Queue,
    poll: Duration,
}

impl AdmissionQueue {
    pub fn new(poll: Duration) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            poll,
        }
    }

    /// Append the id and wait until the message ahead of it has left
    pub async fn enqueue(&self, id: impl Into<String>) -> QueueTicket {
        let id = id.into();
        let ahead = {
            let mut queue = lock(&self.queue);
            let ahead = queue.back().cloned();
            queue.push_back(id.clone());
            ahead
        };
        let ticket = QueueTicket {
            queue: self.queue.clone(),
            id,
        };

        if let Some(ahead) = ahead {
            tracing::debug!("Message {} queued behind {}", ticket.id, ahead);
            while lock(&self.queue).contains(&ahead) {
                tokio::time::sleep(self.poll).await;
            }
        }
        ticket
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.queue).iter().any(|queued| queued == id)
    }
}

/// Outcome of the rapid-command check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamVerdict {
    Allowed,
    /// Too many commands inside the window; retry after this many seconds
    Wait { seconds: i64 },
}

/// Rapid-command window kept on the sender's user record
#[derive(Debug, Clone)]
pub struct SpamGuard {
    window_ms: i64,
    max_rapid: u32,
}

impl SpamGuard {
    pub fn new(config: &AntispamConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            max_rapid: config.max_rapid,
        }
    }

    /// Check and update the sender's window. A rejection leaves the counter as is.
    pub fn check(&self, user: &mut UserRecord, now_ms: i64) -> SpamVerdict {
        let elapsed = now_ms - user.last_command_time;
        let in_window = user.command_count > 0 && elapsed < self.window_ms;

        if !in_window {
            user.last_command_time = now_ms;
            user.command_count = 1;
            return SpamVerdict::Allowed;
        }

        if user.command_count >= self.max_rapid {
            let remaining = self.window_ms - elapsed;
            let seconds = (remaining + 999) / 1000;
            return SpamVerdict::Wait { seconds };
        }

        user.command_count += 1;
        SpamVerdict::Allowed
    }
}
