//! Console adapter for development/testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use crate::domain::entities::GroupMetadata;
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// A message the adapter delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: String,
    pub text: String,
    pub quoted: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    sender: Option<mpsc::UnboundedSender<Outgoing>>,
    echo: bool,
    offline: AtomicBool,
    groups: Mutex<HashMap<String, GroupMetadata>>,
    outbox: Mutex<Vec<Outgoing>>,
    blocked: Mutex<Vec<String>>,
    read: Mutex<Vec<String>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "relaybot".to_string(),
                username: "console".to_string(),
            },
            sender: None,
            echo: true,
            offline: AtomicBool::new(false),
            groups: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Vec::new()),
            blocked: Mutex::new(Vec::new()),
            read: Mutex::new(Vec::new()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.info.id = id.into();
        self
    }

    /// Forward every delivered message to a channel
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<Outgoing>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Do not print deliveries to stdout
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn with_group(self, chat_id: impl Into<String>, metadata: GroupMetadata) -> Self {
        self.set_group(chat_id, metadata);
        self
    }

    pub fn set_group(&self, chat_id: impl Into<String>, metadata: GroupMetadata) {
        lock(&self.groups).insert(chat_id.into(), metadata);
    }

    /// Simulate a dropped connection: every send fails while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Outgoing> {
        lock(&self.outbox).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.outbox).iter().map(|o| o.text.clone()).collect()
    }

    pub fn clear(&self) {
        lock(&self.outbox).clear();
    }

    pub fn blocked(&self) -> Vec<String> {
        lock(&self.blocked).clone()
    }

    pub fn read_receipts(&self) -> Vec<String> {
        lock(&self.read).clone()
    }

    fn deliver(&self, chat_id: &str, text: &str, quoted: Option<&str>) -> Result<String, BotError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BotError::Transport("console adapter is offline".to_string()));
        }
        if self.echo {
            println!("[BOT -> {}] {}", chat_id, text);
        }
        let outgoing = Outgoing {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            quoted: quoted.map(str::to_string),
        };
        if let Some(sender) = &self.sender {
            if sender.send(outgoing.clone()).is_err() {
                tracing::debug!("Console receiver dropped");
            }
        }
        let mut outbox = lock(&self.outbox);
        outbox.push(outgoing);
        Ok(format!("console_msg_{}", outbox.len()))
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        self.deliver(chat_id, text, None)
    }

    async fn reply(&self, chat_id: &str, text: &str, quoted_id: &str) -> Result<String, BotError> {
        self.deliver(chat_id, text, Some(quoted_id))
    }

    async fn group_metadata(&self, chat_id: &str) -> Result<GroupMetadata, BotError> {
        lock(&self.groups)
            .get(chat_id)
            .cloned()
            .ok_or_else(|| BotError::Transport(format!("no metadata for {}", chat_id)))
    }

    async fn mark_read(&self, _chat_id: &str, message_id: &str) -> Result<(), BotError> {
        lock(&self.read).push(message_id.to_string());
        Ok(())
    }

    async fn block_user(&self, user_id: &str) -> Result<(), BotError> {
        lock(&self.blocked).push(user_id.to_string());
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
