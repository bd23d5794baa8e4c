use async_trait::async_trait;
use crate::domain::entities::GroupMetadata;
use crate::application::errors::BotError;

/// Bot trait - abstraction for the messaging transport
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a message to a chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Reply to a message, quoting it where the platform supports that
    async fn reply(&self, chat_id: &str, text: &str, _quoted_id: &str) -> Result<String, BotError> {
        self.send_message(chat_id, text).await
    }

    /// Fetch group metadata and participants
    async fn group_metadata(&self, chat_id: &str) -> Result<GroupMetadata, BotError>;

    /// Send a read receipt
    async fn mark_read(&self, _chat_id: &str, _message_id: &str) -> Result<(), BotError> {
        Ok(())
    }

    /// Block a user account
    async fn block_user(&self, _user_id: &str) -> Result<(), BotError> {
        Ok(())
    }

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
