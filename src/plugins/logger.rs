use async_trait::async_trait;

use crate::domain::entities::Message;
use crate::domain::traits::{HandlerResult, HookContext, Listener};

pub const MANIFEST: &str = "\
command: false
tags: [system]
";

/// Traces every admitted message
pub struct Logger;

#[async_trait]
impl Listener for Logger {
    async fn on_message(&self, msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult {
        let kind = if msg.is_command { "command" } else { "text" };
        tracing::debug!(chat = %msg.chat_id, sender = %msg.sender, kind, "{}", msg.text);
        Ok(())
    }
}
