use async_trait::async_trait;

use crate::domain::entities::Message;
use crate::domain::traits::{CommandHandler, HandlerResult, HookContext};

pub const MANIFEST: &str = "\
command: [ping, p]
tags: [main]
help: [ping]
";

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult {
        let elapsed = chrono::Utc::now() - msg.timestamp;
        let text = format!("Pong! ({} ms)", elapsed.num_milliseconds().max(0));
        ctx.reply(msg, &text).await
    }
}
