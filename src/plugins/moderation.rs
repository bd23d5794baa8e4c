//! Chat and user bans

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{Message, UserRecord};
use crate::domain::traits::{CommandHandler, HandlerResult, HookContext};

pub const BANCHAT_MANIFEST: &str = "\
command: [banchat]
tags: [owner]
help: [banchat]
permissions:
  owner: true
ban-policy: exempt
";

pub const UNBANCHAT_MANIFEST: &str = "\
command: [unbanchat]
tags: [owner]
help: [unbanchat]
permissions:
  owner: true
ban-policy: exempt
";

pub const BANUSER_MANIFEST: &str = "\
command: [banuser, ban]
tags: [owner]
help: ['banuser <id> [reason]']
permissions:
  owner: true
";

pub const UNBANUSER_MANIFEST: &str = "\
command: [unbanuser, unban]
tags: [owner]
help: ['unbanuser <id>']
permissions:
  owner: true
";

pub struct BanChat;

#[async_trait]
impl CommandHandler for BanChat {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult {
        ctx.store.ensure_chat(&msg.chat_id);
        ctx.store.update_chat(&msg.chat_id, &mut |chat| {
            chat.is_banned = true;
            chat.ban_notice_sent = false;
        });
        ctx.reply(msg, "This chat is now banned.").await
    }
}

pub struct UnbanChat;

#[async_trait]
impl CommandHandler for UnbanChat {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult {
        ctx.store.update_chat(&msg.chat_id, &mut |chat| {
            chat.is_banned = false;
            chat.ban_notice_sent = false;
        });
        ctx.reply(msg, "This chat is no longer banned.").await
    }
}

fn target<'a>(ctx: &'a HookContext<'_>, usage: &str) -> Result<&'a str, BotError> {
    ctx.args()
        .first()
        .map(String::as_str)
        .ok_or_else(|| BotError::handler(format!("Usage: {}", usage)))
}

pub struct BanUser;

#[async_trait]
impl CommandHandler for BanUser {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult {
        let id = target(ctx, "banuser <id> [reason]")?;
        let reason = ctx.args()[1..].join(" ");

        if ctx.store.user(id).is_none() {
            ctx.store.put_user(id, UserRecord::default());
        }
        ctx.store.update_user(id, &mut |user| {
            user.banned = true;
            user.banned_reason = reason.clone();
            user.banned_message_count = 0;
        });
        tracing::info!("{} banned {}", msg.sender, id);
        ctx.reply(msg, &format!("{} is now banned.", id)).await
    }
}

pub struct UnbanUser;

#[async_trait]
impl CommandHandler for UnbanUser {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult {
        let id = target(ctx, "unbanuser <id>")?;
        let found = ctx.store.update_user(id, &mut |user| {
            user.banned = false;
            user.banned_reason.clear();
            user.banned_message_count = 0;
        });
        if !found {
            return Err(BotError::handler(format!("Unknown user {}", id)));
        }
        ctx.reply(msg, &format!("{} is no longer banned.", id)).await
    }
}
