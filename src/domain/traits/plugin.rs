//! Plugin contract - the hooks a plugin may expose to the dispatcher

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{Access, FailKind, GroupInfo, Message, PrefixMatch};
use crate::domain::traits::{Bot, Store};

/// Hook result
pub type HandlerResult<T = ()> = Result<T, BotError>;

/// Everything a hook gets to see besides the message itself
#[derive(Clone, Copy)]
pub struct HookContext<'a> {
    pub bot: &'a dyn Bot,
    pub store: &'a dyn Store,
    pub plugin: &'a str,
    /// Prefix/command resolution, when the hook runs after matching
    pub prefix: Option<&'a PrefixMatch>,
    pub group: &'a GroupInfo,
    pub access: Access,
}

impl<'a> HookContext<'a> {
    pub fn args(&self) -> &[String] {
        self.prefix.map(|p| p.args.as_slice()).unwrap_or(&[])
    }

    /// Reply to the message in its chat
    pub async fn reply(&self, msg: &Message, text: &str) -> HandlerResult {
        self.bot.reply(&msg.chat_id, text, &msg.id).await.map(|_| ())
    }
}

/// Runs for every message, before any matching
#[async_trait]
pub trait Listener: Send + Sync {
    async fn on_message(&self, msg: &Message, ctx: &HookContext<'_>) -> HandlerResult;
}

/// Runs before command matching; returning true skips this plugin's command
#[async_trait]
pub trait PreHook: Send + Sync {
    async fn before(&self, msg: &Message, ctx: &HookContext<'_>) -> HandlerResult<bool>;
}

/// The primary command handler
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult;
}

/// Runs after the command handler, whatever its outcome
#[async_trait]
pub trait PostHook: Send + Sync {
    async fn after(&self, msg: &Message, ctx: &HookContext<'_>) -> HandlerResult;
}

/// Replaces the default notice when a permission check fails
#[async_trait]
pub trait FailHook: Send + Sync {
    async fn on_denied(&self, kind: FailKind, msg: &Message, ctx: &HookContext<'_>) -> HandlerResult;
}
