//! Message dispatcher - Routes messages through admission, gates and plugin handlers

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::application::errors::BotError;
use crate::application::services::permission;
use crate::application::services::{
    AuthorizationResolver, Award, BanEffects, BanGate, BanVerdict, ResourceLedger, StatsRecorder, Subject,
};
use crate::domain::entities::{
    Access, BotSettings, ChatRecord, FailKind, GroupInfo, InboundEvent, Message, PluginDescriptor, PluginKind,
    PrefixMatch, UserRecord,
};
use crate::domain::traits::{Bot, DiagnosticReport, DiagnosticsSink, HandlerResult, HookContext, Store};
use crate::infrastructure::config::{render, Config};
use crate::infrastructure::plugins::PluginRegistry;
use super::admission::{AdmissionQueue, SpamGuard, SpamVerdict};
use super::parser::MessageParser;

/// Source of "now" for spam windows and stats
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Lifecycle of one message through the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Ignored,
    Admitted,
    Matched,
    Skipped,
    Authorized,
    Denied,
    Executed,
    Failed,
    Recorded,
    Done,
}

/// Why a matched plugin did not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Banned(BanVerdict),
    Spam { seconds: i64 },
    AdminOnly,
    Permission(FailKind),
    InsufficientLimit,
    LevelRequired { required: i64, current: i64 },
}

/// What happened to a message
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Dropped by a message filter before admission
    pub ignored: bool,
    /// Plugin whose handler ran
    pub plugin: Option<String>,
    pub denials: Vec<(String, Denial)>,
    pub exp: i64,
    pub debit: Option<i64>,
    pub error: Option<String>,
}

impl DispatchReport {
    fn deny(&mut self, plugin: &str, denial: Denial) {
        tracing::debug!("{} denied: {:?}", plugin, denial);
        self.denials.push((plugin.to_string(), denial));
    }

    pub fn handled(&self) -> bool {
        self.plugin.is_some()
    }
}

/// Per-message facts shared by both passes
struct Turn<'a> {
    chat: &'a ChatRecord,
    settings: &'a BotSettings,
    group: &'a GroupInfo,
    access: Access,
}

/// Run a hook, turning both `Err` and panics into a failure reason
async fn guarded<T, F>(hook: F) -> Result<T, String>
where
    F: Future<Output = HandlerResult<T>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => Err(panic_reason(panic.as_ref())),
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(reason) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", reason)
    } else if let Some(reason) = panic.downcast_ref::<String>() {
        format!("panicked: {}", reason)
    } else {
        "panicked".to_string()
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Turns one inbound event into at most one command execution plus listener runs
pub struct Dispatcher {
    config: Config,
    registry: Arc<PluginRegistry>,
    store: Arc<dyn Store>,
    bot: Arc<dyn Bot>,
    bot_id: String,
    parser: MessageParser,
    queue: AdmissionQueue,
    spam: SpamGuard,
    authz: AuthorizationResolver,
    ban_gate: BanGate,
    ledger: ResourceLedger,
    stats: StatsRecorder,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    clock: Clock,
    started_at: DateTime<Utc>,
}

impl Dispatcher {
    pub fn new(config: Config, registry: Arc<PluginRegistry>, store: Arc<dyn Store>, bot: Arc<dyn Bot>) -> Self {
        let bot_id = if config.bot.id.is_empty() {
            bot.bot_info().id
        } else {
            config.bot.id.clone()
        };
        let authz = AuthorizationResolver::new(
            &bot_id,
            &config.owners.root,
            &config.owners.moderators,
            config.bot.identity_suffix.clone(),
        );

        Self {
            parser: MessageParser::from_literals(&config.bot.prefix),
            queue: AdmissionQueue::new(Duration::from_millis(config.dispatch.queue_poll_ms)),
            spam: SpamGuard::new(&config.antispam),
            ban_gate: BanGate::new(config.ban.policies.clone(), config.ban.max_warnings),
            ledger: ResourceLedger::new(config.ledger.clone()),
            stats: StatsRecorder::new(store.clone()),
            diagnostics: None,
            clock: Arc::new(Utc::now),
            started_at: Utc::now(),
            authz,
            bot_id,
            config,
            registry,
            store,
            bot,
        }
    }

    /// Report handler failures to a diagnostics sink
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.bot
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub fn queue(&self) -> &AdmissionQueue {
        &self.queue
    }

    fn now_ms(&self) -> i64 {
        (self.clock)().timestamp_millis()
    }

    fn transition(&self, id: &str, state: DispatchState) {
        tracing::trace!(message = id, state = ?state, "dispatch");
    }

    fn ignore_reason(&self, event: &InboundEvent) -> Option<&'static str> {
        let opts = &self.config.dispatch;
        if event.is_echo {
            return Some("transport echo");
        }
        if opts.ignore_stale && event.timestamp < self.started_at {
            return Some("stale");
        }
        if opts.self_mode && !event.from_me {
            return Some("self mode");
        }
        if opts.private_only && event.is_group {
            return Some("private only");
        }
        if opts.group_only && !event.is_group {
            return Some("group only");
        }
        None
    }

    /// Process one inbound event
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        self.transition(&event.id, DispatchState::Received);

        if let Some(reason) = self.ignore_reason(&event) {
            tracing::debug!("Ignoring {} ({})", event.id, reason);
            self.transition(&event.id, DispatchState::Ignored);
            report.ignored = true;
            return report;
        }

        let mut msg = Message::from(event);
        let chat = self.store.ensure_chat(&msg.chat_id);
        let settings = self.store.settings(&self.bot_id);
        let user = self.store.user(&msg.sender);
        let access = self.authz.resolve(&msg.sender, msg.from_me, user.as_ref());
        let group = self.group_info(&msg).await;

        msg.exp += self.ledger.baseline();

        let queued = self.config.dispatch.queue && msg.has_text() && !(access.is_moderator || access.is_premium);
        let ticket = if queued {
            Some(self.queue.enqueue(msg.id.clone()).await)
        } else {
            None
        };
        self.transition(&msg.id, DispatchState::Admitted);

        let turn = Turn {
            chat: &chat,
            settings: &settings,
            group: &group,
            access,
        };

        if let Err(e) = self.command_pass(&mut msg, &turn, &mut report).await {
            tracing::error!("Command pass for {} stopped: {}", msg.id, e);
        }
        self.listener_pass(&msg, &turn).await;

        drop(ticket);
        self.cleanup(&msg, &settings).await;
        self.transition(&msg.id, DispatchState::Done);

        report.plugin = msg.plugin;
        report.exp = msg.exp;
        report.debit = msg.limit;
        report.error = msg.error;
        report
    }

    async fn group_info(&self, msg: &Message) -> GroupInfo {
        if !msg.is_group {
            return GroupInfo::default();
        }
        match self.bot.group_metadata(&msg.chat_id).await {
            Ok(metadata) => GroupInfo::resolve(metadata, &msg.sender, &self.bot_id),
            Err(e) => {
                tracing::warn!("Group metadata for {} unavailable: {}", msg.chat_id, e);
                GroupInfo::default()
            }
        }
    }

    fn context<'a>(&'a self, plugin: &'a str, prefix: Option<&'a PrefixMatch>, turn: &Turn<'a>) -> HookContext<'a> {
        HookContext {
            bot: self.bot.as_ref(),
            store: self.store.as_ref(),
            plugin,
            prefix,
            group: turn.group,
            access: turn.access,
        }
    }

    async fn command_pass(&self, msg: &mut Message, turn: &Turn<'_>, report: &mut DispatchReport) -> Result<(), BotError> {
        let notices = &self.config.notices;

        for name in self.registry.names() {
            // Re-read so a reload applies to plugins not reached yet
            let Some(plugin) = self.registry.get(&name) else {
                continue;
            };
            if plugin.disabled {
                continue;
            }
            let ctx = self.context(&plugin.name, None, turn);

            if let Some(listener) = &plugin.hooks.listener {
                if let Err(reason) = guarded(listener.on_message(msg, &ctx)).await {
                    self.listener_failed(&plugin, msg, &reason).await;
                }
            }

            if !self.config.dispatch.restrict && plugin.is_tagged("admin") {
                continue;
            }

            let parsed = self.parser.parse(&msg.text, plugin.custom_prefix.as_ref());

            if let Some(pre_hook) = &plugin.hooks.pre_hook {
                let ctx = self.context(&plugin.name, parsed.as_ref(), turn);
                match guarded(pre_hook.before(msg, &ctx)).await {
                    Ok(false) => {}
                    Ok(true) => continue,
                    Err(reason) => {
                        tracing::error!("Pre-hook of {} failed: {}", plugin.name, self.redact(&reason));
                        continue;
                    }
                }
            }

            let PluginKind::Command { matcher, handler } = &plugin.kind else {
                continue;
            };
            let Some(prefix) = parsed else {
                continue;
            };
            if !matcher.as_ref().is_some_and(|m| m.accepts(&prefix.command)) {
                self.transition(&msg.id, DispatchState::Skipped);
                continue;
            }
            msg.is_command = true;
            self.transition(&msg.id, DispatchState::Matched);

            if self.store.ensure_user(&msg.sender) {
                tracing::debug!("Created user record for {}", msg.sender);
            }
            let user = match self.store.user(&msg.sender) {
                Some(user) => user,
                None => {
                    tracing::warn!("Store has no record for {} after creating it", msg.sender);
                    UserRecord::default()
                }
            };
            let ctx = self.context(&plugin.name, Some(&prefix), turn);

            let policy = self.ban_gate.policy_for(&plugin);
            let (verdict, effects) = self.ban_gate.check(turn.chat, Some(&user), policy, turn.access.is_root_owner);
            self.apply_ban_effects(msg, effects);
            if !verdict.is_allowed() {
                self.transition(&msg.id, DispatchState::Denied);
                report.deny(&plugin.name, Denial::Banned(verdict.clone()));
                self.ban_notice(&verdict, msg, &user, &ctx).await?;
                if effects.mark_notice_sent {
                    self.store.update_chat(&msg.chat_id, &mut |chat| chat.ban_notice_sent = true);
                }
                return Ok(());
            }

            if (turn.settings.antispam || turn.chat.antispam) && !turn.access.is_root_owner {
                let now = self.now_ms();
                let mut verdict = SpamVerdict::Allowed;
                self.store
                    .update_user(&msg.sender, &mut |user| verdict = self.spam.check(user, now));
                if let SpamVerdict::Wait { seconds } = verdict {
                    self.transition(&msg.id, DispatchState::Denied);
                    report.deny(&plugin.name, Denial::Spam { seconds });
                    let text = render(&notices.spam_wait, &[("seconds", &seconds.to_string())]);
                    ctx.reply(msg, &text).await?;
                    return Ok(());
                }
            }

            if turn.chat.admin_only && msg.is_group && !turn.access.is_owner && !turn.group.is_admin {
                self.transition(&msg.id, DispatchState::Denied);
                report.deny(&plugin.name, Denial::AdminOnly);
                return Ok(());
            }

            let subject = Subject {
                access: turn.access,
                group: turn.group,
                is_group: msg.is_group,
                registered: Some(user.registered),
            };
            if let Some(kind) = permission::check(&plugin.permissions, &subject) {
                self.transition(&msg.id, DispatchState::Denied);
                report.deny(&plugin.name, Denial::Permission(kind));
                match &plugin.hooks.fail_hook {
                    Some(fail_hook) => {
                        if let Err(reason) = guarded(fail_hook.on_denied(kind, msg, &ctx)).await {
                            tracing::error!("Fail hook of {} failed: {}", plugin.name, self.redact(&reason));
                        }
                    }
                    None => ctx.reply(msg, self.fail_notice(kind)).await?,
                }
                continue;
            }
            self.transition(&msg.id, DispatchState::Authorized);

            match self.ledger.award(&plugin) {
                Award::Granted(exp) => msg.exp += exp,
                Award::Rejected(exp) => {
                    tracing::warn!("{} declares {} exp, above the ceiling", plugin.name, exp);
                    if let Err(e) = ctx.reply(msg, &notices.exp_ceiling).await {
                        tracing::warn!("Ceiling notice for {} not delivered: {}", plugin.name, e);
                    }
                }
            }

            if !self.ledger.can_afford(&plugin, &user, turn.access.is_premium) {
                report.deny(&plugin.name, Denial::InsufficientLimit);
                ctx.reply(msg, &notices.insufficient_limit).await?;
                continue;
            }

            if !self.ledger.meets_level(&plugin, &user) {
                report.deny(
                    &plugin.name,
                    Denial::LevelRequired {
                        required: plugin.level,
                        current: user.level,
                    },
                );
                let text = render(
                    &notices.level_required,
                    &[("required", &plugin.level.to_string()), ("current", &user.level.to_string())],
                );
                ctx.reply(msg, &text).await?;
                continue;
            }

            msg.plugin = Some(plugin.name.clone());
            match guarded(handler.handle(msg, &ctx)).await {
                Ok(()) => {
                    self.transition(&msg.id, DispatchState::Executed);
                    msg.limit = self.ledger.pending_debit(&plugin, turn.access.is_premium);
                }
                Err(reason) => {
                    self.transition(&msg.id, DispatchState::Failed);
                    let redacted = self.redact(&reason);
                    tracing::error!("Plugin {} failed: {}", plugin.name, redacted);
                    msg.error = Some(redacted.clone());
                    let command = format!("{}{}", prefix.used_prefix, prefix.command);
                    self.report_failure(&plugin, &command, &redacted).await;
                    if let Err(e) = ctx.reply(msg, &redacted).await {
                        tracing::warn!("Failure reply for {} not delivered: {}", plugin.name, e);
                    }
                }
            }

            if let Some(post_hook) = &plugin.hooks.post_hook {
                if let Err(reason) = guarded(post_hook.after(msg, &ctx)).await {
                    tracing::error!("Post-hook of {} failed: {}", plugin.name, self.redact(&reason));
                }
            }

            if let Some(debit) = msg.limit {
                let text = render(&notices.debit, &[("amount", &debit.to_string())]);
                ctx.reply(msg, &text).await?;
            }
            return Ok(());
        }
        Ok(())
    }

    /// Every enabled listener plugin sees every admitted message
    async fn listener_pass(&self, msg: &Message, turn: &Turn<'_>) {
        for name in self.registry.names() {
            let Some(plugin) = self.registry.get(&name) else {
                continue;
            };
            let PluginKind::Listener { handler } = &plugin.kind else {
                continue;
            };
            if plugin.disabled {
                continue;
            }
            let ctx = self.context(&plugin.name, None, turn);
            if let Err(reason) = guarded(handler.on_message(msg, &ctx)).await {
                self.listener_failed(&plugin, msg, &reason).await;
            }
        }
    }

    async fn cleanup(&self, msg: &Message, settings: &BotSettings) {
        if !self.ledger.settle(msg, self.store.as_ref()) {
            tracing::trace!("No record to settle for {}", msg.sender);
        }

        if let Some(plugin) = &msg.plugin {
            let now = u64::try_from(self.now_ms()).unwrap_or(0);
            self.stats.record(plugin, msg.error.is_none(), now);
            self.transition(&msg.id, DispatchState::Recorded);
        }

        if self.config.dispatch.print {
            tracing::info!(
                "[{}] {} -> {} (+{} exp): {}",
                msg.chat_id,
                msg.sender,
                msg.plugin.as_deref().unwrap_or("-"),
                msg.exp,
                preview(&msg.text)
            );
        }

        if self.config.dispatch.autoread || settings.autoread {
            if let Err(e) = self.bot.mark_read(&msg.chat_id, &msg.id).await {
                tracing::warn!("Read receipt for {} failed: {}", msg.id, e);
            }
        }
    }

    fn apply_ban_effects(&self, msg: &Message, effects: BanEffects) {
        // the notice flag is only set once the notice is delivered
        if effects.clear_notice_sent {
            self.store.update_chat(&msg.chat_id, &mut |chat| chat.ban_notice_sent = false);
        }
        if effects.bump_warning {
            self.store
                .update_user(&msg.sender, &mut |user| user.banned_message_count += 1);
        }
    }

    async fn ban_notice(
        &self,
        verdict: &BanVerdict,
        msg: &Message,
        user: &UserRecord,
        ctx: &HookContext<'_>,
    ) -> Result<(), BotError> {
        let notices = &self.config.notices;
        let text = match verdict {
            BanVerdict::ChatBanned { notify: true } => render(&notices.chat_banned, &[("chat", &msg.chat_id)]),
            BanVerdict::UserBanned { warning: Some(count) } => {
                let reason = if user.banned_reason.is_empty() {
                    "-"
                } else {
                    user.banned_reason.as_str()
                };
                render(
                    &notices.user_banned,
                    &[
                        ("count", &count.to_string()),
                        ("max", &self.ban_gate.max_warnings().to_string()),
                        ("reason", reason),
                    ],
                )
            }
            _ => return Ok(()),
        };
        ctx.reply(msg, &text).await
    }

    fn fail_notice(&self, kind: FailKind) -> &str {
        let notices = &self.config.notices;
        match kind {
            FailKind::RootOwner => &notices.root_owner,
            FailKind::Owner => &notices.owner,
            FailKind::Moderator => &notices.moderator,
            FailKind::Premium => &notices.premium,
            FailKind::Group => &notices.group,
            FailKind::BotAdmin => &notices.bot_admin,
            FailKind::Admin => &notices.admin,
            FailKind::Private => &notices.private,
            FailKind::Unregistered => &notices.unregistered,
        }
    }

    /// Replace configured secrets with `#HIDDEN#`
    pub fn redact(&self, text: &str) -> String {
        self.config
            .secrets
            .redact
            .iter()
            .filter(|secret| !secret.is_empty())
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), "#HIDDEN#"))
    }

    async fn listener_failed(&self, plugin: &PluginDescriptor, msg: &Message, reason: &str) {
        let redacted = self.redact(reason);
        tracing::error!("Listener of {} failed: {}", plugin.name, redacted);
        if msg.plugin.is_some() {
            self.report_failure(plugin, &msg.text, &redacted).await;
        }
    }

    async fn report_failure(&self, plugin: &PluginDescriptor, command: &str, reason: &str) {
        let Some(sink) = &self.diagnostics else {
            return;
        };
        let report = DiagnosticReport {
            identifier: self.bot_id.clone(),
            plugin: plugin.name.clone(),
            command: command.to_string(),
            reason: reason.to_string(),
            content_hash: plugin.source_hash.clone(),
        };
        if let Err(e) = sink.report(report).await {
            tracing::debug!("Diagnostics delivery failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_reason_formats() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_reason(boxed.as_ref()), "panicked: boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_reason(boxed.as_ref()), "panicked: bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_reason(boxed.as_ref()), "panicked");
    }

    #[tokio::test]
    async fn test_guarded_catches_errors_and_panics() {
        let ok = guarded(async { Ok::<_, BotError>(5) }).await;
        assert_eq!(ok, Ok(5));

        let err = guarded(async { Err::<(), _>(BotError::handler("nope")) }).await;
        assert_eq!(err, Err("nope".to_string()));

        let panicked = guarded(async {
            if true {
                panic!("exploded");
            }
            Ok::<(), BotError>(())
        })
        .await;
        assert_eq!(panicked, Err("panicked: exploded".to_string()));
    }

    #[test]
    fn test_preview_is_char_safe() {
        let text = "é".repeat(80);
        assert_eq!(preview(&text).chars().count(), 50);
    }
}
