#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use relaybot::application::errors::BotError;
use relaybot::application::messaging::{DispatchReport, Dispatcher};
use relaybot::domain::entities::{FailKind, GroupMetadata, InboundEvent, Message, Participant, PluginDescriptor};
use relaybot::domain::traits::{
    CommandHandler, DiagnosticReport, DiagnosticsSink, FailHook, HandlerResult, HookContext, Listener, PostHook,
    PreHook,
};
use relaybot::infrastructure::adapters::ConsoleAdapter;
use relaybot::infrastructure::config::Config;
use relaybot::infrastructure::plugins::PluginRegistry;
use relaybot::infrastructure::storage::MemoryStore;

pub const BOT: &str = "15550000";
pub const ROOT: &str = "15550001@s.whatsapp.net";
pub const USER: &str = "15550002@s.whatsapp.net";
pub const ADMIN: &str = "15550003@s.whatsapp.net";
pub const CHAT: &str = "15550002@s.whatsapp.net";
pub const GROUP: &str = "120363000000@g.us";
pub const T0: i64 = 1_700_000_000_000;

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn base_config() -> Config {
    let mut config = Config::default();
    config.bot.id = BOT.to_string();
    config.owners.root = vec![ROOT.to_string()];
    config
}

pub fn group_metadata() -> GroupMetadata {
    GroupMetadata {
        id: GROUP.to_string(),
        subject: "Test group".to_string(),
        description: None,
        participants: vec![
            Participant::member(USER),
            Participant::admin(ADMIN),
            Participant::super_admin(BOT),
        ],
    }
}

/// Ordered record of hook invocations
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

/// Implements every hook; each call is journaled as `<label>:<hook>`
#[derive(Clone)]
pub struct Probe {
    pub journal: Journal,
    pub label: String,
}

impl Probe {
    pub fn new(journal: &Journal, label: &str) -> Self {
        Self {
            journal: journal.clone(),
            label: label.to_string(),
        }
    }
}

#[async_trait]
impl CommandHandler for Probe {
    async fn handle(&self, msg: &mut Message, ctx: &HookContext<'_>) -> HandlerResult {
        self.journal.push(format!("{}:handle", self.label));
        ctx.reply(msg, &self.label).await
    }
}

#[async_trait]
impl Listener for Probe {
    async fn on_message(&self, _msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult {
        self.journal.push(format!("{}:listen", self.label));
        Ok(())
    }
}

#[async_trait]
impl PreHook for Probe {
    async fn before(&self, _msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult<bool> {
        self.journal.push(format!("{}:before", self.label));
        Ok(false)
    }
}

#[async_trait]
impl PostHook for Probe {
    async fn after(&self, _msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult {
        self.journal.push(format!("{}:after", self.label));
        Ok(())
    }
}

#[async_trait]
impl FailHook for Probe {
    async fn on_denied(&self, kind: FailKind, _msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult {
        self.journal.push(format!("{}:denied:{}", self.label, kind));
        Ok(())
    }
}

/// Handler that always fails with the given text
pub struct Failing(pub &'static str);

#[async_trait]
impl CommandHandler for Failing {
    async fn handle(&self, _msg: &mut Message, _ctx: &HookContext<'_>) -> HandlerResult {
        Err(BotError::handler(self.0))
    }
}

/// Hooks that panic
pub struct Panicking;

#[async_trait]
impl CommandHandler for Panicking {
    async fn handle(&self, _msg: &mut Message, _ctx: &HookContext<'_>) -> HandlerResult {
        panic!("handler blew up");
    }
}

#[async_trait]
impl Listener for Panicking {
    async fn on_message(&self, _msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult {
        panic!("listener blew up");
    }
}

/// Pre-hook that always vetoes
pub struct Veto;

#[async_trait]
impl PreHook for Veto {
    async fn before(&self, _msg: &Message, _ctx: &HookContext<'_>) -> HandlerResult<bool> {
        Ok(true)
    }
}

/// Diagnostics sink that keeps reports in memory
#[derive(Clone, Default)]
pub struct CapturedReports(Arc<Mutex<Vec<DiagnosticReport>>>);

impl CapturedReports {
    pub fn reports(&self) -> Vec<DiagnosticReport> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagnosticsSink for CapturedReports {
    async fn report(&self, report: DiagnosticReport) -> Result<(), BotError> {
        self.0.lock().unwrap().push(report);
        Ok(())
    }
}

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub bot: Arc<ConsoleAdapter>,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<PluginRegistry>,
    pub clock: Arc<AtomicI64>,
}

impl Harness {
    pub fn new(config: Config, plugins: Vec<PluginDescriptor>) -> Self {
        let registry = Arc::new(PluginRegistry::new());
        for plugin in plugins {
            registry.insert(plugin);
        }
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: Config, registry: Arc<PluginRegistry>) -> Self {
        ensure_init();
        let bot = Arc::new(ConsoleAdapter::new().quiet().with_id(BOT).with_group(GROUP, group_metadata()));
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(AtomicI64::new(T0));
        let now = clock.clone();
        let dispatcher = Dispatcher::new(config, registry.clone(), store.clone(), bot.clone())
            .with_clock(move || Utc.timestamp_millis_opt(now.load(Ordering::SeqCst)).unwrap());
        Self {
            dispatcher,
            bot,
            store,
            registry,
            clock,
        }
    }

    pub fn set_time(&self, ms: i64) {
        self.clock.store(ms, Ordering::SeqCst);
    }

    pub async fn send(&self, text: &str) -> DispatchReport {
        self.dispatcher.dispatch(InboundEvent::new(CHAT, USER, text)).await
    }

    pub async fn send_as(&self, sender: &str, text: &str) -> DispatchReport {
        self.dispatcher.dispatch(InboundEvent::new(CHAT, sender, text)).await
    }

    pub async fn send_in_group(&self, sender: &str, text: &str) -> DispatchReport {
        self.dispatcher
            .dispatch(InboundEvent::new(GROUP, sender, text).in_group())
            .await
    }
}
