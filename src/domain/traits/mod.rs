//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod diagnostics;
pub mod plugin;
pub mod store;

pub use bot::{Bot, BotInfo};
pub use diagnostics::{DiagnosticReport, DiagnosticsSink};
pub use plugin::{CommandHandler, FailHook, HandlerResult, HookContext, Listener, PostHook, PreHook};
pub use store::Store;
