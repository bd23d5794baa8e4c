//! relaybot - plugin dispatch pipeline for chat bots
//!
//! Turns inbound chat events into at most one command execution plus a set of
//! always-run listeners, with role-based authorization, admission control,
//! bans, resource accounting and per-hook fault isolation.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;

pub use application::errors::BotError;
pub use application::messaging::{DispatchReport, Dispatcher};
pub use infrastructure::config::Config;
