//! Built-in plugins
//!
//! Each handler ships with a default manifest; a YAML file of the same name in
//! the plugin directory replaces it.

pub mod logger;
pub mod moderation;
pub mod ping;

use crate::infrastructure::plugins::HandlerCatalog;

/// Catalog of every compiled-in handler
pub fn builtin_catalog() -> HandlerCatalog {
    HandlerCatalog::new()
        .command("ping", ping::Ping, ping::MANIFEST)
        .command("banchat", moderation::BanChat, moderation::BANCHAT_MANIFEST)
        .command("unbanchat", moderation::UnbanChat, moderation::UNBANCHAT_MANIFEST)
        .command("banuser", moderation::BanUser, moderation::BANUSER_MANIFEST)
        .command("unbanuser", moderation::UnbanUser, moderation::UNBANUSER_MANIFEST)
        .listener("logger", logger::Logger, logger::MANIFEST)
}
