use serde::{Deserialize, Serialize};

/// Per-chat record kept in the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRecord {
    pub is_banned: bool,
    /// Chat-banned notice already delivered for the current ban
    pub ban_notice_sent: bool,
    pub welcome: bool,
    pub detect: bool,
    pub antidelete: bool,
    pub antispam: bool,
    /// Only group admins and owners may run commands
    pub admin_only: bool,
    pub welcome_text: Option<String>,
    pub bye_text: Option<String>,
}

impl Default for ChatRecord {
    fn default() -> Self {
        Self {
            is_banned: false,
            ban_notice_sent: false,
            welcome: true,
            detect: true,
            antidelete: false,
            antispam: false,
            admin_only: false,
            welcome_text: None,
            bye_text: None,
        }
    }
}

/// Per-bot settings kept in the store, keyed by the bot identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BotSettings {
    pub autoread: bool,
    pub antispam: bool,
    pub anticall: bool,
}
