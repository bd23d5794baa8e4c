use serde::{Deserialize, Serialize};

/// Per-user record kept in the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecord {
    pub exp: i64,
    /// Consumable currency balance
    pub limit: i64,
    pub level: i64,
    pub registered: bool,
    pub banned: bool,
    pub banned_message_count: u32,
    pub banned_reason: String,
    /// Epoch millis of the last command that opened a spam window
    pub last_command_time: i64,
    pub command_count: u32,
    pub premium_time: i64,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            exp: 0,
            limit: 10,
            level: 0,
            registered: false,
            banned: false,
            banned_message_count: 0,
            banned_reason: String::new(),
            last_command_time: 0,
            command_count: 0,
            premium_time: 0,
        }
    }
}

impl UserRecord {
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_level(mut self, level: i64) -> Self {
        self.level = level;
        self
    }

    pub fn registered(mut self) -> Self {
        self.registered = true;
        self
    }

    pub fn premium(mut self, until: i64) -> Self {
        self.premium_time = until;
        self
    }

    pub fn banned(mut self, reason: impl Into<String>) -> Self {
        self.banned = true;
        self.banned_reason = reason.into();
        self
    }
}
