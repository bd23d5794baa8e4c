//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::domain::entities::BanPolicy;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub owners: OwnersConfig,
    pub plugins: PluginConfig,
    pub dispatch: DispatchConfig,
    pub antispam: AntispamConfig,
    pub ledger: LedgerConfig,
    pub ban: BanConfig,
    pub diagnostics: DiagnosticsConfig,
    pub secrets: SecretsConfig,
    pub notices: Notices,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// The bot's own account identifier
    pub id: String,
    /// Connection-level prefixes; the global default pattern applies when empty
    pub prefix: Vec<String>,
    /// Suffix appended to normalized identifiers
    pub identity_suffix: String,
}

/// Static authorization lists
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OwnersConfig {
    pub root: Vec<String>,
    pub moderators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub auto_load: bool,
}

/// Deployment-wide dispatch switches
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DispatchConfig {
    /// Global slow mode
    pub queue: bool,
    pub queue_poll_ms: u64,
    /// Enables plugins tagged `admin`
    pub restrict: bool,
    /// Only process messages authored by the bot account
    pub self_mode: bool,
    pub private_only: bool,
    pub group_only: bool,
    pub autoread: bool,
    /// Drop events older than process start
    pub ignore_stale: bool,
    /// Log a summary line per message
    pub print: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AntispamConfig {
    pub window_ms: i64,
    /// Command count inside the window at which further commands are refused
    pub max_rapid: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LedgerConfig {
    pub default_exp: i64,
    pub exp_ceiling: i64,
    /// Subtract pending debits on settlement
    pub apply_debit: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BanConfig {
    /// Per-plugin policy, overriding what a plugin declares
    pub policies: HashMap<String, BanPolicy>,
    pub max_warnings: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SecretsConfig {
    /// Values replaced with `#HIDDEN#` in error text
    pub redact: Vec<String>,
}

/// Reply templates. `{name}` placeholders are filled in by the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Notices {
    pub root_owner: String,
    pub owner: String,
    pub moderator: String,
    pub premium: String,
    pub group: String,
    pub private: String,
    pub admin: String,
    pub bot_admin: String,
    pub unregistered: String,
    pub insufficient_limit: String,
    pub level_required: String,
    pub spam_wait: String,
    pub exp_ceiling: String,
    pub chat_banned: String,
    pub user_banned: String,
    pub debit: String,
    pub welcome: String,
    pub bye: String,
    pub promote: String,
    pub demote: String,
    pub description_changed: String,
    pub subject_changed: String,
    pub icon_changed: String,
    pub invite_revoked: String,
    pub call_rejected: String,
    pub deleted: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "relaybot".to_string(),
            id: String::new(),
            prefix: Vec::new(),
            identity_suffix: "@s.whatsapp.net".to_string(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            auto_load: true,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue: false,
            queue_poll_ms: 5000,
            restrict: false,
            self_mode: false,
            private_only: false,
            group_only: false,
            autoread: false,
            ignore_stale: true,
            print: true,
        }
    }
}

impl Default for AntispamConfig {
    fn default() -> Self {
        Self {
            window_ms: 5000,
            max_rapid: 2,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_exp: 17,
            exp_ceiling: 200,
            apply_debit: false,
        }
    }
}

impl Default for BanConfig {
    fn default() -> Self {
        let mut policies = HashMap::new();
        for name in ["banchat", "unbanchat", "banstatus"] {
            policies.insert(name.to_string(), BanPolicy::Exempt);
        }
        policies.insert("delete".to_string(), BanPolicy::Silent);
        Self {
            policies,
            max_warnings: 3,
        }
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            root_owner: "This command is for the bot developer only.".to_string(),
            owner: "This command is for the bot owner only.".to_string(),
            moderator: "This command is for moderators only.".to_string(),
            premium: "This command is for premium members only.".to_string(),
            group: "This command can only be used in groups.".to_string(),
            private: "This command can only be used in private chat.".to_string(),
            admin: "Only group admins can use this command.".to_string(),
            bot_admin: "Make the bot a group admin first.".to_string(),
            unregistered: "You are not registered yet.".to_string(),
            insufficient_limit: "You don't have enough coins to use this command.".to_string(),
            level_required: "You need level {required} to use this command. Your level is {current}.".to_string(),
            spam_wait: "Wait {seconds} seconds before using another command.".to_string(),
            exp_ceiling: "Nice try.".to_string(),
            chat_banned: "This chat ({chat}) is banned from using bot commands. Contact a bot owner to lift the ban.".to_string(),
            user_banned: "You are banned. Warning {count}/{max}. Reason: {reason}".to_string(),
            debit: "{amount} limit used.".to_string(),
            welcome: "Welcome to @subject, @user!".to_string(),
            bye: "Goodbye, @user!".to_string(),
            promote: "@user is now an admin.".to_string(),
            demote: "@user is no longer an admin.".to_string(),
            description_changed: "Description changed to\n@desc".to_string(),
            subject_changed: "Subject changed to\n@subject".to_string(),
            icon_changed: "Group icon changed.".to_string(),
            invite_revoked: "Group link changed to\n@revoke".to_string(),
            call_rejected: "Calls are not allowed, you will be blocked.".to_string(),
            deleted: "@user deleted a message:\n{text}".to_string(),
        }
    }
}

/// Fill `{key}` placeholders in a notice template
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.queue && self.dispatch.queue_poll_ms == 0 {
            return Err(ConfigError::InvalidValue("dispatch.queue-poll-ms must be positive".to_string()));
        }
        if self.antispam.window_ms <= 0 {
            return Err(ConfigError::InvalidValue("antispam.window-ms must be positive".to_string()));
        }
        if self.dispatch.private_only && self.dispatch.group_only {
            return Err(ConfigError::InvalidValue(
                "dispatch.private-only and dispatch.group-only are exclusive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto a loaded config
    pub fn apply_env(&mut self) {
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = vec![prefix];
        }

        if let Ok(id) = std::env::var("BOT_ID") {
            self.bot.id = id;
        }

        if let Ok(owners) = std::env::var("BOT_OWNERS") {
            self.owners.root = split_list(&owners);
        }

        if let Ok(url) = std::env::var("DIAGNOSTICS_URL") {
            self.diagnostics.enabled = true;
            self.diagnostics.endpoint = Some(url);
        }

        if let Ok(secrets) = std::env::var("REDACT_SECRETS") {
            self.secrets.redact.extend(split_list(&secrets));
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
