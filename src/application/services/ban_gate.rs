//! Ban gate - chat and user level restrictions

use std::collections::HashMap;

use crate::domain::entities::{BanPolicy, ChatRecord, PluginDescriptor, UserRecord};

/// Outcome of a ban check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanVerdict {
    Allowed,
    /// Dropped without a reply
    Blocked,
    /// Chat is banned; send the chat-banned notice (at most once per ban)
    ChatBanned { notify: bool },
    /// Sender is banned; `warning` is 1-based, `None` once warnings ran out
    UserBanned { warning: Option<u32> },
}

impl BanVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, BanVerdict::Allowed)
    }
}

/// Side effects the caller must persist for a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BanEffects {
    /// Persist only after the chat-banned notice went out
    pub mark_notice_sent: bool,
    pub clear_notice_sent: bool,
    pub bump_warning: bool,
}

#[derive(Debug, Clone)]
pub struct BanGate {
    policies: HashMap<String, BanPolicy>,
    max_warnings: u32,
}

impl BanGate {
    pub fn new(policies: HashMap<String, BanPolicy>, max_warnings: u32) -> Self {
        Self { policies, max_warnings }
    }

    /// Configured table, then the plugin's own declaration, then `Notice`
    pub fn policy_for(&self, plugin: &PluginDescriptor) -> BanPolicy {
        self.policies
            .get(&plugin.name)
            .copied()
            .or(plugin.ban_policy)
            .unwrap_or_default()
    }

    pub fn max_warnings(&self) -> u32 {
        self.max_warnings
    }

    pub fn check(
        &self,
        chat: &ChatRecord,
        user: Option<&UserRecord>,
        policy: BanPolicy,
        is_root_owner: bool,
    ) -> (BanVerdict, BanEffects) {
        let mut effects = BanEffects::default();

        if !chat.is_banned && chat.ban_notice_sent {
            effects.clear_notice_sent = true;
        }

        if policy == BanPolicy::Exempt || is_root_owner {
            return (BanVerdict::Allowed, effects);
        }

        if chat.is_banned {
            return match policy {
                BanPolicy::Silent | BanPolicy::Exempt => (BanVerdict::Blocked, effects),
                BanPolicy::Notice => {
                    let notify = !chat.ban_notice_sent;
                    effects.mark_notice_sent = notify;
                    (BanVerdict::ChatBanned { notify }, effects)
                }
            };
        }

        match user {
            Some(user) if user.banned => {
                if user.banned_message_count < self.max_warnings {
                    effects.bump_warning = true;
                    let warning = Some(user.banned_message_count + 1);
                    (BanVerdict::UserBanned { warning }, effects)
                } else {
                    (BanVerdict::UserBanned { warning: None }, effects)
                }
            }
            _ => (BanVerdict::Allowed, effects),
        }
    }
}
