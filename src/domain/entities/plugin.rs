use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::traits::plugin::{CommandHandler, FailHook, Listener, PostHook, PreHook};

/// One entry of a prefix list
#[derive(Debug, Clone)]
pub enum PrefixEntry {
    Literal(String),
    Pattern(Regex),
}

/// Activation prefix declaration
#[derive(Debug, Clone)]
pub enum PrefixSpec {
    Pattern(Regex),
    List(Vec<PrefixEntry>),
    Literal(String),
}

impl PartialEq for PrefixEntry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PrefixEntry::Literal(a), PrefixEntry::Literal(b)) => a == b,
            (PrefixEntry::Pattern(a), PrefixEntry::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl PartialEq for PrefixSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PrefixSpec::Pattern(a), PrefixSpec::Pattern(b)) => a.as_str() == b.as_str(),
            (PrefixSpec::List(a), PrefixSpec::List(b)) => a == b,
            (PrefixSpec::Literal(a), PrefixSpec::Literal(b)) => a == b,
            _ => false,
        }
    }
}

/// One entry of a command list
#[derive(Debug, Clone)]
pub enum CommandItem {
    Literal(String),
    Pattern(Regex),
}

/// How a plugin accepts a command token
#[derive(Debug, Clone)]
pub enum CommandMatcher {
    Pattern(Regex),
    List(Vec<CommandItem>),
    Literal(String),
}

impl CommandMatcher {
    /// Literal list, the common case for hand-built descriptors
    pub fn words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandMatcher::List(words.into_iter().map(|w| CommandItem::Literal(w.into())).collect())
    }
}

impl PartialEq for CommandItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CommandItem::Literal(a), CommandItem::Literal(b)) => a == b,
            (CommandItem::Pattern(a), CommandItem::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl PartialEq for CommandMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CommandMatcher::Pattern(a), CommandMatcher::Pattern(b)) => a.as_str() == b.as_str(),
            (CommandMatcher::List(a), CommandMatcher::List(b)) => a == b,
            (CommandMatcher::Literal(a), CommandMatcher::Literal(b)) => a == b,
            _ => false,
        }
    }
}

/// Access requirements a plugin declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PermissionRequirements {
    pub root_owner: bool,
    pub owner: bool,
    pub moderator: bool,
    pub premium: bool,
    pub group_only: bool,
    pub bot_admin: bool,
    pub admin: bool,
    pub private_only: bool,
    pub registration_required: bool,
}

/// What happens to a matched command while its chat is banned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BanPolicy {
    /// Runs regardless of chat or user bans
    Exempt,
    /// Dropped without a reply
    Silent,
    /// Dropped with a one-time chat-banned notice
    #[default]
    Notice,
}

/// Command plugins go through matching; listeners run on every message
#[derive(Clone)]
pub enum PluginKind {
    Command {
        /// `None` means the plugin is never reachable through a command
        matcher: Option<CommandMatcher>,
        handler: Arc<dyn CommandHandler>,
    },
    Listener {
        handler: Arc<dyn Listener>,
    },
}

impl PluginKind {
    pub fn is_command(&self) -> bool {
        matches!(self, PluginKind::Command { .. })
    }
}

/// Optional hooks around the primary handler
#[derive(Clone, Default)]
pub struct PluginHooks {
    pub listener: Option<Arc<dyn Listener>>,
    pub pre_hook: Option<Arc<dyn PreHook>>,
    pub post_hook: Option<Arc<dyn PostHook>>,
    pub fail_hook: Option<Arc<dyn FailHook>>,
}

/// A loaded plugin, identified by name
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub kind: PluginKind,
    pub tags: BTreeSet<String>,
    pub help: Vec<String>,
    pub disabled: bool,
    pub custom_prefix: Option<PrefixSpec>,
    pub permissions: PermissionRequirements,
    /// Experience award; the ledger default applies when absent
    pub exp: Option<i64>,
    /// Currency cost
    pub limit: i64,
    /// Minimum level
    pub level: i64,
    pub ban_policy: Option<BanPolicy>,
    /// Digest of the source this descriptor was built from
    pub source_hash: Option<String>,
    pub hooks: PluginHooks,
}

impl PluginDescriptor {
    fn with_kind(name: impl Into<String>, kind: PluginKind) -> Self {
        Self {
            name: name.into(),
            kind,
            tags: BTreeSet::new(),
            help: Vec::new(),
            disabled: false,
            custom_prefix: None,
            permissions: PermissionRequirements::default(),
            exp: None,
            limit: 0,
            level: 0,
            ban_policy: None,
            source_hash: None,
            hooks: PluginHooks::default(),
        }
    }

    pub fn command<H>(name: impl Into<String>, matcher: CommandMatcher, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        Self::with_kind(
            name,
            PluginKind::Command {
                matcher: Some(matcher),
                handler: Arc::new(handler),
            },
        )
    }

    pub fn listener<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: Listener + 'static,
    {
        Self::with_kind(name, PluginKind::Listener { handler: Arc::new(handler) })
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_prefix(mut self, prefix: PrefixSpec) -> Self {
        self.custom_prefix = Some(prefix);
        self
    }

    pub fn with_permissions(mut self, permissions: PermissionRequirements) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_exp(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_level(mut self, level: i64) -> Self {
        self.level = level;
        self
    }

    pub fn with_ban_policy(mut self, policy: BanPolicy) -> Self {
        self.ban_policy = Some(policy);
        self
    }

    pub fn with_hooks(mut self, hooks: PluginHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is_tagged(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn matcher(&self) -> Option<&CommandMatcher> {
        match &self.kind {
            PluginKind::Command { matcher, .. } => matcher.as_ref(),
            PluginKind::Listener { .. } => None,
        }
    }

    /// Compares everything a source declares, ignoring handler identity
    pub fn same_definition(&self, other: &PluginDescriptor) -> bool {
        self.name == other.name
            && self.kind.is_command() == other.kind.is_command()
            && self.matcher() == other.matcher()
            && self.tags == other.tags
            && self.help == other.help
            && self.disabled == other.disabled
            && self.custom_prefix == other.custom_prefix
            && self.permissions == other.permissions
            && self.exp == other.exp
            && self.limit == other.limit
            && self.level == other.level
            && self.ban_policy == other.ban_policy
            && self.source_hash == other.source_hash
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("command", &self.matcher())
            .field("listener", &!self.kind.is_command())
            .field("tags", &self.tags)
            .field("disabled", &self.disabled)
            .field("permissions", &self.permissions)
            .field("exp", &self.exp)
            .field("limit", &self.limit)
            .field("level", &self.level)
            .finish()
    }
}
