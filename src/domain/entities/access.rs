use std::fmt;

/// Authorization tier of a sender, derived per message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Access {
    pub is_root_owner: bool,
    pub is_owner: bool,
    pub is_moderator: bool,
    pub is_premium: bool,
}

/// Why a plugin refused to run for a sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailKind {
    RootOwner,
    Owner,
    Moderator,
    Premium,
    Group,
    BotAdmin,
    Admin,
    Private,
    Unregistered,
}

impl FailKind {
    pub fn as_str(&self) -> &str {
        match self {
            FailKind::RootOwner => "root-owner",
            FailKind::Owner => "owner",
            FailKind::Moderator => "moderator",
            FailKind::Premium => "premium",
            FailKind::Group => "group",
            FailKind::BotAdmin => "bot-admin",
            FailKind::Admin => "admin",
            FailKind::Private => "private",
            FailKind::Unregistered => "unregistered",
        }
    }
}

impl fmt::Display for FailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
