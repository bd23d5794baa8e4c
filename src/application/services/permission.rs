//! Permission gate - ordered access rules evaluated before a handler runs

use crate::domain::entities::{Access, FailKind, GroupInfo, PermissionRequirements};

/// Facts about the sender and chat the rules look at
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub access: Access,
    pub group: &'a GroupInfo,
    pub is_group: bool,
    /// `None` when the sender has no record yet
    pub registered: Option<bool>,
}

/// A single access rule: denies with `kind` when `denies` holds
pub struct PermissionRule {
    pub kind: FailKind,
    pub denies: fn(&PermissionRequirements, &Subject<'_>) -> bool,
}

/// Evaluation order matters: the first denying rule decides the notice.
pub const PERMISSION_RULES: &[PermissionRule] = &[
    PermissionRule {
        kind: FailKind::Owner,
        denies: |req, s| req.root_owner && req.owner && !(s.access.is_root_owner || s.access.is_owner),
    },
    PermissionRule {
        kind: FailKind::RootOwner,
        denies: |req, s| req.root_owner && !s.access.is_root_owner,
    },
    PermissionRule {
        kind: FailKind::Owner,
        denies: |req, s| req.owner && !s.access.is_owner,
    },
    PermissionRule {
        kind: FailKind::Moderator,
        denies: |req, s| req.moderator && !s.access.is_moderator,
    },
    PermissionRule {
        kind: FailKind::Premium,
        denies: |req, s| req.premium && !s.access.is_premium,
    },
    PermissionRule {
        kind: FailKind::Group,
        denies: |req, s| req.group_only && !s.is_group,
    },
    PermissionRule {
        kind: FailKind::BotAdmin,
        denies: |req, s| req.bot_admin && !s.group.is_bot_admin,
    },
    PermissionRule {
        kind: FailKind::Admin,
        denies: |req, s| req.admin && !s.group.is_admin,
    },
    PermissionRule {
        kind: FailKind::Private,
        denies: |req, s| req.private_only && s.is_group,
    },
    PermissionRule {
        kind: FailKind::Unregistered,
        denies: |req, s| req.registration_required && s.registered == Some(false),
    },
];

/// First failing rule, if any
pub fn check(req: &PermissionRequirements, subject: &Subject<'_>) -> Option<FailKind> {
    PERMISSION_RULES
        .iter()
        .find(|rule| (rule.denies)(req, subject))
        .map(|rule| rule.kind)
}
