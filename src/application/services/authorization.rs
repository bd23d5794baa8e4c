//! Authorization resolver - computes a sender's access tier

use crate::domain::entities::{Access, UserRecord};
use crate::infrastructure::config::Config;

/// Strip everything but digits and append the canonical suffix
pub fn normalize_id(raw: &str, suffix: &str) -> String {
    let local = raw.split('@').next().unwrap_or(raw);
    let local = local.split(':').next().unwrap_or(local);
    let digits: String = local.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}{}", digits, suffix)
}

/// Static owner/moderator lists, normalized once
#[derive(Debug, Clone)]
pub struct AuthorizationResolver {
    bot_id: String,
    root_owners: Vec<String>,
    moderators: Vec<String>,
    suffix: String,
}

impl AuthorizationResolver {
    pub fn new<R, M>(bot_id: &str, root_owners: R, moderators: M, suffix: impl Into<String>) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let suffix = suffix.into();
        Self {
            bot_id: normalize_id(bot_id, &suffix),
            root_owners: root_owners.into_iter().map(|o| normalize_id(o.as_ref(), &suffix)).collect(),
            moderators: moderators.into_iter().map(|m| normalize_id(m.as_ref(), &suffix)).collect(),
            suffix,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.bot.id,
            &config.owners.root,
            &config.owners.moderators,
            config.bot.identity_suffix.clone(),
        )
    }

    pub fn normalize(&self, raw: &str) -> String {
        normalize_id(raw, &self.suffix)
    }

    pub fn resolve(&self, sender: &str, from_me: bool, user: Option<&UserRecord>) -> Access {
        let sender = self.normalize(sender);
        // identifiers without digits never match anyone
        let known = sender != self.suffix;
        let is_root_owner = known && (sender == self.bot_id || self.root_owners.contains(&sender));
        let is_owner = is_root_owner || from_me;
        let is_moderator = is_owner || (known && self.moderators.contains(&sender));
        let is_premium = is_moderator || user.map(|u| u.premium_time > 0).unwrap_or(false);

        Access {
            is_root_owner,
            is_owner,
            is_moderator,
            is_premium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = "@s.whatsapp.net";

    fn resolver() -> AuthorizationResolver {
        AuthorizationResolver::new("+1 555 0100", ["15550101"], ["+1-555-0102"], SUFFIX)
    }

    #[test]
    fn test_normalize_strips_non_digits() {
        assert_eq!(normalize_id("+1 (555) 0100", SUFFIX), "15550100@s.whatsapp.net");
        assert_eq!(normalize_id("15550100:12@s.whatsapp.net", SUFFIX), "15550100@s.whatsapp.net");
    }

    #[test]
    fn test_bot_itself_is_root_owner() {
        let access = resolver().resolve("15550100@s.whatsapp.net", false, None);
        assert!(access.is_root_owner && access.is_owner && access.is_moderator && access.is_premium);
    }

    #[test]
    fn test_root_owner_list() {
        let access = resolver().resolve("15550101@s.whatsapp.net", false, None);
        assert!(access.is_root_owner);
    }

    #[test]
    fn test_from_me_is_owner_not_root() {
        let access = resolver().resolve("19990000@s.whatsapp.net", true, None);
        assert!(!access.is_root_owner);
        assert!(access.is_owner);
        assert!(access.is_moderator);
    }

    #[test]
    fn test_digitless_sender_never_matches() {
        let unset = AuthorizationResolver::new("", Vec::<String>::new(), Vec::<String>::new(), SUFFIX);
        assert_eq!(unset.resolve("console", false, None), Access::default());
    }

    #[test]
    fn test_moderator_list() {
        let access = resolver().resolve("15550102@s.whatsapp.net", false, None);
        assert!(!access.is_owner);
        assert!(access.is_moderator);
        assert!(access.is_premium);
    }

    #[test]
    fn test_premium_time_presence() {
        let user = UserRecord::default().premium(1);
        let access = resolver().resolve("19990000@s.whatsapp.net", false, Some(&user));
        assert!(access.is_premium);
        assert!(!access.is_moderator);

        let plain = resolver().resolve("19990000@s.whatsapp.net", false, Some(&UserRecord::default()));
        assert_eq!(plain, Access::default());
    }
}
