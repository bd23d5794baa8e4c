//! Resource ledger - experience, currency and level accounting

use rand::Rng;

use crate::domain::entities::{Message, PluginDescriptor, UserRecord};
use crate::domain::traits::Store;
use crate::infrastructure::config::LedgerConfig;

/// Outcome of a plugin's experience award
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Award {
    Granted(i64),
    /// Above the ceiling; nothing is applied
    Rejected(i64),
}

#[derive(Debug, Clone)]
pub struct ResourceLedger {
    config: LedgerConfig,
}

impl ResourceLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Random baseline every admitted message earns
    pub fn baseline(&self) -> i64 {
        rand::rng().random_range(1..=10)
    }

    pub fn award(&self, plugin: &PluginDescriptor) -> Award {
        let exp = plugin.exp.unwrap_or(self.config.default_exp);
        if exp > self.config.exp_ceiling {
            Award::Rejected(exp)
        } else {
            Award::Granted(exp)
        }
    }

    pub fn can_afford(&self, plugin: &PluginDescriptor, user: &UserRecord, is_premium: bool) -> bool {
        is_premium || plugin.limit <= 0 || user.limit >= plugin.limit
    }

    pub fn meets_level(&self, plugin: &PluginDescriptor, user: &UserRecord) -> bool {
        plugin.level <= user.level
    }

    /// Debit to record after a successful handler run
    pub fn pending_debit(&self, plugin: &PluginDescriptor, is_premium: bool) -> Option<i64> {
        if is_premium || plugin.limit <= 0 {
            None
        } else {
            Some(plugin.limit)
        }
    }

    /// Apply the message's accrued exp and, if enabled, its pending debit.
    ///
    /// Returns false when the sender has no record.
    pub fn settle(&self, message: &Message, store: &dyn Store) -> bool {
        let apply_debit = self.config.apply_debit;
        store.update_user(&message.sender, &mut |user| {
            user.exp = user.exp.saturating_add(message.exp);
            if apply_debit {
                if let Some(debit) = message.limit {
                    user.limit = (user.limit - debit).max(0);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CommandMatcher, InboundEvent};
    use crate::domain::traits::{CommandHandler, HandlerResult, HookContext};
    use crate::infrastructure::storage::MemoryStore;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, _msg: &mut Message, _ctx: &HookContext<'_>) -> HandlerResult {
            Ok(())
        }
    }

    fn plugin() -> PluginDescriptor {
        PluginDescriptor::command("shop", CommandMatcher::words(["shop"]), Noop)
    }

    fn message(sender: &str) -> Message {
        Message::from(InboundEvent::new("chat", sender, ".shop"))
    }

    #[test]
    fn test_baseline_range() {
        let ledger = ResourceLedger::new(LedgerConfig::default());
        for _ in 0..200 {
            let exp = ledger.baseline();
            assert!((1..=10).contains(&exp));
        }
    }

    #[test]
    fn test_award_default_and_ceiling() {
        let ledger = ResourceLedger::new(LedgerConfig::default());
        assert_eq!(ledger.award(&plugin()), Award::Granted(17));
        assert_eq!(ledger.award(&plugin().with_exp(200)), Award::Granted(200));
        assert_eq!(ledger.award(&plugin().with_exp(201)), Award::Rejected(201));
    }

    #[test]
    fn test_currency_gate() {
        let ledger = ResourceLedger::new(LedgerConfig::default());
        let costly = plugin().with_limit(5);
        let poor = UserRecord::default().with_limit(3);
        assert!(!ledger.can_afford(&costly, &poor, false));
        assert!(ledger.can_afford(&costly, &poor, true));
        assert!(ledger.can_afford(&plugin(), &poor, false));
        assert_eq!(ledger.pending_debit(&costly, false), Some(5));
        assert_eq!(ledger.pending_debit(&costly, true), None);
        assert_eq!(ledger.pending_debit(&plugin(), false), None);
    }

    #[test]
    fn test_level_gate() {
        let ledger = ResourceLedger::new(LedgerConfig::default());
        let gated = plugin().with_level(4);
        assert!(!ledger.meets_level(&gated, &UserRecord::default().with_level(3)));
        assert!(ledger.meets_level(&gated, &UserRecord::default().with_level(4)));
    }

    #[test]
    fn test_settle_keeps_balance_by_default() {
        let store = MemoryStore::new();
        store.put_user("alice", UserRecord::default().with_limit(10));
        let ledger = ResourceLedger::new(LedgerConfig::default());

        let mut msg = message("alice");
        msg.exp = 25;
        msg.limit = Some(5);
        assert!(ledger.settle(&msg, &store));

        let user = store.user("alice").unwrap();
        assert_eq!(user.exp, 25);
        assert_eq!(user.limit, 10);
    }

    #[test]
    fn test_settle_applies_debit_when_enabled() {
        let store = MemoryStore::new();
        store.put_user("alice", UserRecord::default().with_limit(3));
        let ledger = ResourceLedger::new(LedgerConfig {
            apply_debit: true,
            ..Default::default()
        });

        let mut msg = message("alice");
        msg.limit = Some(5);
        ledger.settle(&msg, &store);
        assert_eq!(store.user("alice").unwrap().limit, 0);
    }

    #[test]
    fn test_settle_without_record() {
        let store = MemoryStore::new();
        let ledger = ResourceLedger::new(LedgerConfig::default());
        assert!(!ledger.settle(&message("ghost"), &store));
        assert!(store.user("ghost").is_none());
    }
}
