use crate::domain::entities::{BotSettings, ChatRecord, StatEntry, UserRecord};

/// Store trait - in-process record access
///
/// Reads and writes are synchronous; the implementation owns flush timing.
/// `update_*` methods hold the record for the whole closure, so a closure is
/// the unit of consistency for read-modify-write sequences.
pub trait Store: Send + Sync {
    // User records
    fn user(&self, id: &str) -> Option<UserRecord>;
    fn put_user(&self, id: &str, record: UserRecord);
    /// Creates a default record if none exists. Returns true when created.
    fn ensure_user(&self, id: &str) -> bool;
    /// Returns false when the record does not exist.
    fn update_user(&self, id: &str, f: &mut dyn FnMut(&mut UserRecord)) -> bool;

    // Chat records
    fn chat(&self, id: &str) -> Option<ChatRecord>;
    fn ensure_chat(&self, id: &str) -> ChatRecord;
    fn update_chat(&self, id: &str, f: &mut dyn FnMut(&mut ChatRecord)) -> bool;

    // Bot settings
    fn settings(&self, bot_id: &str) -> BotSettings;
    fn update_settings(&self, bot_id: &str, f: &mut dyn FnMut(&mut BotSettings));

    // Plugin stats
    fn stat(&self, plugin: &str) -> Option<StatEntry>;
    /// Creates a zeroed entry first if none exists.
    fn update_stat(&self, plugin: &str, f: &mut dyn FnMut(&mut StatEntry));
}
