//! Domain entities - Core business objects with no external dependencies

pub mod access;
pub mod chat;
pub mod event;
pub mod group;
pub mod message;
pub mod plugin;
pub mod stat;
pub mod user;

pub use access::{Access, FailKind};
pub use chat::{BotSettings, ChatRecord};
pub use event::{CallEvent, DeletionEvent, GroupUpdate, ParticipantAction, ParticipantsUpdate};
pub use group::{AdminRole, GroupInfo, GroupMetadata, Participant};
pub use message::{InboundEvent, Message, PrefixMatch};
pub use plugin::{
    BanPolicy, CommandItem, CommandMatcher, PermissionRequirements, PluginDescriptor, PluginHooks,
    PluginKind, PrefixEntry, PrefixSpec,
};
pub use stat::StatEntry;
pub use user::UserRecord;
