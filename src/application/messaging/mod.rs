//! Message handling - admission, prefix matching and plugin dispatch

pub mod admission;
pub mod dispatcher;
pub mod events;
pub mod parser;

pub use admission::{AdmissionQueue, QueueTicket, SpamGuard, SpamVerdict};
pub use dispatcher::{Clock, Denial, DispatchReport, DispatchState, Dispatcher};
pub use parser::{MessageParser, DEFAULT_PREFIX};
