//! Application services - authorization, gates and accounting

pub mod authorization;
pub mod ban_gate;
pub mod ledger;
pub mod permission;
pub mod stats;

pub use authorization::{normalize_id, AuthorizationResolver};
pub use ban_gate::{BanEffects, BanGate, BanVerdict};
pub use ledger::{Award, ResourceLedger};
pub use permission::{PermissionRule, Subject, PERMISSION_RULES};
pub use stats::StatsRecorder;
