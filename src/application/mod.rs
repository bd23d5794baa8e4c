//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Authorization, ban gate, permission rules, ledger, stats
//! - Errors: Domain-specific errors
//! - Messaging: Prefix matching, admission control, dispatching, auxiliary events

pub mod errors;
pub mod services;
pub mod messaging;
