//! Domain layer - Core business objects and abstractions
//!
//! This layer contains:
//! - Entities: Messages, records, plugin descriptors
//! - Traits: Abstractions for infrastructure (Bot, Store, DiagnosticsSink) and the plugin contract

pub mod entities;
pub mod traits;
