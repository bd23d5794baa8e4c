//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Record store with JSON snapshots
//! - Plugins: Manifests, loader and registry
//! - Diagnostics: Failure reports over HTTP
//! - Adapters: Transport integrations (console)

pub mod adapters;
pub mod config;
pub mod diagnostics;
pub mod plugins;
pub mod storage;
