//! Plugin system
//!
//! Plugins are compiled-in handlers described by YAML manifests. A manifest in
//! the plugin directory overrides the one a handler ships with, and is the
//! source a reload re-reads.

pub mod loader;
pub mod manifest;
pub mod registry;

pub use loader::{CatalogEntry, HandlerCatalog, HandlerRef, ManifestLoader, PluginLoader};
pub use manifest::{CommandSpec, PatternOrWord, PluginManifest, PrefixField};
pub use registry::PluginRegistry;
