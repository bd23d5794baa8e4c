//! Plugin loader - builds descriptors from YAML manifests bound to compiled-in handlers

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::errors::{PluginError, PluginResult};
use crate::domain::entities::{PluginDescriptor, PluginHooks, PluginKind};
use crate::domain::traits::{CommandHandler, Listener};
use super::manifest::PluginManifest;

/// Produces a fresh descriptor for a plugin name
pub trait PluginLoader: Send + Sync {
    fn load(&self, name: &str) -> PluginResult<PluginDescriptor>;

    /// Every name this loader can produce, sorted
    fn available(&self) -> Vec<String>;
}

/// Primary handler of a catalog entry
#[derive(Clone)]
pub enum HandlerRef {
    Command(Arc<dyn CommandHandler>),
    Listener(Arc<dyn Listener>),
}

/// A compiled-in handler plus the manifest it ships with
#[derive(Clone)]
pub struct CatalogEntry {
    pub handler: HandlerRef,
    pub hooks: PluginHooks,
    pub manifest: String,
}

/// Name-keyed table of compiled-in handlers
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command<H>(mut self, key: &str, handler: H, manifest: &str) -> Self
    where
        H: CommandHandler + 'static,
    {
        self.entries.insert(
            key.to_string(),
            CatalogEntry {
                handler: HandlerRef::Command(Arc::new(handler)),
                hooks: PluginHooks::default(),
                manifest: manifest.to_string(),
            },
        );
        self
    }

    pub fn listener<H>(mut self, key: &str, handler: H, manifest: &str) -> Self
    where
        H: Listener + 'static,
    {
        self.entries.insert(
            key.to_string(),
            CatalogEntry {
                handler: HandlerRef::Listener(Arc::new(handler)),
                hooks: PluginHooks::default(),
                manifest: manifest.to_string(),
            },
        );
        self
    }

    /// Attach hooks to an entry already in the catalog
    pub fn with_hooks(mut self, key: &str, hooks: PluginHooks) -> Self {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.hooks = hooks;
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

/// Reads `<dir>/<name>.yaml`, falling back to the manifest the handler ships with
pub struct ManifestLoader {
    plugin_dir: Option<PathBuf>,
    catalog: HandlerCatalog,
}

impl ManifestLoader {
    pub fn new(plugin_dir: Option<PathBuf>, catalog: HandlerCatalog) -> Self {
        Self { plugin_dir, catalog }
    }

    pub fn plugin_dir(&self) -> Option<&Path> {
        self.plugin_dir.as_deref()
    }

    fn manifest_path(&self, name: &str) -> Option<PathBuf> {
        self.plugin_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.yaml", name)))
            .filter(|path| path.exists())
    }

    fn source(&self, name: &str) -> PluginResult<String> {
        if let Some(path) = self.manifest_path(name) {
            return std::fs::read_to_string(&path)
                .map_err(|e| PluginError::Load(format!("Failed to read {}: {}", path.display(), e)));
        }
        self.catalog
            .get(name)
            .map(|entry| entry.manifest.clone())
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }

    /// Build a descriptor from manifest source text
    pub fn build(&self, name: &str, source: &str) -> PluginResult<PluginDescriptor> {
        let manifest = PluginManifest::parse(name, source)?;
        let key = manifest.handler_key(name);
        let entry = self
            .catalog
            .get(key)
            .ok_or_else(|| PluginError::Load(format!("No handler '{}' for plugin '{}'", key, name)))?;

        let kind = match &entry.handler {
            HandlerRef::Command(handler) => PluginKind::Command {
                matcher: manifest.command_matcher(name)?,
                handler: handler.clone(),
            },
            HandlerRef::Listener(handler) => {
                if manifest.command.is_some() && !manifest.is_listener() {
                    return Err(PluginError::Malformed {
                        name: name.to_string(),
                        reason: format!("handler '{}' is a listener; use `command: false`", key),
                    });
                }
                PluginKind::Listener { handler: handler.clone() }
            }
        };

        Ok(PluginDescriptor {
            name: name.to_string(),
            kind,
            tags: manifest.tags.iter().cloned().collect::<BTreeSet<_>>(),
            help: manifest.help.clone(),
            disabled: manifest.disabled,
            custom_prefix: manifest.prefix(name)?,
            permissions: manifest.permissions,
            exp: manifest.exp,
            limit: manifest.limit,
            level: manifest.level,
            ban_policy: manifest.ban_policy,
            source_hash: Some(format!("{:x}", md5::compute(source.as_bytes()))),
            hooks: entry.hooks.clone(),
        })
    }
}

impl PluginLoader for ManifestLoader {
    fn load(&self, name: &str) -> PluginResult<PluginDescriptor> {
        let source = self.source(name)?;
        let descriptor = self.build(name, &source)?;
        tracing::debug!("Built plugin '{}' ({:?})", name, descriptor.source_hash);
        Ok(descriptor)
    }

    fn available(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.catalog.keys().cloned().collect();

        if let Some(dir) = &self.plugin_dir {
            match std::fs::read_dir(dir) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                            continue;
                        }
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            // Skip hidden files
                            if !stem.starts_with('.') {
                                names.insert(stem.to_string());
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("Plugin directory {} unreadable: {}", dir.display(), e),
            }
        }

        names.into_iter().collect()
    }
}
