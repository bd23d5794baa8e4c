//! Plugin registry - Manages loaded plugins

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::application::errors::PluginError;
use crate::domain::entities::PluginDescriptor;
use super::loader::PluginLoader;

type Table = BTreeMap<String, Arc<PluginDescriptor>>;

/// Name-keyed plugin table, iterated in name order.
///
/// Readers take a snapshot; writers swap in a modified copy, so a reload
/// never disturbs a dispatch that is already walking the table.
pub struct PluginRegistry {
    plugins: RwLock<Arc<Table>>,
    loader: Option<Arc<dyn PluginLoader>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(Arc::new(BTreeMap::new())),
            loader: None,
        }
    }

    pub fn with_loader(loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            loader: Some(loader),
            ..Self::new()
        }
    }

    /// Current table
    pub fn snapshot(&self) -> Arc<Table> {
        match self.plugins.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn swap(&self, edit: impl FnOnce(&mut Table)) {
        let mut guard = self.plugins.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = (**guard).clone();
        edit(&mut next);
        *guard = Arc::new(next);
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<Arc<PluginDescriptor>> {
        self.snapshot().get(name).cloned()
    }

    /// All plugin names, in dispatch order
    pub fn names(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    pub fn list(&self) -> Vec<Arc<PluginDescriptor>> {
        self.snapshot().values().cloned().collect()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    /// Insert or replace a descriptor
    pub fn insert(&self, descriptor: PluginDescriptor) {
        let name = descriptor.name.clone();
        self.swap(|table| {
            table.insert(name, Arc::new(descriptor));
        });
    }

    fn loader(&self) -> Result<&Arc<dyn PluginLoader>, PluginError> {
        self.loader
            .as_ref()
            .ok_or_else(|| PluginError::Internal("No plugin loader configured".to_string()))
    }

    /// Build a plugin through the loader and register it
    pub fn load(&self, name: &str) -> Result<(), PluginError> {
        let descriptor = self.loader()?.load(name)?;
        self.insert(descriptor);
        tracing::info!("Loaded plugin: {}", name);
        Ok(())
    }

    /// Rebuild a plugin. On error the previous descriptor stays registered.
    pub fn reload(&self, name: &str) -> Result<(), PluginError> {
        match self.loader()?.load(name) {
            Ok(descriptor) => {
                self.insert(descriptor);
                tracing::info!("Reloaded plugin: {}", name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Reload of '{}' failed, keeping previous version: {}", name, e);
                Err(e)
            }
        }
    }

    /// Load everything the loader knows about. Failures are returned, not fatal.
    pub fn load_all(&self) -> Vec<(String, PluginError)> {
        let Ok(loader) = self.loader() else {
            return Vec::new();
        };
        let mut failures = Vec::new();
        for name in loader.available() {
            if let Err(e) = self.load(&name) {
                tracing::warn!("Failed to load plugin {}: {}", name, e);
                failures.push((name, e));
            }
        }
        failures
    }

    /// Unload a plugin
    pub fn unload(&self, name: &str) -> Result<(), PluginError> {
        if !self.is_loaded(name) {
            return Err(PluginError::NotFound(name.to_string()));
        }
        self.swap(|table| {
            table.remove(name);
        });
        tracing::info!("Unloaded plugin: {}", name);
        Ok(())
    }

    /// Reload hook for external watchers: `Some` replaces, `None` removes
    pub fn on_plugin_changed(&self, name: &str, descriptor: Option<PluginDescriptor>) {
        match descriptor {
            Some(mut descriptor) => {
                descriptor.name = name.to_string();
                self.insert(descriptor);
                tracing::info!("Plugin changed: {}", name);
            }
            None => {
                if self.unload(name).is_err() {
                    tracing::debug!("Removed plugin {} was not loaded", name);
                }
            }
        }
    }

    /// Get the number of loaded plugins
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if no plugins are loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CommandMatcher, Message};
    use crate::domain::traits::{CommandHandler, HandlerResult, HookContext};
    use crate::infrastructure::plugins::loader::{HandlerCatalog, ManifestLoader};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, _msg: &mut Message, _ctx: &HookContext<'_>) -> HandlerResult {
            Ok(())
        }
    }

    fn plugin(name: &str) -> PluginDescriptor {
        PluginDescriptor::command(name, CommandMatcher::words([name]), Noop)
    }

    #[test]
    fn test_lexicographic_order() {
        let registry = PluginRegistry::new();
        registry.insert(plugin("menu"));
        registry.insert(plugin("afk"));
        registry.insert(plugin("ping"));
        assert_eq!(registry.names(), vec!["afk", "menu", "ping"]);
    }

    #[test]
    fn test_snapshot_is_stable_across_swaps() {
        let registry = PluginRegistry::new();
        registry.insert(plugin("a"));
        let before = registry.snapshot();
        registry.insert(plugin("b"));
        registry.unload("a").unwrap();
        assert_eq!(before.len(), 1);
        assert!(before.contains_key("a"));
        assert_eq!(registry.names(), vec!["b"]);
    }

    #[test]
    fn test_unload_missing() {
        let registry = PluginRegistry::new();
        assert!(matches!(registry.unload("ghost"), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn test_reload_failure_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shout.yaml");
        std::fs::write(&path, "handler: noop\ncommand: shout\n").unwrap();

        let catalog = HandlerCatalog::new().command("noop", Noop, "command: noop\n");
        let loader = ManifestLoader::new(Some(dir.path().to_path_buf()), catalog);
        let registry = PluginRegistry::with_loader(Arc::new(loader));
        registry.load("shout").unwrap();
        let first = registry.get("shout").unwrap();

        std::fs::write(&path, "handler: noop\ncommand: { pattern: '(' }\n").unwrap();
        assert!(matches!(registry.reload("shout"), Err(PluginError::Malformed { .. })));
        let kept = registry.get("shout").unwrap();
        assert!(Arc::ptr_eq(&first, &kept));

        std::fs::write(&path, "handler: noop\ncommand: shout\n").unwrap();
        registry.reload("shout").unwrap();
        assert!(first.same_definition(&registry.get("shout").unwrap()));
    }

    #[test]
    fn test_plugin_changed_hook() {
        let registry = PluginRegistry::new();
        registry.on_plugin_changed("ping", Some(plugin("pong")));
        assert_eq!(registry.get("ping").unwrap().name, "ping");
        registry.on_plugin_changed("ping", None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_all_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "handler: missing\n").unwrap();
        let catalog = HandlerCatalog::new().command("noop", Noop, "command: noop\n");
        let registry = PluginRegistry::with_loader(Arc::new(ManifestLoader::new(
            Some(dir.path().to_path_buf()),
            catalog,
        )));

        let failures = registry.load_all();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "broken");
        assert_eq!(registry.names(), vec!["noop"]);
    }
}
