//! Plugin catalogs supplying tools and manifests to the registry.

use std::collections::BTreeMap;
use std::sync::RwLock;

use nit_primitives::PluginManifest;
use serde_json::Value;
use tracing::{debug, info};

use crate::registry::{Params, RegistrySnapshot, Tool, ToolHandle, ToolMetadata, ToolResult};

/// Source of tools and plugin manifests.
pub trait PluginCatalog: Send + Sync {
    /// Every tool the catalog can execute, keyed by its metadata name.
    fn list_tools(&self) -> Vec<ToolHandle>;

    /// Manifests describing how tools group into plugins.
    fn list_manifests(&self) -> Vec<PluginManifest>;

    /// Re-reads the underlying plugin source. The default does nothing.
    ///
    /// # Errors
    ///
    /// Implementations report failures to rescan their source.
    fn reload(&self) -> ToolResult<()> {
        Ok(())
    }
}

/// Builds a registry snapshot from the catalog's current contents.
///
/// Every tool is registered under its own name, in name order, so the later
/// name wins a normalized-key collision. Tools named by a manifest command
/// additionally get the manifest's schema, plugin, and category, a
/// `Plugin.Tool` entry, and a place in the plugin's category listing.
/// Manifests apply in plugin-name order.
#[must_use]
pub fn snapshot_from_catalog(catalog: &dyn PluginCatalog) -> RegistrySnapshot {
    let tools: BTreeMap<String, ToolHandle> = catalog
        .list_tools()
        .into_iter()
        .map(|handle| (handle.metadata().name().to_owned(), handle))
        .collect();

    let mut builder = RegistrySnapshot::builder();
    for (name, handle) in &tools {
        builder.register(name, handle.clone());
    }

    let mut manifests = catalog.list_manifests();
    manifests.sort_by(|a, b| a.name().cmp(b.name()));
    for manifest in manifests {
        builder.declare_category(manifest.name());

        for command in manifest.commands() {
            let id = command.command_identifier();
            let Some(handle) = tools.get(id) else {
                debug!(plugin = manifest.name(), command = id, "manifest command has no tool");
                continue;
            };

            let mut metadata = handle
                .metadata()
                .clone()
                .with_plugin(manifest.name(), manifest.category());
            if metadata.description().is_none() && !command.description().is_empty() {
                metadata = metadata.with_description(command.description());
            }
            if let Some(schema) = command.input_schema() {
                metadata = metadata.with_input_schema(schema.clone());
            }
            let handle = handle.with_metadata(metadata);

            builder.add_to_category(manifest.name(), id);
            builder.register(id, handle.clone());
            builder.register(&format!("{}.{id}", manifest.name()), handle);
        }
    }

    let snapshot = builder.build();
    info!(entries = snapshot.len(), "tool registry snapshot built");
    snapshot
}

/// In-memory catalog, editable at runtime.
#[derive(Default)]
pub struct StaticCatalog {
    tools: RwLock<Vec<ToolHandle>>,
    manifests: RwLock<Vec<PluginManifest>>,
}

impl std::fmt::Debug for StaticCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tools = self.tools.read().expect("catalog poisoned");
        let names: Vec<_> = tools.iter().map(|t| t.metadata().name().to_owned()).collect();
        f.debug_struct("StaticCatalog").field("tools", &names).finish()
    }
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an async tool.
    #[must_use]
    pub fn with_tool<T>(self, metadata: ToolMetadata, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        self.insert(ToolHandle::new(metadata, tool));
        self
    }

    /// Adds a synchronous tool.
    #[must_use]
    pub fn with_blocking_tool<F>(self, metadata: ToolMetadata, func: F) -> Self
    where
        F: Fn(Params) -> ToolResult<Value> + Send + Sync + 'static,
    {
        self.insert(ToolHandle::blocking(metadata, func));
        self
    }

    /// Adds a plugin manifest.
    #[must_use]
    pub fn with_manifest(self, manifest: PluginManifest) -> Self {
        self.insert_manifest(manifest);
        self
    }

    /// Adds or replaces a tool by name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, handle: ToolHandle) {
        let mut tools = self.tools.write().expect("catalog poisoned");
        tools.retain(|t| t.metadata().name() != handle.metadata().name());
        tools.push(handle);
    }

    /// Adds or replaces a manifest by plugin name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_manifest(&self, manifest: PluginManifest) {
        let mut manifests = self.manifests.write().expect("catalog poisoned");
        manifests.retain(|m| m.name() != manifest.name());
        manifests.push(manifest);
    }

    /// Removes a tool by name, returning whether it existed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, name: &str) -> bool {
        let mut tools = self.tools.write().expect("catalog poisoned");
        let before = tools.len();
        tools.retain(|t| t.metadata().name() != name);
        tools.len() != before
    }
}

impl PluginCatalog for StaticCatalog {
    fn list_tools(&self) -> Vec<ToolHandle> {
        self.tools.read().expect("catalog poisoned").clone()
    }

    fn list_manifests(&self) -> Vec<PluginManifest> {
        self.manifests.read().expect("catalog poisoned").clone()
    }
}
