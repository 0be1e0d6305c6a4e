//! Runtime registry for tool metadata and execution.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use nit_primitives::normalize_key;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::coerce::coerce_params;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Named parameters passed to a tool.
pub type Params = Map<String, Value>;

/// Metadata describing a registered tool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<Value>,
}

impl ToolMetadata {
    /// Creates metadata for the supplied tool name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if the name is empty.
    pub fn new(name: impl Into<String>) -> ToolResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::InvalidMetadata {
                reason: "tool name cannot be empty".into(),
            });
        }

        Ok(Self {
            name,
            description: None,
            plugin: None,
            category: None,
            input_schema: None,
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Records the owning plugin and its category.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>, category: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self.category = Some(category.into());
        self
    }

    /// Attaches a JSON schema used to coerce string arguments.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the owning plugin, if the tool came from a manifest.
    #[must_use]
    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    /// Returns the owning plugin's category.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the input schema.
    #[must_use]
    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }
}

/// Trait implemented by tool executors.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with named parameters, returning JSON output.
    async fn invoke(&self, params: Params) -> ToolResult<Value>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(Params) -> Fut,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    async fn invoke(&self, params: Params) -> ToolResult<Value> {
        (self)(params).await
    }
}

/// Handle pairing tool metadata with its implementation.
#[derive(Clone)]
pub struct ToolHandle {
    metadata: ToolMetadata,
    executor: Arc<dyn Tool>,
}

impl std::fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandle")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ToolHandle {
    /// Creates a handle from metadata and an implementation.
    #[must_use]
    pub fn new<T>(metadata: ToolMetadata, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        Self {
            metadata,
            executor: Arc::new(tool),
        }
    }

    /// Creates a handle for a synchronous function run on tokio's blocking
    /// pool.
    #[must_use]
    pub fn blocking<F>(metadata: ToolMetadata, func: F) -> Self
    where
        F: Fn(Params) -> ToolResult<Value> + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        Self::new(metadata, move |params: Params| {
            let func = Arc::clone(&func);
            async move {
                tokio::task::spawn_blocking(move || func(params))
                    .await
                    .map_err(|err| ToolError::execution(format!("blocking tool aborted: {err}")))?
            }
        })
    }

    /// Returns the associated metadata.
    #[must_use]
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Returns a copy of this handle carrying different metadata.
    #[must_use]
    pub fn with_metadata(&self, metadata: ToolMetadata) -> Self {
        Self {
            metadata,
            executor: Arc::clone(&self.executor),
        }
    }

    /// Executes the tool, first coercing string arguments toward the input
    /// schema when one is attached.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the underlying implementation.
    pub async fn invoke(&self, params: Params) -> ToolResult<Value> {
        let params = match self.metadata.input_schema() {
            Some(schema) => coerce_params(params, schema),
            None => params,
        };
        self.executor.invoke(params).await
    }
}

/// Immutable view of every registered tool.
#[derive(Debug, Default, Clone)]
pub struct RegistrySnapshot {
    tools: HashMap<String, ToolHandle>,
    categories: HashMap<String, Vec<String>>,
}

impl RegistrySnapshot {
    /// Starts building a snapshot.
    #[must_use]
    pub fn builder() -> RegistrySnapshotBuilder {
        RegistrySnapshotBuilder::default()
    }

    /// Looks up a tool by registry key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ToolHandle> {
        self.tools.get(key)
    }

    /// Tool names registered under a normalized plugin name.
    #[must_use]
    pub fn category(&self, normalized_plugin: &str) -> Option<&[String]> {
        self.categories.get(normalized_plugin).map(Vec::as_slice)
    }

    /// Registry keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.tools.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of registry keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Accumulates entries for a new [`RegistrySnapshot`].
#[derive(Debug, Default)]
pub struct RegistrySnapshotBuilder {
    tools: HashMap<String, ToolHandle>,
    categories: HashMap<String, Vec<String>>,
}

impl RegistrySnapshotBuilder {
    /// Registers `handle` under the normalized form of `name`, and under
    /// `name` itself when that differs and is still free.
    pub fn register(&mut self, name: &str, handle: ToolHandle) -> &mut Self {
        let normalized = normalize_key(name);
        if normalized != name && !self.tools.contains_key(name) {
            self.tools.insert(name.to_owned(), handle.clone());
        }
        self.tools.insert(normalized, handle);
        self
    }

    /// Ensures a category entry exists for `plugin`.
    pub fn declare_category(&mut self, plugin: &str) -> &mut Self {
        self.categories.entry(normalize_key(plugin)).or_default();
        self
    }

    /// Lists `tool` under the category of `plugin`.
    pub fn add_to_category(&mut self, plugin: &str, tool: &str) -> &mut Self {
        self.categories
            .entry(normalize_key(plugin))
            .or_default()
            .push(tool.to_owned());
        self
    }

    /// Finishes the snapshot.
    #[must_use]
    pub fn build(self) -> RegistrySnapshot {
        RegistrySnapshot {
            tools: self.tools,
            categories: self.categories,
        }
    }
}

/// Registry publishing snapshots that are swapped atomically.
#[derive(Default)]
pub struct ToolRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.read().expect("tool registry poisoned");
        f.debug_struct("ToolRegistry")
            .field("registered", &current.keys())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry publishing `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the current snapshot. The lock is released before returning.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read().expect("tool registry poisoned"))
    }

    /// Publishes a new snapshot, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn replace(&self, snapshot: RegistrySnapshot) -> Arc<RegistrySnapshot> {
        let mut current = self.current.write().expect("tool registry poisoned");
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }
}

/// Errors produced by tool resolution and invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Tool metadata failed validation.
    #[error("invalid tool metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Requested tool does not exist.
    #[error("tool `{name}` not found (normalized: {normalized})")]
    UnknownTool {
        /// Name as requested.
        name: String,
        /// Registry key that was looked up.
        normalized: String,
    },

    /// Requested name is a plugin, not a tool.
    #[error("`{name}` is a plugin category, not a tool; try one of: {}", tools.join(", "))]
    Category {
        /// Name as requested.
        name: String,
        /// Tools offered by the plugin.
        tools: Vec<String>,
    },

    /// Tool exists but is switched off.
    #[error("tool disabled: {reason}")]
    Disabled {
        /// Which switch rejected the call.
        reason: String,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}
