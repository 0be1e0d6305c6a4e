//! Tool registry, plugin catalogs, and argument coercion.
//!
//! Tools are published to the dispatcher as immutable [`RegistrySnapshot`]s;
//! a reload builds a fresh snapshot from a [`PluginCatalog`] and swaps it in
//! through [`ToolRegistry::replace`].

#![warn(missing_docs, clippy::pedantic)]

pub mod bridge;
pub mod catalog;
pub mod coerce;
pub mod registry;

pub use bridge::{ExtraTools, bridge_aliases};
pub use catalog::{PluginCatalog, StaticCatalog, snapshot_from_catalog};
pub use coerce::{coerce_params, coerce_value};
pub use registry::{
    Params, RegistrySnapshot, RegistrySnapshotBuilder, Tool, ToolError, ToolHandle, ToolMetadata,
    ToolRegistry, ToolResult,
};
