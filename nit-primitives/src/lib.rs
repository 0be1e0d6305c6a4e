//! Core shared types for the NIT tool-invocation engine.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod key;
mod manifest;

/// Error type and result alias shared across the engine.
pub use error::{Error, Result};
/// Per-turn handshake identifier carried by `<nit-XXXX>` tags.
pub use ids::NitId;
/// Name normalization used for tool, plugin, and parameter lookups.
pub use key::{final_path_component, normalize_key};
/// Plugin metadata describing the tools a plugin exposes.
pub use manifest::{CommandDefinition, PluginManifest, PluginManifestBuilder};
