//! Configuration for the NIT engine.
//!
//! Settings live in a JSON file. Omitted fields take their defaults, so a
//! partial file only needs to name the switches it changes.

#![warn(missing_docs, clippy::pedantic)]

mod settings;

pub use settings::{ConfigError, ConfigResult, NitSettings, ScopeSettings, SecuritySettings};
