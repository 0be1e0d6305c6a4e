//! NIT tool-invocation scripting engine facade.
//!
//! Depend on this crate via `cargo add nit-engine`. It bundles the engine's
//! crates behind feature flags so hosts can pull in only the parts they need,
//! for example just the stream filters for a voice pipeline.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use nit_primitives as primitives;

/// Lexer, parser, and runtime (enabled by `script` feature).
#[cfg(feature = "script")]
pub use nit_script as script;

/// Tool registry, catalogs, and coercion (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use nit_tools as tools;

/// NIT-ID handshake, block verdicts, and the tool gate (enabled by `security` feature).
#[cfg(feature = "security")]
pub use nit_security as security;

/// Settings file handling (enabled by `config` feature).
#[cfg(feature = "config")]
pub use nit_config as config;

/// Tracing bootstrap and invocation records (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use nit_telemetry as telemetry;

/// Prompt templates and tool catalogs (enabled by `prompts` feature).
#[cfg(feature = "prompts")]
pub use nit_prompts as prompts;

/// Streaming output filters (enabled by `stream` feature).
#[cfg(feature = "stream")]
pub use nit_stream as stream;

/// Script block dispatcher (enabled by `dispatch` feature).
#[cfg(feature = "dispatch")]
pub use nit_dispatch as dispatch;
