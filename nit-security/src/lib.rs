//! Script-block security for the NIT engine.
//!
//! Covers the per-turn NIT-ID handshake, the verdict applied to each script
//! block, and the [`ToolGate`] switchboard consulted before a tool runs.

#![warn(missing_docs, clippy::pedantic)]

pub mod error;
pub mod gate;
pub mod handshake;
pub mod verdict;

pub use error::{SecurityError, SecurityResult};
pub use gate::{DEFAULT_LIGHTWEIGHT_ALLOWLIST, GateDenial, ToolGate};
pub use handshake::{DEFAULT_SYSTEM_SALT, SecurityManager, Validation, handshake_prompt};
pub use verdict::{BlockVerdict, TagPolicy, verdict};
