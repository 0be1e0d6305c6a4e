//! Prompt text for the NIT engine: templates, tool catalogs, and the usage
//! section injected into system prompts.

#![warn(missing_docs, clippy::pedantic)]

pub mod catalog;
pub mod template;
pub mod usage;

pub use catalog::{CategoryFilter, UnknownFilter, describe_plugins};
pub use template::{PromptTemplate, TemplateError, TemplateResult};
pub use usage::{NitPromptBuilder, USAGE_TEMPLATE};
