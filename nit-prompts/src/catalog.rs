//! Tool catalog text injected into system prompts.

use std::fmt::Write as _;
use std::str::FromStr;

use nit_primitives::{CommandDefinition, PluginManifest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which plugin categories a description covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    /// Built-in tools.
    #[default]
    Core,
    /// Work-mode tools.
    Work,
    /// Third-party plugins.
    Plugins,
    /// Every category.
    All,
}

impl CategoryFilter {
    /// Whether a plugin in `category` passes the filter.
    #[must_use]
    pub fn matches(self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Core => category == "core",
            Self::Work => category == "work",
            Self::Plugins => category == "plugins",
        }
    }
}

/// Unrecognised category filter name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category filter `{0}`; expected core, work, plugins, or all")]
pub struct UnknownFilter(pub String);

impl FromStr for CategoryFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "core" => Ok(Self::Core),
            "work" => Ok(Self::Work),
            "plugins" => Ok(Self::Plugins),
            "all" => Ok(Self::All),
            _ => Err(UnknownFilter(s.to_owned())),
        }
    }
}

/// Renders one markdown section per manifest, sorted by plugin name.
///
/// ```text
/// ### Display Name
/// - **Summary**: what the plugin does
/// - **Commands**:
///   - `command`: description (Args: a, b)
/// ```
#[must_use]
pub fn describe_plugins<'a, I>(manifests: I) -> String
where
    I: IntoIterator<Item = &'a PluginManifest>,
{
    let mut manifests: Vec<_> = manifests.into_iter().collect();
    manifests.sort_by(|a, b| a.name().cmp(b.name()));

    manifests
        .into_iter()
        .map(describe_plugin)
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_plugin(manifest: &PluginManifest) -> String {
    let mut section = format!("### {}\n", manifest.display_name());
    let _ = writeln!(
        section,
        "- **Summary**: {}",
        manifest.description().unwrap_or_default()
    );

    let commands = manifest.commands();
    if !commands.is_empty() {
        section.push_str("- **Commands**:\n");
        for command in commands {
            let _ = writeln!(
                section,
                "  - `{}`: {}{}",
                command.command_identifier(),
                command.description(),
                argument_hint(command)
            );
        }
    }
    section
}

fn argument_hint(command: &CommandDefinition) -> String {
    let names: Vec<&str> = command
        .input_schema()
        .and_then(|schema| schema.get("properties"))
        .and_then(|properties| properties.as_object())
        .map(|properties| properties.keys().map(String::as_str).collect())
        .unwrap_or_default();

    if names.is_empty() {
        String::new()
    } else {
        format!(" (Args: {})", names.join(", "))
    }
}
