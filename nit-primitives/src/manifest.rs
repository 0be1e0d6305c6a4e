//! Plugin metadata advertised by the plugin catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, normalize_key};

const DEFAULT_CATEGORY: &str = "core";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

/// Describes one invocable command exposed by a plugin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDefinition {
    command_identifier: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_schema: Option<Value>,
}

impl CommandDefinition {
    /// Creates a command definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidManifest`] when the identifier is blank.
    pub fn new(
        command_identifier: impl Into<String>,
        description: impl Into<String>,
    ) -> crate::Result<Self> {
        let command_identifier = command_identifier.into();
        if command_identifier.trim().is_empty() {
            return Err(Error::InvalidManifest {
                reason: "command identifier cannot be empty".into(),
            });
        }
        Ok(Self {
            command_identifier,
            description: description.into(),
            input_schema: None,
        })
    }

    /// Attaches a JSON-schema-like description of the command parameters.
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Returns the identifier used to invoke the command.
    #[must_use]
    pub fn command_identifier(&self) -> &str {
        &self.command_identifier
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared input schema, if any.
    #[must_use]
    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invocation_commands: Option<Vec<CommandDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_definitions: Option<Vec<CommandDefinition>>,
}

/// Metadata describing a plugin and the commands it exposes.
///
/// Deserializes from the catalog's JSON manifests, where commands live under
/// `capabilities.invocationCommands` or, for bridged plugins,
/// `capabilities.toolDefinitions`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "_category", default = "default_category")]
    category: String,
    #[serde(default)]
    capabilities: Capabilities,
}

impl PluginManifest {
    /// Starts building a [`PluginManifest`].
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PluginManifestBuilder {
        PluginManifestBuilder {
            name: name.into(),
            display_name: None,
            description: None,
            category: default_category(),
            commands: Vec::new(),
        }
    }

    /// Returns the plugin name used for namespacing (`PluginName.ToolName`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized plugin name used as category key.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_key(&self.name)
    }

    /// Returns the display name, falling back to the plugin name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the optional plugin description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the catalog category (`core`, `work`, `plugins`, ...).
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the commands exposed by the plugin.
    ///
    /// `invocationCommands` take precedence over `toolDefinitions` when both
    /// are present.
    #[must_use]
    pub fn commands(&self) -> &[CommandDefinition] {
        self.capabilities
            .invocation_commands
            .as_deref()
            .or(self.capabilities.tool_definitions.as_deref())
            .unwrap_or_default()
    }

    /// Looks up a command by its identifier.
    #[must_use]
    pub fn command(&self, identifier: &str) -> Option<&CommandDefinition> {
        self.commands()
            .iter()
            .find(|cmd| cmd.command_identifier() == identifier)
    }
}

/// Builder for [`PluginManifest`].
#[derive(Debug)]
pub struct PluginManifestBuilder {
    name: String,
    display_name: Option<String>,
    description: Option<String>,
    category: String,
    commands: Vec<CommandDefinition>,
}

impl PluginManifestBuilder {
    /// Sets the human-readable display name.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets an optional description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the catalog category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Adds a command definition.
    #[must_use]
    pub fn command(mut self, command: CommandDefinition) -> Self {
        self.commands.push(command);
        self
    }

    /// Consumes the builder and returns the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidManifest`] when the plugin name or category is
    /// blank.
    pub fn build(self) -> crate::Result<PluginManifest> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidManifest {
                reason: "plugin name cannot be empty".into(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidManifest {
                reason: "plugin category cannot be empty".into(),
            });
        }

        Ok(PluginManifest {
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            category: self.category,
            capabilities: Capabilities {
                invocation_commands: Some(self.commands),
                tool_definitions: None,
            },
        })
    }
}
