//! Persistent engine settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use nit_script::ScopeLimits;
use nit_security::{
    DEFAULT_LIGHTWEIGHT_ALLOWLIST, DEFAULT_SYSTEM_SALT, SecurityManager, TagPolicy, ToolGate,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading or writing settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be read or written.
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Settings file is not valid JSON for [`NitSettings`].
    #[error("settings serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Scope bounds as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    /// Maximum number of distinct variables per script.
    pub max_variables: usize,
    /// Maximum characters per bound string.
    pub max_string_len: usize,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        let limits = ScopeLimits::default();
        Self {
            max_variables: limits.max_variables,
            max_string_len: limits.max_string_len,
        }
    }
}

impl From<ScopeSettings> for ScopeLimits {
    fn from(settings: ScopeSettings) -> Self {
        Self {
            max_variables: settings.max_variables,
            max_string_len: settings.max_string_len,
        }
    }
}

/// Handshake settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Treatment of untagged `<nit>` blocks.
    pub tag_policy: TagPolicy,
    /// Deployment salt; the built-in salt is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_salt: Option<String>,
}

impl SecuritySettings {
    /// Salt to derive session secrets with.
    #[must_use]
    pub fn salt(&self) -> &str {
        self.system_salt.as_deref().unwrap_or(DEFAULT_SYSTEM_SALT)
    }

    /// Handshake manager keyed with [`SecuritySettings::salt`].
    #[must_use]
    pub fn manager(&self) -> SecurityManager {
        SecurityManager::new(self.salt())
    }
}

/// Engine settings stored as JSON. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NitSettings {
    /// Category switches (`core`, `work`, `plugins`).
    pub categories: BTreeMap<String, bool>,
    /// Plugin switches by plugin name.
    pub plugins: BTreeMap<String, bool>,
    /// Restrict tools to [`NitSettings::lightweight_allowlist`].
    pub lightweight_mode: bool,
    /// Plugins available in lightweight mode.
    pub lightweight_allowlist: Vec<String>,
    /// Variable scope bounds.
    pub scope: ScopeSettings,
    /// Handshake settings.
    pub security: SecuritySettings,
}

impl Default for NitSettings {
    fn default() -> Self {
        Self {
            categories: ["core", "work", "plugins"]
                .into_iter()
                .map(|c| (c.to_owned(), true))
                .collect(),
            plugins: BTreeMap::new(),
            lightweight_mode: false,
            lightweight_allowlist: DEFAULT_LIGHTWEIGHT_ALLOWLIST
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
            scope: ScopeSettings::default(),
            security: SecuritySettings::default(),
        }
    }
}

impl NitSettings {
    /// Parses settings from JSON, filling omitted fields with defaults.
    /// Category and plugin switches in the text are merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialization`] for malformed JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let parsed: Self = serde_json::from_str(json)?;
        let mut settings = Self::default();
        settings.categories.extend(parsed.categories);
        settings.plugins.extend(parsed.plugins);
        settings.lightweight_mode = parsed.lightweight_mode;
        settings.lightweight_allowlist = parsed.lightweight_allowlist;
        settings.scope = parsed.scope;
        settings.security = parsed.security;
        Ok(settings)
    }

    /// Loads settings from `path`. A missing file yields the defaults, which
    /// are written back to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or the
    /// defaults cannot be written.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "settings file missing; writing defaults");
            let settings = Self::default();
            settings.save(path)?;
            return Ok(settings);
        }

        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Writes settings to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Switches a category on or off.
    pub fn set_category(&mut self, category: impl Into<String>, enabled: bool) {
        self.categories.insert(category.into(), enabled);
    }

    /// Switches a plugin on or off.
    pub fn set_plugin(&mut self, plugin: impl Into<String>, enabled: bool) {
        self.plugins.insert(plugin.into(), enabled);
    }

    /// Scope limits for script runs.
    #[must_use]
    pub fn scope_limits(&self) -> ScopeLimits {
        self.scope.into()
    }

    /// Builds a [`ToolGate`] reflecting these settings.
    #[must_use]
    pub fn tool_gate(&self) -> ToolGate {
        let gate = ToolGate::new();
        self.apply_to(&gate);
        gate
    }

    /// Pushes these settings into an existing gate.
    pub fn apply_to(&self, gate: &ToolGate) {
        for (category, enabled) in &self.categories {
            gate.set_category(category.clone(), *enabled);
        }
        for (plugin, enabled) in &self.plugins {
            gate.set_plugin(plugin.clone(), *enabled);
        }
        gate.set_lightweight(self.lightweight_mode);
        gate.set_allowlist(self.lightweight_allowlist.iter().cloned());
    }
}
