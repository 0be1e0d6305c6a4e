//! Category and plugin switches applied before a tool runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, warn};

/// Plugins still offered in lightweight mode unless configured otherwise.
pub const DEFAULT_LIGHTWEIGHT_ALLOWLIST: [&str; 3] = ["ScreenVision", "CharacterOps", "MemoryOps"];

/// Why the gate refused a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateDenial {
    /// Lightweight mode is on and the plugin is not allowlisted.
    #[error("plugin `{plugin}` is restricted in lightweight mode; available: {}", allowed.join(", "))]
    Lightweight {
        /// Owning plugin.
        plugin: String,
        /// Plugins that remain available.
        allowed: Vec<String>,
    },
    /// The plugin's category is switched off.
    #[error("category `{category}` is disabled")]
    Category {
        /// Category name.
        category: String,
    },
    /// The plugin itself is switched off.
    #[error("plugin `{plugin}` is disabled")]
    Plugin {
        /// Plugin name.
        plugin: String,
    },
}

#[derive(Debug, Default)]
struct GateState {
    categories: HashMap<String, bool>,
    plugins: HashMap<String, bool>,
    lightweight: bool,
    allowlist: BTreeSet<String>,
}

/// Two-level tool switchboard with a lightweight mode.
///
/// Categories and plugins are enabled unless explicitly switched off.
#[derive(Debug)]
pub struct ToolGate {
    state: RwLock<GateState>,
}

impl Default for ToolGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolGate {
    /// Creates a gate with everything enabled and the default allowlist.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GateState {
                allowlist: DEFAULT_LIGHTWEIGHT_ALLOWLIST
                    .iter()
                    .map(|p| (*p).to_owned())
                    .collect(),
                ..GateState::default()
            }),
        }
    }

    /// Switches a category on or off.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    pub fn set_category(&self, category: impl Into<String>, enabled: bool) {
        let category = category.into();
        debug!(%category, enabled, "category switch updated");
        let mut state = self.state.write().expect("tool gate poisoned");
        state.categories.insert(category, enabled);
    }

    /// Switches a plugin on or off.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    pub fn set_plugin(&self, plugin: impl Into<String>, enabled: bool) {
        let plugin = plugin.into();
        debug!(%plugin, enabled, "plugin switch updated");
        let mut state = self.state.write().expect("tool gate poisoned");
        state.plugins.insert(plugin, enabled);
    }

    /// Turns lightweight mode on or off.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    pub fn set_lightweight(&self, enabled: bool) {
        self.state.write().expect("tool gate poisoned").lightweight = enabled;
    }

    /// Replaces the lightweight-mode allowlist.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    pub fn set_allowlist<I, S>(&self, plugins: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowlist = plugins.into_iter().map(Into::into).collect();
        self.state.write().expect("tool gate poisoned").allowlist = allowlist;
    }

    /// Returns whether `category` is enabled.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    #[must_use]
    pub fn is_category_enabled(&self, category: &str) -> bool {
        let state = self.state.read().expect("tool gate poisoned");
        state.categories.get(category).copied().unwrap_or(true)
    }

    /// Returns whether `plugin` is enabled.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    #[must_use]
    pub fn is_plugin_enabled(&self, plugin: &str) -> bool {
        let state = self.state.read().expect("tool gate poisoned");
        state.plugins.get(plugin).copied().unwrap_or(true)
    }

    /// Returns whether lightweight mode is on.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    #[must_use]
    pub fn is_lightweight(&self) -> bool {
        self.state.read().expect("tool gate poisoned").lightweight
    }

    /// Checks a tool owned by `plugin` in `category`.
    ///
    /// # Errors
    ///
    /// Returns the first switch that refuses the tool, checking lightweight
    /// mode, then the category, then the plugin.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    pub fn check(&self, plugin: &str, category: &str) -> Result<(), GateDenial> {
        match self.denial(plugin, category) {
            Some(denial) => {
                warn!(plugin, category, %denial, "tool refused by gate");
                Err(denial)
            }
            None => Ok(()),
        }
    }

    /// Same decision as [`ToolGate::check`], without logging.
    ///
    /// # Panics
    ///
    /// Panics if the internal gate lock has been poisoned.
    #[must_use]
    pub fn permits(&self, plugin: &str, category: &str) -> bool {
        self.denial(plugin, category).is_none()
    }

    fn denial(&self, plugin: &str, category: &str) -> Option<GateDenial> {
        let state = self.state.read().expect("tool gate poisoned");

        if state.lightweight && !state.allowlist.contains(plugin) {
            Some(GateDenial::Lightweight {
                plugin: plugin.to_owned(),
                allowed: state.allowlist.iter().cloned().collect(),
            })
        } else if !state.categories.get(category).copied().unwrap_or(true) {
            Some(GateDenial::Category {
                category: category.to_owned(),
            })
        } else if !state.plugins.get(plugin).copied().unwrap_or(true) {
            Some(GateDenial::Plugin {
                plugin: plugin.to_owned(),
            })
        } else {
            None
        }
    }
}
