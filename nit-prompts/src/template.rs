//! `{{variable}}` prompt templates.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A required variable was not provided.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// The template text lacks a placeholder the caller fills in.
    #[error("template has no {{{{{name}}}}} placeholder")]
    MissingPlaceholder {
        /// Name of the absent placeholder.
        name: String,
    },
}

/// Prompt text with `{{variable}}` placeholders.
///
/// Unknown optional placeholders render as empty strings. Substituted values
/// are not rescanned, so a value containing `{{x}}` is inserted verbatim.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
    variables: HashMap<String, String>,
    required: Vec<String>,
}

impl PromptTemplate {
    /// Creates a template from text.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Sets a default value.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Declares a variable that must have a value at render time.
    #[must_use]
    pub fn with_required_variable(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Sets a variable value in place.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Names referenced by the template, in order of first appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in PLACEHOLDER
            .captures_iter(&self.template)
            .filter_map(|captures| captures.get(1))
            .map(|m| m.as_str())
        {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Renders with the stored variables.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] if a required variable is
    /// not set.
    pub fn render(&self) -> TemplateResult<String> {
        self.render_with(&HashMap::new())
    }

    /// Renders with `overrides` taking precedence over stored variables.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] if a required variable is
    /// not set.
    pub fn render_with(&self, overrides: &HashMap<String, String>) -> TemplateResult<String> {
        let lookup = |name: &str| overrides.get(name).or_else(|| self.variables.get(name));

        if let Some(missing) = self.required.iter().find(|name| lookup(name.as_str()).is_none()) {
            return Err(TemplateError::MissingVariable {
                name: missing.clone(),
            });
        }

        let rendered = PLACEHOLDER.replace_all(&self.template, |captures: &Captures<'_>| {
            lookup(&captures[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    /// Raw template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
