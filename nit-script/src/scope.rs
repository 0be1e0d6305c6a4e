//! Variable bindings for a single script run.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

/// Appended to string values cut down to [`ScopeLimits::max_string_len`].
pub const TRUNCATION_MARKER: &str = "... [truncated by NIT scope]";

/// Bounds applied to the variable scope of one script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeLimits {
    /// Maximum number of distinct variables.
    pub max_variables: usize,
    /// Maximum length, in characters, of a bound string value.
    pub max_string_len: usize,
}

impl Default for ScopeLimits {
    fn default() -> Self {
        Self {
            max_variables: 100,
            max_string_len: 100_000,
        }
    }
}

/// Variable scope; fresh for every script run.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    limits: ScopeLimits,
}

impl Scope {
    /// Creates an empty scope with the supplied limits.
    #[must_use]
    pub fn new(limits: ScopeLimits) -> Self {
        Self {
            vars: HashMap::new(),
            limits,
        }
    }

    /// Binds `value` to `name` and returns the value actually stored.
    ///
    /// Long strings are truncated. A new name beyond the variable limit is
    /// not stored, though the value is still returned to the caller.
    pub fn bind(&mut self, name: &str, value: Value) -> Value {
        let value = self.clamp(value);

        if !self.vars.contains_key(name) && self.vars.len() >= self.limits.max_variables {
            warn!(
                variable = name,
                limit = self.limits.max_variables,
                "variable limit reached; binding dropped"
            );
            return value;
        }

        self.vars.insert(name.to_owned(), value.clone());
        value
    }

    fn clamp(&self, value: Value) -> Value {
        let max = self.limits.max_string_len;
        match value {
            Value::String(text) if text.chars().count() > max => {
                let mut cut: String = text.chars().take(max).collect();
                cut.push_str(TRUNCATION_MARKER);
                warn!(limit = max, "string value truncated");
                Value::String(cut)
            }
            other => other,
        }
    }

    /// Looks up a bound value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Returns whether `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bound names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Limits in force.
    #[must_use]
    pub fn limits(&self) -> ScopeLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn caps_distinct_variables() {
        let mut scope = Scope::new(ScopeLimits {
            max_variables: 2,
            ..ScopeLimits::default()
        });
        scope.bind("a", json!(1));
        scope.bind("b", json!(2));
        let returned = scope.bind("c", json!(3));

        assert_eq!(returned, json!(3));
        assert_eq!(scope.len(), 2);
        assert!(!scope.contains("c"));

        scope.bind("a", json!(10));
        assert_eq!(scope.get("a"), Some(&json!(10)));
    }

    #[test]
    fn truncates_long_strings_by_characters() {
        let mut scope = Scope::new(ScopeLimits {
            max_string_len: 3,
            ..ScopeLimits::default()
        });
        let stored = scope.bind("s", json!("héllo"));
        assert_eq!(stored, json!(format!("hél{TRUNCATION_MARKER}")));

        let stored = scope.bind("n", json!({"text": "héllo"}));
        assert_eq!(stored, json!({"text": "héllo"}));
    }
}
