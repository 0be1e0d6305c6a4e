//! Aliases for tools provided by external bridges.

use std::collections::HashMap;

use nit_primitives::normalize_key;

use crate::registry::ToolHandle;

/// Per-dispatch tool overrides keyed by registry key.
pub type ExtraTools = HashMap<String, ToolHandle>;

/// Produces the override entries for an externally provided tool: the
/// `mcp_<tool>` form and the bare tool name, both normalized.
#[must_use]
pub fn bridge_aliases(tool_name: &str, handle: &ToolHandle) -> ExtraTools {
    let mut aliases = ExtraTools::new();
    aliases.insert(normalize_key(&format!("mcp_{tool_name}")), handle.clone());
    aliases
        .entry(normalize_key(tool_name))
        .or_insert_with(|| handle.clone());
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Params, ToolMetadata};
    use serde_json::Value;

    #[test]
    fn produces_prefixed_and_bare_keys() {
        let handle = ToolHandle::new(
            ToolMetadata::new("web-search").unwrap(),
            |_params: Params| async move { Ok(Value::Null) },
        );
        let aliases = bridge_aliases("web-search", &handle);

        let mut keys: Vec<_> = aliases.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["mcpwebsearch", "websearch"]);
    }
}
