//! Name normalization shared by the registry, the router, and coercion.

/// Normalizes a tool, plugin, or parameter name for lookup.
///
/// Lowercases the input and removes `_` and `-`, so `Read_File`, `read-file`
/// and `readfile` all collapse onto the same key.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Reduces a path-like name to its final component.
///
/// Models sometimes emit a tool's source path instead of its name; both `/`
/// and `\` are treated as separators and trailing separators are ignored.
/// Returns `None` when the name contains no separator.
#[must_use]
pub fn final_path_component(name: &str) -> Option<&str> {
    if !name.contains(['/', '\\']) {
        return None;
    }
    name.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_separators_and_case() {
        assert_eq!(normalize_key("Read_File"), "readfile");
        assert_eq!(normalize_key("read-file"), "readfile");
        assert_eq!(normalize_key("Files.List"), "files.list");
    }

    #[test]
    fn path_component_handles_both_separators() {
        assert_eq!(final_path_component("plain"), None);
        assert_eq!(
            final_path_component(r"backend\nit_core\tools\FileSearch"),
            Some("FileSearch")
        );
        assert_eq!(final_path_component("tools/core/search/"), Some("search"));
    }
}
