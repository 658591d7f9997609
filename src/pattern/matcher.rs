//! Matching normalized paths against compiled patterns.

use crate::pattern::compiler::CompiledPattern;

/// Inputs longer than this are rejected before the regex runs.
pub const MAX_MATCH_INPUT: usize = 16 * 1024;

/// Values captured from a path, looked up case-insensitively by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables {
    entries: Vec<(String, String)>,
}

impl PathVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatchResult {
    pub variables: PathVariables,
    /// The part of the path the pattern did not consume, starting with `/`,
    /// without the trailing `/` added by normalization. Empty when the whole
    /// path was consumed.
    pub path_suffix: String,
}

/// Match a normalized path against a compiled pattern.
///
/// Oversized input counts as a match timeout: it is logged and treated as no
/// match.
pub fn match_path(compiled: &CompiledPattern, normalized_path: &str) -> Option<PatternMatchResult> {
    if normalized_path.len() > MAX_MATCH_INPUT {
        tracing::error!(
            pattern = %compiled.pattern(),
            length = normalized_path.len(),
            "Pattern match aborted: path exceeds the match limit"
        );
        return None;
    }

    let captures = compiled.regex().captures(normalized_path)?;
    let full = captures.get(0)?;

    let mut variables = PathVariables::new();
    for name in compiled.variables() {
        if let Some(value) = captures.name(name) {
            variables.insert(name.as_str(), value.as_str());
        }
    }

    // The boundary group may have consumed the '/' that starts the suffix
    let end = full.end();
    let rest = if end > 0 && normalized_path[..end].ends_with('/') {
        &normalized_path[end - 1..]
    } else {
        &normalized_path[end..]
    };
    let path_suffix = rest.strip_suffix('/').unwrap_or(rest).to_string();

    Some(PatternMatchResult {
        variables,
        path_suffix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::compiler::compile_uncached;
    use crate::pattern::normalizer::normalize;

    fn run(pattern: &str, path: &str) -> Option<PatternMatchResult> {
        let compiled = compile_uncached(pattern).unwrap();
        match_path(&compiled, &normalize(path))
    }

    #[test]
    fn test_variable_capture() {
        let result = run("/product/:id", "product/1234").unwrap();
        assert_eq!(result.variables.get("id"), Some("1234"));
        assert_eq!(result.variables.get("ID"), Some("1234"));
        assert_eq!(result.path_suffix, "");
    }

    #[test]
    fn test_optional_segment_absent() {
        let result = run("/category/:category(/product/:product)", "category/bike/").unwrap();
        assert_eq!(result.variables.get("category"), Some("bike"));
        assert_eq!(result.variables.get("product"), None);
        assert_eq!(result.path_suffix, "");
    }

    #[test]
    fn test_optional_segment_present() {
        let result = run(
            "/category/:category(/product/:product)",
            "/category/bike/product/red-one",
        )
        .unwrap();
        assert_eq!(result.variables.get("category"), Some("bike"));
        assert_eq!(result.variables.get("product"), Some("red-one"));
        assert_eq!(result.path_suffix, "");
    }

    #[test]
    fn test_suffix() {
        let result = run("/api", "/api/v1/users").unwrap();
        assert!(result.variables.is_empty());
        assert_eq!(result.path_suffix, "/v1/users");
    }

    #[test]
    fn test_root_pattern_matches_everything() {
        let result = run("/", "/a/b").unwrap();
        assert_eq!(result.path_suffix, "/a/b");

        let result = run("/", "/").unwrap();
        assert_eq!(result.path_suffix, "");
    }

    #[test]
    fn test_segment_boundary() {
        assert!(run("/api", "/apis").is_none());
        assert!(run("/product/:id", "/products/1").is_none());
    }

    #[test]
    fn test_wildcard() {
        let result = run("/files/*/raw", "/files/abc/raw/readme.md").unwrap();
        assert_eq!(result.path_suffix, "/readme.md");
        assert!(run("/files/*/raw", "/files/raw").is_none());
    }

    #[test]
    fn test_no_match() {
        assert!(run("/product/:id", "/category/1").is_none());
    }

    #[test]
    fn test_oversized_input() {
        let compiled = compile_uncached("/").unwrap();
        let path = format!("/{}/", "a".repeat(MAX_MATCH_INPUT));
        assert!(match_path(&compiled, &path).is_none());
    }
}
