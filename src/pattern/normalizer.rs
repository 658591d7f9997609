//! URL path normalization.

/// Trim whitespace and force exactly one leading and one trailing `/`.
///
/// `normalize("")` is `/`, and normalizing twice is the same as normalizing
/// once.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut normalized = String::with_capacity(trimmed.len() + 2);
    normalized.push('/');
    normalized.push_str(trimmed);
    normalized.push('/');
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("   "), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//"), "/");
        assert_eq!(normalize("product/1234"), "/product/1234/");
        assert_eq!(normalize(" /product/1234/ "), "/product/1234/");
        assert_eq!(normalize("///a///"), "/a/");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for path in ["", "/", "a", "/a", "a/", "/a/b/", " x/y ", "//a//b//", "/ a /"] {
            let once = normalize(path);
            assert_eq!(normalize(&once), once, "path: {:?}", path);
        }
    }
}
