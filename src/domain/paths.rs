// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for slash-separated path-store paths.
//!
//! Paths are absolute (`/a/b/c`), have no trailing slash except for the root
//! `/`, and contain no empty segments.

use crate::domain::errors::{ConfigError, Result};

/// Joins a parent path and a child node name.
///
/// ```
/// use layercfg::domain::paths::join;
///
/// assert_eq!(join("/", "prod"), "/prod");
/// assert_eq!(join("/prod/app", "config"), "/prod/app/config");
/// ```
pub fn join(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Returns the parent of `path`, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Returns the last segment of `path`.
pub fn node_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns every proper ancestor of `path` except the root, outermost first.
///
/// ```
/// use layercfg::domain::paths::ancestors;
///
/// assert_eq!(ancestors("/prod/app/1.0/config"), vec!["/prod", "/prod/app", "/prod/app/1.0"]);
/// assert!(ancestors("/prod").is_empty());
/// ```
pub fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() <= 1 {
        return result;
    }
    for segment in &segments[..segments.len() - 1] {
        current.push('/');
        current.push_str(segment);
        result.push(current.clone());
    }
    result
}

/// Validates that `path` is absolute and well formed.
pub fn validate(path: &str) -> Result<()> {
    let well_formed = path == "/"
        || (path.starts_with('/')
            && !path.ends_with('/')
            && path.split('/').skip(1).all(|s| !s.is_empty()));
    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::path_failure(
            "validate",
            path,
            "path must be absolute with no empty segments",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent() {
        assert_eq!(parent("/a/b/c"), Some("/a/b"));
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/"), None);
    }

    #[test]
    fn test_node_name() {
        assert_eq!(node_name("/a/b/local-config"), "local-config");
        assert_eq!(node_name("/a"), "a");
    }

    #[test]
    fn test_validate() {
        assert!(validate("/").is_ok());
        assert!(validate("/a/b").is_ok());
        assert!(validate("a/b").is_err());
        assert!(validate("/a/").is_err());
        assert!(validate("/a//b").is_err());
    }

    #[test]
    fn test_join_then_parent() {
        let child = join("/prod/app", "config");
        assert_eq!(parent(&child), Some("/prod/app"));
        assert_eq!(node_name(&child), "config");
    }
}
