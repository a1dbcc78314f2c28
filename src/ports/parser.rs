// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! Local files and module default resources come in more than one format.
//! A `ConfigParser` turns the raw text of one format into a flat key-value map;
//! the file loaders pick a parser by file extension.

use crate::domain::Result;
use std::collections::BTreeMap;

/// A trait for parsing configuration text into flat key-value pairs.
///
/// Nested formats flatten with dot notation, so a YAML document
///
/// ```yaml
/// database:
///   host: localhost
/// ```
///
/// yields `database.host -> "localhost"`.
///
/// # Examples
///
/// ```rust
/// use layercfg::ports::ConfigParser;
/// use layercfg::domain::Result;
/// use std::collections::BTreeMap;
///
/// struct LineParser;
///
/// impl ConfigParser for LineParser {
///     fn parse(&self, content: &str) -> Result<BTreeMap<String, String>> {
///         Ok(content
///             .lines()
///             .filter_map(|l| l.split_once(' '))
///             .map(|(k, v)| (k.to_string(), v.to_string()))
///             .collect())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["lines"]
///     }
/// }
///
/// let parsed = LineParser.parse("a 1\nb 2").unwrap();
/// assert_eq!(parsed.get("b"), Some(&"2".to_string()));
/// assert!(LineParser.supports("lines"));
/// ```
pub trait ConfigParser: Send + Sync {
    /// Parses configuration content into a flat key-value map.
    fn parse(&self, content: &str) -> Result<BTreeMap<String, String>>;

    /// Returns the file extensions (without the leading dot) this parser handles.
    fn supported_extensions(&self) -> &[&str];

    /// Returns `true` if `extension` is handled by this parser (case-insensitive).
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestParser;

    impl ConfigParser for TestParser {
        fn parse(&self, _content: &str) -> Result<BTreeMap<String, String>> {
            Ok(BTreeMap::from([(
                "test.key".to_string(),
                "test.value".to_string(),
            )]))
        }

        fn supported_extensions(&self) -> &[&str] {
            &["test", "tst"]
        }
    }

    #[test]
    fn test_parser_parse() {
        let result = TestParser.parse("dummy content").unwrap();
        assert_eq!(result.get("test.key"), Some(&"test.value".to_string()));
    }

    #[test]
    fn test_parser_supports_is_case_insensitive() {
        assert!(TestParser.supports("TST"));
        assert!(TestParser.supports("test"));
        assert!(!TestParser.supports("yaml"));
    }
}
