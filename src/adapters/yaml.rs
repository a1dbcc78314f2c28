// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML parser.
//!
//! Local configuration files and module defaults may be written in YAML
//! instead of properties syntax. Nested mappings flatten to dotted keys and
//! sequences to indexed keys, so the result lands in the same flat key space
//! as every other layer.

use crate::domain::{ConfigError, Result};
use crate::ports::ConfigParser;
use std::collections::BTreeMap;

/// YAML parser implementation.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::YamlParser;
/// use layercfg::ports::ConfigParser;
///
/// let parser = YamlParser::new();
/// let yaml_content = "database:\n  host: localhost\n  port: 5432";
/// let result = parser.parse(yaml_content).unwrap();
/// assert_eq!(result.get("database.host"), Some(&"localhost".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlParser;

impl YamlParser {
    /// Creates a new YAML parser.
    pub fn new() -> Self {
        YamlParser
    }

    /// Flattens a YAML value into a flat map with dot notation keys.
    fn flatten(value: &serde_yaml::Value, prefix: &str, result: &mut BTreeMap<String, String>) {
        let child_prefix = |segment: &str| {
            if prefix.is_empty() {
                segment.to_string()
            } else {
                format!("{}.{}", prefix, segment)
            }
        };

        match value {
            serde_yaml::Value::Mapping(map) => {
                for (key, val) in map {
                    let segment = match key {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        _ => {
                            tracing::debug!("Skipping non-scalar YAML key under '{}'", prefix);
                            continue;
                        }
                    };
                    Self::flatten(val, &child_prefix(&segment), result);
                }
            }
            serde_yaml::Value::Sequence(seq) => {
                for (i, val) in seq.iter().enumerate() {
                    Self::flatten(val, &child_prefix(&i.to_string()), result);
                }
            }
            serde_yaml::Value::String(s) => {
                result.insert(prefix.to_string(), s.clone());
            }
            serde_yaml::Value::Number(n) => {
                result.insert(prefix.to_string(), n.to_string());
            }
            serde_yaml::Value::Bool(b) => {
                result.insert(prefix.to_string(), b.to_string());
            }
            serde_yaml::Value::Null => {
                if !prefix.is_empty() {
                    result.insert(prefix.to_string(), String::new());
                }
            }
            serde_yaml::Value::Tagged(tagged) => {
                Self::flatten(&tagged.value, prefix, result);
            }
        }
    }
}

impl ConfigParser for YamlParser {
    fn parse(&self, content: &str) -> Result<BTreeMap<String, String>> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to parse YAML: {}", e),
                source: Some(Box::new(e)),
            })?;

        let mut result = BTreeMap::new();
        Self::flatten(&value, "", &mut result);
        Ok(result)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_parser_nested() {
        let yaml = r#"
database:
  connection:
    host: localhost
    port: 5432
"#;
        let result = YamlParser::new().parse(yaml).unwrap();

        assert_eq!(
            result.get("database.connection.host"),
            Some(&"localhost".to_string())
        );
        assert_eq!(
            result.get("database.connection.port"),
            Some(&"5432".to_string())
        );
    }

    #[test]
    fn test_yaml_parser_array() {
        let yaml = "servers:\n  - server1\n  - server2\n";
        let result = YamlParser::new().parse(yaml).unwrap();

        assert_eq!(result.get("servers.0"), Some(&"server1".to_string()));
        assert_eq!(result.get("servers.1"), Some(&"server2".to_string()));
    }

    #[test]
    fn test_yaml_parser_mixed_types() {
        let yaml = "s: hello\nn: 42\nb: true\nz: null\n";
        let result = YamlParser::new().parse(yaml).unwrap();

        assert_eq!(result.get("s"), Some(&"hello".to_string()));
        assert_eq!(result.get("n"), Some(&"42".to_string()));
        assert_eq!(result.get("b"), Some(&"true".to_string()));
        assert_eq!(result.get("z"), Some(&"".to_string()));
    }

    #[test]
    fn test_yaml_parser_empty_document() {
        let result = YamlParser::new().parse("").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_yaml_parser_invalid() {
        assert!(YamlParser::new().parse("invalid: yaml: content:").is_err());
    }

    #[test]
    fn test_yaml_parser_supported_extensions() {
        let parser = YamlParser::new();
        assert!(parser.supports("yaml"));
        assert!(parser.supports("YML"));
    }
}
