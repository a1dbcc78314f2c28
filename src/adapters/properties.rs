// SPDX-License-Identifier: MIT OR Apache-2.0

//! `.properties` parser.
//!
//! Supports the usual properties syntax: `key=value`, `key: value` and
//! `key value` separators, `#` and `!` comment lines, backslash line
//! continuations, and the `\t \n \r \f \\ \uXXXX` escapes.

use crate::domain::{ConfigError, Result};
use crate::ports::ConfigParser;
use std::collections::BTreeMap;

const SEPARATOR_WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

/// Parser for `.properties` files.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::PropertiesParser;
/// use layercfg::ports::ConfigParser;
///
/// let parsed = PropertiesParser::new()
///     .parse("# comment\nm1=v1\nm2 : v2\nlong = a \\\n    b")
///     .unwrap();
/// assert_eq!(parsed.get("m1").map(String::as_str), Some("v1"));
/// assert_eq!(parsed.get("m2").map(String::as_str), Some("v2"));
/// assert_eq!(parsed.get("long").map(String::as_str), Some("a b"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertiesParser;

impl PropertiesParser {
    /// Creates a new properties parser.
    pub fn new() -> Self {
        PropertiesParser
    }

    fn is_continued(line: &str) -> bool {
        line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
    }

    fn split_entry(line: &str) -> (&str, &str) {
        let mut escaped = false;
        let mut key_end = line.len();
        for (i, c) in line.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '=' | ':' | ' ' | '\t' | '\x0c' => {
                    key_end = i;
                    break;
                }
                _ => {}
            }
        }

        let key = &line[..key_end];
        let mut rest = line[key_end..].trim_start_matches(SEPARATOR_WHITESPACE);
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start_matches(SEPARATOR_WHITESPACE);
        }
        (key, rest)
    }

    fn unescape(raw: &str) -> Result<String> {
        let mut result = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                result.push(c);
                continue;
            }
            match chars.next() {
                Some('t') => result.push('\t'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('f') => result.push('\x0c'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    let decoded = u32::from_str_radix(&hex, 16)
                        .ok()
                        .filter(|_| hex.len() == 4)
                        .and_then(char::from_u32)
                        .ok_or_else(|| ConfigError::ParseError {
                            message: format!("Invalid unicode escape '\\u{}'", hex),
                            source: None,
                        })?;
                    result.push(decoded);
                }
                Some(other) => result.push(other),
                None => {}
            }
        }
        Ok(result)
    }
}

impl ConfigParser for PropertiesParser {
    fn parse(&self, content: &str) -> Result<BTreeMap<String, String>> {
        let mut result = BTreeMap::new();
        let mut logical = String::new();

        for line in content.lines() {
            let line = line.trim_start_matches(SEPARATOR_WHITESPACE);
            if logical.is_empty()
                && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }

            if Self::is_continued(line) {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);

            let (key, value) = Self::split_entry(&logical);
            result.insert(Self::unescape(key)?, Self::unescape(value)?);
            logical.clear();
        }

        if !logical.is_empty() {
            let (key, value) = Self::split_entry(&logical);
            result.insert(Self::unescape(key)?, Self::unescape(value)?);
        }

        Ok(result)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["properties"]
    }
}
