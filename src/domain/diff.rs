// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation diff between a remote sub-tree and a desired snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Predicate deciding whether a `(key, value)` pair is excluded from publication.
pub type ExclusionFilter = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// An exclusion filter that excludes nothing.
pub fn exclude_nothing() -> ExclusionFilter {
    Arc::new(|_: &str, _: &str| false)
}

/// The operations needed to make a remote sub-tree mirror a desired snapshot.
///
/// `to_delete` is computed against the unfiltered desired key set while
/// `to_write` only holds keys that pass the exclusion filter, so a key that
/// is desired but excluded is neither rewritten nor deleted.
///
/// # Examples
///
/// ```
/// use layercfg::domain::Diff;
/// use std::collections::BTreeMap;
///
/// let existing = ["a", "b", "c"].map(String::from);
/// let desired: BTreeMap<String, String> =
///     [("b", "2"), ("c", "3"), ("d", "4")].into_iter()
///         .map(|(k, v)| (k.to_string(), v.to_string()))
///         .collect();
///
/// let diff = Diff::compute(&existing, &desired, |_, _| false);
/// assert_eq!(diff.to_delete.into_iter().collect::<Vec<_>>(), vec!["a"]);
/// assert_eq!(diff.to_write.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diff {
    /// Keys to create or update, with their values.
    pub to_write: BTreeMap<String, String>,
    /// Existing keys to delete.
    pub to_delete: BTreeSet<String>,
}

impl Diff {
    /// Computes the diff from the existing child names and the desired snapshot.
    pub fn compute<F>(existing: &[String], desired: &BTreeMap<String, String>, exclude: F) -> Self
    where
        F: Fn(&str, &str) -> bool,
    {
        let to_delete = existing
            .iter()
            .filter(|key| !desired.contains_key(key.as_str()))
            .cloned()
            .collect();

        let to_write = desired
            .iter()
            .filter(|(key, value)| !exclude(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            to_write,
            to_delete,
        }
    }

    /// Returns `true` if applying the diff would not touch the store.
    pub fn is_empty(&self) -> bool {
        self.to_write.is_empty() && self.to_delete.is_empty()
    }
}
