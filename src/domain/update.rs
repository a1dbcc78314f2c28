// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change notifications emitted by live layers.

use std::collections::{BTreeMap, BTreeSet};

/// Whether an update describes a delta or replaces the whole layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// Only the listed keys changed.
    Incremental,
    /// The layer's entire content is `changed`; anything in `removed` is gone.
    Full,
}

/// A mutation of a live layer, delivered to registered listeners.
///
/// # Examples
///
/// ```
/// use layercfg::domain::UpdateEvent;
/// use std::collections::BTreeMap;
///
/// let event = UpdateEvent::changed("db.host", "db1");
/// assert!(!event.is_empty());
///
/// let cleared = UpdateEvent::full_clear(["a".to_string(), "b".to_string()]);
/// assert!(cleared.is_full_clear());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEvent {
    /// Delta or full replacement.
    pub kind: UpdateKind,
    /// Added or changed keys with their new values.
    pub changed: BTreeMap<String, String>,
    /// Removed keys.
    pub removed: BTreeSet<String>,
}

impl UpdateEvent {
    /// A single added or changed key.
    pub fn changed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: UpdateKind::Incremental,
            changed: BTreeMap::from([(key.into(), value.into())]),
            removed: BTreeSet::new(),
        }
    }

    /// A single removed key.
    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            kind: UpdateKind::Incremental,
            changed: BTreeMap::new(),
            removed: BTreeSet::from([key.into()]),
        }
    }

    /// The layer now holds exactly `snapshot`.
    pub fn full(snapshot: BTreeMap<String, String>) -> Self {
        Self {
            kind: UpdateKind::Full,
            changed: snapshot,
            removed: BTreeSet::new(),
        }
    }

    /// The layer is now empty; `previous_keys` are reported as removed.
    pub fn full_clear(previous_keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            kind: UpdateKind::Full,
            changed: BTreeMap::new(),
            removed: previous_keys.into_iter().collect(),
        }
    }

    /// Returns `true` for a full replacement with no remaining keys.
    pub fn is_full_clear(&self) -> bool {
        self.kind == UpdateKind::Full && self.changed.is_empty()
    }

    /// Returns `true` if the event carries no key at all.
    pub fn is_empty(&self) -> bool {
        self.kind == UpdateKind::Incremental && self.changed.is_empty() && self.removed.is_empty()
    }

    /// Applies the event to a snapshot.
    pub fn apply_to(&self, snapshot: &mut BTreeMap<String, String>) {
        if self.kind == UpdateKind::Full {
            snapshot.clear();
        }
        for key in &self.removed {
            snapshot.remove(key);
        }
        for (key, value) in &self.changed {
            snapshot.insert(key.clone(), value.clone());
        }
    }
}
