// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishing a configuration snapshot to a path store.

use crate::domain::config_key::is_valid_node_name;
use crate::domain::{exclude_nothing, paths, ConfigError, Diff, ExclusionFilter, Result};
use crate::ports::PathStore;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reconciles a remote sub-tree with a desired flat snapshot.
///
/// Each key becomes one child node of the target root holding the value.
/// [`write`](Self::write) creates missing ancestors, upserts every desired key
/// that passes the exclusion filter and deletes children the snapshot no
/// longer contains. The operation is not transactional: a failure midway leaves
/// the diff partially applied, and rerunning the write converges.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MemoryPathStore;
/// use layercfg::ports::PathStore;
/// use layercfg::service::ConfigWriter;
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryPathStore::new());
/// let writer = ConfigWriter::new(store.clone());
///
/// let desired = BTreeMap::from([("db.host".to_string(), "db1".to_string())]);
/// writer.write("/prod/app/1.0/config", &desired, false).unwrap();
///
/// assert_eq!(store.get_data("/prod/app/1.0/config/db.host").unwrap(), "db1");
/// assert!(writer.write("/prod/app/1.0/config", &desired, false).is_err());
/// ```
#[derive(Clone)]
pub struct ConfigWriter {
    store: Arc<dyn PathStore>,
    exclude: ExclusionFilter,
}

impl ConfigWriter {
    /// Creates a writer that publishes every key.
    pub fn new(store: Arc<dyn PathStore>) -> Self {
        Self {
            store,
            exclude: exclude_nothing(),
        }
    }

    /// Sets the predicate selecting `(key, value)` pairs that are not written.
    ///
    /// Excluded keys are left untouched on the remote side: they are neither
    /// written nor deleted.
    pub fn with_exclusion(mut self, exclude: ExclusionFilter) -> Self {
        self.exclude = exclude;
        self
    }

    /// Makes the children of `root` mirror `desired` and returns the applied diff.
    ///
    /// With `allow_overwrite` false an existing `root` is refused with
    /// [`ConfigError::AlreadyExistsRefusal`] before anything is touched.
    /// Keys that are not valid node names (empty, `.`, `..`, or containing
    /// `/`) are rejected with [`ConfigError::PathOperationFailure`], also
    /// before any mutation.
    pub fn write(
        &self,
        root: &str,
        desired: &BTreeMap<String, String>,
        allow_overwrite: bool,
    ) -> Result<Diff> {
        paths::validate(root)?;
        if root == "/" {
            return Err(ConfigError::path_failure(
                "write",
                root,
                "refusing to publish into the root node",
            ));
        }
        if let Some(bad) = desired.keys().find(|key| !is_valid_node_name(key)) {
            return Err(ConfigError::path_failure(
                "write",
                paths::join(root, bad),
                format!("'{}' is not a valid configuration key for publication", bad),
            ));
        }

        if self.store.exists(root)? {
            if !allow_overwrite {
                return Err(ConfigError::AlreadyExistsRefusal {
                    path: root.to_string(),
                });
            }
            tracing::warn!("Overwriting existing configuration at {}", root);
        }

        self.ensure_path(root)?;

        let existing = self.store.get_children(root)?;
        let diff = Diff::compute(&existing, desired, |key, value| (self.exclude)(key, value));

        for (key, value) in &diff.to_write {
            self.upsert(&paths::join(root, key), value)?;
        }
        for key in &diff.to_delete {
            let path = paths::join(root, key);
            match self.store.delete(&path) {
                Ok(()) => tracing::debug!("Deleted {}", path),
                Err(e) if e.is_no_node() => {}
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Published {} properties to {} ({} written, {} deleted)",
            desired.len(),
            root,
            diff.to_write.len(),
            diff.to_delete.len()
        );
        Ok(diff)
    }

    /// Creates every missing ancestor of `path`, and `path` itself, as empty nodes.
    pub fn ensure_path(&self, path: &str) -> Result<()> {
        let mut chain = paths::ancestors(path);
        chain.push(path.to_string());
        for node in chain {
            if self.store.exists(&node)? {
                continue;
            }
            match self.store.create(&node, "") {
                Ok(()) => tracing::debug!("Created {}", node),
                Err(e) if e.is_node_exists() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn upsert(&self, path: &str, value: &str) -> Result<()> {
        match self.store.create(path, value) {
            Err(e) if e.is_node_exists() => self.store.set_data(path, value),
            other => other,
        }
    }
}

impl std::fmt::Debug for ConfigWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryPathStore;

    const ROOT: &str = "/unittest/testapp/1.0.0/config";

    fn snapshot(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn remote(store: &MemoryPathStore, root: &str) -> BTreeMap<String, String> {
        store
            .get_children(root)
            .unwrap()
            .into_iter()
            .map(|child| {
                let data = store.get_data(&paths::join(root, &child)).unwrap();
                (child, data)
            })
            .collect()
    }

    #[test]
    fn test_creates_ancestors_and_children() {
        let store = Arc::new(MemoryPathStore::new());
        let writer = ConfigWriter::new(store.clone());
        writer
            .write(ROOT, &snapshot(&[("a", "1"), ("b", "2")]), false)
            .unwrap();

        assert!(store.exists("/unittest").unwrap());
        assert!(store.exists("/unittest/testapp/1.0.0").unwrap());
        assert_eq!(remote(&store, ROOT), snapshot(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_reconcile_diff() {
        let store = Arc::new(MemoryPathStore::new());
        let writer = ConfigWriter::new(store.clone());
        writer
            .write(ROOT, &snapshot(&[("a", "1"), ("b", "2"), ("c", "3")]), false)
            .unwrap();

        let diff = writer
            .write(ROOT, &snapshot(&[("b", "2"), ("c", "30"), ("d", "4")]), true)
            .unwrap();

        assert_eq!(diff.to_delete.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(
            remote(&store, ROOT),
            snapshot(&[("b", "2"), ("c", "30"), ("d", "4")])
        );
    }

    #[test]
    fn test_idempotent_publish() {
        let store = Arc::new(MemoryPathStore::new());
        let writer = ConfigWriter::new(store.clone());
        let desired = snapshot(&[("x", "1"), ("y", "2")]);

        writer.write(ROOT, &desired, true).unwrap();
        let first = remote(&store, ROOT);
        writer.write(ROOT, &desired, true).unwrap();
        assert_eq!(remote(&store, ROOT), first);
    }

    #[test]
    fn test_overwrite_guard_leaves_remote_untouched() {
        let store = Arc::new(MemoryPathStore::new());
        let writer = ConfigWriter::new(store.clone());
        writer.write(ROOT, &snapshot(&[("a", "1")]), false).unwrap();

        let result = writer.write(ROOT, &snapshot(&[("z", "9")]), false);
        assert!(matches!(
            result,
            Err(ConfigError::AlreadyExistsRefusal { .. })
        ));
        assert_eq!(remote(&store, ROOT), snapshot(&[("a", "1")]));
    }

    #[test]
    fn test_invalid_keys_rejected_before_mutation() {
        let store = Arc::new(MemoryPathStore::new());
        let writer = ConfigWriter::new(store.clone());

        for bad in ["a/b", "", ".."] {
            let result = writer.write(ROOT, &snapshot(&[("ok", "1"), (bad, "2")]), false);
            assert!(matches!(
                result,
                Err(ConfigError::PathOperationFailure { .. })
            ));
        }
        assert!(!store.exists("/unittest").unwrap());
    }

    #[test]
    fn test_excluded_keys_are_neither_written_nor_deleted() {
        let store = Arc::new(MemoryPathStore::new());
        store.create("/unittest", "").unwrap();
        store.create("/unittest/testapp", "").unwrap();
        store.create("/unittest/testapp/1.0.0", "").unwrap();
        store.create(ROOT, "").unwrap();
        store.create(&format!("{}/instance.id", ROOT), "remote-value").unwrap();

        let writer = ConfigWriter::new(store.clone())
            .with_exclusion(Arc::new(|key: &str, _: &str| key.starts_with("instance.")));
        let diff = writer
            .write(
                ROOT,
                &snapshot(&[("instance.id", "local"), ("instance.region", "x"), ("k", "v")]),
                true,
            )
            .unwrap();

        assert!(diff.to_delete.is_empty());
        assert_eq!(
            remote(&store, ROOT),
            snapshot(&[("instance.id", "remote-value"), ("k", "v")])
        );
    }

    #[test]
    fn test_refuses_root_target() {
        let writer = ConfigWriter::new(Arc::new(MemoryPathStore::new()));
        assert!(writer.write("/", &BTreeMap::new(), true).is_err());
    }
}
