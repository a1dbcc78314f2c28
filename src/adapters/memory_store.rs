// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process path store.
//!
//! `MemoryPathStore` mirrors the semantics of a hierarchical coordination
//! service (parents must exist, non-empty nodes cannot be deleted, watches
//! report child changes) without any network. It backs the test suite and
//! embedded single-process deployments.

use crate::domain::{paths, ConfigError, Result};
use crate::ports::{ChildCallback, ChildEvent, ChildEventKind, PathStore, WatchHandle};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

#[derive(Debug, Default)]
struct Node {
    data: String,
    children: BTreeSet<String>,
}

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<String, Node>,
    watches: BTreeMap<u64, (String, ChildCallback)>,
    next_watch: u64,
    pending: VecDeque<(Vec<ChildCallback>, ChildEvent)>,
    delivering: bool,
}

impl Inner {
    fn new() -> Self {
        let mut inner = Self::default();
        inner.nodes.insert("/".to_string(), Node::default());
        inner
    }

    fn callbacks_for(&self, parent: &str) -> Vec<ChildCallback> {
        self.watches
            .values()
            .filter(|(path, _)| path == parent)
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    /// Queues `event` for the watchers of `parent`. Called with the lock held
    /// so the queue follows mutation order.
    fn enqueue(&mut self, parent: &str, event: ChildEvent) {
        let callbacks = self.callbacks_for(parent);
        if !callbacks.is_empty() {
            self.pending.push_back((callbacks, event));
        }
    }
}

/// Clears the delivering flag when a callback panics mid-delivery.
struct DeliveryGuard<'a> {
    inner: &'a Mutex<Inner>,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .delivering = false;
        }
    }
}

/// A thread-safe, in-memory [`PathStore`].
///
/// Cloning yields another handle to the same tree. Watch callbacks run after
/// the store's lock is released, so a callback may freely call back into the
/// store. Events are delivered one at a time in mutation order: a mutation
/// made from inside a callback, or by another thread while delivery is in
/// progress, is queued and reaches every watcher only after the current event
/// has. The thread already delivering drains the queue, so a concurrent
/// mutator may return before its own event is delivered.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MemoryPathStore;
/// use layercfg::ports::PathStore;
///
/// let store = MemoryPathStore::new();
/// store.create("/prod", "").unwrap();
/// store.create("/prod/key", "value").unwrap();
///
/// assert_eq!(store.get_children("/prod").unwrap(), vec!["key"]);
/// assert!(store.create("/prod/key", "again").unwrap_err().is_node_exists());
/// ```
#[derive(Clone)]
pub struct MemoryPathStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryPathStore {
    /// Creates a store holding only the root node.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    /// Returns the number of live watch registrations.
    pub fn watch_count(&self) -> usize {
        self.lock().watches.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drains the event queue unless another call is already draining it.
    fn deliver(&self) {
        {
            let mut inner = self.lock();
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }
        let _guard = DeliveryGuard { inner: &self.inner };
        loop {
            let (callbacks, event) = {
                let mut inner = self.lock();
                match inner.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        // Cleared under the lock so no queued event is stranded.
                        inner.delivering = false;
                        return;
                    }
                }
            };
            for callback in callbacks {
                callback(event.clone());
            }
        }
    }
}

impl Default for MemoryPathStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryPathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryPathStore")
            .field("nodes", &inner.nodes.len())
            .field("watches", &inner.watches.len())
            .finish()
    }
}

impl PathStore for MemoryPathStore {
    fn exists(&self, path: &str) -> Result<bool> {
        paths::validate(path)?;
        Ok(self.lock().nodes.contains_key(path))
    }

    fn get_children(&self, path: &str) -> Result<Vec<String>> {
        paths::validate(path)?;
        let inner = self.lock();
        let node = inner.nodes.get(path).ok_or_else(|| ConfigError::NoNode {
            path: path.to_string(),
        })?;
        Ok(node.children.iter().cloned().collect())
    }

    fn get_data(&self, path: &str) -> Result<String> {
        paths::validate(path)?;
        let inner = self.lock();
        inner
            .nodes
            .get(path)
            .map(|node| node.data.clone())
            .ok_or_else(|| ConfigError::NoNode {
                path: path.to_string(),
            })
    }

    fn create(&self, path: &str, data: &str) -> Result<()> {
        paths::validate(path)?;
        let parent = paths::parent(path).ok_or_else(|| ConfigError::NodeExists {
            path: path.to_string(),
        })?;

        {
            let mut inner = self.lock();
            if inner.nodes.contains_key(path) {
                return Err(ConfigError::NodeExists {
                    path: path.to_string(),
                });
            }
            let parent_node = inner.nodes.get_mut(parent).ok_or_else(|| ConfigError::NoNode {
                path: parent.to_string(),
            })?;
            parent_node
                .children
                .insert(paths::node_name(path).to_string());
            inner.nodes.insert(
                path.to_string(),
                Node {
                    data: data.to_string(),
                    children: BTreeSet::new(),
                },
            );
            inner.enqueue(
                parent,
                ChildEvent {
                    kind: ChildEventKind::Added,
                    path: path.to_string(),
                    data: Some(data.to_string()),
                },
            );
        }

        tracing::debug!("Created node {}", path);
        self.deliver();
        Ok(())
    }

    fn set_data(&self, path: &str, data: &str) -> Result<()> {
        paths::validate(path)?;
        {
            let mut inner = self.lock();
            let node = inner.nodes.get_mut(path).ok_or_else(|| ConfigError::NoNode {
                path: path.to_string(),
            })?;
            node.data = data.to_string();
            if let Some(parent) = paths::parent(path) {
                inner.enqueue(
                    parent,
                    ChildEvent {
                        kind: ChildEventKind::Updated,
                        path: path.to_string(),
                        data: Some(data.to_string()),
                    },
                );
            }
        }

        tracing::debug!("Updated node {}", path);
        self.deliver();
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        paths::validate(path)?;
        let parent = paths::parent(path)
            .ok_or_else(|| ConfigError::path_failure("delete", path, "cannot delete the root"))?;

        {
            let mut inner = self.lock();
            let node = inner.nodes.get(path).ok_or_else(|| ConfigError::NoNode {
                path: path.to_string(),
            })?;
            if !node.children.is_empty() {
                return Err(ConfigError::path_failure(
                    "delete",
                    path,
                    format!("node has {} children", node.children.len()),
                ));
            }
            inner.nodes.remove(path);
            if let Some(parent_node) = inner.nodes.get_mut(parent) {
                parent_node.children.remove(paths::node_name(path));
            }
            inner.enqueue(
                parent,
                ChildEvent {
                    kind: ChildEventKind::Removed,
                    path: path.to_string(),
                    data: None,
                },
            );
        }

        tracing::debug!("Deleted node {}", path);
        self.deliver();
        Ok(())
    }

    fn watch_children(&self, path: &str, callback: ChildCallback) -> Result<WatchHandle> {
        paths::validate(path)?;
        let id = {
            let mut inner = self.lock();
            let id = inner.next_watch;
            inner.next_watch += 1;
            inner.watches.insert(id, (path.to_string(), callback));
            id
        };

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Ok(WatchHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                inner.watches.remove(&id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (ChildCallback, Arc<Mutex<Vec<ChildEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ChildCallback = Arc::new(move |event: ChildEvent| sink.lock().unwrap().push(event));
        (callback, events)
    }

    #[test]
    fn test_create_requires_parent() {
        let store = MemoryPathStore::new();
        let err = store.create("/a/b", "").unwrap_err();
        assert!(err.is_no_node());

        store.create("/a", "").unwrap();
        store.create("/a/b", "x").unwrap();
        assert_eq!(store.get_data("/a/b").unwrap(), "x");
    }

    #[test]
    fn test_create_existing_is_node_exists() {
        let store = MemoryPathStore::new();
        store.create("/a", "").unwrap();
        assert!(store.create("/a", "").unwrap_err().is_node_exists());
    }

    #[test]
    fn test_delete_rules() {
        let store = MemoryPathStore::new();
        store.create("/a", "").unwrap();
        store.create("/a/b", "").unwrap();

        assert!(matches!(
            store.delete("/a"),
            Err(ConfigError::PathOperationFailure { .. })
        ));
        assert!(store.delete("/missing").unwrap_err().is_no_node());
        assert!(store.delete("/").is_err());

        store.delete("/a/b").unwrap();
        store.delete("/a").unwrap();
        assert!(!store.exists("/a").unwrap());
    }

    #[test]
    fn test_set_data_missing_node() {
        let store = MemoryPathStore::new();
        assert!(store.set_data("/nope", "v").unwrap_err().is_no_node());
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let store = MemoryPathStore::new();
        assert!(store.exists("relative").is_err());
        assert!(store.create("/a//b", "").is_err());
        assert!(store.create("/a/", "").is_err());
    }

    #[test]
    fn test_watch_reports_child_events() {
        let store = MemoryPathStore::new();
        store.create("/w", "").unwrap();
        let (callback, events) = recorder();
        let handle = store.watch_children("/w", callback).unwrap();

        store.create("/w/k", "1").unwrap();
        store.set_data("/w/k", "2").unwrap();
        store.delete("/w/k").unwrap();

        let kinds: Vec<_> = events.lock().unwrap().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChildEventKind::Added,
                ChildEventKind::Updated,
                ChildEventKind::Removed
            ]
        );

        handle.cancel();
        assert_eq!(store.watch_count(), 0);
        store.create("/w/other", "").unwrap();
        assert_eq!(events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_watch_on_missing_path_sees_creation() {
        let store = MemoryPathStore::new();
        let (callback, events) = recorder();
        let _handle = store.watch_children("/later", callback).unwrap();

        store.create("/later", "").unwrap();
        store.create("/later/child", "v").unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "child");
        assert_eq!(events[0].data.as_deref(), Some("v"));
    }

    #[test]
    fn test_callback_may_reenter_store() {
        let store = MemoryPathStore::new();
        store.create("/r", "").unwrap();
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = store
            .watch_children(
                "/r",
                Arc::new(move |event: ChildEvent| {
                    if let Ok(data) = reader.get_data(&event.path) {
                        sink.lock().unwrap().push(data);
                    }
                }),
            )
            .unwrap();

        store.create("/r/x", "hello").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_nested_mutation_delivered_after_current_event() {
        let store = MemoryPathStore::new();
        store.create("/n", "").unwrap();

        let deleter = store.clone();
        let _first = store
            .watch_children(
                "/n",
                Arc::new(move |event: ChildEvent| {
                    if event.kind == ChildEventKind::Added {
                        deleter.delete(&event.path).unwrap();
                    }
                }),
            )
            .unwrap();
        let (callback, events) = recorder();
        let _second = store.watch_children("/n", callback).unwrap();

        store.create("/n/k", "v").unwrap();

        let kinds: Vec<_> = events.lock().unwrap().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChildEventKind::Added, ChildEventKind::Removed]);
        assert!(!store.exists("/n/k").unwrap());
    }

    #[test]
    fn test_delivery_resumes_after_panicking_callback() {
        let store = MemoryPathStore::new();
        store.create("/p", "").unwrap();
        let handle = store
            .watch_children("/p", Arc::new(|_: ChildEvent| panic!("callback failure")))
            .unwrap();
        let writer = store.clone();
        let result = std::thread::spawn(move || writer.create("/p/a", "1")).join();
        assert!(result.is_err());
        handle.cancel();

        let (callback, events) = recorder();
        let _handle = store.watch_children("/p", callback).unwrap();
        store.create("/p/b", "2").unwrap();
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
