// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live configuration layer backed by one path-store sub-tree.
//!
//! Every direct child of the watched node is one property: the child name is
//! the key and its data the value. The layer keeps a cached snapshot current
//! through a children watch and reports each change to its listeners.

use crate::domain::{paths, ConfigKey, ConfigValue, Result, UpdateEvent};
use crate::ports::{
    ChildEvent, ChildEventKind, ConfigSource, ListenerId, PathStore, UpdateListener, UpdateSource,
    WatchHandle,
};
use crate::service::listeners::ListenerSet;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, Weak};

#[derive(Default)]
struct State {
    values: BTreeMap<String, String>,
    /// Keys an event decided while the initial listing was in progress.
    /// `None` once the listing has been merged.
    touched: Option<HashSet<String>>,
}

struct Shared {
    path: String,
    state: RwLock<State>,
    listeners: ListenerSet,
    closed: AtomicBool,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, event: ChildEvent) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let key = event.name().to_string();
        let update = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(touched) = state.touched.as_mut() {
                touched.insert(key.clone());
            }
            let values = &mut state.values;
            match (event.kind, event.data) {
                (ChildEventKind::Added | ChildEventKind::Updated, Some(data)) => {
                    if values.get(&key) == Some(&data) {
                        None
                    } else {
                        values.insert(key.clone(), data.clone());
                        Some(UpdateEvent::changed(key.as_str(), data))
                    }
                }
                (ChildEventKind::Removed, _) => values
                    .remove(&key)
                    .map(|_| UpdateEvent::removed(key.as_str())),
                (_, None) => {
                    tracing::debug!("Ignoring child event without data for {}", event.path);
                    None
                }
            }
        };

        if let Some(update) = update {
            tracing::debug!("Remote layer {} changed key '{}'", self.path, key);
            self.listeners.notify(&update);
        }
    }
}

/// A configuration layer mirroring the children of one path-store node.
///
/// Created with [`RemoteConfigSource::start`] once the node exists. The
/// watch stays registered until [`close`](ConfigSource::close) is called or
/// the source is dropped; after closing the layer keeps its last snapshot
/// but no longer changes.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MemoryPathStore;
/// use layercfg::ports::{ConfigSource, PathStore};
/// use layercfg::service::RemoteConfigSource;
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryPathStore::new());
/// store.create("/cfg", "").unwrap();
/// store.create("/cfg/db.host", "db1").unwrap();
///
/// let source = RemoteConfigSource::start(store.clone(), "/cfg").unwrap();
/// assert_eq!(source.get_str("db.host").unwrap().unwrap().as_str(), "db1");
///
/// store.set_data("/cfg/db.host", "db2").unwrap();
/// assert_eq!(source.get_str("db.host").unwrap().unwrap().as_str(), "db2");
/// ```
pub struct RemoteConfigSource {
    name: String,
    shared: Arc<Shared>,
    watch: Mutex<Option<WatchHandle>>,
}

impl RemoteConfigSource {
    /// Registers a children watch on `path` and loads the current children.
    ///
    /// Fails if the node does not exist or the store cannot be read; no watch
    /// stays registered in that case.
    pub fn start(store: Arc<dyn PathStore>, path: &str) -> Result<Self> {
        paths::validate(path)?;
        let shared = Arc::new(Shared {
            path: path.to_string(),
            state: RwLock::new(State {
                values: BTreeMap::new(),
                touched: Some(HashSet::new()),
            }),
            listeners: ListenerSet::new(),
            closed: AtomicBool::new(false),
        });

        // Watch first so no change between listing and watching is lost.
        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let watch = store.watch_children(
            path,
            Arc::new(move |event: ChildEvent| {
                if let Some(shared) = weak.upgrade() {
                    shared.apply(event);
                }
            }),
        )?;

        let mut loaded = BTreeMap::new();
        for child in store.get_children(path)? {
            let child_path = paths::join(path, &child);
            match store.get_data(&child_path) {
                Ok(data) => {
                    loaded.insert(child, data);
                }
                // Deleted between listing and reading; the watch reports it.
                Err(e) if e.is_no_node() => continue,
                Err(e) => return Err(e),
            }
        }

        {
            let mut state = shared
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let touched = state.touched.take().unwrap_or_default();
            for (key, value) in loaded {
                if !touched.contains(&key) {
                    state.values.insert(key, value);
                }
            }
        }

        tracing::info!(
            "Started remote layer {} with {} properties",
            path,
            shared.read().values.len()
        );
        Ok(Self {
            name: format!("remote:{}", path),
            shared,
            watch: Mutex::new(Some(watch)),
        })
    }

    /// The watched path.
    pub fn path(&self) -> &str {
        &self.shared.path
    }

    /// Returns `true` until the source is closed.
    pub fn is_open(&self) -> bool {
        !self.shared.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for RemoteConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfigSource")
            .field("path", &self.shared.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl ConfigSource for RemoteConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self
            .shared
            .read()
            .values
            .get(key.as_str())
            .map(|v| ConfigValue::from(v.as_str())))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self
            .shared
            .read()
            .values
            .keys()
            .map(|k| ConfigKey::from(k.as_str()))
            .collect())
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.shared.read().values.clone())
    }

    fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let watch = self
            .watch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(watch) = watch {
            watch.cancel();
        }
        tracing::info!("Closed remote layer {}", self.shared.path);
        Ok(())
    }
}

impl UpdateSource for RemoteConfigSource {
    fn attach_listener(&self, id: ListenerId, listener: UpdateListener) {
        self.shared.listeners.insert(id, listener);
    }

    fn remove_update_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }
}

impl Drop for RemoteConfigSource {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryPathStore;
    use crate::service::listeners::channel_listener;

    fn store_with(path: &str, entries: &[(&str, &str)]) -> Arc<MemoryPathStore> {
        let store = Arc::new(MemoryPathStore::new());
        for ancestor in paths::ancestors(path) {
            store.create(&ancestor, "").unwrap();
        }
        store.create(path, "").unwrap();
        for (key, value) in entries {
            store.create(&paths::join(path, key), value).unwrap();
        }
        store
    }

    #[test]
    fn test_initial_snapshot() {
        let store = store_with("/p/cfg", &[("a", "1"), ("b", "2")]);
        let source = RemoteConfigSource::start(store, "/p/cfg").unwrap();

        let snapshot = source.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("b").map(String::as_str), Some("2"));
        assert_eq!(source.name(), "remote:/p/cfg");
    }

    #[test]
    fn test_missing_node_fails_without_leaking_watch() {
        let store = Arc::new(MemoryPathStore::new());
        let result = RemoteConfigSource::start(store.clone(), "/absent");
        assert!(result.unwrap_err().is_no_node());
        assert_eq!(store.watch_count(), 0);
    }

    #[test]
    fn test_changes_reach_listeners() {
        let store = store_with("/cfg", &[("a", "1")]);
        let source = RemoteConfigSource::start(store.clone(), "/cfg").unwrap();
        let (listener, events) = channel_listener(16);
        source.add_update_listener(listener);

        store.create("/cfg/b", "2").unwrap();
        store.set_data("/cfg/a", "10").unwrap();
        store.set_data("/cfg/a", "10").unwrap();
        store.delete("/cfg/b").unwrap();

        let received: Vec<UpdateEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                UpdateEvent::changed("b", "2"),
                UpdateEvent::changed("a", "10"),
                UpdateEvent::removed("b"),
            ]
        );
        assert_eq!(source.get_str("a").unwrap().unwrap().as_str(), "10");
    }

    #[test]
    fn test_close_cancels_watch_and_freezes_snapshot() {
        let store = store_with("/cfg", &[("a", "1")]);
        let source = RemoteConfigSource::start(store.clone(), "/cfg").unwrap();
        assert_eq!(store.watch_count(), 1);

        source.close().unwrap();
        assert!(!source.is_open());
        assert_eq!(store.watch_count(), 0);

        store.set_data("/cfg/a", "2").unwrap();
        assert_eq!(source.get_str("a").unwrap().unwrap().as_str(), "1");
        assert!(source.close().is_ok());
    }

    /// Deletes one child right after handing out its data.
    struct DeletingStore {
        inner: Arc<MemoryPathStore>,
        victim: String,
    }

    impl PathStore for DeletingStore {
        fn exists(&self, path: &str) -> Result<bool> {
            self.inner.exists(path)
        }
        fn get_children(&self, path: &str) -> Result<Vec<String>> {
            self.inner.get_children(path)
        }
        fn get_data(&self, path: &str) -> Result<String> {
            let data = self.inner.get_data(path)?;
            if path == self.victim {
                self.inner.delete(path)?;
            }
            Ok(data)
        }
        fn create(&self, path: &str, data: &str) -> Result<()> {
            self.inner.create(path, data)
        }
        fn set_data(&self, path: &str, data: &str) -> Result<()> {
            self.inner.set_data(path, data)
        }
        fn delete(&self, path: &str) -> Result<()> {
            self.inner.delete(path)
        }
        fn watch_children(
            &self,
            path: &str,
            callback: crate::ports::ChildCallback,
        ) -> Result<WatchHandle> {
            self.inner.watch_children(path, callback)
        }
    }

    #[test]
    fn test_delete_during_listing_is_not_resurrected() {
        let inner = store_with("/cfg", &[("gone", "stale"), ("kept", "1")]);
        let store = Arc::new(DeletingStore {
            inner: Arc::clone(&inner),
            victim: "/cfg/gone".to_string(),
        });

        let source = RemoteConfigSource::start(store, "/cfg").unwrap();
        assert!(!inner.exists("/cfg/gone").unwrap());
        assert!(source.get_str("gone").unwrap().is_none());
        assert_eq!(source.get_str("kept").unwrap().unwrap().as_str(), "1");

        inner.create("/cfg/gone", "back").unwrap();
        assert_eq!(source.get_str("gone").unwrap().unwrap().as_str(), "back");
    }

    #[test]
    fn test_nested_store_mutation_keeps_layer_in_sync() {
        let store = store_with("/cfg", &[]);
        let deleter = Arc::clone(&store);
        let _first = store
            .watch_children(
                "/cfg",
                Arc::new(move |event: ChildEvent| {
                    if event.kind == ChildEventKind::Added {
                        let _ = deleter.delete(&event.path);
                    }
                }),
            )
            .unwrap();
        let source = RemoteConfigSource::start(store.clone(), "/cfg").unwrap();

        store.create("/cfg/k", "v").unwrap();
        assert!(!store.exists("/cfg/k").unwrap());
        assert!(source.get_str("k").unwrap().is_none());
    }

    #[test]
    fn test_drop_cancels_watch() {
        let store = store_with("/cfg", &[]);
        drop(RemoteConfigSource::start(store.clone(), "/cfg").unwrap());
        assert_eq!(store.watch_count(), 0);
    }
}
