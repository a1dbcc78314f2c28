// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watched layer that follows the presence of one child node.
//!
//! A `DynamicInstanceConfigSource` watches the children of a root path for one
//! specific child. While that child exists the source is *active* and serves
//! the child's sub-tree through an inner [`RemoteConfigSource`]; while it is
//! absent the source is *inactive* and empty. Listeners registered on the
//! outer source survive any number of activation cycles.

use crate::domain::config_key::is_valid_node_name;
use crate::domain::{paths, ConfigError, ConfigKey, ConfigValue, Result, UpdateEvent};
use crate::ports::{
    ChildEvent, ChildEventKind, ConfigSource, ListenerId, PathStore, UpdateListener, UpdateSource,
    WatchHandle,
};
use crate::service::listeners::ListenerSet;
use crate::service::remote_source::RemoteConfigSource;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

struct Shared {
    store: Arc<dyn PathStore>,
    path: String,
    inner: Mutex<Option<Arc<RemoteConfigSource>>>,
    listeners: ListenerSet,
}

impl Shared {
    fn inner(&self) -> MutexGuard<'_, Option<Arc<RemoteConfigSource>>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current(&self) -> Option<Arc<RemoteConfigSource>> {
        self.inner().clone()
    }

    fn on_child_event(&self, event: ChildEvent) {
        if event.path != self.path {
            return;
        }
        match event.kind {
            ChildEventKind::Added => {
                if let Err(e) = self.activate() {
                    tracing::error!("Failed to activate {}: {}", self.path, e);
                }
            }
            ChildEventKind::Removed => self.deactivate(),
            ChildEventKind::Updated => {}
        }
    }

    fn activate(&self) -> Result<()> {
        if self.current().is_some() {
            tracing::debug!("{} is already active", self.path);
            return Ok(());
        }

        // Built without holding the state lock; a concurrent activation may win.
        let source = Arc::new(RemoteConfigSource::start(Arc::clone(&self.store), &self.path)?);
        {
            let mut inner = self.inner();
            if inner.is_some() {
                drop(inner);
                source.close()?;
                return Ok(());
            }
            *inner = Some(Arc::clone(&source));
        }

        for (id, listener) in self.listeners.entries() {
            source.attach_listener(id, listener);
        }

        let snapshot = source.snapshot()?;
        tracing::info!(
            "Activated {} with {} properties",
            self.path,
            snapshot.len()
        );
        self.listeners.notify(&UpdateEvent::full(snapshot));
        Ok(())
    }

    fn deactivate(&self) {
        let Some(source) = self.inner().take() else {
            return;
        };

        let previous: Vec<String> = source
            .snapshot()
            .map(|snapshot| snapshot.into_keys().collect())
            .unwrap_or_default();
        if let Err(e) = source.close() {
            tracing::warn!("Failed to close {}: {}", self.path, e);
        }

        tracing::info!("Deactivated {}", self.path);
        self.listeners.notify(&UpdateEvent::full_clear(previous));
    }
}

/// A configuration layer tracking the presence of `{root}/{child}`.
///
/// States are *inactive* (child absent, layer empty) and *active* (child
/// present, layer mirrors the child's sub-tree). Transitions are driven by the
/// children watch on `root`:
///
/// - child added: start an inner [`RemoteConfigSource`], attach every
///   registered listener to it, then send listeners a full update with its
///   snapshot. Ignored when already active.
/// - child removed: close the inner source, then send listeners a full clear
///   of every key it held.
///
/// A failed activation triggered by the watch is logged and leaves the source
/// inactive.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MemoryPathStore;
/// use layercfg::ports::{PathStore, UpdateSource};
/// use layercfg::service::{channel_listener, DynamicInstanceConfigSource};
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryPathStore::new());
/// store.create("/app", "").unwrap();
///
/// let source = DynamicInstanceConfigSource::start(store.clone(), "/app", "local-config").unwrap();
/// assert!(source.current_data().is_empty());
///
/// let (listener, events) = channel_listener(8);
/// source.add_update_listener(listener);
///
/// store.create("/app/local-config", "").unwrap();
/// assert!(source.is_active());
/// store.create("/app/local-config/k", "v").unwrap();
/// assert_eq!(source.current_data().get("k").map(String::as_str), Some("v"));
/// assert_eq!(events.try_iter().count(), 2);
/// ```
pub struct DynamicInstanceConfigSource {
    name: String,
    shared: Arc<Shared>,
    watch: Mutex<Option<WatchHandle>>,
}

impl DynamicInstanceConfigSource {
    /// Watches `root` for `child` and activates immediately if it exists.
    ///
    /// An error while checking for the child or starting the inner source is
    /// returned and no watch stays registered.
    pub fn start(store: Arc<dyn PathStore>, root: &str, child: &str) -> Result<Self> {
        paths::validate(root)?;
        if !is_valid_node_name(child) {
            return Err(ConfigError::path_failure(
                "watch_children",
                root,
                format!("'{}' is not a valid node name", child),
            ));
        }

        let path = paths::join(root, child);
        let shared = Arc::new(Shared {
            store: Arc::clone(&store),
            path: path.clone(),
            inner: Mutex::new(None),
            listeners: ListenerSet::new(),
        });

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let watch = store.watch_children(
            root,
            Arc::new(move |event: ChildEvent| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_child_event(event);
                }
            }),
        )?;

        if store.exists(&path)? {
            shared.activate()?;
        } else {
            tracing::debug!("{} is absent; waiting for it to appear", path);
        }

        Ok(Self {
            name: format!("dynamic:{}", path),
            shared,
            watch: Mutex::new(Some(watch)),
        })
    }

    /// The watched child path.
    pub fn path(&self) -> &str {
        &self.shared.path
    }

    /// Returns `true` while the child node exists.
    pub fn is_active(&self) -> bool {
        self.shared.current().is_some()
    }

    /// The inner snapshot while active, an empty map otherwise.
    pub fn current_data(&self) -> BTreeMap<String, String> {
        self.shared
            .current()
            .and_then(|source| source.snapshot().ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for DynamicInstanceConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicInstanceConfigSource")
            .field("path", &self.shared.path)
            .field("active", &self.is_active())
            .field("listeners", &self.shared.listeners.len())
            .finish()
    }
}

impl ConfigSource for DynamicInstanceConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        match self.shared.current() {
            Some(source) => source.get(key),
            None => Ok(None),
        }
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        match self.shared.current() {
            Some(source) => source.all_keys(),
            None => Ok(Vec::new()),
        }
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.current_data())
    }

    fn close(&self) -> Result<()> {
        let watch = self
            .watch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(watch) = watch {
            watch.cancel();
        }
        let inner = self.shared.inner().take();
        match inner {
            Some(source) => source.close(),
            None => Ok(()),
        }
    }
}

impl UpdateSource for DynamicInstanceConfigSource {
    fn attach_listener(&self, id: ListenerId, listener: UpdateListener) {
        self.shared.listeners.insert(id, Arc::clone(&listener));
        if let Some(source) = self.shared.current() {
            source.attach_listener(id, listener);
        }
    }

    fn remove_update_listener(&self, id: ListenerId) -> bool {
        let removed = self.shared.listeners.remove(id);
        if let Some(source) = self.shared.current() {
            source.remove_update_listener(id);
        }
        removed
    }
}

impl Drop for DynamicInstanceConfigSource {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryPathStore;
    use crate::domain::UpdateKind;
    use crate::service::listeners::channel_listener;

    fn store() -> Arc<MemoryPathStore> {
        let store = Arc::new(MemoryPathStore::new());
        store.create("/app", "").unwrap();
        store
    }

    #[test]
    fn test_starts_inactive_when_absent() {
        let store = store();
        let source = DynamicInstanceConfigSource::start(store, "/app", "i-1-config").unwrap();
        assert!(!source.is_active());
        assert!(source.current_data().is_empty());
        assert!(source.get_str("anything").unwrap().is_none());
    }

    #[test]
    fn test_starts_active_when_present() {
        let store = store();
        store.create("/app/i-1-config", "").unwrap();
        store.create("/app/i-1-config/k", "v").unwrap();

        let source = DynamicInstanceConfigSource::start(store, "/app", "i-1-config").unwrap();
        assert!(source.is_active());
        assert_eq!(source.get_str("k").unwrap().unwrap().as_str(), "v");
    }

    #[test]
    fn test_lifecycle_events() {
        let store = store();
        let source =
            DynamicInstanceConfigSource::start(store.clone(), "/app", "i-1-config").unwrap();
        let (listener, events) = channel_listener(16);
        source.add_update_listener(listener);

        store.create("/app/i-1-config", "").unwrap();
        store.create("/app/i-1-config/a", "1").unwrap();
        store.delete("/app/i-1-config/a").unwrap();
        store.create("/app/i-1-config/b", "2").unwrap();
        store.delete("/app/i-1-config/b").unwrap();
        store.delete("/app/i-1-config").unwrap();

        let received: Vec<UpdateEvent> = events.try_iter().collect();
        assert_eq!(received.first(), Some(&UpdateEvent::full(BTreeMap::new())));
        assert_eq!(received[1], UpdateEvent::changed("a", "1"));
        let last = received.last().unwrap();
        assert!(last.is_full_clear());
        assert!(!source.is_active());
    }

    #[test]
    fn test_deactivation_after_children_removed() {
        let store = store();
        store.create("/app/x", "").unwrap();
        store.create("/app/x/k1", "v1").unwrap();
        let source = DynamicInstanceConfigSource::start(store.clone(), "/app", "x").unwrap();
        let (listener, events) = channel_listener(16);
        source.add_update_listener(listener);

        // Deleting a non-empty node fails, so the children go first.
        store.delete("/app/x/k1").unwrap();
        store.delete("/app/x").unwrap();

        let received: Vec<UpdateEvent> = events.try_iter().collect();
        assert_eq!(received[0], UpdateEvent::removed("k1"));
        assert_eq!(received[1].kind, UpdateKind::Full);
        assert!(received[1].removed.is_empty());
    }

    #[test]
    fn test_listeners_survive_reactivation() {
        let store = store();
        let source = DynamicInstanceConfigSource::start(store.clone(), "/app", "x").unwrap();
        let (listener, events) = channel_listener(32);
        let id = source.add_update_listener(listener);

        for round in 0..2 {
            store.create("/app/x", "").unwrap();
            store.create("/app/x/k", &round.to_string()).unwrap();
            store.delete("/app/x/k").unwrap();
            store.delete("/app/x").unwrap();
        }

        let changed: Vec<UpdateEvent> = events
            .try_iter()
            .filter(|e| e.kind == UpdateKind::Incremental && !e.changed.is_empty())
            .collect();
        assert_eq!(
            changed,
            vec![UpdateEvent::changed("k", "0"), UpdateEvent::changed("k", "1")]
        );

        assert!(source.remove_update_listener(id));
        assert!(!source.remove_update_listener(id));
    }

    #[test]
    fn test_sibling_events_are_ignored() {
        let store = store();
        let source = DynamicInstanceConfigSource::start(store.clone(), "/app", "x").unwrap();
        store.create("/app/y", "").unwrap();
        store.create("/app/x-config", "").unwrap();
        assert!(!source.is_active());
    }

    #[test]
    fn test_invalid_child_name() {
        let store = store();
        assert!(DynamicInstanceConfigSource::start(store.clone(), "/app", "a/b").is_err());
        assert!(DynamicInstanceConfigSource::start(store, "/app", "").is_err());
    }

    #[test]
    fn test_close_releases_watches() {
        let store = store();
        store.create("/app/x", "").unwrap();
        let source = DynamicInstanceConfigSource::start(store.clone(), "/app", "x").unwrap();
        assert_eq!(store.watch_count(), 2);

        source.close().unwrap();
        assert_eq!(store.watch_count(), 0);
        assert!(!source.is_active());
    }
}
