// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical path store trait definition.
//!
//! A `PathStore` is the capability this crate needs from a coordination
//! service: a namespace of slash-separated nodes, each holding a UTF-8 string,
//! with existence checks, child listing, create/update/delete, an "already
//! exists" conflict signal, and watches on a node's children.
//!
//! Error contract for implementors:
//!
//! - `create` on an existing node fails with [`ConfigError::NodeExists`]
//! - `create` under a missing parent, and `get_data`, `get_children`,
//!   `set_data` or `delete` on a missing node fail with [`ConfigError::NoNode`]
//! - `delete` on a node that still has children fails with
//!   [`ConfigError::PathOperationFailure`]
//!
//! [`ConfigError::NodeExists`]: crate::domain::ConfigError::NodeExists
//! [`ConfigError::NoNode`]: crate::domain::ConfigError::NoNode
//! [`ConfigError::PathOperationFailure`]: crate::domain::ConfigError::PathOperationFailure

use crate::domain::{paths, Result};
use std::fmt;
use std::sync::{Arc, Mutex};

/// What happened to a watched node's child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildEventKind {
    /// A child node was created.
    Added,
    /// A child node's data changed.
    Updated,
    /// A child node was deleted.
    Removed,
}

/// A change to one direct child of a watched path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildEvent {
    /// What happened.
    pub kind: ChildEventKind,
    /// Full path of the child.
    pub path: String,
    /// The child's data after the change; `None` for removals.
    pub data: Option<String>,
}

impl ChildEvent {
    /// The child's node name (last path segment).
    pub fn name(&self) -> &str {
        paths::node_name(&self.path)
    }
}

/// Callback invoked for every child event of a watched path.
///
/// Callbacks run on the store's delivery thread. They may call back into the
/// store; implementations must not hold internal locks while invoking them.
pub type ChildCallback = Arc<dyn Fn(ChildEvent) + Send + Sync>;

/// A live watch registration. Dropping the handle cancels the watch.
pub struct WatchHandle {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl WatchHandle {
    /// Creates a handle that runs `cancel` once, on [`cancel`](Self::cancel) or drop.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Cancels the watch. Later calls do nothing.
    pub fn cancel(&self) {
        let cancel = match self.cancel.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Returns `true` until the watch has been cancelled.
    pub fn is_active(&self) -> bool {
        self.cancel
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A hierarchical namespace backed by a coordination service.
///
/// All operations block the calling thread.
pub trait PathStore: Send + Sync {
    /// Returns `true` if a node exists at `path`.
    fn exists(&self, path: &str) -> Result<bool>;

    /// Returns the names of the direct children of `path`.
    fn get_children(&self, path: &str) -> Result<Vec<String>>;

    /// Returns the data stored at `path`.
    fn get_data(&self, path: &str) -> Result<String>;

    /// Creates a node at `path` holding `data`. The parent must exist.
    fn create(&self, path: &str, data: &str) -> Result<()>;

    /// Replaces the data stored at an existing node.
    fn set_data(&self, path: &str, data: &str) -> Result<()>;

    /// Deletes a childless node.
    fn delete(&self, path: &str) -> Result<()>;

    /// Watches the direct children of `path`, which need not exist yet.
    fn watch_children(&self, path: &str, callback: ChildCallback) -> Result<WatchHandle>;

    /// Releases the connection to the backing service.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_watch_handle_cancels_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = WatchHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handle.is_active());
        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watch_handle_cancels_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        drop(WatchHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_child_event_name() {
        let event = ChildEvent {
            kind: ChildEventKind::Added,
            path: "/prod/app/1.0/local-config".to_string(),
            data: Some(String::new()),
        };
        assert_eq!(event.name(), "local-config");
    }

    #[test]
    fn test_path_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn PathStore>();
    }
}
