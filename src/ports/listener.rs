// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update listener trait definitions.
//!
//! Live layers report their mutations to listeners as
//! [`UpdateEvent`](crate::domain::UpdateEvent)s. A listener is registered once
//! and identified by a [`ListenerId`], so an owner can forward the same
//! registration to an inner source and later remove it from both.

use crate::domain::UpdateEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked with every update of a live layer.
///
/// Listeners run synchronously on the thread that detected the change and
/// should return quickly; see
/// [`channel_listener`](crate::service::listeners::channel_listener) for a
/// non-blocking adapter.
pub type UpdateListener = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocates a new id.
    pub fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A layer that reports its mutations to listeners.
///
/// # Examples
///
/// ```rust
/// use layercfg::ports::{ListenerId, UpdateListener, UpdateSource};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<ListenerId>>);
///
/// impl UpdateSource for Recorder {
///     fn attach_listener(&self, id: ListenerId, _listener: UpdateListener) {
///         self.0.lock().unwrap().push(id);
///     }
///
///     fn remove_update_listener(&self, id: ListenerId) -> bool {
///         let mut ids = self.0.lock().unwrap();
///         let before = ids.len();
///         ids.retain(|existing| *existing != id);
///         ids.len() != before
///     }
/// }
///
/// let source = Recorder::default();
/// let id = source.add_update_listener(std::sync::Arc::new(|_: &layercfg::domain::UpdateEvent| {}));
/// assert!(source.remove_update_listener(id));
/// assert!(!source.remove_update_listener(id));
/// ```
pub trait UpdateSource: Send + Sync {
    /// Registers `listener` under an existing id, replacing any listener
    /// already registered with that id.
    fn attach_listener(&self, id: ListenerId, listener: UpdateListener);

    /// Removes the listener registered under `id`. Returns `true` if it existed.
    fn remove_update_listener(&self, id: ListenerId) -> bool;

    /// Registers `listener` and returns its new id.
    fn add_update_listener(&self, listener: UpdateListener) -> ListenerId {
        let id = ListenerId::next();
        self.attach_listener(id, listener);
        id
    }
}
